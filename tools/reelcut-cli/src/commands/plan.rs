//! Dry run: show the segment plan for a table.

use std::path::PathBuf;

use anyhow::Context;

use reelcut_common::config::AppConfig;
use reelcut_common::error::ReelcutError;
use reelcut_cut_model::{SegmentPlan, TimeValue};
use reelcut_planner::{SegmentPlanner, TimebaseExporter};
use reelcut_render_engine::probe_media;

use super::TableArgs;

pub fn run(
    table: TableArgs,
    video: Option<PathBuf>,
    duration: Option<String>,
    timebase: Option<PathBuf>,
    force: bool,
    json: bool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    if let Some(timebase) = &timebase {
        ReelcutError::ensure_writable(timebase, force)?;
    }

    let intervals = table.load_intervals(config)?;
    let planner = SegmentPlanner::new(table.planner_config(config)?);

    let media_duration = match (&video, &duration) {
        (Some(video), _) => probe_media(&config.render.ffprobe, video)?.duration,
        (None, Some(text)) => TimeValue::parse(text)
            .with_context(|| format!("Invalid duration '{text}'"))?,
        (None, None) => anyhow::bail!("either --video or --duration is required"),
    };

    let plan = planner
        .plan(&intervals, media_duration)
        .map_err(ReelcutError::from)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }

    if let Some(timebase) = &timebase {
        let path = TimebaseExporter::new(&plan).export_file(timebase, force)?;
        println!("Wrote timebase {}", path.display());
    }

    Ok(())
}

fn print_plan(plan: &SegmentPlan) {
    println!(
        "Plan: {} segments, fade {}s, media {}, output ends {}",
        plan.len(),
        plan.fade_length(),
        plan.media_duration(),
        plan.output_end()
    );
    println!(
        "{:>4}  {:<8}  {:<19}  {:<19}  {:<19}",
        "row", "kind", "source", "output", "real"
    );
    for segment in plan.iter() {
        println!(
            "{:>4}  {:<8}  {} - {}  {} - {}  {} - {}",
            segment.row,
            segment.kind.as_str(),
            segment.source_range.start,
            segment.source_range.stop,
            segment.output_range.start,
            segment.output_range.stop,
            segment.real_range.start,
            segment.real_range.stop,
        );
    }
}
