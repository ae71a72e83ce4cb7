//! Cut a video into faded clips and join them.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reelcut_common::config::AppConfig;
use reelcut_common::error::ReelcutError;
use reelcut_common::run::RunContext;
use reelcut_planner::{SegmentPlanner, TimebaseExporter};
use reelcut_render_engine::{
    probe_media, render_plan, FfmpegBackend, ProgressCallback, RenderJob, RenderStage,
};

use super::{ensure_exists, TableArgs};

pub struct ChopOptions {
    pub video: PathBuf,
    pub table: TableArgs,
    pub output: Option<PathBuf>,
    pub timebase: Option<PathBuf>,
    pub force: bool,
    pub jobs: Option<usize>,
}

/// `processed_<name>` next to the video.
pub fn default_output(video: &Path) -> PathBuf {
    let name = video
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.mp4".to_string());
    video.with_file_name(format!("processed_{name}"))
}

pub async fn run(options: ChopOptions, config: &AppConfig) -> anyhow::Result<()> {
    let output = options
        .output
        .clone()
        .unwrap_or_else(|| default_output(&options.video));

    // Everything that can be checked up front is checked before any work.
    ensure_exists(&options.video)?;
    ensure_exists(&options.table.table)?;
    ReelcutError::ensure_writable(&output, options.force)?;
    if let Some(timebase) = &options.timebase {
        ReelcutError::ensure_writable(timebase, options.force)?;
    }

    let run = RunContext::start();
    let intervals = options.table.load_intervals(config)?;
    let planner = SegmentPlanner::new(options.table.planner_config(config)?);

    let media = probe_media(&config.render.ffprobe, &options.video)?;
    let plan = planner
        .plan_for_media(&intervals, &media)
        .map_err(ReelcutError::from)?;

    println!("Chopping: {}", options.video.display());
    println!("  Intervals: {}", intervals.len());
    println!("  Media duration: {}", media.duration);
    println!("  Output duration: {}", plan.output_end());
    println!("  Output: {}", output.display());

    let job = RenderJob {
        input: options.video.clone(),
        output: output.clone(),
        overwrite: options.force,
        workers: options.jobs.unwrap_or(config.render.workers).max(1),
    };

    let progress: ProgressCallback = Box::new(|p| {
        let label = match p.stage {
            RenderStage::Preparing => "preparing",
            RenderStage::Rendering => "rendering",
            RenderStage::Concatenating => "joining",
            RenderStage::Finalizing => "finalizing",
            RenderStage::Complete => "done",
            RenderStage::Failed => "failed",
        };
        print!(
            "\r  Progress: {:.0}% ({}/{} clips, {label})  ",
            p.progress * 100.0,
            p.steps_done,
            p.steps_total,
        );
        std::io::stdout().flush().ok();
    });

    let backend = Arc::new(FfmpegBackend::new(&config.render.ffmpeg));
    let result = render_plan(&job, &plan, &media, &run, backend, Some(progress)).await;
    println!();
    let written = result?;
    println!("Wrote {}", written.display());

    if let Some(timebase) = &options.timebase {
        let path = TimebaseExporter::new(&plan).export_file(timebase, options.force)?;
        println!("Wrote timebase {}", path.display());
    }

    tracing::info!(
        run = run.id(),
        started = run.started_wall(),
        elapsed_secs = run.elapsed_secs(),
        "Chop finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_sits_next_to_video() {
        assert_eq!(
            default_output(Path::new("/data/talks/day1.mp4")),
            PathBuf::from("/data/talks/processed_day1.mp4")
        );
        assert_eq!(
            default_output(Path::new("clip.mov")),
            PathBuf::from("processed_clip.mov")
        );
    }

    #[tokio::test]
    async fn test_existing_output_is_refused_before_probing() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("talk.mp4");
        let table = dir.path().join("cuts.csv");
        std::fs::write(&video, "not really a video").unwrap();
        std::fs::write(&table, "start,stop\n00:00:10,00:00:20\n").unwrap();
        std::fs::write(default_output(&video), "keep").unwrap();

        let options = ChopOptions {
            video: video.clone(),
            table: TableArgs {
                table,
                start_column: None,
                stop_column: None,
                gap_column: None,
                fade_length: None,
                real_time: None,
            },
            output: None,
            timebase: None,
            force: false,
            jobs: None,
        };

        let err = run(options, &AppConfig::default()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReelcutError>(),
            Some(ReelcutError::OutputExists { .. })
        ));
        assert_eq!(
            std::fs::read_to_string(default_output(&video)).unwrap(),
            "keep"
        );
    }
}
