//! Decomposition of a segment plan into individual ffmpeg jobs.
//!
//! Every interval produces up to four clips, concatenated in this order:
//!
//! ```text
//! Content ─┬─ FadeIn   re-encode source [s - f, s] with a fade from black
//!          └─ Slice    stream copy source [s, e]
//! Gap ─────┬─ FadeOut  re-encode source [e, e + f] with a fade to black
//!          └─ Blank    black video + silence for the requested gap (if any)
//! ```

use std::path::{Path, PathBuf};

use reelcut_cut_model::{MediaProperties, SegmentKind, SegmentPlan, TimeValue};

/// The kind of clip a render step produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    FadeIn,
    Slice,
    FadeOut,
    Blank,
}

impl StepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FadeIn => "fade-in",
            Self::Slice => "slice",
            Self::FadeOut => "fade-out",
            Self::Blank => "blank",
        }
    }
}

/// One ffmpeg invocation producing a temporary clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderStep {
    pub kind: StepKind,

    /// Zero-based interval this clip belongs to.
    pub interval_index: usize,

    /// 1-based table row of that interval.
    pub row: usize,

    /// Source time the clip starts at (unused for blanks).
    pub source_start: TimeValue,

    /// Clip length in whole seconds.
    pub duration_secs: u32,

    /// File name inside the run's scratch directory.
    pub file_name: String,
}

impl RenderStep {
    /// Source time the clip stops at.
    pub fn source_stop(&self) -> TimeValue {
        TimeValue::from_secs(self.source_start.as_i64() + self.duration_secs as i64)
            .unwrap_or(TimeValue::MAX)
    }
}

/// Expand `plan` into the ordered list of clips to render.
///
/// File names are `{prefix}{interval:03}_{kind}.mp4`, so a lexical sort of
/// one run's clips matches concatenation order.
pub fn render_steps(plan: &SegmentPlan, prefix: &str) -> Vec<RenderStep> {
    let fade = plan.fade_length();
    let mut steps = Vec::with_capacity(plan.len() * 2);

    for segment in plan.iter() {
        let step = |kind: StepKind, source_start: TimeValue, duration_secs: u32| RenderStep {
            kind,
            interval_index: segment.interval_index,
            row: segment.row,
            source_start,
            duration_secs,
            file_name: format!(
                "{prefix}{:03}_{}.mp4",
                segment.interval_index,
                kind.as_str()
            ),
        };

        match segment.kind {
            SegmentKind::Content => {
                let fade_start = segment.source_range.start;
                let slice_start = TimeValue::from_secs(fade_start.as_i64() + fade as i64)
                    .unwrap_or(fade_start);
                let slice_secs = segment
                    .source_range
                    .stop
                    .as_secs()
                    .saturating_sub(slice_start.as_secs());
                steps.push(step(StepKind::FadeIn, fade_start, fade));
                steps.push(step(StepKind::Slice, slice_start, slice_secs));
            }
            SegmentKind::Gap => {
                steps.push(step(StepKind::FadeOut, segment.source_range.start, fade));
                let blank_secs = segment.output_range.duration_secs().saturating_sub(fade);
                if blank_secs > 0 {
                    steps.push(step(StepKind::Blank, TimeValue::ZERO, blank_secs));
                }
            }
            // Plans carry the fades merged into content and gap segments.
            SegmentKind::FadeIn | SegmentKind::FadeOut => {}
        }
    }

    steps
}

/// Paths of the rendered clips inside `dir`, in concatenation order.
pub fn clip_paths(steps: &[RenderStep], dir: &Path) -> Vec<PathBuf> {
    steps.iter().map(|s| dir.join(&s.file_name)).collect()
}

/// Encoder options that make a re-encoded clip match the source streams.
pub fn encode_args(media: &MediaProperties) -> Vec<String> {
    vec![
        "-c:v".into(),
        media.video_codec.clone(),
        "-c:a".into(),
        media.audio_codec.clone(),
        "-pix_fmt".into(),
        media.pix_fmt.clone(),
        "-r".into(),
        media.frame_rate.clone(),
        "-ar".into(),
        media.sample_rate.to_string(),
        "-channel_layout".into(),
        media.channel_layout.clone(),
    ]
}

/// Number of frames a fade of `secs` spans at the media's frame rate.
fn fade_frames(media: &MediaProperties, secs: u32) -> u64 {
    let fps = media.frames_per_second().unwrap_or(30.0);
    ((secs as f64) * fps).round().max(1.0) as u64
}

/// Full ffmpeg argument vector for one step.
pub fn ffmpeg_args(
    step: &RenderStep,
    input: &Path,
    output: &Path,
    media: &MediaProperties,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-nostdin".into(),
        "-loglevel".into(),
        "error".into(),
        "-y".into(),
    ];
    let duration = step.duration_secs.to_string();

    match step.kind {
        StepKind::FadeIn | StepKind::FadeOut => {
            let direction = if step.kind == StepKind::FadeIn { "in" } else { "out" };
            args.extend([
                "-ss".into(),
                step.source_start.format(),
                "-t".into(),
                duration,
                "-i".into(),
                input.display().to_string(),
                "-filter:v".into(),
                format!(
                    "fade={direction}:0:{}",
                    fade_frames(media, step.duration_secs)
                ),
            ]);
            args.extend(encode_args(media));
        }
        StepKind::Slice => {
            args.extend([
                "-ss".into(),
                step.source_start.format(),
                "-t".into(),
                duration,
                "-i".into(),
                input.display().to_string(),
                "-c:v".into(),
                "copy".into(),
                "-c:a".into(),
                "copy".into(),
            ]);
        }
        StepKind::Blank => {
            args.extend([
                "-f".into(),
                "lavfi".into(),
                "-t".into(),
                duration.clone(),
                "-i".into(),
                format!(
                    "color=c=black:s={}:r={}",
                    media.resolution(),
                    media.frame_rate
                ),
                "-f".into(),
                "lavfi".into(),
                "-t".into(),
                duration,
                "-i".into(),
                format!(
                    "anullsrc=channel_layout={}:sample_rate={}",
                    media.channel_layout, media.sample_rate
                ),
            ]);
            // Keep the source's stream order so the concat inputs line up.
            let maps: [&str; 2] = if media.audio_track_precedes_video {
                ["1:a", "0:v"]
            } else {
                ["0:v", "1:a"]
            };
            for map in maps {
                args.extend(["-map".to_string(), map.to_string()]);
            }
            args.extend(encode_args(media));
        }
    }

    args.push(output.display().to_string());
    args
}

/// ffmpeg arguments joining `clips` into `output` with the concat filter.
pub fn concat_args(clips: &[PathBuf], output: &Path, media: &MediaProperties) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-nostdin".into(),
        "-loglevel".into(),
        "error".into(),
        "-y".into(),
    ];
    for clip in clips {
        args.extend(["-i".into(), clip.display().to_string()]);
    }

    let mut graph = String::new();
    for index in 0..clips.len() {
        graph.push_str(&format!("[{index}:v:0][{index}:a:0]"));
    }
    graph.push_str(&format!("concat=n={}:v=1:a=1[v][a]", clips.len()));

    args.extend([
        "-filter_complex".into(),
        graph,
        "-map".into(),
        "[v]".into(),
        "-map".into(),
        "[a]".into(),
    ]);
    args.extend(encode_args(media));
    args.push(output.display().to_string());
    args
}
