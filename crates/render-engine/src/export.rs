//! Render jobs and the clip pipeline.
//!
//! `render_plan` drives a [`RenderBackend`] through every step of a plan:
//! clips are rendered concurrently into a per-run scratch directory next to
//! the output, concatenated in plan order, and the result is moved into place.
//! The scratch directory is removed on every exit path, and an existing output
//! is only ever replaced by a complete render.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_common::run::RunContext;
use reelcut_cut_model::{MediaProperties, SegmentPlan};

use crate::steps::{clip_paths, concat_args, ffmpeg_args, render_steps, RenderStep};

/// A render job ready to run.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Source media file.
    pub input: PathBuf,

    /// Final output file.
    pub output: PathBuf,

    /// Replace `output` if it already exists.
    pub overwrite: bool,

    /// Maximum number of clips rendered at once.
    pub workers: usize,
}

/// Progress callback for rendering.
pub type ProgressCallback = Box<dyn Fn(RenderProgress) + Send + Sync>;

/// Render progress report.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Clips finished so far.
    pub steps_done: usize,

    /// Total clips to render.
    pub steps_total: usize,

    /// Current stage.
    pub stage: RenderStage,
}

/// Stages of a render run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Preparing,
    Rendering,
    Concatenating,
    Finalizing,
    Complete,
    Failed,
}

/// Something that can turn render steps into clips.
///
/// Implementations run on tokio's blocking pool, one call per clip.
pub trait RenderBackend: Send + Sync {
    /// Render one clip of `input` into `output`.
    fn render_step(
        &self,
        step: &RenderStep,
        input: &Path,
        output: &Path,
        media: &MediaProperties,
    ) -> ReelcutResult<()>;

    /// Join `clips` in order into `output`.
    fn concat(&self, clips: &[PathBuf], output: &Path, media: &MediaProperties)
        -> ReelcutResult<()>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Render `plan` from `job.input` into `job.output`.
///
/// Returns the output path. On failure the scratch directory is removed and
/// a pre-existing output is left untouched.
pub async fn render_plan(
    job: &RenderJob,
    plan: &SegmentPlan,
    media: &MediaProperties,
    run: &RunContext,
    backend: Arc<dyn RenderBackend>,
    progress: Option<ProgressCallback>,
) -> ReelcutResult<PathBuf> {
    ReelcutError::ensure_writable(&job.output, job.overwrite)?;
    if !job.input.exists() {
        return Err(ReelcutError::FileNotFound {
            path: job.input.clone(),
        });
    }
    if plan.is_empty() {
        return Err(ReelcutError::render("segment plan is empty"));
    }
    if !backend.is_available() {
        return Err(ReelcutError::unsupported(format!(
            "render backend '{}' is not available",
            backend.name()
        )));
    }

    let report = |stage: RenderStage, done: usize, total: usize| {
        if let Some(cb) = &progress {
            let fraction = if total == 0 {
                0.0
            } else {
                done as f64 / total as f64
            };
            cb(RenderProgress {
                progress: fraction,
                steps_done: done,
                steps_total: total,
                stage,
            });
        }
    };

    let prefix = run.temp_prefix();
    let steps = render_steps(plan, &prefix);
    let total = steps.len();

    tracing::info!(
        run = run.id(),
        input = %job.input.display(),
        output = %job.output.display(),
        backend = backend.name(),
        steps = total,
        workers = job.workers,
        "Starting render"
    );
    report(RenderStage::Preparing, 0, total);

    let parent = job
        .output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&parent)?;
    let scratch = tempfile::Builder::new()
        .prefix(&prefix)
        .tempdir_in(&parent)?;
    tracing::debug!(dir = %scratch.path().display(), "Created scratch directory");

    let result = render_in(
        job,
        media,
        &steps,
        scratch.path(),
        &prefix,
        backend,
        |stage, done| report(stage, done, total),
    )
    .await;

    let staged = match result {
        Ok(staged) => staged,
        Err(err) => {
            report(RenderStage::Failed, 0, total);
            tracing::error!(run = run.id(), error = %err, "Render failed; discarding clips");
            return Err(err);
        }
    };

    report(RenderStage::Finalizing, total, total);
    if let Err(err) = finalize(&staged, job) {
        report(RenderStage::Failed, total, total);
        return Err(err);
    }
    drop(scratch);

    report(RenderStage::Complete, total, total);
    tracing::info!(
        run = run.id(),
        output = %job.output.display(),
        elapsed_secs = run.elapsed_secs(),
        "Render finished"
    );
    Ok(job.output.clone())
}

/// Render every clip, then concatenate them. Returns the staged final file.
async fn render_in(
    job: &RenderJob,
    media: &MediaProperties,
    steps: &[RenderStep],
    dir: &Path,
    prefix: &str,
    backend: Arc<dyn RenderBackend>,
    on_progress: impl Fn(RenderStage, usize),
) -> ReelcutResult<PathBuf> {
    let semaphore = Arc::new(Semaphore::new(job.workers.max(1)));
    let media_shared = Arc::new(media.clone());
    let mut tasks = JoinSet::new();

    for step in steps.iter().cloned() {
        let semaphore = Arc::clone(&semaphore);
        let backend = Arc::clone(&backend);
        let media = Arc::clone(&media_shared);
        let input = job.input.clone();
        let output = dir.join(&step.file_name);

        tasks.spawn(async move {
            // A closed semaphore means another clip already failed.
            let Ok(permit) = semaphore.acquire_owned().await else {
                return Ok(None);
            };
            let rendered = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                tracing::debug!(
                    row = step.row,
                    kind = step.kind.as_str(),
                    start = %step.source_start,
                    secs = step.duration_secs,
                    "Rendering clip"
                );
                backend.render_step(&step, &input, &output, &media)
            })
            .await
            .map_err(|e| ReelcutError::render(format!("render task failed: {e}")))?;
            rendered.map(Some)
        });
    }

    // Barrier: wait for every clip, keeping the first failure.
    let mut done = 0;
    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined
            .map_err(|e| ReelcutError::render(format!("render task failed: {e}")))
            .and_then(|r| r);
        match outcome {
            Ok(Some(())) => {
                done += 1;
                on_progress(RenderStage::Rendering, done);
            }
            Ok(None) => {}
            Err(err) => {
                semaphore.close();
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }
    if let Some(err) = first_error {
        return Err(err);
    }

    let clips = clip_paths(steps, dir);
    for clip in &clips {
        if !clip.exists() {
            return Err(ReelcutError::render(format!(
                "backend reported success but produced no clip at {}",
                clip.display()
            )));
        }
    }

    let extension = job
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4");
    let staged = dir.join(format!("{prefix}final.{extension}"));
    let concat_target = staged.clone();
    let media = Arc::clone(&media_shared);

    on_progress(RenderStage::Concatenating, done);
    tracing::info!(clips = clips.len(), "Concatenating clips");
    tokio::task::spawn_blocking(move || backend.concat(&clips, &concat_target, &media))
        .await
        .map_err(|e| ReelcutError::render(format!("concat task failed: {e}")))??;

    if !staged.exists() {
        return Err(ReelcutError::render("concatenation produced no output"));
    }
    Ok(staged)
}

/// Move the staged file into place after re-checking the output path.
fn finalize(staged: &Path, job: &RenderJob) -> ReelcutResult<()> {
    // The output may have appeared while the clips were rendering.
    ReelcutError::ensure_writable(&job.output, job.overwrite)?;

    // The scratch directory lives next to the output, so this is a rename on
    // one filesystem; copy as a fallback.
    if let Err(rename_err) = std::fs::rename(staged, &job.output) {
        tracing::warn!(error = %rename_err, "Rename failed; copying output instead");
        copy_into_place(staged, &job.output)?;
    }
    Ok(())
}

/// Copy `staged` to a hidden sibling of `output`, then rename it over
/// `output`. A failed copy leaves any existing output untouched.
fn copy_into_place(staged: &Path, output: &Path) -> ReelcutResult<()> {
    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let sibling = tempfile::Builder::new()
        .prefix(".reelcut_partial_")
        .tempfile_in(parent)?;
    std::fs::copy(staged, sibling.path())?;
    sibling.persist(output).map_err(|e| e.error)?;
    Ok(())
}

/// Backend that shells out to the `ffmpeg` CLI.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    binary: PathBuf,
}

impl FfmpegBackend {
    /// Use the given ffmpeg binary name or path.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Find `ffmpeg` on `PATH`.
    pub fn from_path() -> Option<Self> {
        which::which("ffmpeg").ok().map(Self::new)
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn run_ffmpeg(&self, args: &[String], label: &str) -> ReelcutResult<()> {
        tracing::debug!(args = ?args, label, "Running ffmpeg");
        let started = std::time::Instant::now();
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReelcutError::render(format!("Failed to start ffmpeg: {e}")))?;

        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelcutError::render("Failed to capture ffmpeg stderr"))?;

        // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut output = String::new();
            match stderr.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let status = child
            .wait()
            .map_err(|e| ReelcutError::render(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(ReelcutError::render(format!(
                "ffmpeg {label} failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        tracing::debug!(
            label,
            elapsed_ms = started.elapsed().as_millis(),
            "ffmpeg finished"
        );
        Ok(())
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl RenderBackend for FfmpegBackend {
    fn render_step(
        &self,
        step: &RenderStep,
        input: &Path,
        output: &Path,
        media: &MediaProperties,
    ) -> ReelcutResult<()> {
        let label = format!("{} (row {})", step.kind.as_str(), step.row);
        self.run_ffmpeg(&ffmpeg_args(step, input, output, media), &label)
    }

    fn concat(
        &self,
        clips: &[PathBuf],
        output: &Path,
        media: &MediaProperties,
    ) -> ReelcutResult<()> {
        self.run_ffmpeg(&concat_args(clips, output, media), "concat")
    }

    fn is_available(&self) -> bool {
        which::which(&self.binary).is_ok()
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}
