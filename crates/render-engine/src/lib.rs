//! Reelcut Render Engine
//!
//! Turns a segment plan into a finished video with ffmpeg.
//!
//! # Pipeline Architecture
//!
//! ```text
//! source.mp4 ── ffprobe ── MediaProperties
//!      │
//!      ├── fade-in  ─┐
//!      ├── slice    ─┤  one clip per render step,
//!      ├── fade-out ─┤  rendered concurrently into a
//!      └── blank    ─┘  scratch dir next to the output
//!                    │
//!                    ▼
//!              concat (plan order)
//!                    │
//!                    ▼
//!         rename into place → output.mp4
//! ```

pub mod export;
pub mod probe;
pub mod steps;

pub use export::*;
pub use probe::{parse_probe_output, probe_media};
pub use steps::{ffmpeg_args, render_steps, RenderStep, StepKind};
