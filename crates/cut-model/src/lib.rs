//! Reelcut Cut Model
//!
//! Defines the core data contracts for cutting a recording into clips:
//! - **Timecodes:** `HH:MM:SS` values with one-second resolution
//! - **Tables:** generic record tables read from CSV/TSV/JSON
//! - **Intervals:** validated extraction requests (start, stop, gap after)
//! - **Media:** probed properties of the source file
//! - **Segments:** the planned source/output/real time map
//!
//! All times are whole seconds in `[00:00:00, 99:59:59]`.

pub mod interval;
pub mod media;
pub mod segment;
pub mod table;
pub mod timecode;

pub use interval::*;
pub use media::*;
pub use segment::*;
pub use table::*;
pub use timecode::*;
