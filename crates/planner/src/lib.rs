//! Reelcut Planner
//!
//! Turns an interval table and the source media's duration into a segment
//! plan, and exports the plan's timebase:
//! - **Segment planning:** clamp intervals for fades, lay out output time
//!   with guard bands, and anchor real time to the first clip
//! - **Timebase export:** write the output/real time map as CSV or JSON
//!
//! Planning is pure computation; only the exporter touches the filesystem.

pub mod planner;
pub mod timebase;

pub use planner::{PlanError, PlannerConfig, SegmentPlanner};
pub use timebase::{TimebaseExporter, TimebaseFormat, TimebaseRow};
