//! Segment planning: the source → output → real time mapping.
//!
//! Turns validated intervals into an ordered plan of `Content` and `Gap`
//! segments, each carrying its source, output and real time range.
//!
//! # Algorithm
//!
//! For interval `i` with requested `(S, E, G)`, fade `f` and media
//! duration `D`:
//!
//! 1. **Clamp** for fade room: `s = max(S, f)`, `e = min(E, D - f)`.
//!    Crossed clamps (`s >= e`) are an error, never a zero-length clip.
//! 2. **Content** lasts `(e - s) + f`; the fade-in is merged into its
//!    leading edge, so its source range is `[s - f, e]`.
//! 3. **Output** placement is a running cursor: 0 for the first content,
//!    previous output stop + 1 afterwards (one-second guard band).
//! 4. **Real** time is source time plus a fixed offset chosen so that the
//!    first content starts at the caller's anchor.
//! 5. **Gap** lasts `G + f` in output (the fade-out is merged into it).
//!    In real time it starts one second after the content and lasts for the
//!    source time between the end of the fade-out and the next clamped start
//!    (or the end of the media), less a one-second guard band on each side.
//!
//! A single linear pass; the only carried state is the output cursor.

use reelcut_common::error::ReelcutError;
use reelcut_cut_model::{
    IntervalError, IntervalTable, MediaProperties, Segment, SegmentKind, SegmentPlan, TimeRange,
    TimeValue,
};

/// Planner parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Fade length in whole seconds (must be positive).
    pub fade_length: u32,

    /// Real time corresponding to output time zero.
    pub real_time_anchor: TimeValue,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            fade_length: 1,
            real_time_anchor: TimeValue::ZERO,
        }
    }
}

/// Planning failures. No partial plan is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("interval table is empty; nothing to plan")]
    Empty,

    #[error("fade length must be at least one second")]
    InvalidFadeLength,

    #[error(
        "row {row}: no content left between '{start}' and '{stop}' once {fade_length}s fades are reserved"
    )]
    Degenerate {
        row: usize,
        start: TimeValue,
        stop: TimeValue,
        fade_length: u32,
    },

    #[error(transparent)]
    Interval(#[from] IntervalError),

    #[error("row {row}: {axis} time of {secs}s cannot be represented as HH:MM:SS")]
    Unrepresentable {
        row: usize,
        axis: &'static str,
        secs: i64,
    },
}

impl From<PlanError> for ReelcutError {
    fn from(err: PlanError) -> Self {
        ReelcutError::plan(err.to_string())
    }
}

/// The segment planner.
#[derive(Debug, Clone, Default)]
pub struct SegmentPlanner {
    config: PlannerConfig,
}

/// Source bounds of an interval after fade clamping.
#[derive(Debug, Clone, Copy)]
struct Clamped {
    row: usize,
    start: i64,
    stop: i64,
    gap_after: i64,
}

impl SegmentPlanner {
    /// Create a planner with the given configuration.
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Create a planner with default configuration (1s fades, anchor 0).
    pub fn with_defaults() -> Self {
        Self::new(PlannerConfig::default())
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan against probed media.
    pub fn plan_for_media(
        &self,
        intervals: &IntervalTable,
        media: &MediaProperties,
    ) -> Result<SegmentPlan, PlanError> {
        self.plan(intervals, media.duration)
    }

    /// Build the plan for `intervals` cut from media of `media_duration`.
    pub fn plan(
        &self,
        intervals: &IntervalTable,
        media_duration: TimeValue,
    ) -> Result<SegmentPlan, PlanError> {
        if self.config.fade_length == 0 {
            return Err(PlanError::InvalidFadeLength);
        }
        if intervals.is_empty() {
            return Err(PlanError::Empty);
        }
        intervals.check_bounds(media_duration)?;

        let fade = self.config.fade_length as i64;
        let duration = media_duration.as_i64();
        let clamped = self.clamp_all(intervals, duration)?;

        let real_offset = self.config.real_time_anchor.as_i64() - (clamped[0].start - fade);

        let mut segments = Vec::with_capacity(clamped.len() * 2);
        let mut prev_output_stop: Option<i64> = None;

        for (index, c) in clamped.iter().enumerate() {
            let content_secs = (c.stop - c.start) + fade;
            let out_start = prev_output_stop.map_or(0, |stop| stop + 1);
            let out_stop = out_start + content_secs;
            let real_start = (c.start - fade) + real_offset;
            let real_stop = real_start + content_secs;

            segments.push(Segment {
                kind: SegmentKind::Content,
                interval_index: index,
                row: c.row,
                source_range: range(c.row, "source", c.start - fade, c.stop)?,
                output_range: range(c.row, "output", out_start, out_stop)?,
                real_range: range(c.row, "real", real_start, real_stop)?,
            });

            let gap_out_start = out_stop + 1;
            let gap_out_stop = gap_out_start + c.gap_after + fade;

            // Clamped start of the next interval, or the end of the media.
            let next_source = clamped.get(index + 1).map_or(duration, |next| next.start);
            let source_gap_secs = next_source - (c.stop + fade) - 2;
            let gap_real_start = real_stop + 1;
            // Under two seconds of source gap the real range collapses to one
            // instant; this always happens when the last interval runs to the end.
            let gap_real_stop = gap_real_start.max(gap_real_start + source_gap_secs - 1);
            if gap_real_stop == gap_real_start {
                tracing::debug!(row = c.row, source_gap_secs, "Gap real range collapsed");
            }

            segments.push(Segment {
                kind: SegmentKind::Gap,
                interval_index: index,
                row: c.row,
                source_range: range(c.row, "source", c.stop, c.stop + fade)?,
                output_range: range(c.row, "output", gap_out_start, gap_out_stop)?,
                real_range: range(c.row, "real", gap_real_start, gap_real_stop)?,
            });

            tracing::debug!(
                row = c.row,
                source_start = c.start,
                source_stop = c.stop,
                out_start,
                out_stop = gap_out_stop,
                real_start,
                real_stop = gap_real_stop,
                "Planned interval"
            );

            prev_output_stop = Some(gap_out_stop);
        }

        let plan = SegmentPlan::new(
            segments,
            self.config.fade_length,
            media_duration,
            real_offset,
        );
        debug_assert!(plan.is_contiguous());

        tracing::info!(
            intervals = clamped.len(),
            segments = plan.len(),
            output_end = %plan.output_end(),
            real_offset,
            "Segment plan built"
        );

        Ok(plan)
    }

    /// Pull every interval inward so a full fade fits on both sides.
    fn clamp_all(
        &self,
        intervals: &IntervalTable,
        duration: i64,
    ) -> Result<Vec<Clamped>, PlanError> {
        let fade = self.config.fade_length as i64;

        intervals
            .iter()
            .map(|interval| {
                let start = interval.source_start.as_i64().max(fade);
                let stop = interval.source_stop.as_i64().min(duration - fade);
                if start >= stop {
                    return Err(PlanError::Degenerate {
                        row: interval.row,
                        start: interval.source_start,
                        stop: interval.source_stop,
                        fade_length: self.config.fade_length,
                    });
                }
                if start != interval.source_start.as_i64() || stop != interval.source_stop.as_i64()
                {
                    tracing::debug!(
                        row = interval.row,
                        requested_start = %interval.source_start,
                        requested_stop = %interval.source_stop,
                        start,
                        stop,
                        "Clamped interval to leave room for fades"
                    );
                }
                Ok(Clamped {
                    row: interval.row,
                    start,
                    stop,
                    gap_after: interval.gap_after.as_i64(),
                })
            })
            .collect()
    }
}

fn range(row: usize, axis: &'static str, start: i64, stop: i64) -> Result<TimeRange, PlanError> {
    let to_time = |secs: i64| {
        TimeValue::from_secs(secs).map_err(|_| PlanError::Unrepresentable { row, axis, secs })
    };
    Ok(TimeRange {
        start: to_time(start)?,
        stop: to_time(stop)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcut_cut_model::Interval;

    fn t(secs: i64) -> TimeValue {
        TimeValue::from_secs(secs).unwrap()
    }

    fn table(rows: &[(i64, i64, i64)]) -> IntervalTable {
        IntervalTable::from_intervals(
            rows.iter()
                .enumerate()
                .map(|(i, &(start, stop, gap))| Interval::new(i + 1, t(start), t(stop)).with_gap(t(gap)))
                .collect(),
        )
        .unwrap()
    }

    fn secs(range: TimeRange) -> (u32, u32) {
        (range.start.as_secs(), range.stop.as_secs())
    }

    #[test]
    fn test_single_interval_layout() {
        let plan = SegmentPlanner::with_defaults()
            .plan(&table(&[(10, 20, 2)]), t(120))
            .unwrap();

        assert_eq!(plan.len(), 2);
        let content = plan.segments()[0];
        assert_eq!(content.kind, SegmentKind::Content);
        assert_eq!(secs(content.source_range), (9, 20));
        assert_eq!(secs(content.output_range), (0, 11));
        assert_eq!(secs(content.real_range), (0, 11));

        let gap = plan.segments()[1];
        assert_eq!(gap.kind, SegmentKind::Gap);
        assert_eq!(secs(gap.source_range), (20, 21));
        assert_eq!(secs(gap.output_range), (12, 15));
        // 120 - (20 + 1) - 2 = 97 seconds of source gap.
        assert_eq!(secs(gap.real_range), (12, 108));
        assert_eq!(plan.real_offset(), -9);
    }

    #[test]
    fn test_two_intervals_chain_output_and_real_time() {
        let planner = SegmentPlanner::new(PlannerConfig {
            fade_length: 2,
            real_time_anchor: t(3600),
        });
        let plan = planner
            .plan(&table(&[(10, 20, 5), (40, 50, 0)]), t(100))
            .unwrap();

        let ranges: Vec<_> = plan
            .iter()
            .map(|s| (s.kind, secs(s.output_range), secs(s.real_range)))
            .collect();

        assert_eq!(
            ranges,
            vec![
                (SegmentKind::Content, (0, 12), (3600, 3612)),
                (SegmentKind::Gap, (13, 20), (3613, 3628)),
                (SegmentKind::Content, (21, 33), (3630, 3642)),
                (SegmentKind::Gap, (34, 36), (3643, 3688)),
            ]
        );
        assert!(plan.is_contiguous());
    }

    #[test]
    fn test_zero_gap_still_carries_fade_out() {
        let planner = SegmentPlanner::new(PlannerConfig {
            fade_length: 3,
            ..Default::default()
        });
        let plan = planner.plan(&table(&[(10, 20, 0)]), t(60)).unwrap();
        assert_eq!(plan.segments()[1].output_range.duration_secs(), 3);
    }

    #[test]
    fn test_start_before_fade_is_clamped() {
        let plan = SegmentPlanner::with_defaults()
            .plan(&table(&[(0, 30, 0)]), t(60))
            .unwrap();
        let content = plan.segments()[0];
        assert_eq!(secs(content.source_range), (0, 30));
        assert_eq!(content.output_range.duration_secs(), 30);
        assert_eq!(content.real_range.start, TimeValue::ZERO);
    }

    #[test]
    fn test_stop_at_media_end_is_clamped() {
        let plan = SegmentPlanner::with_defaults()
            .plan(&table(&[(10, 60, 0)]), t(60))
            .unwrap();
        assert_eq!(secs(plan.segments()[0].source_range), (9, 59));
        assert_eq!(secs(plan.segments()[1].source_range), (59, 60));
    }

    #[test]
    fn test_last_interval_to_media_end_collapses_real_gap() {
        let plan = SegmentPlanner::with_defaults()
            .plan(&table(&[(10, 120, 0)]), t(120))
            .unwrap();

        let content = plan.segments()[0];
        assert_eq!(secs(content.source_range), (9, 119));
        assert_eq!(secs(content.real_range), (0, 110));

        // No source is left after the fade-out, so the gap has output time
        // but only a single instant of real time.
        let gap = plan.segments()[1];
        assert_eq!(secs(gap.output_range), (111, 112));
        assert_eq!(secs(gap.real_range), (111, 111));
        assert_eq!(gap.real_range.duration_secs(), 0);
    }

    #[test]
    fn test_anchor_survives_clamping() {
        let planner = SegmentPlanner::new(PlannerConfig {
            fade_length: 5,
            real_time_anchor: t(9 * 3600),
        });
        let plan = planner.plan(&table(&[(2, 30, 0)]), t(60)).unwrap();
        assert_eq!(plan.segments()[0].real_range.start, t(9 * 3600));
    }

    #[test]
    fn test_adjacent_intervals_collapse_real_gap() {
        let plan = SegmentPlanner::with_defaults()
            .plan(&table(&[(10, 20, 0), (21, 30, 0)]), t(60))
            .unwrap();
        let gap = plan.segments()[1];
        assert_eq!(gap.real_range.start, gap.real_range.stop);
    }

    #[test]
    fn test_empty_table_fails() {
        let err = SegmentPlanner::with_defaults()
            .plan(&IntervalTable::default(), t(60))
            .unwrap_err();
        assert_eq!(err, PlanError::Empty);
    }

    #[test]
    fn test_zero_fade_rejected() {
        let planner = SegmentPlanner::new(PlannerConfig {
            fade_length: 0,
            ..Default::default()
        });
        assert_eq!(
            planner.plan(&table(&[(10, 20, 0)]), t(60)).unwrap_err(),
            PlanError::InvalidFadeLength
        );
    }

    #[test]
    fn test_crossed_clamps_are_degenerate() {
        let planner = SegmentPlanner::new(PlannerConfig {
            fade_length: 5,
            ..Default::default()
        });
        let err = planner.plan(&table(&[(1, 4, 0)]), t(60)).unwrap_err();
        assert!(matches!(err, PlanError::Degenerate { row: 1, .. }));

        let err = planner.plan(&table(&[(10, 20, 0), (56, 58, 0)]), t(60)).unwrap_err();
        assert!(matches!(err, PlanError::Degenerate { row: 2, .. }));
    }

    #[test]
    fn test_out_of_bounds_interval_fails_before_planning() {
        let err = SegmentPlanner::with_defaults()
            .plan(&table(&[(10, 61, 0)]), t(60))
            .unwrap_err();
        assert!(matches!(
            err,
            PlanError::Interval(IntervalError::Bounds { row: 1, .. })
        ));
    }

    #[test]
    fn test_real_time_before_zero_is_unrepresentable() {
        // The second interval lies before the anchor interval in source time.
        let err = SegmentPlanner::with_defaults()
            .plan(&table(&[(30, 40, 0), (5, 10, 0)]), t(60))
            .unwrap_err();
        assert!(matches!(
            err,
            PlanError::Unrepresentable { row: 2, axis: "real", .. }
        ));
    }

    #[test]
    fn test_plan_error_converts_to_reelcut_error() {
        let err: ReelcutError = PlanError::Empty.into();
        assert!(matches!(err, ReelcutError::Plan { .. }));
        assert!(err.to_string().contains("interval table is empty"));
    }
}
