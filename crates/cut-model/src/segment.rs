//! Segment plans: the three-timeline map produced by the planner.
//!
//! Every plan segment carries three ranges:
//! - **source**: where the material comes from in the original file
//! - **output**: where it lands in the assembled file
//! - **real**: the wall-clock span it stands for
//!
//! Output ranges are laid end to end with a one-second guard band:
//! segment `n + 1` starts at `output.stop(n) + 1`, segment 0 at zero.

use serde::{Deserialize, Serialize};

use crate::timecode::TimeValue;

/// What a segment contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Fade from black into content (re-encoded).
    FadeIn,
    /// Kept source material; plan entries include the leading fade-in.
    Content,
    /// Fade from content to black (re-encoded).
    FadeOut,
    /// Black gap; plan entries include the leading fade-out.
    Gap,
}

impl SegmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SegmentKind::FadeIn => "fade_in",
            SegmentKind::Content => "content",
            SegmentKind::FadeOut => "fade_out",
            SegmentKind::Gap => "gap",
        }
    }
}

/// Inclusive `[start, stop]` span on one timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TimeValue,
    pub stop: TimeValue,
}

impl TimeRange {
    /// Build a range; `None` if `stop < start`.
    pub fn new(start: TimeValue, stop: TimeValue) -> Option<Self> {
        (start <= stop).then_some(Self { start, stop })
    }

    /// Seconds between start and stop.
    pub fn duration_secs(&self) -> u32 {
        self.stop.as_secs() - self.start.as_secs()
    }

    pub fn contains(&self, t: TimeValue) -> bool {
        self.start <= t && t <= self.stop
    }
}

/// One entry of a segment plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,

    /// Index of the interval this segment was planned from.
    pub interval_index: usize,

    /// Table row of that interval (1-based).
    pub row: usize,

    pub source_range: TimeRange,
    pub output_range: TimeRange,
    pub real_range: TimeRange,
}

/// Ordered, immutable plan produced for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentPlan {
    segments: Vec<Segment>,
    fade_length: u32,
    media_duration: TimeValue,
    real_offset: i64,
}

impl SegmentPlan {
    /// Assemble a plan from planned segments.
    ///
    /// `real_offset` is the fixed difference `real - source` established by
    /// the first interval.
    pub fn new(
        segments: Vec<Segment>,
        fade_length: u32,
        media_duration: TimeValue,
        real_offset: i64,
    ) -> Self {
        Self {
            segments,
            fade_length,
            media_duration,
            real_offset,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn fade_length(&self) -> u32 {
        self.fade_length
    }

    pub fn media_duration(&self) -> TimeValue {
        self.media_duration
    }

    pub fn real_offset(&self) -> i64 {
        self.real_offset
    }

    /// Last output time covered by the plan.
    pub fn output_end(&self) -> TimeValue {
        self.segments
            .last()
            .map(|s| s.output_range.stop)
            .unwrap_or(TimeValue::ZERO)
    }

    /// The segment whose output range covers `t`.
    pub fn locate(&self, t: TimeValue) -> Option<&Segment> {
        self.segments.iter().find(|s| s.output_range.contains(t))
    }

    /// Real time shown at output time `t`.
    ///
    /// Only defined inside content, where output and real time advance
    /// together; gaps compress or stretch real time.
    pub fn output_to_real(&self, t: TimeValue) -> Option<TimeValue> {
        let segment = self.locate(t)?;
        if segment.kind != SegmentKind::Content {
            return None;
        }
        let offset = t.as_i64() - segment.output_range.start.as_i64();
        TimeValue::from_secs(segment.real_range.start.as_i64() + offset).ok()
    }

    /// Source time shown at output time `t` (content only).
    pub fn output_to_source(&self, t: TimeValue) -> Option<TimeValue> {
        let segment = self.locate(t)?;
        if segment.kind != SegmentKind::Content {
            return None;
        }
        let offset = t.as_i64() - segment.output_range.start.as_i64();
        TimeValue::from_secs(segment.source_range.start.as_i64() + offset).ok()
    }

    /// Whether output ranges start at zero and follow the guard-band rule.
    pub fn is_contiguous(&self) -> bool {
        let starts_at_zero = self
            .segments
            .first()
            .map_or(true, |s| s.output_range.start == TimeValue::ZERO);
        starts_at_zero
            && self.segments.windows(2).all(|pair| {
                pair[1].output_range.start.as_i64() == pair[0].output_range.stop.as_i64() + 1
            })
    }
}

impl<'a> IntoIterator for &'a SegmentPlan {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: i64, stop: i64) -> TimeRange {
        TimeRange::new(
            TimeValue::from_secs(start).unwrap(),
            TimeValue::from_secs(stop).unwrap(),
        )
        .unwrap()
    }

    fn sample_plan() -> SegmentPlan {
        SegmentPlan::new(
            vec![
                Segment {
                    kind: SegmentKind::Content,
                    interval_index: 0,
                    row: 1,
                    source_range: range(9, 20),
                    output_range: range(0, 11),
                    real_range: range(100, 111),
                },
                Segment {
                    kind: SegmentKind::Gap,
                    interval_index: 0,
                    row: 1,
                    source_range: range(20, 21),
                    output_range: range(12, 15),
                    real_range: range(112, 200),
                },
            ],
            1,
            TimeValue::from_secs(120).unwrap(),
            91,
        )
    }

    #[test]
    fn test_time_range_rejects_reversed_bounds() {
        let a = TimeValue::from_secs(5).unwrap();
        let b = TimeValue::from_secs(4).unwrap();
        assert!(TimeRange::new(a, b).is_none());
        assert_eq!(TimeRange::new(b, a).unwrap().duration_secs(), 1);
    }

    #[test]
    fn test_locate_and_map_output_time() {
        let plan = sample_plan();
        let t = TimeValue::from_secs(5).unwrap();

        assert_eq!(plan.locate(t).unwrap().kind, SegmentKind::Content);
        assert_eq!(plan.output_to_real(t).unwrap().as_secs(), 105);
        assert_eq!(plan.output_to_source(t).unwrap().as_secs(), 14);

        let in_gap = TimeValue::from_secs(13).unwrap();
        assert_eq!(plan.locate(in_gap).unwrap().kind, SegmentKind::Gap);
        assert!(plan.output_to_real(in_gap).is_none());
        assert!(plan.locate(TimeValue::from_secs(16).unwrap()).is_none());
    }

    #[test]
    fn test_contiguity_and_output_end() {
        let plan = sample_plan();
        assert!(plan.is_contiguous());
        assert_eq!(plan.output_end().as_secs(), 15);

        let mut broken = plan.segments().to_vec();
        broken[1].output_range = range(13, 16);
        let broken = SegmentPlan::new(broken, 1, plan.media_duration(), plan.real_offset());
        assert!(!broken.is_contiguous());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(SegmentKind::Content.as_str(), "content");
        assert_eq!(SegmentKind::Gap.as_str(), "gap");
        assert_eq!(
            serde_json::to_string(&SegmentKind::FadeIn).unwrap(),
            "\"fade_in\""
        );
    }
}
