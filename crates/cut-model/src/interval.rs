//! Extraction requests loaded from a table.
//!
//! Each row names a source range to keep and an optional black gap to insert
//! after it. Start and stop columns must be fully populated; the gap column
//! is optional and its blank cells mean "no gap".

use serde::{Deserialize, Serialize};

use crate::table::Table;
use crate::timecode::{TimeValue, TimecodeError};

/// One validated extraction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    /// 1-based data row in the source table (header excluded).
    pub row: usize,

    /// Requested start in source time.
    pub source_start: TimeValue,

    /// Requested stop in source time.
    pub source_stop: TimeValue,

    /// Black gap to insert after this interval.
    #[serde(default)]
    pub gap_after: TimeValue,
}

/// Column names used to read intervals from a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalColumns {
    pub start: String,
    pub stop: String,
    pub gap: Option<String>,
}

impl Default for IntervalColumns {
    fn default() -> Self {
        Self {
            start: "start".to_string(),
            stop: "stop".to_string(),
            gap: None,
        }
    }
}

/// Validated, ordered collection of intervals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalTable {
    intervals: Vec<Interval>,
}

/// Interval validation failures. Rows are 1-based data rows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntervalError {
    #[error("table does not have column '{column}'")]
    MissingColumn { column: String },

    #[error("column '{column}' has a missing value in row {row}")]
    MissingValue { row: usize, column: String },

    #[error("row {row}, column '{column}': {source}")]
    Time {
        row: usize,
        column: String,
        #[source]
        source: TimecodeError,
    },

    #[error("row {row}: stop time '{stop}' is before or identical to start time '{start}'")]
    Ordering {
        row: usize,
        start: TimeValue,
        stop: TimeValue,
    },

    #[error("row {row}: stop time '{stop}' is longer than the video ({duration})")]
    Bounds {
        row: usize,
        stop: TimeValue,
        duration: TimeValue,
    },

    #[error("{} invalid interval(s):\n{}", errors.len(), render_errors(errors))]
    Invalid { errors: Vec<IntervalError> },
}

fn render_errors(errors: &[IntervalError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl IntervalError {
    /// Fold collected errors: none is success, one is itself, many are
    /// wrapped in `Invalid`.
    fn collect(mut errors: Vec<IntervalError>) -> Result<(), IntervalError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(IntervalError::Invalid { errors }),
        }
    }

    /// Every individual failure, flattening `Invalid`.
    pub fn issues(&self) -> Vec<&IntervalError> {
        match self {
            IntervalError::Invalid { errors } => errors.iter().collect(),
            other => vec![other],
        }
    }
}

impl IntervalTable {
    /// Load intervals from a table.
    ///
    /// Checks the schema, the format of every cell and the ordering of every
    /// row. All row-level problems are reported together; no row is dropped.
    pub fn load(table: &Table, columns: &IntervalColumns) -> Result<Self, IntervalError> {
        let starts = table
            .column(&columns.start)
            .ok_or_else(|| IntervalError::MissingColumn {
                column: columns.start.clone(),
            })?;
        let stops = table
            .column(&columns.stop)
            .ok_or_else(|| IntervalError::MissingColumn {
                column: columns.stop.clone(),
            })?;
        let gaps = match &columns.gap {
            Some(name) => Some(table.column(name).ok_or_else(|| {
                IntervalError::MissingColumn {
                    column: name.clone(),
                }
            })?),
            None => None,
        };

        let mut errors = Vec::new();
        let mut intervals = Vec::with_capacity(table.len());

        for (idx, (start, stop)) in starts.iter().zip(&stops).enumerate() {
            let row = idx + 1;
            let start = required_time(*start, row, &columns.start, &mut errors);
            let stop = required_time(*stop, row, &columns.stop, &mut errors);
            let gap_after = match (&gaps, &columns.gap) {
                (Some(cells), Some(name)) => optional_time(cells[idx], row, name, &mut errors),
                _ => Some(TimeValue::ZERO),
            };

            if let (Some(start), Some(stop), Some(gap_after)) = (start, stop, gap_after) {
                let interval = Interval {
                    row,
                    source_start: start,
                    source_stop: stop,
                    gap_after,
                };
                match interval.check_ordering() {
                    Ok(()) => intervals.push(interval),
                    Err(e) => errors.push(e),
                }
            }
        }

        IntervalError::collect(errors)?;
        Ok(Self { intervals })
    }

    /// Build from already-typed intervals, checking their ordering.
    pub fn from_intervals(intervals: Vec<Interval>) -> Result<Self, IntervalError> {
        let errors = intervals
            .iter()
            .filter_map(|i| i.check_ordering().err())
            .collect();
        IntervalError::collect(errors)?;
        Ok(Self { intervals })
    }

    /// Reject every interval that stops past the end of the media.
    pub fn check_bounds(&self, duration: TimeValue) -> Result<(), IntervalError> {
        let errors = self
            .intervals
            .iter()
            .filter(|i| i.source_stop > duration)
            .map(|i| IntervalError::Bounds {
                row: i.row,
                stop: i.source_stop,
                duration,
            })
            .collect();
        IntervalError::collect(errors)
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Interval> {
        self.intervals.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }
}

impl<'a> IntoIterator for &'a IntervalTable {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}

impl Interval {
    /// Interval with no gap; handy for programmatic construction.
    pub fn new(row: usize, source_start: TimeValue, source_stop: TimeValue) -> Self {
        Self {
            row,
            source_start,
            source_stop,
            gap_after: TimeValue::ZERO,
        }
    }

    pub fn with_gap(mut self, gap_after: TimeValue) -> Self {
        self.gap_after = gap_after;
        self
    }

    fn check_ordering(&self) -> Result<(), IntervalError> {
        if self.source_stop <= self.source_start {
            return Err(IntervalError::Ordering {
                row: self.row,
                start: self.source_start,
                stop: self.source_stop,
            });
        }
        Ok(())
    }
}

fn required_time(
    cell: Option<&str>,
    row: usize,
    column: &str,
    errors: &mut Vec<IntervalError>,
) -> Option<TimeValue> {
    match cell {
        Some(text) => parse_cell(text, row, column, errors),
        None => {
            errors.push(IntervalError::MissingValue {
                row,
                column: column.to_string(),
            });
            None
        }
    }
}

fn optional_time(
    cell: Option<&str>,
    row: usize,
    column: &str,
    errors: &mut Vec<IntervalError>,
) -> Option<TimeValue> {
    match cell {
        Some(text) => parse_cell(text, row, column, errors),
        None => Some(TimeValue::ZERO),
    }
}

fn parse_cell(
    text: &str,
    row: usize,
    column: &str,
    errors: &mut Vec<IntervalError>,
) -> Option<TimeValue> {
    TimeValue::parse(text)
        .map_err(|source| {
            errors.push(IntervalError::Time {
                row,
                column: column.to_string(),
                source,
            })
        })
        .ok()
}
