//! Timebase export: the output-time ↔ real-time map as a table.
//!
//! One row per plan segment, in plan order:
//!
//! ```text
//! section_type,real_start,real_stop,video_start,video_stop
//! content,00:00:00,00:00:11,00:00:00,00:00:11
//! gap,00:00:12,00:01:48,00:00:12,00:00:15
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_cut_model::{SegmentPlan, TimeValue};

/// Column names of the exported table, in order.
pub const TIMEBASE_COLUMNS: [&str; 5] = [
    "section_type",
    "real_start",
    "real_stop",
    "video_start",
    "video_stop",
];

/// One exported row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimebaseRow {
    pub section_type: &'static str,
    pub real_start: TimeValue,
    pub real_stop: TimeValue,
    pub video_start: TimeValue,
    pub video_stop: TimeValue,
}

/// Output encoding for a timebase file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimebaseFormat {
    Csv,
    Json,
}

impl TimebaseFormat {
    /// JSON for `.json` paths, CSV for everything else.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Csv,
        }
    }
}

/// Renders a plan's real and output ranges to a tabular sink.
pub struct TimebaseExporter<'a> {
    plan: &'a SegmentPlan,
}

impl<'a> TimebaseExporter<'a> {
    pub fn new(plan: &'a SegmentPlan) -> Self {
        Self { plan }
    }

    /// Rows in plan order.
    pub fn rows(&self) -> Vec<TimebaseRow> {
        self.plan
            .iter()
            .map(|segment| TimebaseRow {
                section_type: segment.kind.as_str(),
                real_start: segment.real_range.start,
                real_stop: segment.real_range.stop,
                video_start: segment.output_range.start,
                video_stop: segment.output_range.stop,
            })
            .collect()
    }

    /// Write a header line plus one CSV line per segment.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writeln!(writer, "{}", TIMEBASE_COLUMNS.join(","))?;
        for row in self.rows() {
            writeln!(
                writer,
                "{},{},{},{},{}",
                row.section_type, row.real_start, row.real_stop, row.video_start, row.video_stop
            )?;
        }
        Ok(())
    }

    /// Write the rows as a pretty-printed JSON array.
    pub fn write_json<W: Write>(&self, mut writer: W) -> ReelcutResult<()> {
        serde_json::to_writer_pretty(&mut writer, &self.rows())?;
        writeln!(writer)?;
        Ok(())
    }

    /// Render into memory in the given format.
    pub fn render(&self, format: TimebaseFormat) -> ReelcutResult<Vec<u8>> {
        let mut buffer = Vec::new();
        match format {
            TimebaseFormat::Csv => self.write_csv(&mut buffer)?,
            TimebaseFormat::Json => self.write_json(&mut buffer)?,
        }
        Ok(buffer)
    }

    /// Write the timebase file, refusing to replace an existing one unless
    /// `overwrite` is set.
    pub fn export_file(&self, path: impl AsRef<Path>, overwrite: bool) -> ReelcutResult<PathBuf> {
        let path = path.as_ref();
        ReelcutError::ensure_writable(path, overwrite)?;

        let format = TimebaseFormat::from_path(path);
        let content = self.render(format)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        tracing::info!(
            path = %path.display(),
            rows = self.plan.len(),
            format = ?format,
            "Wrote timebase file"
        );
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcut_cut_model::{Interval, IntervalTable};

    use crate::planner::SegmentPlanner;

    fn plan() -> SegmentPlan {
        let t = |s: i64| TimeValue::from_secs(s).unwrap();
        let intervals = IntervalTable::from_intervals(vec![
            Interval::new(1, t(10), t(20)).with_gap(t(2)),
        ])
        .unwrap();
        SegmentPlanner::with_defaults().plan(&intervals, t(120)).unwrap()
    }

    #[test]
    fn test_csv_layout() {
        let plan = plan();
        let bytes = TimebaseExporter::new(&plan).render(TimebaseFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(
            text,
            "section_type,real_start,real_stop,video_start,video_stop\n\
             content,00:00:00,00:00:11,00:00:00,00:00:11\n\
             gap,00:00:12,00:01:48,00:00:12,00:00:15\n"
        );
    }

    #[test]
    fn test_json_rows_use_timecode_text() {
        let plan = plan();
        let bytes = TimebaseExporter::new(&plan).render(TimebaseFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[0]["section_type"], "content");
        assert_eq!(value[1]["video_stop"], "00:00:15");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            TimebaseFormat::from_path(Path::new("map.JSON")),
            TimebaseFormat::Json
        );
        assert_eq!(
            TimebaseFormat::from_path(Path::new("map.csv")),
            TimebaseFormat::Csv
        );
        assert_eq!(
            TimebaseFormat::from_path(Path::new("map")),
            TimebaseFormat::Csv
        );
    }

    #[test]
    fn test_export_file_refuses_existing_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timebase.csv");
        std::fs::write(&path, "keep me").unwrap();

        let plan = plan();
        let exporter = TimebaseExporter::new(&plan);

        let err = exporter.export_file(&path, false).unwrap_err();
        assert!(matches!(err, ReelcutError::OutputExists { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");

        exporter.export_file(&path, true).unwrap();
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .starts_with("section_type,"));
    }
}
