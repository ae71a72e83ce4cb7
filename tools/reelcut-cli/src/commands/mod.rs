pub mod check;
pub mod chop;
pub mod plan;
pub mod probe;

use std::path::{Path, PathBuf};

use clap::Args;

use reelcut_common::config::AppConfig;
use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_cut_model::{IntervalColumns, IntervalTable, Table, TimeValue};
use reelcut_planner::PlannerConfig;

/// Interval table and planning options shared by `chop` and `plan`.
#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    /// Interval table (.csv, .tsv or .json)
    pub table: PathBuf,

    /// Column holding interval starts (HH:MM:SS)
    #[arg(short = 's', long)]
    pub start_column: Option<String>,

    /// Column holding interval stops (HH:MM:SS)
    #[arg(short = 'p', long)]
    pub stop_column: Option<String>,

    /// Column holding the gap after each interval (HH:MM:SS)
    #[arg(short = 'g', long)]
    pub gap_column: Option<String>,

    /// Fade length in seconds
    #[arg(short = 'f', long)]
    pub fade_length: Option<u32>,

    /// Real time (HH:MM:SS) of the first output frame
    #[arg(short = 'r', long)]
    pub real_time: Option<String>,
}

impl TableArgs {
    /// Column names, flags first, then config.
    pub fn columns(&self, config: &AppConfig) -> IntervalColumns {
        IntervalColumns {
            start: self
                .start_column
                .clone()
                .unwrap_or_else(|| config.planner.start_column.clone()),
            stop: self
                .stop_column
                .clone()
                .unwrap_or_else(|| config.planner.stop_column.clone()),
            gap: self
                .gap_column
                .clone()
                .or_else(|| config.planner.gap_column.clone()),
        }
    }

    /// Planner parameters, flags first, then config.
    pub fn planner_config(&self, config: &AppConfig) -> ReelcutResult<PlannerConfig> {
        let real_time = self
            .real_time
            .as_deref()
            .unwrap_or(&config.planner.real_time);
        let real_time_anchor = TimeValue::parse(real_time)
            .map_err(|e| ReelcutError::config(format!("Invalid real time '{real_time}': {e}")))?;
        Ok(PlannerConfig {
            fade_length: self.fade_length.unwrap_or(config.planner.fade_length),
            real_time_anchor,
        })
    }

    /// Read and validate the interval table.
    pub fn load_intervals(&self, config: &AppConfig) -> ReelcutResult<IntervalTable> {
        ensure_exists(&self.table)?;
        let table = Table::read(&self.table).map_err(|e| {
            ReelcutError::table(format!("Failed to read {}: {e}", self.table.display()))
        })?;
        let intervals = IntervalTable::load(&table, &self.columns(config)).map_err(|e| {
            ReelcutError::table(format!("Invalid intervals in {}: {e}", self.table.display()))
        })?;
        tracing::info!(
            path = %self.table.display(),
            intervals = intervals.len(),
            "Loaded interval table"
        );
        Ok(intervals)
    }
}

/// Fail with `FileNotFound` unless `path` exists.
pub fn ensure_exists(path: &Path) -> Result<(), ReelcutError> {
    if path.exists() {
        Ok(())
    } else {
        Err(ReelcutError::FileNotFound {
            path: path.to_path_buf(),
        })
    }
}
