//! Per-run context.
//!
//! Every chop run gets a `RunContext` that is handed down to the render
//! pipeline. It replaces process-wide state such as a random temp-file prefix:
//! - A run id used to name scratch directories and files
//! - The run's start instant, for elapsed-time reporting
//! - The wall-clock start time, for logs and reports

use std::time::Instant;

/// Identity and timing for one planning/render run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Short identifier unique enough to keep concurrent runs apart.
    id: String,

    /// The instant the run started.
    started: Instant,

    /// Wall-clock time at start (RFC 3339 string).
    started_wall: String,
}

impl RunContext {
    /// Create a context anchored to now with a generated id.
    pub fn start() -> Self {
        let now = chrono::Utc::now();
        let id = format!(
            "{}{:05}",
            now.format("%Y%m%d%H%M%S"),
            (now.timestamp_subsec_micros() ^ std::process::id()) % 100_000
        );
        Self::with_id(id)
    }

    /// Create a context with a caller-chosen id (tests, reproducible runs).
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            started: Instant::now(),
            started_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// The run id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Prefix for temporary artifacts belonging to this run.
    pub fn temp_prefix(&self) -> String {
        format!("reelcut_{}_", self.id)
    }

    /// Seconds elapsed since the run started.
    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Wall-clock start time.
    pub fn started_wall(&self) -> &str {
        &self.started_wall
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_prefix_embeds_id() {
        let run = RunContext::with_id("abc");
        assert_eq!(run.id(), "abc");
        assert_eq!(run.temp_prefix(), "reelcut_abc_");
    }

    #[test]
    fn test_generated_id_is_filename_safe() {
        let run = RunContext::start();
        assert!(!run.id().is_empty());
        assert!(run.id().chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(run.elapsed_secs() < 1.0);
        assert!(!run.started_wall().is_empty());
    }
}
