//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default planning parameters.
    pub planner: PlannerDefaults,

    /// Default render parameters.
    pub render: RenderDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default planning parameters, overridable from the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerDefaults {
    /// Fade length in whole seconds.
    pub fade_length: u32,

    /// Real time (`HH:MM:SS`) of the first output frame.
    pub real_time: String,

    /// Table column holding interval starts.
    pub start_column: String,

    /// Table column holding interval stops.
    pub stop_column: String,

    /// Table column holding gaps after each interval (none = no gaps).
    pub gap_column: Option<String>,
}

/// Default render parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Maximum number of concurrent ffmpeg processes.
    pub workers: usize,

    /// ffmpeg binary name or path.
    pub ffmpeg: String,

    /// ffprobe binary name or path.
    pub ffprobe: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelcut=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for PlannerDefaults {
    fn default() -> Self {
        Self {
            fade_length: 1,
            real_time: "00:00:00".to_string(),
            start_column: "start".to_string(),
            stop_column: "stop".to_string(),
            gap_column: None,
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(2),
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match Self::from_json(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Parse a config document; missing sections and fields take defaults.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reelcut").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_cli_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.planner.fade_length, 1);
        assert_eq!(config.planner.real_time, "00:00:00");
        assert_eq!(config.planner.start_column, "start");
        assert_eq!(config.planner.stop_column, "stop");
        assert!(config.planner.gap_column.is_none());
        assert!(config.render.workers >= 1);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config =
            AppConfig::from_json(r#"{"planner": {"fade_length": 2, "gap_column": "gap"}}"#)
                .unwrap();
        assert_eq!(config.planner.fade_length, 2);
        assert_eq!(config.planner.gap_column.as_deref(), Some("gap"));
        assert_eq!(config.planner.start_column, "start");
        assert_eq!(config.render.ffmpeg, "ffmpeg");
        assert_eq!(config.logging.level, "info");
    }
}
