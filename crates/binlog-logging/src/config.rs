//! Logging settings for a replay host
//!
//! Every field here is read by [`BinlogSubscriberBuilder`](crate::BinlogSubscriberBuilder).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Target used by the replay processor's log macros
pub const REPLAY_TARGET: &str = "binlog_replay";

/// Top-level logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Level for everything without a more specific directive; RUST_LOG wins if set
    pub default_level: String,

    /// Level for the replay processor alone
    ///
    /// `trace` shows discarded tombstones, `debug` shows compaction passes,
    /// `warn` keeps only corruption reports.
    pub replay_level: Option<String>,

    /// Console output, `None` to disable
    pub console: Option<ConsoleOutput>,

    /// JSONL file output, `None` to disable
    pub file: Option<FileOutput>,

    /// Shape of JSON records on both outputs
    pub json: JsonShape,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            replay_level: None,
            console: Some(ConsoleOutput::Json),
            file: None,
            json: JsonShape::default(),
        }
    }
}

impl LogConfig {
    /// Readable console output with every replay decision visible
    pub fn development() -> Self {
        Self {
            default_level: "debug".to_string(),
            replay_level: Some("trace".to_string()),
            console: Some(ConsoleOutput::Pretty { ansi: true }),
            ..Default::default()
        }
    }

    /// JSONL files only; the replay processor reports compactions as well as corruption
    pub fn production(log_dir: PathBuf) -> Self {
        Self {
            default_level: "info".to_string(),
            replay_level: Some("debug".to_string()),
            console: None,
            file: Some(FileOutput::new(log_dir)),
            json: JsonShape::default(),
        }
    }

    /// Quiet output for test binaries: only corruption warnings get through
    pub fn testing() -> Self {
        Self {
            default_level: "warn".to_string(),
            replay_level: Some("warn".to_string()),
            json: JsonShape {
                include_location: false,
                ..JsonShape::default()
            },
            ..Default::default()
        }
    }

    /// Parse settings from JSON, e.g. a section of a service config file
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Filter directive for the replay target, if one is configured
    pub fn replay_directive(&self) -> Option<String> {
        self.replay_level
            .as_ref()
            .map(|level| format!("{}={}", REPLAY_TARGET, level))
    }
}

/// How records are printed to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleOutput {
    /// One JSON object per line
    Json,
    /// Human-readable lines
    Pretty { ansi: bool },
}

/// Where and how JSONL files are written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutput {
    /// Directory for log files
    pub directory: PathBuf,
    /// File name prefix; files are `<prefix>.log` or `<prefix>.<date>.log`
    pub prefix: String,
    /// When to start a new file
    pub rotation: RotationStrategy,
    /// Rotated files to keep, `None` keeps all
    pub max_files: Option<usize>,
}

impl FileOutput {
    /// Daily-rotated `replay` files in `directory`, keeping a week
    pub fn new(directory: PathBuf) -> Self {
        Self {
            directory,
            prefix: "replay".to_string(),
            rotation: RotationStrategy::Daily,
            max_files: Some(7),
        }
    }

    /// Use a different file name prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Use a different rotation strategy
    pub fn with_rotation(mut self, rotation: RotationStrategy) -> Self {
        self.rotation = rotation;
        self
    }
}

/// File rotation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RotationStrategy {
    #[default]
    Daily,
    Hourly,
    /// One file, truncated each time the subscriber is installed
    Never,
}

/// JSON record layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonShape {
    /// Put event fields at the top level instead of under `fields`
    pub flatten_events: bool,
    /// Include every enclosing span, so the replay session shows on each record
    pub include_spans: bool,
    /// Include thread ids and names
    pub include_thread_info: bool,
    /// Include file and line
    pub include_location: bool,
}

impl Default for JsonShape {
    fn default() -> Self {
        Self {
            flatten_events: true,
            include_spans: true,
            include_thread_info: false,
            include_location: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.default_level, "info");
        assert_eq!(config.console, Some(ConsoleOutput::Json));
        assert!(config.file.is_none());
        assert!(config.replay_directive().is_none());
    }

    #[test]
    fn test_development_traces_replay() {
        let config = LogConfig::development();
        assert_eq!(config.console, Some(ConsoleOutput::Pretty { ansi: true }));
        assert_eq!(
            config.replay_directive().as_deref(),
            Some("binlog_replay=trace")
        );
    }

    #[test]
    fn test_production_writes_files_only() {
        let config = LogConfig::production(PathBuf::from("/var/log/replay"));
        assert!(config.console.is_none());
        let file = config.file.unwrap();
        assert_eq!(file.directory, PathBuf::from("/var/log/replay"));
        assert_eq!(file.prefix, "replay");
        assert_eq!(file.rotation, RotationStrategy::Daily);
    }

    #[test]
    fn test_testing_keeps_corruption_warnings() {
        let config = LogConfig::testing();
        assert_eq!(config.default_level, "warn");
        assert_eq!(
            config.replay_directive().as_deref(),
            Some("binlog_replay=warn")
        );
        assert!(!config.json.include_location);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "default_level": "error",
            "replay_level": "debug",
            "console": { "pretty": { "ansi": false } },
            "file": {
                "directory": "/srv/replay/logs",
                "prefix": "shard-3",
                "rotation": "Never",
                "max_files": null
            },
            "json": {
                "flatten_events": false,
                "include_spans": true,
                "include_thread_info": true,
                "include_location": false
            }
        }"#;
        let config = LogConfig::from_json(json).unwrap();
        assert_eq!(config.console, Some(ConsoleOutput::Pretty { ansi: false }));
        assert_eq!(
            config.replay_directive().as_deref(),
            Some("binlog_replay=debug")
        );
        let file = config.file.unwrap();
        assert_eq!(file.prefix, "shard-3");
        assert_eq!(file.rotation, RotationStrategy::Never);
        assert!(!config.json.flatten_events);

        assert!(LogConfig::from_json("{").is_err());
    }
}
