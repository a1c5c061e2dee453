//! Structured logging for binlog replay
//!
//! This crate sets up the `tracing` subscriber used by services that embed
//! the replay layer, and labels each replay pass so its records can be
//! grouped afterwards.
//!
//! # Quick Start
//!
//! ```ignore
//! use binlog_logging::{BinlogSubscriberBuilder, LogConfig, SessionContextGuard};
//!
//! // JSONL files, compactions and corruption reports from the processor
//! let _flush = BinlogSubscriberBuilder::new()
//!     .with_config(LogConfig::production("/var/log/replay".into()))
//!     .init()?;
//!
//! // Every record below carries label = "main.binlog" and a session id
//! let _session = SessionContextGuard::new("main.binlog");
//! processor.replay(records)?;
//! ```

pub mod config;
pub mod context;
pub mod layers;

pub use config::{
    ConsoleOutput, FileOutput, JsonShape, LogConfig, REPLAY_TARGET, RotationStrategy,
};
pub use context::{SessionContextData, SessionContextGuard};

use std::fs::{self, File};

use thiserror::Error;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors that can occur while building or installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    /// `replay_level` is not a valid level
    #[error("Invalid replay log level: {0}")]
    Directive(#[from] ParseError),

    /// Log directory or file could not be created
    #[error("Log file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rolling file appender could not be set up
    #[error("Log appender error: {0}")]
    Appender(#[from] InitError),

    /// A global subscriber is already installed
    #[error("Subscriber already initialized: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Builder for configuring and initializing the logging subscriber
///
/// By default, console output uses JSONL format. Use `LogConfig::development()`
/// for human-readable pretty output during development.
pub struct BinlogSubscriberBuilder {
    config: LogConfig,
}

impl BinlogSubscriberBuilder {
    /// Create a new subscriber builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    /// Set the level for the replay processor alone
    pub fn with_replay_level(mut self, level: impl Into<String>) -> Self {
        self.config.replay_level = Some(level.into());
        self
    }

    /// Set console output, `None` to disable it
    pub fn with_console(mut self, console: Option<ConsoleOutput>) -> Self {
        self.config.console = console;
        self
    }

    /// Configure file output
    pub fn with_file_output(mut self, file: FileOutput) -> Self {
        self.config.file = Some(file);
        self
    }

    /// Build the subscriber without installing it
    ///
    /// The guard, if any, flushes the file writer when dropped.
    pub fn build(
        self,
    ) -> Result<(impl Subscriber + Send + Sync + 'static, Option<WorkerGuard>), LoggingError> {
        let env_filter = build_filter(&self.config)?;
        let json = &self.config.json;

        let pretty_console = match self.config.console {
            Some(ConsoleOutput::Pretty { ansi }) => Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(ansi)
                    .with_target(true),
            ),
            _ => None,
        };

        let json_console = (self.config.console == Some(ConsoleOutput::Json))
            .then(|| layers::json_layer(std::io::stdout, json));

        let (file_layer, guard) = match &self.config.file {
            Some(file) => {
                let (writer, guard) = file_writer(file)?;
                (Some(layers::json_layer(writer, json)), Some(guard))
            }
            None => (None, None),
        };

        let subscriber = Registry::default()
            .with(env_filter)
            .with(pretty_console)
            .with(json_console)
            .with(file_layer);

        Ok((subscriber, guard))
    }

    /// Install the subscriber globally
    ///
    /// The returned guard flushes the file writer when dropped and must be
    /// kept alive for as long as file output is wanted.
    pub fn init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let (subscriber, guard) = self.build()?;
        subscriber.try_init()?;
        Ok(guard)
    }

    /// Install the subscriber unless one is already set
    ///
    /// Returns `Ok(None)` when another subscriber got there first, which is
    /// the common case in test binaries.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        match self.init() {
            Err(LoggingError::AlreadyInitialized(_)) => Ok(None),
            other => other,
        }
    }
}

impl Default for BinlogSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `RUST_LOG` or the default level, plus the replay directive on top
fn build_filter(config: &LogConfig) -> Result<EnvFilter, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    match config.replay_directive() {
        Some(directive) => Ok(filter.add_directive(directive.parse()?)),
        None => Ok(filter),
    }
}

/// Create the non-blocking file writer - truncates for Never rotation, appends for others
fn file_writer(file: &FileOutput) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    fs::create_dir_all(&file.directory)?;

    let rotation = match file.rotation {
        RotationStrategy::Never => {
            let path = file.directory.join(format!("{}.log", file.prefix));
            return Ok(tracing_appender::non_blocking(File::create(path)?));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(&file.prefix)
        .filename_suffix("log");
    if let Some(max_files) = file.max_files {
        builder = builder.max_log_files(max_files);
    }

    Ok(tracing_appender::non_blocking(builder.build(&file.directory)?))
}

/// Initialize logging for testing (corruption warnings only)
pub fn init_testing() {
    let _ = BinlogSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}
