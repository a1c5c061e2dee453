//! Error types for binlog-replay
//!
//! This module defines the error types returned by the replay layer.

use thiserror::Error;

use binlog_core::FatalCorruption;

/// Errors that can occur while replaying a binlog
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The log contradicted records already replayed
    #[error("Replay aborted after {processed} records: {source}")]
    Corrupted {
        /// Records accepted before the corrupt one
        processed: u64,
        /// What was wrong with the corrupt record
        source: FatalCorruption,
    },

    /// Compaction settings are unusable
    #[error("Invalid compaction config: {0}")]
    InvalidConfig(String),
}

impl ReplayError {
    /// Create a new InvalidConfig error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// The corruption behind this error, if any
    pub fn corruption(&self) -> Option<&FatalCorruption> {
        match self {
            Self::Corrupted { source, .. } => Some(source),
            Self::InvalidConfig(_) => None,
        }
    }
}
