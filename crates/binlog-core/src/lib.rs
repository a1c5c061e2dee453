//! # Binlog Core
//!
//! Shared types for binlog replay.
//!
//! The external log reader decodes bytes into [`Record`] values; the replay
//! layer consumes them and reports [`FatalCorruption`] when the log
//! contradicts itself.
//!
//! ## Key Types
//!
//! - [`Record`]: a decoded record (id, offset, flags, kind, payload)
//! - [`RecordId`]: caller-assigned record identifier
//! - [`RecordFlags`]: header bits, notably [`RecordFlags::REWRITE`]
//! - [`RecordKind`]: normal payload or tombstone
//! - [`FatalCorruption`]: the single error kind of replay

pub mod error;
pub mod record;

pub use error::*;
pub use record::*;
