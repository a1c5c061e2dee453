//! # Binlog Replay
//!
//! In-memory replay aggregation for an append-only binlog.
//!
//! An external reader decodes the log and feeds each [`Record`] to an
//! [`EventsProcessor`] in file order. The processor keeps an ordered view of
//! the records that are still live, applies in-place rewrites and tombstones,
//! and compacts dead slots once they make up most of the table.
//!
//! ## Features
//!
//! - **EventsProcessor**: ordered live view with running byte and slot counters
//! - **CompactionConfig**: dead-ratio threshold for automatic compaction
//! - **ProcessorStats**: serializable snapshot of session counters
//! - **Replay driver**: feed a whole record stream, stopping at corruption
//!
//! ## Example
//!
//! ```rust
//! use binlog_replay::{EventsProcessor, Record};
//!
//! let mut processor = EventsProcessor::new();
//! processor.process(Record::new(1u64, 0, "A")).unwrap();
//! processor.process(Record::new(2u64, 16, "B")).unwrap();
//! processor.process(Record::tombstone(1u64, 32)).unwrap();
//!
//! let live: Vec<_> = processor.iter_live().map(|(id, _)| id.get()).collect();
//! assert_eq!(live, vec![2]);
//! assert_eq!(processor.live_bytes(), 1);
//!
//! // Deleting the same record twice means the log is corrupt
//! assert!(processor.process(Record::tombstone(1u64, 48)).is_err());
//! ```

pub mod error;
pub mod processor;

// Re-exports
pub use error::ReplayError;
pub use processor::{CompactionConfig, CompactionResult, EventsProcessor, ProcessorStats};

// Re-export record types from binlog-core for convenience
pub use binlog_core::{CorruptionKind, FatalCorruption, Record, RecordFlags, RecordId, RecordKind};
