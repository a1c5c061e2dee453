//! Replay of decoded binlog records
//!
//! The processor keeps one slot per live record id, in id order. Records are
//! never moved on rewrite; tombstoned slots are marked dead and reclaimed in
//! bulk once they dominate the table.
//!
//! ## Record handling
//!
//! - **Rewrite** of an id at or below the last key: amend or kill the live
//!   slot, or fail with `FatalCorruption` if there is none
//! - **Tombstone** for an id never held: ignored
//! - Anything else: appended, and the id must exceed the last key

mod compaction;
mod events;
mod slots;

pub use compaction::{CompactionConfig, CompactionResult};
pub use events::{EventsProcessor, ProcessorStats};
