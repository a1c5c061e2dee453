//! Replay aggregation of decoded binlog records
//!
//! [`EventsProcessor`] is fed every record of one log, in file order. New ids
//! are appended, rewrites amend a live slot in place, and tombstones mark a
//! slot dead until the next compaction drops it.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};

use binlog_core::{FatalCorruption, Record, RecordFlags, RecordId};

use super::compaction::{CompactionConfig, CompactionResult};
use super::slots::SlotTable;
use crate::error::ReplayError;

/// Point-in-time counters of a replay session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessorStats {
    /// Slots held, live and dead
    pub total_slots: u64,
    /// Tombstoned slots awaiting compaction
    pub dead_slots: u64,
    /// Slots still visible
    pub live_count: u64,
    /// Payload bytes of live slots
    pub live_bytes: u64,
    /// Offset of the most recent record
    pub last_offset: u64,
    /// Id of the most recent append
    pub last_id: RecordId,
    /// Compaction passes that reclaimed at least one slot
    pub compactions: u64,
    /// Records accepted by `process`
    pub records_processed: u64,
    /// Tombstones dropped because their id was never held
    pub tombstones_discarded: u64,
}

/// In-memory aggregator for one replay pass over a binlog
///
/// Single owner, single threaded: every mutation takes `&mut self`.
#[derive(Debug)]
pub struct EventsProcessor {
    table: SlotTable,
    config: CompactionConfig,
    live_bytes: u64,
    dead_slots: u64,
    last_offset: u64,
    last_id: RecordId,
    compactions: u64,
    records_processed: u64,
    tombstones_discarded: u64,
}

impl Default for EventsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl EventsProcessor {
    /// Create a processor with the default compaction policy
    pub fn new() -> Self {
        Self::build(CompactionConfig::default())
    }

    /// Create a processor with a custom compaction policy
    pub fn with_config(config: CompactionConfig) -> Result<Self, ReplayError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: CompactionConfig) -> Self {
        Self {
            table: SlotTable::new(),
            config,
            live_bytes: 0,
            dead_slots: 0,
            last_offset: 0,
            last_id: RecordId::default(),
            compactions: 0,
            records_processed: 0,
            tombstones_discarded: 0,
        }
    }

    /// Feed the next record of the log
    ///
    /// `last_offset` is updated before the record is classified, so it moves
    /// even when the record turns out to be corrupt. On error nothing else
    /// changes and the session must be abandoned.
    pub fn process(&mut self, record: Record) -> Result<(), FatalCorruption> {
        self.last_offset = record.offset;

        let targets_existing = record.is_rewrite()
            && self
                .table
                .last_key()
                .is_some_and(|last| last >= record.id);

        if targets_existing {
            self.apply_rewrite(record)?;
        } else if record.is_tombstone() {
            trace!(
                id = record.id.get(),
                offset = record.offset,
                "Skipping tombstone for unknown record"
            );
            self.tombstones_discarded += 1;
        } else {
            self.append(record)?;
        }

        self.records_processed += 1;

        if self.config.should_compact(self.total_slots(), self.dead_slots) {
            self.compactify();
        }

        Ok(())
    }

    fn apply_rewrite(&mut self, mut record: Record) -> Result<(), FatalCorruption> {
        let pos = self
            .table
            .position(record.id)
            .filter(|&pos| self.table.live_at(pos).is_some());

        let Some(pos) = pos else {
            warn!(
                id = record.id.get(),
                offset = record.offset,
                kind = %record.kind,
                "Rewrite targets a record with no live slot"
            );
            return Err(FatalCorruption::missing_rewrite_target(
                record.id,
                record.offset,
                self.table.last_key(),
            ));
        };

        if record.is_tombstone() {
            if let Some(old) = self.table.kill(pos) {
                self.live_bytes -= old.payload_len();
            }
            self.dead_slots += 1;
        } else {
            record.flags.remove(RecordFlags::REWRITE);
            let new_len = record.payload_len();
            if let Some(old) = self.table.replace(pos, record) {
                self.live_bytes -= old.payload_len();
            }
            self.live_bytes += new_len;
        }

        Ok(())
    }

    fn append(&mut self, record: Record) -> Result<(), FatalCorruption> {
        let id = record.id;
        let offset = record.offset;
        let len = record.payload_len();

        self.table.push(record).map_err(|last_key| {
            warn!(
                id = id.get(),
                offset,
                last_key = last_key.get(),
                "Record id does not advance past the last key"
            );
            FatalCorruption::out_of_order(id, offset, last_key)
        })?;

        self.last_id = id;
        self.live_bytes += len;
        Ok(())
    }

    /// Drop every dead slot, keeping live ones in order
    ///
    /// Runs automatically once the dead fraction crosses the configured
    /// threshold; calling it again without intervening mutation is a no-op.
    pub fn compactify(&mut self) -> CompactionResult {
        let slots_before = self.total_slots();
        let reclaimed = self.table.retain_live() as u64;
        self.dead_slots = 0;

        let result = CompactionResult {
            slots_before,
            slots_reclaimed: reclaimed,
            slots_retained: self.total_slots(),
        };

        if !result.is_noop() {
            self.compactions += 1;
            debug!(
                before = result.slots_before,
                reclaimed = result.slots_reclaimed,
                retained = result.slots_retained,
                "Compacted replay slots"
            );
        }

        result
    }

    /// Feed records until the iterator ends or the log proves corrupt
    ///
    /// Returns how many records were accepted. On corruption the error carries
    /// the count accepted before the bad record.
    #[instrument(skip_all)]
    pub fn replay<I>(&mut self, records: I) -> Result<u64, ReplayError>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut processed = 0u64;
        for record in records {
            self.process(record)
                .map_err(|source| ReplayError::Corrupted { processed, source })?;
            processed += 1;
        }

        info!(
            processed,
            live = self.live_count(),
            live_bytes = self.live_bytes,
            last_offset = self.last_offset,
            "Replay finished"
        );
        Ok(processed)
    }

    /// Payload bytes held by live slots
    pub fn live_bytes(&self) -> u64 {
        self.live_bytes
    }

    /// Number of live slots
    pub fn live_count(&self) -> u64 {
        self.total_slots() - self.dead_slots
    }

    /// Number of slots, live and dead
    pub fn total_slots(&self) -> u64 {
        self.table.len() as u64
    }

    /// Number of tombstoned slots awaiting compaction
    pub fn dead_count(&self) -> u64 {
        self.dead_slots
    }

    /// Offset of the most recently processed record
    pub fn last_offset(&self) -> u64 {
        self.last_offset
    }

    /// Id of the most recent append
    pub fn last_id(&self) -> RecordId {
        self.last_id
    }

    /// Whether no slot is held
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The compaction policy in effect
    pub fn config(&self) -> &CompactionConfig {
        &self.config
    }

    /// `(id, payload)` of every live record in insertion order
    ///
    /// The borrow keeps the processor frozen, so calling this again before the
    /// next mutation yields the same sequence.
    pub fn iter_live(&self) -> impl Iterator<Item = (RecordId, &Bytes)> + Clone + '_ {
        self.table.live_payloads()
    }

    /// Visit every live record in insertion order
    pub fn for_each_live<F>(&self, f: F)
    where
        F: FnMut(&Record),
    {
        self.table.live().for_each(f);
    }

    /// Look up a live record by id
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.table
            .position(id)
            .and_then(|pos| self.table.live_at(pos))
    }

    /// Snapshot of the session counters
    pub fn stats(&self) -> ProcessorStats {
        ProcessorStats {
            total_slots: self.total_slots(),
            dead_slots: self.dead_slots,
            live_count: self.live_count(),
            live_bytes: self.live_bytes,
            last_offset: self.last_offset,
            last_id: self.last_id,
            compactions: self.compactions,
            records_processed: self.records_processed,
            tombstones_discarded: self.tombstones_discarded,
        }
    }

    /// End the session, handing live records to the consumer in order
    pub fn into_live_records(self) -> Vec<Record> {
        self.table.into_live().collect()
    }
}
