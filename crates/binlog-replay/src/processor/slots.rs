//! Ordered slot storage
//!
//! Keys and slots live in two parallel vectors owned by one [`SlotTable`].
//! Appending is the only way in and [`SlotTable::retain_live`] is the only
//! way out, so the table can keep `keys` strictly ascending and both vectors
//! the same length.

use bytes::Bytes;

use binlog_core::{Record, RecordId};

/// A position in the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Record still visible to replay consumers
    Live(Record),
    /// Tombstoned; waiting for compaction
    Dead,
}

impl Slot {
    pub(crate) fn is_live(&self) -> bool {
        matches!(self, Slot::Live(_))
    }

    pub(crate) fn as_live(&self) -> Option<&Record> {
        match self {
            Slot::Live(record) => Some(record),
            Slot::Dead => None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct SlotTable {
    keys: Vec<RecordId>,
    slots: Vec<Slot>,
}

impl SlotTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Largest key ever appended and not yet compacted away
    pub(crate) fn last_key(&self) -> Option<RecordId> {
        self.keys.last().copied()
    }

    /// Position of an exact key match
    pub(crate) fn position(&self, id: RecordId) -> Option<usize> {
        self.keys.binary_search(&id).ok()
    }

    /// Live record at a position
    pub(crate) fn live_at(&self, pos: usize) -> Option<&Record> {
        self.slots.get(pos).and_then(Slot::as_live)
    }

    /// Append a record behind the current last key
    ///
    /// Returns the last key back if `record.id` does not advance past it.
    pub(crate) fn push(&mut self, record: Record) -> Result<(), RecordId> {
        if let Some(last) = self.last_key() {
            if record.id <= last {
                return Err(last);
            }
        }
        self.keys.push(record.id);
        self.slots.push(Slot::Live(record));
        Ok(())
    }

    /// Replace the record at a position, keeping its key
    pub(crate) fn replace(&mut self, pos: usize, record: Record) -> Option<Record> {
        debug_assert_eq!(self.keys[pos], record.id);
        match std::mem::replace(&mut self.slots[pos], Slot::Live(record)) {
            Slot::Live(old) => Some(old),
            Slot::Dead => None,
        }
    }

    /// Mark a position dead, dropping its record
    pub(crate) fn kill(&mut self, pos: usize) -> Option<Record> {
        match std::mem::replace(&mut self.slots[pos], Slot::Dead) {
            Slot::Live(old) => Some(old),
            Slot::Dead => None,
        }
    }

    /// Drop every dead slot in place, preserving order
    ///
    /// Returns the number of slots removed.
    pub(crate) fn retain_live(&mut self) -> usize {
        let before = self.slots.len();
        let mut write = 0;
        for read in 0..before {
            if self.slots[read].is_live() {
                if write != read {
                    self.keys.swap(write, read);
                    self.slots.swap(write, read);
                }
                write += 1;
            }
        }
        self.keys.truncate(write);
        self.slots.truncate(write);
        before - write
    }

    /// Live records in insertion order
    pub(crate) fn live(&self) -> impl Iterator<Item = &Record> + Clone + '_ {
        self.slots.iter().filter_map(Slot::as_live)
    }

    /// `(id, payload)` pairs of live records in insertion order
    pub(crate) fn live_payloads(&self) -> impl Iterator<Item = (RecordId, &Bytes)> + Clone + '_ {
        self.live().map(|record| (record.id, &record.payload))
    }

    pub(crate) fn into_live(self) -> impl Iterator<Item = Record> {
        self.slots.into_iter().filter_map(|slot| match slot {
            Slot::Live(record) => Some(record),
            Slot::Dead => None,
        })
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> &[RecordId] {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(ids: &[u64]) -> SlotTable {
        let mut table = SlotTable::new();
        for &id in ids {
            table.push(Record::new(id, id * 10, format!("r{}", id))).unwrap();
        }
        table
    }

    #[test]
    fn test_push_requires_ascending_keys() {
        let mut table = table_with(&[1, 5]);
        assert_eq!(table.push(Record::new(5u64, 0, "dup")), Err(RecordId(5)));
        assert_eq!(table.push(Record::new(3u64, 0, "old")), Err(RecordId(5)));
        assert!(table.push(Record::new(6u64, 0, "ok")).is_ok());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_position_exact_match_only() {
        let table = table_with(&[2, 4, 8]);
        assert_eq!(table.position(RecordId(4)), Some(1));
        assert_eq!(table.position(RecordId(3)), None);
        assert_eq!(table.position(RecordId(9)), None);
    }

    #[test]
    fn test_kill_keeps_key_until_retain() {
        let mut table = table_with(&[1, 2, 3]);
        let old = table.kill(1).unwrap();
        assert_eq!(old.id, RecordId(2));

        assert_eq!(table.len(), 3);
        assert_eq!(table.position(RecordId(2)), Some(1));
        assert!(table.live_at(1).is_none());
        assert!(table.kill(1).is_none());
    }

    #[test]
    fn test_retain_live_preserves_order() {
        let mut table = table_with(&[1, 2, 3, 4, 5, 6]);
        table.kill(0);
        table.kill(2);
        table.kill(3);

        assert_eq!(table.retain_live(), 3);
        assert_eq!(table.keys(), &[RecordId(2), RecordId(5), RecordId(6)]);

        let ids: Vec<_> = table.live().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![2, 5, 6]);

        // Nothing left to reclaim
        assert_eq!(table.retain_live(), 0);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_retain_live_all_dead() {
        let mut table = table_with(&[1, 2]);
        table.kill(0);
        table.kill(1);
        assert_eq!(table.retain_live(), 2);
        assert!(table.is_empty());
        assert_eq!(table.last_key(), None);
    }

    #[test]
    fn test_replace_in_place() {
        let mut table = table_with(&[1, 2, 3]);
        let old = table.replace(1, Record::new(2u64, 99, "new")).unwrap();
        assert_eq!(old.payload, Bytes::from("r2"));

        let payloads: Vec<_> = table.live_payloads().map(|(_, p)| p.clone()).collect();
        assert_eq!(payloads[1], Bytes::from("new"));
    }
}
