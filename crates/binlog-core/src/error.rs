//! Error types for binlog replay

use thiserror::Error;

use crate::record::RecordId;

/// Why a record stream was judged inconsistent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorruptionKind {
    /// A rewrite or tombstone targeted an id with no live slot
    MissingRewriteTarget,
    /// A new record id was not strictly greater than the last recorded key
    OutOfOrderAppend,
}

impl std::fmt::Display for CorruptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRewriteTarget => write!(f, "rewrite of a record with no live slot"),
            Self::OutOfOrderAppend => write!(f, "out-of-order append"),
        }
    }
}

/// The log contradicts what replay has already recorded
///
/// Once returned, the replay session is invalid. Nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Fatal binlog corruption at offset {offset}: {kind} for record {id}")]
pub struct FatalCorruption {
    /// What went wrong
    pub kind: CorruptionKind,
    /// Id of the offending record
    pub id: RecordId,
    /// Log offset of the offending record
    pub offset: u64,
    /// Last key held by the processor when the record arrived
    pub last_key: Option<RecordId>,
}

impl FatalCorruption {
    /// A rewrite hit an id that is absent or already dead
    pub fn missing_rewrite_target(id: RecordId, offset: u64, last_key: Option<RecordId>) -> Self {
        Self {
            kind: CorruptionKind::MissingRewriteTarget,
            id,
            offset,
            last_key,
        }
    }

    /// An append did not advance past the last key
    pub fn out_of_order(id: RecordId, offset: u64, last_key: RecordId) -> Self {
        Self {
            kind: CorruptionKind::OutOfOrderAppend,
            id,
            offset,
            last_key: Some(last_key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_rewrite_target() {
        let err = FatalCorruption::missing_rewrite_target(RecordId(2), 40, Some(RecordId(3)));
        assert_eq!(err.kind, CorruptionKind::MissingRewriteTarget);
        assert!(err.to_string().contains("#2"));
        assert!(err.to_string().contains("offset 40"));
    }

    #[test]
    fn test_out_of_order() {
        let err = FatalCorruption::out_of_order(RecordId(0), 90, RecordId(3));
        assert_eq!(err.kind, CorruptionKind::OutOfOrderAppend);
        assert_eq!(err.last_key, Some(RecordId(3)));
        assert!(err.to_string().contains("out-of-order"));
    }
}
