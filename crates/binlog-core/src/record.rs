//! Decoded binlog records
//!
//! A [`Record`] is the unit handed to the replay layer by the external log
//! reader. Decoding, checksumming and file I/O happen before a record is built.

use std::fmt::Display;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Caller-assigned identifier of a logical record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Create a new record ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw numeric value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Flag bits carried by a record header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct RecordFlags(u32);

impl RecordFlags {
    /// No flags set
    pub const EMPTY: Self = Self(0);

    /// The record refers to a previously written id instead of a new one
    pub const REWRITE: Self = Self(1);

    /// Build flags from raw header bits
    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw header bits
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the bits of `other`
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear the bits of `other`
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Whether no bits are set
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for RecordFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// What a record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RecordKind {
    /// Application payload
    #[default]
    Normal,
    /// Deletion marker for a previously written id
    Tombstone,
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Tombstone => write!(f, "tombstone"),
        }
    }
}

/// A single decoded binlog record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Logical record identifier
    pub id: RecordId,
    /// Byte position of the record in the underlying log
    pub offset: u64,
    /// Header flags
    pub flags: RecordFlags,
    /// Payload or tombstone
    pub kind: RecordKind,
    /// Opaque payload bytes
    pub payload: Bytes,
}

impl Record {
    /// Create a normal record appending a new id
    pub fn new(id: impl Into<RecordId>, offset: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            id: id.into(),
            offset,
            flags: RecordFlags::EMPTY,
            kind: RecordKind::Normal,
            payload: payload.into(),
        }
    }

    /// Create a record replacing the payload of an existing id
    pub fn rewrite(id: impl Into<RecordId>, offset: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            flags: RecordFlags::REWRITE,
            ..Self::new(id, offset, payload)
        }
    }

    /// Create a tombstone deleting an existing id
    pub fn tombstone(id: impl Into<RecordId>, offset: u64) -> Self {
        Self {
            id: id.into(),
            offset,
            flags: RecordFlags::REWRITE,
            kind: RecordKind::Tombstone,
            payload: Bytes::new(),
        }
    }

    /// Override the header flags
    pub fn with_flags(mut self, flags: RecordFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Whether the rewrite flag is set
    pub fn is_rewrite(&self) -> bool {
        self.flags.contains(RecordFlags::REWRITE)
    }

    /// Whether this record is a tombstone
    pub fn is_tombstone(&self) -> bool {
        self.kind == RecordKind::Tombstone
    }

    /// Payload size in bytes
    pub fn payload_len(&self) -> u64 {
        self.payload.len() as u64
    }
}
