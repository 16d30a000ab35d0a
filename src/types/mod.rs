#![forbid(unsafe_code)]
//! Identifiers, the crate error type, and checksums.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Checksum helpers for seg file extents.
pub mod checksum;

pub use checksum::group_crc32;

/// Identifier of an edge type (one schema, one family of seg files).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub u32);

/// Identifier of a graph vertex.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(pub u64);

/// Errors produced while decoding, encoding, or persisting seg files.
#[derive(thiserror::Error, Debug)]
pub enum OccamyError {
    /// Underlying I/O failure.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// The bytes cannot be a valid block (too short, bad footer, bad checksum).
    #[error("corrupted block: {0}")]
    CorruptedBlock(&'static str),
    /// External metadata (row count, column count, layout) disagrees with the bytes.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    /// A bit, row, or column index is past the end.
    #[error("index {index} out of range (len {len})")]
    OutOfRange {
        /// The rejected index.
        index: usize,
        /// The exclusive upper bound.
        len: usize,
    },
    /// The footer carries a reserved null-state code.
    #[error("unsupported null-state code {0:#04b}")]
    UnsupportedNullState(u8),
    /// A value was requested for a null row.
    #[error("row {0} is null")]
    NullAccess(usize),
    /// Caller supplied an argument the format cannot represent.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    /// Lookup miss.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Catalog or manifest text could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl OccamyError {
    /// Stable short label for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            OccamyError::Io(_) => "io",
            OccamyError::CorruptedBlock(_) => "corrupted_block",
            OccamyError::SchemaMismatch(_) => "schema_mismatch",
            OccamyError::OutOfRange { .. } => "out_of_range",
            OccamyError::UnsupportedNullState(_) => "unsupported_null_state",
            OccamyError::NullAccess(_) => "null_access",
            OccamyError::Invalid(_) => "invalid",
            OccamyError::NotFound(_) => "not_found",
            OccamyError::Config(_) => "config",
        }
    }

    pub(crate) fn out_of_range(index: usize, len: usize) -> Self {
        OccamyError::OutOfRange { index, len }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, OccamyError>;

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TypeId {
    fn from(value: u32) -> Self {
        TypeId(value)
    }
}

impl From<TypeId> for u32 {
    fn from(value: TypeId) -> Self {
        value.0
    }
}

impl From<u64> for VertexId {
    fn from(value: u64) -> Self {
        VertexId(value)
    }
}

impl From<VertexId> for u64 {
    fn from(value: VertexId) -> Self {
        value.0
    }
}
