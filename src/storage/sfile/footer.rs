//! The 8-byte trailer of every data section.
//!
//! ```text
//! bit 0-1  : null-state code (00 no nulls, 01 all null, 10 mixed, 11 reserved)
//! bit 2-63 : reserved, always zero
//! ```

use std::convert::TryFrom;

use crate::primitives::bytes::le;
use crate::types::{OccamyError, Result};

/// Encoded footer length in bytes.
pub const FOOTER_LEN: usize = le::U64_LEN;

const NULL_STATE_MASK: u64 = 0b11;

/// Nullability pattern of one column in one edge group.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum NullState {
    /// No row is null; no bitmap is stored.
    NoNulls = 0b00,
    /// Every row is null; no bitmap is stored.
    AllNull = 0b01,
    /// Some rows are null; a bitmap of `ceil(rows / 8)` bytes precedes the footer.
    Mixed = 0b10,
}

impl NullState {
    /// The 2-bit code stored in the footer.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// True when a null bitmap is physically present.
    pub const fn has_null_map(self) -> bool {
        matches!(self, NullState::Mixed)
    }

    /// The answer to `is_null` for every row, when it does not depend on the row.
    pub const fn uniform(self) -> Option<bool> {
        match self {
            NullState::NoNulls => Some(false),
            NullState::AllNull => Some(true),
            NullState::Mixed => None,
        }
    }
}

impl TryFrom<u8> for NullState {
    type Error = OccamyError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0b00 => Ok(NullState::NoNulls),
            0b01 => Ok(NullState::AllNull),
            0b10 => Ok(NullState::Mixed),
            other => Err(OccamyError::UnsupportedNullState(other)),
        }
    }
}

/// Decoded section footer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Footer {
    /// Null-state code carried in bits 0-1.
    pub null_state: NullState,
}

impl Footer {
    /// Creates a footer with all reserved bits clear.
    pub const fn new(null_state: NullState) -> Self {
        Self { null_state }
    }

    /// Encodes as a little-endian u64.
    pub fn encode(&self) -> [u8; FOOTER_LEN] {
        let mut buf = [0u8; FOOTER_LEN];
        le::put_u64_le(&mut buf, u64::from(self.null_state.code()));
        buf
    }

    /// Decodes the footer from exactly the trailing 8 bytes of a section.
    pub fn decode(src: &[u8]) -> Result<Self> {
        if src.len() != FOOTER_LEN {
            return Err(OccamyError::CorruptedBlock("section footer is not 8 bytes"));
        }
        let raw = le::get_u64_le(src)?;
        if raw & !NULL_STATE_MASK != 0 {
            return Err(OccamyError::CorruptedBlock("section footer reserved bits set"));
        }
        let null_state = NullState::try_from((raw & NULL_STATE_MASK) as u8)?;
        Ok(Self { null_state })
    }
}
