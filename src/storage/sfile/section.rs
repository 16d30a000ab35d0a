//! Decoder for one column's encoded block.
//!
//! ```text
//! [ value array : value_len bytes                        ]
//! [ null bitmap : ceil(rows / 8) bytes, Mixed state only ]
//! [ footer      : 8 bytes little-endian                  ]
//! ```
//!
//! The row count is not stored in the block; it comes from the owning edge
//! group. Fixed-width columns store a zero-filled slot for null rows.
//! Variable-width columns are addressed through an offset table of
//! `rows + 1` entries supplied alongside the block.

use crate::primitives::bits::{bytes_for_bits, BitRead, BitVectorView};
use crate::storage::catalog::{ColumnType, ColumnWidth};
use crate::types::{OccamyError, Result};

use super::footer::{Footer, NullState, FOOTER_LEN};
use super::value::{ColumnValue, FixedValue};

/// How row `i` maps to a byte range of the value array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueLayout<'a> {
    /// Row `i` lives at `[i * width, (i + 1) * width)`.
    Fixed {
        /// Slot width in bytes.
        width: usize,
    },
    /// Row `i` lives at `[offsets[i], offsets[i + 1])`.
    Variable {
        /// `rows + 1` non-decreasing offsets into the value array.
        offsets: &'a [u32],
    },
}

impl<'a> ValueLayout<'a> {
    /// Layout for a column of `ty`; variable-width types need `offsets`.
    pub fn for_column(ty: ColumnType, offsets: Option<&'a [u32]>) -> Result<Self> {
        match (ty.width(), offsets) {
            (ColumnWidth::Fixed(width), None) => Ok(ValueLayout::Fixed { width }),
            (ColumnWidth::Variable, Some(offsets)) => Ok(ValueLayout::Variable { offsets }),
            (ColumnWidth::Fixed(_), Some(_)) => Err(OccamyError::SchemaMismatch(format!(
                "fixed-width {} column was given an offset table",
                ty.name()
            ))),
            (ColumnWidth::Variable, None) => Err(OccamyError::SchemaMismatch(format!(
                "variable-width {} column has no offset table",
                ty.name()
            ))),
        }
    }
}

/// Zero-copy view of one column of an edge group.
#[derive(Clone, Copy, Debug)]
pub struct DataSection<'a> {
    raw_len: usize,
    values: &'a [u8],
    bitmap: &'a [u8],
    null_state: NullState,
    row_count: usize,
    layout: ValueLayout<'a>,
}

impl<'a> DataSection<'a> {
    /// Decodes `bytes` as a section holding `row_count` rows.
    pub fn new(bytes: &'a [u8], row_count: usize, layout: ValueLayout<'a>) -> Result<Self> {
        if bytes.len() < FOOTER_LEN {
            return Err(OccamyError::CorruptedBlock(
                "data section shorter than its footer",
            ));
        }
        let (body, footer) = bytes.split_at(bytes.len() - FOOTER_LEN);
        let footer = Footer::decode(footer)?;
        let bitmap_len = if footer.null_state.has_null_map() {
            bytes_for_bits(row_count)
        } else {
            0
        };
        let value_len = body.len().checked_sub(bitmap_len).ok_or_else(|| {
            OccamyError::SchemaMismatch(format!(
                "{row_count} rows need a {bitmap_len}-byte null bitmap but the section body is {} bytes",
                body.len()
            ))
        })?;
        let (values, bitmap) = body.split_at(value_len);
        match layout {
            ValueLayout::Fixed { width: 0 } => {
                return Err(OccamyError::Invalid("fixed value width must be non-zero"))
            }
            ValueLayout::Fixed { width } if value_len % width != 0 => {
                // With a bitmap present, the value/bitmap split came from `row_count`.
                if footer.null_state == NullState::Mixed {
                    return Err(OccamyError::SchemaMismatch(format!(
                        "{row_count} rows leave a ragged {value_len}-byte value array"
                    )));
                }
                return Err(OccamyError::CorruptedBlock(
                    "value array is not a whole number of slots",
                ));
            }
            ValueLayout::Fixed { .. } => {}
            ValueLayout::Variable { offsets } => check_offsets(offsets, value_len)?,
        }
        Ok(Self {
            raw_len: bytes.len(),
            values,
            bitmap,
            null_state: footer.null_state,
            row_count,
            layout,
        })
    }

    /// Row count supplied at construction.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Rows the value array actually describes.
    ///
    /// An all-null fixed-width section with an empty value array describes
    /// every row. Variable-width sections always count their offset table.
    pub fn effective_row_count(&self) -> usize {
        match self.layout {
            ValueLayout::Fixed { .. }
                if self.null_state == NullState::AllNull && self.values.is_empty() =>
            {
                self.row_count
            }
            ValueLayout::Fixed { width } => self.values.len() / width,
            ValueLayout::Variable { offsets } => offsets.len().saturating_sub(1),
        }
    }

    /// Total encoded length, footer included.
    pub fn len(&self) -> usize {
        self.raw_len
    }

    /// Always false; a section holds at least its footer.
    pub fn is_empty(&self) -> bool {
        self.raw_len == 0
    }

    /// Null-state code from the footer.
    pub fn null_state(&self) -> NullState {
        self.null_state
    }

    /// True iff a null bitmap is physically present.
    pub fn has_null_map(&self) -> bool {
        self.null_state.has_null_map()
    }

    /// Value layout this section was decoded with.
    pub fn layout(&self) -> ValueLayout<'a> {
        self.layout
    }

    /// The value array region.
    pub fn value_bytes(&self) -> &'a [u8] {
        self.values
    }

    /// The null bitmap region; empty unless the state is mixed.
    pub fn bitmap_bytes(&self) -> &'a [u8] {
        self.bitmap
    }

    /// View over the null bitmap, when present.
    pub fn null_map(&self) -> Option<BitVectorView<'a>> {
        self.has_null_map().then(|| BitVectorView::new(self.bitmap))
    }

    fn check_row(&self, row: usize) -> Result<()> {
        if row >= self.row_count {
            return Err(OccamyError::out_of_range(row, self.row_count));
        }
        Ok(())
    }

    /// True when row `row` is null.
    pub fn is_null(&self, row: usize) -> Result<bool> {
        self.check_row(row)?;
        match self.null_state.uniform() {
            Some(constant) => Ok(constant),
            None => BitVectorView::new(self.bitmap).test(row),
        }
    }

    /// Number of null rows.
    pub fn null_count(&self) -> usize {
        match self.null_state {
            NullState::NoNulls => 0,
            NullState::AllNull => self.row_count,
            NullState::Mixed => BitVectorView::new(self.bitmap)
                .count_prefix(self.row_count)
                .unwrap_or(0),
        }
    }

    /// Raw bytes of a non-null row. Fails with `NullAccess` on a null row.
    pub fn value_at(&self, row: usize) -> Result<&'a [u8]> {
        if self.is_null(row)? {
            return Err(OccamyError::NullAccess(row));
        }
        let (start, end) = match self.layout {
            ValueLayout::Fixed { width } => {
                let start = row
                    .checked_mul(width)
                    .ok_or(OccamyError::CorruptedBlock("value slot offset overflow"))?;
                (start, start + width)
            }
            ValueLayout::Variable { offsets } => {
                let start = offsets.get(row).copied();
                let end = offsets.get(row + 1).copied();
                match (start, end) {
                    (Some(start), Some(end)) => (start as usize, end as usize),
                    _ => {
                        return Err(OccamyError::SchemaMismatch(format!(
                            "offset table has no entry for row {row}"
                        )))
                    }
                }
            }
        };
        self.values
            .get(start..end)
            .ok_or(OccamyError::CorruptedBlock("value slot past end of value array"))
    }

    /// Null-aware raw access.
    pub fn get(&self, row: usize) -> Result<Option<&'a [u8]>> {
        if self.is_null(row)? {
            return Ok(None);
        }
        self.value_at(row).map(Some)
    }

    /// Typed fixed-width access; the layout width must equal `T::WIDTH`.
    pub fn value<T: FixedValue>(&self, row: usize) -> Result<T> {
        match self.layout {
            ValueLayout::Fixed { width } if width == T::WIDTH => {
                self.value_at(row).map(T::decode_le)
            }
            other => Err(OccamyError::SchemaMismatch(format!(
                "cannot read a {}-byte value from a {other:?} column",
                T::WIDTH
            ))),
        }
    }

    /// String access for variable-width columns.
    pub fn str_at(&self, row: usize) -> Result<&'a str> {
        let raw = self.value_at(row)?;
        std::str::from_utf8(raw)
            .map_err(|_| OccamyError::CorruptedBlock("str value is not valid UTF-8"))
    }

    /// Decodes row `row` as `ty`, mapping null rows to [`ColumnValue::Null`].
    pub fn column_value(&self, ty: ColumnType, row: usize) -> Result<ColumnValue<'a>> {
        match self.get(row)? {
            None => Ok(ColumnValue::Null),
            Some(raw) => ColumnValue::decode(ty, raw),
        }
    }
}

fn check_offsets(offsets: &[u32], value_len: usize) -> Result<()> {
    let Some(&first) = offsets.first() else {
        return Err(OccamyError::SchemaMismatch(
            "offset table must hold at least one entry".into(),
        ));
    };
    if first != 0 {
        return Err(OccamyError::SchemaMismatch(
            "offset table must start at 0".into(),
        ));
    }
    if offsets.windows(2).any(|pair| pair[0] > pair[1]) {
        return Err(OccamyError::SchemaMismatch(
            "offset table is not non-decreasing".into(),
        ));
    }
    let last = offsets[offsets.len() - 1] as usize;
    if last != value_len {
        return Err(OccamyError::SchemaMismatch(format!(
            "offset table ends at {last} but the value array is {value_len} bytes"
        )));
    }
    Ok(())
}
