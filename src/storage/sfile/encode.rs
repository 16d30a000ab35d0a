//! Write path: builds data sections and edge groups in the canonical layout.

use std::sync::Arc;

use crate::primitives::bits::{BitVector, BitWrite};
use crate::storage::catalog::{ColumnWidth, EdgeSchema};
use crate::types::{OccamyError, Result, TypeId, VertexId};

use super::footer::{Footer, NullState};
use super::group::{ColumnRange, EdgeGroup};
use super::value::ColumnValue;

/// An encoded data section and the metadata needed to decode it again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedSection {
    /// `[values][bitmap?][footer]`.
    pub bytes: Vec<u8>,
    /// Offset table for variable-width columns.
    pub offsets: Option<Vec<u32>>,
    /// Rows encoded.
    pub row_count: usize,
    /// Null state written to the footer.
    pub null_state: NullState,
}

/// Accumulates the rows of one column.
#[derive(Debug)]
pub struct SectionEncoder {
    width: ColumnWidth,
    values: Vec<u8>,
    offsets: Vec<u32>,
    null_bits: Vec<u8>,
    rows: usize,
    nulls: usize,
}

impl SectionEncoder {
    /// Creates an encoder for a column of the given width.
    pub fn new(width: ColumnWidth) -> Self {
        let offsets = match width {
            ColumnWidth::Fixed(_) => Vec::new(),
            ColumnWidth::Variable => vec![0],
        };
        Self {
            width,
            values: Vec::new(),
            offsets,
            null_bits: Vec::new(),
            rows: 0,
            nulls: 0,
        }
    }

    /// Rows pushed so far.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Checks that `value` could be pushed, without pushing it.
    pub fn check(&self, value: Option<&[u8]>) -> Result<()> {
        match (self.width, value) {
            (ColumnWidth::Fixed(width), Some(raw)) if raw.len() != width => {
                Err(OccamyError::SchemaMismatch(format!(
                    "{}-byte value pushed to a {width}-byte column",
                    raw.len()
                )))
            }
            (ColumnWidth::Variable, Some(raw)) => {
                let end = self.values.len().saturating_add(raw.len());
                if u32::try_from(end).is_err() {
                    return Err(OccamyError::Invalid(
                        "variable-width column exceeds u32 offsets",
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Appends one row; `None` is a null.
    pub fn push(&mut self, value: Option<&[u8]>) -> Result<()> {
        self.check(value)?;
        let row = self.rows;
        if row & 7 == 0 {
            self.null_bits.push(0);
        }
        match value {
            Some(raw) => self.values.extend_from_slice(raw),
            None => {
                BitVector::new(&mut self.null_bits).set(row)?;
                self.nulls += 1;
                if let ColumnWidth::Fixed(width) = self.width {
                    self.values.resize(self.values.len() + width, 0);
                }
            }
        }
        if let ColumnWidth::Variable = self.width {
            // Checked above.
            self.offsets.push(self.values.len() as u32);
        }
        self.rows += 1;
        Ok(())
    }

    /// Picks the null state and lays the section out.
    pub fn finish(self) -> EncodedSection {
        let null_state = if self.nulls == 0 {
            NullState::NoNulls
        } else if self.nulls == self.rows {
            NullState::AllNull
        } else {
            NullState::Mixed
        };
        let mut bytes = Vec::with_capacity(self.values.len() + self.null_bits.len() + 8);
        let mut offsets = match self.width {
            ColumnWidth::Fixed(_) => None,
            ColumnWidth::Variable => Some(self.offsets),
        };
        match null_state {
            NullState::NoNulls => bytes.extend_from_slice(&self.values),
            NullState::AllNull => {
                if let Some(offsets) = offsets.as_mut() {
                    offsets.iter_mut().for_each(|o| *o = 0);
                }
            }
            NullState::Mixed => {
                bytes.extend_from_slice(&self.values);
                bytes.extend_from_slice(&self.null_bits);
            }
        }
        bytes.extend_from_slice(&Footer::new(null_state).encode());
        EncodedSection {
            bytes,
            offsets,
            row_count: self.rows,
            null_state,
        }
    }
}

/// An encoded edge group: its column sections concatenated in ordinal order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedGroup {
    /// Edge type of every row.
    pub edge_type: TypeId,
    /// Source vertex shared by every row.
    pub source: VertexId,
    /// Rows in the group.
    pub row_count: usize,
    /// Concatenated sections.
    pub bytes: Vec<u8>,
    /// Length of each column's section, in ordinal order.
    pub column_lens: Vec<u64>,
    /// Offset tables for variable-width columns, in ordinal order.
    pub offsets: Vec<Option<Vec<u32>>>,
}

impl EncodedGroup {
    /// Splits the bytes back into per-column ranges.
    pub fn column_ranges(&self) -> Result<Vec<ColumnRange<'_>>> {
        super::group::split_columns(&self.bytes, &self.column_lens, &self.offsets)
    }

    /// Decodes this group in place.
    pub fn view(&self, schema: &Arc<EdgeSchema>) -> Result<EdgeGroup<'_>> {
        let ranges = self.column_ranges()?;
        EdgeGroup::new(self.edge_type, self.source, &ranges, self.row_count, schema)
    }
}

/// Row-oriented builder for one edge group.
#[derive(Debug)]
pub struct EdgeGroupBuilder {
    schema: Arc<EdgeSchema>,
    source: VertexId,
    columns: Vec<SectionEncoder>,
    rows: usize,
    scratch: Vec<Vec<u8>>,
}

impl EdgeGroupBuilder {
    /// Starts a group for edges leaving `source`.
    pub fn new(schema: Arc<EdgeSchema>, source: VertexId) -> Self {
        let columns = schema
            .columns
            .iter()
            .map(|c| SectionEncoder::new(c.ty.width()))
            .collect();
        let scratch = vec![Vec::new(); schema.column_count()];
        Self {
            schema,
            source,
            columns,
            rows: 0,
            scratch,
        }
    }

    /// Rows pushed so far.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Appends one edge. The row is validated in full before any column changes.
    pub fn push_row(&mut self, row: &[ColumnValue<'_>]) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(OccamyError::SchemaMismatch(format!(
                "row has {} values but edge type {} has {} columns",
                row.len(),
                self.schema.edge_type,
                self.columns.len()
            )));
        }
        for (ordinal, value) in row.iter().enumerate() {
            let buf = &mut self.scratch[ordinal];
            buf.clear();
            if !value.is_null() {
                value.encode(self.schema.columns[ordinal].ty, buf)?;
            }
            let cell = (!value.is_null()).then_some(buf.as_slice());
            self.columns[ordinal].check(cell)?;
        }
        for (ordinal, value) in row.iter().enumerate() {
            let cell = (!value.is_null()).then_some(self.scratch[ordinal].as_slice());
            self.columns[ordinal].push(cell)?;
        }
        self.rows += 1;
        Ok(())
    }

    /// Lays out every column and concatenates them.
    pub fn finish(self) -> EncodedGroup {
        let mut bytes = Vec::new();
        let mut column_lens = Vec::with_capacity(self.columns.len());
        let mut offsets = Vec::with_capacity(self.columns.len());
        for encoder in self.columns {
            let section = encoder.finish();
            column_lens.push(section.bytes.len() as u64);
            bytes.extend_from_slice(&section.bytes);
            offsets.push(section.offsets);
        }
        EncodedGroup {
            edge_type: self.schema.edge_type,
            source: self.source,
            row_count: self.rows,
            bytes,
            column_lens,
            offsets,
        }
    }
}
