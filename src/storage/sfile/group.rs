use std::sync::Arc;

use crate::primitives::bytes::buf::Cursor;
use crate::storage::catalog::EdgeSchema;
use crate::types::{OccamyError, Result, TypeId, VertexId};

use super::section::{DataSection, ValueLayout};
use super::value::ColumnValue;
use super::writer::GroupExtent;

/// Borrowed bytes of one column plus its offset table, if variable-width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnRange<'a> {
    /// The encoded section.
    pub bytes: &'a [u8],
    /// Offset table for variable-width columns.
    pub offsets: Option<&'a [u32]>,
}

impl<'a> ColumnRange<'a> {
    /// Range for a fixed-width column.
    pub fn fixed(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offsets: None,
        }
    }

    /// Range for a variable-width column.
    pub fn variable(bytes: &'a [u8], offsets: &'a [u32]) -> Self {
        Self {
            bytes,
            offsets: Some(offsets),
        }
    }
}

/// Splits concatenated sections by the externally recorded column lengths.
pub(crate) fn split_columns<'a>(
    bytes: &'a [u8],
    column_lens: &[u64],
    offsets: &'a [Option<Vec<u32>>],
) -> Result<Vec<ColumnRange<'a>>> {
    if offsets.len() != column_lens.len() {
        return Err(OccamyError::SchemaMismatch(format!(
            "{} column lengths but {} offset entries",
            column_lens.len(),
            offsets.len()
        )));
    }
    let mut cursor = Cursor::new(bytes);
    let mut ranges = Vec::with_capacity(column_lens.len());
    for (len, offsets) in column_lens.iter().zip(offsets) {
        let len = usize::try_from(*len)
            .map_err(|_| OccamyError::CorruptedBlock("column length exceeds address space"))?;
        ranges.push(ColumnRange {
            bytes: cursor.take(len)?,
            offsets: offsets.as_deref(),
        });
    }
    if cursor.remaining() != 0 {
        return Err(OccamyError::SchemaMismatch(format!(
            "{} trailing bytes after the last column",
            cursor.remaining()
        )));
    }
    Ok(ranges)
}

/// Column-wise view of every edge of one type leaving one source vertex.
#[derive(Clone, Debug)]
pub struct EdgeGroup<'a> {
    edge_type: TypeId,
    source: VertexId,
    row_count: usize,
    schema: Arc<EdgeSchema>,
    sections: Vec<DataSection<'a>>,
}

impl<'a> EdgeGroup<'a> {
    /// Decodes one section per column range.
    ///
    /// Fails with `SchemaMismatch` when the schema belongs to another edge
    /// type, when the range count differs from the schema's column count, or
    /// when any section describes a different number of rows.
    pub fn new(
        edge_type: TypeId,
        source: VertexId,
        columns: &[ColumnRange<'a>],
        row_count: usize,
        schema: &Arc<EdgeSchema>,
    ) -> Result<Self> {
        if schema.edge_type != edge_type {
            return Err(OccamyError::SchemaMismatch(format!(
                "schema for edge type {} used to decode edge type {edge_type}",
                schema.edge_type
            )));
        }
        if columns.len() != schema.column_count() {
            return Err(OccamyError::SchemaMismatch(format!(
                "edge group has {} columns but edge type {edge_type} declares {}",
                columns.len(),
                schema.column_count()
            )));
        }
        let mut sections = Vec::with_capacity(columns.len());
        for (def, range) in schema.columns.iter().zip(columns) {
            let layout = ValueLayout::for_column(def.ty, range.offsets)?;
            let section = DataSection::new(range.bytes, row_count, layout)?;
            let effective = section.effective_row_count();
            if effective != row_count {
                return Err(OccamyError::SchemaMismatch(format!(
                    "column '{}' holds {effective} rows, expected {row_count}",
                    def.name
                )));
            }
            sections.push(section);
        }
        Ok(Self {
            edge_type,
            source,
            row_count,
            schema: Arc::clone(schema),
            sections,
        })
    }

    /// Decodes the group an extent points at inside a seg file buffer.
    pub fn from_extent(
        file: &'a [u8],
        edge_type: TypeId,
        extent: &'a GroupExtent,
        schema: &Arc<EdgeSchema>,
    ) -> Result<Self> {
        let bytes = extent.slice(file)?;
        let ranges = split_columns(bytes, &extent.column_lens, &extent.offsets)?;
        let row_count = usize::try_from(extent.row_count)
            .map_err(|_| OccamyError::CorruptedBlock("row count exceeds address space"))?;
        Self::new(edge_type, extent.source, &ranges, row_count, schema)
    }

    /// Edge type of every row.
    pub fn edge_type(&self) -> TypeId {
        self.edge_type
    }

    /// Source vertex shared by every row.
    pub fn source_vertex(&self) -> VertexId {
        self.source
    }

    /// Rows (edges) in the group.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Columns in the group.
    pub fn column_count(&self) -> usize {
        self.sections.len()
    }

    /// Schema the group was decoded with.
    pub fn schema(&self) -> &Arc<EdgeSchema> {
        &self.schema
    }

    /// Encoded size of all sections.
    pub fn byte_len(&self) -> usize {
        self.sections.iter().map(DataSection::len).sum()
    }

    /// Section of column `ordinal`.
    pub fn section(&self, ordinal: usize) -> Result<&DataSection<'a>> {
        self.sections
            .get(ordinal)
            .ok_or_else(|| OccamyError::out_of_range(ordinal, self.sections.len()))
    }

    /// Section of the column called `name`.
    pub fn section_by_name(&self, name: &str) -> Result<&DataSection<'a>> {
        let ordinal = self
            .schema
            .ordinal_of(name)
            .ok_or(OccamyError::NotFound("column"))?;
        self.section(ordinal)
    }

    /// True when `row` of column `ordinal` is null.
    pub fn is_null(&self, ordinal: usize, row: usize) -> Result<bool> {
        self.section(ordinal)?.is_null(row)
    }

    /// Typed value of `row` in column `ordinal`; null rows yield [`ColumnValue::Null`].
    pub fn get(&self, ordinal: usize, row: usize) -> Result<ColumnValue<'a>> {
        let section = self.section(ordinal)?;
        section.column_value(self.schema.columns[ordinal].ty, row)
    }

    /// Every column of `row`, in ordinal order.
    pub fn row(&self, row: usize) -> Result<Vec<ColumnValue<'a>>> {
        (0..self.sections.len())
            .map(|ordinal| self.get(ordinal, row))
            .collect()
    }
}
