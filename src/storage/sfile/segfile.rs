use std::slice;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::storage::catalog::EdgeSchema;
use crate::storage::options::SegFileOptions;
use crate::types::{OccamyError, Result, TypeId};

use super::group::EdgeGroup;
use super::writer::SegManifest;

/// Append-only sequence of edge groups, all of one edge type.
///
/// Lookup by vertex id is not provided here; an external index maps vertex
/// ids to extents.
#[derive(Clone, Debug)]
pub struct SegFile<'a> {
    edge_type: TypeId,
    groups: Vec<EdgeGroup<'a>>,
}

impl<'a> SegFile<'a> {
    /// Empty seg file for `edge_type`.
    pub fn new(edge_type: TypeId) -> Self {
        Self {
            edge_type,
            groups: Vec::new(),
        }
    }

    /// Decodes every group recorded in `manifest` from `bytes`, in append order.
    pub fn open(
        bytes: &'a [u8],
        manifest: &'a SegManifest,
        schema: &Arc<EdgeSchema>,
        options: &SegFileOptions,
    ) -> Result<Self> {
        let metrics = &options.metrics;
        let result = Self::open_inner(bytes, manifest, schema, options);
        if let Err(err) = &result {
            metrics.decode_failed(err.kind());
        }
        result
    }

    fn open_inner(
        bytes: &'a [u8],
        manifest: &'a SegManifest,
        schema: &Arc<EdgeSchema>,
        options: &SegFileOptions,
    ) -> Result<Self> {
        if manifest.edge_type != schema.edge_type {
            return Err(OccamyError::SchemaMismatch(format!(
                "manifest for edge type {} opened with schema for edge type {}",
                manifest.edge_type, schema.edge_type
            )));
        }
        let mut file = Self::new(manifest.edge_type);
        let mut expected_offset = 0u64;
        for (index, extent) in manifest.groups.iter().enumerate() {
            if options.require_contiguous && extent.offset != expected_offset {
                return Err(OccamyError::CorruptedBlock(
                    "group extents do not tile the seg file",
                ));
            }
            expected_offset = extent.end()?;
            if options.verify_checksums && !extent.verify(extent.slice(bytes)?) {
                warn!(
                    group = index,
                    source = extent.source.0,
                    offset = extent.offset,
                    "sfile.open.checksum_mismatch"
                );
                options.metrics.checksum_mismatch();
                return Err(OccamyError::CorruptedBlock("edge group checksum mismatch"));
            }
            let group = EdgeGroup::from_extent(bytes, manifest.edge_type, extent, schema)?;
            trace!(
                group = index,
                source = extent.source.0,
                rows = group.row_count(),
                "sfile.open.group"
            );
            options.metrics.group_decoded();
            file.append(group)?;
        }
        if options.require_contiguous && expected_offset != bytes.len() as u64 {
            return Err(OccamyError::CorruptedBlock(
                "seg file has bytes past its last group",
            ));
        }
        Ok(file)
    }

    /// Edge type of every group.
    pub fn edge_type(&self) -> TypeId {
        self.edge_type
    }

    /// Adds `group` at the end. Groups already present are untouched.
    pub fn append(&mut self, group: EdgeGroup<'a>) -> Result<()> {
        if group.edge_type() != self.edge_type {
            return Err(OccamyError::SchemaMismatch(format!(
                "edge group of type {} appended to seg file of type {}",
                group.edge_type(),
                self.edge_type
            )));
        }
        self.groups.push(group);
        Ok(())
    }

    /// Groups in append order. Each call starts from the first group.
    pub fn iter(&self) -> Groups<'_, 'a> {
        Groups {
            inner: self.groups.iter(),
        }
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when no group has been appended.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total rows over every group.
    pub fn row_count(&self) -> usize {
        self.groups.iter().map(EdgeGroup::row_count).sum()
    }
}

/// Iterator over the groups of a [`SegFile`].
#[derive(Clone, Debug)]
pub struct Groups<'f, 'a> {
    inner: slice::Iter<'f, EdgeGroup<'a>>,
}

impl<'f, 'a> Iterator for Groups<'f, 'a> {
    type Item = &'f EdgeGroup<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Groups<'_, '_> {}

impl<'f, 'a> IntoIterator for &'f SegFile<'a> {
    type Item = &'f EdgeGroup<'a>;
    type IntoIter = Groups<'f, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
