//! Append-only writer and the per-group extent records it produces.
//!
//! A seg file is the plain concatenation of encoded edge groups. Where each
//! group starts, how long each column is, and the offset tables of
//! variable-width columns are recorded in [`GroupExtent`]s, which the caller
//! keeps in its manifest (a JSON sidecar via [`SegManifest`] by default).

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::storage::options::SegFileOptions;
use crate::types::{group_crc32, OccamyError, Result, TypeId, VertexId};

use super::encode::EncodedGroup;

/// Location and decode metadata of one edge group in a seg file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupExtent {
    /// Source vertex of the group.
    pub source: VertexId,
    /// Rows in the group.
    pub row_count: u64,
    /// Byte offset of the group in the file.
    pub offset: u64,
    /// Encoded length of the group.
    pub len: u64,
    /// Encoded length of each column section, in ordinal order.
    pub column_lens: Vec<u64>,
    /// Offset tables of variable-width columns, in ordinal order.
    pub offsets: Vec<Option<Vec<u32>>>,
    /// CRC32 over source, offset, and payload.
    pub crc32: u32,
}

impl GroupExtent {
    /// One past the last byte of the group.
    pub fn end(&self) -> Result<u64> {
        self.offset
            .checked_add(self.len)
            .ok_or(OccamyError::CorruptedBlock("group extent overflows"))
    }

    /// The group's bytes inside `file`.
    pub fn slice<'a>(&self, file: &'a [u8]) -> Result<&'a [u8]> {
        let start = usize::try_from(self.offset)
            .map_err(|_| OccamyError::CorruptedBlock("group offset exceeds address space"))?;
        let end = usize::try_from(self.end()?)
            .map_err(|_| OccamyError::CorruptedBlock("group end exceeds address space"))?;
        file.get(start..end)
            .ok_or(OccamyError::CorruptedBlock("group extent past end of seg file"))
    }

    /// Recomputes the checksum over `payload` and compares.
    pub fn verify(&self, payload: &[u8]) -> bool {
        group_crc32(self.source, self.offset, payload) == self.crc32
    }
}

/// Everything needed to reopen a seg file: its edge type and group extents in append order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegManifest {
    /// Edge type of every group.
    pub edge_type: TypeId,
    /// Extents in append order.
    pub groups: Vec<GroupExtent>,
}

impl SegManifest {
    /// Empty manifest for a new file.
    pub fn new(edge_type: TypeId) -> Self {
        Self {
            edge_type,
            groups: Vec::new(),
        }
    }

    /// Offset where the next group will be written.
    pub fn end_offset(&self) -> Result<u64> {
        match self.groups.last() {
            Some(last) => last.end(),
            None => Ok(0),
        }
    }

    /// Total rows over every group.
    pub fn row_count(&self) -> u64 {
        self.groups.iter().map(|g| g.row_count).sum()
    }

    /// Serializes as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|err| OccamyError::Config(err.to_string()))
    }

    /// Parses the JSON form.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| OccamyError::Config(err.to_string()))
    }

    /// Writes the JSON form to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Reads the JSON form from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

/// Single-owner, append-only seg file writer.
///
/// Groups are written whole at the tail; bytes already written are never
/// revisited.
pub struct SegFileWriter<W: Write> {
    inner: W,
    position: u64,
    manifest: SegManifest,
    options: SegFileOptions,
}

impl SegFileWriter<BufWriter<File>> {
    /// Creates a new seg file at `path`; fails if it already exists.
    pub fn create(path: &Path, edge_type: TypeId, options: SegFileOptions) -> Result<Self> {
        let file = OpenOptions::new().write(true).create_new(true).open(path)?;
        debug!(path = %path.display(), edge_type = edge_type.0, "sfile.writer.create");
        Ok(Self::new(BufWriter::new(file), edge_type, options))
    }

    /// Reopens an existing seg file for append.
    ///
    /// The file length must equal the end of the manifest's last extent.
    pub fn resume(path: &Path, manifest: SegManifest, options: SegFileOptions) -> Result<Self> {
        let file = OpenOptions::new().append(true).open(path)?;
        let len = file.metadata()?.len();
        let end = manifest.end_offset()?;
        if len != end {
            return Err(OccamyError::CorruptedBlock(
                "seg file length disagrees with its manifest",
            ));
        }
        debug!(
            path = %path.display(),
            edge_type = manifest.edge_type.0,
            groups = manifest.groups.len(),
            "sfile.writer.resume"
        );
        Ok(Self {
            inner: BufWriter::new(file),
            position: end,
            manifest,
            options,
        })
    }
}

impl<W: Write> SegFileWriter<W> {
    /// Wraps `inner`, which must be positioned at offset 0 of an empty file.
    pub fn new(inner: W, edge_type: TypeId, options: SegFileOptions) -> Self {
        Self {
            inner,
            position: 0,
            manifest: SegManifest::new(edge_type),
            options,
        }
    }

    /// Edge type accepted by this writer.
    pub fn edge_type(&self) -> TypeId {
        self.manifest.edge_type
    }

    /// Bytes written so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Extents written so far.
    pub fn manifest(&self) -> &SegManifest {
        &self.manifest
    }

    /// Appends `group` at the tail and returns its extent.
    pub fn append(&mut self, group: &EncodedGroup) -> Result<&GroupExtent> {
        if group.edge_type != self.manifest.edge_type {
            return Err(OccamyError::SchemaMismatch(format!(
                "edge type {} appended to a seg file of edge type {}",
                group.edge_type, self.manifest.edge_type
            )));
        }
        let offset = self.position;
        let len = group.bytes.len() as u64;
        self.inner.write_all(&group.bytes)?;
        if self.options.flush_on_append {
            self.inner.flush()?;
        }
        self.position += len;
        let extent = GroupExtent {
            source: group.source,
            row_count: group.row_count as u64,
            offset,
            len,
            column_lens: group.column_lens.clone(),
            offsets: group.offsets.clone(),
            crc32: group_crc32(group.source, offset, &group.bytes),
        };
        trace!(
            source = group.source.0,
            rows = group.row_count,
            offset,
            len,
            "sfile.writer.append"
        );
        self.options.metrics.group_appended(len);
        self.manifest.groups.push(extent);
        Ok(&self.manifest.groups[self.manifest.groups.len() - 1])
    }

    /// Flushes and hands back the sink and the manifest.
    pub fn finish(mut self) -> Result<(W, SegManifest)> {
        self.inner.flush()?;
        debug!(
            edge_type = self.manifest.edge_type.0,
            groups = self.manifest.groups.len(),
            bytes = self.position,
            "sfile.writer.finish"
        );
        Ok((self.inner, self.manifest))
    }
}
