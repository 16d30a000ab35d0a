#![forbid(unsafe_code)]

use super::VertexId;

/// CRC32 of an edge group extent, salted with its source vertex and file offset
/// so that a group copied to the wrong place does not verify.
pub fn group_crc32(source: VertexId, offset: u64, payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&source.0.to_le_bytes());
    hasher.update(&offset.to_le_bytes());
    hasher.update(payload);
    hasher.finalize()
}
