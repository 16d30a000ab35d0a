#![forbid(unsafe_code)]
//! Little-endian decoding and slice cursors shared by the seg file codecs.

pub mod le {
    //! Fixed little-endian integer codecs.
    //!
    //! Every multi-byte integer in the seg file format is little-endian,
    //! independent of the host byte order.

    use core::convert::TryInto;

    use crate::types::{OccamyError, Result};

    /// Width of an encoded u64.
    pub const U64_LEN: usize = core::mem::size_of::<u64>();

    /// Decodes the first 8 bytes of `src` as a little-endian u64.
    pub fn get_u64_le(src: &[u8]) -> Result<u64> {
        let head: [u8; U64_LEN] = src
            .get(..U64_LEN)
            .and_then(|head| head.try_into().ok())
            .ok_or(OccamyError::CorruptedBlock("u64 source shorter than 8 bytes"))?;
        Ok(u64::from_le_bytes(head))
    }

    /// Encodes `v` as little-endian into the first 8 bytes of `dst`.
    pub fn put_u64_le(dst: &mut [u8], v: u64) {
        assert!(dst.len() >= U64_LEN, "destination too small");
        dst[..U64_LEN].copy_from_slice(&v.to_le_bytes());
    }
}

pub mod buf {
    //! A slice-backed cursor for splitting concatenated blocks.

    use core::fmt;

    use crate::types::{OccamyError, Result};

    /// A cursor for reading bytes from a slice with offset tracking.
    pub struct Cursor<'a> {
        /// The underlying byte slice.
        pub buf: &'a [u8],
        /// Current read offset.
        pub off: usize,
    }

    impl<'a> Cursor<'a> {
        /// Creates a new cursor starting at offset 0.
        pub fn new(buf: &'a [u8]) -> Self {
            Self { buf, off: 0 }
        }

        /// Takes the next `n` bytes from the cursor, advancing the offset.
        pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
            let end = self
                .off
                .checked_add(n)
                .ok_or(OccamyError::CorruptedBlock("cursor offset overflow"))?;
            if end > self.buf.len() {
                return Err(OccamyError::CorruptedBlock("cursor take beyond buffer"));
            }
            let slice = &self.buf[self.off..end];
            self.off = end;
            Ok(slice)
        }

        /// Returns the number of bytes remaining in the buffer.
        pub fn remaining(&self) -> usize {
            self.buf.len().saturating_sub(self.off)
        }
    }

    impl<'a> fmt::Debug for Cursor<'a> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Cursor")
                .field("off", &self.off)
                .field("remaining", &self.remaining())
                .finish()
        }
    }
}
