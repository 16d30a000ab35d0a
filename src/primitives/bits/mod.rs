#![forbid(unsafe_code)]

use core::fmt;
use core::ops::Index;

use crate::types::{OccamyError, Result};

#[inline]
const fn byte_offset(n: usize) -> usize {
    n >> 3
}

#[inline]
const fn bit_mask(n: usize) -> u8 {
    1 << (n & 7)
}

/// Number of bytes needed to hold `bits` bits.
#[inline]
pub const fn bytes_for_bits(bits: usize) -> usize {
    (bits + 7) >> 3
}

fn popcount(bytes: &[u8]) -> usize {
    let mut words = bytes.chunks_exact(8);
    let mut total = 0usize;
    for word in words.by_ref() {
        let mut arr = [0u8; 8];
        arr.copy_from_slice(word);
        total += u64::from_le_bytes(arr).count_ones() as usize;
    }
    total
        + words
            .remainder()
            .iter()
            .map(|b| b.count_ones() as usize)
            .sum::<usize>()
}

/// Read capability over a bit-addressable byte range.
///
/// Bit `n` lives in byte `n >> 3` under mask `1 << (n & 7)`.
pub trait BitRead {
    /// The backing bytes.
    fn as_bytes(&self) -> &[u8];

    /// Number of addressable bits (8 per byte).
    fn size(&self) -> usize {
        self.as_bytes().len() << 3
    }

    /// Returns bit `n`.
    fn test(&self, n: usize) -> Result<bool> {
        let size = self.size();
        if n >= size {
            return Err(OccamyError::out_of_range(n, size));
        }
        Ok(self.as_bytes()[byte_offset(n)] & bit_mask(n) != 0)
    }

    /// Number of set bits over the whole range.
    fn count(&self) -> usize {
        popcount(self.as_bytes())
    }

    /// Number of set bits among the first `len` bits.
    fn count_prefix(&self, len: usize) -> Result<usize> {
        let size = self.size();
        if len > size {
            return Err(OccamyError::out_of_range(len, size));
        }
        let bytes = self.as_bytes();
        let full = byte_offset(len);
        let mut total = popcount(&bytes[..full]);
        let tail = len & 7;
        if tail != 0 {
            let mask = (1u8 << tail) - 1;
            total += (bytes[full] & mask).count_ones() as usize;
        }
        Ok(total)
    }
}

/// Write capability; a [`BitRead`] that can also set bits.
pub trait BitWrite: BitRead {
    /// Sets bit `n` to 1, leaving every other bit unchanged.
    fn set(&mut self, n: usize) -> Result<()>;
}

/// Read-only bit view over a borrowed byte range.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BitVectorView<'a> {
    bytes: &'a [u8],
}

impl<'a> BitVectorView<'a> {
    /// Wraps `bytes` without copying.
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Borrowed bytes with the lender's lifetime.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Iterates the indices of set bits in ascending order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + 'a {
        let bytes = self.bytes;
        bytes.iter().enumerate().flat_map(|(idx, &byte)| {
            (0..8usize)
                .filter(move |bit| byte & (1 << bit) != 0)
                .map(move |bit| (idx << 3) + bit)
        })
    }
}

impl BitRead for BitVectorView<'_> {
    fn as_bytes(&self) -> &[u8] {
        self.bytes
    }
}

impl Index<usize> for BitVectorView<'_> {
    type Output = bool;

    fn index(&self, n: usize) -> &bool {
        match self.test(n) {
            Ok(true) => &true,
            Ok(false) => &false,
            Err(err) => panic!("bit index: {err}"),
        }
    }
}

impl fmt::Debug for BitVectorView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitVectorView")
            .field("size", &self.size())
            .field("ones", &self.count())
            .finish()
    }
}

/// Mutable bit vector over a buffer lent by the caller.
///
/// Holds the only mutable borrow of its buffer, so concurrent writers are
/// ruled out at compile time.
pub struct BitVector<'a> {
    bytes: &'a mut [u8],
}

impl<'a> BitVector<'a> {
    /// Wraps `bytes` without copying.
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes }
    }

    /// Reborrows as a read-only view.
    pub fn as_view(&self) -> BitVectorView<'_> {
        BitVectorView::new(self.bytes)
    }
}

impl BitRead for BitVector<'_> {
    fn as_bytes(&self) -> &[u8] {
        self.bytes
    }
}

impl BitWrite for BitVector<'_> {
    fn set(&mut self, n: usize) -> Result<()> {
        let size = self.size();
        if n >= size {
            return Err(OccamyError::out_of_range(n, size));
        }
        self.bytes[byte_offset(n)] |= bit_mask(n);
        Ok(())
    }
}

impl Index<usize> for BitVector<'_> {
    type Output = bool;

    fn index(&self, n: usize) -> &bool {
        match self.test(n) {
            Ok(true) => &true,
            Ok(false) => &false,
            Err(err) => panic!("bit index: {err}"),
        }
    }
}

impl fmt::Debug for BitVector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitVector")
            .field("size", &self.size())
            .field("ones", &self.count())
            .finish()
    }
}
