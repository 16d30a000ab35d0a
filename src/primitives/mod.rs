//! Low-level primitives for the seg file format.
//!
//! Includes fixed-endianness byte decoding and bit-addressable views.

/// Bit-addressable views over borrowed byte ranges.
///
/// Read-only and mutable capabilities are split across the [`bits::BitRead`]
/// and [`bits::BitWrite`] traits.
pub mod bits;

/// Byte-level utilities and little-endian decoding.
pub mod bytes;
