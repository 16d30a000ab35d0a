//! Occamy: columnar, append-only edge storage.
//!
//! Edges of one type are stored in seg files. A seg file is a sequence of
//! edge groups (all edges leaving one source vertex), and every edge group
//! stores one data section per schema column. All read types are
//! zero-copy views borrowed from a caller-owned buffer.

#![warn(missing_docs)]

pub mod primitives;
pub mod storage;
pub mod types;
