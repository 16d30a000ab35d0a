use std::fmt;

use crate::storage::catalog::ColumnType;
use crate::types::{OccamyError, Result, VertexId};

/// A fixed-width value stored little-endian in a value array.
pub trait FixedValue: Sized + Copy {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Decodes from the first `WIDTH` bytes of `src`. `src` must be at least `WIDTH` long.
    fn decode_le(src: &[u8]) -> Self;

    /// Appends the `WIDTH`-byte encoding to `dst`.
    fn encode_le(self, dst: &mut Vec<u8>);
}

macro_rules! impl_fixed_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FixedValue for $ty {
                const WIDTH: usize = core::mem::size_of::<$ty>();

                #[inline]
                fn decode_le(src: &[u8]) -> Self {
                    let mut arr = [0u8; core::mem::size_of::<$ty>()];
                    arr.copy_from_slice(&src[..Self::WIDTH]);
                    <$ty>::from_le_bytes(arr)
                }

                #[inline]
                fn encode_le(self, dst: &mut Vec<u8>) {
                    dst.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_fixed_value!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl FixedValue for bool {
    const WIDTH: usize = 1;

    fn decode_le(src: &[u8]) -> Self {
        src[0] != 0
    }

    fn encode_le(self, dst: &mut Vec<u8>) {
        dst.push(u8::from(self));
    }
}

impl FixedValue for VertexId {
    const WIDTH: usize = 8;

    fn decode_le(src: &[u8]) -> Self {
        VertexId(u64::decode_le(src))
    }

    fn encode_le(self, dst: &mut Vec<u8>) {
        self.0.encode_le(dst);
    }
}

/// A column value borrowed from a section (zero-copy for strings and bytes).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColumnValue<'a> {
    /// Null row.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer (i32 and i64 columns).
    Int(i64),
    /// Unsigned integer (u32 and u64 columns).
    UInt(u64),
    /// Float (f32 and f64 columns).
    Float(f64),
    /// Vertex reference.
    Vertex(VertexId),
    /// UTF-8 string slice.
    Str(&'a str),
    /// Byte slice.
    Bytes(&'a [u8]),
}

impl<'a> ColumnValue<'a> {
    /// True for [`ColumnValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    /// Decodes a non-null raw slot as `ty`.
    pub fn decode(ty: ColumnType, raw: &'a [u8]) -> Result<Self> {
        if let crate::storage::catalog::ColumnWidth::Fixed(width) = ty.width() {
            if raw.len() != width {
                return Err(OccamyError::CorruptedBlock("value slot has the wrong width"));
            }
        }
        let value = match ty {
            ColumnType::Bool => ColumnValue::Bool(bool::decode_le(raw)),
            ColumnType::I32 => ColumnValue::Int(i64::from(i32::decode_le(raw))),
            ColumnType::I64 => ColumnValue::Int(i64::decode_le(raw)),
            ColumnType::U32 => ColumnValue::UInt(u64::from(u32::decode_le(raw))),
            ColumnType::U64 => ColumnValue::UInt(u64::decode_le(raw)),
            ColumnType::F32 => ColumnValue::Float(f64::from(f32::decode_le(raw))),
            ColumnType::F64 => ColumnValue::Float(f64::decode_le(raw)),
            ColumnType::Vertex => ColumnValue::Vertex(VertexId::decode_le(raw)),
            ColumnType::Str => ColumnValue::Str(
                std::str::from_utf8(raw)
                    .map_err(|_| OccamyError::CorruptedBlock("str value is not valid UTF-8"))?,
            ),
            ColumnType::Bytes => ColumnValue::Bytes(raw),
        };
        Ok(value)
    }

    /// Encodes a non-null value for a column of type `ty`, appending to `dst`.
    ///
    /// Returns `SchemaMismatch` when the variant does not fit the column type.
    pub fn encode(&self, ty: ColumnType, dst: &mut Vec<u8>) -> Result<()> {
        match (ty, *self) {
            (ColumnType::Bool, ColumnValue::Bool(v)) => v.encode_le(dst),
            (ColumnType::I32, ColumnValue::Int(v)) => i32::try_from(v)
                .map_err(|_| OccamyError::Invalid("integer does not fit an i32 column"))?
                .encode_le(dst),
            (ColumnType::I64, ColumnValue::Int(v)) => v.encode_le(dst),
            (ColumnType::U32, ColumnValue::UInt(v)) => u32::try_from(v)
                .map_err(|_| OccamyError::Invalid("integer does not fit a u32 column"))?
                .encode_le(dst),
            (ColumnType::U64, ColumnValue::UInt(v)) => v.encode_le(dst),
            (ColumnType::F32, ColumnValue::Float(v)) => (v as f32).encode_le(dst),
            (ColumnType::F64, ColumnValue::Float(v)) => v.encode_le(dst),
            (ColumnType::Vertex, ColumnValue::Vertex(v)) => v.encode_le(dst),
            (ColumnType::Str, ColumnValue::Str(v)) => dst.extend_from_slice(v.as_bytes()),
            (ColumnType::Bytes, ColumnValue::Bytes(v)) => dst.extend_from_slice(v),
            (ty, value) => {
                return Err(OccamyError::SchemaMismatch(format!(
                    "{} value cannot be stored in a {} column",
                    value.variant_name(),
                    ty.name()
                )))
            }
        }
        Ok(())
    }

    fn variant_name(&self) -> &'static str {
        match self {
            ColumnValue::Null => "null",
            ColumnValue::Bool(_) => "bool",
            ColumnValue::Int(_) => "int",
            ColumnValue::UInt(_) => "uint",
            ColumnValue::Float(_) => "float",
            ColumnValue::Vertex(_) => "vertex",
            ColumnValue::Str(_) => "str",
            ColumnValue::Bytes(_) => "bytes",
        }
    }
}

impl fmt::Display for ColumnValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Null => write!(f, "null"),
            ColumnValue::Bool(v) => write!(f, "{v}"),
            ColumnValue::Int(v) => write!(f, "{v}"),
            ColumnValue::UInt(v) => write!(f, "{v}"),
            ColumnValue::Float(v) => write!(f, "{v}"),
            ColumnValue::Vertex(v) => write!(f, "v{v}"),
            ColumnValue::Str(v) => write!(f, "{v:?}"),
            ColumnValue::Bytes(v) => write!(f, "bytes(len={})", v.len()),
        }
    }
}
