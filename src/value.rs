//! # Runtime Value Representation
//!
//! This module provides `Value`, the fully-owned dynamic value tree the codec
//! encodes and decodes, and `PrimitiveArray`, the bulk storage used by the
//! primitive-element array fast paths.
//!
//! ## Design
//!
//! The codec is descriptor-driven: a `Value` on its own is not self-typed,
//! it is interpreted against the `FieldType` at its position. A mismatch is
//! a shape error at encode time. Maps are represented as an order-preserving
//! vector of pairs so that encode-time iteration order survives a round trip.

use crate::schema::PrimitiveKind;

/// Bulk storage for arrays of fixed-width scalars. One variant per
/// `PrimitiveKind`, giving eight parallel fast paths that bypass per-element
/// dispatch entirely.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveArray {
    Bool(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl PrimitiveArray {
    pub fn len(&self) -> usize {
        match self {
            PrimitiveArray::Bool(v) => v.len(),
            PrimitiveArray::Int8(v) => v.len(),
            PrimitiveArray::Int16(v) => v.len(),
            PrimitiveArray::Int32(v) => v.len(),
            PrimitiveArray::Int64(v) => v.len(),
            PrimitiveArray::UInt8(v) => v.len(),
            PrimitiveArray::Float32(v) => v.len(),
            PrimitiveArray::Float64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveArray::Bool(_) => PrimitiveKind::Bool,
            PrimitiveArray::Int8(_) => PrimitiveKind::Int8,
            PrimitiveArray::Int16(_) => PrimitiveKind::Int16,
            PrimitiveArray::Int32(_) => PrimitiveKind::Int32,
            PrimitiveArray::Int64(_) => PrimitiveKind::Int64,
            PrimitiveArray::UInt8(_) => PrimitiveKind::UInt8,
            PrimitiveArray::Float32(_) => PrimitiveKind::Float32,
            PrimitiveArray::Float64(_) => PrimitiveKind::Float64,
        }
    }
}

/// Fully-owned dynamic value, interpreted against a `FieldType`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    Float32(f32),
    Float64(f64),
    /// Unscaled integer plus scale; the scale must match the descriptor's.
    Decimal { unscaled: i128, scale: i16 },
    /// Big-endian two's-complement bytes of an arbitrary-precision integer.
    BigInt(Vec<u8>),
    /// Days since 1970-01-01.
    Date(i32),
    /// Microseconds since the epoch.
    Timestamp(i64),
    String(String),
    /// Ordinal into the field's `EnumType`.
    Enum(u32),
    Array(Vec<Value>),
    PrimitiveArray(PrimitiveArray),
    List(Vec<Value>),
    Set(Vec<Value>),
    /// Order-preserving key/value pairs.
    Map(Vec<(Value, Value)>),
    /// Field values in schema order.
    Struct(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Minimal big-endian two's-complement encoding of an i128: redundant
/// sign-extension bytes are stripped, keeping at least one byte.
pub fn i128_to_twos_complement(v: i128) -> Vec<u8> {
    let full = v.to_be_bytes();
    let mut start = 0;
    while start < full.len() - 1 {
        let redundant_zero = full[start] == 0x00 && full[start + 1] & 0x80 == 0;
        let redundant_ff = full[start] == 0xFF && full[start + 1] & 0x80 != 0;
        if redundant_zero || redundant_ff {
            start += 1;
        } else {
            break;
        }
    }
    full[start..].to_vec()
}

/// Inverse of [`i128_to_twos_complement`]. Accepts 1..=16 bytes.
pub fn twos_complement_to_i128(bytes: &[u8]) -> Option<i128> {
    if bytes.is_empty() || bytes.len() > 16 {
        return None;
    }
    let fill = if bytes[0] & 0x80 != 0 { 0xFF } else { 0x00 };
    let mut full = [fill; 16];
    full[16 - bytes.len()..].copy_from_slice(bytes);
    Some(i128::from_be_bytes(full))
}
