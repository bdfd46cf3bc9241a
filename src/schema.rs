//! # Field Descriptors and Row Schemas
//!
//! This module provides the descriptor tree that drives the layout compiler:
//! `RowSchema` (an ordered list of named fields with fixed arity), `Field`
//! (one named position), and `FieldType` (the closed classifier of value
//! shapes). Every value the codec touches is described by exactly one
//! `FieldType` variant; dispatch over it is an exhaustive `match`, so adding
//! a category is a compile-time-checked change, not an open extension point.
//!
//! ## Type Categories
//!
//! Fixed-width categories live entirely in their 8-byte slot: `Primitive`
//! and `Nullable` scalars, `Date` (i32 day count since 1970-01-01), and
//! `Timestamp` (i64 microseconds since the epoch). Every other category
//! stores an `(offset, size)` reference in the slot and its payload in the
//! variable region:
//!
//! ```text
//! Decimal / BigInt     two's-complement bytes (unscaled value for Decimal)
//! String               UTF-8 bytes
//! Enum                 member name as UTF-8
//! Array / List / Set   nested Array layout
//! Map                  length prefix + key/value Arrays
//! Struct               nested Row layout
//! Opaque               fallback codec payload
//! ```
//!
//! Schemas are shared through `Arc`; the codec memoizes per-record state by
//! `Arc` identity, so a nested record type used by several fields compiles
//! exactly once.

use std::sync::Arc;

/// Fixed-width scalar kinds. Eight kinds, one bulk fast path each for
/// primitive-element arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    Float32,
    Float64,
}

/// A named enumeration type. Members are encoded by name on the wire, so
/// reordering variants does not change encoded bytes, but renaming does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    variants: Vec<String>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, variants: Vec<String>) -> Self {
        Self {
            name: name.into(),
            variants,
        }
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// The wire name for an ordinal, if in range.
    pub fn variant(&self, ordinal: u32) -> Option<&str> {
        self.variants.get(ordinal as usize).map(String::as_str)
    }

    /// Looks a member up by its wire name.
    pub fn ordinal_of(&self, name: &str) -> Option<u32> {
        self.variants.iter().position(|v| v == name).map(|p| p as u32)
    }
}

/// The closed classifier: exactly one category per value shape.
#[derive(Debug, Clone)]
pub enum FieldType {
    /// Non-nullable fixed-width scalar, written inline in the slot.
    Primitive(PrimitiveKind),
    /// Nullable (boxed) fixed-width scalar.
    Nullable(PrimitiveKind),
    /// Arbitrary-precision decimal; `scale` is part of the descriptor, the
    /// variable region holds only the unscaled two's-complement bytes.
    Decimal { precision: u8, scale: i16 },
    /// Arbitrary-precision integer as big-endian two's-complement bytes.
    BigInt,
    /// Signed 32-bit day count since 1970-01-01.
    Date,
    /// Signed 64-bit microsecond count since the epoch.
    Timestamp,
    /// UTF-8 string in the variable region.
    String,
    /// Enumeration, encoded by member name.
    Enum(Arc<EnumType>),
    /// Fixed-shape homogeneous array; nesting arrays yields a
    /// multi-dimensional array on the wire.
    Array(Box<Field>),
    /// Ordered growable sequence (the ordered-sequence collection default).
    List(Box<Field>),
    /// Unique-element collection (the set-like collection default);
    /// encode-time iteration order is preserved on the wire.
    Set(Box<Field>),
    /// Key/value map, encoded as a key Array and a value Array of equal
    /// cardinality. Keys must not be null.
    Map { key: Box<Field>, value: Box<Field> },
    /// Nested record with its own row layout.
    Struct(Arc<RowSchema>),
    /// No structural representation; delegated to the fallback codec.
    Opaque,
}

impl FieldType {
    /// Number of nested `Array` levels below (and excluding) this type.
    /// A plain `Array(Int32)` element type reports 0; `Array(Array(Int32))`
    /// reports 1.
    pub fn array_depth(&self) -> usize {
        match self {
            FieldType::Array(elem) => 1 + elem.field_type.array_depth(),
            _ => 0,
        }
    }
}

/// One named position in a row, array, or map layout.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Ordered, fixed-arity record schema.
#[derive(Debug, Clone)]
pub struct RowSchema {
    fields: Vec<Field>,
}

impl RowSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}
