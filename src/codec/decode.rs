//! # Decoding
//!
//! Row-to-value decoding over the zero-copy views. Decoding never mutates
//! the codec; everything it needs is the descriptor tree and the bounds
//! toggle. Primitive-element arrays come back as `Value::PrimitiveArray`
//! through the bulk path even when they were encoded element by element.

use eyre::Result;

use crate::error::{consistency_error, shape_error};
use crate::row::{ArrayView, MapView, RowView};
use crate::schema::{Field, FieldType, PrimitiveKind, RowSchema};
use crate::value::{twos_complement_to_i128, Value};

use super::RowCodec;

/// A decode position is either a row field or an array element; the two
/// views expose the same slot operations.
#[derive(Clone, Copy)]
enum Slots<'a, 'b> {
    Row(&'b RowView<'a>),
    Array(&'b ArrayView<'a>),
}

impl<'a> Slots<'a, '_> {
    fn is_null_at(&self, idx: usize) -> Result<bool> {
        match self {
            Slots::Row(v) => v.is_null_at(idx),
            Slots::Array(v) => v.is_null_at(idx),
        }
    }

    fn slot_bits(&self, idx: usize) -> Result<u64> {
        match self {
            Slots::Row(v) => v.slot_bits(idx),
            Slots::Array(v) => v.slot_bits(idx),
        }
    }

    fn var_bytes(&self, idx: usize) -> Result<&'a [u8]> {
        match self {
            Slots::Row(v) => v.var_bytes(idx),
            Slots::Array(v) => v.var_bytes(idx),
        }
    }

    fn get_str(&self, idx: usize) -> Result<&'a str> {
        match self {
            Slots::Row(v) => v.get_str(idx),
            Slots::Array(v) => v.get_str(idx),
        }
    }
}

impl RowCodec {
    /// Decodes a record previously produced by [`RowCodec::to_row`] with the
    /// same schema. Returns a fully-owned `Value::Struct`.
    pub fn from_row(&self, bytes: &[u8]) -> Result<Value> {
        let view = RowView::new(
            bytes,
            self.schema.field_count(),
            self.config.bounds_checking,
        )?;
        self.decode_row(&view, &self.schema)
    }

    /// Binds a zero-copy view over an encoded record for field-at-a-time
    /// access without materializing owned values.
    pub fn row_view<'a>(&self, bytes: &'a [u8]) -> Result<RowView<'a>> {
        RowView::new(
            bytes,
            self.schema.field_count(),
            self.config.bounds_checking,
        )
    }

    fn decode_row(&self, view: &RowView<'_>, schema: &RowSchema) -> Result<Value> {
        let mut values = Vec::with_capacity(schema.field_count());
        for (ordinal, field) in schema.fields().iter().enumerate() {
            values.push(self.decode_field(Slots::Row(view), ordinal, field)?);
        }
        Ok(Value::Struct(values))
    }

    fn decode_field(&self, slots: Slots<'_, '_>, idx: usize, field: &Field) -> Result<Value> {
        // Non-nullable scalars ignore the bitset entirely.
        if !matches!(field.field_type, FieldType::Primitive(_)) && slots.is_null_at(idx)? {
            return Ok(Value::Null);
        }
        match &field.field_type {
            FieldType::Primitive(kind) | FieldType::Nullable(kind) => {
                Ok(scalar_from_bits(*kind, slots.slot_bits(idx)?))
            }
            FieldType::Date => Ok(Value::Date(slots.slot_bits(idx)? as u32 as i32)),
            FieldType::Timestamp => Ok(Value::Timestamp(slots.slot_bits(idx)? as i64)),
            FieldType::String => Ok(Value::String(slots.get_str(idx)?.to_owned())),
            FieldType::Enum(ty) => {
                let name = slots.get_str(idx)?;
                let member = ty.ordinal_of(name).ok_or_else(|| {
                    shape_error(format!(
                        "field '{}': '{}' is not a member of enum '{}'",
                        field.name, name, ty.name
                    ))
                })?;
                Ok(Value::Enum(member))
            }
            FieldType::Decimal { scale, .. } => {
                let bytes = slots.var_bytes(idx)?;
                let unscaled = twos_complement_to_i128(bytes).ok_or_else(|| {
                    shape_error(format!(
                        "field '{}': {} bytes is not a valid decimal payload",
                        field.name,
                        bytes.len()
                    ))
                })?;
                Ok(Value::Decimal {
                    unscaled,
                    scale: *scale,
                })
            }
            FieldType::BigInt => {
                let bytes = slots.var_bytes(idx)?;
                if bytes.is_empty() {
                    return Err(shape_error(format!(
                        "field '{}': empty big integer payload",
                        field.name
                    )));
                }
                Ok(Value::BigInt(bytes.to_vec()))
            }
            FieldType::Array(elem) => {
                let view = self.array_view(slots.var_bytes(idx)?)?;
                let ndims = 1 + elem.field_type.array_depth();
                if ndims > 1 {
                    // Shape recovery needs one complete descent; without it
                    // the whole field is reconstructed as null rather than
                    // reported as an error. The gate applies to the field's
                    // outermost recovery only; inner levels decode
                    // element-wise honoring their null bits.
                    if view.dimensions(ndims).is_none() {
                        return Ok(Value::Null);
                    }
                }
                self.decode_array(&view, elem)
            }
            FieldType::List(elem) => {
                let view = self.array_view(slots.var_bytes(idx)?)?;
                Ok(Value::List(self.decode_elements(&view, elem)?))
            }
            FieldType::Set(elem) => {
                let view = self.array_view(slots.var_bytes(idx)?)?;
                Ok(Value::Set(self.decode_elements(&view, elem)?))
            }
            FieldType::Map { key, value } => {
                let map = MapView::new(slots.var_bytes(idx)?, self.config.bounds_checking)?;
                self.decode_map(&map, key, value)
            }
            FieldType::Struct(nested) => {
                if self.struct_entry(nested).is_none() {
                    return Err(consistency_error(format!(
                        "field '{}': record schema was not compiled by this codec",
                        field.name
                    )));
                }
                let view = RowView::new(
                    slots.var_bytes(idx)?,
                    nested.field_count(),
                    self.config.bounds_checking,
                )?;
                self.decode_row(&view, nested)
            }
            FieldType::Opaque => {
                let fallback = self.fallback.as_ref().ok_or_else(|| {
                    shape_error(format!(
                        "field '{}': opaque field encountered but no fallback codec is attached",
                        field.name
                    ))
                })?;
                fallback.decode(slots.var_bytes(idx)?)
            }
        }
    }

    /// Decodes one array level of an `Array` field. Non-nullable primitive
    /// element types take the bulk path; nested array levels recurse here
    /// directly (the dimension gate already ran at the field entry);
    /// everything else decodes element by element.
    fn decode_array(&self, view: &ArrayView<'_>, elem: &Field) -> Result<Value> {
        if let FieldType::Primitive(kind) = &elem.field_type {
            return Ok(Value::PrimitiveArray(view.to_primitive_array(*kind)?));
        }
        if let FieldType::Array(inner) = &elem.field_type {
            let mut out = Vec::with_capacity(view.num_elements());
            for i in 0..view.num_elements() {
                if view.is_null_at(i)? {
                    out.push(Value::Null);
                } else {
                    let nested = view.get_array(i)?;
                    out.push(self.decode_array(&nested, inner)?);
                }
            }
            return Ok(Value::Array(out));
        }
        Ok(Value::Array(self.decode_elements(view, elem)?))
    }

    fn decode_elements(&self, view: &ArrayView<'_>, elem: &Field) -> Result<Vec<Value>> {
        let mut out = Vec::with_capacity(view.num_elements());
        for i in 0..view.num_elements() {
            out.push(self.decode_field(Slots::Array(view), i, elem)?);
        }
        Ok(out)
    }

    fn decode_map(&self, map: &MapView<'_>, key: &Field, value: &Field) -> Result<Value> {
        let keys = map.keys();
        let values = map.values();
        let mut pairs = Vec::with_capacity(map.len());
        for i in 0..map.len() {
            // A null key has no identity; the pair is dropped rather than
            // surfaced.
            if keys.is_null_at(i)? {
                continue;
            }
            let k = self.decode_field(Slots::Array(&keys), i, key)?;
            let v = self.decode_field(Slots::Array(&values), i, value)?;
            pairs.push((k, v));
        }
        Ok(Value::Map(pairs))
    }

    fn array_view<'a>(&self, bytes: &'a [u8]) -> Result<ArrayView<'a>> {
        ArrayView::new(bytes, self.config.bounds_checking)
    }
}

fn scalar_from_bits(kind: PrimitiveKind, bits: u64) -> Value {
    match kind {
        PrimitiveKind::Bool => Value::Bool(bits & 1 != 0),
        PrimitiveKind::Int8 => Value::Int8(bits as u8 as i8),
        PrimitiveKind::Int16 => Value::Int16(bits as u16 as i16),
        PrimitiveKind::Int32 => Value::Int32(bits as u32 as i32),
        PrimitiveKind::Int64 => Value::Int64(bits as i64),
        PrimitiveKind::UInt8 => Value::UInt8(bits as u8),
        PrimitiveKind::Float32 => Value::Float32(f32::from_bits(bits as u32)),
        PrimitiveKind::Float64 => Value::Float64(f64::from_bits(bits)),
    }
}
