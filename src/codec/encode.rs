//! # Encoding
//!
//! Value-to-row encoding. The walk is a single forward pass over the shared
//! buffer: each writer lays down a zeroed header, scalars land directly in
//! their slots, and every variable-length field captures the cursor, appends
//! its payload, then backpatches the slot with the relative offset and the
//! unpadded size.

use eyre::Result;

use crate::error::{consistency_error, shape_error};
use crate::row::SlotWriter;
use crate::schema::{Field, FieldType, PrimitiveKind, RowSchema};
use crate::value::{i128_to_twos_complement, PrimitiveArray, Value};

use super::{RowCodec, Writer, WriterId, ROLE_ELEMENTS, ROLE_MAP_KEYS, ROLE_MAP_VALUES};

impl RowCodec {
    /// Encodes one record. `value` must be a `Value::Struct` whose arity
    /// matches the root schema. The returned slice borrows the codec's
    /// internal buffer and is valid until the next encode.
    pub fn to_row(&mut self, value: &Value) -> Result<&[u8]> {
        self.buf.reset();
        let schema = self.schema.clone();
        let root = self.root;
        self.encode_row(root, &schema, value)?;
        Ok(self.buf.bytes())
    }

    fn encode_row(&mut self, wid: WriterId, schema: &RowSchema, value: &Value) -> Result<()> {
        let values = match value {
            Value::Struct(v) => v,
            other => {
                return Err(shape_error(format!(
                    "expected a struct value for a record, got {}",
                    value_name(other)
                )))
            }
        };
        if values.len() != schema.field_count() {
            return Err(shape_error(format!(
                "record arity mismatch: schema has {} fields, value has {}",
                schema.field_count(),
                values.len()
            )));
        }
        match &mut self.writers[wid.0] {
            Writer::Row(w) => w.reset(&mut self.buf),
            Writer::Array(_) => {
                return Err(consistency_error("record writer slot holds an array writer"))
            }
        }
        for (ordinal, (field, v)) in schema.fields().iter().zip(values).enumerate() {
            self.encode_field(wid, ordinal, field, v)?;
        }
        Ok(())
    }

    pub(super) fn encode_field(
        &mut self,
        wid: WriterId,
        ordinal: usize,
        field: &Field,
        value: &Value,
    ) -> Result<()> {
        if value.is_null() {
            if let FieldType::Primitive(kind) = &field.field_type {
                return Err(shape_error(format!(
                    "field '{}' is a non-nullable {:?} but the value is null",
                    field.name, kind
                )));
            }
            return self.writers[wid.0].set_null_at(&mut self.buf, ordinal);
        }
        match &field.field_type {
            FieldType::Primitive(kind) | FieldType::Nullable(kind) => {
                let bits = scalar_slot_bits(*kind, field, value)?;
                self.writers[wid.0].write_slot(&mut self.buf, ordinal, bits)
            }
            FieldType::Date => match value {
                Value::Date(days) => {
                    self.writers[wid.0].write_slot(&mut self.buf, ordinal, *days as u32 as u64)
                }
                other => Err(mismatch(field, "a date", other)),
            },
            FieldType::Timestamp => match value {
                Value::Timestamp(micros) => {
                    self.writers[wid.0].write_slot(&mut self.buf, ordinal, *micros as u64)
                }
                other => Err(mismatch(field, "a timestamp", other)),
            },
            FieldType::String => match value {
                Value::String(s) => self.write_var(wid, ordinal, s.as_bytes()),
                other => Err(mismatch(field, "a string", other)),
            },
            FieldType::Enum(ty) => match value {
                Value::Enum(member) => {
                    let name = ty.variant(*member).ok_or_else(|| {
                        shape_error(format!(
                            "field '{}': ordinal {} out of range for enum '{}'",
                            field.name, member, ty.name
                        ))
                    })?;
                    self.write_var(wid, ordinal, name.as_bytes())
                }
                other => Err(mismatch(field, "an enum member", other)),
            },
            FieldType::Decimal { scale, .. } => match value {
                Value::Decimal {
                    unscaled,
                    scale: value_scale,
                } => {
                    if value_scale != scale {
                        return Err(shape_error(format!(
                            "field '{}': decimal scale {} does not match declared scale {}",
                            field.name, value_scale, scale
                        )));
                    }
                    let bytes = i128_to_twos_complement(*unscaled);
                    self.write_var(wid, ordinal, &bytes)
                }
                other => Err(mismatch(field, "a decimal", other)),
            },
            FieldType::BigInt => match value {
                Value::BigInt(bytes) => {
                    if bytes.is_empty() {
                        return Err(shape_error(format!(
                            "field '{}': big integer must have at least one byte",
                            field.name
                        )));
                    }
                    self.write_var(wid, ordinal, bytes)
                }
                other => Err(mismatch(field, "a big integer", other)),
            },
            FieldType::Array(elem) | FieldType::List(elem) | FieldType::Set(elem) => {
                let offset = self.buf.writer_index();
                self.encode_array(field, ROLE_ELEMENTS, elem, value)?;
                let size = self.buf.writer_index() - offset;
                self.writers[wid.0].set_offset_and_size(&mut self.buf, ordinal, offset, size)
            }
            FieldType::Map { key, value: val } => {
                let pairs = match value {
                    Value::Map(pairs) => pairs,
                    other => return Err(mismatch(field, "a map", other)),
                };
                for (i, (k, _)) in pairs.iter().enumerate() {
                    if k.is_null() {
                        return Err(shape_error(format!(
                            "field '{}': map key {} is null",
                            field.name, i
                        )));
                    }
                }
                let key_wid = self.collection_writer(field, ROLE_MAP_KEYS)?;
                let value_wid = self.collection_writer(field, ROLE_MAP_VALUES)?;
                let offset = self.buf.writer_index();
                // Key-array length prefix, patched once the key array lands.
                self.buf.write_directly_u64(0);
                let key_start = self.buf.writer_index();
                let keys: Vec<&Value> = pairs.iter().map(|(k, _)| k).collect();
                self.encode_elements(key_wid, key, &keys)?;
                let key_size = self.buf.writer_index() - key_start;
                self.buf.patch_u64(offset, key_size as u64);
                let values: Vec<&Value> = pairs.iter().map(|(_, v)| v).collect();
                self.encode_elements(value_wid, val, &values)?;
                let size = self.buf.writer_index() - offset;
                self.writers[wid.0].set_offset_and_size(&mut self.buf, ordinal, offset, size)
            }
            FieldType::Struct(nested) => {
                let nested = nested.clone();
                let nested_wid = self.struct_entry(&nested).ok_or_else(|| {
                    consistency_error(format!(
                        "field '{}': record schema was not compiled by this codec",
                        field.name
                    ))
                })?;
                let offset = self.buf.writer_index();
                self.encode_row(nested_wid, &nested, value)?;
                let size = self.buf.writer_index() - offset;
                self.writers[wid.0].set_offset_and_size(&mut self.buf, ordinal, offset, size)
            }
            FieldType::Opaque => {
                let fallback = self.fallback.clone().ok_or_else(|| {
                    shape_error(format!(
                        "field '{}': opaque field encountered but no fallback codec is attached",
                        field.name
                    ))
                })?;
                let bytes = fallback.encode(value)?;
                self.write_var(wid, ordinal, &bytes)
            }
        }
    }

    /// Encodes one array region at the current cursor. The caller captures
    /// the cursor before and patches the owning slot after.
    fn encode_array(&mut self, field: &Field, role: u8, elem: &Field, value: &Value) -> Result<()> {
        let wid = self.collection_writer(field, role)?;
        if let Value::PrimitiveArray(arr) = value {
            return self.encode_primitive_array(wid, elem, arr);
        }
        let elements: Vec<&Value> = match value {
            Value::Array(v) | Value::List(v) | Value::Set(v) => v.iter().collect(),
            other => {
                return Err(shape_error(format!(
                    "field '{}' expects a collection, got {}",
                    field.name,
                    value_name(other)
                )))
            }
        };
        self.encode_elements(wid, elem, &elements)
    }

    fn encode_elements(&mut self, wid: WriterId, elem: &Field, elements: &[&Value]) -> Result<()> {
        match &mut self.writers[wid.0] {
            Writer::Array(w) => w.reset(&mut self.buf, elements.len()),
            Writer::Row(_) => {
                return Err(consistency_error("collection writer slot holds a row writer"))
            }
        }
        for (i, v) in elements.iter().enumerate() {
            self.encode_field(wid, i, elem, v)?;
        }
        Ok(())
    }

    /// Bulk fast path: every slot written without per-element dispatch.
    /// Only non-nullable scalar element types qualify.
    fn encode_primitive_array(
        &mut self,
        wid: WriterId,
        elem: &Field,
        arr: &PrimitiveArray,
    ) -> Result<()> {
        match &elem.field_type {
            FieldType::Primitive(kind) if *kind == arr.kind() => {}
            FieldType::Primitive(kind) => {
                return Err(shape_error(format!(
                    "element '{}': primitive array of {:?} where {:?} is declared",
                    elem.name,
                    arr.kind(),
                    kind
                )))
            }
            _ => {
                return Err(shape_error(format!(
                    "element '{}': primitive array given for a non-primitive element type",
                    elem.name
                )))
            }
        }
        match &mut self.writers[wid.0] {
            Writer::Array(w) => {
                w.reset(&mut self.buf, arr.len());
                w.write_primitive_slots(&mut self.buf, arr)
            }
            Writer::Row(_) => Err(consistency_error("collection writer slot holds a row writer")),
        }
    }

    fn collection_writer(&self, field: &Field, role: u8) -> Result<WriterId> {
        self.array_entry(field, role).ok_or_else(|| {
            consistency_error(format!(
                "field '{}': collection writer was not compiled by this codec",
                field.name
            ))
        })
    }

    fn write_var(&mut self, wid: WriterId, ordinal: usize, bytes: &[u8]) -> Result<()> {
        let offset = self.buf.writer_index();
        self.buf.write_bytes_aligned(bytes);
        self.writers[wid.0].set_offset_and_size(&mut self.buf, ordinal, offset, bytes.len())
    }
}

/// Slot bits for a fixed-width scalar: the value zero-extended into the low
/// bytes of the 8-byte word.
fn scalar_slot_bits(kind: PrimitiveKind, field: &Field, value: &Value) -> Result<u64> {
    let bits = match (kind, value) {
        (PrimitiveKind::Bool, Value::Bool(b)) => *b as u64,
        (PrimitiveKind::Int8, Value::Int8(v)) => *v as u8 as u64,
        (PrimitiveKind::Int16, Value::Int16(v)) => *v as u16 as u64,
        (PrimitiveKind::Int32, Value::Int32(v)) => *v as u32 as u64,
        (PrimitiveKind::Int64, Value::Int64(v)) => *v as u64,
        (PrimitiveKind::UInt8, Value::UInt8(v)) => *v as u64,
        (PrimitiveKind::Float32, Value::Float32(v)) => v.to_bits() as u64,
        (PrimitiveKind::Float64, Value::Float64(v)) => v.to_bits(),
        (kind, other) => {
            return Err(shape_error(format!(
                "field '{}' expects {:?}, got {}",
                field.name,
                kind,
                value_name(other)
            )))
        }
    };
    Ok(bits)
}

fn mismatch(field: &Field, expected: &str, got: &Value) -> eyre::Report {
    shape_error(format!(
        "field '{}' expects {}, got {}",
        field.name,
        expected,
        value_name(got)
    ))
}

fn value_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Int8(_) => "an int8",
        Value::Int16(_) => "an int16",
        Value::Int32(_) => "an int32",
        Value::Int64(_) => "an int64",
        Value::UInt8(_) => "a uint8",
        Value::Float32(_) => "a float32",
        Value::Float64(_) => "a float64",
        Value::Decimal { .. } => "a decimal",
        Value::BigInt(_) => "a big integer",
        Value::Date(_) => "a date",
        Value::Timestamp(_) => "a timestamp",
        Value::String(_) => "a string",
        Value::Enum(_) => "an enum member",
        Value::Array(_) => "an array",
        Value::PrimitiveArray(_) => "a primitive array",
        Value::List(_) => "a list",
        Value::Set(_) => "a set",
        Value::Map(_) => "a map",
        Value::Struct(_) => "a struct",
    }
}
