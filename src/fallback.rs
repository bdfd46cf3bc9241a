//! # Opaque Fallback Bridge
//!
//! Values whose field descriptor is `FieldType::Opaque` have no row, array,
//! or map representation. The codec addresses them as an opaque byte range
//! inside the buffer and delegates the bytes themselves to an external
//! general-purpose serializer implementing `FallbackCodec`.
//!
//! The codec guarantees the reserved region is exclusive: the offset is
//! captured before the payload is appended and the cursor is advanced past it
//! with alignment padding afterwards, so the bytes are never reinterpreted as
//! row/array/map structure.

use eyre::Result;

use crate::value::Value;

/// External general-purpose serializer used for opaque fields.
pub trait FallbackCodec: Send + Sync {
    /// Serializes `value` to its opaque byte representation.
    fn encode(&self, value: &Value) -> Result<Vec<u8>>;

    /// Reconstructs a value from the addressed byte range.
    fn decode(&self, bytes: &[u8]) -> Result<Value>;
}
