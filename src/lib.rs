//! # rowbin - Binary Row Format Codec
//!
//! rowbin encodes structured records into a word-aligned, little-endian
//! binary row layout with random field access, and decodes them back. The
//! design goals:
//!
//! - **Zero-copy reads**: views resolve fields directly against the encoded
//!   bytes, no intermediate buffers
//! - **Zero steady-state allocation**: writers are compiled once per schema
//!   and reused across encodes
//! - **Deterministic bytes**: re-encoding the same value is byte-identical
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use rowbin::{Config, Field, FieldType, PrimitiveKind, RowCodec, RowSchema, Value};
//!
//! let schema = Arc::new(RowSchema::new(vec![
//!     Field::new("name", FieldType::String),
//!     Field::new("age", FieldType::Primitive(PrimitiveKind::Int32)),
//! ]));
//! let mut codec = RowCodec::new(schema, Config::default());
//!
//! let bytes = codec.to_row(&Value::Struct(vec![
//!     Value::String("ada".into()),
//!     Value::Int32(36),
//! ]))?.to_vec();
//!
//! // Owned decode, or zero-copy field access.
//! let record = codec.from_row(&bytes)?;
//! let age = codec.row_view(&bytes)?.get_i32(1)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │      Codec (RowCodec: to/from)       │
//! ├───────────────────┬─────────────────┤
//! │ Descriptors       │ Values           │
//! │ (RowSchema/Field) │ (Value tree)     │
//! ├───────────────────┴─────────────────┤
//! │  Row Layer (writers, views, buffer)  │
//! ├─────────────────────────────────────┤
//! │   Shared byte buffer (RowBuffer)     │
//! └─────────────────────────────────────┘
//! ```
//!
//! Construction compiles the descriptor tree into a writer arena; encoding
//! is a single forward pass with slot backpatching; decoding walks the same
//! descriptors over zero-copy views. Fields with no structural
//! representation are bridged to an external serializer through
//! [`FallbackCodec`].

pub mod codec;
pub mod config;
pub mod error;
pub mod fallback;
pub mod row;
pub mod schema;
pub mod value;

pub use codec::RowCodec;
pub use config::{Config, UNSAFE_ACCESS_ENV, WORD_SIZE};
pub use error::CodecError;
pub use fallback::FallbackCodec;
pub use row::{ArrayView, MapView, RowBuffer, RowView};
pub use schema::{EnumType, Field, FieldType, PrimitiveKind, RowSchema};
pub use value::{PrimitiveArray, Value};
