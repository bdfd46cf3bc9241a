//! # Descriptor-Driven Row Codec
//!
//! `RowCodec` turns owned [`Value`](crate::value::Value) trees into the
//! binary row layout and back, driven by an [`RowSchema`] descriptor tree.
//!
//! ## Layout Compilation
//!
//! Construction walks the descriptor tree once and allocates every writer
//! the encoder will ever need into a flat arena:
//!
//! * one [`RowWriter`] per distinct record schema, memoized by `Arc`
//!   identity so a nested record type used by several fields compiles once;
//! * one [`ArrayWriter`] per collection position, keyed by the field's
//!   address plus a role tag because a map field owns two arrays (keys and
//!   values) at the same address.
//!
//! Writers are reused across encodes via `reset`, so steady-state encoding
//! allocates nothing beyond buffer growth. Reuse is sound because a writer
//! is live only between its reset and the completion of its region, and the
//! same descriptor node cannot occur twice on one descent path (`Arc` trees
//! are acyclic).
//!
//! Encoding and decoding live in the sibling `encode` and `decode` modules.

mod decode;
mod encode;


use std::sync::Arc;

use hashbrown::HashMap;

use crate::config::Config;
use crate::fallback::FallbackCodec;
use crate::row::{ArrayWriter, RowBuffer, RowWriter, SlotWriter};
use crate::schema::{Field, FieldType, RowSchema};

/// Index into the codec's writer arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WriterId(pub(crate) usize);

/// Role tag distinguishing the arrays a single field position owns.
pub(crate) const ROLE_ELEMENTS: u8 = 0;
pub(crate) const ROLE_MAP_KEYS: u8 = 1;
pub(crate) const ROLE_MAP_VALUES: u8 = 2;

#[derive(Debug)]
pub(crate) enum Writer {
    Row(RowWriter),
    Array(ArrayWriter),
}

impl SlotWriter for Writer {
    fn start_index(&self) -> usize {
        match self {
            Writer::Row(w) => w.start_index(),
            Writer::Array(w) => w.start_index(),
        }
    }

    fn slot_count(&self) -> usize {
        match self {
            Writer::Row(w) => w.slot_count(),
            Writer::Array(w) => w.slot_count(),
        }
    }

    fn bitset_index(&self) -> usize {
        match self {
            Writer::Row(w) => w.bitset_index(),
            Writer::Array(w) => w.bitset_index(),
        }
    }

    fn slot_base(&self) -> usize {
        match self {
            Writer::Row(w) => w.slot_base(),
            Writer::Array(w) => w.slot_base(),
        }
    }
}

/// Encoder/decoder for one root record schema.
pub struct RowCodec {
    schema: Arc<RowSchema>,
    config: Config,
    buf: RowBuffer,
    writers: Vec<Writer>,
    root: WriterId,
    /// `Arc::as_ptr` of a record schema to its row writer.
    struct_entries: HashMap<usize, WriterId>,
    /// Field address plus role tag to the collection's array writer.
    array_entries: HashMap<(usize, u8), WriterId>,
    fallback: Option<Arc<dyn FallbackCodec>>,
}

impl std::fmt::Debug for RowCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowCodec")
            .field("field_count", &self.schema.field_count())
            .field("writers", &self.writers.len())
            .field("config", &self.config)
            .finish()
    }
}

impl RowCodec {
    /// Compiles the layout for `schema` and returns a reusable codec.
    pub fn new(schema: Arc<RowSchema>, config: Config) -> Self {
        let mut codec = Self {
            schema: schema.clone(),
            config,
            buf: RowBuffer::new(config),
            writers: Vec::new(),
            root: WriterId(0),
            struct_entries: HashMap::new(),
            array_entries: HashMap::new(),
            fallback: None,
        };
        codec.root = codec.register_schema(&schema);
        codec
    }

    /// Attaches the serializer used for `Opaque` fields. Encoding or
    /// decoding an opaque field without one is a shape error.
    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackCodec>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn schema(&self) -> &Arc<RowSchema> {
        &self.schema
    }

    pub fn config(&self) -> Config {
        self.config
    }

    fn alloc(&mut self, writer: Writer) -> WriterId {
        let id = WriterId(self.writers.len());
        self.writers.push(writer);
        id
    }

    fn register_schema(&mut self, schema: &Arc<RowSchema>) -> WriterId {
        let key = Arc::as_ptr(schema) as usize;
        if let Some(id) = self.struct_entries.get(&key) {
            return *id;
        }
        let id = self.alloc(Writer::Row(RowWriter::new(schema.field_count())));
        self.struct_entries.insert(key, id);
        for field in schema.fields() {
            self.register_field(field);
        }
        id
    }

    fn register_field(&mut self, field: &Field) {
        match &field.field_type {
            FieldType::Array(elem) | FieldType::List(elem) | FieldType::Set(elem) => {
                let key = (field_key(field), ROLE_ELEMENTS);
                let id = self.alloc(Writer::Array(ArrayWriter::new()));
                self.array_entries.insert(key, id);
                self.register_field(elem);
            }
            FieldType::Map { key, value } => {
                let kid = self.alloc(Writer::Array(ArrayWriter::new()));
                self.array_entries.insert((field_key(field), ROLE_MAP_KEYS), kid);
                let vid = self.alloc(Writer::Array(ArrayWriter::new()));
                self.array_entries
                    .insert((field_key(field), ROLE_MAP_VALUES), vid);
                self.register_field(key);
                self.register_field(value);
            }
            FieldType::Struct(nested) => {
                self.register_schema(nested);
            }
            _ => {}
        }
    }

    pub(crate) fn struct_entry(&self, schema: &Arc<RowSchema>) -> Option<WriterId> {
        self.struct_entries
            .get(&(Arc::as_ptr(schema) as usize))
            .copied()
    }

    pub(crate) fn array_entry(&self, field: &Field, role: u8) -> Option<WriterId> {
        self.array_entries.get(&(field_key(field), role)).copied()
    }
}

/// Identity key for a descriptor position. Stable because the whole
/// descriptor tree is owned by the root schema `Arc` the codec holds.
#[inline]
pub(crate) fn field_key(field: &Field) -> usize {
    field as *const Field as usize
}
