//! # Row Buffer and Slot Writers
//!
//! This module provides `RowBuffer`, the append-only growable byte buffer all
//! writers share, and the two slot writers (`RowWriter`, `ArrayWriter`) that
//! lay fixed-width slots and null bitsets over it.
//!
//! ## Two-Pass Backpatching
//!
//! Variable-length fields are written in two passes: capture the writer
//! index, append the payload bytes, then backpatch the field's 8-byte slot
//! with `(offset << 32) | size`, where offset is relative to the enclosing
//! row/array start and size is the writer-index delta. `set_offset_and_size`
//! must therefore be called only after the payload is fully written; calling
//! it early records a wrong size. No other writer may touch the buffer
//! between capture and backpatch.
//!
//! ## Alignment
//!
//! Every cursor advance is a multiple of 8 bytes: headers and slots are
//! whole words and variable payloads are zero-padded up to the next word
//! boundary (the stored size is the unpadded length). As a consequence every
//! nested row/array starts word-aligned and re-encoding the same value is
//! byte-for-byte deterministic.
//!
//! ## Reuse
//!
//! Nested writers are reusable: `reset` rebinds them at the current cursor
//! without releasing storage. A nested writer must be reset before every
//! occurrence it writes; a stale start index corrupts all subsequent offset
//! arithmetic. The outermost writer's reset is its caller's responsibility.

use eyre::Result;

use crate::config::{Config, WORD_SIZE};
use crate::error::bounds_error;
use crate::value::PrimitiveArray;

/// Rounds `n` up to the next multiple of [`WORD_SIZE`].
#[inline]
pub(crate) fn align_up(n: usize) -> usize {
    (n + WORD_SIZE - 1) & !(WORD_SIZE - 1)
}

/// Append-only growable byte buffer with a writer index.
///
/// All freshly grown bytes are zero, so skipped regions (null slots, bitset
/// words, alignment padding) never leak stale data.
#[derive(Debug)]
pub struct RowBuffer {
    data: Vec<u8>,
    writer_index: usize,
    bounds_checking: bool,
}

impl RowBuffer {
    pub fn new(config: Config) -> Self {
        Self {
            data: Vec::with_capacity(256),
            writer_index: 0,
            bounds_checking: config.bounds_checking,
        }
    }

    #[inline]
    pub fn bounds_checking(&self) -> bool {
        self.bounds_checking
    }

    #[inline]
    pub fn writer_index(&self) -> usize {
        self.writer_index
    }

    /// The written bytes so far.
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.writer_index]
    }

    /// Rewinds to empty without releasing storage.
    pub fn reset(&mut self) {
        self.data.clear();
        self.writer_index = 0;
    }

    #[inline]
    fn ensure(&mut self, end: usize) {
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
    }

    /// Appends `n` zero bytes and advances the cursor.
    pub fn write_zeros(&mut self, n: usize) {
        let end = self.writer_index + n;
        self.ensure(end);
        self.data[self.writer_index..end].fill(0);
        self.writer_index = end;
    }

    /// Appends raw bytes irrespective of slot semantics and advances the
    /// cursor by exactly `bytes.len()`. Used to reserve and later overwrite
    /// length prefixes; callers are responsible for keeping the cursor
    /// word-aligned.
    pub fn write_directly(&mut self, bytes: &[u8]) {
        let end = self.writer_index + bytes.len();
        self.ensure(end);
        self.data[self.writer_index..end].copy_from_slice(bytes);
        self.writer_index = end;
    }

    pub fn write_directly_u64(&mut self, v: u64) {
        self.write_directly(&v.to_le_bytes());
    }

    /// Appends a variable-region payload, zero-padding the cursor up to the
    /// next word boundary.
    pub fn write_bytes_aligned(&mut self, bytes: &[u8]) {
        self.write_directly(bytes);
        let aligned = align_up(self.writer_index);
        self.write_zeros(aligned - self.writer_index);
    }

    /// Places bytes at an absolute position without moving the cursor.
    pub fn put_bytes(&mut self, pos: usize, bytes: &[u8]) {
        let end = pos + bytes.len();
        self.ensure(end);
        self.data[pos..end].copy_from_slice(bytes);
    }

    /// Overwrites the 8 bytes at `pos`. Backpatching primitive.
    pub fn patch_u64(&mut self, pos: usize, v: u64) {
        self.put_bytes(pos, &v.to_le_bytes());
    }

    /// Reads back the 8 bytes at `pos`. Positions beyond the written region
    /// read as zero.
    pub fn read_u64(&self, pos: usize) -> u64 {
        let mut word = [0u8; WORD_SIZE];
        if pos < self.data.len() {
            let avail = (self.data.len() - pos).min(WORD_SIZE);
            word[..avail].copy_from_slice(&self.data[pos..pos + avail]);
        }
        u64::from_le_bytes(word)
    }

    /// Advances the cursor past `n` bytes placed via [`Self::put_bytes`],
    /// zero-padding up to the next word boundary. Required after embedding
    /// an opaque sub-blob so subsequent slots stay aligned.
    pub fn increase_writer_index_to_aligned(&mut self, n: usize) {
        let end = align_up(self.writer_index + n);
        self.ensure(end);
        self.data[self.writer_index + n..end].fill(0);
        self.writer_index = end;
    }
}

/// Slot arithmetic shared by the row and array layouts.
///
/// Both layouts are `[... header ...][null bitset][8-byte slots...]`; they
/// differ only in where the bitset starts and how many slots they carry.
pub trait SlotWriter {
    /// Absolute buffer index where this writer's layout starts. Offsets
    /// stored in slots are relative to this.
    fn start_index(&self) -> usize;

    /// Declared field/element arity.
    fn slot_count(&self) -> usize;

    /// Absolute index of the null bitset.
    fn bitset_index(&self) -> usize;

    /// Absolute index of slot 0.
    fn slot_base(&self) -> usize;

    /// Writing past the declared arity is a programmer error and fails fast.
    /// The check is elided when bounds checking is disabled.
    #[inline]
    fn check_ordinal(&self, buf: &RowBuffer, ordinal: usize) -> Result<()> {
        if buf.bounds_checking() && ordinal >= self.slot_count() {
            return Err(bounds_error(format!(
                "ordinal {} out of range for {} slots",
                ordinal,
                self.slot_count()
            )));
        }
        Ok(())
    }

    /// Marks the position null. The slot stays zero and no variable bytes
    /// are produced for it.
    fn set_null_at(&self, buf: &mut RowBuffer, ordinal: usize) -> Result<()> {
        self.check_ordinal(buf, ordinal)?;
        let pos = self.bitset_index() + (ordinal / 64) * WORD_SIZE;
        let word = buf.read_u64(pos) | (1u64 << (ordinal % 64));
        buf.patch_u64(pos, word);
        Ok(())
    }

    /// Writes a fixed-width scalar's slot bits.
    fn write_slot(&self, buf: &mut RowBuffer, ordinal: usize, bits: u64) -> Result<()> {
        self.check_ordinal(buf, ordinal)?;
        buf.patch_u64(self.slot_base() + ordinal * WORD_SIZE, bits);
        Ok(())
    }

    /// Backpatches a variable-length reference into the slot: a 32-bit
    /// offset relative to [`Self::start_index`] and a 32-bit byte length.
    /// Must be called only after the referenced bytes are fully written.
    fn set_offset_and_size(
        &self,
        buf: &mut RowBuffer,
        ordinal: usize,
        offset: usize,
        size: usize,
    ) -> Result<()> {
        self.check_ordinal(buf, ordinal)?;
        let relative = offset - self.start_index();
        if buf.bounds_checking() && (relative > u32::MAX as usize || size > u32::MAX as usize) {
            return Err(bounds_error(format!(
                "variable reference out of range: offset {relative}, size {size}"
            )));
        }
        let bits = ((relative as u64) << 32) | size as u64;
        buf.patch_u64(self.slot_base() + ordinal * WORD_SIZE, bits);
        Ok(())
    }
}

/// Writer for the fixed-arity row layout:
/// `[null bitset][N x 8-byte slots][variable region]`.
#[derive(Debug)]
pub struct RowWriter {
    field_count: usize,
    start_index: usize,
}

impl RowWriter {
    pub fn new(field_count: usize) -> Self {
        Self {
            field_count,
            start_index: 0,
        }
    }

    pub fn field_count(&self) -> usize {
        self.field_count
    }

    #[inline]
    fn bitset_bytes(&self) -> usize {
        self.field_count.div_ceil(64) * WORD_SIZE
    }

    /// Header size: null bitset plus the fixed slot table.
    pub fn header_bytes(&self) -> usize {
        self.bitset_bytes() + self.field_count * WORD_SIZE
    }

    /// Rebinds this writer at the current cursor and lays down a zeroed
    /// header (all-non-null bitset, zero slots). Must be called before every
    /// row this writer encodes.
    pub fn reset(&mut self, buf: &mut RowBuffer) {
        self.start_index = buf.writer_index();
        buf.write_zeros(self.header_bytes());
    }

    /// Bytes written for the current row so far.
    pub fn size(&self, buf: &RowBuffer) -> usize {
        buf.writer_index() - self.start_index
    }
}

impl SlotWriter for RowWriter {
    fn start_index(&self) -> usize {
        self.start_index
    }

    fn slot_count(&self) -> usize {
        self.field_count
    }

    fn bitset_index(&self) -> usize {
        self.start_index
    }

    fn slot_base(&self) -> usize {
        self.start_index + self.bitset_bytes()
    }
}

/// Writer for the homogeneous array layout:
/// `[count: u64][null bitset][count x 8-byte slots][variable region]`.
#[derive(Debug)]
pub struct ArrayWriter {
    num_elements: usize,
    start_index: usize,
}

impl Default for ArrayWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArrayWriter {
    pub fn new() -> Self {
        Self {
            num_elements: 0,
            start_index: 0,
        }
    }

    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    #[inline]
    fn bitset_bytes(&self) -> usize {
        self.num_elements.div_ceil(64) * WORD_SIZE
    }

    /// Rebinds this writer at the current cursor for an array of
    /// `num_elements`, writing the count word and a zeroed bitset and slot
    /// table. Must be called before every array this writer encodes.
    pub fn reset(&mut self, buf: &mut RowBuffer, num_elements: usize) {
        self.num_elements = num_elements;
        self.start_index = buf.writer_index();
        buf.write_directly_u64(num_elements as u64);
        buf.write_zeros(self.bitset_bytes() + num_elements * WORD_SIZE);
    }

    /// Bulk fast path for primitive-element arrays: fills every slot without
    /// per-element dispatch. The writer must have been reset with the
    /// array's length.
    pub fn write_primitive_slots(&self, buf: &mut RowBuffer, arr: &PrimitiveArray) -> Result<()> {
        if buf.bounds_checking() && arr.len() != self.num_elements {
            return Err(bounds_error(format!(
                "primitive array length {} does not match writer arity {}",
                arr.len(),
                self.num_elements
            )));
        }
        let base = self.slot_base();
        match arr {
            PrimitiveArray::Bool(v) => {
                for (i, x) in v.iter().enumerate() {
                    buf.patch_u64(base + i * WORD_SIZE, *x as u64);
                }
            }
            PrimitiveArray::Int8(v) => {
                for (i, x) in v.iter().enumerate() {
                    buf.patch_u64(base + i * WORD_SIZE, *x as u8 as u64);
                }
            }
            PrimitiveArray::Int16(v) => {
                for (i, x) in v.iter().enumerate() {
                    buf.patch_u64(base + i * WORD_SIZE, *x as u16 as u64);
                }
            }
            PrimitiveArray::Int32(v) => {
                for (i, x) in v.iter().enumerate() {
                    buf.patch_u64(base + i * WORD_SIZE, *x as u32 as u64);
                }
            }
            PrimitiveArray::Int64(v) => {
                for (i, x) in v.iter().enumerate() {
                    buf.patch_u64(base + i * WORD_SIZE, *x as u64);
                }
            }
            PrimitiveArray::UInt8(v) => {
                for (i, x) in v.iter().enumerate() {
                    buf.patch_u64(base + i * WORD_SIZE, *x as u64);
                }
            }
            PrimitiveArray::Float32(v) => {
                for (i, x) in v.iter().enumerate() {
                    buf.patch_u64(base + i * WORD_SIZE, x.to_bits() as u64);
                }
            }
            PrimitiveArray::Float64(v) => {
                for (i, x) in v.iter().enumerate() {
                    buf.patch_u64(base + i * WORD_SIZE, x.to_bits());
                }
            }
        }
        Ok(())
    }
}

impl SlotWriter for ArrayWriter {
    fn start_index(&self) -> usize {
        self.start_index
    }

    fn slot_count(&self) -> usize {
        self.num_elements
    }

    fn bitset_index(&self) -> usize {
        self.start_index + WORD_SIZE
    }

    fn slot_base(&self) -> usize {
        self.start_index + WORD_SIZE + self.bitset_bytes()
    }
}
