//! # Row View
//!
//! Zero-copy reader over an encoded row. A view borrows the backing bytes
//! and resolves fields lazily: scalar getters read the 8-byte slot in place
//! and variable-length getters follow the `(offset << 32) | size` reference
//! into the variable region, returning sub-slices without copying.

use eyre::Result;

use crate::config::WORD_SIZE;
use crate::error::{bounds_error, shape_error};
use crate::row::array::ArrayView;
use crate::row::map::MapView;

/// Borrowed reader over the row layout
/// `[null bitset][N x 8-byte slots][variable region]`.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    data: &'a [u8],
    field_count: usize,
    bounds_checking: bool,
}

impl<'a> RowView<'a> {
    /// Binds a view over `data` for a row of `field_count` fields. The slice
    /// must start at the row's first bitset byte and extend at least through
    /// its variable region.
    pub fn new(data: &'a [u8], field_count: usize, bounds_checking: bool) -> Result<Self> {
        let header = field_count.div_ceil(64) * WORD_SIZE + field_count * WORD_SIZE;
        if bounds_checking && data.len() < header {
            return Err(bounds_error(format!(
                "row of {} fields needs {} header bytes, got {}",
                field_count,
                header,
                data.len()
            )));
        }
        Ok(Self {
            data,
            field_count,
            bounds_checking,
        })
    }

    #[inline]
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// The backing bytes this view was bound over.
    #[inline]
    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    fn bitset_bytes(&self) -> usize {
        self.field_count.div_ceil(64) * WORD_SIZE
    }

    #[inline]
    fn read_u64(&self, pos: usize) -> Result<u64> {
        let end = pos + WORD_SIZE;
        if self.bounds_checking && end > self.data.len() {
            return Err(bounds_error(format!(
                "read of 8 bytes at {} past buffer of {}",
                pos,
                self.data.len()
            )));
        }
        let mut word = [0u8; WORD_SIZE];
        word.copy_from_slice(&self.data[pos..end]);
        Ok(u64::from_le_bytes(word))
    }

    #[inline]
    fn check_ordinal(&self, ordinal: usize) -> Result<()> {
        if self.bounds_checking && ordinal >= self.field_count {
            return Err(bounds_error(format!(
                "ordinal {} out of range for {} fields",
                ordinal, self.field_count
            )));
        }
        Ok(())
    }

    /// Whether the field at `ordinal` was written as null.
    pub fn is_null_at(&self, ordinal: usize) -> Result<bool> {
        self.check_ordinal(ordinal)?;
        let word = self.read_u64((ordinal / 64) * WORD_SIZE)?;
        Ok(word & (1u64 << (ordinal % 64)) != 0)
    }

    /// Raw 8-byte slot bits for a fixed-width field.
    pub fn slot_bits(&self, ordinal: usize) -> Result<u64> {
        self.check_ordinal(ordinal)?;
        self.read_u64(self.bitset_bytes() + ordinal * WORD_SIZE)
    }

    /// Resolves a variable-length field's slot reference to a byte slice
    /// inside this row's region.
    pub fn var_bytes(&self, ordinal: usize) -> Result<&'a [u8]> {
        let bits = self.slot_bits(ordinal)?;
        let offset = (bits >> 32) as usize;
        let size = (bits & 0xffff_ffff) as usize;
        if self.bounds_checking && offset + size > self.data.len() {
            return Err(bounds_error(format!(
                "variable field {}: offset {} + size {} past buffer of {}",
                ordinal,
                offset,
                size,
                self.data.len()
            )));
        }
        Ok(&self.data[offset..offset + size])
    }

    pub fn get_bool(&self, ordinal: usize) -> Result<bool> {
        Ok(self.slot_bits(ordinal)? & 1 != 0)
    }

    pub fn get_i8(&self, ordinal: usize) -> Result<i8> {
        Ok(self.slot_bits(ordinal)? as u8 as i8)
    }

    pub fn get_i16(&self, ordinal: usize) -> Result<i16> {
        Ok(self.slot_bits(ordinal)? as u16 as i16)
    }

    pub fn get_i32(&self, ordinal: usize) -> Result<i32> {
        Ok(self.slot_bits(ordinal)? as u32 as i32)
    }

    pub fn get_i64(&self, ordinal: usize) -> Result<i64> {
        Ok(self.slot_bits(ordinal)? as i64)
    }

    pub fn get_u8(&self, ordinal: usize) -> Result<u8> {
        Ok(self.slot_bits(ordinal)? as u8)
    }

    pub fn get_f32(&self, ordinal: usize) -> Result<f32> {
        Ok(f32::from_bits(self.slot_bits(ordinal)? as u32))
    }

    pub fn get_f64(&self, ordinal: usize) -> Result<f64> {
        Ok(f64::from_bits(self.slot_bits(ordinal)?))
    }

    pub fn get_str(&self, ordinal: usize) -> Result<&'a str> {
        let bytes = self.var_bytes(ordinal)?;
        std::str::from_utf8(bytes)
            .map_err(|e| shape_error(format!("field {ordinal} is not valid utf-8: {e}")))
    }

    /// Binds a nested row view over a struct field's bytes.
    pub fn get_struct(&self, ordinal: usize, field_count: usize) -> Result<RowView<'a>> {
        RowView::new(self.var_bytes(ordinal)?, field_count, self.bounds_checking)
    }

    /// Binds an array view over a collection field's bytes.
    pub fn get_array(&self, ordinal: usize) -> Result<ArrayView<'a>> {
        ArrayView::new(self.var_bytes(ordinal)?, self.bounds_checking)
    }

    /// Binds a map view over a map field's bytes.
    pub fn get_map(&self, ordinal: usize) -> Result<MapView<'a>> {
        MapView::new(self.var_bytes(ordinal)?, self.bounds_checking)
    }
}
