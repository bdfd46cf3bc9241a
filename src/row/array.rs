//! # Array View
//!
//! Zero-copy reader over the homogeneous array layout
//! `[count: u64][null bitset][count x 8-byte slots][variable region]`.
//! Also hosts multi-dimensional shape recovery: nested array-of-array
//! encodings expose their per-level extents through [`ArrayView::dimensions`],
//! which is deliberately lenient about malformed nesting metadata.

use eyre::Result;
use smallvec::SmallVec;

use crate::config::WORD_SIZE;
use crate::error::{bounds_error, shape_error};
use crate::schema::PrimitiveKind;
use crate::value::PrimitiveArray;

/// Borrowed reader over an encoded array.
#[derive(Debug, Clone, Copy)]
pub struct ArrayView<'a> {
    data: &'a [u8],
    num_elements: usize,
    bounds_checking: bool,
}

impl<'a> ArrayView<'a> {
    /// Binds a view over `data`, which must start at the array's count word.
    pub fn new(data: &'a [u8], bounds_checking: bool) -> Result<Self> {
        if data.len() < WORD_SIZE {
            return Err(bounds_error(format!(
                "array needs at least {} bytes for its count, got {}",
                WORD_SIZE,
                data.len()
            )));
        }
        let mut word = [0u8; WORD_SIZE];
        word.copy_from_slice(&data[..WORD_SIZE]);
        let num_elements = u64::from_le_bytes(word) as usize;
        let header = WORD_SIZE + num_elements.div_ceil(64) * WORD_SIZE + num_elements * WORD_SIZE;
        if bounds_checking && data.len() < header {
            return Err(bounds_error(format!(
                "array of {} elements needs {} header bytes, got {}",
                num_elements,
                header,
                data.len()
            )));
        }
        Ok(Self {
            data,
            num_elements,
            bounds_checking,
        })
    }

    #[inline]
    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    #[inline]
    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    fn bitset_bytes(&self) -> usize {
        self.num_elements.div_ceil(64) * WORD_SIZE
    }

    #[inline]
    fn slot_base(&self) -> usize {
        WORD_SIZE + self.bitset_bytes()
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
    fn check_index(&self, index: usize) -> Result<()> {
        if self.bounds_checking && index >= self.num_elements {
            return Err(bounds_error(format!(
                "index {} out of range for {} elements",
                index, self.num_elements
            )));
        }
        Ok(())
    }

    pub fn is_null_at(&self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        let word = self.read_u64(WORD_SIZE + (index / 64) * WORD_SIZE)?;
        Ok(word & (1u64 << (index % 64)) != 0)
    }

    pub fn slot_bits(&self, index: usize) -> Result<u64> {
        self.check_index(index)?;
        self.read_u64(self.slot_base() + index * WORD_SIZE)
    }

    /// Resolves a variable-length element's slot reference to a byte slice
    /// inside this array's region.
    pub fn var_bytes(&self, index: usize) -> Result<&'a [u8]> {
        let bits = self.slot_bits(index)?;
        let offset = (bits >> 32) as usize;
        let size = (bits & 0xffff_ffff) as usize;
        if self.bounds_checking && offset + size > self.data.len() {
            return Err(bounds_error(format!(
                "element {}: offset {} + size {} past buffer of {}",
                index,
                offset,
                size,
                self.data.len()
            )));
        }
        Ok(&self.data[offset..offset + size])
    }

    pub fn get_str(&self, index: usize) -> Result<&'a str> {
        let bytes = self.var_bytes(index)?;
        std::str::from_utf8(bytes)
            .map_err(|e| shape_error(format!("element {index} is not valid utf-8: {e}")))
    }

    /// Binds a nested array view over an element's bytes.
    pub fn get_array(&self, index: usize) -> Result<ArrayView<'a>> {
        ArrayView::new(self.var_bytes(index)?, self.bounds_checking)
    }

    /// Bulk decode of every slot as the given primitive kind. Nulls are not
    /// consulted; callers use this only for non-nullable element types.
    pub fn to_primitive_array(&self, kind: PrimitiveKind) -> Result<PrimitiveArray> {
        let n = self.num_elements;
        let slot = |i: usize| self.read_u64(self.slot_base() + i * WORD_SIZE);
        Ok(match kind {
            PrimitiveKind::Bool => {
                let mut v = Vec::with_capacity(n);
                for i in 0..n {
                    v.push(slot(i)? & 1 != 0);
                }
                PrimitiveArray::Bool(v)
            }
            PrimitiveKind::Int8 => {
                let mut v = Vec::with_capacity(n);
                for i in 0..n {
                    v.push(slot(i)? as u8 as i8);
                }
                PrimitiveArray::Int8(v)
            }
            PrimitiveKind::Int16 => {
                let mut v = Vec::with_capacity(n);
                for i in 0..n {
                    v.push(slot(i)? as u16 as i16);
                }
                PrimitiveArray::Int16(v)
            }
            PrimitiveKind::Int32 => {
                let mut v = Vec::with_capacity(n);
                for i in 0..n {
                    v.push(slot(i)? as u32 as i32);
                }
                PrimitiveArray::Int32(v)
            }
            PrimitiveKind::Int64 => {
                let mut v = Vec::with_capacity(n);
                for i in 0..n {
                    v.push(slot(i)? as i64);
                }
                PrimitiveArray::Int64(v)
            }
            PrimitiveKind::UInt8 => {
                let mut v = Vec::with_capacity(n);
                for i in 0..n {
                    v.push(slot(i)? as u8);
                }
                PrimitiveArray::UInt8(v)
            }
            PrimitiveKind::Float32 => {
                let mut v = Vec::with_capacity(n);
                for i in 0..n {
                    v.push(f32::from_bits(slot(i)? as u32));
                }
                PrimitiveArray::Float32(v)
            }
            PrimitiveKind::Float64 => {
                let mut v = Vec::with_capacity(n);
                for i in 0..n {
                    v.push(f64::from_bits(slot(i)?));
                }
                PrimitiveArray::Float64(v)
            }
        })
    }

    /// Recovers the per-level extents of an `ndims`-deep nested array by
    /// descending through the first non-null element at each level.
    ///
    /// Returns `None` when no complete descent exists, which happens when an
    /// intermediate level is empty or all-null. Malformed nesting metadata is
    /// treated the same way rather than reported as an error; decoders map
    /// `None` to a null value.
    pub fn dimensions(&self, ndims: usize) -> Option<SmallVec<[usize; 4]>> {
        let mut dims = SmallVec::new();
        let mut current = *self;
        for level in 0..ndims {
            dims.push(current.num_elements());
            if level + 1 == ndims {
                break;
            }
            let mut next = None;
            for i in 0..current.num_elements() {
                if !current.is_null_at(i).ok()? && current.get_array(i).is_ok() {
                    next = current.get_array(i).ok();
                    break;
                }
            }
            current = next?;
        }
        Some(dims)
    }
}
