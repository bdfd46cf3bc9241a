//! # Map View
//!
//! Zero-copy reader over the map layout
//! `[key array length: u64][key array][value array]`. Keys and values are
//! two parallel homogeneous arrays of equal count; the length prefix is
//! what lets the value array be located without walking the key array.

use eyre::Result;

use crate::config::WORD_SIZE;
use crate::error::{bounds_error, shape_error};
use crate::row::array::ArrayView;

/// Borrowed reader over an encoded map.
#[derive(Debug, Clone, Copy)]
pub struct MapView<'a> {
    keys: ArrayView<'a>,
    values: ArrayView<'a>,
}

impl<'a> MapView<'a> {
    /// Binds a view over `data`, which must start at the key-array length
    /// prefix.
    pub fn new(data: &'a [u8], bounds_checking: bool) -> Result<Self> {
        if data.len() < WORD_SIZE {
            return Err(bounds_error(format!(
                "map needs at least {} bytes for its length prefix, got {}",
                WORD_SIZE,
                data.len()
            )));
        }
        let mut word = [0u8; WORD_SIZE];
        word.copy_from_slice(&data[..WORD_SIZE]);
        let key_len = u64::from_le_bytes(word) as usize;
        if WORD_SIZE + key_len > data.len() {
            return Err(bounds_error(format!(
                "map key array of {} bytes past buffer of {}",
                key_len,
                data.len()
            )));
        }
        let keys = ArrayView::new(&data[WORD_SIZE..WORD_SIZE + key_len], bounds_checking)?;
        let values = ArrayView::new(&data[WORD_SIZE + key_len..], bounds_checking)?;
        if keys.num_elements() != values.num_elements() {
            return Err(shape_error(format!(
                "map key array has {} elements but value array has {}",
                keys.num_elements(),
                values.num_elements()
            )));
        }
        Ok(Self { keys, values })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.num_elements()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn keys(&self) -> ArrayView<'a> {
        self.keys
    }

    #[inline]
    pub fn values(&self) -> ArrayView<'a> {
        self.values
    }
}
