//! # Binary Row Layout
//!
//! Word-aligned, little-endian, random-access binary layout for structured
//! records. Three shapes compose recursively:
//!
//! ```text
//! Row    | null bitset: ceil(N/64) u64 | N x 8-byte slots | variable region |
//! Array  | count: u64 | null bitset | count x 8-byte slots | variable region |
//! Map    | key array length: u64 | key Array | value Array |
//! ```
//!
//! A fixed-width field lives entirely in its slot. A variable-length field's
//! slot holds `(offset << 32) | size` with the offset relative to the start
//! of the enclosing row or array, so any region's bytes can be relocated as
//! a unit. The size is the unpadded payload length; the payload itself is
//! zero-padded to the next 8-byte boundary, which keeps every nested region
//! word-aligned and makes encoding deterministic.
//!
//! Writers ([`RowWriter`], [`ArrayWriter`]) lay headers over a shared
//! [`RowBuffer`] and backpatch slots as variable payloads land. Views
//! ([`RowView`], [`ArrayView`], [`MapView`]) read the same layouts back
//! without copying.

pub mod array;
pub mod map;
pub mod view;
pub mod writer;


pub use array::ArrayView;
pub use map::MapView;
pub use view::RowView;
pub use writer::{ArrayWriter, RowBuffer, RowWriter, SlotWriter};
