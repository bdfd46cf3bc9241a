//! # Error Kinds
//!
//! This module defines `CodecError`, the machine-distinguishable error kinds
//! for the row codec. All fallible operations return `eyre::Result`; when an
//! error belongs to one of the codec's own failure categories, the report's
//! root cause is a `CodecError` so callers can classify it with
//! `report.downcast_ref::<CodecError>()`.
//!
//! ## Taxonomy
//!
//! `Shape` is a value/descriptor mismatch: wrong value variant, unknown enum
//! member, null in a primitive slot, or a missing fallback registration.
//! `Consistency` means a record sub-encoder was never compiled for this
//! codec instance. `Bounds` is an ordinal, element index, or slot reference
//! out of range. None are retryable, and there is no partial-decode mode.
//!
//! Malformed multi-dimensional array metadata is deliberately NOT an error:
//! the decoder reconstructs the outermost value as null instead.

use thiserror::Error;

/// Error kinds surfaced by the row codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A value does not match its field descriptor, or a declared shape
    /// cannot be encoded/decoded (including missing fallback registration).
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// Internal state inconsistency: a record type was used whose
    /// sub-encoder was never registered by layout compilation.
    #[error("codec state inconsistency: {0}")]
    Consistency(String),

    /// An ordinal, element index, or slot reference is out of range.
    /// Suppressed when bounds checking is disabled.
    #[error("out-of-bounds access: {0}")]
    Bounds(String),
}

pub(crate) fn shape_error(msg: impl Into<String>) -> eyre::Report {
    eyre::Report::new(CodecError::Shape(msg.into()))
}

pub(crate) fn consistency_error(msg: impl Into<String>) -> eyre::Report {
    eyre::Report::new(CodecError::Consistency(msg.into()))
}

pub(crate) fn bounds_error(msg: impl Into<String>) -> eyre::Report {
    eyre::Report::new(CodecError::Bounds(msg.into()))
}
