//! Error types for coordinates, transaction serialization and header decoding.

use thiserror::Error;

/// Errors raised while constructing or parsing a [`Coordinate`](crate::Coordinate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    /// The path does not have exactly `depth` digits.
    #[error("path length {path_len} does not match depth {depth}")]
    PathLengthMismatch { depth: u32, path_len: usize },

    /// A path digit lies outside the `0..=3` alphabet.
    #[error("invalid path digit {digit} at position {position}: expected 0, 1, 2 or 3")]
    InvalidDigit { digit: u8, position: usize },

    /// The text form is not `d<depth>p<digits>`.
    #[error("malformed coordinate string {0:?}")]
    Parse(String),
}

/// A transaction could not produce its canonical serializable form.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// NaN and infinities have no canonical JSON representation.
    #[error("field `{field}` is not a finite number")]
    NonFinite { field: &'static str },

    #[error("canonical encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised when building a header or rebuilding one from its export form.
#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("header timestamp must be finite, got {0}")]
    NonFiniteTimestamp(f64),

    #[error("header depth {depth} does not match coordinate depth {coordinate_depth}")]
    DepthMismatch { depth: u32, coordinate_depth: u32 },

    #[error("malformed header record: {0}")]
    Decode(#[from] serde_json::Error),
}
