//! Geometry buffer errors.

use thiserror::Error;

use super::data::IndexFormat;
use super::vertex::VertexType;

/// Errors from fallible geometry buffer operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// An index value does not fit the buffer's declared index width.
    #[error("index {index} does not fit {format:?} indices")]
    IndexOverflow { index: u64, format: IndexFormat },
    /// The operation is not defined for the buffer's current vertex format.
    #[error("cannot convert {from:?} vertices to {to:?}")]
    UnsupportedConversion { from: VertexType, to: VertexType },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BufferError::IndexOverflow {
            index: 70000,
            format: IndexFormat::Uint16,
        };
        assert_eq!(err.to_string(), "index 70000 does not fit Uint16 indices");
    }
}
