//! Error types for csvstream

use thiserror::Error;

/// Errors raised while tokenizing or repositioning a CSV source
#[derive(Debug, Error)]
pub enum CsvError {
    /// The line buffer could not grow to the required capacity
    #[error("out of memory: cannot allocate {requested} byte line buffer")]
    OutOfMemory { requested: usize },

    /// A row ran past the configured maximum without a line terminator
    #[error("line at offset {offset} exceeds maximum length of {limit} bytes")]
    LineTooLong { offset: u64, limit: usize },

    /// The byte source cannot be repositioned
    #[error("source does not support seeking")]
    SeekUnsupported,

    /// The byte source landed somewhere other than the requested offset
    #[error("seek to offset {requested} failed: source is at offset {actual}")]
    SeekMismatch { requested: u64, actual: u64 },

    /// Parser options are inconsistent
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Read or seek failure reported by the byte source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using CsvError
pub type Result<T> = std::result::Result<T, CsvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CsvError::LineTooLong {
            offset: 42,
            limit: 16,
        };
        assert_eq!(
            err.to_string(),
            "line at offset 42 exceeds maximum length of 16 bytes"
        );
    }

    #[test]
    fn test_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let err: CsvError = io.into();
        assert!(matches!(err, CsvError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: short read");
    }
}
