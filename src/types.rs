//! Type definitions for parser configuration and row positions

use crate::error::{CsvError, Result};
use std::fmt;

/// Cursor start value meaning "before first record"
pub const BOF: i64 = -1;

/// Default bound on the raw length of a single row
pub const DEFAULT_MAX_LINE_LENGTH: usize = 256;

/// Policy for splitting a line into fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldSeparator {
    /// A single separator byte such as `,`, `;` or `\t`
    Byte(u8),
    /// Any run of whitespace separates fields; leading and trailing whitespace is discarded
    Whitespace,
}

impl FieldSeparator {
    /// Check whether `byte` ends the current field
    #[inline]
    pub(crate) fn matches(&self, byte: u8) -> bool {
        match *self {
            FieldSeparator::Byte(sep) => byte == sep,
            FieldSeparator::Whitespace => is_blank(byte),
        }
    }

    pub(crate) fn is_whitespace(&self) -> bool {
        matches!(self, FieldSeparator::Whitespace)
    }
}

impl Default for FieldSeparator {
    fn default() -> Self {
        FieldSeparator::Byte(b',')
    }
}

impl From<u8> for FieldSeparator {
    fn from(byte: u8) -> Self {
        FieldSeparator::Byte(byte)
    }
}

/// Whitespace other than the line feed
#[inline]
pub(crate) fn is_blank(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | 0x0b | 0x0c)
}

/// Parser configuration
///
/// Immutable once handed to a parser. Setters follow the builder pattern.
///
/// # Examples
///
/// ```
/// use csvstream::Options;
///
/// let options = Options::default()
///     .field_separator(b'\t')
///     .comment_chars("#;")
///     .max_line_length(150);
/// assert_eq!(options.max_line_length, 150);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Options {
    /// Bytes which mark a comment line when found at the start of a line
    pub comment_chars: Vec<u8>,
    /// Maximum raw bytes in a row, including escapes and the line terminator
    pub max_line_length: usize,
    /// How fields are separated
    pub field_separator: FieldSeparator,
    /// Return comment lines as single-field rows instead of dropping them
    pub want_comments: bool,
    /// Byte which opens and closes a quoted field
    pub quote_char: u8,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            comment_chars: Vec::new(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            field_separator: FieldSeparator::default(),
            want_comments: false,
            quote_char: b'"',
        }
    }
}

impl Options {
    /// Set the comment marker bytes (builder pattern)
    pub fn comment_chars(mut self, chars: impl AsRef<[u8]>) -> Self {
        self.comment_chars = chars.as_ref().to_vec();
        self
    }

    /// Set the maximum row length (builder pattern)
    pub fn max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length;
        self
    }

    /// Set the field separator (builder pattern)
    ///
    /// Accepts either a byte or a [`FieldSeparator`].
    pub fn field_separator(mut self, separator: impl Into<FieldSeparator>) -> Self {
        self.field_separator = separator.into();
        self
    }

    /// Split fields on runs of whitespace (builder pattern)
    pub fn whitespace_separated(mut self) -> Self {
        self.field_separator = FieldSeparator::Whitespace;
        self
    }

    /// Emit comment lines as rows (builder pattern)
    pub fn want_comments(mut self, want: bool) -> Self {
        self.want_comments = want;
        self
    }

    /// Set custom quote character (builder pattern)
    pub fn quote_char(mut self, quote: u8) -> Self {
        self.quote_char = quote;
        self
    }

    /// Check whether `byte` starts a comment line
    #[inline]
    pub(crate) fn is_comment(&self, byte: u8) -> bool {
        self.comment_chars.contains(&byte)
    }

    /// Reject combinations the tokenizer cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.max_line_length == 0 {
            return Err(CsvError::InvalidOptions(
                "max_line_length must be at least 1".to_string(),
            ));
        }
        if matches!(self.quote_char, b'\\' | b'\r' | b'\n') {
            return Err(CsvError::InvalidOptions(format!(
                "quote character {:?} is reserved",
                self.quote_char as char
            )));
        }
        if let FieldSeparator::Byte(sep) = self.field_separator {
            if sep == self.quote_char || matches!(sep, b'\\' | b'\r' | b'\n') {
                return Err(CsvError::InvalidOptions(format!(
                    "field separator {:?} conflicts with quoting or line structure",
                    sep as char
                )));
            }
        }
        Ok(())
    }
}

/// Location of the current record in the source stream
///
/// `start` is [`BOF`] when there is no current record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cursor {
    /// Offset of the first byte of the record, or [`BOF`]
    pub start: i64,
    /// One-past the last byte of the record, excluding the line terminator
    pub end: u64,
}

impl Cursor {
    /// Cursor positioned before the first record
    pub const fn bof() -> Self {
        Cursor { start: BOF, end: 0 }
    }

    /// Check if there is no current record
    pub fn is_bof(&self) -> bool {
        self.start < 0
    }

    /// Number of source bytes in the record
    pub fn len(&self) -> u64 {
        if self.is_bof() {
            0
        } else {
            self.end.saturating_sub(self.start as u64)
        }
    }

    /// Check if the record spans no source bytes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor::bof()
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{},{}}}", self.start, self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert!(options.comment_chars.is_empty());
        assert_eq!(options.max_line_length, 256);
        assert_eq!(options.field_separator, FieldSeparator::Byte(b','));
        assert!(!options.want_comments);
        assert_eq!(options.quote_char, b'"');
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let options = Options::default()
            .comment_chars("#")
            .whitespace_separated()
            .want_comments(true);
        assert!(options.is_comment(b'#'));
        assert!(!options.is_comment(b';'));
        assert_eq!(options.field_separator, FieldSeparator::Whitespace);
        assert!(options.want_comments);
    }

    #[test]
    fn test_validate_rejects_conflicts() {
        assert!(Options::default().max_line_length(0).validate().is_err());
        assert!(Options::default().field_separator(b'"').validate().is_err());
        assert!(Options::default().field_separator(b'\n').validate().is_err());
        assert!(Options::default().quote_char(b'\\').validate().is_err());
        assert!(Options::default()
            .field_separator(b'\'')
            .quote_char(b'\'')
            .validate()
            .is_err());
        assert!(Options::default().field_separator(b';').validate().is_ok());
    }

    #[test]
    fn test_whitespace_separator_matches() {
        let sep = FieldSeparator::Whitespace;
        assert!(sep.matches(b' '));
        assert!(sep.matches(b'\t'));
        assert!(!sep.matches(b','));
        assert!(FieldSeparator::Byte(b';').matches(b';'));
        assert!(!FieldSeparator::Byte(b';').matches(b' '));
    }

    #[test]
    fn test_cursor() {
        let bof = Cursor::default();
        assert!(bof.is_bof());
        assert_eq!(bof.len(), 0);
        assert_eq!(bof.to_string(), "{-1,0}");

        let cursor = Cursor { start: 10, end: 25 };
        assert!(!cursor.is_bof());
        assert_eq!(cursor.len(), 15);
        assert_eq!(cursor.to_string(), "{10,15}");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_options_from_json() {
        let options: Options =
            serde_json::from_str(r#"{"field_separator":"Whitespace","want_comments":true}"#)
                .unwrap();
        assert_eq!(options.field_separator, FieldSeparator::Whitespace);
        assert!(options.want_comments);
        assert_eq!(options.max_line_length, 256);
    }
}
