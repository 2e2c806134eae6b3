//! # csvstream
//!
//! Incremental, memory-bounded CSV tokenizer for byte sources delivered in
//! chunks of any size.
//!
//! ## Features
//!
//! - **Bounded memory**: one line buffer sized from the maximum line length
//! - **Push or pull**: feed chunks as they arrive, or let the parser read a stream
//! - **Zero-copy rows**: fields are decoded in place and borrowed from the buffer
//! - **Cursors**: note a row's position and seek straight back to it later
//! - **Permissive dialect**: quoted fields, `""` and backslash escapes, comment
//!   lines, custom separators or whitespace-separated columns
//!
//! ## Quick Start
//!
//! ### Pull parsing with headings
//!
//! ```no_run
//! use csvstream::CsvReader;
//!
//! let mut reader = CsvReader::open("zones.csv").unwrap();
//! println!("{:?}", reader.headings());
//!
//! while reader.advance().unwrap() {
//!     println!("{} -> {:?}", reader.cursor(), reader.row());
//! }
//! ```
//!
//! ### Push parsing
//!
//! ```
//! use csvstream::{CsvParser, Options};
//!
//! let mut parser = CsvParser::new(Options::default().whitespace_separated()).unwrap();
//! let mut chunk: &[u8] = b"AD  +4230+00131  Europe/Andorra\nAE +2518+05518 Asia/Dubai";
//! while parser.push(&mut chunk).unwrap() {
//!     println!("{:?}", parser.row());
//! }
//! // No more input: drain the rest, including an unterminated last line
//! while parser.flush().unwrap() {
//!     println!("{:?}", parser.row());
//! }
//! ```

pub mod byte_source;
pub mod csv;
pub mod csv_reader;
pub mod error;
pub mod types;

pub use byte_source::{ByteSource, SeekableSource, StreamSource};
pub use csv::{CsvParser, Fields, Row};
pub use csv_reader::{CsvReader, FromRow, Records, DEFAULT_READER_LINE_LENGTH};
pub use error::{CsvError, Result};
pub use types::{Cursor, FieldSeparator, Options, BOF, DEFAULT_MAX_LINE_LENGTH};
