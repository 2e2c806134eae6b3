//! Incremental CSV parsing engine

use super::buffer::LineBuffer;
use super::row::Row;
use super::tokenizer::{RowTokenizer, Scan};
use crate::byte_source::ByteSource;
use crate::error::{CsvError, Result};
use crate::types::{Cursor, Options, BOF};
use std::ops::Range;

/// Streaming CSV parser
///
/// Memory use is bounded by the line limit: a single buffer of roughly
/// `max_line_length` bytes (512 minimum) holds both unread input and the
/// decoded current row.
///
/// Input can be supplied two ways, sharing the same state:
/// - **push**: hand over chunks of any size as they arrive with [`push`](Self::push),
///   then drain the remainder with [`flush`](Self::flush);
/// - **pull**: let the parser read from a [`ByteSource`] with [`read_row`](Self::read_row).
///
/// # Examples
///
/// ```
/// use csvstream::{CsvParser, Options};
///
/// let mut parser = CsvParser::new(Options::default()).unwrap();
/// let mut rows = Vec::new();
///
/// for chunk in [&b"name,qty\nappl"[..], &b"es,3\npears,5"[..]] {
///     let mut chunk = chunk;
///     while parser.push(&mut chunk).unwrap() {
///         rows.push(parser.row().to_strings());
///     }
/// }
/// while parser.flush().unwrap() {
///     rows.push(parser.row().to_strings());
/// }
///
/// assert_eq!(rows, vec![
///     vec!["name", "qty"],
///     vec!["apples", "3"],
///     vec!["pears", "5"],
/// ]);
/// ```
#[derive(Debug)]
pub struct CsvParser {
    options: Options,
    buffer: LineBuffer,
    fields: Vec<Range<usize>>,
    cursor: Cursor,
    /// Stream offset one-past the last byte pulled into the buffer
    source_pos: u64,
    /// Discarding the remainder of an over-long line
    skip_line: bool,
}

impl CsvParser {
    /// Create a parser, validating the options
    pub fn new(options: Options) -> Result<Self> {
        options.validate()?;
        let buffer = LineBuffer::new(options.max_line_length);
        Ok(CsvParser {
            options,
            buffer,
            fields: Vec::new(),
            cursor: Cursor::bof(),
            source_pos: 0,
            skip_line: false,
        })
    }

    /// Parser configuration
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Push a chunk of input
    ///
    /// Consumed bytes are removed from the front of `chunk`. Returns `true` when
    /// a row is available via [`row`](Self::row); call again with the same chunk
    /// until it returns `false`, then supply the next chunk. Once all input has
    /// been pushed, call [`flush`](Self::flush) to drain what remains.
    pub fn push(&mut self, chunk: &mut &[u8]) -> Result<bool> {
        self.push_from(chunk)
    }

    /// Push input read from `source`
    ///
    /// Like [`push`](Self::push) but reads from a stream. The source's end is not
    /// consulted; call [`flush`](Self::flush) once it has no more data.
    pub fn push_from<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<bool> {
        let limit = self.options.max_line_length;
        loop {
            let available = self.fill(source)?;
            if available < limit {
                return Ok(false);
            }
            if !self.parse_row(false)? {
                return Ok(false);
            }
            if !self.fields.is_empty() {
                return Ok(true);
            }
        }
    }

    /// Read the next row from `source`
    ///
    /// Returns `false` when there are no more rows, or when a non-blocking source
    /// has no data right now and [`ByteSource::is_finished`] is `false`.
    pub fn read_row<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<bool> {
        let limit = self.options.max_line_length;
        loop {
            let mut available = self.fill(source)?;
            // Short reads from a live source: top up before deciding
            while available < limit && !source.is_finished() {
                let before = available;
                available = self.fill(source)?;
                if available == before {
                    break;
                }
            }
            let eof = source.is_finished();
            if !eof && available < limit {
                return Ok(false);
            }
            if !self.parse_row(eof)? {
                return Ok(false);
            }
            if !self.fields.is_empty() {
                return Ok(true);
            }
        }
    }

    /// Produce the next row from buffered input after the source has ended
    ///
    /// Returns `false` once the buffer is exhausted, and keeps returning `false`
    /// on repeated calls.
    pub fn flush(&mut self) -> Result<bool> {
        loop {
            self.fields.clear();
            self.buffer.prepare()?;
            if self.buffer.readable_len() == 0 {
                self.skip_line = false;
                return Ok(false);
            }
            if !self.parse_row(true)? {
                return Ok(false);
            }
            if !self.fields.is_empty() {
                return Ok(true);
            }
        }
    }

    /// Reset to initial conditions, with the cursor before the first record
    ///
    /// Call this before re-parsing the same data from its beginning. The buffer
    /// allocation is kept.
    pub fn reset(&mut self) {
        self.reset_to(BOF);
    }

    /// Reset for input which continues from stream offset `offset`
    ///
    /// Buffered input is discarded and [`tell`](Self::tell) reports `offset`
    /// (a negative value means [`BOF`]).
    pub fn reset_to(&mut self, offset: i64) {
        self.rewind(offset.max(0) as u64);
        if offset >= 0 {
            self.cursor = Cursor {
                start: offset,
                end: offset as u64,
            };
        }
    }

    /// Discard buffered input and continue at `pos` with no current record
    pub(crate) fn rewind(&mut self, pos: u64) {
        self.buffer.clear();
        self.fields.clear();
        self.cursor = Cursor::bof();
        self.source_pos = pos;
        self.skip_line = false;
    }

    /// Forget the current record without touching buffered input
    pub(crate) fn clear_cursor(&mut self) {
        self.fields.clear();
        self.cursor = Cursor::bof();
    }

    /// Current row; empty if there is none
    pub fn row(&self) -> Row<'_> {
        Row::new(self.buffer.data(), &self.fields)
    }

    /// Location of the current row in the source stream
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Stream offset of the current row, or [`BOF`]
    pub fn tell(&self) -> i64 {
        self.cursor.start
    }

    /// Stream offset of the first byte not yet consumed by the parser
    pub fn stream_position(&self) -> u64 {
        self.source_pos - self.buffer.readable_len() as u64
    }

    /// Stream offset one-past the last byte read from the source
    pub(crate) fn source_pos(&self) -> u64 {
        self.source_pos
    }

    /// Top up the buffer from `source`, returning the unconsumed byte count
    fn fill<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<usize> {
        self.fields.clear();
        let n = self.buffer.fill_from(source)?;
        self.source_pos += n as u64;
        Ok(self.buffer.readable_len())
    }

    /// Tokenize one row from the buffer.
    ///
    /// Returns `false` if no progress could be made. `true` with no fields
    /// means a blank or comment line was consumed, or more input is needed.
    fn parse_row(&mut self, eof: bool) -> Result<bool> {
        self.fields.clear();
        let limit = self.options.max_line_length;

        if self.skip_line {
            match self.buffer.readable().iter().position(|&b| b == b'\n') {
                Some(end) => {
                    self.buffer.consume(end + 1);
                    self.skip_line = false;
                }
                None => {
                    let len = self.buffer.readable_len();
                    self.buffer.consume(len);
                    if eof {
                        self.skip_line = false;
                    }
                    return Ok(len > 0);
                }
            }
        }

        let available = self.buffer.readable_len();
        if available == 0 {
            return Ok(false);
        }
        if !eof && available < limit {
            // Not enough input to guarantee a whole row; wait for more
            return Ok(true);
        }

        let start = self.stream_position();
        let read_pos = self.buffer.read_pos();
        let scan = RowTokenizer::new(&self.options).tokenize(
            self.buffer.working_mut(),
            read_pos,
            eof,
            &mut self.fields,
        );

        match scan {
            Scan::Row { next, raw_len } => {
                self.buffer.consume(next - read_pos);
                if !self.fields.is_empty() {
                    self.cursor = Cursor {
                        start: start as i64,
                        end: start + raw_len as u64,
                    };
                    tracing::trace!(cursor = %self.cursor, fields = self.fields.len(), "row");
                }
                Ok(true)
            }
            Scan::TooLong { next } => {
                self.buffer.consume(next - read_pos);
                self.skip_line = true;
                tracing::debug!(offset = start, limit, "line too long, skipping to next line");
                Err(CsvError::LineTooLong {
                    offset: start,
                    limit,
                })
            }
        }
    }
}
