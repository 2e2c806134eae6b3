//! Per-byte row tokenizer.
//!
//! Decodes one row from the front of a [`LineBuffer`](super::buffer::LineBuffer)
//! region in place. Field contents are written back starting at index 0 and
//! their boundaries recorded as ranges, so no second allocation is needed.
//!
//! Dialect:
//! - fields are quoted or unquoted; quotes around a field are removed
//! - `""` inside a quoted field is a literal quote
//! - a lone quote closes the quoted region; anything after it is kept as-is
//! - `\n`, `\r`, `\t` escapes are decoded anywhere, `\x` yields `x`
//! - CR outside quotes is dropped, LF outside quotes ends the row
//! - comment lines start with one of the configured comment bytes

use crate::types::{is_blank, Options};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    Start,
    Quoted,
    Unquoted,
}

/// Action for a single input byte
enum Step {
    Write(u8),
    Skip,
    EndOfRow,
}

/// Result of scanning one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scan {
    /// A row was decoded
    ///
    /// `next` is the buffer index just past the consumed input, `raw_len` the
    /// row's source length excluding its line terminator.
    Row { next: usize, raw_len: usize },
    /// No terminator within the line limit; `next` is just past the scanned window
    TooLong { next: usize },
}

/// State machine for a single row
pub(crate) struct RowTokenizer<'o> {
    options: &'o Options,
    state: FieldState,
    in_quotes: bool,
    escaping: bool,
    in_comment: bool,
    pending_quote: bool,
    write: usize,
    field_start: usize,
}

impl<'o> RowTokenizer<'o> {
    pub(crate) fn new(options: &'o Options) -> Self {
        RowTokenizer {
            options,
            state: FieldState::Start,
            in_quotes: false,
            escaping: false,
            in_comment: false,
            pending_quote: false,
            write: 0,
            field_start: 0,
        }
    }

    /// Decode the row starting at `read_pos`.
    ///
    /// `fields` receives the field ranges and is left empty for blank rows or
    /// dropped comments. Unless `eof` is set, the caller must supply at least
    /// `max_line_length` bytes of input so that a row is never cut short.
    pub(crate) fn tokenize(
        mut self,
        bytes: &mut [u8],
        read_pos: usize,
        eof: bool,
        fields: &mut Vec<Range<usize>>,
    ) -> Scan {
        debug_assert!(read_pos > 0);
        fields.clear();

        let limit = self.options.max_line_length;
        let window_end = bytes.len().min(read_pos.saturating_add(limit));
        let mut pos = read_pos;
        let mut prev = 0u8;
        let mut terminated = false;

        while pos < window_end {
            let c = bytes[pos];
            pos += 1;
            match self.step(c, fields) {
                Step::Write(b) => {
                    bytes[self.write] = b;
                    self.write += 1;
                }
                Step::Skip => {}
                Step::EndOfRow => {
                    terminated = true;
                    break;
                }
            }
            prev = c;
        }

        let consumed = pos - read_pos;
        if !terminated && consumed >= limit {
            fields.clear();
            return Scan::TooLong { next: pos };
        }
        debug_assert!(terminated || eof);

        let mut raw_len = if terminated { consumed - 1 } else { consumed };
        if prev == b'\r' && raw_len > 0 {
            raw_len -= 1;
        }

        self.finish(fields);
        if fields.iter().all(|field| field.is_empty()) {
            fields.clear();
        }
        Scan::Row { next: pos, raw_len }
    }

    fn step(&mut self, c: u8, fields: &mut Vec<Range<usize>>) -> Step {
        let options = self.options;

        if self.in_comment {
            return match c {
                b'\n' => Step::EndOfRow,
                b'\r' => Step::Skip,
                _ if options.want_comments => Step::Write(c),
                _ => Step::Skip,
            };
        }

        if self.escaping {
            self.escaping = false;
            self.pending_quote = false;
            return Step::Write(unescape(c));
        }

        if self.state == FieldState::Start {
            match c {
                b'\n' => return Step::EndOfRow,
                b'\r' => return Step::Skip,
                _ if options.field_separator.is_whitespace() && is_blank(c) => return Step::Skip,
                _ if fields.is_empty() && options.is_comment(c) => {
                    self.in_comment = true;
                    return if options.want_comments {
                        Step::Write(c)
                    } else {
                        Step::Skip
                    };
                }
                _ if c == options.quote_char => {
                    self.state = FieldState::Quoted;
                    self.in_quotes = true;
                    self.pending_quote = false;
                    return Step::Skip;
                }
                _ => self.state = FieldState::Unquoted,
            }
        }

        if c == options.quote_char {
            self.in_quotes = !self.in_quotes;
            if self.state == FieldState::Quoted {
                if self.pending_quote {
                    // Doubled quote
                    self.pending_quote = false;
                    return Step::Write(c);
                }
                self.pending_quote = true;
                return Step::Skip;
            }
            return Step::Write(c);
        }

        if c == b'\\' {
            self.escaping = true;
            return Step::Skip;
        }

        if !self.in_quotes {
            match c {
                b'\r' => return Step::Skip,
                b'\n' => return Step::EndOfRow,
                _ if options.field_separator.matches(c) => {
                    self.end_field(fields);
                    return Step::Skip;
                }
                _ => {}
            }
        }

        self.pending_quote = false;
        Step::Write(c)
    }

    fn end_field(&mut self, fields: &mut Vec<Range<usize>>) {
        fields.push(self.field_start..self.write);
        self.field_start = self.write;
        self.state = FieldState::Start;
        self.in_quotes = false;
        self.pending_quote = false;
    }

    fn finish(&mut self, fields: &mut Vec<Range<usize>>) {
        if self.in_comment {
            if self.options.want_comments {
                fields.push(0..self.write);
            }
            return;
        }
        let trailing_separator =
            !fields.is_empty() && !self.options.field_separator.is_whitespace();
        if self.state != FieldState::Start || trailing_separator {
            fields.push(self.field_start..self.write);
        }
    }
}

fn unescape(c: u8) -> u8 {
    match c {
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        other => other,
    }
}
