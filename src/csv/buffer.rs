//! Line buffer with tail carry-over between fills.
//!
//! The buffer holds raw input in `bytes[read_pos..filled]`. Tokenizing writes
//! the decoded row back into the front of the same allocation, so the write
//! index must always trail the read index. Reserving [`READ_OFFSET`] bytes of
//! lead headroom guarantees that.
//!
//! After a row has been tokenized, `bytes[read_pos..filled]` is the tail: input
//! which belongs to the next row(s). The next fill moves it back to
//! `READ_OFFSET` before appending new bytes.

use crate::byte_source::ByteSource;
use crate::error::{CsvError, Result};

/// Headroom ahead of unread input so in-place compaction never overtakes it
pub(crate) const READ_OFFSET: usize = 1;

/// Smallest buffer ever allocated
const MIN_BUFFER_SIZE: usize = 512;

/// Room for a CR LF terminator beyond the line limit
const LINE_OVERHEAD: usize = 2;

/// Growable byte region shared by raw input and the tokenized row
#[derive(Debug)]
pub(crate) struct LineBuffer {
    bytes: Vec<u8>,
    capacity: usize,
    read_pos: usize,
    filled: usize,
}

impl LineBuffer {
    /// Create a buffer for rows of up to `max_line_length` bytes
    ///
    /// Nothing is allocated until the first fill.
    pub(crate) fn new(max_line_length: usize) -> Self {
        let capacity = READ_OFFSET
            .saturating_add(max_line_length)
            .saturating_add(LINE_OVERHEAD)
            .max(MIN_BUFFER_SIZE);
        LineBuffer {
            bytes: Vec::new(),
            capacity,
            read_pos: READ_OFFSET,
            filled: READ_OFFSET,
        }
    }

    fn ensure_allocated(&mut self) -> Result<()> {
        if self.bytes.len() >= self.capacity {
            return Ok(());
        }
        let additional = self.capacity - self.bytes.len();
        if self.bytes.try_reserve_exact(additional).is_err() {
            tracing::debug!(requested = self.capacity, "line buffer allocation failed");
            return Err(CsvError::OutOfMemory {
                requested: self.capacity,
            });
        }
        self.bytes.resize(self.capacity, 0);
        Ok(())
    }

    /// Allocate if needed and move any tail to just after the lead headroom
    pub(crate) fn prepare(&mut self) -> Result<()> {
        self.ensure_allocated()?;
        if self.read_pos > READ_OFFSET {
            self.bytes.copy_within(self.read_pos..self.filled, READ_OFFSET);
            self.filled -= self.read_pos - READ_OFFSET;
            self.read_pos = READ_OFFSET;
        }
        Ok(())
    }

    /// Append bytes from `source`, returning how many were read
    pub(crate) fn fill_from<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<usize> {
        self.prepare()?;
        let n = source.read(&mut self.bytes[self.filled..self.capacity])?;
        self.filled += n;
        Ok(n)
    }

    /// Unconsumed input
    pub(crate) fn readable(&self) -> &[u8] {
        &self.bytes[self.read_pos..self.filled]
    }

    pub(crate) fn readable_len(&self) -> usize {
        self.filled - self.read_pos
    }

    pub(crate) fn read_pos(&self) -> usize {
        self.read_pos
    }

    /// Mark `count` bytes of input as consumed
    pub(crate) fn consume(&mut self, count: usize) {
        self.read_pos = (self.read_pos + count).min(self.filled);
    }

    /// Region handed to the tokenizer: decoded output at the front, input up to `filled`
    pub(crate) fn working_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[..self.filled]
    }

    /// Decoded row storage
    pub(crate) fn data(&self) -> &[u8] {
        &self.bytes
    }

    /// Drop all buffered input, keeping the allocation
    pub(crate) fn clear(&mut self) {
        self.read_pos = READ_OFFSET;
        self.filled = READ_OFFSET;
    }
}
