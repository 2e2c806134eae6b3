//! Byte source abstractions for the parser.
//!
//! The parser never owns an I/O strategy of its own. It pulls bytes through the
//! [`ByteSource`] trait, which covers:
//! - chunks already held in memory (`&[u8]`), as used by push-mode parsing;
//! - any [`std::io::Read`] stream via [`StreamSource`];
//! - random-access streams via [`SeekableSource`], required for seeking.

use std::io::{self, Read, Seek, SeekFrom};

/// Interface between the parser and whatever delivers CSV bytes.
pub trait ByteSource {
    /// Copy up to `buf.len()` bytes into `buf`.
    ///
    /// Returning `Ok(0)` means "no data right now" or end of data; the two are
    /// told apart with [`is_finished`](ByteSource::is_finished).
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Check whether the source has no further data.
    fn is_finished(&self) -> bool;

    /// Check whether [`seek_from_start`](ByteSource::seek_from_start) is supported.
    fn is_seekable(&self) -> bool {
        false
    }

    /// Reposition the source, returning the new offset from the start.
    fn seek_from_start(&mut self, offset: u64) -> io::Result<u64> {
        let _ = offset;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "byte source does not support seeking",
        ))
    }
}

impl ByteSource for &[u8] {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn is_finished(&self) -> bool {
        self.is_empty()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn is_seekable(&self) -> bool {
        (**self).is_seekable()
    }

    fn seek_from_start(&mut self, offset: u64) -> io::Result<u64> {
        (**self).seek_from_start(offset)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn is_seekable(&self) -> bool {
        (**self).is_seekable()
    }

    fn seek_from_start(&mut self, offset: u64) -> io::Result<u64> {
        (**self).seek_from_start(offset)
    }
}

/// Read once from `inner`, retrying interrupted calls.
///
/// `WouldBlock` is reported as "no data right now" rather than an error.
fn read_retrying<R: Read>(inner: &mut R, buf: &mut [u8], finished: &mut bool) -> io::Result<usize> {
    if buf.is_empty() {
        return Ok(0);
    }
    loop {
        match inner.read(buf) {
            Ok(0) => {
                *finished = true;
                return Ok(0);
            }
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(0),
            Err(e) => return Err(e),
        }
    }
}

/// Sequential source wrapping any [`Read`] implementation.
///
/// Finished once the inner reader reports end of data.
#[derive(Debug)]
pub struct StreamSource<R> {
    inner: R,
    finished: bool,
}

impl<R: Read> StreamSource<R> {
    /// Wrap a reader
    pub fn new(inner: R) -> Self {
        StreamSource {
            inner,
            finished: false,
        }
    }

    /// Get a reference to the wrapped reader
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwrap, returning the inner reader
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for StreamSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        read_retrying(&mut self.inner, buf, &mut self.finished)
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Random-access source wrapping a [`Read`] + [`Seek`] implementation.
///
/// # Examples
///
/// ```
/// use csvstream::{ByteSource, SeekableSource};
/// use std::io::Cursor;
///
/// let mut source = SeekableSource::new(Cursor::new(b"a,b\nc,d\n".to_vec()));
/// assert!(source.is_seekable());
/// assert_eq!(source.seek_from_start(4).unwrap(), 4);
/// ```
#[derive(Debug)]
pub struct SeekableSource<R> {
    inner: R,
    finished: bool,
}

impl<R: Read + Seek> SeekableSource<R> {
    /// Wrap a seekable reader
    pub fn new(inner: R) -> Self {
        SeekableSource {
            inner,
            finished: false,
        }
    }

    /// Get a reference to the wrapped reader
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwrap, returning the inner reader
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> ByteSource for SeekableSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        read_retrying(&mut self.inner, buf, &mut self.finished)
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn is_seekable(&self) -> bool {
        true
    }

    fn seek_from_start(&mut self, offset: u64) -> io::Result<u64> {
        let pos = self.inner.seek(SeekFrom::Start(offset))?;
        self.finished = false;
        Ok(pos)
    }
}
