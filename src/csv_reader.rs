//! Header-aware CSV reading with cursor-based seeking

use crate::byte_source::{ByteSource, SeekableSource};
use crate::csv::{CsvParser, Row};
use crate::error::{CsvError, Result};
use crate::types::{Cursor, Options, BOF};
use std::fs::File;
use std::marker::PhantomData;
use std::path::Path;

/// Line limit used by [`CsvReader::open`]
pub const DEFAULT_READER_LINE_LENGTH: usize = 2048;

/// CSV reader with named columns and random access to previously seen rows
///
/// Wraps a [`CsvParser`] around an owned [`ByteSource`]. Unless headings are
/// supplied up front, the first row of the source is taken as column names and
/// the first call to [`advance`](Self::advance) yields the first data row.
///
/// Any row can be revisited by noting its position with [`tell`](Self::tell)
/// and later passing it to [`seek`](Self::seek), provided the source supports
/// random access.
///
/// # Examples
///
/// ```no_run
/// use csvstream::CsvReader;
///
/// let mut reader = CsvReader::open("data.csv").unwrap();
/// println!("Headers: {:?}", reader.headings());
///
/// while reader.advance().unwrap() {
///     println!("{:?}", reader.row());
/// }
/// ```
///
/// # Revisiting rows
///
/// ```
/// use csvstream::{CsvReader, Options, SeekableSource};
/// use std::io::Cursor;
///
/// let data = b"id,name\n1,Alice\n2,Bob\n".to_vec();
/// let mut reader = CsvReader::new(SeekableSource::new(Cursor::new(data)), Options::default()).unwrap();
///
/// reader.advance().unwrap();
/// let alice = reader.tell();
/// reader.advance().unwrap();
/// assert_eq!(reader.value_by_name("name"), Some("Bob"));
///
/// assert!(reader.seek(alice).unwrap());
/// assert_eq!(reader.value_by_name("name"), Some("Alice"));
/// ```
#[derive(Debug)]
pub struct CsvReader<S> {
    parser: CsvParser,
    source: S,
    headings: Vec<String>,
    /// Stream offset of the first data row
    start: u64,
    /// Source position matches the parser's view of it
    in_sync: bool,
}

impl CsvReader<SeekableSource<File>> {
    /// Open a CSV file whose first row holds the column names
    ///
    /// Uses a line limit of [`DEFAULT_READER_LINE_LENGTH`] bytes.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(
            path,
            Options::default().max_line_length(DEFAULT_READER_LINE_LENGTH),
        )
    }

    /// Open a CSV file with custom options
    pub fn open_with<P: AsRef<Path>>(path: P, options: Options) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        CsvReader::new(SeekableSource::new(file), options)
    }
}

impl<S: ByteSource> CsvReader<S> {
    /// Create a reader, taking the first row of `source` as headings
    pub fn new(mut source: S, options: Options) -> Result<Self> {
        let mut parser = CsvParser::new(options)?;
        let headings = if parser.read_row(&mut source)? {
            parser.row().to_strings()
        } else {
            Vec::new()
        };
        let start = parser.stream_position();
        parser.clear_cursor();
        Ok(CsvReader {
            parser,
            source,
            headings,
            start,
            in_sync: true,
        })
    }

    /// Create a reader with caller-supplied headings
    ///
    /// Every row of `source`, including the first, is treated as data.
    pub fn with_headings<I>(source: S, options: Options, headings: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Ok(CsvReader {
            parser: CsvParser::new(options)?,
            source,
            headings: headings.into_iter().map(Into::into).collect(),
            start: 0,
            in_sync: true,
        })
    }

    /// Move to the next data row
    ///
    /// Returns `false` when there are no more rows.
    pub fn advance(&mut self) -> Result<bool> {
        self.parser.read_row(&mut self.source)
    }

    /// Return to before the first data row
    ///
    /// Call [`advance`](Self::advance) to fetch the first record. Requires a
    /// seekable source.
    pub fn reset(&mut self) -> Result<()> {
        self.seek(BOF).map(|_| ())
    }

    /// Move to a position previously obtained from [`tell`](Self::tell)
    ///
    /// With [`BOF`] (or any offset before the first data row) there is no
    /// current row afterwards and `Ok(true)` is returned. Otherwise the row at
    /// `pos` is read and the result says whether one was found.
    ///
    /// On error there is no current row. If the source itself failed, its
    /// position is unknown: seek again before calling [`advance`](Self::advance).
    pub fn seek(&mut self, pos: i64) -> Result<bool> {
        if !self.source.is_seekable() {
            tracing::debug!(pos, "seek requested on a sequential source");
            return Err(CsvError::SeekUnsupported);
        }

        let current = self.parser.source_pos();
        let target = pos.max(self.start as i64) as u64;
        tracing::debug!(pos, target, current, "seek");

        // Current row is gone whatever happens next
        self.parser.rewind(current);
        if target != current || !self.in_sync {
            let actual = match self.source.seek_from_start(target) {
                Ok(actual) => actual,
                Err(e) => {
                    tracing::debug!(target, error = %e, "seek failed");
                    self.in_sync = false;
                    return Err(e.into());
                }
            };
            self.in_sync = true;
            if actual != target {
                tracing::debug!(target, actual, "seek landed at wrong offset");
                self.parser.rewind(actual);
                return Err(CsvError::SeekMismatch {
                    requested: target,
                    actual,
                });
            }
        }
        self.parser.rewind(target);

        if pos < self.start as i64 {
            return Ok(true);
        }
        self.parser.read_row(&mut self.source)
    }

    /// Move to the row identified by `cursor`
    pub fn seek_cursor(&mut self, cursor: Cursor) -> Result<bool> {
        self.seek(cursor.start)
    }

    /// Iterate over the remaining rows, converting each into `R`
    ///
    /// # Examples
    ///
    /// ```
    /// use csvstream::{CsvReader, Options};
    ///
    /// let data: &[u8] = b"a,b\n1,2\n3,4\n";
    /// let mut reader = CsvReader::new(data, Options::default()).unwrap();
    /// let rows: Vec<Vec<String>> = reader.records().collect::<Result<_, _>>().unwrap();
    /// assert_eq!(rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    /// ```
    pub fn records<R: FromRow>(&mut self) -> Records<'_, S, R> {
        Records {
            reader: self,
            _record: PhantomData,
        }
    }

    /// Get a reference to the byte source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Unwrap, returning the byte source
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S> CsvReader<S> {
    /// Column names
    pub fn headings(&self) -> &[String] {
        &self.headings
    }

    /// Number of columns
    pub fn count(&self) -> usize {
        self.headings.len()
    }

    /// Index of the column called `name`
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headings.iter().position(|heading| heading == name)
    }

    /// Current row; empty before the first [`advance`](Self::advance) and after the last
    pub fn row(&self) -> Row<'_> {
        self.parser.row()
    }

    /// Get a value from the current row by column index
    ///
    /// Returns `None` if there is no such field or it is not valid UTF-8; use
    /// [`value_bytes`](Self::value_bytes) to tell the two apart.
    pub fn value(&self, index: usize) -> Option<&str> {
        self.parser.row().get_str(index)
    }

    /// Get the raw bytes of a field from the current row by column index
    pub fn value_bytes(&self, index: usize) -> Option<&[u8]> {
        self.parser.row().get(index)
    }

    /// Get a value from the current row by column name
    pub fn value_by_name(&self, name: &str) -> Option<&str> {
        self.column(name).and_then(|index| self.value(index))
    }

    /// Location of the current row
    pub fn cursor(&self) -> Cursor {
        self.parser.cursor()
    }

    /// Position of the current row, usable with [`seek`](Self::seek)
    pub fn tell(&self) -> i64 {
        self.parser.tell()
    }

    /// Stream offset where data rows begin
    pub fn data_start(&self) -> u64 {
        self.start
    }
}

/// Conversion from a parsed row into a record type
pub trait FromRow: Sized {
    /// Build a record from the fields of `row`
    fn from_row(row: &Row<'_>) -> Self;
}

impl FromRow for Vec<String> {
    fn from_row(row: &Row<'_>) -> Self {
        row.to_strings()
    }
}

impl FromRow for Vec<Vec<u8>> {
    fn from_row(row: &Row<'_>) -> Self {
        row.to_vec()
    }
}

/// Iterator over records of a [`CsvReader`]
pub struct Records<'r, S, R> {
    reader: &'r mut CsvReader<S>,
    _record: PhantomData<fn() -> R>,
}

impl<S: ByteSource, R: FromRow> Iterator for Records<'_, S, R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.advance() {
            Ok(true) => Some(Ok(R::from_row(&self.reader.row()))),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_source::StreamSource;
    use std::io::Cursor as IoCursor;

    const TEST1_CSV: &str = "\"field1\",field2,field3,\"field four\"\n\
        Something \"awry\",\"datavalue 2\",\"where,are,\"\"the,\nbananas\",sausages abound,\"never surrender\"\n\
        one,two,three,four\n\
        a,b,c,d,e,f";

    const CSV_HEADINGS: &str = "field1;field2;field3;field four";
    const CSV_ROW1: &str =
        "Something \"awry\";datavalue 2;where,are,\"the,\nbananas;sausages abound;never surrender";
    const CSV_ROW2: &str = "one;two;three;four";
    const CSV_ROW3: &str = "a;b;c;d;e;f";

    fn test_reader() -> CsvReader<SeekableSource<IoCursor<Vec<u8>>>> {
        let source = SeekableSource::new(IoCursor::new(TEST1_CSV.as_bytes().to_vec()));
        CsvReader::new(source, Options::default()).unwrap()
    }

    fn joined(reader: &CsvReader<impl ByteSource>) -> String {
        reader.row().to_strings().join(";")
    }

    #[test]
    fn test_basic() -> Result<()> {
        let mut reader = test_reader();
        assert_eq!(reader.tell(), BOF);
        assert_eq!(reader.headings().join(";"), CSV_HEADINGS);
        assert_eq!(reader.count(), 4);
        assert!(reader.row().is_empty());

        assert!(reader.advance()?);
        assert_eq!(joined(&reader), CSV_ROW1);
        assert_eq!(reader.tell(), reader.data_start() as i64);

        assert!(reader.advance()?);
        assert_eq!(joined(&reader), CSV_ROW2);

        assert!(reader.advance()?);
        assert_eq!(joined(&reader), CSV_ROW3);
        assert_eq!(reader.row().len(), 6);

        assert!(!reader.advance()?);
        assert!(!reader.advance()?);
        Ok(())
    }

    #[test]
    fn test_reset() -> Result<()> {
        let mut reader = test_reader();
        while reader.advance()? {}

        reader.reset()?;
        assert_eq!(reader.tell(), BOF);
        assert!(reader.row().is_empty());
        assert!(reader.advance()?);
        assert_eq!(joined(&reader), CSV_ROW1);
        Ok(())
    }

    #[test]
    fn test_seek() -> Result<()> {
        let mut reader = test_reader();
        let mut cursors = Vec::new();
        while reader.advance()? {
            cursors.push(reader.cursor());
        }
        assert_eq!(cursors.len(), 3);

        assert!(reader.seek(cursors[1].start)?);
        assert_eq!(joined(&reader), CSV_ROW2);
        assert_eq!(reader.cursor(), cursors[1]);

        assert!(reader.seek_cursor(cursors[0])?);
        assert_eq!(joined(&reader), CSV_ROW1);
        assert_eq!(reader.cursor(), cursors[0]);

        assert!(reader.seek(cursors[2].start)?);
        assert_eq!(joined(&reader), CSV_ROW3);

        // Iteration carries on from the sought row
        assert!(!reader.advance()?);
        Ok(())
    }

    #[test]
    fn test_seek_then_continue() -> Result<()> {
        let mut reader = test_reader();
        reader.advance()?;
        let first = reader.tell();
        reader.advance()?;
        reader.advance()?;

        assert!(reader.seek(first)?);
        assert!(reader.advance()?);
        assert_eq!(joined(&reader), CSV_ROW2);
        Ok(())
    }

    #[test]
    fn test_seek_before_data_clamps() -> Result<()> {
        let mut reader = test_reader();
        reader.advance()?;
        reader.advance()?;

        // Offset inside the heading row behaves like BOF
        assert!(reader.seek(3)?);
        assert!(reader.row().is_empty());
        assert!(reader.advance()?);
        assert_eq!(joined(&reader), CSV_ROW1);

        assert!(reader.seek(BOF)?);
        assert!(reader.row().is_empty());
        assert_eq!(reader.tell(), BOF);
        Ok(())
    }

    #[test]
    fn test_seek_past_end() -> Result<()> {
        let mut reader = test_reader();
        assert!(!reader.seek(TEST1_CSV.len() as i64)?);
        assert!(reader.row().is_empty());
        Ok(())
    }

    #[test]
    fn test_seek_unsupported() {
        let source = StreamSource::new(TEST1_CSV.as_bytes());
        let mut reader = CsvReader::new(source, Options::default()).unwrap();
        assert!(reader.advance().unwrap());
        assert!(matches!(reader.seek(BOF), Err(CsvError::SeekUnsupported)));
        assert!(matches!(reader.reset(), Err(CsvError::SeekUnsupported)));
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Fault {
        Healthy,
        /// Land one byte past the requested offset
        Drift,
        /// Move to the requested offset, then report an error
        Fail,
    }

    struct FaultySource {
        inner: SeekableSource<IoCursor<Vec<u8>>>,
        fault: Fault,
    }

    impl ByteSource for FaultySource {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inner.read(buf)
        }

        fn is_finished(&self) -> bool {
            self.inner.is_finished()
        }

        fn is_seekable(&self) -> bool {
            true
        }

        fn seek_from_start(&mut self, offset: u64) -> std::io::Result<u64> {
            match self.fault {
                Fault::Healthy => self.inner.seek_from_start(offset),
                Fault::Drift => self.inner.seek_from_start(offset + 1),
                Fault::Fail => {
                    self.inner.seek_from_start(offset)?;
                    Err(std::io::Error::new(std::io::ErrorKind::Other, "device error"))
                }
            }
        }
    }

    fn faulty_reader() -> CsvReader<FaultySource> {
        let source = FaultySource {
            inner: SeekableSource::new(IoCursor::new(TEST1_CSV.as_bytes().to_vec())),
            fault: Fault::Healthy,
        };
        CsvReader::new(source, Options::default()).unwrap()
    }

    #[test]
    fn test_seek_mismatch() -> Result<()> {
        let mut reader = faulty_reader();
        let mut cursors = Vec::new();
        while reader.advance()? {
            cursors.push(reader.cursor());
        }

        reader.source.fault = Fault::Drift;
        let target = cursors[1].start as u64;
        match reader.seek(cursors[1].start) {
            Err(CsvError::SeekMismatch { requested, actual }) => {
                assert_eq!(requested, target);
                assert_eq!(actual, target + 1);
            }
            other => panic!("expected SeekMismatch, got {:?}", other),
        }
        assert!(reader.row().is_empty());
        assert_eq!(reader.tell(), BOF);

        reader.source.fault = Fault::Healthy;
        assert!(reader.seek_cursor(cursors[1])?);
        assert_eq!(joined(&reader), CSV_ROW2);
        assert_eq!(reader.cursor(), cursors[1]);
        Ok(())
    }

    #[test]
    fn test_seek_io_error_forces_reseek() -> Result<()> {
        let mut reader = faulty_reader();
        let mut cursors = Vec::new();
        while reader.advance()? {
            cursors.push(reader.cursor());
        }
        let end = TEST1_CSV.len() as i64;

        // Source moves to the first data row before failing
        reader.source.fault = Fault::Fail;
        assert!(matches!(reader.seek(cursors[0].start), Err(CsvError::Io(_))));
        assert!(reader.row().is_empty());
        assert_eq!(reader.tell(), BOF);

        // Parser still believes it sits at the end; the source must be repositioned anyway
        reader.source.fault = Fault::Healthy;
        assert!(!reader.seek(end)?);
        assert!(reader.row().is_empty());

        assert!(reader.seek_cursor(cursors[2])?);
        assert_eq!(joined(&reader), CSV_ROW3);
        Ok(())
    }

    #[test]
    fn test_values() -> Result<()> {
        let mut reader = test_reader();
        reader.advance()?;
        reader.advance()?;
        assert_eq!(reader.column("field3"), Some(2));
        assert_eq!(reader.column("missing"), None);
        assert_eq!(reader.value(0), Some("one"));
        assert_eq!(reader.value_by_name("field four"), Some("four"));
        assert_eq!(reader.value_by_name("missing"), None);
        assert_eq!(reader.value(4), None);
        Ok(())
    }

    #[test]
    fn test_value_bytes_for_invalid_utf8() -> Result<()> {
        let data: &[u8] = b"name,code\ncaf\xe9,7\n";
        let mut reader = CsvReader::new(data, Options::default())?;
        assert!(reader.advance()?);
        assert_eq!(reader.value(0), None);
        assert_eq!(reader.value_bytes(0), Some(&b"caf\xe9"[..]));
        assert_eq!(reader.value(1), Some("7"));
        assert_eq!(reader.value_bytes(2), None);
        Ok(())
    }

    #[test]
    fn test_with_headings() -> Result<()> {
        let data: &[u8] = b"1,Alice\n2,Bob\n";
        let mut reader = CsvReader::with_headings(data, Options::default(), ["id", "name"])?;
        assert_eq!(reader.headings(), &["id".to_string(), "name".to_string()][..]);
        assert_eq!(reader.data_start(), 0);

        assert!(reader.advance()?);
        assert_eq!(reader.value_by_name("name"), Some("Alice"));
        assert!(reader.advance()?);
        assert_eq!(reader.value_by_name("id"), Some("2"));
        assert!(!reader.advance()?);
        Ok(())
    }

    #[test]
    fn test_records() -> Result<()> {
        let mut reader = test_reader();
        let rows: Vec<Vec<String>> = reader.records().collect::<Result<_>>()?;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["one", "two", "three", "four"]);

        reader.reset()?;
        let raw: Vec<Vec<Vec<u8>>> = reader.records().collect::<Result<_>>()?;
        assert_eq!(raw[2][5], b"f".to_vec());
        Ok(())
    }

    #[test]
    fn test_records_from_custom_type() -> Result<()> {
        #[derive(Debug, PartialEq)]
        struct Fruit {
            name: String,
            qty: Option<u32>,
        }

        impl FromRow for Fruit {
            fn from_row(row: &Row<'_>) -> Self {
                Fruit {
                    name: row.get_str(0).unwrap_or_default().to_string(),
                    qty: row.get_str(1).and_then(|s| s.parse().ok()),
                }
            }
        }

        let data: &[u8] = b"name,qty\napple,3\npear,x\n";
        let mut reader = CsvReader::new(data, Options::default())?;
        let fruit: Vec<Fruit> = reader.records().collect::<Result<_>>()?;
        assert_eq!(
            fruit,
            vec![
                Fruit {
                    name: "apple".into(),
                    qty: Some(3)
                },
                Fruit {
                    name: "pear".into(),
                    qty: None
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_empty_source() -> Result<()> {
        let data: &[u8] = b"";
        let mut reader = CsvReader::new(data, Options::default())?;
        assert!(reader.headings().is_empty());
        assert_eq!(reader.count(), 0);
        assert!(!reader.advance()?);
        Ok(())
    }

    #[test]
    fn test_into_inner() {
        let reader = test_reader();
        let source = reader.into_inner();
        assert_eq!(source.get_ref().get_ref().len(), TEST1_CSV.len());
    }
}
