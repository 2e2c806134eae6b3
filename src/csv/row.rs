//! Borrowed view over the most recently parsed row

use std::fmt;
use std::ops::Range;

/// Fields of the current row
///
/// Each field is a slice into the parser's line buffer, so a `Row` is only
/// valid until the parser is asked for another row. Copy the fields out
/// (e.g. with [`to_strings`](Row::to_strings)) to keep them longer.
#[derive(Clone, Copy)]
pub struct Row<'a> {
    data: &'a [u8],
    fields: &'a [Range<usize>],
}

impl<'a> Row<'a> {
    pub(crate) fn new(data: &'a [u8], fields: &'a [Range<usize>]) -> Self {
        Row { data, fields }
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if there is no row
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get a field's raw bytes
    pub fn get(&self, index: usize) -> Option<&'a [u8]> {
        self.fields.get(index).map(|range| &self.data[range.clone()])
    }

    /// Get a field as text
    ///
    /// Returns `None` if the index is out of range or the field is not valid UTF-8.
    pub fn get_str(&self, index: usize) -> Option<&'a str> {
        self.get(index).and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Iterate over the fields
    pub fn iter(&self) -> Fields<'a> {
        Fields {
            data: self.data,
            ranges: self.fields.iter(),
        }
    }

    /// Copy fields into owned strings, replacing invalid UTF-8
    pub fn to_strings(&self) -> Vec<String> {
        self.iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect()
    }

    /// Copy fields into owned byte vectors
    pub fn to_vec(&self) -> Vec<Vec<u8>> {
        self.iter().map(<[u8]>::to_vec).collect()
    }
}

impl fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(String::from_utf8_lossy))
            .finish()
    }
}

impl<'a> IntoIterator for Row<'a> {
    type Item = &'a [u8];
    type IntoIter = Fields<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &Row<'a> {
    type Item = &'a [u8];
    type IntoIter = Fields<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the fields of a [`Row`]
#[derive(Clone)]
pub struct Fields<'a> {
    data: &'a [u8],
    ranges: std::slice::Iter<'a, Range<usize>>,
}

impl<'a> Iterator for Fields<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.ranges.next().map(|range| &self.data[range.clone()])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ranges.size_hint()
    }
}

impl ExactSizeIterator for Fields<'_> {}

impl DoubleEndedIterator for Fields<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.ranges.next_back().map(|range| &self.data[range.clone()])
    }
}
