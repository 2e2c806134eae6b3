//! Streaming CSV engine: line buffer, row tokenizer and parser

mod buffer;
mod parser;
mod row;
mod tokenizer;

pub use parser::CsvParser;
pub use row::{Fields, Row};
