//! Content stream parsing.
//!
//! - `lexer`: element reader for decoded content bytes
//! - `inline`: inline image dictionaries and sample data

pub mod inline;
pub mod lexer;

pub use inline::{
    find_key_abbreviation, find_value_abbreviation, read_inline_stream, replace_abbreviations,
};
pub use lexer::{ContentLexer, Element, Number};
