//! Error types for the quire content layer.
//!
//! Content interpretation itself never fails: malformed operators and
//! missing resources are absorbed while parsing. These errors surface from
//! the document store, stream decoding and the content editor.

use thiserror::Error;

/// Primary error type for document and editing operations.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("invalid token at position {pos}: {msg}")]
    TokenError { pos: usize, msg: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("key not found: {0}")]
    KeyError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF object not found: {0}")]
    ObjectNotFound(u32),

    #[error("PDF syntax error: {0}")]
    SyntaxError(String),

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("content stream index {0} out of range")]
    StreamIndexOutOfRange(usize),

    #[error("page object holder still has dirty streams")]
    DirtyStreams,

    #[error("page object holder has no backing dictionary")]
    NoHolderDict,
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
