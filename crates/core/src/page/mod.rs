//! Pages, forms and the objects parsed from their content.
//!
//! This module contains:
//! - `page` - page geometry and the entry point for parsing page content
//! - `form` - form XObjects and Type 3 glyph procedures
//! - `content_parser` - the resumable driver around the interpreter
//! - `holder` - the object container shared by pages, forms and glyphs
//! - `object` - the page objects themselves

pub mod content_parser;
pub mod form;
pub mod holder;
pub mod object;
#[allow(clippy::module_inception)]
pub mod page;

pub use content_parser::{ContentParser, ParseOptions, PauseIndicator, RecursionState};
pub use form::Form;
pub use holder::{HolderKind, PageObjectHolder, ParseState, Transparency, Type3Data};
pub use object::{PageObject, PageObjectKind, TextItem};
pub use page::Page;
