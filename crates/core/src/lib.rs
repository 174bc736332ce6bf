//! quire - PDF page content interpretation and content stream editing.
//!
//! A page's content streams are parsed into page objects (paths, text,
//! images, shadings and forms), each carrying the graphics state it was
//! drawn with. Edited objects can be written back as content.
//!
//! ```no_run
//! use quire_core::{Document, Page, ParseOptions};
//!
//! fn count_objects(doc: &Document) -> quire_core::Result<usize> {
//!     let mut total = 0;
//!     for objid in doc.page_objids() {
//!         let mut page = Page::load(doc, objid)?;
//!         page.parse_content(doc, ParseOptions::default());
//!         total += page.holder().len();
//!     }
//!     Ok(total)
//! }
//! ```

pub mod codec;
pub mod document;
pub mod edit;
pub mod error;
pub mod font;
pub mod interp;
pub mod model;
pub mod page;
pub mod parser;
pub mod utils;

pub use document::Document;
pub use edit::{ContentGenerator, ContentManager, sub_page_fragment};
pub use error::{PdfError, Result};
pub use page::{Form, Page, PageObject, PageObjectHolder, ParseOptions};
