//! Content stream editing.
//!
//! - `content_manager`: the `Contents` entry as an indexed list of streams
//! - `generator`: writes edited page objects back as content
//! - `writer`: token-level content writer

pub mod content_manager;
pub mod generator;
pub mod writer;

pub use content_manager::ContentManager;
pub use generator::{ContentGenerator, sub_page_fragment};
pub use writer::ContentWriter;
