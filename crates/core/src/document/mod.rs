//! Document module - the object store the content layer resolves against.
//!
//! This module contains:
//! - `store` - in-memory indirect objects, reference resolution, stream
//!   decoding and the shared-reference scan used by the content editor

pub mod store;

pub use store::Document;
