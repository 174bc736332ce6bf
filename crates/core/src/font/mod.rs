//! Fonts as seen by the content interpreter.
//!
//! The interpreter only needs metrics: how a string splits into character
//! codes, how far each code advances, and a rough glyph box. Glyph shapes
//! and Unicode mapping belong to the rendering and extraction layers.
//!
//! - `simple`: Type1, MMType1 and TrueType fonts (one byte per code)
//! - `cid`: Type0 composite fonts
//! - `type3`: fonts whose glyphs are content streams

pub mod cid;
pub mod simple;
pub mod type3;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::document::Document;
use crate::model::objects::{Dictionary, PDFObject};
use crate::utils::Rect;

pub use cid::CidFont;
pub use simple::SimpleFont;
pub use type3::{Type3Char, Type3Font};

/// Name of the font substituted when a `Tf` resource is missing.
pub const DEFAULT_FONT_NAME: &str = "Helvetica";

/// Font dictionary `Subtype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontSubtype {
    Type1,
    MMType1,
    TrueType,
    Type3,
    Type0,
}

impl FontSubtype {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Type1" => Self::Type1,
            "MMType1" => Self::MMType1,
            "TrueType" => Self::TrueType,
            "Type3" => Self::Type3,
            "Type0" => Self::Type0,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Type1 => "Type1",
            Self::MMType1 => "MMType1",
            Self::TrueType => "TrueType",
            Self::Type3 => "Type3",
            Self::Type0 => "Type0",
        }
    }
}

/// Font metrics used while interpreting text operators.
///
/// Widths and boxes are in glyph units (1/1000 of text space).
pub trait PdfFont: fmt::Debug + Send + Sync {
    fn base_font(&self) -> &str;

    fn subtype(&self) -> FontSubtype;

    /// Object number of the font dictionary, `None` for stock fonts.
    fn objid(&self) -> Option<u32>;

    /// Split a shown string into character codes.
    fn char_codes(&self, bytes: &[u8]) -> Vec<u32>;

    /// Encode one code back into string bytes.
    fn append_char(&self, out: &mut Vec<u8>, code: u32);

    /// Horizontal advance of `code`.
    fn char_width(&self, code: u32) -> f64;

    /// Glyph box of `code`.
    fn char_bbox(&self, code: u32) -> Rect;

    /// Number of string bytes that encode `code`.
    fn char_size(&self, _code: u32) -> usize {
        1
    }

    fn is_vertical(&self) -> bool {
        false
    }

    /// Vertical advance of `code` (negative is downwards).
    fn vertical_advance(&self, _code: u32) -> f64 {
        -1000.0
    }

    fn as_type3(&self) -> Option<&Type3Font> {
        None
    }

    /// Whether `Tw` applies to `code`: only a single-byte space does.
    fn applies_word_space(&self, code: u32) -> bool {
        code == u32::from(b' ') && self.char_size(code) == 1
    }
}

/// Load a font from its dictionary. `objid` is the number of the indirect
/// object holding the dictionary, when there is one.
pub fn load_font(doc: &Document, dict: &Dictionary, objid: Option<u32>) -> Option<Arc<dyn PdfFont>> {
    let subtype = dict
        .get("Subtype")
        .and_then(|s| doc.resolve(s).as_name().ok())
        .and_then(FontSubtype::from_name);
    let font: Arc<dyn PdfFont> = match subtype {
        Some(FontSubtype::Type0) => Arc::new(CidFont::load(doc, dict, objid)),
        Some(FontSubtype::Type3) => Arc::new(Type3Font::load(doc, dict, objid)),
        Some(kind) => Arc::new(SimpleFont::load(doc, dict, kind, objid)),
        None => {
            debug!(?objid, "font dictionary without a usable Subtype");
            return None;
        }
    };
    Some(font)
}

/// Load a font from a resource value (reference or direct dictionary).
pub fn load_font_object(doc: &Document, obj: &PDFObject) -> Option<Arc<dyn PdfFont>> {
    let objid = match obj {
        PDFObject::Ref(r) => Some(r.objid),
        _ => None,
    };
    let dict = doc.resolve(obj).as_dict().ok()?;
    load_font(doc, dict, objid)
}

/// A standard font that exists without a font dictionary.
pub fn stock_font(base_font: &str) -> Arc<dyn PdfFont> {
    Arc::new(SimpleFont::stock(base_font))
}
