//! Type 3 fonts: every glyph is a small content stream.
//!
//! Glyphs are parsed on first use through [`Type3Font::load_char`] and
//! cached. The interpreter loads the glyphs of a run before measuring it,
//! so `char_width` and `char_bbox` only ever read the cache.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::document::Document;
use crate::model::objects::{Dictionary, PDFObject, PDFStream};
use crate::page::content_parser::RecursionState;
use crate::page::form::Form;
use crate::utils::{Matrix, RECT_EMPTY, Rect, apply_matrix_rect, rect_is_empty};

use super::{FontSubtype, PdfFont};

/// A parsed glyph procedure.
#[derive(Debug)]
pub struct Type3Char {
    /// Glyph content; `None` when the procedure paints nothing.
    pub form: Option<Form>,
    /// Advance in glyph units, font matrix applied.
    pub width: f64,
    /// Glyph box in glyph units, font matrix applied.
    pub bbox: Rect,
    /// Started with `d0`: the glyph sets its own colors.
    pub colored: bool,
}

#[derive(Debug)]
pub struct Type3Font {
    base_font: String,
    objid: Option<u32>,
    font_matrix: Matrix,
    /// `Widths` scaled by the font matrix, indexed by code.
    widths: [f64; 256],
    char_names: FxHashMap<u32, String>,
    char_procs: Dictionary,
    resources: Option<Arc<Dictionary>>,
    glyphs: Mutex<FxHashMap<u32, Arc<Type3Char>>>,
}

impl Type3Font {
    pub fn load(doc: &Document, dict: &Dictionary, objid: Option<u32>) -> Self {
        let font_matrix = dict
            .get("FontMatrix")
            .map(|m| doc.resolve(m).to_matrix())
            .unwrap_or((0.001, 0.0, 0.0, 0.001, 0.0, 0.0));

        let mut widths = [0.0; 256];
        let first_char = dict
            .get("FirstChar")
            .and_then(|f| doc.resolve(f).as_int().ok())
            .unwrap_or(0);
        if let Ok(first) = usize::try_from(first_char)
            && first < widths.len()
            && let Some(PDFObject::Array(items)) = dict.get("Widths").map(|w| doc.resolve(w))
        {
            for (slot, item) in widths[first..].iter_mut().zip(items) {
                *slot = (doc.resolve(item).number() * font_matrix.0 * 1000.0).round();
            }
        }

        let mut char_names = FxHashMap::default();
        if let Some(encoding) = doc.dict_get_dict(dict, "Encoding")
            && let Some(PDFObject::Array(differences)) =
                encoding.get("Differences").map(|d| doc.resolve(d))
        {
            let mut code = 0u32;
            for item in differences {
                match doc.resolve(item) {
                    PDFObject::Int(n) => code = u32::try_from(*n).unwrap_or(0),
                    PDFObject::Name(name) => {
                        char_names.insert(code, name.clone());
                        code += 1;
                    }
                    _ => {}
                }
            }
        }

        Self {
            base_font: dict
                .get("Name")
                .and_then(|n| doc.resolve(n).as_name().ok())
                .unwrap_or_default()
                .to_string(),
            objid,
            font_matrix,
            widths,
            char_names,
            char_procs: doc.dict_get_dict(dict, "CharProcs").cloned().unwrap_or_default(),
            resources: doc.dict_get_dict(dict, "Resources").cloned().map(Arc::new),
            glyphs: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn font_matrix(&self) -> Matrix {
        self.font_matrix
    }

    /// Glyph procedure stream for `code`, found through the encoding.
    fn char_proc(&self, doc: &Document, code: u32) -> Option<PDFStream> {
        let name = self.char_names.get(&code)?;
        let entry = self.char_procs.get(name)?;
        let mut stream = doc.resolve(entry).as_stream().ok()?.clone();
        if let PDFObject::Ref(r) = entry
            && stream.objid.is_none()
        {
            stream.set_objid(r.objid, r.genno);
        }
        Some(stream)
    }

    pub fn cached_char(&self, code: u32) -> Option<Arc<Type3Char>> {
        self.glyphs.lock().ok()?.get(&code).cloned()
    }

    /// Parse the glyph for `code` unless it is cached.
    ///
    /// The glyph content is interpreted with the font's resources, or
    /// `page_resources` when the font has none. Nested parsing shares
    /// `recursion`, so a glyph that shows itself stops at the form limit.
    pub fn load_char(
        &self,
        code: u32,
        doc: &Document,
        page_resources: Option<&Arc<Dictionary>>,
        recursion: &Rc<RefCell<RecursionState>>,
    ) -> Option<Arc<Type3Char>> {
        if let Some(glyph) = self.cached_char(code) {
            return Some(glyph);
        }
        {
            let recursion = recursion.borrow();
            if recursion.depth >= recursion.max_depth {
                debug!(code, "Type 3 glyph nesting too deep");
                return None;
            }
        }
        let stream = self.char_proc(doc, code)?;
        let resources = self.resources.clone().or_else(|| page_resources.cloned());
        let mut form = Form::new_glyph(doc, resources, Arc::new(stream));
        form.parse_content_for_type3_char(doc, Rc::clone(recursion));

        // The glyph may have shown itself and filled the cache meanwhile.
        if let Some(glyph) = self.cached_char(code) {
            return Some(glyph);
        }

        let data = form.holder().type3_data().unwrap_or_default();
        let scale = self.font_matrix.0.hypot(self.font_matrix.1);
        let width = ((data.values[0] * 1000.0).round() * scale + 0.5).floor();
        let [_, _, left, bottom, right, top] = data.values.map(|v| (v * 1000.0).round());
        let mut rect = (left / 1000.0, bottom / 1000.0, right / 1000.0, top / 1000.0);
        if rect_is_empty(rect) {
            rect = form.holder().calc_bounding_box();
        }
        let (x0, y0, x1, y1) = apply_matrix_rect(self.font_matrix, rect);
        let bbox = (
            (x0 * 1000.0).round(),
            (y0 * 1000.0).round(),
            (x1 * 1000.0).round(),
            (y1 * 1000.0).round(),
        );
        trace!(code, width, ?bbox, "Type 3 glyph loaded");

        let glyph = Arc::new(Type3Char {
            form: (!form.holder().is_empty()).then_some(form),
            width,
            bbox,
            colored: data.colored,
        });
        if let Ok(mut glyphs) = self.glyphs.lock() {
            glyphs.insert(code, Arc::clone(&glyph));
        }
        Some(glyph)
    }
}

impl PdfFont for Type3Font {
    fn base_font(&self) -> &str {
        &self.base_font
    }

    fn subtype(&self) -> FontSubtype {
        FontSubtype::Type3
    }

    fn objid(&self) -> Option<u32> {
        self.objid
    }

    fn char_codes(&self, bytes: &[u8]) -> Vec<u32> {
        bytes.iter().map(|&b| u32::from(b)).collect()
    }

    fn append_char(&self, out: &mut Vec<u8>, code: u32) {
        out.push((code & 0xff) as u8);
    }

    fn char_width(&self, code: u32) -> f64 {
        let code = if code < 256 { code } else { 0 };
        let width = self.widths[code as usize];
        if width != 0.0 {
            return width;
        }
        self.cached_char(code).map_or(0.0, |glyph| glyph.width)
    }

    fn char_bbox(&self, code: u32) -> Rect {
        self.cached_char(code).map_or(RECT_EMPTY, |glyph| glyph.bbox)
    }

    fn as_type3(&self) -> Option<&Type3Font> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::content_parser::MAX_FORM_LEVEL;

    fn name(s: &str) -> PDFObject {
        PDFObject::Name(s.into())
    }

    fn nums(values: &[f64]) -> PDFObject {
        PDFObject::Array(values.iter().map(|v| PDFObject::Real(*v)).collect())
    }

    /// A font whose code 65 draws a 600 x 700 box.
    fn box_font(doc: &mut Document, proc_data: &[u8], widths: bool) -> Type3Font {
        let glyph = doc.add_object(PDFObject::Stream(Box::new(PDFStream::new(
            Dictionary::new(),
            proc_data.to_vec(),
        ))));
        let mut procs = Dictionary::new();
        procs.insert("box".into(), PDFObject::Ref(glyph));
        let mut encoding = Dictionary::new();
        encoding.insert(
            "Differences".into(),
            PDFObject::Array(vec![PDFObject::Int(65), name("box")]),
        );
        let mut dict = Dictionary::new();
        dict.insert("Subtype".into(), name("Type3"));
        dict.insert("FontMatrix".into(), nums(&[0.001, 0.0, 0.0, 0.001, 0.0, 0.0]));
        dict.insert("CharProcs".into(), PDFObject::Dict(procs));
        dict.insert("Encoding".into(), PDFObject::Dict(encoding));
        if widths {
            dict.insert("FirstChar".into(), PDFObject::Int(65));
            dict.insert("Widths".into(), nums(&[650.0]));
        }
        Type3Font::load(doc, &dict, None)
    }

    #[test]
    fn glyph_metrics_come_from_d1() {
        let mut doc = Document::new();
        let font = box_font(&mut doc, b"600 0 0 0 600 700 d1 0 0 600 700 re f", false);
        let recursion = Rc::new(RefCell::new(RecursionState::new(MAX_FORM_LEVEL)));
        assert_eq!(font.char_width(65), 0.0);
        let glyph = font.load_char(65, &doc, None, &recursion).unwrap();
        assert!(!glyph.colored);
        assert_eq!(glyph.width, 600.0);
        assert_eq!(glyph.bbox, (0.0, 0.0, 600.0, 700.0));
        assert_eq!(glyph.form.as_ref().map(|f| f.holder().len()), Some(1));
        assert_eq!(font.char_width(65), 600.0);
        assert_eq!(font.char_bbox(65), (0.0, 0.0, 600.0, 700.0));
    }

    #[test]
    fn widths_array_wins_and_d0_box_falls_back_to_content() {
        let mut doc = Document::new();
        let font = box_font(&mut doc, b"500 0 d0 10 20 100 200 re f", true);
        let recursion = Rc::new(RefCell::new(RecursionState::new(MAX_FORM_LEVEL)));
        let glyph = font.load_char(65, &doc, None, &recursion).unwrap();
        assert!(glyph.colored);
        assert_eq!(font.char_width(65), 650.0);
        assert_eq!(glyph.bbox, (10.0, 20.0, 110.0, 220.0));
    }

    #[test]
    fn unknown_codes_have_no_glyph() {
        let mut doc = Document::new();
        let font = box_font(&mut doc, b"600 0 d0", false);
        let recursion = Rc::new(RefCell::new(RecursionState::new(MAX_FORM_LEVEL)));
        assert!(font.load_char(66, &doc, None, &recursion).is_none());
        assert_eq!(font.char_bbox(66), RECT_EMPTY);
        let empty = font.load_char(65, &doc, None, &recursion).unwrap();
        assert!(empty.form.is_none());
    }
}
