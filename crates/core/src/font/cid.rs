//! Type0 (composite) fonts.
//!
//! Codes are two bytes wide except for the one-byte identity encodings.
//! Codes are used as CIDs directly, which is exact for the identity
//! encodings that make up nearly every embedded composite font.

use rustc_hash::FxHashMap;

use crate::document::Document;
use crate::model::objects::{Dictionary, PDFObject};
use crate::utils::Rect;

use super::{FontSubtype, PdfFont};

const DEFAULT_WIDTH: f64 = 1000.0;
const DEFAULT_VERTICAL_ADVANCE: f64 = -1000.0;

/// A composite font with its descendant's metrics.
#[derive(Debug, Clone)]
pub struct CidFont {
    base_font: String,
    objid: Option<u32>,
    code_bytes: usize,
    vertical: bool,
    default_width: f64,
    widths: FxHashMap<u32, f64>,
    default_vertical_advance: f64,
    vertical_advances: FxHashMap<u32, f64>,
    ascent: f64,
    descent: f64,
}

/// Parse a `W` array: `c [w1 w2 …]` or `c_first c_last w`.
fn parse_widths(doc: &Document, seq: &[PDFObject]) -> FxHashMap<u32, f64> {
    let mut widths = FxHashMap::default();
    let mut pending: Vec<f64> = Vec::new();
    for item in seq {
        match doc.resolve(item) {
            PDFObject::Array(run) => {
                if let [.., first] = pending.as_slice() {
                    let first = *first as u32;
                    for (i, w) in run.iter().enumerate() {
                        if let Ok(w) = doc.resolve(w).as_num() {
                            widths.insert(first + i as u32, w);
                        }
                    }
                }
                pending.clear();
            }
            other => {
                if let Ok(n) = other.as_num() {
                    pending.push(n);
                    if let [first, last, w] = pending.as_slice() {
                        for cid in (*first as u32)..=(*last as u32) {
                            widths.insert(cid, *w);
                        }
                        pending.clear();
                    }
                }
            }
        }
    }
    widths
}

/// Parse a `W2` array: `c [w1y vx vy …]` or `c_first c_last w1y vx vy`.
/// Only the vertical advance (`w1y`) is kept.
fn parse_vertical_advances(doc: &Document, seq: &[PDFObject]) -> FxHashMap<u32, f64> {
    let mut advances = FxHashMap::default();
    let mut pending: Vec<f64> = Vec::new();
    for item in seq {
        match doc.resolve(item) {
            PDFObject::Array(run) => {
                if let [.., first] = pending.as_slice() {
                    let first = *first as u32;
                    let values: Vec<f64> = run.iter().map(|v| doc.resolve(v).number()).collect();
                    for (i, triple) in values.chunks_exact(3).enumerate() {
                        advances.insert(first + i as u32, triple[0]);
                    }
                }
                pending.clear();
            }
            other => {
                if let Ok(n) = other.as_num() {
                    pending.push(n);
                    if let [first, last, w1y, _, _] = pending.as_slice() {
                        for cid in (*first as u32)..=(*last as u32) {
                            advances.insert(cid, *w1y);
                        }
                        pending.clear();
                    }
                }
            }
        }
    }
    advances
}

impl CidFont {
    pub fn load(doc: &Document, dict: &Dictionary, objid: Option<u32>) -> Self {
        let base_font = dict
            .get("BaseFont")
            .and_then(|b| doc.resolve(b).as_name().ok())
            .unwrap_or_default()
            .to_string();
        let (code_bytes, vertical) = match dict.get("Encoding").map(|e| doc.resolve(e)) {
            Some(PDFObject::Name(name)) => (
                if name.starts_with("OneByteIdentity") { 1 } else { 2 },
                name.ends_with('V'),
            ),
            Some(PDFObject::Stream(stream)) => (
                2,
                stream
                    .get("WMode")
                    .and_then(|w| doc.resolve(w).as_int().ok())
                    == Some(1),
            ),
            _ => (2, false),
        };
        let descendant = dict
            .get("DescendantFonts")
            .and_then(|d| doc.resolve(d).as_array().ok())
            .and_then(|a| a.first())
            .and_then(|d| doc.resolve(d).as_dict().ok());
        let array = |key: &str| {
            descendant
                .and_then(|d| d.get(key))
                .and_then(|v| doc.resolve(v).as_array().ok())
        };
        let default_width = descendant
            .and_then(|d| d.get("DW"))
            .and_then(|v| doc.resolve(v).as_num().ok())
            .unwrap_or(DEFAULT_WIDTH);
        let widths = array("W").map(|w| parse_widths(doc, w)).unwrap_or_default();
        let default_vertical_advance = array("DW2")
            .and_then(|dw2| dw2.get(1))
            .and_then(|v| doc.resolve(v).as_num().ok())
            .unwrap_or(DEFAULT_VERTICAL_ADVANCE);
        let vertical_advances = array("W2")
            .map(|w2| parse_vertical_advances(doc, w2))
            .unwrap_or_default();
        let descriptor = descendant.and_then(|d| doc.dict_get_dict(d, "FontDescriptor"));
        let descriptor_num = |key: &str| {
            descriptor
                .and_then(|d| d.get(key))
                .and_then(|v| doc.resolve(v).as_num().ok())
        };
        Self {
            ascent: descriptor_num("Ascent").unwrap_or(880.0),
            descent: descriptor_num("Descent").unwrap_or(-120.0),
            base_font,
            objid,
            code_bytes,
            vertical,
            default_width,
            widths,
            default_vertical_advance,
            vertical_advances,
        }
    }
}

impl PdfFont for CidFont {
    fn base_font(&self) -> &str {
        &self.base_font
    }

    fn subtype(&self) -> FontSubtype {
        FontSubtype::Type0
    }

    fn objid(&self) -> Option<u32> {
        self.objid
    }

    /// A trailing odd byte is dropped.
    fn char_codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.code_bytes == 1 {
            return bytes.iter().map(|&b| u32::from(b)).collect();
        }
        bytes
            .chunks_exact(2)
            .map(|pair| u32::from(u16::from_be_bytes([pair[0], pair[1]])))
            .collect()
    }

    fn append_char(&self, out: &mut Vec<u8>, code: u32) {
        if self.code_bytes == 1 {
            out.push((code & 0xff) as u8);
        } else {
            out.extend_from_slice(&((code & 0xffff) as u16).to_be_bytes());
        }
    }

    fn char_width(&self, code: u32) -> f64 {
        self.widths.get(&code).copied().unwrap_or(self.default_width)
    }

    fn char_bbox(&self, code: u32) -> Rect {
        (0.0, self.descent, self.char_width(code), self.ascent)
    }

    fn char_size(&self, _code: u32) -> usize {
        self.code_bytes
    }

    fn is_vertical(&self) -> bool {
        self.vertical
    }

    fn vertical_advance(&self, code: u32) -> f64 {
        self.vertical_advances
            .get(&code)
            .copied()
            .unwrap_or(self.default_vertical_advance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[i64]) -> Vec<PDFObject> {
        values.iter().map(|&v| PDFObject::Int(v)).collect()
    }

    #[test]
    fn both_width_formats() {
        let doc = Document::new();
        let mut seq = nums(&[1]);
        seq.push(PDFObject::Array(nums(&[500, 600])));
        seq.extend(nums(&[10, 12, 250]));
        let widths = parse_widths(&doc, &seq);
        assert_eq!(widths.get(&1), Some(&500.0));
        assert_eq!(widths.get(&2), Some(&600.0));
        assert_eq!(widths.get(&11), Some(&250.0));
        assert_eq!(widths.get(&13), None);
    }

    #[test]
    fn identity_h_reads_two_byte_codes() {
        let doc = Document::new();
        let mut descendant = Dictionary::new();
        descendant.insert("DW".into(), PDFObject::Int(500));
        let mut dict = Dictionary::new();
        dict.insert("Subtype".into(), PDFObject::Name("Type0".into()));
        dict.insert("Encoding".into(), PDFObject::Name("Identity-V".into()));
        dict.insert(
            "DescendantFonts".into(),
            PDFObject::Array(vec![PDFObject::Dict(descendant)]),
        );
        let font = CidFont::load(&doc, &dict, None);
        assert_eq!(font.char_codes(&[0x00, 0x20, 0x01, 0x02, 0x07]), vec![0x20, 0x102]);
        assert_eq!(font.char_width(0x20), 500.0);
        assert!(font.is_vertical());
        assert_eq!(font.vertical_advance(5), -1000.0);
        // A two-byte space never receives word spacing.
        assert!(!font.applies_word_space(0x20));
        let mut out = Vec::new();
        font.append_char(&mut out, 0x102);
        assert_eq!(out, vec![0x01, 0x02]);
    }
}
