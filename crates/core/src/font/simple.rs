//! Single-byte fonts: Type1, MMType1 and TrueType.

use crate::document::Document;
use crate::model::objects::Dictionary;
use crate::utils::Rect;

use super::{FontSubtype, PdfFont};

/// Helvetica advances for codes 32 through 126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 222, 333, 333, 389, 584, 278, 333, 278, 278, // 32
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // digits
    278, 278, 584, 584, 584, 556, 1015, // 58
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611, // A-Z
    278, 278, 278, 469, 556, 222, // 91
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333,
    500, 278, 556, 500, 722, 500, 500, 500, // a-z
    334, 260, 334, 584, // 123
];

const HELVETICA_ASCENT: f64 = 718.0;
const HELVETICA_DESCENT: f64 = -207.0;

fn builtin_widths(base_font: &str) -> Option<&'static [u16; 95]> {
    // Arial is metric-compatible with Helvetica.
    let family = base_font.split(['-', ',']).next().unwrap_or(base_font);
    matches!(family, "Helvetica" | "Arial" | "ArialMT").then_some(&HELVETICA_WIDTHS)
}

/// A font with one byte per character code.
#[derive(Debug, Clone)]
pub struct SimpleFont {
    base_font: String,
    subtype: FontSubtype,
    objid: Option<u32>,
    first_char: u32,
    widths: Vec<f64>,
    missing_width: f64,
    builtin: Option<&'static [u16; 95]>,
    ascent: f64,
    descent: f64,
}

impl SimpleFont {
    pub fn load(doc: &Document, dict: &Dictionary, subtype: FontSubtype, objid: Option<u32>) -> Self {
        let base_font = dict
            .get("BaseFont")
            .and_then(|b| doc.resolve(b).as_name().ok())
            .unwrap_or_default()
            .to_string();
        let first_char = dict
            .get("FirstChar")
            .and_then(|f| doc.resolve(f).as_int().ok())
            .unwrap_or(0)
            .clamp(0, 255) as u32;
        let widths = dict
            .get("Widths")
            .map(|w| {
                doc.resolve(w)
                    .as_array()
                    .map(|items| items.iter().map(|i| doc.resolve(i).number()).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default();
        let descriptor = doc.dict_get_dict(dict, "FontDescriptor");
        let descriptor_num = |key: &str| {
            descriptor
                .and_then(|d| d.get(key))
                .and_then(|v| doc.resolve(v).as_num().ok())
        };
        let builtin = builtin_widths(&base_font);
        Self {
            missing_width: descriptor_num("MissingWidth").unwrap_or(0.0),
            ascent: descriptor_num("Ascent").unwrap_or(HELVETICA_ASCENT),
            descent: descriptor_num("Descent").unwrap_or(HELVETICA_DESCENT),
            base_font,
            subtype,
            objid,
            first_char,
            widths,
            builtin,
        }
    }

    /// A standard font without a dictionary.
    pub fn stock(base_font: &str) -> Self {
        Self {
            base_font: base_font.to_string(),
            subtype: FontSubtype::Type1,
            objid: None,
            first_char: 0,
            widths: Vec::new(),
            missing_width: 0.0,
            builtin: builtin_widths(base_font).or(Some(&HELVETICA_WIDTHS)),
            ascent: HELVETICA_ASCENT,
            descent: HELVETICA_DESCENT,
        }
    }
}

impl PdfFont for SimpleFont {
    fn base_font(&self) -> &str {
        &self.base_font
    }

    fn subtype(&self) -> FontSubtype {
        self.subtype
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
        if let Some(index) = code.checked_sub(self.first_char)
            && let Some(&w) = self.widths.get(index as usize)
        {
            return w;
        }
        if let Some(table) = self.builtin
            && (32..=126).contains(&code)
        {
            return f64::from(table[(code - 32) as usize]);
        }
        self.missing_width
    }

    fn char_bbox(&self, code: u32) -> Rect {
        (0.0, self.descent, self.char_width(code), self.ascent)
    }
}
