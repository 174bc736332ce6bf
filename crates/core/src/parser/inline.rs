//! Inline images: `BI` dictionary abbreviations and the raw `ID` sample data.

use crate::codec;
use crate::document::Document;
use crate::model::color::{ColorSpaceFamily, PDFColorSpace};
use crate::model::objects::{Dictionary, PDFObject, PDFStream};
use crate::parser::lexer::{ContentLexer, Element};

/// Abbreviated inline image keys and their full names.
const KEY_ABBREVIATIONS: [(&str, &str); 9] = [
    ("BPC", "BitsPerComponent"),
    ("CS", "ColorSpace"),
    ("D", "Decode"),
    ("DP", "DecodeParms"),
    ("F", "Filter"),
    ("H", "Height"),
    ("IM", "ImageMask"),
    ("I", "Interpolate"),
    ("W", "Width"),
];

/// Abbreviated inline image name values and their full names.
const VALUE_ABBREVIATIONS: [(&str, &str); 11] = [
    ("G", "DeviceGray"),
    ("RGB", "DeviceRGB"),
    ("CMYK", "DeviceCMYK"),
    ("I", "Indexed"),
    ("AHx", "ASCIIHexDecode"),
    ("A85", "ASCII85Decode"),
    ("LZW", "LZWDecode"),
    ("Fl", "FlateDecode"),
    ("RL", "RunLengthDecode"),
    ("CCF", "CCITTFaxDecode"),
    ("DCT", "DCTDecode"),
];

fn find_full_name(table: &[(&str, &'static str)], abbr: &str) -> &'static str {
    table
        .iter()
        .find(|(short, _)| *short == abbr)
        .map_or("", |(_, full)| full)
}

/// Full key for an abbreviated inline image key, or `""`.
pub fn find_key_abbreviation(abbr: &str) -> &'static str {
    find_full_name(&KEY_ABBREVIATIONS, abbr)
}

/// Full name for an abbreviated inline image value, or `""`.
pub fn find_value_abbreviation(abbr: &str) -> &'static str {
    find_full_name(&VALUE_ABBREVIATIONS, abbr)
}

/// Expand abbreviated keys and name values, recursing into nested arrays
/// and dictionaries.
pub fn replace_abbreviations(dict: &mut Dictionary) {
    let entries: Vec<(String, PDFObject)> = dict.drain().collect();
    for (key, mut value) in entries {
        let full_key = find_key_abbreviation(&key);
        let key = if full_key.is_empty() {
            key
        } else {
            full_key.to_string()
        };
        expand_value(&mut value);
        dict.insert(key, value);
    }
}

fn expand_value(value: &mut PDFObject) {
    match value {
        PDFObject::Name(name) => {
            let full = find_value_abbreviation(name);
            if !full.is_empty() {
                *name = full.to_string();
            }
        }
        PDFObject::Array(items) => items.iter_mut().for_each(expand_value),
        PDFObject::Dict(dict) => replace_abbreviations(dict),
        _ => {}
    }
}

/// Bytes per row of samples, `None` on overflow.
fn row_pitch(bpc: u64, components: u64, width: u64) -> Option<u64> {
    bpc.checked_mul(components)?
        .checked_mul(width)?
        .checked_add(7)
        .map(|bits| bits / 8)
}

fn component_count(cs: &PDFObject, doc: &Document) -> usize {
    if let Some(space) = PDFColorSpace::load(cs, doc) {
        return space.component_count();
    }
    match doc.resolve(cs).as_name().ok().and_then(ColorSpaceFamily::from_name) {
        Some(ColorSpaceFamily::DeviceRGB) => 3,
        Some(ColorSpaceFamily::DeviceCMYK) => 4,
        _ => 1,
    }
}

/// Read the sample data following `ID`.
///
/// Unfiltered data is exactly `pitch × height` bytes (fewer at the end of
/// the buffer). Filtered data runs for the filter's self-delimited length
/// and then up to, but not including, the whitespace before `EI`. The
/// lexer is left just after the data.
pub fn read_inline_stream(
    lexer: &mut ContentLexer<'_>,
    doc: &Document,
    mut dict: Dictionary,
    cs: Option<&PDFObject>,
) -> Option<PDFStream> {
    lexer.skip_one_whitespace();

    let int_of = |dict: &Dictionary, key: &str| -> i64 {
        dict.get(key)
            .and_then(|v| doc.resolve(v).as_int().ok())
            .unwrap_or(0)
    };
    let (bpc, components) = match cs {
        Some(cs) => (int_of(&dict, "BitsPerComponent"), component_count(cs, doc)),
        None => (1, 1),
    };
    let width = int_of(&dict, "Width");
    let height = int_of(&dict, "Height");
    if bpc < 0 || width < 0 || height < 0 {
        return None;
    }
    let pitch = row_pitch(bpc as u64, components as u64, width as u64)?;
    let size = usize::try_from(pitch.checked_mul(height as u64)?).ok()?;

    let filter = match dict.get("Filter").map(|f| doc.resolve(f)) {
        Some(PDFObject::Name(name)) => Some(name.clone()),
        Some(PDFObject::Array(items)) => items
            .first()
            .and_then(|f| doc.resolve(f).as_name().ok())
            .map(str::to_string),
        _ => None,
    };

    let data = match filter {
        None => lexer.take_bytes(size).to_vec(),
        Some(filter) => {
            let start = lexer.tell();
            let rest = &lexer.data()[start..];
            let mut len = codec::encoded_len(&filter, rest);
            lexer.set_pos(start + len);
            loop {
                let before = lexer.tell();
                match lexer.next_element() {
                    Element::EndOfData => break,
                    Element::Keyword(b"EI") => break,
                    _ => len += lexer.tell() - before,
                }
            }
            lexer.set_pos(start);
            lexer.take_bytes(len).to_vec()
        }
    };

    dict.insert("Length".into(), PDFObject::Int(data.len() as i64));
    Some(PDFStream::new(dict, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_nested_values() {
        let mut dict = Dictionary::new();
        dict.insert("W".into(), PDFObject::Int(4));
        dict.insert("CS".into(), PDFObject::Name("RGB".into()));
        dict.insert(
            "F".into(),
            PDFObject::Array(vec![
                PDFObject::Name("AHx".into()),
                PDFObject::Name("Fl".into()),
            ]),
        );
        replace_abbreviations(&mut dict);
        assert_eq!(dict.get("Width"), Some(&PDFObject::Int(4)));
        assert_eq!(
            dict.get("ColorSpace"),
            Some(&PDFObject::Name("DeviceRGB".into()))
        );
        assert_eq!(
            dict.get("Filter"),
            Some(&PDFObject::Array(vec![
                PDFObject::Name("ASCIIHexDecode".into()),
                PDFObject::Name("FlateDecode".into()),
            ]))
        );
    }

    #[test]
    fn unfiltered_data_has_computed_length() {
        let doc = Document::new();
        let mut dict = Dictionary::new();
        dict.insert("Width".into(), PDFObject::Int(2));
        dict.insert("Height".into(), PDFObject::Int(2));
        dict.insert("BitsPerComponent".into(), PDFObject::Int(8));
        let cs = PDFObject::Name("DeviceGray".into());
        let mut lexer = ContentLexer::new(b" \x01\x02\x03\x04 EI Q");
        let stream = read_inline_stream(&mut lexer, &doc, dict, Some(&cs)).unwrap();
        assert_eq!(stream.get_rawdata(), &[1, 2, 3, 4]);
        assert_eq!(stream.get("Length"), Some(&PDFObject::Int(4)));
        assert_eq!(lexer.next_element(), Element::Keyword(b"EI"));
    }

    #[test]
    fn filtered_data_runs_to_ei() {
        let doc = Document::new();
        let mut dict = Dictionary::new();
        dict.insert("Width".into(), PDFObject::Int(1));
        dict.insert("Height".into(), PDFObject::Int(1));
        dict.insert("Filter".into(), PDFObject::Name("RunLengthDecode".into()));
        let mut lexer = ContentLexer::new(b" abc def\nEI");
        let stream = read_inline_stream(&mut lexer, &doc, dict, None).unwrap();
        assert_eq!(stream.get_rawdata(), b"abc def");
    }
}
