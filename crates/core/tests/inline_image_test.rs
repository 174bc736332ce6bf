//! Inline images: abbreviations, sample data and regeneration as XObjects.

use quire_core::model::objects::{Dictionary, PDFObject, PDFStream};
use quire_core::parser::{find_key_abbreviation, find_value_abbreviation, replace_abbreviations};
use quire_core::{ContentGenerator, Document, Page, ParseOptions};

fn page_drawing(doc: &mut Document, data: &[u8]) -> u32 {
    let contents = doc.add_object(PDFObject::Stream(Box::new(PDFStream::new(
        Dictionary::new(),
        data.to_vec(),
    ))));
    let mut page = Dictionary::new();
    page.insert("Contents".into(), PDFObject::Ref(contents));
    doc.add_page(page).unwrap().objid
}

fn parsed(doc: &Document, objid: u32) -> Page {
    let mut page = Page::load(doc, objid).unwrap();
    page.parse_content(doc, ParseOptions::default());
    page
}

// ============================================================================
// Abbreviations
// ============================================================================

#[test]
fn test_key_abbreviations() {
    assert_eq!(find_key_abbreviation("BPC"), "BitsPerComponent");
    assert_eq!(find_key_abbreviation("W"), "Width");
    assert_eq!(find_key_abbreviation("IM"), "ImageMask");
    assert_eq!(find_key_abbreviation("I"), "Interpolate");
}

#[test]
fn test_unknown_abbreviations_are_empty() {
    assert_eq!(find_key_abbreviation(""), "");
    assert_eq!(find_key_abbreviation("WW"), "");
    assert_eq!(find_key_abbreviation("Width"), "");
    assert_eq!(find_value_abbreviation("XYZ"), "");
}

#[test]
fn test_value_abbreviations() {
    assert_eq!(find_value_abbreviation("G"), "DeviceGray");
    assert_eq!(find_value_abbreviation("I"), "Indexed");
    assert_eq!(find_value_abbreviation("Fl"), "FlateDecode");
    assert_eq!(find_value_abbreviation("DCT"), "DCTDecode");
}

#[test]
fn test_full_names_pass_through() {
    let mut dict = Dictionary::new();
    dict.insert("Width".into(), PDFObject::Int(3));
    dict.insert("ColorSpace".into(), PDFObject::Name("DeviceCMYK".into()));
    dict.insert("IM".into(), PDFObject::Bool(true));
    replace_abbreviations(&mut dict);
    assert_eq!(dict.len(), 3);
    assert_eq!(dict.get("Width"), Some(&PDFObject::Int(3)));
    assert_eq!(
        dict.get("ColorSpace"),
        Some(&PDFObject::Name("DeviceCMYK".into()))
    );
    assert_eq!(dict.get("ImageMask"), Some(&PDFObject::Bool(true)));
}

// ============================================================================
// Page content
// ============================================================================

#[test]
fn test_filtered_inline_image_keeps_encoded_bytes() {
    let mut doc = Document::with_catalog();
    let page = page_drawing(
        &mut doc,
        b"q 20 0 0 10 5 5 cm BI /W 2 /H 1 /BPC 8 /CS /G /F /AHx ID 0102> EI Q 0 0 m 1 1 l S",
    );
    let page = parsed(&doc, page);
    let holder = page.holder();
    assert_eq!(holder.len(), 2);

    let obj = holder.get(0).unwrap();
    let image = obj.as_image().unwrap();
    assert!(image.is_inline);
    assert_eq!(image.stream.get_rawdata(), b"0102>");
    assert_eq!(
        image.stream.get("Filter"),
        Some(&PDFObject::Name("ASCIIHexDecode".into()))
    );
    assert_eq!(image.stream.get("Length"), Some(&PDFObject::Int(5)));
    assert_eq!(obj.bbox(), (5.0, 5.0, 25.0, 15.0));
    assert_eq!(holder.get(1).unwrap().type_name(), "path");
}

#[test]
fn test_regenerated_inline_image_becomes_xobject() {
    let mut doc = Document::with_catalog();
    let page_id = page_drawing(
        &mut doc,
        b"q 20 0 0 10 5 5 cm BI /W 2 /H 1 /BPC 8 /CS /G ID \x01\x02 EI Q",
    );
    let mut page = parsed(&doc, page_id);
    page.holder_mut().get_mut(0).unwrap().set_dirty(true);
    ContentGenerator::new(&mut doc, page.holder_mut())
        .generate_content()
        .unwrap();
    assert_eq!(page.holder().get(0).unwrap().resource_name(), "FXX1");

    let reparsed = parsed(&doc, page_id);
    assert_eq!(reparsed.holder().len(), 1);
    let obj = reparsed.holder().get(0).unwrap();
    let image = obj.as_image().unwrap();
    assert!(!image.is_inline);
    assert_eq!(obj.resource_name(), "FXX1");
    assert_eq!(image.stream.get_rawdata(), hex::decode("0102").unwrap());
    assert_eq!(
        image.stream.get("Type"),
        Some(&PDFObject::Name("XObject".into()))
    );
    assert_eq!(obj.bbox(), (5.0, 5.0, 25.0, 15.0));
}
