//! Token writer for generated content streams.

use itertools::Itertools;

use crate::model::objects::{Dictionary, PDFObject};
use crate::utils::{Matrix, Point, format_matrix, format_number};

/// Characters that must be escaped inside a name.
const NAME_DELIMITERS: &[u8] = b"()<>[]{}/%#";

/// Accumulates content stream text, inserting single spaces between tokens.
#[derive(Debug, Default)]
pub struct ContentWriter {
    buf: String,
}

impl ContentWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> String {
        self.buf
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    fn sep(&mut self) {
        if let Some(last) = self.buf.as_bytes().last()
            && !matches!(last, b'\n' | b' ' | b'[' | b'<')
        {
            self.buf.push(' ');
        }
    }

    /// An operator keyword.
    pub fn op(&mut self, op: &str) -> &mut Self {
        self.sep();
        self.buf.push_str(op);
        self
    }

    pub fn newline(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    pub fn number(&mut self, value: f64) -> &mut Self {
        self.sep();
        self.buf.push_str(&format_number(value));
        self
    }

    pub fn point(&mut self, (x, y): Point) -> &mut Self {
        self.number(x).number(y)
    }

    pub fn matrix(&mut self, m: Matrix) -> &mut Self {
        self.sep();
        self.buf.push_str(&format_matrix(m));
        self
    }

    /// `/name`, with `#xx` escapes for delimiters and non-printing bytes.
    pub fn name(&mut self, name: &str) -> &mut Self {
        self.sep();
        self.buf.push('/');
        for &b in name.as_bytes() {
            if (0x21..=0x7e).contains(&b) && !NAME_DELIMITERS.contains(&b) {
                self.buf.push(char::from(b));
            } else {
                self.buf.push_str(&format!("#{b:02X}"));
            }
        }
        self
    }

    /// `<hex>` string.
    pub fn hex_string(&mut self, bytes: &[u8]) -> &mut Self {
        self.sep();
        self.buf.push('<');
        self.buf
            .push_str(&bytes.iter().map(|b| format!("{b:02X}")).join(""));
        self.buf.push('>');
        self
    }

    /// `(literal)` string with backslash escapes.
    pub fn literal_string(&mut self, bytes: &[u8]) -> &mut Self {
        self.sep();
        self.buf.push('(');
        for &b in bytes {
            match b {
                b'(' | b')' | b'\\' => {
                    self.buf.push('\\');
                    self.buf.push(char::from(b));
                }
                0x20..=0x7e => self.buf.push(char::from(b)),
                _ => self.buf.push_str(&format!("\\{b:03o}")),
            }
        }
        self.buf.push(')');
        self
    }

    pub fn begin_array(&mut self) -> &mut Self {
        self.sep();
        self.buf.push('[');
        self
    }

    pub fn end_array(&mut self) -> &mut Self {
        self.buf.push(']');
        self
    }

    /// A dictionary with keys in sorted order.
    pub fn dict(&mut self, dict: &Dictionary) -> &mut Self {
        self.sep();
        self.buf.push_str("<<");
        for key in dict.keys().sorted() {
            self.name(key);
            self.object(&dict[key]);
        }
        self.buf.push_str(">>");
        self
    }

    /// Any direct object. Streams cannot appear in content and are written
    /// as `null`.
    pub fn object(&mut self, obj: &PDFObject) -> &mut Self {
        match obj {
            PDFObject::Null | PDFObject::Stream(_) => self.op("null"),
            PDFObject::Bool(b) => self.op(if *b { "true" } else { "false" }),
            PDFObject::Int(n) => self.op(&n.to_string()),
            PDFObject::Real(n) => self.number(*n),
            PDFObject::Name(name) => self.name(name),
            PDFObject::String(bytes) => self.literal_string(bytes),
            PDFObject::Array(items) => {
                self.begin_array();
                for item in items {
                    self.object(item);
                }
                self.end_array()
            }
            PDFObject::Dict(dict) => self.dict(dict),
            PDFObject::Ref(r) => self.op(&format!("{} {} R", r.objid, r.genno)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_space_separated() {
        let mut w = ContentWriter::new();
        w.op("q").newline().point((0.5, -0.25)).op("m").op("S").newline();
        assert_eq!(w.as_str(), "q\n.5 -.25 m S\n");
    }

    #[test]
    fn names_escape_delimiters() {
        let mut w = ContentWriter::new();
        w.name("A B").name("x/y").name("Plain");
        assert_eq!(w.finish(), "/A#20B /x#2Fy /Plain");
    }

    #[test]
    fn nested_objects() {
        let mut dict = Dictionary::new();
        dict.insert("MCID".into(), PDFObject::Int(3));
        dict.insert(
            "Alt".into(),
            PDFObject::Array(vec![
                PDFObject::String(b"a(b)\n".to_vec()),
                PDFObject::Real(1.5),
            ]),
        );
        let mut w = ContentWriter::new();
        w.name("Span").dict(&dict).op("BDC");
        assert_eq!(w.finish(), "/Span <</Alt [(a\\(b\\)\\012) 1.5] /MCID 3>> BDC");
    }

    #[test]
    fn hex_strings_in_arrays() {
        let mut w = ContentWriter::new();
        w.begin_array().hex_string(b"Hi").number(-120.0).hex_string(&[0, 255]).end_array().op("TJ");
        assert_eq!(w.finish(), "[<4869> -120 <00FF>] TJ");
    }
}
