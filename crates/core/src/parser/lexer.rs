//! Content stream element reader.
//!
//! Splits decoded content bytes into the elements the interpreter consumes:
//! numbers, names, operator keywords and complete direct objects (strings,
//! arrays, dictionaries, booleans and null). Never fails; malformed input
//! degrades to shorter objects or skipped bytes.

use crate::model::objects::{Dictionary, PDFObject};

/// Deepest array/dictionary nesting read before giving up on an object.
pub const MAX_NESTING_LEVEL: usize = 512;

/// Longest word kept; extra bytes are consumed but dropped.
pub const MAX_WORD_LENGTH: usize = 255;

/// Longest literal or hex string kept; extra bytes are consumed but dropped.
pub const MAX_STRING_LENGTH: usize = 32767;

/// A numeric operand, keeping track of whether it was written as an integer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Number {
    pub value: f64,
    pub is_integer: bool,
}

impl Number {
    pub const fn int(value: i64) -> Self {
        Self {
            value: value as f64,
            is_integer: true,
        }
    }

    pub const fn real(value: f64) -> Self {
        Self {
            value,
            is_integer: false,
        }
    }

    /// Parse a word made of digits, signs and dots. Garbage after the
    /// leading numeric part is ignored (`1.2.3` reads as 1.2).
    pub fn parse(word: &[u8]) -> Self {
        let integer = !word.is_empty()
            && word
                .iter()
                .enumerate()
                .all(|(i, &c)| c.is_ascii_digit() || (i == 0 && matches!(c, b'+' | b'-')));
        if integer {
            let (negative, digits) = match word[0] {
                b'-' => (true, &word[1..]),
                b'+' => (false, &word[1..]),
                _ => (false, word),
            };
            let mut value: i64 = 0;
            for &c in digits {
                value = value.saturating_mul(10).saturating_add(i64::from(c - b'0'));
            }
            let value = if negative { -value } else { value };
            return Self::int(value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)));
        }
        Self::real(parse_real(word))
    }

    pub fn as_object(self) -> PDFObject {
        if self.is_integer {
            PDFObject::Int(self.value as i64)
        } else {
            PDFObject::Real(self.value)
        }
    }
}

fn parse_real(word: &[u8]) -> f64 {
    let mut pos = 0;
    let mut negative = false;
    while pos < word.len() && matches!(word[pos], b'+' | b'-') {
        negative ^= word[pos] == b'-';
        pos += 1;
    }
    let start = pos;
    let mut has_dot = false;
    while pos < word.len() {
        match word[pos] {
            b'0'..=b'9' => {}
            b'.' if !has_dot => has_dot = true,
            _ => break,
        }
        pos += 1;
    }
    let value = std::str::from_utf8(&word[start..pos])
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);
    if negative { -value } else { value }
}

/// One element of a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Element<'a> {
    EndOfData,
    Number(Number),
    /// A name with the leading `/` removed and `#xx` escapes decoded.
    Name(String),
    /// An operator word.
    Keyword(&'a [u8]),
    Object(PDFObject),
}

/// Reads elements from a content buffer.
pub struct ContentLexer<'a> {
    data: &'a [u8],
    pos: usize,
    element_start: usize,
}

pub(crate) const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c')
}

pub(crate) const fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

const fn is_numeric(b: u8) -> bool {
    b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.')
}

const fn is_regular(b: u8) -> bool {
    !is_whitespace(b) && !is_delimiter(b)
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Decode `#xx` escapes in a name body.
pub fn decode_name(bytes: &[u8]) -> String {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'#'
            && i + 2 < bytes.len()
            && let (Some(h), Some(l)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2]))
        {
            out.push((h << 4) | l);
            i += 3;
            continue;
        }
        out.push(b);
        i += 1;
    }
    out.iter().map(|&b| char::from(b)).collect()
}

/// Word read by [`ContentLexer::next_word`].
struct Word {
    start: usize,
    end: usize,
    numeric: bool,
}

impl<'a> ContentLexer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            element_start: 0,
        }
    }

    /// Current position in the buffer.
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Set current position in the buffer.
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    /// Position where the last returned element began.
    pub fn element_start(&self) -> usize {
        self.element_start
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Skip whitespace and `%` comments.
    fn skip_whitespace(&mut self) {
        while let Some(&b) = self.data.get(self.pos) {
            if b == b'%' {
                while let Some(&c) = self.data.get(self.pos) {
                    self.pos += 1;
                    if c == b'\r' || c == b'\n' {
                        break;
                    }
                }
                continue;
            }
            if !is_whitespace(b) {
                break;
            }
            self.pos += 1;
        }
    }

    /// Read the next element.
    pub fn next_element(&mut self) -> Element<'a> {
        let first = loop {
            self.skip_whitespace();
            self.element_start = self.pos;
            let Some(&first) = self.data.get(self.pos) else {
                return Element::EndOfData;
            };
            if !is_delimiter(first) || first == b'/' {
                break first;
            }
            // Stray closing delimiters are consumed without output.
            if let Some(obj) = self.read_object(false, false, 0) {
                return Element::Object(obj);
            }
        };
        let start = self.pos;
        let mut numeric = true;
        self.pos += 1;
        if !is_numeric(first) {
            numeric = false;
        }
        while let Some(&b) = self.data.get(self.pos) {
            if !is_regular(b) {
                break;
            }
            if !is_numeric(b) {
                numeric = false;
            }
            self.pos += 1;
        }
        let end = self.pos.min(start + MAX_WORD_LENGTH);
        let word = &self.data[start..end];
        if numeric {
            return Element::Number(Number::parse(word));
        }
        if first == b'/' {
            return Element::Name(decode_name(&word[1..]));
        }
        match word {
            b"true" => Element::Object(PDFObject::Bool(true)),
            b"false" => Element::Object(PDFObject::Bool(false)),
            b"null" => Element::Object(PDFObject::Null),
            _ => Element::Keyword(word),
        }
    }

    /// Read one word for object parsing. Delimiters form their own words
    /// (`<<` and `>>` as pairs); a `/` word runs to the end of the name.
    fn next_word(&mut self) -> Option<Word> {
        self.skip_whitespace();
        let start = self.pos;
        let &first = self.data.get(self.pos)?;
        self.pos += 1;
        if is_delimiter(first) {
            match first {
                b'/' => {
                    while let Some(&b) = self.data.get(self.pos) {
                        if !is_regular(b) {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                b'<' | b'>' => {
                    if self.data.get(self.pos) == Some(&first) {
                        self.pos += 1;
                    }
                }
                _ => {}
            }
            return Some(Word {
                start,
                end: self.pos,
                numeric: false,
            });
        }
        let mut numeric = is_numeric(first);
        while let Some(&b) = self.data.get(self.pos) {
            if !is_regular(b) {
                break;
            }
            numeric &= is_numeric(b);
            self.pos += 1;
        }
        Some(Word {
            start,
            end: self.pos.min(start + MAX_WORD_LENGTH),
            numeric,
        })
    }

    /// Read a direct object starting at the current position.
    ///
    /// Arrays directly inside arrays are only read when `allow_nested_array`
    /// is set; otherwise their brackets are skipped and the items flattened
    /// into the enclosing array.
    fn read_object(
        &mut self,
        allow_nested_array: bool,
        in_array: bool,
        depth: usize,
    ) -> Option<PDFObject> {
        let word = self.next_word()?;
        let bytes = &self.data[word.start..word.end];
        if word.numeric {
            return Some(Number::parse(bytes).as_object());
        }
        match bytes {
            [b'/', rest @ ..] => Some(PDFObject::Name(decode_name(rest))),
            b"(" => Some(PDFObject::String(self.read_string())),
            b"<" => Some(PDFObject::String(self.read_hex_string())),
            b"<<" => {
                if depth > MAX_NESTING_LEVEL {
                    return None;
                }
                let mut dict = Dictionary::new();
                loop {
                    let key = self.next_word()?;
                    let key_bytes = &self.data[key.start..key.end];
                    if key_bytes == b">>" {
                        break;
                    }
                    let [b'/', name @ ..] = key_bytes else {
                        return None;
                    };
                    let name = decode_name(name);
                    let value = self.read_object(true, in_array, depth + 1)?;
                    dict.insert(name, value);
                }
                Some(PDFObject::Dict(dict))
            }
            b"[" => {
                if (!allow_nested_array && in_array) || depth > MAX_NESTING_LEVEL {
                    return None;
                }
                let mut items = Vec::new();
                loop {
                    let before = self.pos;
                    if let Some(obj) = self.read_object(allow_nested_array, true, depth + 1) {
                        items.push(obj);
                        continue;
                    }
                    if self.at_end() || self.data[before..self.pos].ends_with(b"]") {
                        break;
                    }
                }
                Some(PDFObject::Array(items))
            }
            b"true" => Some(PDFObject::Bool(true)),
            b"false" => Some(PDFObject::Bool(false)),
            b"null" => Some(PDFObject::Null),
            _ => None,
        }
    }

    /// Literal string body after the opening `(`.
    fn read_string(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut push = |out: &mut Vec<u8>, b: u8| {
            if out.len() < MAX_STRING_LENGTH {
                out.push(b);
            }
        };
        let mut depth = 1;
        while let Some(&c) = self.data.get(self.pos) {
            self.pos += 1;
            match c {
                b'(' => {
                    depth += 1;
                    push(&mut out, c);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    push(&mut out, c);
                }
                b'\\' => {
                    let Some(&e) = self.data.get(self.pos) else {
                        break;
                    };
                    self.pos += 1;
                    match e {
                        b'n' => push(&mut out, b'\n'),
                        b'r' => push(&mut out, b'\r'),
                        b't' => push(&mut out, b'\t'),
                        b'b' => push(&mut out, 0x08),
                        b'f' => push(&mut out, 0x0c),
                        b'0'..=b'7' => {
                            let mut value = u32::from(e - b'0');
                            for _ in 0..2 {
                                match self.data.get(self.pos) {
                                    Some(&d @ b'0'..=b'7') => {
                                        value = value * 8 + u32::from(d - b'0');
                                        self.pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            push(&mut out, (value & 0xff) as u8);
                        }
                        b'\r' => {
                            if self.data.get(self.pos) == Some(&b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'\n' => {}
                        other => push(&mut out, other),
                    }
                }
                _ => push(&mut out, c),
            }
        }
        out
    }

    /// Hex string body after the opening `<`. Non-hex bytes are skipped and
    /// an odd final digit is padded with zero.
    fn read_hex_string(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut high: Option<u8> = None;
        while let Some(&c) = self.data.get(self.pos) {
            self.pos += 1;
            if c == b'>' {
                break;
            }
            let Some(v) = hex_value(c) else {
                continue;
            };
            match high.take() {
                Some(h) => {
                    if out.len() < MAX_STRING_LENGTH {
                        out.push((h << 4) | v);
                    }
                }
                None => high = Some(v),
            }
        }
        if let Some(h) = high
            && out.len() < MAX_STRING_LENGTH
        {
            out.push(h << 4);
        }
        out
    }

    /// Read one direct object value (used for inline image dictionaries).
    pub(crate) fn read_value(&mut self) -> Option<PDFObject> {
        self.read_object(false, false, 0)
    }

    /// Skip a single whitespace byte, as required after `ID`.
    pub fn skip_one_whitespace(&mut self) {
        if let Some(&b) = self.data.get(self.pos)
            && is_whitespace(b)
        {
            self.pos += 1;
        }
    }

    /// Take `len` raw bytes (fewer at the end of the buffer).
    pub fn take_bytes(&mut self, len: usize) -> &'a [u8] {
        let end = self.pos.saturating_add(len).min(self.data.len());
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elements(data: &[u8]) -> Vec<Element<'_>> {
        let mut lexer = ContentLexer::new(data);
        let mut out = Vec::new();
        loop {
            match lexer.next_element() {
                Element::EndOfData => break,
                e => out.push(e),
            }
        }
        out
    }

    #[test]
    fn numbers_names_and_keywords() {
        let got = elements(b"1 -2.5 .5 /F#31 Tf % comment\nBT");
        assert_eq!(
            got,
            vec![
                Element::Number(Number::int(1)),
                Element::Number(Number::real(-2.5)),
                Element::Number(Number::real(0.5)),
                Element::Name("F1".into()),
                Element::Keyword(b"Tf"),
                Element::Keyword(b"BT"),
            ]
        );
    }

    #[test]
    fn reals_keep_their_written_value() {
        assert_eq!(Number::parse(b"0.3"), Number::real(0.3));
        assert_eq!(Number::parse(b".5"), Number::real(0.5));
        assert_eq!(Number::parse(b"-0.1"), Number::real(-0.1));
        assert_eq!(Number::parse(b"123.456"), Number::real(123.456));
        assert_eq!(Number::parse(b"4."), Number::real(4.0));
        assert_eq!(Number::parse(b"1.2.3"), Number::real(1.2));
        assert_eq!(Number::parse(b"--2.5"), Number::real(2.5));
        assert_eq!(Number::parse(b"-."), Number::real(0.0));
        assert_eq!(
            elements(b"0.1 0.2 0.3 rg"),
            vec![
                Element::Number(Number::real(0.1)),
                Element::Number(Number::real(0.2)),
                Element::Number(Number::real(0.3)),
                Element::Keyword(b"rg"),
            ]
        );
    }

    #[test]
    fn strings_and_escapes() {
        let got = elements(b"(a\\(b\\)c\\101\\\nd) <48656c6c6f> <7>");
        assert_eq!(
            got,
            vec![
                Element::Object(PDFObject::String(b"a(b)cAd".to_vec())),
                Element::Object(PDFObject::String(b"Hello".to_vec())),
                Element::Object(PDFObject::String(vec![0x70])),
            ]
        );
    }

    #[test]
    fn arrays_and_dictionaries() {
        let got = elements(b"[(a) -120 (b)] << /MCID 3 /Alt (x) /K [1 2] >>");
        let Element::Object(PDFObject::Array(items)) = &got[0] else {
            panic!("expected array, got {:?}", got[0]);
        };
        assert_eq!(items.len(), 3);
        let Element::Object(PDFObject::Dict(dict)) = &got[1] else {
            panic!("expected dict");
        };
        assert_eq!(dict.get("MCID"), Some(&PDFObject::Int(3)));
        assert_eq!(
            dict.get("K"),
            Some(&PDFObject::Array(vec![PDFObject::Int(1), PDFObject::Int(2)]))
        );
    }

    #[test]
    fn nested_arrays_are_flattened_at_top_level() {
        let got = elements(b"[1 [2 3] 4] x");
        assert_eq!(
            got[0],
            Element::Object(PDFObject::Array(vec![
                PDFObject::Int(1),
                PDFObject::Int(2),
                PDFObject::Int(3),
            ]))
        );
    }

    #[test]
    fn booleans_and_null() {
        let got = elements(b"true false null");
        assert_eq!(
            got,
            vec![
                Element::Object(PDFObject::Bool(true)),
                Element::Object(PDFObject::Bool(false)),
                Element::Object(PDFObject::Null),
            ]
        );
    }

    #[test]
    fn long_words_are_truncated() {
        let mut data = vec![b'x'; 400];
        data.extend_from_slice(b" q");
        let got = elements(&data);
        let Element::Keyword(word) = got[0] else {
            panic!("expected keyword");
        };
        assert_eq!(word.len(), MAX_WORD_LENGTH);
        assert_eq!(got[1], Element::Keyword(b"q"));
    }

    #[test]
    fn number_parsing_is_lenient() {
        assert_eq!(Number::parse(b"1.2.3").value, 1.2);
        assert_eq!(Number::parse(b"--4").value, 4.0);
        assert!(Number::parse(b"-17").is_integer);
        assert!(!Number::parse(b"3.").is_integer);
    }
}
