//! PDF object types.
//!
//! The value model consumed by the content interpreter: direct objects,
//! streams with shared byte storage, and indirect references that the
//! [`Document`](crate::document::Document) resolves.

use crate::error::{PdfError, Result};
use crate::utils::{Matrix, Rect, matrix_from_slice, normalize_rect};
use bytes::Bytes;
use std::collections::HashMap;

/// Dictionary of name -> object.
pub type Dictionary = HashMap<String, PDFObject>;

/// PDF Object types - the fundamental value type in PDF.
#[derive(Debug, Clone, PartialEq)]
pub enum PDFObject {
    /// Null object
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Real (floating point) value
    Real(f64),
    /// Name object (e.g., /Type, /Font)
    Name(String),
    /// String (byte array)
    String(Vec<u8>),
    /// Array of objects
    Array(Vec<Self>),
    /// Dictionary (name -> object mapping)
    Dict(Dictionary),
    /// Stream (dictionary + binary data)
    Stream(Box<PDFStream>),
    /// Indirect object reference
    Ref(PDFObjRef),
}

impl PDFObject {
    /// Check if this is a null object
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get as boolean
    pub const fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => Err(PdfError::TypeError {
                expected: "bool",
                got: self.type_name(),
            }),
        }
    }

    /// Get as integer. Reals are truncated toward zero.
    pub const fn as_int(&self) -> Result<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            Self::Real(n) => Ok(*n as i64),
            _ => Err(PdfError::TypeError {
                expected: "int",
                got: self.type_name(),
            }),
        }
    }

    /// Get numeric value (int or real coerced to f64)
    pub const fn as_num(&self) -> Result<f64> {
        match self {
            Self::Int(n) => Ok(*n as f64),
            Self::Real(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "number",
                got: self.type_name(),
            }),
        }
    }

    /// Get as name string
    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "name",
                got: self.type_name(),
            }),
        }
    }

    /// Get as byte string
    pub fn as_string(&self) -> Result<&[u8]> {
        match self {
            Self::String(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "string",
                got: self.type_name(),
            }),
        }
    }

    /// Get as array
    pub const fn as_array(&self) -> Result<&Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(PdfError::TypeError {
                expected: "array",
                got: self.type_name(),
            }),
        }
    }

    /// Get as dictionary. A stream answers with its own dictionary.
    pub fn as_dict(&self) -> Result<&Dictionary> {
        match self {
            Self::Dict(d) => Ok(d),
            Self::Stream(s) => Ok(&s.attrs),
            _ => Err(PdfError::TypeError {
                expected: "dict",
                got: self.type_name(),
            }),
        }
    }

    /// Get as stream
    pub fn as_stream(&self) -> Result<&PDFStream> {
        match self {
            Self::Stream(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "stream",
                got: self.type_name(),
            }),
        }
    }

    /// Get as object reference
    pub const fn as_ref(&self) -> Result<&PDFObjRef> {
        match self {
            Self::Ref(r) => Ok(r),
            _ => Err(PdfError::TypeError {
                expected: "ref",
                got: self.type_name(),
            }),
        }
    }

    /// Numeric value, or 0 for anything that is not a number.
    pub fn number(&self) -> f64 {
        self.as_num().unwrap_or(0.0)
    }

    /// String form used by operand lookups: name text or string bytes.
    pub fn string_value(&self) -> String {
        match self {
            Self::Name(s) => s.clone(),
            Self::String(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            _ => String::new(),
        }
    }

    /// Whether this object is a name.
    pub const fn is_name(&self) -> bool {
        matches!(self, Self::Name(_))
    }

    /// Get type name for error messages
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Stream(_) => "stream",
            Self::Ref(_) => "ref",
        }
    }

    /// Collects the numbers of an array, skipping non-numeric entries.
    pub fn numbers(&self) -> Vec<f64> {
        match self {
            Self::Array(items) => items.iter().filter_map(|o| o.as_num().ok()).collect(),
            _ => Vec::new(),
        }
    }

    /// Reads a six-number array as a matrix (identity when malformed).
    pub fn to_matrix(&self) -> Matrix {
        matrix_from_slice(&self.numbers())
    }

    /// Reads a four-number array as a normalized rectangle.
    pub fn to_rect(&self) -> Option<Rect> {
        match self.numbers().as_slice() {
            [x0, y0, x1, y1] => Some(normalize_rect((*x0, *y0, *x1, *y1))),
            _ => None,
        }
    }
}

impl From<f64> for PDFObject {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<i64> for PDFObject {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<PDFObjRef> for PDFObject {
    fn from(value: PDFObjRef) -> Self {
        Self::Ref(value)
    }
}

/// PDF indirect object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PDFObjRef {
    /// Object ID
    pub objid: u32,
    /// Generation number
    pub genno: u32,
}

impl PDFObjRef {
    /// Create a new object reference.
    pub const fn new(objid: u32, genno: u32) -> Self {
        Self { objid, genno }
    }
}

/// PDF Stream - dictionary attributes + binary data.
#[derive(Debug, Clone, PartialEq)]
pub struct PDFStream {
    /// Stream dictionary attributes
    pub attrs: Dictionary,
    /// Raw (possibly encoded) data
    rawdata: Bytes,
    /// Object ID (set when stream is part of document)
    pub objid: Option<u32>,
    /// Generation number
    pub genno: Option<u32>,
}

impl PDFStream {
    /// Create a new stream.
    pub fn new(attrs: Dictionary, rawdata: impl Into<Bytes>) -> Self {
        Self {
            attrs,
            rawdata: rawdata.into(),
            objid: None,
            genno: None,
        }
    }

    /// Set object ID and generation number.
    pub const fn set_objid(&mut self, objid: u32, genno: u32) {
        self.objid = Some(objid);
        self.genno = Some(genno);
    }

    /// Get raw (undecoded) data.
    pub fn get_rawdata(&self) -> &[u8] {
        self.rawdata.as_ref()
    }

    /// Get raw data as shared bytes.
    pub fn rawdata_bytes(&self) -> Bytes {
        self.rawdata.clone()
    }

    /// Replace the data and drop any filter, updating `Length`.
    pub fn set_data_and_remove_filter(&mut self, data: impl Into<Bytes>) {
        self.rawdata = data.into();
        self.attrs.remove("Filter");
        self.attrs.remove("DecodeParms");
        self.attrs
            .insert("Length".to_string(), PDFObject::Int(self.rawdata.len() as i64));
    }

    /// Check if stream contains a key.
    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Get attribute by name.
    pub fn get(&self, name: &str) -> Option<&PDFObject> {
        self.attrs.get(name)
    }

    /// Get attribute, trying multiple names.
    pub fn get_any(&self, names: &[&str]) -> Option<&PDFObject> {
        names.iter().find_map(|name| self.attrs.get(*name))
    }
}
