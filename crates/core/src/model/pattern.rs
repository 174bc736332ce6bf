//! Tiling and shading patterns.

use std::sync::Arc;

use super::color::PDFColorSpace;
use super::objects::{Dictionary, PDFObject};
use crate::document::Document;
use crate::utils::{MATRIX_IDENTITY, Matrix, mult_matrix};

/// Shading types as numbered in the PDF reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingType {
    Function = 1,
    Axial = 2,
    Radial = 3,
    FreeFormTriangleMesh = 4,
    LatticeFormTriangleMesh = 5,
    CoonsPatchMesh = 6,
    TensorProductPatchMesh = 7,
}

impl ShadingType {
    pub const fn from_int(value: i64) -> Option<Self> {
        Some(match value {
            1 => Self::Function,
            2 => Self::Axial,
            3 => Self::Radial,
            4 => Self::FreeFormTriangleMesh,
            5 => Self::LatticeFormTriangleMesh,
            6 => Self::CoonsPatchMesh,
            7 => Self::TensorProductPatchMesh,
            _ => return None,
        })
    }

    /// Types 4 through 7 carry their geometry in a stream.
    pub const fn is_mesh(self) -> bool {
        (self as i64) >= 4
    }
}

/// A shading dictionary, loaded either from a pattern or from `sh`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadingPattern {
    pub shading_type: Option<ShadingType>,
    pub color_space: Option<Arc<PDFColorSpace>>,
    /// Pattern matrix (identity for `sh`).
    pub matrix: Matrix,
    pub shading: PDFObject,
    /// `true` when loaded for the `sh` operator.
    pub is_shading_object: bool,
}

impl ShadingPattern {
    /// Load from a shading dictionary or stream.
    pub fn load(shading: &PDFObject, matrix: Matrix, is_shading_object: bool, doc: &Document) -> Self {
        let resolved = doc.resolve(shading);
        let dict = resolved.as_dict().ok();
        let shading_type = dict
            .and_then(|d| d.get("ShadingType"))
            .and_then(|t| doc.resolve(t).as_int().ok())
            .and_then(ShadingType::from_int);
        let color_space = dict
            .and_then(|d| d.get("ColorSpace"))
            .and_then(|cs| PDFColorSpace::load(cs, doc));
        Self {
            shading_type,
            color_space,
            matrix,
            shading: resolved.clone(),
            is_shading_object,
        }
    }

    /// A known type with a usable non-pattern color space. Mesh shadings
    /// also need their geometry stream.
    pub fn is_valid(&self) -> bool {
        let Some(kind) = self.shading_type else {
            return false;
        };
        let Some(cs) = &self.color_space else {
            return false;
        };
        if cs.is_pattern() {
            return false;
        }
        !kind.is_mesh() || matches!(self.shading, PDFObject::Stream(_))
    }
}

/// A pattern resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Type 1: content stream drawn repeatedly.
    Tiling { dict: Dictionary, matrix: Matrix, colored: bool },
    /// Type 2: a shading.
    Shading(ShadingPattern),
}

impl Pattern {
    /// Load a pattern resource object. The pattern matrix is concatenated
    /// with `parent`, the matrix of the form or page that uses it.
    pub fn load(obj: &PDFObject, parent: Matrix, doc: &Document) -> Option<Self> {
        let dict = doc.resolve(obj).as_dict().ok()?;
        let own = dict
            .get("Matrix")
            .map(|m| doc.resolve(m).to_matrix())
            .unwrap_or(MATRIX_IDENTITY);
        let matrix = mult_matrix(own, parent);
        match dict.get("PatternType").and_then(|t| doc.resolve(t).as_int().ok()) {
            Some(1) => {
                let colored = dict
                    .get("PaintType")
                    .and_then(|p| doc.resolve(p).as_int().ok())
                    .unwrap_or(1)
                    == 1;
                Some(Self::Tiling {
                    dict: dict.clone(),
                    matrix,
                    colored,
                })
            }
            Some(2) => {
                let shading = dict.get("Shading")?;
                Some(Self::Shading(ShadingPattern::load(shading, matrix, false, doc)))
            }
            _ => None,
        }
    }

    pub fn matrix(&self) -> Matrix {
        match self {
            Self::Tiling { matrix, .. } => *matrix,
            Self::Shading(shading) => shading.matrix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shading_dict(kind: i64) -> PDFObject {
        let mut dict = Dictionary::new();
        dict.insert("ShadingType".into(), PDFObject::Int(kind));
        dict.insert("ColorSpace".into(), PDFObject::Name("DeviceRGB".into()));
        PDFObject::Dict(dict)
    }

    #[test]
    fn axial_shading_is_valid() {
        let doc = Document::new();
        let shading = ShadingPattern::load(&shading_dict(2), MATRIX_IDENTITY, true, &doc);
        assert_eq!(shading.shading_type, Some(ShadingType::Axial));
        assert!(shading.is_valid());
    }

    #[test]
    fn mesh_shading_needs_a_stream() {
        let doc = Document::new();
        let shading = ShadingPattern::load(&shading_dict(4), MATRIX_IDENTITY, true, &doc);
        assert!(!shading.is_valid());
        let unknown = ShadingPattern::load(&shading_dict(9), MATRIX_IDENTITY, true, &doc);
        assert!(!unknown.is_valid());
    }

    #[test]
    fn pattern_matrix_follows_parent() {
        let doc = Document::new();
        let mut dict = Dictionary::new();
        dict.insert("PatternType".into(), PDFObject::Int(2));
        dict.insert("Shading".into(), shading_dict(2));
        dict.insert(
            "Matrix".into(),
            PDFObject::Array(vec![
                PDFObject::Int(2),
                PDFObject::Int(0),
                PDFObject::Int(0),
                PDFObject::Int(2),
                PDFObject::Int(0),
                PDFObject::Int(0),
            ]),
        );
        let pattern = Pattern::load(&PDFObject::Dict(dict), (1.0, 0.0, 0.0, 1.0, 10.0, 20.0), &doc)
            .unwrap();
        assert_eq!(pattern.matrix(), (2.0, 0.0, 0.0, 2.0, 10.0, 20.0));
    }
}
