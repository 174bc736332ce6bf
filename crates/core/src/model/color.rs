//! PDF color spaces and color values.

use std::sync::{Arc, LazyLock};

use rustc_hash::FxHashMap;
use smallvec::{SmallVec, smallvec};

use super::objects::PDFObject;
use super::pattern::Pattern;
use crate::document::Document;

/// Nesting bound for color spaces that wrap a base space.
const MAX_COLORSPACE_DEPTH: usize = 8;

/// Most components an uncolored pattern may carry.
const MAX_PATTERN_COMPONENTS: usize = 16;

/// Color component storage. Four inline slots cover every device space.
pub type ColorValues = SmallVec<[f64; 4]>;

/// Color space families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpaceFamily {
    DeviceGray,
    DeviceRGB,
    DeviceCMYK,
    CalGray,
    CalRGB,
    Lab,
    ICCBased,
    Indexed,
    Separation,
    DeviceN,
    Pattern,
}

impl ColorSpaceFamily {
    /// Family for a color space name. Inline image abbreviations are accepted.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "DeviceGray" | "G" => Self::DeviceGray,
            "DeviceRGB" | "RGB" => Self::DeviceRGB,
            "DeviceCMYK" | "CMYK" => Self::DeviceCMYK,
            "CalGray" => Self::CalGray,
            "CalRGB" => Self::CalRGB,
            "Lab" => Self::Lab,
            "ICCBased" => Self::ICCBased,
            "Indexed" | "I" => Self::Indexed,
            "Separation" => Self::Separation,
            "DeviceN" => Self::DeviceN,
            "Pattern" => Self::Pattern,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::DeviceGray => "DeviceGray",
            Self::DeviceRGB => "DeviceRGB",
            Self::DeviceCMYK => "DeviceCMYK",
            Self::CalGray => "CalGray",
            Self::CalRGB => "CalRGB",
            Self::Lab => "Lab",
            Self::ICCBased => "ICCBased",
            Self::Indexed => "Indexed",
            Self::Separation => "Separation",
            Self::DeviceN => "DeviceN",
            Self::Pattern => "Pattern",
        }
    }
}

/// Represents a loaded PDF color space.
#[derive(Debug, Clone, PartialEq)]
pub struct PDFColorSpace {
    /// Color space family
    pub family: ColorSpaceFamily,
    /// Number of color components
    pub ncomponents: usize,
    /// Underlying space for Indexed and uncolored Pattern spaces
    pub base: Option<Arc<PDFColorSpace>>,
}

static STOCK_COLORSPACES: LazyLock<FxHashMap<ColorSpaceFamily, Arc<PDFColorSpace>>> =
    LazyLock::new(|| {
        [
            (ColorSpaceFamily::DeviceGray, 1),
            (ColorSpaceFamily::DeviceRGB, 3),
            (ColorSpaceFamily::DeviceCMYK, 4),
            (ColorSpaceFamily::Pattern, 1),
        ]
        .into_iter()
        .map(|(family, n)| (family, Arc::new(PDFColorSpace::new(family, n))))
        .collect()
    });

impl PDFColorSpace {
    /// Create a new color space.
    pub const fn new(family: ColorSpaceFamily, ncomponents: usize) -> Self {
        Self {
            family,
            ncomponents,
            base: None,
        }
    }

    /// Shared instance of a device or pattern space.
    pub fn stock(family: ColorSpaceFamily) -> Arc<Self> {
        match STOCK_COLORSPACES.get(&family) {
            Some(cs) => Arc::clone(cs),
            None => Arc::new(Self::new(family, 1)),
        }
    }

    /// Load a color space from a name, array or ICC stream object.
    pub fn load(obj: &PDFObject, doc: &Document) -> Option<Arc<Self>> {
        Self::load_nested(obj, doc, 0)
    }

    fn load_nested(obj: &PDFObject, doc: &Document, depth: usize) -> Option<Arc<Self>> {
        if depth > MAX_COLORSPACE_DEPTH {
            return None;
        }
        match doc.resolve(obj) {
            PDFObject::Name(name) => {
                let family = ColorSpaceFamily::from_name(name)?;
                match family {
                    ColorSpaceFamily::DeviceGray
                    | ColorSpaceFamily::DeviceRGB
                    | ColorSpaceFamily::DeviceCMYK
                    | ColorSpaceFamily::Pattern => Some(Self::stock(family)),
                    _ => None,
                }
            }
            PDFObject::Array(items) => {
                let family = items
                    .first()
                    .and_then(|n| doc.resolve(n).as_name().ok())
                    .and_then(ColorSpaceFamily::from_name)?;
                if items.len() == 1 {
                    return Self::load_nested(&items[0], doc, depth + 1);
                }
                let arg = items.get(1).map(|o| doc.resolve(o));
                let cs = match family {
                    ColorSpaceFamily::DeviceGray | ColorSpaceFamily::CalGray => {
                        Self::new(family, 1)
                    }
                    ColorSpaceFamily::DeviceRGB | ColorSpaceFamily::CalRGB | ColorSpaceFamily::Lab => {
                        Self::new(family, 3)
                    }
                    ColorSpaceFamily::DeviceCMYK => Self::new(family, 4),
                    ColorSpaceFamily::ICCBased => {
                        let n = arg
                            .and_then(|s| s.as_dict().ok())
                            .and_then(|d| d.get("N"))
                            .and_then(|n| doc.resolve(n).as_int().ok())
                            .filter(|n| matches!(n, 1 | 3 | 4))
                            .unwrap_or(3);
                        Self::new(family, n as usize)
                    }
                    ColorSpaceFamily::Indexed => {
                        let base = Self::load_nested(&items[1], doc, depth + 1)?;
                        Self {
                            family,
                            ncomponents: 1,
                            base: Some(base),
                        }
                    }
                    ColorSpaceFamily::Separation => Self::new(family, 1),
                    ColorSpaceFamily::DeviceN => {
                        let n = arg.and_then(|a| a.as_array().ok()).map_or(0, Vec::len);
                        if n == 0 {
                            return None;
                        }
                        Self::new(family, n)
                    }
                    ColorSpaceFamily::Pattern => Self {
                        family,
                        ncomponents: 1,
                        base: Self::load_nested(&items[1], doc, depth + 1),
                    },
                };
                Some(Arc::new(cs))
            }
            _ => None,
        }
    }

    pub fn is_pattern(&self) -> bool {
        self.family == ColorSpaceFamily::Pattern
    }

    /// Component count of a color value in this space. Uncolored patterns
    /// take their components from the base space.
    pub fn component_count(&self) -> usize {
        match (&self.base, self.family) {
            (Some(base), ColorSpaceFamily::Pattern) => base.ncomponents,
            (None, ColorSpaceFamily::Pattern) => 0,
            _ => self.ncomponents,
        }
    }

    /// Initial color after the space is selected.
    pub fn initial_color(&self) -> ColorValues {
        match self.family {
            ColorSpaceFamily::DeviceCMYK => smallvec![0.0, 0.0, 0.0, 1.0],
            ColorSpaceFamily::Separation | ColorSpaceFamily::DeviceN => {
                smallvec![1.0; self.ncomponents]
            }
            ColorSpaceFamily::Pattern => ColorValues::new(),
            _ => smallvec![0.0; self.ncomponents],
        }
    }
}

/// A color value together with its space and optional pattern.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Color {
    space: Option<Arc<PDFColorSpace>>,
    values: ColorValues,
    pattern: Option<Arc<Pattern>>,
}

impl Color {
    /// A color with no space selected yet.
    pub fn is_null(&self) -> bool {
        self.space.is_none()
    }

    pub fn is_pattern(&self) -> bool {
        self.space.as_ref().is_some_and(|cs| cs.is_pattern())
    }

    pub fn color_space(&self) -> Option<&Arc<PDFColorSpace>> {
        self.space.as_ref()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn pattern(&self) -> Option<&Arc<Pattern>> {
        self.pattern.as_ref()
    }

    pub fn component_count(&self) -> usize {
        self.space.as_ref().map_or(0, |cs| cs.component_count())
    }

    /// Select a space and reset the components to its initial color.
    pub fn set_color_space(&mut self, cs: Arc<PDFColorSpace>) {
        self.values = cs.initial_color();
        self.pattern = None;
        self.space = Some(cs);
    }

    pub fn set_value_for_non_pattern(&mut self, values: &[f64]) {
        self.values = values.iter().copied().collect();
    }

    /// Select a pattern, switching to the Pattern space first when another
    /// space is active. Oversized component lists are ignored.
    pub fn set_value_for_pattern(&mut self, pattern: Arc<Pattern>, values: &[f64]) {
        if values.len() > MAX_PATTERN_COMPONENTS {
            return;
        }
        if !self.is_pattern() {
            self.set_color_space(PDFColorSpace::stock(ColorSpaceFamily::Pattern));
        }
        self.pattern = Some(pattern);
        self.values = values.iter().copied().collect();
    }

    /// RGB for device spaces, used when writing colors back out.
    pub fn to_rgb(&self) -> Option<(f64, f64, f64)> {
        let cs = self.space.as_ref()?;
        let v = &self.values;
        match (cs.family, v.as_slice()) {
            (ColorSpaceFamily::DeviceGray | ColorSpaceFamily::CalGray, [g]) => Some((*g, *g, *g)),
            (ColorSpaceFamily::DeviceRGB | ColorSpaceFamily::CalRGB, [r, g, b]) => {
                Some((*r, *g, *b))
            }
            (ColorSpaceFamily::DeviceCMYK, [c, m, y, k]) => Some((
                (1.0 - c) * (1.0 - k),
                (1.0 - m) * (1.0 - k),
                (1.0 - y) * (1.0 - k),
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_spaces_are_shared() {
        let a = PDFColorSpace::stock(ColorSpaceFamily::DeviceRGB);
        let b = PDFColorSpace::stock(ColorSpaceFamily::DeviceRGB);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.ncomponents, 3);
    }

    #[test]
    fn selecting_cmyk_starts_black() {
        let mut color = Color::default();
        assert!(color.is_null());
        color.set_color_space(PDFColorSpace::stock(ColorSpaceFamily::DeviceCMYK));
        assert_eq!(color.values(), &[0.0, 0.0, 0.0, 1.0]);
        assert_eq!(color.to_rgb(), Some((0.0, 0.0, 0.0)));
    }

    #[test]
    fn load_indexed_array() {
        let doc = Document::new();
        let obj = PDFObject::Array(vec![
            PDFObject::Name("Indexed".into()),
            PDFObject::Name("DeviceRGB".into()),
            PDFObject::Int(255),
            PDFObject::String(vec![0; 6]),
        ]);
        let cs = PDFColorSpace::load(&obj, &doc).unwrap();
        assert_eq!(cs.family, ColorSpaceFamily::Indexed);
        assert_eq!(cs.ncomponents, 1);
        assert_eq!(cs.base.as_ref().unwrap().ncomponents, 3);
    }
}
