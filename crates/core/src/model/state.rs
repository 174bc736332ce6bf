//! Graphics state sub-records.
//!
//! Each sub-record lives behind a [`SharedState`]: an explicit `Unset`
//! variant that reads as the record's defaults, or a reference-counted
//! value that is cloned on first write while shared. Saving the graphics
//! state therefore only bumps reference counts.

use std::fmt;
use std::sync::{Arc, LazyLock};

use rustc_hash::FxHashMap;

use super::color::{Color, ColorSpaceFamily, PDFColorSpace};
use super::objects::{Dictionary, PDFObject};
use super::pattern::Pattern;
use crate::font::PdfFont;
use crate::utils::{MATRIX_IDENTITY, Matrix};

/// A record type that can sit behind a [`SharedState`].
pub trait StateRecord: Clone + Default + Send + Sync + 'static {
    /// Shared default value returned by reads of an unset record.
    fn defaults() -> &'static Self;
}

/// Copy-on-write holder for one graphics state sub-record.
#[derive(Debug, Clone)]
pub enum SharedState<T> {
    /// Never written; reads yield the defaults.
    Unset,
    /// Shared value.
    Set(Arc<T>),
}

impl<T> Default for SharedState<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T: StateRecord> SharedState<T> {
    /// Wrap an explicit value.
    pub fn new(value: T) -> Self {
        Self::Set(Arc::new(value))
    }

    pub const fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// Current value (the defaults when unset).
    pub fn get(&self) -> &T {
        match self {
            Self::Unset => T::defaults(),
            Self::Set(value) => value,
        }
    }

    /// Writable access. Materializes the defaults when unset and clones
    /// the value when another owner still holds it.
    pub fn make_mut(&mut self) -> &mut T {
        if matches!(self, Self::Unset) {
            *self = Self::Set(Arc::new(T::default()));
        }
        match self {
            Self::Set(value) => Arc::make_mut(value),
            Self::Unset => unreachable!("record materialized above"),
        }
    }

    /// Make sure the record is set, keeping any existing value.
    pub fn emplace(&mut self) {
        self.make_mut();
    }

    /// Drop back to the unset state.
    pub fn clear(&mut self) {
        *self = Self::Unset;
    }

    /// Whether both holders point at the same shared value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Set(a), Self::Set(b)) => Arc::ptr_eq(a, b),
            (Self::Unset, Self::Unset) => true,
            _ => false,
        }
    }
}

impl<T: StateRecord + PartialEq> PartialEq for SharedState<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.get() == other.get()
    }
}

macro_rules! state_record {
    ($ty:ty) => {
        impl StateRecord for $ty {
            fn defaults() -> &'static Self {
                static DEFAULT: LazyLock<$ty> = LazyLock::new(<$ty>::default);
                &DEFAULT
            }
        }
    };
}

// ============================================================================
// Path and stroke parameters
// ============================================================================

/// Line cap style (`J`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    pub const fn from_int(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Butt),
            1 => Some(Self::Round),
            2 => Some(Self::Square),
            _ => None,
        }
    }

    pub const fn as_int(self) -> i64 {
        self as i64
    }
}

/// Line join style (`j`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub const fn from_int(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Miter),
            1 => Some(Self::Round),
            2 => Some(Self::Bevel),
            _ => None,
        }
    }

    pub const fn as_int(self) -> i64 {
        self as i64
    }
}

/// Stroke parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphState {
    pub line_width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f64,
    pub dash_array: Vec<f64>,
    pub dash_phase: f64,
}

impl Default for GraphState {
    fn default() -> Self {
        Self {
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
            dash_array: Vec::new(),
            dash_phase: 0.0,
        }
    }
}

state_record!(GraphState);

// ============================================================================
// Text parameters
// ============================================================================

/// Text rendering mode (`Tr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextRenderingMode {
    #[default]
    Fill,
    Stroke,
    FillStroke,
    Invisible,
    FillClip,
    StrokeClip,
    FillStrokeClip,
    Clip,
}

impl TextRenderingMode {
    /// Only 0 through 7 are valid.
    pub const fn from_int(value: i64) -> Option<Self> {
        Some(match value {
            0 => Self::Fill,
            1 => Self::Stroke,
            2 => Self::FillStroke,
            3 => Self::Invisible,
            4 => Self::FillClip,
            5 => Self::StrokeClip,
            6 => Self::FillStrokeClip,
            7 => Self::Clip,
            _ => return None,
        })
    }

    pub const fn as_int(self) -> i64 {
        self as i64
    }

    /// Modes 4 through 7 add the glyphs to the clipping path.
    pub const fn is_clip(self) -> bool {
        matches!(
            self,
            Self::FillClip | Self::StrokeClip | Self::FillStrokeClip | Self::Clip
        )
    }

    pub const fn is_stroke(self) -> bool {
        matches!(
            self,
            Self::Stroke | Self::FillStroke | Self::StrokeClip | Self::FillStrokeClip
        )
    }
}

/// Text parameters plus the matrices the interpreter maintains for text.
#[derive(Clone)]
pub struct TextState {
    pub font: Option<Arc<dyn PdfFont>>,
    pub font_size: f64,
    pub char_space: f64,
    pub word_space: f64,
    pub horz_scale: f64,
    pub rise: f64,
    pub text_mode: TextRenderingMode,
    /// Text space to device 2×2 part, stored as `[a, c, b, d]`.
    pub matrix: [f64; 4],
    /// CTM 2×2 part recorded for stroked text, stored as `[a, c, b, d]`.
    pub ctm: [f64; 4],
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            font_size: 1.0,
            char_space: 0.0,
            word_space: 0.0,
            horz_scale: 1.0,
            rise: 0.0,
            text_mode: TextRenderingMode::Fill,
            matrix: [1.0, 0.0, 0.0, 1.0],
            ctm: [1.0, 0.0, 0.0, 1.0],
        }
    }
}

impl fmt::Debug for TextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextState")
            .field("font", &self.font.as_ref().map(|font| font.base_font().to_string()))
            .field("font_size", &self.font_size)
            .field("char_space", &self.char_space)
            .field("word_space", &self.word_space)
            .field("horz_scale", &self.horz_scale)
            .field("rise", &self.rise)
            .field("text_mode", &self.text_mode)
            .field("matrix", &self.matrix)
            .finish()
    }
}

impl PartialEq for TextState {
    fn eq(&self, other: &Self) -> bool {
        let same_font = match (&self.font, &other.font) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_font
            && self.font_size == other.font_size
            && self.char_space == other.char_space
            && self.word_space == other.word_space
            && self.horz_scale == other.horz_scale
            && self.rise == other.rise
            && self.text_mode == other.text_mode
            && self.matrix == other.matrix
            && self.ctm == other.ctm
    }
}

impl TextState {
    /// Font size scaled by the 2×2 text matrix, used for stroke widths.
    pub fn font_size_h(&self) -> f64 {
        self.matrix[0].hypot(self.matrix[2]) * self.font_size
    }
}

state_record!(TextState);

// ============================================================================
// Colors
// ============================================================================

/// Fill and stroke colors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColorState {
    pub fill_color: Color,
    pub stroke_color: Color,
}

impl ColorState {
    /// DeviceGray black for both colors.
    pub fn set_default(&mut self) {
        let gray = PDFColorSpace::stock(ColorSpaceFamily::DeviceGray);
        self.fill_color.set_color_space(Arc::clone(&gray));
        self.stroke_color.set_color_space(gray);
    }

    pub fn set_fill_color(&mut self, space: Option<Arc<PDFColorSpace>>, values: &[f64]) {
        set_color(&mut self.fill_color, space, values);
    }

    pub fn set_stroke_color(&mut self, space: Option<Arc<PDFColorSpace>>, values: &[f64]) {
        set_color(&mut self.stroke_color, space, values);
    }

    pub fn set_fill_pattern(&mut self, pattern: Arc<Pattern>, values: &[f64]) {
        self.fill_color.set_value_for_pattern(pattern, values);
    }

    pub fn set_stroke_pattern(&mut self, pattern: Arc<Pattern>, values: &[f64]) {
        self.stroke_color.set_value_for_pattern(pattern, values);
    }
}

/// Apply `space` (or DeviceGray for a color without one), then the values
/// when there are enough of them. Pattern colors keep their components.
fn set_color(color: &mut Color, space: Option<Arc<PDFColorSpace>>, values: &[f64]) {
    match space {
        Some(space) => color.set_color_space(space),
        None if color.is_null() => {
            color.set_color_space(PDFColorSpace::stock(ColorSpaceFamily::DeviceGray));
        }
        None => {}
    }
    if color.component_count() > values.len() {
        return;
    }
    if !color.is_pattern() {
        color.set_value_for_non_pattern(values);
    }
}

state_record!(ColorState);

// ============================================================================
// General parameters
// ============================================================================

/// Separable and non-separable blend modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

const BLEND_MODES: [(&str, BlendMode); 16] = [
    ("Normal", BlendMode::Normal),
    ("Multiply", BlendMode::Multiply),
    ("Screen", BlendMode::Screen),
    ("Overlay", BlendMode::Overlay),
    ("Darken", BlendMode::Darken),
    ("Lighten", BlendMode::Lighten),
    ("ColorDodge", BlendMode::ColorDodge),
    ("ColorBurn", BlendMode::ColorBurn),
    ("HardLight", BlendMode::HardLight),
    ("SoftLight", BlendMode::SoftLight),
    ("Difference", BlendMode::Difference),
    ("Exclusion", BlendMode::Exclusion),
    ("Hue", BlendMode::Hue),
    ("Saturation", BlendMode::Saturation),
    ("Color", BlendMode::Color),
    ("Luminosity", BlendMode::Luminosity),
];

static BLEND_MODE_BY_NAME: LazyLock<FxHashMap<&'static str, BlendMode>> =
    LazyLock::new(|| BLEND_MODES.into_iter().collect());

impl BlendMode {
    /// Blend mode for a name. Unknown names, `Compatible` included, map to
    /// `Normal`.
    pub fn from_name(name: &str) -> Self {
        BLEND_MODE_BY_NAME.get(name).copied().unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        BLEND_MODES[self as usize].0
    }

    /// Anything beyond Normal and Multiply needs the backdrop alpha.
    pub const fn needs_background_alpha(self) -> bool {
        !matches!(self, Self::Normal | Self::Multiply)
    }
}

/// Rendering intent (`ri`, `/RI`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderingIntent {
    AbsoluteColorimetric,
    #[default]
    RelativeColorimetric,
    Saturation,
    Perceptual,
}

impl RenderingIntent {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "AbsoluteColorimetric" => Self::AbsoluteColorimetric,
            "RelativeColorimetric" => Self::RelativeColorimetric,
            "Saturation" => Self::Saturation,
            "Perceptual" => Self::Perceptual,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::AbsoluteColorimetric => "AbsoluteColorimetric",
            Self::RelativeColorimetric => "RelativeColorimetric",
            Self::Saturation => "Saturation",
            Self::Perceptual => "Perceptual",
        }
    }
}

/// Parameters set through `gs` and a few direct operators.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralState {
    fill_alpha: f64,
    stroke_alpha: f64,
    pub blend_mode: BlendMode,
    pub soft_mask: Option<Arc<Dictionary>>,
    /// CTM in effect when the soft mask was set.
    pub soft_mask_matrix: Matrix,
    pub transfer_function: Option<PDFObject>,
    pub stroke_overprint: bool,
    pub fill_overprint: bool,
    pub overprint_mode: i64,
    pub black_generation: Option<PDFObject>,
    pub undercolor_removal: Option<PDFObject>,
    pub halftone: Option<PDFObject>,
    pub flatness: f64,
    pub smoothness: f64,
    pub stroke_adjust: bool,
    pub alpha_is_shape: bool,
    pub text_knockout: bool,
    pub rendering_intent: RenderingIntent,
    /// ExtGState resource names applied so far.
    pub graphics_state_names: Vec<String>,
    /// CTM when the last `gs` was applied.
    pub matrix: Matrix,
}

impl Default for GeneralState {
    fn default() -> Self {
        Self {
            fill_alpha: 1.0,
            stroke_alpha: 1.0,
            blend_mode: BlendMode::Normal,
            soft_mask: None,
            soft_mask_matrix: MATRIX_IDENTITY,
            transfer_function: None,
            stroke_overprint: false,
            fill_overprint: false,
            overprint_mode: 0,
            black_generation: None,
            undercolor_removal: None,
            halftone: None,
            flatness: 1.0,
            smoothness: 0.0,
            stroke_adjust: false,
            alpha_is_shape: false,
            text_knockout: false,
            rendering_intent: RenderingIntent::RelativeColorimetric,
            graphics_state_names: Vec::new(),
            matrix: MATRIX_IDENTITY,
        }
    }
}

impl GeneralState {
    pub const fn fill_alpha(&self) -> f64 {
        self.fill_alpha
    }

    pub const fn stroke_alpha(&self) -> f64 {
        self.stroke_alpha
    }

    /// Clamped to `[0, 1]`.
    pub fn set_fill_alpha(&mut self, alpha: f64) {
        self.fill_alpha = clamp_alpha(alpha);
    }

    /// Clamped to `[0, 1]`.
    pub fn set_stroke_alpha(&mut self, alpha: f64) {
        self.stroke_alpha = clamp_alpha(alpha);
    }

    pub fn set_blend_mode_name(&mut self, name: &str) {
        self.blend_mode = BlendMode::from_name(name);
    }

    pub fn append_graphics_state_name(&mut self, name: &str) {
        self.graphics_state_names.push(name.to_string());
    }
}

fn clamp_alpha(alpha: f64) -> f64 {
    if alpha.is_nan() {
        return 1.0;
    }
    alpha.clamp(0.0, 1.0)
}

state_record!(GeneralState);
