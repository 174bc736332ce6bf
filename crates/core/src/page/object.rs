//! Page objects emitted by the interpreter.
//!
//! Every object carries a snapshot of the graphics sub-records that were
//! active when it was painted, the marked-content list, and the index of
//! the content stream segment it came from (`None` for objects created
//! outside the parser).

use std::sync::Arc;

use crate::model::clip::ClipPath;
use crate::model::marks::ContentMarks;
use crate::model::objects::PDFStream;
use crate::model::path::{FillType, Path};
use crate::model::pattern::ShadingPattern;
use crate::model::state::{ColorState, GeneralState, GraphState, SharedState, TextState};
use crate::page::form::Form;
use crate::utils::{
    MATRIX_IDENTITY, Matrix, Point, RECT_EMPTY, Rect, apply_matrix_pt, apply_matrix_rect,
    mult_matrix,
};

/// Vertical writing places the glyph origin at the top center; this is
/// the default vertical origin height in glyph units.
const VERTICAL_ORIGIN_Y: f64 = 880.0;

/// One entry of a text run.
#[derive(Debug, Clone, PartialEq)]
pub enum TextItem {
    /// A character code and its offset along the baseline (text space).
    Glyph { code: u32, origin: f64 },
    /// A `TJ` adjustment between two strings, in thousandths of an em.
    Kerning(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextObject {
    pub items: Vec<TextItem>,
    /// Origin of the run in user space.
    pub pos: Point,
}

impl TextObject {
    /// Character codes of the run, kerning excluded.
    pub fn char_codes(&self) -> impl Iterator<Item = u32> + '_ {
        self.items.iter().filter_map(|item| match item {
            TextItem::Glyph { code, .. } => Some(*code),
            TextItem::Kerning(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathObject {
    pub path: Path,
    pub fill_type: FillType,
    pub stroke: bool,
    pub matrix: Matrix,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageObject {
    pub stream: Arc<PDFStream>,
    pub matrix: Matrix,
    /// Read from `BI … ID … EI` rather than an XObject.
    pub is_inline: bool,
}

impl ImageObject {
    pub fn is_mask(&self) -> bool {
        self.stream
            .get_any(&["ImageMask", "IM"])
            .and_then(|v| v.as_bool().ok())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShadingObject {
    pub shading: Arc<ShadingPattern>,
    pub matrix: Matrix,
}

#[derive(Debug, Clone)]
pub struct FormObject {
    pub form: Arc<Form>,
    pub matrix: Matrix,
}

#[derive(Debug, Clone)]
pub enum PageObjectKind {
    Text(TextObject),
    Path(PathObject),
    Image(ImageObject),
    Shading(ShadingObject),
    Form(FormObject),
}

#[derive(Debug, Clone)]
pub struct PageObject {
    pub general_state: SharedState<GeneralState>,
    pub graph_state: SharedState<GraphState>,
    pub text_state: SharedState<TextState>,
    pub color_state: SharedState<ColorState>,
    pub clip_path: ClipPath,
    pub marks: ContentMarks,
    pub kind: PageObjectKind,
    content_stream: Option<usize>,
    dirty: bool,
    rect: Rect,
    original_rect: Rect,
    resource_name: String,
}

impl PageObject {
    pub fn new(kind: PageObjectKind, content_stream: Option<usize>) -> Self {
        Self {
            general_state: SharedState::Unset,
            graph_state: SharedState::Unset,
            text_state: SharedState::Unset,
            color_state: SharedState::Unset,
            clip_path: ClipPath::Unset,
            marks: ContentMarks::new(),
            kind,
            content_stream,
            dirty: false,
            rect: RECT_EMPTY,
            original_rect: RECT_EMPTY,
            resource_name: String::new(),
        }
    }

    pub fn new_path(path: Path, fill_type: FillType, stroke: bool, matrix: Matrix) -> Self {
        Self::new(
            PageObjectKind::Path(PathObject {
                path,
                fill_type,
                stroke,
                matrix,
            }),
            None,
        )
    }

    /// Segment index, `None` when the object belongs to no stream yet.
    pub fn content_stream(&self) -> Option<usize> {
        self.content_stream
    }

    pub fn set_content_stream(&mut self, index: Option<usize>) {
        self.content_stream = index;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Bounding box in user space.
    pub fn bbox(&self) -> Rect {
        self.rect
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
    }

    /// Text box before the text matrix is applied.
    pub fn original_rect(&self) -> Rect {
        self.original_rect
    }

    /// Resource name the object was drawn from (`Do` name), if any.
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    pub fn set_resource_name(&mut self, name: &str) {
        self.resource_name = name.to_string();
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, PageObjectKind::Text(_))
    }

    pub fn is_shading(&self) -> bool {
        matches!(self.kind, PageObjectKind::Shading(_))
    }

    pub fn as_text(&self) -> Option<&TextObject> {
        match &self.kind {
            PageObjectKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&PathObject> {
        match &self.kind {
            PageObjectKind::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageObject> {
        match &self.kind {
            PageObjectKind::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_form(&self) -> Option<&FormObject> {
        match &self.kind {
            PageObjectKind::Form(form) => Some(form),
            _ => None,
        }
    }

    /// Kind name used in dumps.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            PageObjectKind::Text(_) => "text",
            PageObjectKind::Path(_) => "path",
            PageObjectKind::Image(_) => "image",
            PageObjectKind::Shading(_) => "shading",
            PageObjectKind::Form(_) => "form",
        }
    }

    /// Text space to user space for a text object.
    pub fn text_matrix(&self) -> Matrix {
        let m = self.text_state.get().matrix;
        let pos = self.as_text().map_or((0.0, 0.0), |t| t.pos);
        (m[0], m[2], m[1], m[3], pos.0, pos.1)
    }

    /// Recompute the bounding box from the geometry and states.
    pub fn calc_bounding_box(&mut self) {
        self.rect = match &self.kind {
            PageObjectKind::Path(p) => {
                let width = self.graph_state.get().line_width;
                let rect = if p.stroke && width != 0.0 {
                    p.path
                        .bounding_box_for_stroke(width, self.graph_state.get().miter_limit)
                } else {
                    p.path.bounding_box()
                };
                let (x0, y0, x1, y1) = apply_matrix_rect(p.matrix, rect);
                if p.stroke && width == 0.0 {
                    (x0 - 0.5, y0 - 0.5, x1 + 0.5, y1 + 0.5)
                } else {
                    (x0, y0, x1, y1)
                }
            }
            PageObjectKind::Image(image) => apply_matrix_rect(image.matrix, (0.0, 0.0, 1.0, 1.0)),
            PageObjectKind::Form(form) => {
                apply_matrix_rect(form.matrix, form.form.holder().calc_bounding_box())
            }
            PageObjectKind::Shading(_) => {
                if self.clip_path.is_set() {
                    self.clip_path.get().clip_box()
                } else {
                    self.rect
                }
            }
            PageObjectKind::Text(_) => self.text_rect(),
        };
    }

    /// Text box: original rect through the text matrix, widened by half
    /// the line width for stroked modes.
    fn text_rect(&self) -> Rect {
        let (x0, y0, x1, y1) = apply_matrix_rect(self.text_matrix(), self.original_rect);
        if self.text_state.get().text_mode.is_stroke() {
            let half = self.graph_state.get().line_width / 2.0;
            return (x0 - half, y0 - half, x1 + half, y1 + half);
        }
        (x0, y0, x1, y1)
    }

    /// Lay out the glyphs of a text run, set its boxes and return the
    /// advance in text space.
    pub fn calc_text_position(&mut self, horz_scale: f64) -> Point {
        let text_state = self.text_state.get().clone();
        let PageObjectKind::Text(text) = &mut self.kind else {
            return (0.0, 0.0);
        };
        let Some(font) = text_state.font.clone() else {
            return (0.0, 0.0);
        };
        let vertical = font.is_vertical();
        let fontsize = text_state.font_size / 1000.0;
        let mut curpos = 0.0;
        let (mut min_x, mut max_x) = (10000.0f64, -10000.0f64);
        let (mut min_y, mut max_y) = (10000.0f64, -10000.0f64);
        for item in &mut text.items {
            let code = match item {
                TextItem::Kerning(k) => {
                    curpos -= *k * fontsize;
                    continue;
                }
                TextItem::Glyph { code, origin } => {
                    *origin = curpos;
                    *code
                }
            };
            let (left, bottom, right, top) = font.char_bbox(code);
            let advance = if vertical {
                let width = font.char_width(code);
                let (ox, oy) = (width / 2.0, VERTICAL_ORIGIN_Y);
                let (left, right) = (left - ox, right - ox);
                let (bottom, top) = (bottom - oy, top - oy);
                min_x = min_x.min(left).min(right);
                max_x = max_x.max(left).max(right);
                let char_top = curpos + top * fontsize;
                let char_bottom = curpos + bottom * fontsize;
                min_y = min_y.min(char_top).min(char_bottom);
                max_y = max_y.max(char_top).max(char_bottom);
                font.vertical_advance(code) * fontsize
            } else {
                min_y = min_y.min(top).min(bottom);
                max_y = max_y.max(top).max(bottom);
                let char_left = curpos + left * fontsize;
                let char_right = curpos + right * fontsize;
                min_x = min_x.min(char_left).min(char_right);
                max_x = max_x.max(char_left).max(char_right);
                font.char_width(code) * fontsize
            };
            curpos += advance;
            if font.applies_word_space(code) {
                curpos += text_state.word_space;
            }
            curpos += text_state.char_space;
        }
        let advance = if vertical {
            min_x *= fontsize;
            max_x *= fontsize;
            (0.0, curpos)
        } else {
            min_y *= fontsize;
            max_y *= fontsize;
            (curpos * horz_scale, 0.0)
        };
        self.original_rect = (min_x, min_y, max_x, max_y);
        self.rect = self.text_rect();
        advance
    }

    /// Apply `m` after the object's current placement.
    pub fn transform(&mut self, m: Matrix) {
        let tm = mult_matrix(self.text_matrix(), m);
        match &mut self.kind {
            PageObjectKind::Text(text) => {
                text.pos = (tm.4, tm.5);
                self.text_state.make_mut().matrix = [tm.0, tm.2, tm.1, tm.3];
                self.rect = self.text_rect();
            }
            PageObjectKind::Path(p) => {
                p.matrix = mult_matrix(p.matrix, m);
                self.calc_bounding_box();
            }
            PageObjectKind::Image(image) => {
                image.matrix = mult_matrix(image.matrix, m);
                self.calc_bounding_box();
            }
            PageObjectKind::Shading(shading) => {
                shading.matrix = mult_matrix(shading.matrix, m);
                if self.clip_path.is_set() {
                    self.clip_path.make_mut().transform(m);
                    self.calc_bounding_box();
                } else {
                    self.rect = apply_matrix_rect(m, self.rect);
                }
            }
            PageObjectKind::Form(form) => {
                form.matrix = mult_matrix(form.matrix, m);
                self.calc_bounding_box();
            }
        }
        self.dirty = true;
    }

    /// Object matrix for kinds that have one.
    pub fn matrix(&self) -> Matrix {
        match &self.kind {
            PageObjectKind::Text(_) => self.text_matrix(),
            PageObjectKind::Path(p) => p.matrix,
            PageObjectKind::Image(i) => i.matrix,
            PageObjectKind::Shading(s) => s.matrix,
            PageObjectKind::Form(f) => f.matrix,
        }
    }

    /// Origin of a text run, or the matrix translation for other kinds.
    pub fn origin(&self) -> Point {
        match &self.kind {
            PageObjectKind::Text(text) => text.pos,
            _ => apply_matrix_pt(self.matrix(), (0.0, 0.0)),
        }
    }
}

impl Default for TextObject {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pos: (0.0, 0.0),
        }
    }
}

impl PathObject {
    pub fn new(path: Path, fill_type: FillType, stroke: bool) -> Self {
        Self {
            path,
            fill_type,
            stroke,
            matrix: MATRIX_IDENTITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::stock_font;
    use crate::model::path::PointType;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Path {
        let mut path = Path::new();
        path.append_point((x0, y0), PointType::Move);
        path.append_point((x1, y1), PointType::Line);
        path
    }

    #[test]
    fn hairline_stroke_is_inflated() {
        let mut obj = PageObject::new_path(line(0.0, 0.0, 10.0, 0.0), FillType::NoFill, true, MATRIX_IDENTITY);
        obj.graph_state.make_mut().line_width = 0.0;
        obj.calc_bounding_box();
        assert_eq!(obj.bbox(), (-0.5, -0.5, 10.5, 0.5));
    }

    #[test]
    fn path_transform_marks_dirty() {
        let mut obj = PageObject::new_path(line(0.0, 0.0, 10.0, 10.0), FillType::Winding, false, MATRIX_IDENTITY);
        obj.calc_bounding_box();
        assert!(!obj.is_dirty());
        obj.transform((2.0, 0.0, 0.0, 2.0, 5.0, 0.0));
        assert!(obj.is_dirty());
        assert_eq!(obj.bbox(), (5.0, 0.0, 25.0, 20.0));
    }

    #[test]
    fn text_advance_includes_spacing() {
        let mut obj = PageObject::new(
            PageObjectKind::Text(TextObject {
                items: vec![
                    TextItem::Glyph { code: 32, origin: 0.0 },
                    TextItem::Kerning(-500.0),
                    TextItem::Glyph { code: u32::from(b'A'), origin: 0.0 },
                ],
                pos: (0.0, 0.0),
            }),
            Some(0),
        );
        {
            let text = obj.text_state.make_mut();
            text.font = Some(stock_font("Helvetica"));
            text.font_size = 10.0;
            text.word_space = 2.0;
            text.char_space = 1.0;
        }
        let advance = obj.calc_text_position(1.0);
        // space 2.78 + Tw 2 + Tc 1, kerning +5, A 6.67 + Tc 1
        assert!((advance.0 - 18.45).abs() < 1e-9);
        let origins: Vec<f64> = obj
            .as_text()
            .unwrap()
            .items
            .iter()
            .filter_map(|i| match i {
                TextItem::Glyph { origin, .. } => Some(*origin),
                TextItem::Kerning(_) => None,
            })
            .collect();
        assert!((origins[1] - 10.78).abs() < 1e-9);
    }
}
