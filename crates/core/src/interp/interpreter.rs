//! Content stream interpreter.
//!
//! [`ContentInterpreter`] reads elements from a decoded content buffer,
//! collects operands and runs the operator handlers found in
//! [`super::ops`]. Every painted object is appended to a
//! [`PageObjectHolder`]. One interpreter serves a page or a form across any
//! number of [`ContentInterpreter::parse`] calls; each nested form gets its
//! own interpreter sharing the same [`RecursionState`].

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::document::Document;
use crate::font::{DEFAULT_FONT_NAME, PdfFont, load_font, stock_font};
use crate::interp::operands::{Operand, OperandBuffer};
use crate::interp::operators::Operator;
use crate::interp::states::AllStates;
use crate::model::color::{ColorSpaceFamily, PDFColorSpace};
use crate::model::marks::ContentMarksStack;
use crate::model::objects::{Dictionary, PDFObject, PDFStream};
use crate::model::path::{FillType, PathPoint};
use crate::model::pattern::{Pattern, ShadingPattern};
use crate::page::content_parser::RecursionState;
use crate::page::holder::{PageObjectHolder, Type3Data};
use crate::page::object::{PageObject, PageObjectKind};
use crate::parser::lexer::{ContentLexer, Element};
use crate::utils::{MATRIX_IDENTITY, Matrix, Point, Rect};

/// Where an interpreter starts: resources, transforms and inherited state.
#[derive(Debug, Clone, Default)]
pub struct InterpreterSetup {
    /// Resources of the page the content ends up on.
    pub page_resources: Option<Arc<Dictionary>>,
    /// Resources searched first (the form's own, its parent's, or the page's).
    pub resources: Option<Arc<Dictionary>>,
    /// Content space to holder user space. Identity when absent.
    pub content_to_user: Option<Matrix>,
    /// Box used for shadings painted without a clip.
    pub bbox: Rect,
    /// State inherited from the enclosing content. Fresh defaults when absent.
    pub states: Option<AllStates>,
    /// Object number of the form stream being parsed.
    pub stream_key: Option<u32>,
}

pub struct ContentInterpreter<'a> {
    pub(crate) doc: &'a Document,
    pub(crate) holder: &'a mut PageObjectHolder,
    pub(crate) page_resources: Option<Arc<Dictionary>>,
    pub(crate) resources: Option<Arc<Dictionary>>,
    pub(crate) content_to_user: Matrix,
    pub(crate) bbox: Rect,
    pub(crate) recursion: Rc<RefCell<RecursionState>>,
    stream_key: Option<u32>,

    pub(crate) states: AllStates,
    pub(crate) state_stack: Vec<AllStates>,
    pub(crate) operands: OperandBuffer,
    pub(crate) marks: ContentMarksStack,
    /// Text objects painted in a clipping render mode since `BT`.
    pub(crate) clip_texts: Vec<PageObject>,

    pub(crate) path_points: Vec<PathPoint>,
    pub(crate) path_start: Point,
    pub(crate) path_current: Point,
    /// Rule of a pending `W`/`W*`; `NoFill` when none is pending.
    pub(crate) path_clip_type: FillType,

    pub(crate) last_image: Option<(String, Arc<PDFStream>)>,
    pub(crate) type3_data: [f64; 6],
    pub(crate) colored: bool,
    pub(crate) resource_missing: bool,
    font_cache: FxHashMap<u32, Arc<dyn PdfFont>>,

    segment_offsets: Vec<usize>,
    current_segment: usize,
    all_ctms: BTreeMap<usize, Matrix>,
    slice_start: usize,
    syntax_pos: usize,
}

impl<'a> ContentInterpreter<'a> {
    pub fn new(
        doc: &'a Document,
        holder: &'a mut PageObjectHolder,
        setup: InterpreterSetup,
        recursion: Rc<RefCell<RecursionState>>,
    ) -> Self {
        Self {
            doc,
            holder,
            page_resources: setup.page_resources,
            resources: setup.resources,
            content_to_user: setup.content_to_user.unwrap_or(MATRIX_IDENTITY),
            bbox: setup.bbox,
            recursion,
            stream_key: setup.stream_key,
            states: setup.states.unwrap_or_else(AllStates::with_defaults),
            state_stack: Vec::new(),
            operands: OperandBuffer::new(),
            marks: ContentMarksStack::default(),
            clip_texts: Vec::new(),
            path_points: Vec::new(),
            path_start: (0.0, 0.0),
            path_current: (0.0, 0.0),
            path_clip_type: FillType::NoFill,
            last_image: None,
            type3_data: [0.0; 6],
            colored: false,
            resource_missing: false,
            font_cache: FxHashMap::default(),
            segment_offsets: vec![0],
            current_segment: 0,
            all_ctms: BTreeMap::new(),
            slice_start: 0,
            syntax_pos: 0,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn holder(&self) -> &PageObjectHolder {
        self.holder
    }

    pub fn holder_mut(&mut self) -> &mut PageObjectHolder {
        self.holder
    }

    pub fn states(&self) -> &AllStates {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut AllStates {
        &mut self.states
    }

    /// Whether a resource named by the content could not be found.
    pub fn resource_missing(&self) -> bool {
        self.resource_missing
    }

    /// `d0`/`d1` operands seen so far.
    pub fn type3_data(&self) -> Type3Data {
        Type3Data {
            colored: self.colored,
            values: self.type3_data,
        }
    }

    /// CTM at the end of every segment parsed so far.
    pub fn take_all_ctms(&mut self) -> BTreeMap<usize, Matrix> {
        std::mem::take(&mut self.all_ctms)
    }

    // ========================================================================
    // Parse loop
    // ========================================================================

    /// Interpret `data[start..]` until `max_cost` bytes have been consumed
    /// (0 means no limit) or the data ends. Returns the bytes consumed.
    ///
    /// `segment_offsets` holds the start of every concatenated stream in
    /// `data`; objects are tagged with the segment they were painted in.
    pub fn parse(
        &mut self,
        data: &[u8],
        start: usize,
        max_cost: usize,
        segment_offsets: &[usize],
    ) -> usize {
        {
            let mut recursion = self.recursion.borrow_mut();
            if recursion.depth > recursion.max_depth {
                warn!(depth = recursion.depth, "form nesting too deep, skipping content");
                return data.len();
            }
            if let Some(key) = self.stream_key
                && recursion.active.contains(&key)
            {
                debug!(objid = key, "form draws itself, skipping content");
                return data.len();
            }
            recursion.depth += 1;
            if let Some(key) = self.stream_key {
                recursion.active.insert(key);
            }
        }

        if !segment_offsets.is_empty() && self.segment_offsets != segment_offsets {
            self.segment_offsets = segment_offsets.to_vec();
        }
        let consumed = self.parse_elements(data, start, max_cost);

        let mut recursion = self.recursion.borrow_mut();
        recursion.depth -= 1;
        if let Some(key) = self.stream_key {
            recursion.active.remove(&key);
        }
        consumed
    }

    fn parse_elements(&mut self, data: &[u8], start: usize, max_cost: usize) -> usize {
        let Some(slice) = data.get(start..) else {
            return 0;
        };
        self.slice_start = start;
        let mut lexer = ContentLexer::new(slice);
        loop {
            let cost = lexer.tell();
            if max_cost != 0 && cost >= max_cost {
                trace!(start, cost, "slice budget reached");
                return cost;
            }
            let element = lexer.next_element();
            self.sync_position(&lexer);
            match element {
                Element::EndOfData => {
                    self.record_remaining_ctms();
                    return lexer.tell();
                }
                Element::Keyword(word) => {
                    match Operator::from_keyword(word) {
                        Some(op) => self.dispatch_operator(op, &mut lexer),
                        None => trace!(keyword = %String::from_utf8_lossy(word), "unknown operator"),
                    }
                    self.operands.clear();
                }
                Element::Number(number) => self.operands.push(Operand::Number(number)),
                Element::Name(name) => self.operands.push(Operand::Name(name)),
                Element::Object(obj) => self.operands.push(Operand::Object(obj)),
            }
        }
    }

    /// Track the lexer position and close any segment it has moved past.
    pub(crate) fn sync_position(&mut self, lexer: &ContentLexer<'_>) {
        self.syntax_pos = self.slice_start + lexer.tell();
        let Some(segment) = self.current_stream_index() else {
            return;
        };
        while self.current_segment < segment {
            self.all_ctms.insert(self.current_segment, self.states.ctm);
            self.current_segment += 1;
        }
    }

    fn record_remaining_ctms(&mut self) {
        let last = self.segment_offsets.len().saturating_sub(1);
        for segment in self.current_segment..=last {
            self.all_ctms.insert(segment, self.states.ctm);
        }
        self.current_segment = last;
    }

    /// Segment containing the current parse position.
    pub(crate) fn current_stream_index(&self) -> Option<usize> {
        self.segment_offsets
            .partition_point(|&offset| offset <= self.syntax_pos)
            .checked_sub(1)
    }

    fn dispatch_operator(&mut self, op: Operator, lexer: &mut ContentLexer<'_>) {
        let count = self.operands.len();
        match op {
            // Graphics state
            Operator::SaveState => self.do_q(),
            Operator::RestoreState => self.do_Q(),
            Operator::ConcatMatrix => {
                if count == 6 {
                    self.do_cm(self.operands.matrix());
                }
            }
            Operator::LineWidth => self.do_w(self.operands.number(0)),
            Operator::LineCap => self.do_J(self.operands.integer(0)),
            Operator::LineJoin => self.do_j(self.operands.integer(0)),
            Operator::MiterLimit => self.do_M(self.operands.number(0)),
            Operator::Dash => self.do_d(self.operands.object(1), self.operands.number(0)),
            Operator::RenderingIntent => self.do_ri(&self.operands.string(0)),
            Operator::Flatness => self.do_i(self.operands.number(0)),
            Operator::ExtGState => self.do_gs(&self.operands.string(0)),

            // Color
            Operator::StrokeColorSpace => self.do_CS(&self.operands.string(0)),
            Operator::FillColorSpace => self.do_cs(&self.operands.string(0)),
            Operator::StrokeColor => self.do_SC(&self.operands.numbers(count.min(4))),
            Operator::FillColor => self.do_sc(&self.operands.numbers(count.min(4))),
            Operator::StrokeColorN => self.do_SCN(),
            Operator::FillColorN => self.do_scn(),
            Operator::StrokeGray => {
                if count >= 1 {
                    self.do_G(self.operands.number(0));
                }
            }
            Operator::FillGray => {
                if count >= 1 {
                    self.do_g(self.operands.number(0));
                }
            }
            Operator::StrokeRGB => {
                if count == 3 {
                    self.do_RG(&self.operands.numbers(3));
                }
            }
            Operator::FillRGB => {
                if count == 3 {
                    self.do_rg(&self.operands.numbers(3));
                }
            }
            Operator::StrokeCMYK => {
                if count == 4 {
                    self.do_K(&self.operands.numbers(4));
                }
            }
            Operator::FillCMYK => {
                if count == 4 {
                    self.do_k(&self.operands.numbers(4));
                }
            }

            // Path construction
            Operator::MoveTo => {
                if count == 2 {
                    self.do_m(self.operands.point(0));
                    self.parse_path_object(lexer);
                }
            }
            Operator::LineTo => {
                if count == 2 {
                    self.do_l(self.operands.point(0));
                }
            }
            Operator::CurveTo => {
                if count == 6 {
                    let (p1, p2, p3) = (
                        self.operands.point(4),
                        self.operands.point(2),
                        self.operands.point(0),
                    );
                    self.do_c(p1, p2, p3);
                }
            }
            Operator::CurveToV => {
                if count == 4 {
                    self.do_v(self.operands.point(2), self.operands.point(0));
                }
            }
            Operator::CurveToY => {
                if count == 4 {
                    self.do_y(self.operands.point(2), self.operands.point(0));
                }
            }
            Operator::ClosePath => self.do_h(),
            Operator::Rectangle => {
                let (x, y) = self.operands.point(2);
                let (w, h) = self.operands.point(0);
                self.do_re(x, y, w, h);
            }

            // Path painting and clipping
            Operator::Stroke => self.do_S(),
            Operator::CloseStroke => self.do_s(),
            Operator::Fill => self.do_f(),
            Operator::FillOld => self.do_F(),
            Operator::FillEvenOdd => self.do_f_star(),
            Operator::FillStroke => self.do_B(),
            Operator::FillStrokeEvenOdd => self.do_B_star(),
            Operator::CloseFillStroke => self.do_b(),
            Operator::CloseFillStrokeEvenOdd => self.do_b_star(),
            Operator::EndPath => self.do_n(),
            Operator::Clip => self.do_W(),
            Operator::ClipEvenOdd => self.do_W_star(),

            // Text
            Operator::BeginText => self.do_BT(),
            Operator::EndText => self.do_ET(),
            Operator::CharSpace => self.do_Tc(self.operands.number(0)),
            Operator::WordSpace => self.do_Tw(self.operands.number(0)),
            Operator::HorzScale => {
                if count == 1 {
                    self.do_Tz(self.operands.number(0));
                }
            }
            Operator::Leading => self.do_TL(self.operands.number(0)),
            Operator::Font => self.do_Tf(&self.operands.string(1), self.operands.number(0)),
            Operator::RenderMode => self.do_Tr(self.operands.integer(0)),
            Operator::Rise => self.do_Ts(self.operands.number(0)),
            Operator::MoveText => self.do_Td(self.operands.point(0)),
            Operator::MoveTextSetLeading => self.do_TD(self.operands.point(0)),
            Operator::TextMatrix => self.do_Tm(self.operands.matrix()),
            Operator::NextLine => self.do_T_star(),
            Operator::ShowText => self.do_Tj(&self.operands.bytes(0)),
            Operator::ShowTextPositioned => self.do_TJ(self.operands.object(0)),
            Operator::NextLineShowText => self.do_quote(&self.operands.bytes(0)),
            Operator::NextLineShowTextSpacing => {
                if count == 3 {
                    let (word_space, char_space) = self.operands.point(1);
                    self.do_doublequote(word_space, char_space, &self.operands.bytes(0));
                }
            }

            // Type 3 glyph metrics
            Operator::CharWidth => self.do_d0(self.operands.number(1), self.operands.number(0)),
            Operator::CacheDevice => self.do_d1(&self.operands.numbers(6)),

            // XObjects, images and shadings
            Operator::XObject => self.do_Do(self.operands.string(0)),
            Operator::Shade => self.do_sh(&self.operands.string(0)),
            Operator::BeginImage => self.do_BI(lexer),
            Operator::ImageData | Operator::EndImage => {}

            // Marked content and compatibility sections
            Operator::BeginMarked => self.do_BMC(&self.operands.string(0)),
            Operator::BeginMarkedProperties => {
                self.do_BDC(&self.operands.string(1), self.operands.object(0));
            }
            Operator::EndMarked => self.do_EMC(),
            Operator::MarkPoint
            | Operator::MarkPointProperties
            | Operator::BeginCompat
            | Operator::EndCompat => {}
        }
    }

    // ========================================================================
    // Shared helpers for the operator handlers
    // ========================================================================

    /// A new object tagged with the current segment.
    pub(crate) fn new_object(&self, kind: PageObjectKind) -> PageObject {
        PageObject::new(kind, self.current_stream_index())
    }

    /// Snapshot the current state into `obj`. The general state, clip and
    /// marks are always copied; the other records only when asked for.
    pub(crate) fn set_graphic_states(
        &self,
        obj: &mut PageObject,
        color: bool,
        text: bool,
        graph: bool,
    ) {
        obj.general_state = self.states.general.clone();
        obj.clip_path = self.states.clip_path.clone();
        obj.marks = self.marks.top().clone();
        if color {
            obj.color_state = self.states.color.clone();
        }
        if graph {
            obj.graph_state = self.states.graph.clone();
        }
        if text {
            obj.text_state = self.states.text.clone();
        }
    }

    // ========================================================================
    // Resource lookup
    // ========================================================================

    /// Category dictionary (`Font`, `XObject`, ...) of the searched
    /// resources, falling back to the page resources only when the searched
    /// resources have no such category.
    pub(crate) fn find_resource_holder(&self, kind: &str) -> Option<&'_ Dictionary> {
        let doc = self.doc;
        let resources = self.resources.as_ref()?;
        if let Some(dict) = doc.dict_get_dict(resources, kind) {
            return Some(dict);
        }
        let page = self.page_resources.as_ref()?;
        if Arc::ptr_eq(resources, page) {
            return None;
        }
        doc.dict_get_dict(page, kind)
    }

    /// Raw resource entry (often a reference) for `name` in category `kind`.
    pub(crate) fn find_resource_entry(&self, kind: &str, name: &str) -> Option<PDFObject> {
        self.find_resource_holder(kind)?
            .get(name)
            .filter(|obj| !self.doc.resolve(obj).is_null())
            .cloned()
    }

    /// Font resource `name`; a missing resource yields the stock font.
    pub(crate) fn find_font(&mut self, name: &str) -> Option<Arc<dyn PdfFont>> {
        let doc = self.doc;
        let entry = self
            .find_resource_entry("Font", name)
            .filter(|entry| doc.resolve(entry).as_dict().is_ok());
        let Some(entry) = entry else {
            debug!(name, fallback = DEFAULT_FONT_NAME, "font resource missing");
            self.resource_missing = true;
            return Some(stock_font(DEFAULT_FONT_NAME));
        };
        self.load_font_entry(&entry)
    }

    /// Load a font from a reference or direct dictionary, caching
    /// indirect fonts by object number.
    pub(crate) fn load_font_entry(&mut self, entry: &PDFObject) -> Option<Arc<dyn PdfFont>> {
        let doc = self.doc;
        let objid = entry.as_ref().ok().map(|r| r.objid);
        if let Some(objid) = objid
            && let Some(font) = self.font_cache.get(&objid)
        {
            return Some(Arc::clone(font));
        }
        let dict = doc.resolve(entry).as_dict().ok()?;
        let font = load_font(doc, dict, objid)?;
        if let Some(objid) = objid {
            self.font_cache.insert(objid, Arc::clone(&font));
        }
        Some(font)
    }

    /// Color space for `cs`/`CS`. Device names honor a `Default*`
    /// resource override.
    pub(crate) fn find_color_space(&mut self, name: &str) -> Option<Arc<PDFColorSpace>> {
        if name == "Pattern" {
            return Some(PDFColorSpace::stock(ColorSpaceFamily::Pattern));
        }
        let device = match name {
            "DeviceGray" => Some(ColorSpaceFamily::DeviceGray),
            "DeviceRGB" => Some(ColorSpaceFamily::DeviceRGB),
            "DeviceCMYK" => Some(ColorSpaceFamily::DeviceCMYK),
            _ => None,
        };
        if let Some(family) = device {
            let default_name = format!("Default{}", &name["Device".len()..]);
            return match self.find_resource_entry("ColorSpace", &default_name) {
                Some(obj) => PDFColorSpace::load(&obj, self.doc),
                None => Some(PDFColorSpace::stock(family)),
            };
        }
        let Some(obj) = self.find_resource_entry("ColorSpace", name) else {
            debug!(name, "color space resource missing");
            self.resource_missing = true;
            return None;
        };
        PDFColorSpace::load(&obj, self.doc)
    }

    pub(crate) fn find_pattern(&mut self, name: &str) -> Option<Arc<Pattern>> {
        let doc = self.doc;
        let entry = self
            .find_resource_entry("Pattern", name)
            .filter(|obj| doc.resolve(obj).as_dict().is_ok());
        let Some(entry) = entry else {
            debug!(name, "pattern resource missing");
            self.resource_missing = true;
            return None;
        };
        Pattern::load(&entry, self.states.parent_matrix, doc).map(Arc::new)
    }

    pub(crate) fn find_shading(&mut self, name: &str) -> Option<Arc<ShadingPattern>> {
        let doc = self.doc;
        let entry = self
            .find_resource_entry("Shading", name)
            .filter(|obj| doc.resolve(obj).as_dict().is_ok());
        let Some(entry) = entry else {
            debug!(name, "shading resource missing");
            self.resource_missing = true;
            return None;
        };
        Some(Arc::new(ShadingPattern::load(
            &entry,
            self.states.parent_matrix,
            true,
            doc,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::path::PointType;
    use crate::page::holder::HolderKind;

    fn run(content: &[u8]) -> PageObjectHolder {
        let doc = Document::new();
        let mut holder = PageObjectHolder::new(HolderKind::Page, None);
        {
            let recursion = Rc::new(RefCell::new(RecursionState::new(40)));
            let mut interp =
                ContentInterpreter::new(&doc, &mut holder, InterpreterSetup::default(), recursion);
            interp.parse(content, 0, 0, &[0]);
        }
        holder
    }

    #[test]
    fn unknown_operators_clear_operands() {
        let holder = run(b"1 2 3 foo 0 0 m 10 0 l S");
        assert_eq!(holder.len(), 1);
        let path = holder.get(0).unwrap().as_path().unwrap();
        assert_eq!(path.path.points()[0].point, (0.0, 0.0));
    }

    #[test]
    fn move_fast_path_reads_following_segments() {
        let holder = run(b"10 10 m 20 10 l 20 20 l h f");
        let path = holder.get(0).unwrap().as_path().unwrap();
        let kinds: Vec<_> = path.path.points().iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![PointType::Move, PointType::Line, PointType::Line, PointType::Line]
        );
        assert!(path.path.points()[3].close);
        assert_eq!(path.fill_type, FillType::Winding);
    }

    #[test]
    fn budget_stops_between_elements() {
        let doc = Document::new();
        let mut holder = PageObjectHolder::new(HolderKind::Page, None);
        let recursion = Rc::new(RefCell::new(RecursionState::new(40)));
        let mut interp =
            ContentInterpreter::new(&doc, &mut holder, InterpreterSetup::default(), recursion);
        let data = b"q 1 0 0 1 5 5 cm Q q Q";
        // Stops at the first element boundary past four bytes: "q 1 0".
        let consumed = interp.parse(data, 0, 4, &[0]);
        assert_eq!(consumed, 5);
        let rest = interp.parse(data, consumed, 0, &[0]);
        assert_eq!(consumed + rest, data.len());
    }

    #[test]
    fn segment_ctms_are_recorded() {
        let doc = Document::new();
        let mut holder = PageObjectHolder::new(HolderKind::Page, None);
        let recursion = Rc::new(RefCell::new(RecursionState::new(40)));
        let mut interp =
            ContentInterpreter::new(&doc, &mut holder, InterpreterSetup::default(), recursion);
        let data = b"2 0 0 2 0 0 cm  0 0 m 1 1 l S ";
        interp.parse(data, 0, 0, &[0, 16]);
        let ctms = interp.take_all_ctms();
        assert_eq!(ctms.get(&0), Some(&(2.0, 0.0, 0.0, 2.0, 0.0, 0.0)));
        assert_eq!(ctms.get(&1), Some(&(2.0, 0.0, 0.0, 2.0, 0.0, 0.0)));
        assert_eq!(holder.get(0).unwrap().content_stream(), Some(1));
    }
}
