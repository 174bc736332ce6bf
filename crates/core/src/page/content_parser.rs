//! Resumable content parsing.
//!
//! [`ContentParser`] drives a [`ContentInterpreter`] over the content of a
//! page or a form in bounded slices. A caller that needs to stay
//! responsive calls [`ContentParser::continue_parse`] with a
//! [`PauseIndicator`] and comes back later; everything in between is kept
//! in the parser.
//!
//! Page content goes through these stages:
//!
//! 1. `FetchContent`: decode one `Contents` array entry per step
//! 2. `PrepareContent`: join the segments, one space after each
//! 3. `Parse`: feed the interpreter one slice per step
//! 4. `FinalizeClip`: Type 3 metrics, redundant clip removal, segment CTMs
//!
//! Forms skip straight to `Parse`.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::document::Document;
use crate::interp::interpreter::{ContentInterpreter, InterpreterSetup};
use crate::interp::states::AllStates;
use crate::model::objects::{PDFObject, PDFStream};
use crate::model::path::{FillType, Path};
use crate::model::state::BlendMode;
use crate::page::holder::{HolderKind, PageObjectHolder, ParseState};
use crate::utils::{
    MATRIX_IDENTITY, Matrix, RECT_EMPTY, apply_matrix_rect, mult_matrix, rect_contains,
};

/// Bytes handed to the interpreter per slice.
pub const DEFAULT_SLICE_BUDGET: usize = 4096;

/// Deepest form nesting that is still parsed.
pub const MAX_FORM_LEVEL: usize = 40;

/// Tuning for [`ContentParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Bytes interpreted between two pause checks. 0 parses everything in
    /// one slice.
    pub slice_budget: usize,
    /// Form nesting past this depth parses as empty.
    pub max_form_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            slice_budget: DEFAULT_SLICE_BUDGET,
            max_form_depth: MAX_FORM_LEVEL,
        }
    }
}

/// Asked between parse steps whether to hand control back.
pub trait PauseIndicator {
    fn need_to_pause_now(&self) -> bool;
}

/// Never pauses.
impl PauseIndicator for () {
    fn need_to_pause_now(&self) -> bool {
        false
    }
}

/// Nesting bookkeeping shared by a page parse and every form it draws.
#[derive(Debug, Clone, Default)]
pub struct RecursionState {
    /// Form streams whose content is being interpreted right now.
    pub(crate) active: FxHashSet<u32>,
    pub(crate) depth: usize,
    pub(crate) max_depth: usize,
}

impl RecursionState {
    pub fn new(max_depth: usize) -> Self {
        Self {
            active: FxHashSet::default(),
            depth: 0,
            max_depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_active(&self, stream_key: u32) -> bool {
        self.active.contains(&stream_key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    FetchContent,
    PrepareContent,
    Parse,
    FinalizeClip,
    Done,
}

/// Incremental parser for one page or form.
pub struct ContentParser<'a> {
    stage: Stage,
    doc: &'a Document,
    interp: ContentInterpreter<'a>,
    /// `Contents` array entries still to fetch, in order.
    pending: Vec<PDFObject>,
    next_pending: usize,
    segments: Vec<Vec<u8>>,
    data: Vec<u8>,
    offsets: Vec<usize>,
    cur: usize,
    slice_budget: usize,
}

impl<'a> ContentParser<'a> {
    /// Parser for a page whose `Contents` entry is `contents`.
    ///
    /// A single stream is decoded up front. Anything that is neither a
    /// stream nor a non-empty array leaves the holder parsed and empty.
    pub fn for_page(
        doc: &'a Document,
        holder: &'a mut PageObjectHolder,
        contents: Option<&PDFObject>,
        options: ParseOptions,
    ) -> Self {
        let setup = InterpreterSetup {
            page_resources: holder.page_resources().cloned(),
            resources: holder.resources().cloned(),
            bbox: holder.bbox(),
            ..InterpreterSetup::default()
        };
        holder.set_parse_state(ParseState::Parsing);
        let recursion = Rc::new(RefCell::new(RecursionState::new(options.max_form_depth)));
        let mut interp = ContentInterpreter::new(doc, holder, setup, recursion);
        interp.states_mut().color.make_mut().set_default();

        let mut parser = Self {
            stage: Stage::Done,
            doc,
            interp,
            pending: Vec::new(),
            next_pending: 0,
            segments: Vec::new(),
            data: Vec::new(),
            offsets: vec![0],
            cur: 0,
            slice_budget: options.slice_budget,
        };
        match contents.map(|c| doc.resolve(c)) {
            Some(PDFObject::Stream(stream)) => match doc.decode_stream(stream) {
                Ok(data) => {
                    parser.data = data;
                    parser.stage = Stage::Parse;
                }
                Err(err) => debug!(%err, "page contents cannot be decoded"),
            },
            Some(PDFObject::Array(items)) if !items.is_empty() => {
                parser.pending = items.clone();
                parser.stage = Stage::FetchContent;
            }
            other => debug!(kind = other.map(PDFObject::type_name), "page has no contents"),
        }
        if parser.stage == Stage::Done {
            parser.finish();
        }
        parser
    }

    /// Parser for a form or Type 3 glyph stream.
    ///
    /// `states` seeds the drawing records; its CTM is folded into the
    /// form matrix. `parent_matrix` maps form user space to the user space
    /// of the holder that receives the objects.
    pub fn for_form(
        doc: &'a Document,
        holder: &'a mut PageObjectHolder,
        stream: &PDFStream,
        states: Option<&AllStates>,
        parent_matrix: Option<Matrix>,
        recursion: Rc<RefCell<RecursionState>>,
        options: ParseOptions,
    ) -> Self {
        let mut form_matrix = stream
            .get("Matrix")
            .map(|m| doc.resolve(m).to_matrix())
            .unwrap_or(MATRIX_IDENTITY);
        if let Some(states) = states {
            form_matrix = mult_matrix(form_matrix, states.ctm);
        }

        let mut form_bbox = RECT_EMPTY;
        let mut clip = None;
        if let Some(bbox) = stream.get("BBox").and_then(|b| doc.resolve(b).to_rect()) {
            let mut path = Path::new();
            path.append_rect(bbox.0, bbox.1, bbox.2, bbox.3);
            path.transform(form_matrix);
            form_bbox = apply_matrix_rect(form_matrix, bbox);
            if let Some(parent) = parent_matrix {
                path.transform(parent);
                form_bbox = apply_matrix_rect(parent, form_bbox);
            }
            clip = Some(path);
        }

        let setup = InterpreterSetup {
            page_resources: holder.page_resources().cloned(),
            resources: holder.resources().cloned(),
            content_to_user: parent_matrix,
            bbox: form_bbox,
            states: states.cloned(),
            stream_key: stream.objid,
        };
        let group = holder.transparency().group;
        holder.set_parse_state(ParseState::Parsing);
        let mut interp = ContentInterpreter::new(doc, holder, setup, recursion);
        {
            let states = interp.states_mut();
            states.ctm = form_matrix;
            states.parent_matrix = form_matrix;
            if let Some(path) = clip {
                states
                    .clip_path
                    .make_mut()
                    .append_path_with_auto_merge(path, FillType::Winding);
            }
            if group {
                let general = states.general.make_mut();
                general.blend_mode = BlendMode::Normal;
                general.set_stroke_alpha(1.0);
                general.set_fill_alpha(1.0);
                general.soft_mask = None;
            }
        }

        let data = doc.decode_stream(stream).unwrap_or_else(|err| {
            debug!(objid = ?stream.objid, %err, "form content cannot be decoded");
            Vec::new()
        });
        Self {
            stage: Stage::Parse,
            doc,
            interp,
            pending: Vec::new(),
            next_pending: 0,
            segments: Vec::new(),
            data,
            offsets: vec![0],
            cur: 0,
            slice_budget: options.slice_budget,
        }
    }

    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Run stages until the content is exhausted or `pause` asks to stop.
    /// Returns whether more work remains.
    pub fn continue_parse(&mut self, pause: Option<&dyn PauseIndicator>) -> bool {
        while self.stage != Stage::Done {
            self.stage = match self.stage {
                Stage::FetchContent => self.fetch_content(),
                Stage::PrepareContent => self.prepare_content(),
                Stage::Parse => self.parse_slice(),
                Stage::FinalizeClip => self.finalize_clip(),
                Stage::Done => Stage::Done,
            };
            if pause.is_some_and(|p| p.need_to_pause_now()) {
                trace!(stage = ?self.stage, offset = self.cur, "parse paused");
                break;
            }
        }
        self.stage != Stage::Done
    }

    /// Parse everything without pausing.
    pub fn parse_to_end(&mut self) {
        while self.continue_parse(None) {}
    }

    fn fetch_content(&mut self) -> Stage {
        let Some(entry) = self.pending.get(self.next_pending) else {
            return Stage::PrepareContent;
        };
        let doc = self.doc;
        let data = match doc.resolve(entry) {
            PDFObject::Stream(stream) => doc.decode_stream(stream).unwrap_or_else(|err| {
                debug!(index = self.next_pending, %err, "content segment cannot be decoded");
                Vec::new()
            }),
            other => {
                debug!(
                    index = self.next_pending,
                    kind = other.type_name(),
                    "content segment is not a stream"
                );
                Vec::new()
            }
        };
        self.segments.push(data);
        self.next_pending += 1;
        if self.next_pending == self.pending.len() {
            Stage::PrepareContent
        } else {
            Stage::FetchContent
        }
    }

    fn prepare_content(&mut self) -> Stage {
        let total = self.segments.iter().map(|s| s.len() + 1).sum();
        let mut data = Vec::with_capacity(total);
        self.offsets.clear();
        for segment in self.segments.drain(..) {
            self.offsets.push(data.len());
            data.extend_from_slice(&segment);
            data.push(b' ');
        }
        self.data = data;
        self.pending.clear();
        self.cur = 0;
        Stage::Parse
    }

    fn parse_slice(&mut self) -> Stage {
        if self.cur >= self.data.len() {
            return Stage::FinalizeClip;
        }
        let consumed = self
            .interp
            .parse(&self.data, self.cur, self.slice_budget, &self.offsets);
        trace!(start = self.cur, consumed, "parsed slice");
        // An interpreter that made no progress would spin forever.
        self.cur = if consumed == 0 {
            self.data.len()
        } else {
            self.cur + consumed
        };
        if self.cur >= self.data.len() {
            Stage::FinalizeClip
        } else {
            Stage::Parse
        }
    }

    fn finalize_clip(&mut self) -> Stage {
        let type3 = self.interp.type3_data();
        let holder = self.interp.holder_mut();
        if holder.kind() == HolderKind::Type3Char {
            holder.set_type3_data(type3);
        }
        for obj in holder.iter_mut() {
            if !obj.clip_path.is_set() || obj.is_shading() {
                continue;
            }
            let clip = obj.clip_path.get();
            if clip.path_count() != 1 || clip.text_count() != 0 {
                continue;
            }
            let Some(clip_rect) = clip.paths()[0].0.rect() else {
                continue;
            };
            if rect_contains(clip_rect, obj.bbox()) {
                obj.clip_path.clear();
            }
        }
        self.finish();
        Stage::Done
    }

    fn finish(&mut self) {
        let ctms = self.interp.take_all_ctms();
        let holder = self.interp.holder_mut();
        holder.set_all_ctms(ctms);
        holder.set_parse_state(ParseState::Parsed);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::model::objects::Dictionary;

    struct PauseEvery(Cell<usize>);

    impl PauseIndicator for PauseEvery {
        fn need_to_pause_now(&self) -> bool {
            self.0.set(self.0.get() + 1);
            true
        }
    }

    fn ints(values: &[i64]) -> PDFObject {
        PDFObject::Array(values.iter().map(|v| PDFObject::Int(*v)).collect())
    }

    fn content_stream(doc: &mut Document, data: &[u8]) -> PDFObject {
        PDFObject::Ref(doc.add_object(PDFObject::Stream(Box::new(PDFStream::new(
            Dictionary::new(),
            data.to_vec(),
        )))))
    }

    #[test]
    fn array_contents_keep_segment_offsets() {
        let mut doc = Document::new();
        let first = content_stream(&mut doc, b"0 0 m 10 10 l S");
        let second = content_stream(&mut doc, b"2 0 0 2 0 0 cm 0 0 5 5 re f");
        let contents = PDFObject::Array(vec![first, second]);
        let mut holder = PageObjectHolder::new(HolderKind::Page, None);
        {
            let mut parser =
                ContentParser::for_page(&doc, &mut holder, Some(&contents), ParseOptions::default());
            parser.parse_to_end();
            assert!(parser.is_done());
        }
        assert_eq!(holder.parse_state(), ParseState::Parsed);
        let segments: Vec<_> = holder.iter().map(|o| o.content_stream()).collect();
        assert_eq!(segments, vec![Some(0), Some(1)]);
        assert_eq!(holder.ctm_at_start_of(Some(1)), MATRIX_IDENTITY);
        assert_eq!(holder.ctm_at_end_of(1), (2.0, 0.0, 0.0, 2.0, 0.0, 0.0));
    }

    #[test]
    fn pause_is_honored_between_steps() {
        let mut doc = Document::new();
        let segment = content_stream(&mut doc, b"0 0 m 10 10 l S 0 0 m 20 20 l S");
        let contents = PDFObject::Array(vec![segment.clone(), segment]);
        let mut holder = PageObjectHolder::new(HolderKind::Page, None);
        let pause = PauseEvery(Cell::new(0));
        let options = ParseOptions {
            slice_budget: 8,
            ..ParseOptions::default()
        };
        {
            let mut parser = ContentParser::for_page(&doc, &mut holder, Some(&contents), options);
            let mut rounds = 0;
            while parser.continue_parse(Some(&pause)) {
                rounds += 1;
            }
            // Two fetches, one join, several slices and the final pass.
            assert!(rounds > 5);
        }
        assert_eq!(holder.len(), 4);
    }

    #[test]
    fn missing_contents_finish_immediately() {
        let doc = Document::new();
        let mut holder = PageObjectHolder::new(HolderKind::Page, None);
        {
            let mut parser =
                ContentParser::for_page(&doc, &mut holder, None, ParseOptions::default());
            assert!(parser.is_done());
            assert!(!parser.continue_parse(None));
        }
        assert_eq!(holder.parse_state(), ParseState::Parsed);
        assert!(holder.is_empty());
    }

    #[test]
    fn undecodable_contents_produce_nothing() {
        let mut doc = Document::new();
        let mut attrs = Dictionary::new();
        attrs.insert("Filter".into(), PDFObject::Name("NoSuchDecode".into()));
        let stream = doc.add_object(PDFObject::Stream(Box::new(PDFStream::new(
            attrs,
            b"0 0 m 1 1 l S".to_vec(),
        ))));
        let mut holder = PageObjectHolder::new(HolderKind::Page, None);
        {
            let mut parser = ContentParser::for_page(
                &doc,
                &mut holder,
                Some(&PDFObject::Ref(stream)),
                ParseOptions::default(),
            );
            parser.parse_to_end();
        }
        assert!(holder.is_empty());
    }

    #[test]
    fn enclosing_rect_clip_is_dropped() {
        let mut doc = Document::new();
        let contents = content_stream(
            &mut doc,
            b"q 0 0 100 100 re W n 10 10 20 20 re f Q q 0 0 15 15 re W n 10 10 20 20 re f Q",
        );
        let mut holder = PageObjectHolder::new(HolderKind::Page, None);
        ContentParser::for_page(&doc, &mut holder, Some(&contents), ParseOptions::default())
            .parse_to_end();
        assert_eq!(holder.len(), 2);
        assert!(!holder.get(0).unwrap().clip_path.is_set());
        assert!(holder.get(1).unwrap().clip_path.is_set());
    }

    #[test]
    fn form_bbox_becomes_clip() {
        let doc = Document::new();
        let mut attrs = Dictionary::new();
        attrs.insert("BBox".into(), ints(&[0, 0, 10, 10]));
        attrs.insert("Matrix".into(), ints(&[2, 0, 0, 2, 5, 5]));
        let stream = PDFStream::new(attrs, b"0 0 m 50 50 l S".to_vec());
        let mut holder = PageObjectHolder::new(HolderKind::Form, None);
        let recursion = Rc::new(RefCell::new(RecursionState::new(MAX_FORM_LEVEL)));
        ContentParser::for_form(
            &doc,
            &mut holder,
            &stream,
            None,
            None,
            recursion,
            ParseOptions::default(),
        )
        .parse_to_end();
        let obj = holder.get(0).unwrap();
        assert_eq!(obj.clip_path.get().clip_box(), (5.0, 5.0, 25.0, 25.0));
        assert_eq!(obj.as_path().unwrap().matrix, (2.0, 0.0, 0.0, 2.0, 5.0, 5.0));
    }

    #[test]
    fn type3_glyph_metrics_are_kept() {
        let doc = Document::new();
        let stream = PDFStream::new(
            Dictionary::new(),
            b"500 0 0 -10 450 700 d1 0 0 m 1 1 l f".to_vec(),
        );
        let mut holder = PageObjectHolder::new(HolderKind::Type3Char, None);
        let recursion = Rc::new(RefCell::new(RecursionState::new(MAX_FORM_LEVEL)));
        ContentParser::for_form(
            &doc,
            &mut holder,
            &stream,
            None,
            None,
            recursion,
            ParseOptions::default(),
        )
        .parse_to_end();
        let data = holder.type3_data().unwrap();
        assert!(!data.colored);
        assert_eq!(data.values, [500.0, 0.0, 0.0, -10.0, 450.0, 700.0]);
    }
}
