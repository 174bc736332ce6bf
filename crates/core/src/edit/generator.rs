//! Regenerate content streams from edited page objects.
//!
//! Only dirty segments are rewritten. Each rewritten segment undoes the
//! CTM it inherits, draws its objects in user space inside `q`/`Q`, and
//! finally re-applies the CTM change the original segment made so later
//! segments still see the transform they were written for. Objects that
//! belong to no segment go into a new stream appended to the page.

use std::collections::BTreeSet;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use tracing::{debug, trace};

use crate::document::Document;
use crate::edit::content_manager::ContentManager;
use crate::edit::writer::ContentWriter;
use crate::error::{PdfError, Result};
use crate::font::PdfFont;
use crate::model::marks::{ContentMarks, MarkParams};
use crate::model::objects::{Dictionary, PDFObjRef, PDFObject, PDFStream};
use crate::model::path::{FillType, Path, PointType};
use crate::model::state::{BlendMode, GraphState, LineCap, LineJoin, TextRenderingMode};
use crate::page::holder::{GraphicsKey, PageObjectHolder};
use crate::page::object::{PageObject, PageObjectKind, PathObject, TextItem, TextObject};
use crate::utils::{MATRIX_IDENTITY, Matrix, Point, invert_matrix, is_near_identity, mult_matrix};

/// Resource name prefixes, `FX` + prefix + counter.
const GRAPHICS_PREFIX: &str = "E";
const FONT_PREFIX: &str = "F";
const XOBJECT_PREFIX: &str = "X";
const SHADING_PREFIX: &str = "S";

const DEFAULT_GRAPHICS: (f64, f64, BlendMode) = (1.0, 1.0, BlendMode::Normal);

/// Writes the objects of a holder back into its content streams.
pub struct ContentGenerator<'a> {
    doc: &'a mut Document,
    holder: &'a mut PageObjectHolder,
    resources_changed: bool,
}

impl<'a> ContentGenerator<'a> {
    pub fn new(doc: &'a mut Document, holder: &'a mut PageObjectHolder) -> Self {
        Self {
            doc,
            holder,
            resources_changed: false,
        }
    }

    /// Rewrite every segment touched since parsing and store objects
    /// created by the caller in a new segment.
    ///
    /// A form or glyph holder has a single stream, which is rewritten as a
    /// whole.
    pub fn generate_content(&mut self) -> Result<()> {
        if !self.holder.is_page() {
            return self.generate_stream_content();
        }

        let mut dirty: BTreeSet<usize> = self.holder.take_dirty_streams();
        dirty.extend(
            self.holder
                .iter()
                .filter(|obj| obj.is_dirty())
                .filter_map(PageObject::content_stream),
        );
        let synthetic: Vec<usize> = self.indices_in(None);

        let mut rewritten = Vec::with_capacity(dirty.len());
        for segment in dirty {
            let indices = self.indices_in(Some(segment));
            if indices.is_empty() {
                debug!(segment, "segment has no objects left");
                rewritten.push((segment, String::new()));
                continue;
            }
            let start = self.holder.ctm_at_start_of(Some(segment));
            let end = self.holder.ctm_at_end_of(segment);
            rewritten.push((segment, self.segment_content(&indices, start, Some(end))));
        }
        let appended = if synthetic.is_empty() {
            None
        } else {
            let start = self.holder.ctm_at_start_of(None);
            Some((start, self.segment_content(&synthetic, start, None)))
        };

        {
            let mut manager = ContentManager::new(&mut *self.doc, &*self.holder)?;
            for (segment, content) in rewritten {
                manager.update_stream(segment, content.into_bytes())?;
            }
            if let Some((start, content)) = appended {
                let index = manager.add_stream(content.into_bytes())?;
                debug!(index, objects = synthetic.len(), "added content stream");
                for &i in &synthetic {
                    if let Some(obj) = self.holder.get_mut(i) {
                        obj.set_content_stream(Some(index));
                    }
                }
                let mut ctms = self.holder.all_ctms().clone();
                ctms.insert(index, start);
                self.holder.set_all_ctms(ctms);
            }
            for obj in self.holder.iter_mut() {
                obj.set_dirty(false);
            }
            manager.execute_scheduled_removals(self.holder)?;
        }

        if self.resources_changed {
            self.write_resources()?;
        }
        Ok(())
    }

    /// Rewrite the one stream of a form.
    fn generate_stream_content(&mut self) -> Result<()> {
        let objid = self.holder.dict_objid().ok_or(PdfError::NoHolderDict)?;
        let form_matrix = self
            .doc
            .getobj(objid)?
            .as_stream()?
            .get("Matrix")
            .map(|m| self.doc.resolve(m).to_matrix())
            .unwrap_or(MATRIX_IDENTITY);

        self.holder.take_dirty_streams();
        let indices: Vec<usize> = (0..self.holder.len()).collect();
        let content = self.segment_content(&indices, form_matrix, None);
        match self.doc.getobj_mut(objid)? {
            PDFObject::Stream(stream) => stream.set_data_and_remove_filter(content.into_bytes()),
            other => {
                return Err(PdfError::TypeError {
                    expected: "stream",
                    got: other.type_name(),
                });
            }
        }
        for obj in self.holder.iter_mut() {
            obj.set_content_stream(Some(0));
            obj.set_dirty(false);
        }
        if self.resources_changed {
            self.write_resources()?;
        }
        Ok(())
    }

    fn indices_in(&self, segment: Option<usize>) -> Vec<usize> {
        self.holder
            .iter()
            .enumerate()
            .filter(|(_, obj)| obj.content_stream() == segment)
            .map(|(i, _)| i)
            .collect()
    }

    /// Content of one segment. `start` is the CTM the segment inherits
    /// and `end` the CTM it must leave behind.
    fn segment_content(&mut self, indices: &[usize], start: Matrix, end: Option<Matrix>) -> String {
        let mut w = ContentWriter::new();
        w.op("q").newline();
        if !is_near_identity(start) {
            w.matrix(invert_matrix(start)).op("cm").newline();
        }
        let default_gs = self.graphics_state_name(DEFAULT_GRAPHICS);
        w.number(0.0).number(0.0).number(0.0).op("RG");
        w.number(0.0).number(0.0).number(0.0).op("rg");
        w.number(1.0).op("w");
        w.number(0.0).op("J");
        w.number(0.0).op("j").newline();
        w.name(&default_gs).op("gs").newline();

        let mut marks = ContentMarks::new();
        for &index in indices {
            let Some(obj) = self.holder.get(index).cloned() else {
                continue;
            };
            write_mark_transition(&mut w, &marks, &obj.marks);
            marks = obj.marks.clone();
            self.write_object(&mut w, index, &obj);
        }
        for _ in 0..marks.len() {
            w.op("EMC").newline();
        }
        w.op("Q").newline();

        if let Some(end) = end {
            let delta = mult_matrix(end, invert_matrix(start));
            if !is_near_identity(delta) {
                w.matrix(delta).op("cm").newline();
            }
        }
        w.finish()
    }

    fn write_object(&mut self, w: &mut ContentWriter, index: usize, obj: &PageObject) {
        match &obj.kind {
            PageObjectKind::Path(path) => self.write_path(w, obj, path),
            PageObjectKind::Text(text) => self.write_text(w, obj, text),
            PageObjectKind::Image(image) => {
                let mut stream = image.stream.clone();
                if image.is_inline {
                    let inline = Arc::make_mut(&mut stream);
                    inline.attrs.insert("Type".into(), PDFObject::Name("XObject".into()));
                    inline.attrs.insert("Subtype".into(), PDFObject::Name("Image".into()));
                }
                let name = self.xobject_name(index, obj, &stream);
                self.write_placed(w, obj, image.matrix, &name, "Do");
            }
            PageObjectKind::Form(form) => {
                let name = self.xobject_name(index, obj, form.form.stream());
                self.write_placed(w, obj, form.matrix, &name, "Do");
            }
            PageObjectKind::Shading(shading) => {
                let Some(name) = self.shading_name(index, obj, &shading.shading.shading) else {
                    trace!(index, "shading without a dictionary is not written");
                    return;
                };
                self.write_placed(w, obj, shading.matrix, &name, "sh");
            }
        }
    }

    /// `q`, the clip and the graphics parameters of `obj`.
    fn begin_object(&mut self, w: &mut ContentWriter, obj: &PageObject) {
        w.op("q");
        if obj.clip_path.is_set() {
            for (path, fill) in obj.clip_path.get().paths() {
                write_path_points(w, path);
                w.op(if *fill == FillType::EvenOdd { "W*" } else { "W" });
                w.op("n");
            }
        }

        let colors = obj.color_state.get();
        if let Some((r, g, b)) = colors.fill_color.to_rgb() {
            w.number(r).number(g).number(b).op("rg");
        }
        if let Some((r, g, b)) = colors.stroke_color.to_rgb() {
            w.number(r).number(g).number(b).op("RG");
        }
        write_graph_state(w, obj.graph_state.get());

        let general = obj.general_state.get();
        let key = (general.fill_alpha(), general.stroke_alpha(), general.blend_mode);
        if key != DEFAULT_GRAPHICS {
            let name = self.graphics_state_name(key);
            w.name(&name).op("gs");
        }
    }

    fn write_path(&mut self, w: &mut ContentWriter, obj: &PageObject, path: &PathObject) {
        self.begin_object(w, obj);
        if !is_near_identity(path.matrix) {
            w.matrix(path.matrix).op("cm");
        }
        write_path_points(w, &path.path);
        w.op(paint_operator(path.fill_type, path.stroke));
        w.op("Q").newline();
    }

    fn write_text(&mut self, w: &mut ContentWriter, obj: &PageObject, text: &TextObject) {
        let state = obj.text_state.get();
        let Some(font) = state.font.clone() else {
            debug!("text object without a font is not written");
            return;
        };
        let font_name = self.font_name(font.as_ref());

        self.begin_object(w, obj);
        w.op("BT");
        w.name(&font_name).number(state.font_size).op("Tf");
        if state.char_space != 0.0 {
            w.number(state.char_space).op("Tc");
        }
        if state.word_space != 0.0 {
            w.number(state.word_space).op("Tw");
        }
        if state.text_mode != TextRenderingMode::Fill {
            w.number(state.text_mode.as_int() as f64).op("Tr");
        }
        w.matrix(obj.text_matrix()).op("Tm");

        w.begin_array();
        let mut run = Vec::new();
        for item in &text.items {
            match item {
                TextItem::Glyph { code, .. } => font.append_char(&mut run, *code),
                TextItem::Kerning(k) => {
                    w.hex_string(&run);
                    run.clear();
                    w.number(*k);
                }
            }
        }
        w.hex_string(&run);
        w.end_array().op("TJ");
        w.op("ET").op("Q").newline();
    }

    /// Images, forms and shadings: placed by `matrix` and drawn by name.
    fn write_placed(&mut self, w: &mut ContentWriter, obj: &PageObject, matrix: Matrix, name: &str, op: &str) {
        self.begin_object(w, obj);
        if !is_near_identity(matrix) {
            w.matrix(matrix).op("cm");
        }
        w.name(name).op(op);
        w.op("Q").newline();
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    fn graphics_state_name(&mut self, (fill, stroke, blend): (f64, f64, BlendMode)) -> String {
        let key: GraphicsKey = (OrderedFloat(fill), OrderedFloat(stroke), blend);
        if let Some(name) = self.holder.graphics_cache_lookup(&key) {
            return name.to_string();
        }
        let mut dict = Dictionary::new();
        dict.insert("Type".into(), PDFObject::Name("ExtGState".into()));
        dict.insert("ca".into(), PDFObject::Real(fill));
        dict.insert("CA".into(), PDFObject::Real(stroke));
        if blend != BlendMode::Normal {
            dict.insert("BM".into(), PDFObject::Name(blend.name().into()));
        }
        let name = self.add_resource("ExtGState", GRAPHICS_PREFIX, PDFObject::Dict(dict));
        self.holder.graphics_cache_insert(key, &name);
        name
    }

    /// Fonts loaded from the document are referenced; stock fonts get a
    /// minimal dictionary of their own.
    fn font_name(&mut self, font: &dyn PdfFont) -> String {
        let key = (font.base_font().to_string(), font.subtype().name().to_string());
        if let Some(name) = self.holder.font_cache_lookup(&key) {
            return name.to_string();
        }
        let value = match font.objid() {
            Some(objid) => PDFObject::Ref(PDFObjRef::new(objid, 0)),
            None => {
                let mut dict = Dictionary::new();
                dict.insert("Type".into(), PDFObject::Name("Font".into()));
                dict.insert("Subtype".into(), PDFObject::Name(key.1.clone()));
                dict.insert("BaseFont".into(), PDFObject::Name(key.0.clone()));
                PDFObject::Ref(self.doc.add_object(PDFObject::Dict(dict)))
            }
        };
        let name = self.add_resource("Font", FONT_PREFIX, value);
        self.holder.font_cache_insert(key, &name);
        name
    }

    /// Name under which `stream` is drawn. The name the object was parsed
    /// with is kept while the resource still exists.
    fn xobject_name(&mut self, index: usize, obj: &PageObject, stream: &Arc<PDFStream>) -> String {
        let current = obj.resource_name();
        if !current.is_empty() && self.has_resource("XObject", current) {
            return current.to_string();
        }
        let r = match stream.objid {
            Some(objid) => PDFObjRef::new(objid, stream.genno.unwrap_or(0)),
            None => self.doc.add_object(PDFObject::Stream(Box::new((**stream).clone()))),
        };
        let name = self.add_resource("XObject", XOBJECT_PREFIX, PDFObject::Ref(r));
        if let Some(obj) = self.holder.get_mut(index) {
            obj.set_resource_name(&name);
        }
        name
    }

    fn shading_name(&mut self, index: usize, obj: &PageObject, shading: &PDFObject) -> Option<String> {
        let current = obj.resource_name();
        if !current.is_empty() && self.has_resource("Shading", current) {
            return Some(current.to_string());
        }
        let value = match shading {
            PDFObject::Dict(dict) => PDFObject::Dict(dict.clone()),
            PDFObject::Stream(stream) => match stream.objid {
                Some(objid) => PDFObject::Ref(PDFObjRef::new(objid, stream.genno.unwrap_or(0))),
                None => PDFObject::Ref(self.doc.add_object(shading.clone())),
            },
            _ => return None,
        };
        let name = self.add_resource("Shading", SHADING_PREFIX, value);
        if let Some(obj) = self.holder.get_mut(index) {
            obj.set_resource_name(&name);
        }
        Some(name)
    }

    fn has_resource(&self, category: &str, name: &str) -> bool {
        self.holder
            .resources()
            .and_then(|res| self.doc.dict_get_dict(res, category))
            .is_some_and(|entries| entries.contains_key(name))
    }

    /// Store `value` under the first free `FX<prefix><n>` name of
    /// `category` in the holder's resources.
    fn add_resource(&mut self, category: &str, prefix: &str, value: PDFObject) -> String {
        let doc = &*self.doc;
        let resources = self.holder.resources_mut();
        let mut entries = match resources.get(category).map(|e| doc.resolve(e)) {
            Some(PDFObject::Dict(dict)) => dict.clone(),
            _ => Dictionary::new(),
        };
        let name = (1u32..)
            .map(|n| format!("FX{prefix}{n}"))
            .find(|name| !entries.contains_key(name))
            .unwrap_or_default();
        entries.insert(name.clone(), value);
        resources.insert(category.to_string(), PDFObject::Dict(entries));
        self.resources_changed = true;
        trace!(category, name, "added resource");
        name
    }

    /// Store the holder's resources in its page or form dictionary. An
    /// indirect `Resources` object is replaced in place.
    fn write_resources(&mut self) -> Result<()> {
        let objid = self.holder.dict_objid().ok_or(PdfError::NoHolderDict)?;
        let resources = PDFObject::Dict(
            self.holder
                .resources()
                .map(|r| (**r).clone())
                .unwrap_or_default(),
        );
        let indirect = self
            .doc
            .getobj(objid)?
            .as_dict()?
            .get("Resources")
            .and_then(|r| r.as_ref().ok().copied());
        match indirect {
            Some(r) => self.doc.set_object(r.objid, resources),
            None => match self.doc.getobj_mut(objid)? {
                PDFObject::Dict(dict) => {
                    dict.insert("Resources".into(), resources);
                }
                PDFObject::Stream(stream) => {
                    stream.attrs.insert("Resources".into(), resources);
                }
                other => {
                    return Err(PdfError::TypeError {
                        expected: "dict",
                        got: other.type_name(),
                    });
                }
            },
        }
        if self.holder.is_page() {
            let resources = self.holder.resources().cloned();
            self.holder.set_page_resources(resources);
        }
        self.resources_changed = false;
        Ok(())
    }
}

/// Close the marks `current` has beyond the shared prefix, then open the
/// rest of `next`.
fn write_mark_transition(w: &mut ContentWriter, current: &ContentMarks, next: &ContentMarks) {
    let common = current.common_prefix_len(next);
    for _ in common..current.len() {
        w.op("EMC").newline();
    }
    for item in &next.items()[common..] {
        w.name(&item.tag);
        match &item.params {
            MarkParams::None => w.op("BMC"),
            MarkParams::Direct(dict) => w.dict(dict).op("BDC"),
            MarkParams::Resource { name, .. } => w.name(name).op("BDC"),
        };
        w.newline();
    }
}

fn write_graph_state(w: &mut ContentWriter, state: &GraphState) {
    if state.line_width != 1.0 {
        w.number(state.line_width).op("w");
    }
    if state.line_cap != LineCap::Butt {
        w.number(state.line_cap.as_int() as f64).op("J");
    }
    if state.line_join != LineJoin::Miter {
        w.number(state.line_join.as_int() as f64).op("j");
    }
    if state.miter_limit != 10.0 {
        w.number(state.miter_limit).op("M");
    }
    if !state.dash_array.is_empty() {
        w.begin_array();
        for &dash in &state.dash_array {
            w.number(dash);
        }
        w.end_array().number(state.dash_phase).op("d");
    }
}

/// Path construction operators. A lone closed rectangle becomes `re`.
fn write_path_points(w: &mut ContentWriter, path: &Path) {
    if path.len() == 5
        && let Some((x0, y0, x1, y1)) = path.rect()
    {
        w.number(x0).number(y0).number(x1 - x0).number(y1 - y0).op("re");
        return;
    }
    let points = path.points();
    let mut i = 0;
    while i < points.len() {
        let p = points[i];
        let closes = match p.kind {
            PointType::Move => {
                w.point(p.point).op("m");
                p.close
            }
            PointType::Line => {
                w.point(p.point).op("l");
                p.close
            }
            PointType::Bezier => {
                let Some(curve) = points.get(i..i + 3) else {
                    break;
                };
                for c in curve {
                    w.point(c.point);
                }
                w.op("c");
                i += 2;
                curve[2].close
            }
        };
        if closes {
            w.op("h");
        }
        i += 1;
    }
}

fn paint_operator(fill: FillType, stroke: bool) -> &'static str {
    match (fill, stroke) {
        (FillType::NoFill, true) => "S",
        (FillType::NoFill, false) => "n",
        (FillType::Winding, false) => "f",
        (FillType::EvenOdd, false) => "f*",
        (FillType::Winding, true) => "B",
        (FillType::EvenOdd, true) => "B*",
    }
}

/// Content that draws form XObject `name` at `scale`, with its origin at
/// `origin`. Used to lay a whole page out as a tile of another page.
pub fn sub_page_fragment(name: &str, scale: f64, origin: Point) -> String {
    let mut w = ContentWriter::new();
    w.op("q").newline();
    w.matrix((scale, 0.0, 0.0, scale, origin.0, origin.1))
        .op("cm")
        .newline();
    w.name(name).op("Do").op("Q").newline();
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::holder::HolderKind;

    fn rect_path(x0: f64, y0: f64, x1: f64, y1: f64) -> Path {
        let mut path = Path::new();
        path.append_rect(x0, y0, x1, y1);
        path
    }

    fn page_holder(doc: &mut Document) -> PageObjectHolder {
        let page = doc.add_page(Dictionary::new()).unwrap();
        PageObjectHolder::new(HolderKind::Page, Some(page.objid))
    }

    #[test]
    fn sub_page_fragment_is_exact() {
        assert_eq!(
            sub_page_fragment("foo", 0.5, (0.000001, 1e12)),
            "q\n.5 0 0 .5 .000001 1000000000000 cm\n/foo Do Q\n"
        );
    }

    #[test]
    fn curves_and_closes() {
        let mut path = Path::new();
        path.append_point((0.0, 0.0), PointType::Move);
        path.append_point((1.0, 2.0), PointType::Bezier);
        path.append_point((3.0, 4.0), PointType::Bezier);
        path.append_point_and_close((5.0, 6.0), PointType::Bezier);
        let mut w = ContentWriter::new();
        write_path_points(&mut w, &path);
        assert_eq!(w.finish(), "0 0 m 1 2 3 4 5 6 c h");
    }

    #[test]
    fn new_object_goes_to_new_stream() {
        let mut doc = Document::with_catalog();
        let mut holder = page_holder(&mut doc);
        let mut obj = PageObject::new_path(
            rect_path(10.0, 10.0, 60.0, 30.0),
            FillType::Winding,
            false,
            MATRIX_IDENTITY,
        );
        obj.color_state.make_mut().set_default();
        holder.add_object(obj);

        ContentGenerator::new(&mut doc, &mut holder).generate_content().unwrap();

        assert_eq!(holder.get(0).unwrap().content_stream(), Some(0));
        assert!(!holder.get(0).unwrap().is_dirty());
        let page = doc.getobj(holder.dict_objid().unwrap()).unwrap().as_dict().unwrap();
        let contents = doc.resolve(&page["Contents"]).as_stream().unwrap();
        let content = String::from_utf8(contents.get_rawdata().to_vec()).unwrap();
        insta::assert_snapshot!(content, @r"
        q
        0 0 0 RG 0 0 0 rg 1 w 0 J 0 j
        /FXE1 gs
        q 0 0 0 rg 0 0 0 RG 10 10 50 20 re f Q
        Q
        ");
        let resources = page["Resources"].as_dict().unwrap();
        let gs = resources["ExtGState"].as_dict().unwrap();
        assert!(gs.contains_key("FXE1"));
    }

    #[test]
    fn graphics_states_are_deduplicated() {
        let mut doc = Document::with_catalog();
        let mut holder = page_holder(&mut doc);
        for _ in 0..2 {
            let mut obj = PageObject::new_path(
                rect_path(0.0, 0.0, 1.0, 1.0),
                FillType::EvenOdd,
                true,
                MATRIX_IDENTITY,
            );
            obj.general_state.make_mut().set_fill_alpha(0.5);
            obj.general_state.make_mut().blend_mode = BlendMode::Multiply;
            holder.add_object(obj);
        }
        ContentGenerator::new(&mut doc, &mut holder).generate_content().unwrap();

        let page = doc.getobj(holder.dict_objid().unwrap()).unwrap().as_dict().unwrap();
        let gs = page["Resources"].as_dict().unwrap()["ExtGState"].as_dict().unwrap();
        assert_eq!(gs.len(), 2);
        let multiply = gs["FXE2"].as_dict().unwrap();
        assert_eq!(multiply["BM"], PDFObject::Name("Multiply".into()));
        assert_eq!(multiply["ca"], PDFObject::Real(0.5));
        let contents = doc.resolve(&page["Contents"]).as_stream().unwrap();
        let content = String::from_utf8(contents.get_rawdata().to_vec()).unwrap();
        assert_eq!(content.matches("/FXE2 gs").count(), 2);
        assert_eq!(content.matches("re B* Q").count(), 2);
    }

    #[test]
    fn marks_open_and_close_around_objects() {
        let mut outer = ContentMarks::new();
        outer.add_mark("Artifact");
        let mut inner = outer.clone();
        let mut props = Dictionary::new();
        props.insert("MCID".into(), PDFObject::Int(4));
        inner.add_mark_with_direct_dict("Span", props);

        let mut w = ContentWriter::new();
        write_mark_transition(&mut w, &ContentMarks::new(), &inner);
        write_mark_transition(&mut w, &inner, &outer);
        write_mark_transition(&mut w, &outer, &ContentMarks::new());
        assert_eq!(w.finish(), "/Artifact BMC\n/Span <</MCID 4>> BDC\nEMC\nEMC\n");
    }

    #[test]
    fn ctm_of_segment_is_undone_and_restored() {
        let mut doc = Document::with_catalog();
        let mut holder = page_holder(&mut doc);
        let start = (2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let end = (2.0, 0.0, 0.0, 2.0, 10.0, 0.0);
        let mut generator = ContentGenerator::new(&mut doc, &mut holder);
        let content = generator.segment_content(&[], start, Some(end));
        assert_eq!(
            content,
            "q\n.5 0 0 .5 0 0 cm\n0 0 0 RG 0 0 0 rg 1 w 0 J 0 j\n/FXE1 gs\nQ\n1 0 0 1 5 0 cm\n"
        );
    }
}
