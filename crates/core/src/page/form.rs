//! Form XObjects and Type 3 glyph procedures.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::document::Document;
use crate::interp::states::AllStates;
use crate::model::objects::{Dictionary, PDFStream};
use crate::page::content_parser::{ContentParser, MAX_FORM_LEVEL, ParseOptions, RecursionState};
use crate::page::holder::{HolderKind, PageObjectHolder, ParseState, Transparency};
use crate::utils::Matrix;

/// A content stream drawn as a unit, with the objects parsed from it.
#[derive(Debug, Clone)]
pub struct Form {
    holder: PageObjectHolder,
    stream: Arc<PDFStream>,
}

impl Form {
    /// Form whose content uses its own `Resources`, else
    /// `parent_resources`, else `page_resources`.
    pub fn new(
        doc: &Document,
        page_resources: Option<Arc<Dictionary>>,
        stream: Arc<PDFStream>,
        parent_resources: Option<Arc<Dictionary>>,
    ) -> Self {
        Self::with_kind(HolderKind::Form, doc, page_resources, stream, parent_resources)
    }

    /// Glyph procedure of a Type 3 font. `resources` are the font's, or the
    /// page's when the font has none.
    pub fn new_glyph(
        doc: &Document,
        resources: Option<Arc<Dictionary>>,
        stream: Arc<PDFStream>,
    ) -> Self {
        Self::with_kind(HolderKind::Type3Char, doc, resources, stream, None)
    }

    fn with_kind(
        kind: HolderKind,
        doc: &Document,
        page_resources: Option<Arc<Dictionary>>,
        stream: Arc<PDFStream>,
        parent_resources: Option<Arc<Dictionary>>,
    ) -> Self {
        let mut holder = PageObjectHolder::new(kind, stream.objid);
        let own = stream
            .get("Resources")
            .and_then(|r| doc.resolve(r).as_dict().ok())
            .map(|r| Arc::new(r.clone()));
        holder.set_resources(own.or(parent_resources).or_else(|| page_resources.clone()));
        holder.set_page_resources(page_resources);
        let group = stream.get("Group").and_then(|g| doc.resolve(g).as_dict().ok());
        holder.set_transparency(Transparency::from_group(group));
        Self { holder, stream }
    }

    pub fn holder(&self) -> &PageObjectHolder {
        &self.holder
    }

    pub fn holder_mut(&mut self) -> &mut PageObjectHolder {
        &mut self.holder
    }

    pub fn stream(&self) -> &Arc<PDFStream> {
        &self.stream
    }

    /// Form space to the space of whatever draws the form.
    pub fn matrix(&self, doc: &Document) -> Option<Matrix> {
        self.stream.get("Matrix").map(|m| doc.resolve(m).to_matrix())
    }

    /// Incremental parser over the form content. See
    /// [`ContentParser::for_form`] for the arguments.
    pub fn parser<'a>(
        &'a mut self,
        doc: &'a Document,
        states: Option<&AllStates>,
        parent_matrix: Option<Matrix>,
        recursion: Rc<RefCell<RecursionState>>,
        options: ParseOptions,
    ) -> ContentParser<'a> {
        ContentParser::for_form(
            doc,
            &mut self.holder,
            &self.stream,
            states,
            parent_matrix,
            recursion,
            options,
        )
    }

    /// Parse the whole form. Does nothing once parsing has started.
    ///
    /// `recursion` is the nesting state of the content that draws this
    /// form; a top-level form starts a fresh one.
    pub fn parse_content(
        &mut self,
        doc: &Document,
        states: Option<&AllStates>,
        parent_matrix: Option<Matrix>,
        recursion: Option<Rc<RefCell<RecursionState>>>,
    ) {
        if self.holder.parse_state() != ParseState::NotParsed {
            return;
        }
        let recursion = recursion
            .unwrap_or_else(|| Rc::new(RefCell::new(RecursionState::new(MAX_FORM_LEVEL))));
        let stream = Arc::clone(&self.stream);
        ContentParser::for_form(
            doc,
            &mut self.holder,
            &stream,
            states,
            parent_matrix,
            recursion,
            ParseOptions::default(),
        )
        .parse_to_end();
    }

    /// Parse a glyph procedure, capturing its `d0`/`d1` metrics.
    pub fn parse_content_for_type3_char(
        &mut self,
        doc: &Document,
        recursion: Rc<RefCell<RecursionState>>,
    ) {
        self.parse_content(doc, None, None, Some(recursion));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::objects::PDFObject;

    fn resources(key: &str) -> Arc<Dictionary> {
        let mut dict = Dictionary::new();
        dict.insert(key.into(), PDFObject::Dict(Dictionary::new()));
        Arc::new(dict)
    }

    #[test]
    fn resources_fall_back_to_parent_then_page() {
        let doc = Document::new();
        let page = resources("Page");
        let parent = resources("Parent");
        let stream = Arc::new(PDFStream::new(Dictionary::new(), Vec::new()));

        let form = Form::new(&doc, Some(Arc::clone(&page)), Arc::clone(&stream), Some(parent));
        assert!(form.holder().resources().unwrap().contains_key("Parent"));

        let form = Form::new(&doc, Some(Arc::clone(&page)), Arc::clone(&stream), None);
        assert!(form.holder().resources().unwrap().contains_key("Page"));

        let mut attrs = Dictionary::new();
        attrs.insert("Resources".into(), PDFObject::Dict(Dictionary::new()));
        let own = Arc::new(PDFStream::new(attrs, Vec::new()));
        let form = Form::new(&doc, Some(page), own, None);
        assert!(form.holder().resources().unwrap().is_empty());
        assert_eq!(form.holder().kind(), HolderKind::Form);
    }

    #[test]
    fn parse_runs_once() {
        let doc = Document::new();
        let stream = Arc::new(PDFStream::new(Dictionary::new(), b"0 0 m 5 5 l S".to_vec()));
        let mut form = Form::new(&doc, None, stream, None);
        form.parse_content(&doc, None, None, None);
        form.parse_content(&doc, None, None, None);
        assert_eq!(form.holder().len(), 1);
        assert_eq!(form.holder().parse_state(), ParseState::Parsed);
    }

    #[test]
    fn group_resets_inherited_alpha() {
        let doc = Document::new();
        let mut group = Dictionary::new();
        group.insert("S".into(), PDFObject::Name("Transparency".into()));
        let mut attrs = Dictionary::new();
        attrs.insert("Group".into(), PDFObject::Dict(group));
        let stream = Arc::new(PDFStream::new(attrs, b"0 0 5 5 re f".to_vec()));
        let mut states = AllStates::with_defaults();
        states.general.make_mut().set_fill_alpha(0.25);
        let mut form = Form::new(&doc, None, stream, None);
        form.parse_content(&doc, Some(&states), None, None);
        let obj = form.holder().get(0).unwrap();
        assert_eq!(obj.general_state.get().fill_alpha(), 1.0);
        assert!(form.holder().transparency().group);
    }
}
