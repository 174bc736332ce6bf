//! Page object container shared by pages, forms and Type 3 glyphs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use ordered_float::OrderedFloat;

use crate::model::objects::{Dictionary, PDFObject};
use crate::model::state::BlendMode;
use crate::utils::{MATRIX_IDENTITY, Matrix, RECT_EMPTY, Rect};

use super::object::PageObject;

/// What the container's content belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolderKind {
    Page,
    Form,
    Type3Char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseState {
    #[default]
    NotParsed,
    Parsing,
    Parsed,
}

/// Transparency group attributes from the `Group` dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transparency {
    pub group: bool,
    pub isolated: bool,
    pub knockout: bool,
}

impl Transparency {
    /// Pages are isolated whether or not they carry a group.
    pub const PAGE: Self = Self {
        group: false,
        isolated: true,
        knockout: false,
    };

    /// Merge a `Group` dictionary into `self`. Anything but a transparency
    /// group leaves it untouched.
    pub fn with_group(mut self, group: Option<&Dictionary>) -> Self {
        let Some(group) = group else {
            return self;
        };
        let is_transparency = group
            .get("S")
            .and_then(|s| s.as_name().ok())
            .is_some_and(|s| s == "Transparency");
        if !is_transparency {
            return self;
        }
        let flag = |key: &str| match group.get(key) {
            Some(PDFObject::Bool(b)) => *b,
            Some(other) => other.as_int().unwrap_or(0) != 0,
            None => false,
        };
        self.group = true;
        self.isolated |= flag("I");
        self.knockout |= flag("K");
        self
    }

    pub fn from_group(group: Option<&Dictionary>) -> Self {
        Self::default().with_group(group)
    }
}

/// `d0`/`d1` operands captured while parsing a Type 3 glyph.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Type3Data {
    pub colored: bool,
    pub values: [f64; 6],
}

/// Key of the ExtGState dedup cache: fill alpha, stroke alpha, blend mode.
pub type GraphicsKey = (OrderedFloat<f64>, OrderedFloat<f64>, BlendMode);

/// Key of the font dedup cache: base font and subtype name.
pub type FontKey = (String, String);

/// The objects of one content stream owner plus the bookkeeping needed to
/// regenerate its content.
#[derive(Debug, Clone)]
pub struct PageObjectHolder {
    kind: HolderKind,
    objects: Vec<PageObject>,
    dict_objid: Option<u32>,
    resources: Option<Arc<Dictionary>>,
    page_resources: Option<Arc<Dictionary>>,
    bbox: Rect,
    transparency: Transparency,
    background_alpha_needed: bool,
    parse_state: ParseState,
    all_ctms: BTreeMap<usize, Matrix>,
    dirty_streams: BTreeSet<usize>,
    mask_bboxes: Vec<Rect>,
    graphics_map: BTreeMap<GraphicsKey, String>,
    fonts_map: BTreeMap<FontKey, String>,
    type3_data: Option<Type3Data>,
}

impl PageObjectHolder {
    /// `dict_objid` is the page dictionary or form stream object number.
    pub fn new(kind: HolderKind, dict_objid: Option<u32>) -> Self {
        Self {
            kind,
            objects: Vec::new(),
            dict_objid,
            resources: None,
            page_resources: None,
            bbox: RECT_EMPTY,
            transparency: Transparency::default(),
            background_alpha_needed: false,
            parse_state: ParseState::NotParsed,
            all_ctms: BTreeMap::new(),
            dirty_streams: BTreeSet::new(),
            mask_bboxes: Vec::new(),
            graphics_map: BTreeMap::new(),
            fonts_map: BTreeMap::new(),
            type3_data: None,
        }
    }

    pub fn kind(&self) -> HolderKind {
        self.kind
    }

    pub fn is_page(&self) -> bool {
        self.kind == HolderKind::Page
    }

    pub fn dict_objid(&self) -> Option<u32> {
        self.dict_objid
    }

    // ------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[PageObject] {
        &self.objects
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PageObject> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, PageObject> {
        self.objects.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&PageObject> {
        self.objects.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut PageObject> {
        self.objects.get_mut(index)
    }

    /// Append an object as parsed.
    pub fn append(&mut self, obj: PageObject) {
        self.objects.push(obj);
    }

    /// Append an object created by the caller. It is marked dirty so the
    /// next content generation writes it.
    pub fn add_object(&mut self, mut obj: PageObject) {
        obj.set_dirty(true);
        self.objects.push(obj);
    }

    /// Take an object out of the container. Its segment must be rewritten,
    /// so it becomes a dirty stream.
    pub fn remove(&mut self, index: usize) -> Option<PageObject> {
        if index >= self.objects.len() {
            return None;
        }
        let obj = self.objects.remove(index);
        if let Some(stream) = obj.content_stream() {
            self.dirty_streams.insert(stream);
        }
        Some(obj)
    }

    /// Drop an object without touching the dirty streams.
    pub fn erase_at(&mut self, index: usize) -> bool {
        if index >= self.objects.len() {
            return false;
        }
        self.objects.remove(index);
        true
    }

    /// Union of every object box (empty without objects).
    pub fn calc_bounding_box(&self) -> Rect {
        if self.objects.is_empty() {
            return RECT_EMPTY;
        }
        let (mut left, mut bottom) = (1_000_000.0f64, 1_000_000.0f64);
        let (mut right, mut top) = (-1_000_000.0f64, -1_000_000.0f64);
        for obj in &self.objects {
            let (x0, y0, x1, y1) = obj.bbox();
            left = left.min(x0);
            right = right.max(x1);
            bottom = bottom.min(y0);
            top = top.max(y1);
        }
        (left, bottom, right, top)
    }

    // ------------------------------------------------------------------
    // Segment CTMs
    // ------------------------------------------------------------------

    pub fn set_all_ctms(&mut self, ctms: BTreeMap<usize, Matrix>) {
        self.all_ctms = ctms;
    }

    pub fn all_ctms(&self) -> &BTreeMap<usize, Matrix> {
        &self.all_ctms
    }

    /// CTM in effect when `segment` begins. The first segment starts at
    /// identity; objects without a segment see the final CTM of the page.
    pub fn ctm_at_start_of(&self, segment: Option<usize>) -> Matrix {
        match segment {
            None => self
                .all_ctms
                .values()
                .next_back()
                .copied()
                .unwrap_or(MATRIX_IDENTITY),
            Some(0) => MATRIX_IDENTITY,
            Some(_) if self.all_ctms.is_empty() => MATRIX_IDENTITY,
            Some(s) => self.ctm_at_end_of(s - 1),
        }
    }

    /// CTM when `segment` ends; identity for unknown segments.
    pub fn ctm_at_end_of(&self, segment: usize) -> Matrix {
        self.all_ctms
            .get(&segment)
            .copied()
            .unwrap_or(MATRIX_IDENTITY)
    }

    // ------------------------------------------------------------------
    // Resource dedup caches
    // ------------------------------------------------------------------

    pub fn graphics_cache_lookup(&self, key: &GraphicsKey) -> Option<&str> {
        self.graphics_map.get(key).map(String::as_str)
    }

    pub fn graphics_cache_insert(&mut self, key: GraphicsKey, name: &str) {
        self.graphics_map.insert(key, name.to_string());
    }

    pub fn font_cache_lookup(&self, key: &FontKey) -> Option<&str> {
        self.fonts_map.get(key).map(String::as_str)
    }

    pub fn font_cache_insert(&mut self, key: FontKey, name: &str) {
        self.fonts_map.insert(key, name.to_string());
    }

    // ------------------------------------------------------------------
    // Dirty streams
    // ------------------------------------------------------------------

    pub fn mark_stream_dirty(&mut self, segment: usize) {
        self.dirty_streams.insert(segment);
    }

    pub fn has_dirty_streams(&self) -> bool {
        !self.dirty_streams.is_empty()
    }

    pub fn take_dirty_streams(&mut self) -> BTreeSet<usize> {
        std::mem::take(&mut self.dirty_streams)
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn add_image_mask_bbox(&mut self, rect: Rect) {
        self.mask_bboxes.push(rect);
    }

    pub fn image_mask_bboxes(&self) -> &[Rect] {
        &self.mask_bboxes
    }

    pub fn background_alpha_needed(&self) -> bool {
        self.background_alpha_needed
    }

    pub fn set_background_alpha_needed(&mut self, needed: bool) {
        self.background_alpha_needed = needed;
    }

    pub fn parse_state(&self) -> ParseState {
        self.parse_state
    }

    pub fn set_parse_state(&mut self, state: ParseState) {
        self.parse_state = state;
    }

    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    pub fn set_bbox(&mut self, bbox: Rect) {
        self.bbox = bbox;
    }

    pub fn transparency(&self) -> Transparency {
        self.transparency
    }

    pub fn set_transparency(&mut self, transparency: Transparency) {
        self.transparency = transparency;
    }

    /// The holder's own resources (the form's, or the page's for a page).
    pub fn resources(&self) -> Option<&Arc<Dictionary>> {
        self.resources.as_ref()
    }

    pub fn page_resources(&self) -> Option<&Arc<Dictionary>> {
        self.page_resources.as_ref()
    }

    pub fn set_resources(&mut self, resources: Option<Arc<Dictionary>>) {
        self.resources = resources;
    }

    pub fn set_page_resources(&mut self, resources: Option<Arc<Dictionary>>) {
        self.page_resources = resources;
    }

    /// Writable resources, created empty when missing.
    pub fn resources_mut(&mut self) -> &mut Dictionary {
        Arc::make_mut(self.resources.get_or_insert_with(Default::default))
    }

    pub fn type3_data(&self) -> Option<Type3Data> {
        self.type3_data
    }

    pub fn set_type3_data(&mut self, data: Type3Data) {
        self.type3_data = Some(data);
    }

    /// Renumber object segments after streams were removed. Objects whose
    /// segment is gone lose their segment.
    pub fn remap_content_streams(&mut self, remap: impl Fn(usize) -> Option<usize>) {
        for obj in &mut self.objects {
            if let Some(old) = obj.content_stream() {
                obj.set_content_stream(remap(old));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::path::{FillType, Path};

    fn object_in(segment: Option<usize>) -> PageObject {
        let mut obj = PageObject::new_path(Path::new(), FillType::Winding, false, MATRIX_IDENTITY);
        obj.set_content_stream(segment);
        obj
    }

    #[test]
    fn remove_marks_segment_dirty() {
        let mut holder = PageObjectHolder::new(HolderKind::Page, Some(3));
        holder.append(object_in(Some(2)));
        holder.append(object_in(Some(0)));
        assert!(holder.remove(0).is_some());
        assert!(holder.remove(5).is_none());
        assert_eq!(holder.take_dirty_streams(), BTreeSet::from([2]));
        assert!(holder.erase_at(0));
        assert!(!holder.has_dirty_streams());
        assert!(holder.is_empty());
    }

    #[test]
    fn segment_ctms() {
        let mut holder = PageObjectHolder::new(HolderKind::Page, None);
        assert_eq!(holder.ctm_at_start_of(Some(3)), MATRIX_IDENTITY);
        let shift = (1.0, 0.0, 0.0, 1.0, 5.0, 5.0);
        let scale = (2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        holder.set_all_ctms(BTreeMap::from([(0, shift), (1, scale)]));
        assert_eq!(holder.ctm_at_start_of(Some(0)), MATRIX_IDENTITY);
        assert_eq!(holder.ctm_at_start_of(Some(1)), shift);
        assert_eq!(holder.ctm_at_start_of(Some(2)), scale);
        assert_eq!(holder.ctm_at_start_of(None), scale);
        assert_eq!(holder.ctm_at_end_of(7), MATRIX_IDENTITY);
    }

    #[test]
    fn transparency_group_flags() {
        let mut group = Dictionary::new();
        group.insert("S".into(), PDFObject::Name("Transparency".into()));
        group.insert("K".into(), PDFObject::Int(1));
        let form = Transparency::from_group(Some(&group));
        assert!(form.group && form.knockout && !form.isolated);
        let page = Transparency::PAGE.with_group(None);
        assert!(page.isolated && !page.group);
        group.insert("S".into(), PDFObject::Name("Other".into()));
        assert_eq!(Transparency::from_group(Some(&group)), Transparency::default());
    }

    #[test]
    fn added_objects_are_dirty() {
        let mut holder = PageObjectHolder::new(HolderKind::Page, None);
        holder.add_object(object_in(None));
        assert!(holder.get(0).unwrap().is_dirty());
    }
}
