//! In-memory object store.
//!
//! Holds the indirect objects of one document, resolves references, decodes
//! streams and allocates new objects for the content editor. Cross-reference
//! parsing lives outside this crate; callers populate the store directly.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::codec;
use crate::error::{PdfError, Result};
use crate::model::objects::{Dictionary, PDFObjRef, PDFObject, PDFStream};

/// Reference chains longer than this are treated as dangling.
const MAX_REF_CHAIN: usize = 32;

/// Inherited page attribute lookups stop after this many parents.
const MAX_PAGE_TREE_LEVEL: usize = 1000;

static NULL: PDFObject = PDFObject::Null;

/// A PDF document held entirely in memory.
#[derive(Debug, Default, Clone)]
pub struct Document {
    objects: BTreeMap<u32, PDFObject>,
    trailer: Dictionary,
    next_objid: u32,
}

impl Document {
    /// Create an empty document with no catalog.
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            trailer: Dictionary::new(),
            next_objid: 1,
        }
    }

    /// Create a document with an empty catalog and page tree.
    pub fn with_catalog() -> Self {
        let mut doc = Self::new();
        let mut pages = Dictionary::new();
        pages.insert("Type".into(), PDFObject::Name("Pages".into()));
        pages.insert("Kids".into(), PDFObject::Array(Vec::new()));
        pages.insert("Count".into(), PDFObject::Int(0));
        let pages_ref = doc.add_object(PDFObject::Dict(pages));

        let mut catalog = Dictionary::new();
        catalog.insert("Type".into(), PDFObject::Name("Catalog".into()));
        catalog.insert("Pages".into(), PDFObject::Ref(pages_ref));
        let root = doc.add_object(PDFObject::Dict(catalog));
        doc.trailer.insert("Root".into(), PDFObject::Ref(root));
        doc
    }

    /// Store a new indirect object and return its reference.
    pub fn add_object(&mut self, mut obj: PDFObject) -> PDFObjRef {
        let objid = self.next_objid;
        self.next_objid += 1;
        if let PDFObject::Stream(stream) = &mut obj {
            stream.set_objid(objid, 0);
        }
        self.objects.insert(objid, obj);
        PDFObjRef::new(objid, 0)
    }

    /// Store an object under a caller-chosen number, replacing any previous one.
    pub fn set_object(&mut self, objid: u32, mut obj: PDFObject) {
        if let PDFObject::Stream(stream) = &mut obj {
            stream.set_objid(objid, 0);
        }
        self.objects.insert(objid, obj);
        self.next_objid = self.next_objid.max(objid + 1);
    }

    /// Look up an indirect object.
    pub fn getobj(&self, objid: u32) -> Result<&PDFObject> {
        self.objects.get(&objid).ok_or(PdfError::ObjectNotFound(objid))
    }

    /// Mutable access to an indirect object.
    pub fn getobj_mut(&mut self, objid: u32) -> Result<&mut PDFObject> {
        self.objects
            .get_mut(&objid)
            .ok_or(PdfError::ObjectNotFound(objid))
    }

    /// Remove an indirect object.
    pub fn remove_object(&mut self, objid: u32) -> Option<PDFObject> {
        self.objects.remove(&objid)
    }

    /// All object numbers in ascending order.
    pub fn get_objids(&self) -> Vec<u32> {
        self.objects.keys().copied().collect()
    }

    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    pub fn trailer_mut(&mut self) -> &mut Dictionary {
        &mut self.trailer
    }

    /// Follow references until a direct object is reached. Dangling or
    /// overly long chains resolve to null.
    pub fn resolve<'a>(&'a self, obj: &'a PDFObject) -> &'a PDFObject {
        let mut current = obj;
        for _ in 0..MAX_REF_CHAIN {
            match current {
                PDFObject::Ref(r) => match self.objects.get(&r.objid) {
                    Some(next) => current = next,
                    None => return &NULL,
                },
                _ => return current,
            }
        }
        &NULL
    }

    /// Resolve `key` in `dict`.
    pub fn dict_get<'a>(&'a self, dict: &'a Dictionary, key: &str) -> Option<&'a PDFObject> {
        dict.get(key)
            .map(|obj| self.resolve(obj))
            .filter(|obj| !obj.is_null())
    }

    /// Resolve `key` in `dict` and expect a dictionary (or stream dictionary).
    pub fn dict_get_dict<'a>(&'a self, dict: &'a Dictionary, key: &str) -> Option<&'a Dictionary> {
        self.dict_get(dict, key).and_then(|obj| obj.as_dict().ok())
    }

    /// The catalog dictionary, if the trailer names one.
    pub fn catalog(&self) -> Option<&Dictionary> {
        self.dict_get_dict(&self.trailer, "Root")
    }

    /// Object numbers of the leaf pages in document order.
    pub fn page_objids(&self) -> Vec<u32> {
        let mut pages = Vec::new();
        let Some(root) = self.catalog() else {
            return pages;
        };
        let Some(PDFObject::Ref(tree)) = root.get("Pages") else {
            return pages;
        };
        let mut visited = FxHashSet::default();
        self.collect_pages(tree.objid, &mut pages, &mut visited);
        pages
    }

    fn collect_pages(&self, objid: u32, out: &mut Vec<u32>, visited: &mut FxHashSet<u32>) {
        if !visited.insert(objid) {
            return;
        }
        let Some(dict) = self.objects.get(&objid).and_then(|o| o.as_dict().ok()) else {
            return;
        };
        match dict.get("Kids") {
            Some(kids) => {
                if let Ok(kids) = self.resolve(kids).as_array() {
                    for kid in kids {
                        if let PDFObject::Ref(r) = kid {
                            self.collect_pages(r.objid, out, visited);
                        }
                    }
                }
            }
            None => out.push(objid),
        }
    }

    /// Append a page dictionary to the root page tree and return its reference.
    pub fn add_page(&mut self, mut page: Dictionary) -> Result<PDFObjRef> {
        let pages_ref = match self.catalog().and_then(|c| c.get("Pages")) {
            Some(PDFObject::Ref(r)) => *r,
            _ => return Err(PdfError::KeyError("Pages".into())),
        };
        page.insert("Type".into(), PDFObject::Name("Page".into()));
        page.insert("Parent".into(), PDFObject::Ref(pages_ref));
        let page_ref = self.add_object(PDFObject::Dict(page));
        if let PDFObject::Dict(pages) = self.getobj_mut(pages_ref.objid)? {
            if let Some(PDFObject::Array(kids)) = pages.get_mut("Kids") {
                kids.push(PDFObject::Ref(page_ref));
            }
            let count = pages.get("Count").and_then(|c| c.as_int().ok()).unwrap_or(0);
            pages.insert("Count".into(), PDFObject::Int(count + 1));
        }
        Ok(page_ref)
    }

    /// Look up a page attribute, walking up `Parent` links for inheritable keys.
    pub fn page_attr(&self, page_objid: u32, name: &str) -> Option<&PDFObject> {
        let mut dict = self.getobj(page_objid).ok()?.as_dict().ok()?;
        for _ in 0..MAX_PAGE_TREE_LEVEL {
            if let Some(obj) = self.dict_get(dict, name) {
                return Some(obj);
            }
            let parent = self.dict_get_dict(dict, "Parent")?;
            if std::ptr::eq(parent, dict) {
                return None;
            }
            dict = parent;
        }
        None
    }

    /// Decode a stream's filter chain.
    pub fn decode_stream(&self, stream: &PDFStream) -> Result<Vec<u8>> {
        let filters: Vec<String> = match stream.get("Filter").map(|f| self.resolve(f)) {
            Some(PDFObject::Name(name)) => vec![name.clone()],
            Some(PDFObject::Array(items)) => items
                .iter()
                .filter_map(|item| self.resolve(item).as_name().ok().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        if filters.is_empty() {
            return Ok(stream.get_rawdata().to_vec());
        }
        let params: Vec<Option<&Dictionary>> =
            match stream.get("DecodeParms").map(|p| self.resolve(p)) {
                Some(PDFObject::Dict(d)) => vec![Some(d)],
                Some(PDFObject::Array(items)) => items
                    .iter()
                    .map(|item| self.resolve(item).as_dict().ok())
                    .collect(),
                _ => Vec::new(),
            };
        codec::decode_filters(stream.get_rawdata(), &filters, &params)
    }

    /// Object numbers referenced from more than one place.
    ///
    /// The walk starts at the trailer. A reference from an object to itself,
    /// or back to any object on the current path (a cycle), does not count.
    pub fn objects_with_multiple_references(&self) -> FxHashSet<u32> {
        let mut counts: FxHashMap<u32, usize> = FxHashMap::default();
        let mut visited: FxHashSet<u32> = FxHashSet::default();
        let mut path: Vec<u32> = Vec::new();
        for value in self.trailer.values() {
            self.count_references(value, &mut counts, &mut visited, &mut path);
        }
        counts
            .into_iter()
            .filter(|&(_, n)| n > 1)
            .map(|(objid, _)| objid)
            .collect()
    }

    fn count_references(
        &self,
        obj: &PDFObject,
        counts: &mut FxHashMap<u32, usize>,
        visited: &mut FxHashSet<u32>,
        path: &mut Vec<u32>,
    ) {
        match obj {
            PDFObject::Ref(r) => {
                if path.contains(&r.objid) {
                    return;
                }
                *counts.entry(r.objid).or_default() += 1;
                if !visited.insert(r.objid) {
                    return;
                }
                if let Some(target) = self.objects.get(&r.objid) {
                    path.push(r.objid);
                    self.count_references(target, counts, visited, path);
                    path.pop();
                }
            }
            PDFObject::Array(items) => {
                for item in items {
                    self.count_references(item, counts, visited, path);
                }
            }
            PDFObject::Dict(dict) => {
                for value in dict.values() {
                    self.count_references(value, counts, visited, path);
                }
            }
            PDFObject::Stream(stream) => {
                for value in stream.attrs.values() {
                    self.count_references(value, counts, visited, path);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(entries: Vec<(&str, PDFObject)>) -> PDFObject {
        PDFObject::Dict(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn resolve_follows_chains() {
        let mut doc = Document::new();
        let a = doc.add_object(PDFObject::Int(7));
        let b = doc.add_object(PDFObject::Ref(a));
        assert_eq!(doc.resolve(&PDFObject::Ref(b)), &PDFObject::Int(7));
        assert!(doc.resolve(&PDFObject::Ref(PDFObjRef::new(99, 0))).is_null());
    }

    #[test]
    fn self_reference_is_not_shared() {
        let mut doc = Document::new();
        doc.set_object(1, dict(vec![("Me", PDFObject::Ref(PDFObjRef::new(1, 0)))]));
        doc.trailer_mut()
            .insert("Root".into(), PDFObject::Ref(PDFObjRef::new(1, 0)));
        assert!(doc.objects_with_multiple_references().is_empty());
    }

    #[test]
    fn cycle_back_edge_is_not_counted() {
        let mut doc = Document::new();
        doc.set_object(1, dict(vec![("Next", PDFObject::Ref(PDFObjRef::new(2, 0)))]));
        doc.set_object(2, dict(vec![("Prev", PDFObject::Ref(PDFObjRef::new(1, 0)))]));
        doc.trailer_mut()
            .insert("Root".into(), PDFObject::Ref(PDFObjRef::new(1, 0)));
        assert!(doc.objects_with_multiple_references().is_empty());
    }

    #[test]
    fn two_referrers_make_an_object_shared() {
        let mut doc = Document::new();
        let shared = doc.add_object(PDFObject::Int(1));
        let a = doc.add_object(dict(vec![("X", PDFObject::Ref(shared))]));
        let b = doc.add_object(dict(vec![("X", PDFObject::Ref(shared))]));
        doc.trailer_mut().insert(
            "Root".into(),
            PDFObject::Array(vec![PDFObject::Ref(a), PDFObject::Ref(b)]),
        );
        let multi = doc.objects_with_multiple_references();
        assert!(multi.contains(&shared.objid));
        assert!(!multi.contains(&a.objid));
    }

    #[test]
    fn page_attr_is_inherited() {
        let mut doc = Document::with_catalog();
        let page = doc.add_page(Dictionary::new()).unwrap();
        let pages = doc.page_objids();
        assert_eq!(pages, vec![page.objid]);
        let tree = doc.catalog().unwrap().get("Pages").cloned().unwrap();
        let tree_id = tree.as_ref().unwrap().objid;
        if let PDFObject::Dict(d) = doc.getobj_mut(tree_id).unwrap() {
            d.insert("Rotate".into(), PDFObject::Int(90));
        }
        assert_eq!(doc.page_attr(page.objid, "Rotate"), Some(&PDFObject::Int(90)));
    }
}
