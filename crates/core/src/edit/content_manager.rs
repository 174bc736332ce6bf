//! Read and rewrite the `Contents` entry of a page.
//!
//! `Contents` is either a single stream reference or an array of them,
//! held directly in the page dictionary or as its own indirect object.
//! Segment indexes used by the parser are positions in that array (0 for
//! a single stream).

use std::collections::BTreeSet;

use bytes::Bytes;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::model::objects::{Dictionary, PDFObjRef, PDFObject, PDFStream};
use crate::page::holder::PageObjectHolder;

/// How the page stores its content streams.
#[derive(Debug, Clone, PartialEq)]
enum Contents {
    None,
    Single(PDFObjRef),
    /// Array held in the page dictionary.
    Array(Vec<PDFObject>),
    /// Array stored as indirect object `objid`.
    IndirectArray(u32, Vec<PDFObject>),
}

/// Editor for the content streams of one page.
pub struct ContentManager<'a> {
    doc: &'a mut Document,
    page_objid: u32,
    to_remove: BTreeSet<usize>,
    shared: Option<FxHashSet<u32>>,
}

impl<'a> ContentManager<'a> {
    /// Manager for the page behind `holder`.
    pub fn new(doc: &'a mut Document, holder: &PageObjectHolder) -> Result<Self> {
        let page_objid = holder.dict_objid().ok_or(PdfError::NoHolderDict)?;
        Ok(Self::for_page(doc, page_objid))
    }

    pub fn for_page(doc: &'a mut Document, page_objid: u32) -> Self {
        Self {
            doc,
            page_objid,
            to_remove: BTreeSet::new(),
            shared: None,
        }
    }

    fn page_dict(&self) -> Result<&Dictionary> {
        self.doc.getobj(self.page_objid)?.as_dict()
    }

    fn page_dict_mut(&mut self) -> Result<&mut Dictionary> {
        match self.doc.getobj_mut(self.page_objid)? {
            PDFObject::Dict(dict) => Ok(dict),
            PDFObject::Stream(stream) => Ok(&mut stream.attrs),
            other => Err(PdfError::TypeError {
                expected: "dict",
                got: other.type_name(),
            }),
        }
    }

    fn contents(&self) -> Result<Contents> {
        let Some(entry) = self.page_dict()?.get("Contents") else {
            return Ok(Contents::None);
        };
        Ok(match entry {
            PDFObject::Array(items) => Contents::Array(items.clone()),
            PDFObject::Ref(r) => match self.doc.resolve(entry) {
                PDFObject::Array(items) => Contents::IndirectArray(r.objid, items.clone()),
                PDFObject::Stream(_) => Contents::Single(*r),
                other => {
                    debug!(objid = r.objid, kind = other.type_name(), "Contents is not a stream");
                    Contents::None
                }
            },
            other => {
                debug!(kind = other.type_name(), "unusable Contents entry");
                Contents::None
            }
        })
    }

    /// References of every segment, in order.
    fn stream_refs(&self) -> Result<Vec<Option<PDFObjRef>>> {
        Ok(match self.contents()? {
            Contents::None => Vec::new(),
            Contents::Single(r) => vec![Some(r)],
            Contents::Array(items) | Contents::IndirectArray(_, items) => items
                .iter()
                .map(|item| item.as_ref().ok().copied())
                .collect(),
        })
    }

    /// Number of content segments.
    pub fn stream_count(&self) -> usize {
        self.stream_refs().map_or(0, |refs| refs.len())
    }

    /// The stream of segment `index`, if it resolves to one.
    pub fn get_stream(&self, index: usize) -> Option<&PDFStream> {
        let r = self.stream_refs().ok()?.get(index).copied().flatten()?;
        self.doc.getobj(r.objid).ok()?.as_stream().ok()
    }

    /// Append a new segment holding `data` and return its index.
    ///
    /// A page without contents gets a single stream (index 0); a single
    /// stream becomes the array `[old, new]`.
    pub fn add_stream(&mut self, data: impl Into<Bytes>) -> Result<usize> {
        let contents = self.contents()?;
        let new_ref = self.new_stream(data);
        match contents {
            Contents::None => {
                self.page_dict_mut()?
                    .insert("Contents".into(), PDFObject::Ref(new_ref));
                Ok(0)
            }
            Contents::Single(old) => {
                self.page_dict_mut()?.insert(
                    "Contents".into(),
                    PDFObject::Array(vec![PDFObject::Ref(old), PDFObject::Ref(new_ref)]),
                );
                Ok(1)
            }
            Contents::Array(mut items) => {
                items.push(PDFObject::Ref(new_ref));
                let index = items.len() - 1;
                self.page_dict_mut()?
                    .insert("Contents".into(), PDFObject::Array(items));
                Ok(index)
            }
            Contents::IndirectArray(objid, mut items) => {
                items.push(PDFObject::Ref(new_ref));
                let index = items.len() - 1;
                self.doc.set_object(objid, PDFObject::Array(items));
                Ok(index)
            }
        }
    }

    /// Replace the data of segment `index`. Empty data schedules the
    /// segment for removal instead. A stream that other objects also
    /// reference is left alone and a fresh stream takes its slot.
    pub fn update_stream(&mut self, index: usize, data: impl Into<Bytes>) -> Result<()> {
        let refs = self.stream_refs()?;
        let slot = *refs.get(index).ok_or(PdfError::StreamIndexOutOfRange(index))?;
        let data = data.into();
        if data.is_empty() {
            self.to_remove.insert(index);
            return Ok(());
        }

        if let Some(r) = slot
            && !self.is_shared(r.objid)
            && let Ok(PDFObject::Stream(stream)) = self.doc.getobj_mut(r.objid)
        {
            stream.set_data_and_remove_filter(data);
            return Ok(());
        }

        debug!(index, "writing segment to a new stream");
        let new_ref = self.new_stream(data);
        self.replace_ref(index, new_ref)
    }

    /// Segments waiting for [`execute_scheduled_removals`](Self::execute_scheduled_removals).
    pub fn scheduled_removals(&self) -> &BTreeSet<usize> {
        &self.to_remove
    }

    /// Drop the segments scheduled by empty updates and renumber the
    /// segments of the holder's objects to match.
    pub fn execute_scheduled_removals(&mut self, holder: &mut PageObjectHolder) -> Result<()> {
        if holder.has_dirty_streams() {
            return Err(PdfError::DirtyStreams);
        }
        if self.to_remove.is_empty() {
            return Ok(());
        }
        let to_remove = std::mem::take(&mut self.to_remove);

        match self.contents()? {
            Contents::None => {}
            Contents::Single(_) => {
                if to_remove.contains(&0) {
                    self.page_dict_mut()?.remove("Contents");
                    holder.remap_content_streams(|_| None);
                    holder.set_all_ctms(Default::default());
                }
            }
            Contents::Array(mut items) => {
                remove_descending(&mut items, &to_remove);
                self.page_dict_mut()?
                    .insert("Contents".into(), PDFObject::Array(items));
                remap_holder(holder, &to_remove);
            }
            Contents::IndirectArray(objid, mut items) => {
                remove_descending(&mut items, &to_remove);
                self.doc.set_object(objid, PDFObject::Array(items));
                remap_holder(holder, &to_remove);
            }
        }
        Ok(())
    }

    fn is_shared(&mut self, objid: u32) -> bool {
        let doc = &*self.doc;
        self.shared
            .get_or_insert_with(|| doc.objects_with_multiple_references())
            .contains(&objid)
    }

    fn new_stream(&mut self, data: impl Into<Bytes>) -> PDFObjRef {
        let mut stream = PDFStream::new(Dictionary::new(), Bytes::new());
        stream.set_data_and_remove_filter(data);
        self.doc.add_object(PDFObject::Stream(Box::new(stream)))
    }

    fn replace_ref(&mut self, index: usize, new_ref: PDFObjRef) -> Result<()> {
        match self.contents()? {
            Contents::None => Err(PdfError::StreamIndexOutOfRange(index)),
            Contents::Single(_) => {
                self.page_dict_mut()?
                    .insert("Contents".into(), PDFObject::Ref(new_ref));
                Ok(())
            }
            Contents::Array(mut items) => {
                items[index] = PDFObject::Ref(new_ref);
                self.page_dict_mut()?
                    .insert("Contents".into(), PDFObject::Array(items));
                Ok(())
            }
            Contents::IndirectArray(objid, mut items) => {
                items[index] = PDFObject::Ref(new_ref);
                self.doc.set_object(objid, PDFObject::Array(items));
                Ok(())
            }
        }
    }
}

fn remove_descending(items: &mut Vec<PDFObject>, to_remove: &BTreeSet<usize>) {
    for &index in to_remove.iter().rev() {
        if index < items.len() {
            items.remove(index);
        }
    }
}

/// New index of `old` once `removed` are gone.
fn remapped_index(old: usize, removed: &BTreeSet<usize>) -> Option<usize> {
    if removed.contains(&old) {
        return None;
    }
    Some(old - removed.range(..old).count())
}

fn remap_holder(holder: &mut PageObjectHolder, removed: &BTreeSet<usize>) {
    holder.remap_content_streams(|old| remapped_index(old, removed));
    let ctms = holder
        .all_ctms()
        .iter()
        .filter_map(|(&old, &ctm)| Some((remapped_index(old, removed)?, ctm)))
        .collect();
    holder.set_all_ctms(ctms);
}
