//! PDF pages: geometry plus the parsed content.

use std::sync::Arc;

use tracing::debug;

use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::model::objects::PDFObject;
use crate::page::content_parser::{ContentParser, ParseOptions};
use crate::page::holder::{HolderKind, PageObjectHolder, ParseState, Transparency};
use crate::utils::{Matrix, Rect, mult_matrix, normalize_rect, rect_intersect, rect_is_empty};

/// Letter size, used when a page has no usable `MediaBox`.
const DEFAULT_MEDIABOX: Rect = (0.0, 0.0, 612.0, 792.0);

/// A page and the objects parsed from its content.
#[derive(Debug)]
pub struct Page {
    /// Page object number
    pub objid: u32,
    /// Media box (physical page size)
    pub mediabox: Rect,
    /// Crop box clipped to the media box; the visible area
    pub bbox: Rect,
    /// Clockwise quarter turns, 0 to 3
    pub rotate: u8,
    /// User unit (PDF 1.6) - scales default user space units. Default is 1.0.
    pub user_unit: f64,
    /// Page space to a rotated, origin-based space of `width` x `height`
    pub page_matrix: Matrix,
    /// Display width, after rotation
    pub width: f64,
    /// Display height, after rotation
    pub height: f64,
    holder: PageObjectHolder,
}

impl Page {
    /// Load the page dictionary `objid`. Inheritable attributes are taken
    /// from the page tree. The content is not parsed yet.
    pub fn load(doc: &Document, objid: u32) -> Result<Self> {
        let dict = doc.getobj(objid)?.as_dict().map_err(|_| PdfError::TypeError {
            expected: "dict",
            got: "non-dict page object",
        })?;

        let resources = doc
            .page_attr(objid, "Resources")
            .and_then(|r| r.as_dict().ok())
            .map(|r| Arc::new(r.clone()));

        let quarter_turns = doc
            .page_attr(objid, "Rotate")
            .and_then(|r| r.as_int().ok())
            .map_or(0, |r| (r / 90 % 4 + 4) % 4);
        let rotate = quarter_turns as u8;

        let mut mediabox = doc
            .page_attr(objid, "MediaBox")
            .and_then(PDFObject::to_rect)
            .unwrap_or(DEFAULT_MEDIABOX);
        if rect_is_empty(mediabox) {
            mediabox = DEFAULT_MEDIABOX;
        }
        let bbox = match doc.page_attr(objid, "CropBox").and_then(PDFObject::to_rect) {
            Some(crop) if !rect_is_empty(crop) => rect_intersect(normalize_rect(crop), mediabox),
            _ => mediabox,
        };

        let (x0, y0, x1, y1) = bbox;
        let (width, height) = if rotate % 2 == 1 {
            (y1 - y0, x1 - x0)
        } else {
            (x1 - x0, y1 - y0)
        };
        let page_matrix = match rotate {
            1 => (0.0, -1.0, 1.0, 0.0, -y0, x1),
            2 => (-1.0, 0.0, 0.0, -1.0, x1, y1),
            3 => (0.0, 1.0, -1.0, 0.0, y1, -x0),
            _ => (1.0, 0.0, 0.0, 1.0, -x0, -y0),
        };

        let user_unit = dict
            .get("UserUnit")
            .and_then(|u| doc.resolve(u).as_num().ok())
            .filter(|u| *u > 0.0)
            .unwrap_or(1.0);

        let mut holder = PageObjectHolder::new(HolderKind::Page, Some(objid));
        holder.set_resources(resources.clone());
        holder.set_page_resources(resources);
        holder.set_bbox(bbox);
        let group = doc.dict_get_dict(dict, "Group");
        holder.set_transparency(Transparency::PAGE.with_group(group));

        Ok(Self {
            objid,
            mediabox,
            bbox,
            rotate,
            user_unit,
            page_matrix,
            width,
            height,
            holder,
        })
    }

    pub fn holder(&self) -> &PageObjectHolder {
        &self.holder
    }

    pub fn holder_mut(&mut self) -> &mut PageObjectHolder {
        &mut self.holder
    }

    pub fn into_holder(self) -> PageObjectHolder {
        self.holder
    }

    /// Incremental parser over the page `Contents`.
    pub fn parser<'a>(&'a mut self, doc: &'a Document, options: ParseOptions) -> ContentParser<'a> {
        let contents = doc
            .getobj(self.objid)
            .ok()
            .and_then(|page| page.as_dict().ok())
            .and_then(|dict| dict.get("Contents"));
        ContentParser::for_page(doc, &mut self.holder, contents, options)
    }

    /// Parse all content unless parsing already started.
    pub fn parse_content(&mut self, doc: &Document, options: ParseOptions) {
        if self.holder.parse_state() != ParseState::NotParsed {
            debug!(objid = self.objid, "page content already parsed");
            return;
        }
        self.parser(doc, options).parse_to_end();
    }

    /// Page space to a device rectangle at `(x, y)` of `w` x `h`, turned
    /// by `rotate` extra quarter turns. Device y grows downwards.
    pub fn display_matrix(&self, x: i32, y: i32, w: i32, h: i32, rotate: i32) -> Option<Matrix> {
        if self.width == 0.0 || self.height == 0.0 {
            return None;
        }
        let (x, y, w, h) = (f64::from(x), f64::from(y), f64::from(w), f64::from(h));
        // Device positions of the page's top-left, bottom-left and
        // top-right corners.
        let ((x0, y0), (x1, y1), (x2, y2)) = match rotate.rem_euclid(4) {
            1 => ((x, y), (x + w, y), (x, y + h)),
            2 => ((x + w, y), (x + w, y + h), (x, y)),
            3 => ((x + w, y + h), (x, y + h), (x + w, y)),
            _ => ((x, y + h), (x, y), (x + w, y + h)),
        };
        let display = (
            (x2 - x0) / self.width,
            (y2 - y0) / self.width,
            (x1 - x0) / self.height,
            (y1 - y0) / self.height,
            x0,
            y0,
        );
        Some(mult_matrix(self.page_matrix, display))
    }
}
