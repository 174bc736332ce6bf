//! XObject, inline image, shading and marked-content operators.
//!
//! Handles: Do, BI, sh, BMC, BDC, EMC
//!
//! - Do: Draw an image or form XObject
//! - BI: Inline image (the dictionary, `ID` data and `EI` are read here)
//! - sh: Paint a shading over the clip
//! - BMC/BDC/EMC: Marked-content sequences

use std::rc::Rc;
use std::sync::Arc;

use tracing::debug;

use crate::interp::interpreter::ContentInterpreter;
use crate::interp::states::AllStates;
use crate::model::objects::{Dictionary, PDFObject, PDFStream};
use crate::page::form::Form;
use crate::page::object::{FormObject, ImageObject, PageObjectKind, ShadingObject};
use crate::parser::inline::{read_inline_stream, replace_abbreviations};
use crate::parser::lexer::{ContentLexer, Element};
use crate::utils::mult_matrix;

const DEVICE_COLOR_SPACES: [&str; 3] = ["DeviceRGB", "DeviceGray", "DeviceCMYK"];

#[allow(non_snake_case)]
impl ContentInterpreter<'_> {
    // ========================================================================
    // XObjects
    // ========================================================================

    /// Draws the named XObject.
    ///
    /// PDF operator: `Do`
    pub fn do_Do(&mut self, name: String) {
        // The same image drawn again reuses the stream already loaded.
        if let Some((last_name, stream)) = &self.last_image
            && *last_name == name
            && stream.objid.is_some()
        {
            let stream = Arc::clone(stream);
            self.add_image(stream, &name, false);
            return;
        }

        let doc = self.doc;
        let entry = self.find_resource_entry("XObject", &name);
        let Some(mut stream) = entry
            .as_ref()
            .and_then(|entry| doc.resolve(entry).as_stream().ok())
            .cloned()
        else {
            debug!(name, "XObject resource missing");
            self.resource_missing = true;
            return;
        };
        if stream.objid.is_none()
            && let Some(PDFObject::Ref(r)) = &entry
        {
            stream.set_objid(r.objid, r.genno);
        }

        let subtype = stream
            .get("Subtype")
            .and_then(|s| doc.resolve(s).as_name().ok())
            .map(str::to_string);
        match subtype.as_deref() {
            Some("Form") => self.add_form(Arc::new(stream), &name),
            Some("Image") => {
                let stream = Arc::new(stream);
                self.add_image(Arc::clone(&stream), &name, false);
                self.last_image = Some((name, stream));
            }
            other => debug!(name, subtype = ?other, "XObject of unknown subtype"),
        }
    }

    /// Appends an image object placed by the current CTM. Image masks also
    /// record their box with the holder.
    pub(crate) fn add_image(&mut self, stream: Arc<PDFStream>, name: &str, is_inline: bool) {
        let matrix = mult_matrix(self.states.ctm, self.content_to_user);
        let image = ImageObject {
            stream,
            matrix,
            is_inline,
        };
        let is_mask = image.is_mask();
        let mut obj = self.new_object(PageObjectKind::Image(image));
        self.set_graphic_states(&mut obj, is_mask, false, false);
        obj.calc_bounding_box();
        obj.set_resource_name(name);
        if is_mask {
            self.holder.add_image_mask_bbox(obj.bbox());
        }
        self.holder.append(obj);
    }

    /// Parses a form XObject into its own holder and appends it as one
    /// object. The form starts from the current drawing records but with
    /// an identity CTM; its placement lives in the form object's matrix.
    pub(crate) fn add_form(&mut self, stream: Arc<PDFStream>, name: &str) {
        let doc = self.doc;
        let status = AllStates::from_sub_records(&self.states);
        let mut form = Form::new(
            doc,
            self.page_resources.clone(),
            stream,
            self.resources.clone(),
        );
        form.parse_content(doc, Some(&status), None, Some(Rc::clone(&self.recursion)));

        let matrix = mult_matrix(self.states.ctm, self.content_to_user);
        let needs_alpha = form.holder().background_alpha_needed();
        let mut obj = self.new_object(PageObjectKind::Form(FormObject {
            form: Arc::new(form),
            matrix,
        }));
        obj.set_resource_name(name);
        if needs_alpha {
            self.holder.set_background_alpha_needed(true);
        }
        obj.calc_bounding_box();
        self.set_graphic_states(&mut obj, true, true, true);
        self.holder.append(obj);
    }

    // ========================================================================
    // Inline images
    // ========================================================================

    /// Reads an inline image: the dictionary up to `ID`, the sample data
    /// and everything up to `EI`. A keyword other than `ID` inside the
    /// dictionary abandons the image and rewinds.
    ///
    /// PDF operator: `BI`
    pub fn do_BI(&mut self, lexer: &mut ContentLexer<'_>) {
        let save_pos = lexer.tell();
        let mut dict = Dictionary::new();
        loop {
            let element = lexer.next_element();
            match element {
                Element::Keyword(word) if word != b"ID" => {
                    lexer.set_pos(save_pos);
                    self.sync_position(lexer);
                    return;
                }
                Element::Name(key) => match lexer.read_value() {
                    Some(value) => {
                        dict.insert(key, value);
                    }
                    None => {
                        dict.remove(&key);
                    }
                },
                _ => break,
            }
        }
        replace_abbreviations(&mut dict);

        let doc = self.doc;
        let mut cs = dict.get("ColorSpace").map(|obj| doc.resolve(obj).clone());
        let named = match &cs {
            Some(PDFObject::Name(name)) if !DEVICE_COLOR_SPACES.contains(&name.as_str()) => {
                Some(name.clone())
            }
            _ => None,
        };
        if let Some(cs_name) = named {
            let found = self.find_resource_entry("ColorSpace", &cs_name);
            if let Some(found) = &found
                && !matches!(found, PDFObject::Ref(_))
            {
                dict.insert("ColorSpace".into(), found.clone());
            }
            cs = found;
        }
        dict.insert("Subtype".into(), PDFObject::Name("Image".into()));
        let stream = read_inline_stream(lexer, doc, dict, cs.as_ref());

        loop {
            match lexer.next_element() {
                Element::EndOfData | Element::Keyword(b"EI") => break,
                _ => {}
            }
        }
        self.sync_position(lexer);

        if let Some(stream) = stream {
            self.add_image(Arc::new(stream), "", true);
        }
    }

    // ========================================================================
    // Shadings
    // ========================================================================

    /// Paints a shading resource, bounded by the clip (or the holder box
    /// when nothing clips).
    ///
    /// PDF operator: `sh`
    pub fn do_sh(&mut self, name: &str) {
        let Some(shading) = self.find_shading(name) else {
            return;
        };
        if !shading.is_shading_object || !shading.is_valid() {
            debug!(name, "unusable shading");
            return;
        }
        let matrix = mult_matrix(self.states.ctm, self.content_to_user);
        let mut obj = self.new_object(PageObjectKind::Shading(ShadingObject { shading, matrix }));
        self.set_graphic_states(&mut obj, false, false, false);
        let rect = if obj.clip_path.is_set() {
            obj.clip_path.get().clip_box()
        } else {
            self.bbox
        };
        obj.set_rect(rect);
        obj.set_resource_name(name);
        self.holder.append(obj);
    }

    // ========================================================================
    // Marked content
    // ========================================================================

    /// PDF operator: `BMC`
    pub fn do_BMC(&mut self, tag: &str) {
        let mut marks = self.marks.top().clone();
        marks.add_mark(tag);
        self.marks.push(marks);
    }

    /// Opens a marked sequence with properties given inline or by name in
    /// the `Properties` resource. Unresolvable properties open nothing.
    ///
    /// PDF operator: `BDC`
    pub fn do_BDC(&mut self, tag: &str, property: Option<PDFObject>) {
        let mut marks = self.marks.top().clone();
        match property {
            Some(PDFObject::Name(name)) => {
                let doc = self.doc;
                let Some(dict) = self
                    .find_resource_holder("Properties")
                    .and_then(|holder| holder.get(&name))
                    .and_then(|entry| doc.resolve(entry).as_dict().ok())
                    .cloned()
                else {
                    debug!(name, "marked-content properties missing");
                    return;
                };
                marks.add_mark_with_properties_holder(tag, dict, &name);
            }
            Some(PDFObject::Dict(dict)) => marks.add_mark_with_direct_dict(tag, dict),
            _ => return,
        }
        self.marks.push(marks);
    }

    /// PDF operator: `EMC`
    pub fn do_EMC(&mut self) {
        self.marks.pop();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    use crate::document::Document;
    use crate::interp::interpreter::{ContentInterpreter, InterpreterSetup};
    use crate::model::objects::{Dictionary, PDFObject, PDFStream};
    use crate::page::content_parser::RecursionState;
    use crate::page::holder::{HolderKind, PageObjectHolder};

    fn run_with(doc: &Document, resources: Option<Dictionary>, content: &[u8]) -> PageObjectHolder {
        let mut holder = PageObjectHolder::new(HolderKind::Page, None);
        {
            let resources = resources.map(Arc::new);
            let setup = InterpreterSetup {
                page_resources: resources.clone(),
                resources,
                bbox: (0.0, 0.0, 612.0, 792.0),
                ..InterpreterSetup::default()
            };
            let recursion = Rc::new(RefCell::new(RecursionState::new(40)));
            let mut interp = ContentInterpreter::new(doc, &mut holder, setup, recursion);
            interp.parse(content, 0, 0, &[0]);
        }
        holder
    }

    fn image_stream(mask: bool) -> PDFObject {
        let mut attrs = Dictionary::new();
        attrs.insert("Subtype".into(), PDFObject::Name("Image".into()));
        attrs.insert("Width".into(), PDFObject::Int(1));
        attrs.insert("Height".into(), PDFObject::Int(1));
        if mask {
            attrs.insert("ImageMask".into(), PDFObject::Bool(true));
        }
        PDFObject::Stream(Box::new(PDFStream::new(attrs, vec![0u8])))
    }

    fn xobject_resources(entries: Vec<(&str, PDFObject)>) -> Dictionary {
        let xobjects: Dictionary = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let mut resources = Dictionary::new();
        resources.insert("XObject".into(), PDFObject::Dict(xobjects));
        resources
    }

    #[test]
    fn image_xobject_uses_ctm() {
        let mut doc = Document::new();
        let im = doc.add_object(image_stream(false));
        let resources = xobject_resources(vec![("Im0", PDFObject::Ref(im))]);
        let holder = run_with(&doc, Some(resources), b"q 100 0 0 50 10 20 cm /Im0 Do Q /Im0 Do");
        assert_eq!(holder.len(), 2);
        let first = holder.get(0).unwrap();
        assert_eq!(first.bbox(), (10.0, 20.0, 110.0, 70.0));
        assert_eq!(first.resource_name(), "Im0");
        assert_eq!(holder.get(1).unwrap().bbox(), (0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn mask_images_record_their_box() {
        let mut doc = Document::new();
        let im = doc.add_object(image_stream(true));
        let resources = xobject_resources(vec![("M", PDFObject::Ref(im))]);
        let holder = run_with(&doc, Some(resources), b"2 0 0 2 0 0 cm /M Do");
        assert_eq!(holder.image_mask_bboxes(), &[(0.0, 0.0, 2.0, 2.0)]);
    }

    #[test]
    fn missing_xobject_is_skipped() {
        let doc = Document::new();
        let holder = run_with(&doc, None, b"/Nope Do 0 0 m 1 1 l S");
        assert_eq!(holder.len(), 1);
        assert_eq!(holder.get(0).unwrap().type_name(), "path");
    }

    #[test]
    fn form_xobject_becomes_one_object() {
        let mut doc = Document::new();
        let mut attrs = Dictionary::new();
        attrs.insert("Subtype".into(), PDFObject::Name("Form".into()));
        attrs.insert(
            "BBox".into(),
            PDFObject::Array(vec![
                PDFObject::Int(0),
                PDFObject::Int(0),
                PDFObject::Int(10),
                PDFObject::Int(10),
            ]),
        );
        let form = doc.add_object(PDFObject::Stream(Box::new(PDFStream::new(
            attrs,
            b"0 0 5 5 re f".to_vec(),
        ))));
        let resources = xobject_resources(vec![("Fm0", PDFObject::Ref(form))]);
        let holder = run_with(&doc, Some(resources), b"1 0 0 1 100 100 cm /Fm0 Do");
        assert_eq!(holder.len(), 1);
        let obj = holder.get(0).unwrap();
        let form = obj.as_form().unwrap();
        assert_eq!(form.form.holder().len(), 1);
        assert_eq!(obj.bbox(), (100.0, 100.0, 105.0, 105.0));
    }

    #[test]
    fn self_drawing_form_stops() {
        let mut doc = Document::new();
        let mut attrs = Dictionary::new();
        attrs.insert("Subtype".into(), PDFObject::Name("Form".into()));
        let form_ref = doc.add_object(PDFObject::Stream(Box::new(PDFStream::new(
            attrs,
            b"0 0 1 1 re f /Fm0 Do".to_vec(),
        ))));
        // The form has no resources of its own, so it finds itself again.
        let resources = xobject_resources(vec![("Fm0", PDFObject::Ref(form_ref))]);
        let holder = run_with(&doc, Some(resources), b"/Fm0 Do");
        let outer = holder.get(0).unwrap().as_form().unwrap();
        let inner = outer.form.holder().get(1).unwrap().as_form().unwrap();
        assert_eq!(inner.form.holder().len(), 0);
    }

    #[test]
    fn inline_image_is_read() {
        let doc = Document::new();
        let holder = run_with(
            &doc,
            None,
            b"q 10 0 0 10 0 0 cm BI /W 2 /H 1 /BPC 8 /CS /G ID \x01\x02 EI Q 0 0 m 1 0 l S",
        );
        assert_eq!(holder.len(), 2);
        let image = holder.get(0).unwrap().as_image().unwrap();
        assert!(image.is_inline);
        assert_eq!(image.stream.get_rawdata(), &[1, 2]);
        assert_eq!(
            image.stream.get("ColorSpace"),
            Some(&PDFObject::Name("DeviceGray".into()))
        );
        assert_eq!(holder.get(0).unwrap().bbox(), (0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn inline_image_with_stray_keyword_is_abandoned() {
        let doc = Document::new();
        let holder = run_with(&doc, None, b"BI /W 1 S 0 0 m 1 0 l S");
        assert_eq!(holder.len(), 1);
        assert_eq!(holder.get(0).unwrap().type_name(), "path");
    }

    #[test]
    fn marks_nest() {
        let doc = Document::new();
        let holder = run_with(
            &doc,
            None,
            b"/P <</MCID 3>> BDC /Span BMC 0 0 m 1 0 l S EMC EMC 0 0 m 1 0 l S",
        );
        let first = &holder.get(0).unwrap().marks;
        assert_eq!(first.len(), 2);
        assert_eq!(first.mcid(), Some(3));
        assert!(holder.get(1).unwrap().marks.is_empty());
    }

    #[test]
    fn unresolved_properties_open_nothing() {
        let doc = Document::new();
        let holder = run_with(&doc, None, b"/OC /oc1 BDC 0 0 m 1 0 l S EMC");
        assert!(holder.get(0).unwrap().marks.is_empty());
    }

    #[test]
    fn shading_fills_clip() {
        let mut doc = Document::new();
        let mut shading = Dictionary::new();
        shading.insert("ShadingType".into(), PDFObject::Int(2));
        shading.insert("ColorSpace".into(), PDFObject::Name("DeviceRGB".into()));
        let sh = doc.add_object(PDFObject::Dict(shading));
        let mut shadings = Dictionary::new();
        shadings.insert("Sh0".into(), PDFObject::Ref(sh));
        let mut resources = Dictionary::new();
        resources.insert("Shading".into(), PDFObject::Dict(shadings));
        let holder = run_with(&doc, Some(resources), b"/Sh0 sh 10 10 20 20 re W n /Sh0 sh");
        assert_eq!(holder.len(), 2);
        assert_eq!(holder.get(0).unwrap().bbox(), (0.0, 0.0, 612.0, 792.0));
        assert_eq!(holder.get(1).unwrap().bbox(), (10.0, 10.0, 30.0, 30.0));
    }
}
