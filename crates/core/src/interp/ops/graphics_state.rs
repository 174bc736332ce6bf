//! Graphics state operators.
//!
//! Handles: q, Q, cm, w, J, j, M, d, ri, i, gs
//!
//! - q/Q: Push/pop the complete state
//! - cm: Prepend a matrix to the CTM
//! - w, J, j, M, d: Stroke parameters
//! - ri, i: Rendering intent and flatness
//! - gs: Merge an ExtGState resource

use std::sync::Arc;

use tracing::debug;

use crate::interp::interpreter::ContentInterpreter;
use crate::model::objects::{Dictionary, PDFObject};
use crate::model::state::{BlendMode, LineCap, LineJoin, RenderingIntent};
use crate::utils::Matrix;

/// ExtGState flags are booleans but integers show up in the wild.
fn flag(obj: &PDFObject) -> bool {
    match obj {
        PDFObject::Bool(b) => *b,
        other => other.as_int().unwrap_or(0) != 0,
    }
}

/// A transfer or generation function; the name `Default`/`Identity` resets.
fn function_or_none(obj: &PDFObject) -> Option<PDFObject> {
    (!obj.is_name()).then(|| obj.clone())
}

#[allow(non_snake_case)]
impl ContentInterpreter<'_> {
    /// Saves the complete graphics state.
    ///
    /// PDF operator: `q`
    pub fn do_q(&mut self) {
        self.state_stack.push(self.states.clone());
    }

    /// Restores the last saved state. An unbalanced `Q` is ignored.
    ///
    /// PDF operator: `Q`
    pub fn do_Q(&mut self) {
        if let Some(states) = self.state_stack.pop() {
            self.states = states;
        }
    }

    /// PDF operator: `cm`
    pub fn do_cm(&mut self, matrix: Matrix) {
        self.states.prepend_ctm(matrix);
        self.on_change_text_matrix();
    }

    /// PDF operator: `w`
    pub fn do_w(&mut self, width: f64) {
        self.states.graph.make_mut().line_width = width;
    }

    /// PDF operator: `J`
    pub fn do_J(&mut self, cap: i64) {
        if let Some(cap) = LineCap::from_int(cap) {
            self.states.graph.make_mut().line_cap = cap;
        }
    }

    /// PDF operator: `j`
    pub fn do_j(&mut self, join: i64) {
        if let Some(join) = LineJoin::from_int(join) {
            self.states.graph.make_mut().line_join = join;
        }
    }

    /// PDF operator: `M`
    pub fn do_M(&mut self, limit: f64) {
        self.states.graph.make_mut().miter_limit = limit;
    }

    /// Sets the dash array and phase. Anything but an array is ignored.
    ///
    /// PDF operator: `d`
    pub fn do_d(&mut self, array: Option<PDFObject>, phase: f64) {
        let Some(array @ PDFObject::Array(_)) = array else {
            return;
        };
        self.set_line_dash(&array, phase);
    }

    fn set_line_dash(&mut self, array: &PDFObject, phase: f64) {
        let graph = self.states.graph.make_mut();
        graph.dash_array = array.numbers();
        graph.dash_phase = phase;
    }

    /// PDF operator: `ri`
    pub fn do_ri(&mut self, intent: &str) {
        if let Some(intent) = RenderingIntent::from_name(intent) {
            self.states.general.make_mut().rendering_intent = intent;
        }
    }

    /// PDF operator: `i`
    pub fn do_i(&mut self, flatness: f64) {
        self.states.general.make_mut().flatness = flatness;
    }

    /// Applies an ExtGState resource.
    ///
    /// PDF operator: `gs`
    pub fn do_gs(&mut self, name: &str) {
        let doc = self.doc;
        let Some(dict) = self
            .find_resource_entry("ExtGState", name)
            .and_then(|entry| doc.resolve(&entry).as_dict().ok().cloned())
        else {
            debug!(name, "ExtGState resource missing");
            self.resource_missing = true;
            return;
        };
        self.states
            .general
            .make_mut()
            .append_graphics_state_name(name);
        self.process_ext_gs(&dict);
    }

    /// Merges every recognized entry of an ExtGState dictionary into the
    /// current state.
    pub(crate) fn process_ext_gs(&mut self, gs: &Dictionary) {
        let doc = self.doc;
        for (key, value) in gs {
            let obj = doc.resolve(value);
            if obj.is_null() {
                continue;
            }
            match key.as_str() {
                "LW" => self.states.graph.make_mut().line_width = obj.number(),
                "LC" => self.do_J(obj.as_int().unwrap_or(0)),
                "LJ" => self.do_j(obj.as_int().unwrap_or(0)),
                "ML" => self.states.graph.make_mut().miter_limit = obj.number(),
                "D" => {
                    let Ok(items) = obj.as_array() else {
                        continue;
                    };
                    let Some(dash @ PDFObject::Array(_)) = items.first().map(|d| doc.resolve(d))
                    else {
                        continue;
                    };
                    let phase = items.get(1).map_or(0.0, |p| doc.resolve(p).number());
                    self.set_line_dash(dash, phase);
                }
                "RI" => {
                    if let Ok(intent) = obj.as_name() {
                        self.do_ri(intent);
                    }
                }
                "Font" => {
                    let Ok(items) = obj.as_array() else {
                        continue;
                    };
                    let size = items.get(1).map_or(0.0, |s| doc.resolve(s).number());
                    let font = match items.first() {
                        Some(PDFObject::Name(name)) => self.find_font(name),
                        Some(entry) => self.load_font_entry(entry),
                        None => None,
                    };
                    let text = self.states.text.make_mut();
                    text.font_size = size;
                    if font.is_some() {
                        text.font = font;
                    }
                }
                "TR" if gs.contains_key("TR2") => {}
                "TR" | "TR2" => {
                    self.states.general.make_mut().transfer_function = function_or_none(obj);
                }
                "BM" => {
                    let name = match obj {
                        PDFObject::Array(modes) => modes
                            .first()
                            .map(|m| doc.resolve(m).string_value())
                            .unwrap_or_default(),
                        other => other.string_value(),
                    };
                    let mode = BlendMode::from_name(&name);
                    self.states.general.make_mut().blend_mode = mode;
                    if mode.needs_background_alpha() {
                        self.holder.set_background_alpha_needed(true);
                    }
                }
                "SMask" => {
                    let ctm = self.states.ctm;
                    let general = self.states.general.make_mut();
                    match obj.as_dict() {
                        Ok(mask) => {
                            general.soft_mask = Some(Arc::new(mask.clone()));
                            general.soft_mask_matrix = ctm;
                        }
                        Err(_) => general.soft_mask = None,
                    }
                }
                "CA" => self.states.general.make_mut().set_stroke_alpha(obj.number()),
                "ca" => self.states.general.make_mut().set_fill_alpha(obj.number()),
                "OP" => {
                    let on = flag(obj);
                    let general = self.states.general.make_mut();
                    general.stroke_overprint = on;
                    if !gs.contains_key("op") {
                        general.fill_overprint = on;
                    }
                }
                "op" => self.states.general.make_mut().fill_overprint = flag(obj),
                "OPM" => {
                    self.states.general.make_mut().overprint_mode = obj.as_int().unwrap_or(0);
                }
                "BG" if gs.contains_key("BG2") => {}
                "BG" | "BG2" => {
                    self.states.general.make_mut().black_generation = Some(obj.clone());
                }
                "UCR" if gs.contains_key("UCR2") => {}
                "UCR" | "UCR2" => {
                    self.states.general.make_mut().undercolor_removal = Some(obj.clone());
                }
                "HT" => self.states.general.make_mut().halftone = Some(obj.clone()),
                "FL" => self.states.general.make_mut().flatness = obj.number(),
                "SM" => self.states.general.make_mut().smoothness = obj.number(),
                "SA" => self.states.general.make_mut().stroke_adjust = flag(obj),
                "AIS" => self.states.general.make_mut().alpha_is_shape = flag(obj),
                "TK" => self.states.general.make_mut().text_knockout = flag(obj),
                _ => {}
            }
        }
        let ctm = self.states.ctm;
        self.states.general.make_mut().matrix = ctm;
    }
}
