//! Color operators.
//!
//! Handles: G, g, RG, rg, K, k, CS, cs, SC, SCN, sc, scn
//!
//! Uppercase operators set the stroke color, lowercase the fill color.

use crate::interp::interpreter::ContentInterpreter;
use crate::model::color::{ColorSpaceFamily, PDFColorSpace};

#[allow(non_snake_case)]
impl ContentInterpreter<'_> {
    // ========================================================================
    // Device colors
    // ========================================================================

    /// PDF operator: `G`
    pub fn do_G(&mut self, gray: f64) {
        let cs = PDFColorSpace::stock(ColorSpaceFamily::DeviceGray);
        self.states.color.make_mut().set_stroke_color(Some(cs), &[gray]);
    }

    /// PDF operator: `g`
    pub fn do_g(&mut self, gray: f64) {
        let cs = PDFColorSpace::stock(ColorSpaceFamily::DeviceGray);
        self.states.color.make_mut().set_fill_color(Some(cs), &[gray]);
    }

    /// PDF operator: `RG`
    pub fn do_RG(&mut self, rgb: &[f64]) {
        let cs = PDFColorSpace::stock(ColorSpaceFamily::DeviceRGB);
        self.states.color.make_mut().set_stroke_color(Some(cs), rgb);
    }

    /// PDF operator: `rg`
    pub fn do_rg(&mut self, rgb: &[f64]) {
        let cs = PDFColorSpace::stock(ColorSpaceFamily::DeviceRGB);
        self.states.color.make_mut().set_fill_color(Some(cs), rgb);
    }

    /// PDF operator: `K`
    pub fn do_K(&mut self, cmyk: &[f64]) {
        let cs = PDFColorSpace::stock(ColorSpaceFamily::DeviceCMYK);
        self.states.color.make_mut().set_stroke_color(Some(cs), cmyk);
    }

    /// PDF operator: `k`
    pub fn do_k(&mut self, cmyk: &[f64]) {
        let cs = PDFColorSpace::stock(ColorSpaceFamily::DeviceCMYK);
        self.states.color.make_mut().set_fill_color(Some(cs), cmyk);
    }

    // ========================================================================
    // Color spaces and components
    // ========================================================================

    /// Selects the stroke color space and resets the stroke color.
    ///
    /// PDF operator: `CS`
    pub fn do_CS(&mut self, name: &str) {
        if let Some(cs) = self.find_color_space(name) {
            self.states.color.make_mut().stroke_color.set_color_space(cs);
        }
    }

    /// Selects the fill color space and resets the fill color.
    ///
    /// PDF operator: `cs`
    pub fn do_cs(&mut self, name: &str) {
        if let Some(cs) = self.find_color_space(name) {
            self.states.color.make_mut().fill_color.set_color_space(cs);
        }
    }

    /// PDF operator: `SC`
    pub fn do_SC(&mut self, values: &[f64]) {
        self.states.color.make_mut().set_stroke_color(None, values);
    }

    /// PDF operator: `sc`
    pub fn do_sc(&mut self, values: &[f64]) {
        self.states.color.make_mut().set_fill_color(None, values);
    }

    /// Like `SC`, but a trailing name selects a pattern.
    ///
    /// PDF operator: `SCN`
    pub fn do_SCN(&mut self) {
        let count = self.operands.len();
        if count == 0 {
            return;
        }
        if !self.operands.is_name(0) {
            let values = self.operands.all_numbers();
            self.states.color.make_mut().set_stroke_color(None, &values);
            return;
        }
        let name = self.operands.string(0);
        let values = self.operands.numbers(count - 1);
        if let Some(pattern) = self.find_pattern(&name) {
            self.states
                .color
                .make_mut()
                .set_stroke_pattern(pattern, &values);
        }
    }

    /// Like `sc`, but a trailing name selects a pattern.
    ///
    /// PDF operator: `scn`
    pub fn do_scn(&mut self) {
        let count = self.operands.len();
        if count == 0 {
            return;
        }
        if !self.operands.is_name(0) {
            let values = self.operands.all_numbers();
            self.states.color.make_mut().set_fill_color(None, &values);
            return;
        }
        let name = self.operands.string(0);
        let values = self.operands.numbers(count - 1);
        if let Some(pattern) = self.find_pattern(&name) {
            self.states.color.make_mut().set_fill_pattern(pattern, &values);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::document::Document;
    use crate::interp::interpreter::{ContentInterpreter, InterpreterSetup};
    use crate::model::color::ColorSpaceFamily;
    use crate::page::content_parser::RecursionState;
    use crate::page::holder::{HolderKind, PageObjectHolder};

    fn fill_and_stroke(content: &[u8]) -> (Vec<f64>, Vec<f64>, ColorSpaceFamily) {
        let doc = Document::new();
        let mut holder = PageObjectHolder::new(HolderKind::Page, None);
        let recursion = Rc::new(RefCell::new(RecursionState::new(40)));
        let mut interp =
            ContentInterpreter::new(&doc, &mut holder, InterpreterSetup::default(), recursion);
        interp.parse(content, 0, 0, &[0]);
        let color = interp.states().color.get();
        let family = color
            .fill_color
            .color_space()
            .map_or(ColorSpaceFamily::DeviceGray, |cs| cs.family);
        (
            color.fill_color.values().to_vec(),
            color.stroke_color.values().to_vec(),
            family,
        )
    }

    #[test]
    fn device_operators_pick_their_space() {
        let (fill, stroke, family) = fill_and_stroke(b"0.1 0.2 0.3 rg 0.5 G");
        assert_eq!(fill, vec![0.1, 0.2, 0.3]);
        assert_eq!(stroke, vec![0.5]);
        assert_eq!(family, ColorSpaceFamily::DeviceRGB);
    }

    #[test]
    fn cs_resets_to_initial_color() {
        let (fill, _, family) = fill_and_stroke(b"0.5 g /DeviceCMYK cs");
        assert_eq!(fill, vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(family, ColorSpaceFamily::DeviceCMYK);
    }

    #[test]
    fn scn_without_pattern_sets_components() {
        let (fill, _, _) = fill_and_stroke(b"/DeviceRGB cs 1 0 0 scn");
        assert_eq!(fill, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn missing_pattern_keeps_color() {
        let (fill, _, family) = fill_and_stroke(b"0.25 g /P0 scn");
        assert_eq!(fill, vec![0.25]);
        assert_eq!(family, ColorSpaceFamily::DeviceGray);
    }
}
