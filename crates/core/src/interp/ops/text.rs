//! Text operators.
//!
//! Handles: BT, ET, Tc, Tw, Tz, TL, Tf, Tr, Ts, Td, TD, Tm, T*, Tj, TJ, ', ", d0, d1
//!
//! - BT/ET: Text object bounds, collecting clip text in between
//! - Tc, Tw, Tz, TL, Tf, Tr, Ts: Text state parameters
//! - Td, TD, Tm, T*: Text positioning
//! - Tj, TJ, ', ": Text showing, one text object per string group
//! - d0, d1: Type 3 glyph metrics

use std::mem;

use crate::interp::interpreter::ContentInterpreter;
use crate::model::objects::PDFObject;
use crate::model::state::TextRenderingMode;
use crate::page::object::{PageObjectKind, TextItem, TextObject};
use crate::utils::{MATRIX_IDENTITY, Matrix, Point, apply_matrix_pt, mult_matrix};

#[allow(non_snake_case)]
impl ContentInterpreter<'_> {
    // ========================================================================
    // Text object operators
    // ========================================================================

    /// Begins a text object: resets the text matrix and line position.
    ///
    /// PDF operator: `BT`
    pub fn do_BT(&mut self) {
        self.states.text_matrix = MATRIX_IDENTITY;
        self.on_change_text_matrix();
        self.states.reset_text_position();
        self.clip_texts.clear();
    }

    /// Ends a text object. Text shown in a clipping mode joins the clip.
    ///
    /// PDF operator: `ET`
    pub fn do_ET(&mut self) {
        if self.clip_texts.is_empty() {
            return;
        }
        let texts = mem::take(&mut self.clip_texts);
        if self.states.text.get().text_mode.is_clip() {
            self.states.clip_path.make_mut().append_texts(texts);
        }
    }

    // ========================================================================
    // Text state operators
    // ========================================================================

    /// PDF operator: `Tc`
    pub fn do_Tc(&mut self, space: f64) {
        self.states.text.make_mut().char_space = space;
    }

    /// PDF operator: `Tw`
    pub fn do_Tw(&mut self, space: f64) {
        self.states.text.make_mut().word_space = space;
    }

    /// PDF operator: `Tz`
    pub fn do_Tz(&mut self, scale: f64) {
        self.states.text.make_mut().horz_scale = scale / 100.0;
        self.on_change_text_matrix();
    }

    /// PDF operator: `TL`
    pub fn do_TL(&mut self, leading: f64) {
        self.states.text_leading = leading;
    }

    /// Sets the font size, and the font when the resource loads.
    ///
    /// PDF operator: `Tf`
    pub fn do_Tf(&mut self, name: &str, size: f64) {
        self.states.text.make_mut().font_size = size;
        if let Some(font) = self.find_font(name) {
            self.states.text.make_mut().font = Some(font);
        }
    }

    /// PDF operator: `Tr`
    pub fn do_Tr(&mut self, mode: i64) {
        if let Some(mode) = TextRenderingMode::from_int(mode) {
            self.states.text.make_mut().text_mode = mode;
        }
    }

    /// PDF operator: `Ts`
    pub fn do_Ts(&mut self, rise: f64) {
        self.states.text.make_mut().rise = rise;
    }

    // ========================================================================
    // Text positioning operators
    // ========================================================================

    /// PDF operator: `Td`
    pub fn do_Td(&mut self, offset: Point) {
        self.states.move_text_point(offset);
    }

    /// `Td` that also sets the leading to `-ty`.
    ///
    /// PDF operator: `TD`
    pub fn do_TD(&mut self, offset: Point) {
        self.states.text_leading = -offset.1;
        self.do_Td(offset);
    }

    /// PDF operator: `Tm`
    pub fn do_Tm(&mut self, matrix: Matrix) {
        self.states.text_matrix = matrix;
        self.on_change_text_matrix();
        self.states.reset_text_position();
    }

    /// PDF operator: `T*`
    pub fn do_T_star(&mut self) {
        self.states.move_to_next_line();
    }

    /// Recomputes the text-space-to-device 2×2 matrix kept in the text
    /// state after the text matrix, CTM or horizontal scale changes.
    pub(crate) fn on_change_text_matrix(&mut self) {
        let horz_scale = self.states.text.get().horz_scale;
        let scale = (horz_scale, 0.0, 0.0, 1.0, 0.0, 0.0);
        let m = mult_matrix(
            mult_matrix(mult_matrix(scale, self.states.text_matrix), self.states.ctm),
            self.content_to_user,
        );
        self.states.text.make_mut().matrix = [m.0, m.2, m.1, m.3];
    }

    // ========================================================================
    // Text showing operators
    // ========================================================================

    /// PDF operator: `Tj`
    pub fn do_Tj(&mut self, text: &[u8]) {
        if text.is_empty() {
            return;
        }
        self.add_text_object(&[text.to_vec()], 0.0, &[], 1);
    }

    /// Shows strings with individual glyph adjustments. Numbers before the
    /// first string move the start point; the others become kerning items.
    ///
    /// PDF operator: `TJ`
    pub fn do_TJ(&mut self, array: Option<PDFObject>) {
        let Some(PDFObject::Array(items)) = array else {
            return;
        };
        let doc = self.doc;
        let items: Vec<&PDFObject> = items.iter().map(|item| doc.resolve(item)).collect();
        let nsegs = items
            .iter()
            .filter(|item| matches!(item, PDFObject::String(_)))
            .count();
        if nsegs == 0 {
            for item in &items {
                let kerning = item.number();
                if kerning != 0.0 {
                    self.shift_text_position(kerning);
                }
            }
            return;
        }

        let mut strs: Vec<Vec<u8>> = Vec::with_capacity(nsegs);
        let mut kernings: Vec<f64> = Vec::with_capacity(nsegs);
        let mut init_kerning = 0.0;
        for item in items {
            match item {
                PDFObject::String(bytes) => {
                    if bytes.is_empty() {
                        continue;
                    }
                    strs.push(bytes.clone());
                    kernings.push(0.0);
                }
                other => {
                    let num = other.number();
                    match kernings.last_mut() {
                        Some(last) => *last += num,
                        None => init_kerning += num,
                    }
                }
            }
        }
        let nsegs = strs.len();
        self.add_text_object(&strs, init_kerning, &kernings, nsegs);
    }

    /// PDF operator: `'`
    pub fn do_quote(&mut self, text: &[u8]) {
        self.do_T_star();
        self.do_Tj(text);
    }

    /// PDF operator: `"`
    pub fn do_doublequote(&mut self, word_space: f64, char_space: f64, text: &[u8]) {
        {
            let state = self.states.text.make_mut();
            state.word_space = word_space;
            state.char_space = char_space;
        }
        self.do_quote(text);
    }

    /// Moves the text position back by a `TJ` adjustment, along the
    /// writing direction of the current font.
    fn shift_text_position(&mut self, kerning: f64) {
        let text = self.states.text.get();
        let vertical = text.font.as_ref().is_some_and(|font| font.is_vertical());
        let shift = kerning * text.font_size / 1000.0;
        if vertical {
            self.states.text_pos.1 -= shift;
        } else {
            self.states.text_pos.0 -= shift * text.horz_scale;
        }
    }

    /// Emits one text object for `strs`, separated by `kernings`, and
    /// advances the text position past it.
    pub(crate) fn add_text_object(
        &mut self,
        strs: &[Vec<u8>],
        init_kerning: f64,
        kernings: &[f64],
        nsegs: usize,
    ) {
        let Some(font) = self.states.text.get().font.clone() else {
            return;
        };
        if init_kerning != 0.0 {
            self.shift_text_position(init_kerning);
        }
        if nsegs == 0 {
            return;
        }

        let text_mode = if font.as_type3().is_some() {
            TextRenderingMode::Fill
        } else {
            self.states.text.get().text_mode
        };

        let mut items = Vec::new();
        for (i, bytes) in strs.iter().take(nsegs).enumerate() {
            items.extend(
                font.char_codes(bytes)
                    .into_iter()
                    .map(|code| TextItem::Glyph { code, origin: 0.0 }),
            );
            if i + 1 < nsegs {
                items.push(TextItem::Kerning(kernings.get(i).copied().unwrap_or(0.0)));
            }
        }

        if let Some(type3) = font.as_type3() {
            for item in &items {
                if let TextItem::Glyph { code, .. } = item {
                    type3.load_char(*code, self.doc, self.page_resources.as_ref(), &self.recursion);
                }
            }
        }

        let pos = apply_matrix_pt(self.content_to_user, self.states.transformed_text_position());
        let mut obj = self.new_object(PageObjectKind::Text(TextObject { items, pos }));
        self.set_graphic_states(&mut obj, true, true, true);
        if text_mode.is_stroke() {
            let ctm = self.states.ctm;
            obj.text_state.make_mut().ctm = [ctm.0, ctm.2, ctm.1, ctm.3];
        }
        let horz_scale = self.states.text.get().horz_scale;
        let (dx, dy) = obj.calc_text_position(horz_scale);
        self.states.increment_text_position(dx, dy);
        if text_mode.is_clip() {
            self.clip_texts.push(obj.clone());
        }
        self.holder.append(obj);

        if let Some(&last) = kernings.get(nsegs - 1)
            && last != 0.0
        {
            self.shift_text_position(last);
        }
    }

    // ========================================================================
    // Type 3 glyph metrics
    // ========================================================================

    /// Glyph width for a colored Type 3 glyph.
    ///
    /// PDF operator: `d0`
    pub fn do_d0(&mut self, wx: f64, wy: f64) {
        self.type3_data[0] = wx;
        self.type3_data[1] = wy;
        self.colored = true;
    }

    /// Glyph width and box for an uncolored Type 3 glyph.
    ///
    /// PDF operator: `d1`
    pub fn do_d1(&mut self, values: &[f64]) {
        for (slot, value) in self.type3_data.iter_mut().zip(values) {
            *slot = *value;
        }
        self.colored = false;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::document::Document;
    use crate::interp::interpreter::{ContentInterpreter, InterpreterSetup};
    use crate::interp::states::AllStates;
    use crate::page::content_parser::RecursionState;
    use crate::page::holder::{HolderKind, PageObjectHolder};
    use crate::page::object::TextItem;

    fn run(content: &[u8]) -> (PageObjectHolder, AllStates) {
        let doc = Document::new();
        let mut holder = PageObjectHolder::new(HolderKind::Page, None);
        let states;
        {
            let recursion = Rc::new(RefCell::new(RecursionState::new(40)));
            let mut interp =
                ContentInterpreter::new(&doc, &mut holder, InterpreterSetup::default(), recursion);
            interp.parse(content, 0, 0, &[0]);
            states = interp.states().clone();
        }
        (holder, states)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn tj_places_run_and_advances() {
        let (holder, states) = run(b"BT /F1 10 Tf 100 700 Td (AA) Tj ET");
        assert_eq!(holder.len(), 1);
        let text = holder.get(0).unwrap().as_text().unwrap();
        assert_eq!(text.pos, (100.0, 700.0));
        assert_eq!(text.items.len(), 2);
        // Helvetica `A` is 667 units wide.
        assert!(approx(states.text_pos.0, 113.34));
        assert_eq!(states.text_line_pos, (100.0, 700.0));
    }

    #[test]
    fn tj_kerning_between_strings() {
        let (holder, _) = run(b"BT /F1 10 Tf [(A) -500 (A) 0 ()] TJ ET");
        let text = holder.get(0).unwrap().as_text().unwrap();
        assert!(matches!(text.items[1], TextItem::Kerning(k) if k == -500.0));
        assert_eq!(text.items.len(), 3);
    }

    #[test]
    fn tj_numbers_only_move_the_position() {
        let (holder, states) = run(b"BT /F1 10 Tf 200 Tz [-1000] TJ ET");
        assert!(holder.is_empty());
        assert!(approx(states.text_pos.0, 20.0));
    }

    #[test]
    fn leading_kerning_moves_start() {
        let (holder, _) = run(b"BT /F1 10 Tf [-1000 (A)] TJ ET");
        let text = holder.get(0).unwrap().as_text().unwrap();
        assert!(approx(text.pos.0, 10.0));
    }

    #[test]
    fn quote_operators_move_to_next_line() {
        let (holder, states) = run(b"BT /F1 10 Tf 14 TL 0 100 Td (A) ' 2 1 (A) \" ET");
        assert_eq!(holder.len(), 2);
        assert_eq!(holder.get(0).unwrap().as_text().unwrap().pos, (0.0, 86.0));
        assert_eq!(holder.get(1).unwrap().as_text().unwrap().pos, (0.0, 72.0));
        let text = states.text.get();
        assert_eq!((text.word_space, text.char_space), (2.0, 1.0));
    }

    #[test]
    fn td_sets_leading() {
        let (_, states) = run(b"BT 0 -12 TD T* ET");
        assert_eq!(states.text_leading, 12.0);
        assert_eq!(states.text_line_pos, (0.0, -24.0));
    }

    #[test]
    fn text_matrix_follows_ctm_and_scale() {
        let (_, states) = run(b"2 0 0 2 0 0 cm BT 50 Tz 1 0 0 1 10 10 Tm ET");
        assert_eq!(states.text.get().matrix, [1.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn clip_text_joins_clip_at_et() {
        let (holder, states) = run(b"BT /F1 10 Tf 7 Tr (A) Tj ET");
        assert_eq!(holder.len(), 1);
        assert!(states.clip_path.is_set());
        assert_eq!(states.clip_path.get().text_count(), 2);
    }

    #[test]
    fn invalid_render_mode_is_ignored() {
        let (_, states) = run(b"BT 2 Tr 9 Tr ET");
        assert_eq!(states.text.get().text_mode.as_int(), 2);
    }
}
