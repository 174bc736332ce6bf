//! The complete graphics state saved by `q` and restored by `Q`.

use crate::model::clip::ClipPath;
use crate::model::state::{ColorState, GeneralState, GraphState, SharedState, TextState};
use crate::utils::{MATRIX_IDENTITY, Matrix, Point, apply_matrix_pt, mult_matrix};

/// Shared sub-records plus the transforms and text positioning that are
/// copied by value.
///
/// Cloning only bumps reference counts on the shared records.
#[derive(Debug, Clone)]
pub struct AllStates {
    pub general: SharedState<GeneralState>,
    pub graph: SharedState<GraphState>,
    pub text: SharedState<TextState>,
    pub color: SharedState<ColorState>,
    pub clip_path: ClipPath,
    pub ctm: Matrix,
    /// CTM inherited from the enclosing form or page.
    pub parent_matrix: Matrix,
    pub text_matrix: Matrix,
    pub text_pos: Point,
    pub text_line_pos: Point,
    pub text_leading: f64,
}

impl Default for AllStates {
    fn default() -> Self {
        Self {
            general: SharedState::Unset,
            graph: SharedState::Unset,
            text: SharedState::Unset,
            color: SharedState::Unset,
            clip_path: ClipPath::Unset,
            ctm: MATRIX_IDENTITY,
            parent_matrix: MATRIX_IDENTITY,
            text_matrix: MATRIX_IDENTITY,
            text_pos: (0.0, 0.0),
            text_line_pos: (0.0, 0.0),
            text_leading: 0.0,
        }
    }
}

impl AllStates {
    /// Fresh state with every sub-record materialized.
    pub fn with_defaults() -> Self {
        let mut states = Self::default();
        states.emplace_all();
        states
    }

    /// Materialize any unset sub-record.
    pub fn emplace_all(&mut self) {
        self.general.emplace();
        self.graph.emplace();
        self.text.emplace();
        self.color.emplace();
    }

    /// Copy only the four drawing sub-records from `other`, leaving the
    /// transforms, clip and text positioning at their defaults.
    pub fn from_sub_records(other: &Self) -> Self {
        Self {
            general: other.general.clone(),
            graph: other.graph.clone(),
            text: other.text.clone(),
            color: other.color.clone(),
            ..Self::default()
        }
    }

    /// `ctm = m × ctm`: `m` applies first.
    pub fn prepend_ctm(&mut self, m: Matrix) {
        self.ctm = mult_matrix(m, self.ctm);
    }

    pub fn reset_text_position(&mut self) {
        self.text_line_pos = (0.0, 0.0);
        self.text_pos = (0.0, 0.0);
    }

    /// `Td`: offset the line start and move there.
    pub fn move_text_point(&mut self, delta: Point) {
        self.text_line_pos.0 += delta.0;
        self.text_line_pos.1 += delta.1;
        self.text_pos = self.text_line_pos;
    }

    /// `T*`: next line by the leading.
    pub fn move_to_next_line(&mut self) {
        self.text_line_pos.1 -= self.text_leading;
        self.text_pos = self.text_line_pos;
    }

    pub fn increment_text_position(&mut self, dx: f64, dy: f64) {
        self.text_pos.0 += dx;
        self.text_pos.1 += dy;
    }

    /// Current text position with rise, mapped through the text matrix
    /// and then the CTM.
    pub fn transformed_text_position(&self) -> Point {
        let rise = self.text.get().rise;
        let pos = apply_matrix_pt(self.text_matrix, (self.text_pos.0, self.text_pos.1 + rise));
        apply_matrix_pt(self.ctm, pos)
    }
}
