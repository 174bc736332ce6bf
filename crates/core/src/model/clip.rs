//! Clipping paths.
//!
//! A clip is the intersection of every path and text layer appended to it.
//! It only ever shrinks; `Q` restores an earlier clip by swapping the
//! shared record back in.

use std::sync::{Arc, LazyLock};

use super::path::{FillType, Path};
use super::state::{SharedState, StateRecord};
use crate::page::object::PageObject;
use crate::utils::{Matrix, RECT_EMPTY, Rect, rect_contains, rect_intersect, rect_union};

/// Upper bound on glyph runs a single clip may collect.
const MAX_TEXT_CLIPS: usize = 128;

/// Clip contents. An unset [`ClipPath`] means no clipping at all.
#[derive(Debug, Clone, Default)]
pub struct ClipPathData {
    paths: Vec<(Path, FillType)>,
    /// Text clip layers, each terminated by `None`.
    texts: Vec<Option<Arc<PageObject>>>,
}

impl StateRecord for ClipPathData {
    fn defaults() -> &'static Self {
        static DEFAULT: LazyLock<ClipPathData> = LazyLock::new(ClipPathData::default);
        &DEFAULT
    }
}

/// Copy-on-write clip handle carried by the graphics state and page objects.
pub type ClipPath = SharedState<ClipPathData>;

impl ClipPathData {
    pub fn paths(&self) -> &[(Path, FillType)] {
        &self.paths
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn text_count(&self) -> usize {
        self.texts.len()
    }

    pub fn texts(&self) -> impl Iterator<Item = &PageObject> {
        self.texts.iter().flatten().map(|t| t.as_ref())
    }

    pub fn append_path(&mut self, path: Path, fill: FillType) {
        self.paths.push((path, fill));
    }

    /// Appends a path, first dropping the previous path when it is a
    /// rectangle that contains the new one.
    pub fn append_path_with_auto_merge(&mut self, path: Path, fill: FillType) {
        if let Some((last, _)) = self.paths.last()
            && let Some(old_rect) = last.rect()
            && rect_contains(old_rect, path.bounding_box())
        {
            self.paths.pop();
        }
        self.append_path(path, fill);
    }

    /// Appends one layer of clipping text. Layers past the limit are dropped.
    pub fn append_texts(&mut self, texts: Vec<PageObject>) {
        if self.texts.len() + texts.len() > MAX_TEXT_CLIPS {
            return;
        }
        self.texts.extend(texts.into_iter().map(|t| Some(Arc::new(t))));
        self.texts.push(None);
    }

    pub fn transform(&mut self, m: Matrix) {
        for (path, _) in &mut self.paths {
            path.transform(m);
        }
        for text in self.texts.iter_mut().flatten() {
            Arc::make_mut(text).transform(m);
        }
    }

    /// Bounding box of the clipped area.
    pub fn clip_box(&self) -> Rect {
        let mut rect: Option<Rect> = None;
        for (path, _) in &self.paths {
            let r = path.bounding_box();
            rect = Some(rect.map_or(r, |acc| rect_intersect(acc, r)));
        }
        let mut layer: Option<Rect> = None;
        for text in &self.texts {
            match text {
                Some(obj) => {
                    let r = obj.bbox();
                    layer = Some(layer.map_or(r, |acc| rect_union(acc, r)));
                }
                None => {
                    let r = layer.take().unwrap_or(RECT_EMPTY);
                    rect = Some(rect.map_or(r, |acc| rect_intersect(acc, r)));
                }
            }
        }
        rect.unwrap_or(RECT_EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_path(x0: f64, y0: f64, x1: f64, y1: f64) -> Path {
        let mut path = Path::new();
        path.append_rect(x0, y0, x1, y1);
        path
    }

    #[test]
    fn clip_box_intersects_paths() {
        let mut clip = ClipPathData::default();
        clip.append_path(rect_path(0.0, 0.0, 100.0, 100.0), FillType::Winding);
        clip.append_path(rect_path(50.0, 50.0, 150.0, 150.0), FillType::Winding);
        assert_eq!(clip.clip_box(), (50.0, 50.0, 100.0, 100.0));
    }

    #[test]
    fn contained_path_replaces_enclosing_rect() {
        let mut clip = ClipPathData::default();
        clip.append_path_with_auto_merge(rect_path(0.0, 0.0, 100.0, 100.0), FillType::Winding);
        clip.append_path_with_auto_merge(rect_path(10.0, 10.0, 20.0, 20.0), FillType::Winding);
        assert_eq!(clip.path_count(), 1);
        assert_eq!(clip.clip_box(), (10.0, 10.0, 20.0, 20.0));
    }

    #[test]
    fn unset_clip_is_empty() {
        let clip = ClipPath::Unset;
        assert_eq!(clip.get().path_count(), 0);
        assert!(!clip.is_set());
    }
}
