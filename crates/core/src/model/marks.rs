//! Marked-content tags (`BMC`/`BDC` … `EMC`).

use std::sync::Arc;

use super::objects::Dictionary;

/// Parameters attached to a mark.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkParams {
    /// `BMC`: tag only.
    None,
    /// `BDC` with an inline dictionary.
    Direct(Dictionary),
    /// `BDC` naming an entry of the `Properties` resource.
    Resource { name: String, dict: Dictionary },
}

/// One marked-content tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentMarkItem {
    pub tag: String,
    pub params: MarkParams,
}

impl ContentMarkItem {
    pub fn dict(&self) -> Option<&Dictionary> {
        match &self.params {
            MarkParams::None => None,
            MarkParams::Direct(dict) | MarkParams::Resource { dict, .. } => Some(dict),
        }
    }

    /// Marked-content id, when the parameters carry one.
    pub fn mcid(&self) -> Option<i64> {
        self.dict()?.get("MCID")?.as_int().ok()
    }
}

/// Nested list of open marks, outermost first. Items are shared between
/// every object emitted inside the same marked sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentMarks {
    items: Vec<Arc<ContentMarkItem>>,
}

impl ContentMarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Arc<ContentMarkItem>] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&ContentMarkItem> {
        self.items.get(index).map(|item| item.as_ref())
    }

    pub fn add_mark(&mut self, tag: &str) {
        self.push(tag, MarkParams::None);
    }

    pub fn add_mark_with_direct_dict(&mut self, tag: &str, dict: Dictionary) {
        self.push(tag, MarkParams::Direct(dict));
    }

    pub fn add_mark_with_properties_holder(&mut self, tag: &str, dict: Dictionary, name: &str) {
        self.push(
            tag,
            MarkParams::Resource {
                name: name.to_string(),
                dict,
            },
        );
    }

    fn push(&mut self, tag: &str, params: MarkParams) {
        self.items.push(Arc::new(ContentMarkItem {
            tag: tag.to_string(),
            params,
        }));
    }

    /// Innermost marked-content id, if any mark carries one.
    pub fn mcid(&self) -> Option<i64> {
        self.items.iter().rev().find_map(|item| item.mcid())
    }

    /// Number of leading marks shared (by identity) with `other`.
    pub fn common_prefix_len(&self, other: &Self) -> usize {
        self.items
            .iter()
            .zip(&other.items)
            .take_while(|(a, b)| Arc::ptr_eq(a, b))
            .count()
    }
}

/// Stack of mark lists. The bottom entry is an empty sentinel that
/// `EMC` never pops.
#[derive(Debug, Clone)]
pub struct ContentMarksStack {
    stack: Vec<ContentMarks>,
}

impl Default for ContentMarksStack {
    fn default() -> Self {
        Self {
            stack: vec![ContentMarks::new()],
        }
    }
}

impl ContentMarksStack {
    pub fn top(&self) -> &ContentMarks {
        // The sentinel keeps the stack non-empty.
        &self.stack[self.stack.len() - 1]
    }

    pub fn push(&mut self, marks: ContentMarks) {
        self.stack.push(marks);
    }

    /// Pops unless only the sentinel remains.
    pub fn pop(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            return true;
        }
        false
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::objects::PDFObject;

    #[test]
    fn sentinel_is_never_popped() {
        let mut stack = ContentMarksStack::default();
        assert!(!stack.pop());
        let mut marks = stack.top().clone();
        marks.add_mark("Span");
        stack.push(marks);
        assert_eq!(stack.top().len(), 1);
        assert!(stack.pop());
        assert!(!stack.pop());
        assert_eq!(stack.depth(), 1);
        assert!(stack.top().is_empty());
    }

    #[test]
    fn innermost_mcid_wins() {
        let mut outer = Dictionary::new();
        outer.insert("MCID".into(), PDFObject::Int(1));
        let mut inner = Dictionary::new();
        inner.insert("MCID".into(), PDFObject::Int(7));
        let mut marks = ContentMarks::new();
        marks.add_mark_with_direct_dict("P", outer);
        marks.add_mark("Artifact");
        marks.add_mark_with_properties_holder("Span", inner, "MC0");
        assert_eq!(marks.mcid(), Some(7));
    }
}
