//! Page ranges over the global offset space

use crate::annotation::{Annotation, AnnotationKind, PLACEHOLDER_PAGE_ID};
use serde::Serialize;

/// `page_id → [start, end)` in the unit text, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageRanges {
    ranges: Vec<(String, usize, usize)>,
}

impl PageRanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the ranges of all page annotations
    pub fn from_annotations(annotations: &[Annotation]) -> Self {
        let mut pages = Self::new();
        for a in annotations.iter().filter(|a| a.kind == AnnotationKind::Page) {
            pages.insert(&a.page_id, a.offset, a.end());
        }
        pages
    }

    pub fn insert(&mut self, page_id: &str, start: usize, end: usize) {
        self.ranges.push((page_id.to_string(), start, end));
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize, usize)> {
        self.ranges.iter().map(|(id, s, e)| (id.as_str(), *s, *e))
    }

    pub fn get(&self, page_id: &str) -> Option<(usize, usize)> {
        self.iter()
            .find(|(id, _, _)| *id == page_id)
            .map(|(_, s, e)| (s, e))
    }

    /// Page whose range contains `offset`
    ///
    /// Zero or several matching pages mean the alignment is inconsistent; this
    /// is logged and the placeholder page id is returned so processing can go on.
    pub fn get_page_id(&self, offset: usize, length: usize) -> &str {
        let mut matches = self
            .ranges
            .iter()
            .filter(|(_, start, end)| *start <= offset && offset < *end);

        match (matches.next(), matches.next()) {
            (Some((page_id, _, _)), None) => page_id.as_str(),
            (first, second) => {
                let candidates: Vec<&str> = first
                    .into_iter()
                    .chain(second)
                    .chain(matches)
                    .map(|(id, _, _)| id.as_str())
                    .collect();
                log::warn!(
                    "no unique page for range [{}, {}): candidates {:?}",
                    offset,
                    offset + length,
                    candidates
                );
                PLACEHOLDER_PAGE_ID
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_pages() -> PageRanges {
        let mut pages = PageRanges::new();
        pages.insert("A", 0, 3);
        pages.insert("B", 3, 7);
        pages
    }

    #[test]
    fn test_unique_page() {
        let pages = two_pages();
        assert_eq!(pages.get_page_id(0, 2), "A");
        assert_eq!(pages.get_page_id(2, 1), "A");
        assert_eq!(pages.get_page_id(3, 3), "B");
        assert_eq!(pages.get_page_id(6, 1), "B");
    }

    #[test]
    fn test_offset_outside_all_pages() {
        assert_eq!(two_pages().get_page_id(7, 1), PLACEHOLDER_PAGE_ID);
    }

    #[test]
    fn test_overlapping_pages_are_ambiguous() {
        let mut pages = two_pages();
        pages.insert("C", 2, 5);
        assert_eq!(pages.get_page_id(2, 1), PLACEHOLDER_PAGE_ID);
        assert_eq!(pages.get_page_id(4, 1), PLACEHOLDER_PAGE_ID);
        assert_eq!(pages.get_page_id(0, 1), "A");
    }

    #[test]
    fn test_from_annotations_uses_page_records_only() {
        let annotations = vec![
            Annotation::new(AnnotationKind::Page, "urn:x:A", "A", 0, 3),
            Annotation::new(AnnotationKind::Word, "urn:x:A:word:w", "A", 0, 2),
            Annotation::new(AnnotationKind::Page, "urn:x:B", "B", 3, 4),
        ];
        let pages = PageRanges::from_annotations(&annotations);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages.get("B"), Some((3, 7)));
        assert_eq!(pages.get("C"), None);
    }
}
