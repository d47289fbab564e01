//! Export order of annotations

use crate::annotation::Annotation;
use std::cmp::{Ordering, Reverse};

/// Compare by page, then offset, then longest range first
///
/// Enclosing ranges come before the ranges nested in them.
pub fn export_order(a: &Annotation, b: &Annotation) -> Ordering {
    (&a.page_id, a.offset, Reverse(a.length)).cmp(&(&b.page_id, b.offset, Reverse(b.length)))
}

/// Stable sort into export order
pub fn sort_annotations(annotations: &mut [Annotation]) {
    annotations.sort_by(export_order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationKind;

    fn annotation(id: &str, page: &str, offset: usize, length: usize) -> Annotation {
        Annotation::new(AnnotationKind::Word, id, page, offset, length)
    }

    fn ids(annotations: &[Annotation]) -> Vec<&str> {
        annotations.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_containers_before_contents() {
        let mut annotations = vec![
            annotation("word", "A", 0, 2),
            annotation("line", "A", 0, 8),
            annotation("page", "A", 0, 20),
            annotation("second", "A", 3, 4),
        ];
        sort_annotations(&mut annotations);
        assert_eq!(ids(&annotations), vec!["page", "line", "word", "second"]);
    }

    #[test]
    fn test_page_id_orders_first() {
        let mut annotations = vec![
            annotation("b", "B", 0, 1),
            annotation("a", "A", 10, 1),
        ];
        sort_annotations(&mut annotations);
        assert_eq!(ids(&annotations), vec!["a", "b"]);
    }

    #[test]
    fn test_equal_keys_keep_input_order() {
        let mut annotations = vec![
            annotation("region", "A", 0, 5),
            annotation("line", "A", 0, 5),
            annotation("word", "A", 0, 5),
        ];
        sort_annotations(&mut annotations);
        assert_eq!(ids(&annotations), vec!["region", "line", "word"]);
    }

    #[test]
    fn test_sorting_is_idempotent() {
        let mut annotations = vec![
            annotation("x", "B", 4, 1),
            annotation("y", "A", 4, 3),
            annotation("z", "A", 4, 3),
            annotation("w", "A", 1, 9),
        ];
        sort_annotations(&mut annotations);
        let once = annotations.clone();
        sort_annotations(&mut annotations);
        assert_eq!(annotations, once);
    }
}
