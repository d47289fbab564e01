//! Offset index builder
//!
//! Walks one layout page in reading order, appends every word's raw text to
//! the page text and records the exact char range of each word, line, region
//! and of the page itself. Ranges of lines and regions run from the start of
//! their first word to the end of their last word.

use crate::annotation::{Annotation, AnnotationKind, IdScheme};
use crate::error::{Error, Result};
use crate::layout::{LayoutDocument, LayoutLine, LayoutWord};
use crate::text::char_len;
use std::collections::HashSet;
use std::path::PathBuf;

/// Text and annotations of one indexed page, offsets relative to the page
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub page_id: String,
    pub source: PathBuf,
    pub text: String,
    /// Length of `text` in chars
    pub char_len: usize,
    pub annotations: Vec<Annotation>,
}

/// Builds [`IndexedDocument`]s from layout pages
#[derive(Debug, Clone)]
pub struct OffsetIndexBuilder<'a> {
    ids: &'a IdScheme,
}

/// Char range of one word in the page text
#[derive(Debug, Clone, Copy)]
struct WordRange {
    offset: usize,
    end: usize,
}

impl<'a> OffsetIndexBuilder<'a> {
    pub fn new(ids: &'a IdScheme) -> Self {
        Self { ids }
    }

    /// Index a single page
    ///
    /// Fails without emitting anything when a word cannot be given a range of
    /// its own (missing or duplicate id, no coordinates).
    pub fn build(&self, document: &LayoutDocument) -> Result<IndexedDocument> {
        let page = &document.page;
        let page_id = page.id.as_str();
        self.validate_words(document)?;

        let mut text = String::new();
        let mut text_len = 0;
        let mut words = Vec::new();
        let mut structure = Vec::new();

        for region in &page.regions {
            let mut region_range: Option<WordRange> = None;
            let mut region_lines = Vec::new();

            for line in &region.lines {
                let mut line_range: Option<WordRange> = None;

                for word in &line.words {
                    let range = Self::word_range(word, text_len);
                    words.push(self.word_annotation(page_id, word, range));
                    text.push_str(&word.text);
                    text_len += char_len(&word.text);

                    line_range = Some(extend(line_range, range));
                }

                match line_range {
                    Some(range) => {
                        let line_text = line_text(line);
                        structure.push(
                            Annotation::new(
                                AnnotationKind::TextLine,
                                self.ids.line(page_id, &line.id),
                                page_id,
                                range.offset,
                                range.end - range.offset,
                            )
                            .with_text(line_text.clone())
                            .with_coords(vec![line.coords.clone()]),
                        );
                        region_lines.push(line_text);
                        region_range = Some(extend(region_range, range));
                    }
                    None => log::debug!("{page_id}: line {} has no words, skipped", line.id),
                }
            }

            match region_range {
                Some(range) => structure.push(
                    Annotation::new(
                        AnnotationKind::TextRegion,
                        self.ids.region(page_id, &region.id),
                        page_id,
                        range.offset,
                        range.end - range.offset,
                    )
                    .with_text(region_lines.join("\n"))
                    .with_coords(vec![region.coords.clone()]),
                ),
                None => log::debug!("{page_id}: region {} has no words, skipped", region.id),
            }
        }

        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
            text_len += 1;
        }

        let mut annotations = words;
        annotations.push(
            Annotation::new(
                AnnotationKind::Page,
                self.ids.page(page_id),
                page_id,
                0,
                text_len,
            )
            .with_extra("n", page_number(page_id))
            .with_extra("file", document.source.display().to_string()),
        );
        annotations.append(&mut structure);

        log::debug!(
            "{page_id}: indexed {} chars into {} annotations",
            text_len,
            annotations.len()
        );

        Ok(IndexedDocument {
            page_id: page_id.to_string(),
            source: document.source.clone(),
            text,
            char_len: text_len,
            annotations,
        })
    }

    fn validate_words(&self, document: &LayoutDocument) -> Result<()> {
        let malformed = |element: &str, reason: &str| Error::MalformedLayout {
            document: document.source.display().to_string(),
            element: element.to_string(),
            reason: reason.to_string(),
        };

        let mut seen = HashSet::new();
        for word in document.page.words() {
            if word.id.is_empty() {
                return Err(malformed(&word.text, "has no id"));
            }
            if !seen.insert(word.id.as_str()) {
                return Err(malformed(&word.id, "has a duplicate id"));
            }
            if word.coords.is_empty() {
                return Err(malformed(&word.id, "has no coordinates"));
            }
        }
        Ok(())
    }

    /// Range of the stripped word, given the page length before the word
    fn word_range(word: &LayoutWord, text_len: usize) -> WordRange {
        let leading = word.text.chars().take_while(|c| c.is_whitespace()).count();
        let offset = text_len + leading;
        WordRange {
            offset,
            end: offset + char_len(word.text.trim()),
        }
    }

    fn word_annotation(&self, page_id: &str, word: &LayoutWord, range: WordRange) -> Annotation {
        Annotation::new(
            AnnotationKind::Word,
            self.ids.word(page_id, &word.id),
            page_id,
            range.offset,
            range.end - range.offset,
        )
        .with_text(word.text.trim())
        .with_coords(vec![word.coords.clone()])
    }
}

fn extend(range: Option<WordRange>, word: WordRange) -> WordRange {
    match range {
        Some(r) => WordRange {
            offset: r.offset,
            end: word.end,
        },
        None => word,
    }
}

fn line_text(line: &LayoutLine) -> String {
    line.words
        .iter()
        .map(|w| w.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Scan number from a page id like `NL-HaNA_1.04.02_1092_0017`
fn page_number(page_id: &str) -> &str {
    page_id.rsplit('_').next().unwrap_or(page_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutPage, LayoutRegion, Polygon};
    use crate::text::CharIndex;

    fn word(id: &str, text: &str) -> LayoutWord {
        LayoutWord {
            id: id.to_string(),
            text: text.to_string(),
            coords: Polygon::from_pairs(&[(0, 0), (10, 0), (10, 5), (0, 5)]),
        }
    }

    fn line(id: &str, words: Vec<LayoutWord>) -> LayoutLine {
        LayoutLine {
            id: id.to_string(),
            coords: Polygon::from_pairs(&[(0, 0), (100, 0), (100, 5), (0, 5)]),
            words,
        }
    }

    fn sample_document() -> LayoutDocument {
        let page = LayoutPage {
            id: "NL-HaNA_1.04.02_1092_0017".to_string(),
            regions: vec![
                LayoutRegion {
                    id: "r1".to_string(),
                    coords: Polygon::from_pairs(&[(0, 0), (100, 0), (100, 20), (0, 20)]),
                    lines: vec![
                        line("l1", vec![word("w1", "Go "), word("w2", "home.\n")]),
                        line("l2", vec![word("w3", "Now\n")]),
                    ],
                },
                LayoutRegion {
                    id: "r2".to_string(),
                    coords: Polygon::from_pairs(&[(0, 30), (100, 30), (100, 40), (0, 40)]),
                    lines: vec![line("l3", vec![word("w4", "Café ")]), line("empty", vec![])],
                },
            ],
        };
        LayoutDocument::new("pages/NL-HaNA_1.04.02_1092_0017.json", page)
    }

    fn find<'a>(doc: &'a IndexedDocument, id_suffix: &str) -> &'a Annotation {
        doc.annotations
            .iter()
            .find(|a| a.id.ends_with(id_suffix))
            .unwrap_or_else(|| panic!("no annotation ending with {id_suffix}"))
    }

    #[test]
    fn test_page_text_is_unstripped_concatenation() {
        let ids = IdScheme::new("test");
        let doc = OffsetIndexBuilder::new(&ids).build(&sample_document()).unwrap();
        assert_eq!(doc.text, "Go home.\nNow\nCafé \n");
        assert_eq!(doc.char_len, char_len(&doc.text));
    }

    #[test]
    fn test_word_ranges_round_trip() {
        let ids = IdScheme::new("test");
        let doc = OffsetIndexBuilder::new(&ids).build(&sample_document()).unwrap();
        let index = CharIndex::new(&doc.text);

        for a in doc.annotations.iter().filter(|a| a.kind == AnnotationKind::Word) {
            let covered = index.slice(a.offset, a.end());
            assert_eq!(a.metadata.text.as_deref(), Some(covered.trim()));
        }
        let cafe = find(&doc, ":word:w4");
        assert_eq!((cafe.offset, cafe.length), (13, 4));
    }

    #[test]
    fn test_line_and_region_ranges() {
        let ids = IdScheme::new("test");
        let doc = OffsetIndexBuilder::new(&ids).build(&sample_document()).unwrap();

        let l1 = find(&doc, ":textline:l1");
        assert_eq!((l1.offset, l1.length), (0, 8));
        assert_eq!(l1.metadata.text.as_deref(), Some("Go home."));

        let r1 = find(&doc, ":textregion:r1");
        assert_eq!((r1.offset, r1.length), (0, 12));
        assert_eq!(r1.metadata.text.as_deref(), Some("Go home.\nNow"));

        let r2 = find(&doc, ":textregion:r2");
        assert_eq!((r2.offset, r2.length), (13, 4));

        assert!(!doc.annotations.iter().any(|a| a.id.ends_with(":textline:empty")));
    }

    #[test]
    fn test_page_annotation() {
        let ids = IdScheme::new("test");
        let doc = OffsetIndexBuilder::new(&ids).build(&sample_document()).unwrap();
        let page = doc
            .annotations
            .iter()
            .find(|a| a.kind == AnnotationKind::Page)
            .unwrap();

        assert_eq!(page.id, "urn:test:NL-HaNA_1.04.02_1092_0017");
        assert_eq!((page.offset, page.length), (0, doc.char_len));
        assert_eq!(page.metadata.extra["n"], "0017");
        assert!(page.metadata.extra["file"]
            .as_str()
            .unwrap()
            .ends_with("NL-HaNA_1.04.02_1092_0017.json"));
    }

    #[test]
    fn test_leading_whitespace_is_skipped() {
        let page = LayoutPage {
            id: "p_1".to_string(),
            regions: vec![LayoutRegion {
                id: "r".to_string(),
                coords: Polygon::default(),
                lines: vec![line("l", vec![word("a", "ab"), word("b", "  cd\n")])],
            }],
        };
        let ids = IdScheme::new("test");
        let doc = OffsetIndexBuilder::new(&ids)
            .build(&LayoutDocument::new("p_1.json", page))
            .unwrap();
        let b = find(&doc, ":word:b");
        assert_eq!((b.offset, b.length), (4, 2));
    }

    #[test]
    fn test_duplicate_word_id_is_fatal() {
        let mut document = sample_document();
        document.page.regions[0].lines[1].words[0].id = "w1".to_string();

        let ids = IdScheme::new("test");
        let result = OffsetIndexBuilder::new(&ids).build(&document);
        match result {
            Err(Error::MalformedLayout { element, .. }) => assert_eq!(element, "w1"),
            other => panic!("expected MalformedLayout, got {other:?}"),
        }
    }

    #[test]
    fn test_word_without_coordinates_is_fatal() {
        let mut document = sample_document();
        document.page.regions[1].lines[0].words[0].coords = Polygon::default();

        let ids = IdScheme::new("test");
        assert!(matches!(
            OffsetIndexBuilder::new(&ids).build(&document),
            Err(Error::MalformedLayout { .. })
        ));
    }

    #[test]
    fn test_empty_page() {
        let ids = IdScheme::new("test");
        let doc = OffsetIndexBuilder::new(&ids)
            .build(&LayoutDocument::new(
                "empty_0001.json",
                LayoutPage {
                    id: "empty_0001".to_string(),
                    regions: vec![],
                },
            ))
            .unwrap();
        assert_eq!(doc.text, "");
        assert_eq!(doc.annotations.len(), 1);
        assert_eq!(doc.annotations[0].length, 0);
    }
}
