//! Token sequence and anchor resolution
//!
//! The unit text is tokenized paragraph by paragraph into one ordered token
//! sequence. Each paragraph is closed by a sentinel token (offset `-1`) that
//! occupies an index of its own. Downstream consumers address text by index
//! into this sequence ("anchors"), so the order of the sequence is part of
//! the exported contract.

use crate::annotation::{Annotation, AnnotationKind, IdScheme};
use crate::error::Result;
use crate::pages::PageRanges;
use crate::text::char_len;
use crate::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Offset marking a paragraph sentinel
pub const SENTINEL_OFFSET: i64 = -1;

/// One entry of the token sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub text_with_ws: String,
    /// Char offset into the unit text, or [`SENTINEL_OFFSET`]
    pub offset: i64,
}

impl Token {
    pub fn new(text: impl Into<String>, text_with_ws: impl Into<String>, offset: usize) -> Self {
        Self {
            text: text.into(),
            text_with_ws: text_with_ws.into(),
            offset: offset as i64,
        }
    }

    /// The sentinel closing a paragraph
    pub fn paragraph_break() -> Self {
        Self {
            text: String::new(),
            text_with_ws: String::new(),
            offset: SENTINEL_OFFSET,
        }
    }

    pub fn is_paragraph_break(&self) -> bool {
        self.offset < 0
    }

    /// Char offset of a real token, `None` for a sentinel
    pub fn char_offset(&self) -> Option<usize> {
        usize::try_from(self.offset).ok()
    }
}

/// Token indices belonging to one paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphSpan {
    /// Char offset of the paragraph in the unit text
    pub offset: usize,
    /// Indices of the paragraph's real tokens
    pub tokens: Range<usize>,
    /// Index of the closing sentinel
    pub sentinel: usize,
}

/// Result of segmenting a unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    pub tokens: Vec<Token>,
    /// 1-based sentence number per token index; sentinels carry the last sentence
    pub sentence_numbers: Vec<usize>,
    pub paragraphs: Vec<ParagraphSpan>,
}

/// Runs a tokenizer over paragraph text and builds the token sequence
pub struct Segmenter<'t> {
    tokenizer: &'t dyn Tokenizer,
}

impl<'t> Segmenter<'t> {
    pub fn new(tokenizer: &'t dyn Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Tokenize consecutive paragraphs of one text
    pub fn segment(&self, paragraphs: &[&str]) -> Result<Segmentation> {
        let mut segmentation = Segmentation::default();
        let mut text_offset = 0;
        let mut sentence_number = 0;

        for paragraph in paragraphs {
            let first = segmentation.tokens.len();

            for sentence in self.tokenizer.tokenize(paragraph)? {
                let mut tokens = sentence.into_iter().filter(|t| t.text != "\n").peekable();
                if tokens.peek().is_none() {
                    continue;
                }
                sentence_number += 1;
                for raw in tokens {
                    segmentation.tokens.push(Token::new(
                        raw.text,
                        raw.text_with_ws,
                        text_offset + raw.offset,
                    ));
                    segmentation.sentence_numbers.push(sentence_number);
                }
            }

            let sentinel = segmentation.tokens.len();
            segmentation.tokens.push(Token::paragraph_break());
            segmentation.sentence_numbers.push(sentence_number);
            segmentation.paragraphs.push(ParagraphSpan {
                offset: text_offset,
                tokens: first..sentinel,
                sentinel,
            });

            text_offset += char_len(paragraph);
        }

        log::debug!(
            "segmented {} paragraphs into {} tokens ({} sentences)",
            segmentation.paragraphs.len(),
            segmentation.tokens.len() - segmentation.paragraphs.len(),
            sentence_number
        );
        Ok(segmentation)
    }
}

/// Inclusive token index range covering the char range `[begin, end)`
///
/// Scans once in order, skipping sentinels. `begin_idx` is the last real token
/// with `offset <= begin`, `end_idx` the last real token with `offset < end`.
/// The scan stops at the first real token with `offset >= end`, after that
/// token has had its `offset <= begin` check. Both default to 0.
pub fn segment_range(tokens: &[Token], begin: usize, end: usize) -> (usize, usize) {
    let mut begin_idx = 0;
    let mut end_idx = 0;
    for (i, token) in tokens.iter().enumerate() {
        let Some(offset) = token.char_offset() else {
            continue;
        };
        if offset <= begin {
            begin_idx = i;
        }
        if offset < end {
            end_idx = i;
        } else {
            break;
        }
    }
    (begin_idx, end_idx)
}

/// Binary search form of [`segment_range`] for repeated lookups
///
/// Gives the same answers as the linear scan when real token offsets are
/// non-decreasing, which holds for every [`Segmentation`]. Sequences that are
/// not monotonic fall back to the linear scan.
#[derive(Debug, Clone)]
pub struct AnchorResolver<'a> {
    tokens: &'a [Token],
    /// (index, offset) of every real token
    real: Vec<(usize, usize)>,
    monotonic: bool,
}

impl<'a> AnchorResolver<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        let real: Vec<(usize, usize)> = tokens
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.char_offset().map(|o| (i, o)))
            .collect();
        let monotonic = real.windows(2).all(|w| w[0].1 <= w[1].1);
        if !monotonic {
            log::warn!("token offsets are not monotonic, anchors use the linear scan");
        }
        Self {
            tokens,
            real,
            monotonic,
        }
    }

    pub fn resolve(&self, begin: usize, end: usize) -> (usize, usize) {
        if !self.monotonic {
            return segment_range(self.tokens, begin, end);
        }

        // Tokens before `first_at_end` are exactly those with offset < end; the
        // scan also visits the token at `first_at_end` before stopping.
        let first_at_end = self.real.partition_point(|&(_, offset)| offset < end);
        let end_idx = match first_at_end {
            0 => 0,
            k => self.real[k - 1].0,
        };

        let visited = &self.real[..(first_at_end + 1).min(self.real.len())];
        let begin_idx = match visited.partition_point(|&(_, offset)| offset <= begin) {
            0 => 0,
            p => visited[p - 1].0,
        };

        (begin_idx, end_idx)
    }
}

/// Set the anchor range of every annotation from its char range
pub fn resolve_anchors(annotations: &mut [Annotation], tokens: &[Token]) {
    let resolver = AnchorResolver::new(tokens);
    for a in annotations.iter_mut() {
        let (begin, end) = resolver.resolve(a.offset, a.end());
        a.begin_anchor = begin;
        a.end_anchor = end;
    }
}

/// Token and paragraph annotations for a segmented unit
pub fn token_annotations(
    ids: &IdScheme,
    base_name: &str,
    segmentation: &Segmentation,
    pages: &PageRanges,
) -> Vec<Annotation> {
    let mut annotations = Vec::new();

    for (number, paragraph) in segmentation.paragraphs.iter().enumerate() {
        let tokens = &segmentation.tokens[paragraph.tokens.clone()];

        for (i, token) in paragraph.tokens.clone().zip(tokens) {
            let Some(offset) = token.char_offset() else {
                continue;
            };
            let length = char_len(&token.text);
            annotations.push(
                Annotation::new(
                    AnnotationKind::Token,
                    ids.token(base_name, i),
                    pages.get_page_id(offset, length),
                    offset,
                    length,
                )
                .with_text(token.text.clone())
                .with_extra("sentence_num", segmentation.sentence_numbers[i])
                .with_extra("token_num", i),
            );
        }

        let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
            continue;
        };
        let (Some(start), Some(last_offset)) = (first.char_offset(), last.char_offset()) else {
            continue;
        };
        let length = last_offset + char_len(&last.text) - start;
        let text = tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        annotations.push(
            Annotation::new(
                AnnotationKind::Paragraph,
                ids.paragraph(base_name, number + 1),
                pages.get_page_id(start, length),
                start,
                length,
            )
            .with_text(text),
        );
    }

    annotations
}
