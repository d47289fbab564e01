//! Sentence and token segmentation of paragraph text
//!
//! The statistical segmenter used in production lives outside this crate and
//! plugs in through the [`Tokenizer`] trait. [`RuleTokenizer`] is the built-in
//! implementation, driven by a TOML rule file in the same spirit as the
//! language rule files of a sentence boundary detector: terminators,
//! punctuation, protected patterns and abbreviations.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Embedded default rules
pub const DEFAULT_RULES: &str = include_str!("../configs/tokenizer.toml");

/// A token as produced by a tokenizer, offsets in chars relative to its input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    pub text: String,
    /// Token text followed by the whitespace that trailed it in the input
    pub text_with_ws: String,
    pub offset: usize,
}

/// Tokens of one sentence, in order
pub type Sentence = Vec<RawToken>;

/// Splits text into sentences of tokens
pub trait Tokenizer: Send + Sync {
    /// Tokenize `text`; offsets in the result are char offsets into `text`
    fn tokenize(&self, text: &str) -> Result<Vec<Sentence>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizerRules {
    pub metadata: RulesMetadata,
    pub terminators: TerminatorRules,
    pub punctuation: PunctuationRules,
    #[serde(default)]
    pub protected: ProtectedRules,
    #[serde(default)]
    pub abbreviations: AbbreviationRules,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesMetadata {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminatorRules {
    pub chars: Vec<char>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PunctuationRules {
    pub chars: Vec<char>,
    #[serde(default)]
    pub closing: Vec<char>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtectedRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AbbreviationRules {
    #[serde(flatten)]
    pub categories: HashMap<String, Vec<String>>,
}

impl TokenizerRules {
    /// Parse rules from TOML and validate them
    pub fn from_toml(content: &str) -> Result<Self> {
        let rules: TokenizerRules = toml::from_str(content)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml(&content)
    }

    /// The rules shipped with pagealign
    pub fn embedded() -> Result<Self> {
        Self::from_toml(DEFAULT_RULES)
    }

    pub fn validate(&self) -> Result<()> {
        if self.metadata.code.trim().is_empty() {
            return Err(Error::Configuration(
                "tokenizer rules need a metadata code".into(),
            ));
        }
        if self.terminators.chars.is_empty() {
            return Err(Error::Configuration(
                "tokenizer rules need at least one terminator".into(),
            ));
        }
        if let Some(c) = self
            .terminators
            .chars
            .iter()
            .find(|c| !self.punctuation.chars.contains(c))
        {
            return Err(Error::Configuration(format!(
                "terminator '{c}' is not listed as punctuation"
            )));
        }
        for pattern in &self.protected.patterns {
            Regex::new(pattern).map_err(|e| {
                Error::Configuration(format!("invalid protected pattern '{pattern}': {e}"))
            })?;
        }
        Ok(())
    }

    pub fn abbreviation_count(&self) -> usize {
        self.abbreviations.categories.values().map(Vec::len).sum()
    }
}

/// Whitespace and punctuation tokenizer with abbreviation-aware sentence splitting
#[derive(Debug, Clone)]
pub struct RuleTokenizer {
    terminators: HashSet<char>,
    punctuation: HashSet<char>,
    closing: HashSet<char>,
    protected: Vec<Regex>,
    abbreviations: HashSet<String>,
}

/// A whitespace-delimited chunk of the input
struct Chunk<'t> {
    text: &'t str,
    offset: usize,
    trailing_ws: &'t str,
}

impl RuleTokenizer {
    pub fn new(rules: &TokenizerRules) -> Result<Self> {
        rules.validate()?;
        let protected = rules
            .protected
            .patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| Error::Configuration(e.to_string())))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            terminators: rules.terminators.chars.iter().copied().collect(),
            punctuation: rules.punctuation.chars.iter().copied().collect(),
            closing: rules.punctuation.closing.iter().copied().collect(),
            protected,
            abbreviations: rules
                .abbreviations
                .categories
                .values()
                .flatten()
                .map(|a| a.to_lowercase())
                .collect(),
        })
    }

    /// Tokenizer with the embedded default rules
    pub fn with_default_rules() -> Result<Self> {
        Self::new(&TokenizerRules::embedded()?)
    }

    fn is_protected(&self, word: &str) -> bool {
        self.protected.iter().any(|re| re.is_match(word))
    }

    fn is_abbreviation(&self, word: &str) -> bool {
        word.strip_suffix('.')
            .is_some_and(|stem| !stem.is_empty() && self.abbreviations.contains(&stem.to_lowercase()))
    }

    /// Split one chunk into (char offset within chunk, token text) pieces
    fn split_chunk<'t>(&self, chunk: &'t str) -> Vec<(usize, &'t str)> {
        if self.is_protected(chunk) || self.is_abbreviation(chunk) {
            return vec![(0, chunk)];
        }

        let chars: Vec<(usize, char)> = chunk.char_indices().collect();
        let mut start = 0;
        let mut end = chars.len();
        let mut pieces = Vec::new();

        while end - start > 1 && self.punctuation.contains(&chars[start].1) {
            pieces.push((start, &chunk[chars[start].0..chars[start + 1].0]));
            start += 1;
        }

        let mut trailing = Vec::new();
        while end - start > 1 {
            let core = &chunk[chars[start].0..byte_end(chunk, &chars, end)];
            if self.is_protected(core) || self.is_abbreviation(core) {
                break;
            }
            let last = chars[end - 1];
            if !self.punctuation.contains(&last.1) {
                break;
            }
            trailing.push((end - 1, &chunk[last.0..byte_end(chunk, &chars, end)]));
            end -= 1;
        }

        pieces.push((start, &chunk[chars[start].0..byte_end(chunk, &chars, end)]));
        pieces.extend(trailing.into_iter().rev());
        pieces
    }

    fn chunks<'t>(text: &'t str) -> Vec<Chunk<'t>> {
        let mut chunks = Vec::new();
        let mut char_offset = 0;
        let mut rest = text;

        while !rest.is_empty() {
            let ws_len = rest.len() - rest.trim_start().len();
            char_offset += rest[..ws_len].chars().count();
            rest = &rest[ws_len..];
            if rest.is_empty() {
                break;
            }

            let word_len = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let word = &rest[..word_len];
            let after = &rest[word_len..];
            let mut trailing_len = after.len() - after.trim_start().len();
            if trailing_len == after.len() {
                // the closing line break is carried by the paragraph sentinel
                trailing_len = after.trim_end_matches(['\n', '\r']).len();
            }

            chunks.push(Chunk {
                text: word,
                offset: char_offset,
                trailing_ws: &after[..trailing_len],
            });

            char_offset += word.chars().count();
            rest = after;
        }
        chunks
    }
}

fn byte_end(chunk: &str, chars: &[(usize, char)], end: usize) -> usize {
    chars.get(end).map(|(i, _)| *i).unwrap_or(chunk.len())
}

impl Tokenizer for RuleTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<Sentence>> {
        let mut sentences = Vec::new();
        let mut current: Sentence = Vec::new();
        let mut sentence_ended = false;

        for chunk in Self::chunks(text) {
            let pieces = self.split_chunk(chunk.text);
            let last = pieces.len() - 1;

            for (i, (char_offset, piece)) in pieces.into_iter().enumerate() {
                let mut chars = piece.chars();
                let single = match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                };

                if sentence_ended {
                    let closes = single.is_some_and(|c| {
                        self.closing.contains(&c) || self.terminators.contains(&c)
                    });
                    if !closes {
                        sentences.push(std::mem::take(&mut current));
                        sentence_ended = false;
                    }
                }

                let mut text_with_ws = piece.to_string();
                if i == last {
                    text_with_ws.push_str(chunk.trailing_ws);
                }
                current.push(RawToken {
                    text: piece.to_string(),
                    text_with_ws,
                    offset: chunk.offset + char_offset,
                });

                if single.is_some_and(|c| self.terminators.contains(&c)) {
                    sentence_ended = true;
                }
            }
        }

        if !current.is_empty() {
            sentences.push(current);
        }
        Ok(sentences)
    }
}
