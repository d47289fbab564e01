//! Provenance interval index and checksum-keyed document data
//!
//! Text that was exported and later re-tokenized elsewhere lives in a second
//! offset space. Its char ranges are only mapped back to source images through
//! the interval index stored for the exact same text, found by checksum.

use crate::error::{Error, Result};
use crate::layout::Polygon;
use serde::{Deserialize, Serialize};
use md5::{Digest, Md5};
use std::collections::BTreeMap;
use std::path::Path;

/// Source used for text targets when no document data matches
pub const PLACEHOLDER_SOURCE: &str = "urn:placeholder";

/// Where an interval of text came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCoordinates {
    pub iiif_base_uri: String,
    pub canvas_id: String,
    pub coords: Polygon,
}

/// Half-open char interval with its source coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalEntry {
    pub start: usize,
    pub end: usize,
    pub data: SourceCoordinates,
}

impl From<(usize, usize, SourceCoordinates)> for IntervalEntry {
    fn from((start, end, data): (usize, usize, SourceCoordinates)) -> Self {
        Self { start, end, data }
    }
}

/// Static interval index answering overlap queries in O(log n + k)
///
/// Entries are kept sorted by `(start, end)` and laid out as an implicit
/// binary tree over the array: the node at index `i` sits at level `k` when
/// the lowest `k` bits of `i` are set and bit `k` is clear. Each node stores
/// the largest end in its subtree.
#[derive(Debug, Clone, Default)]
pub struct ProvenanceIndex {
    entries: Vec<IntervalEntry>,
    max_end: Vec<usize>,
    max_level: Option<u32>,
}

/// Nodes at or below this level are scanned linearly
const LINEAR_SCAN_LEVEL: u32 = 3;

impl ProvenanceIndex {
    /// Build the index, rejecting empty or inverted intervals
    pub fn new(entries: impl IntoIterator<Item = IntervalEntry>) -> Result<Self> {
        let mut entries: Vec<IntervalEntry> = entries.into_iter().collect();
        if let Some(bad) = entries.iter().find(|e| e.start >= e.end) {
            return Err(Error::InvalidInterval {
                start: bad.start,
                end: bad.end,
            });
        }
        entries.sort_by_key(|e| (e.start, e.end));

        let mut index = Self {
            max_end: entries.iter().map(|e| e.end).collect(),
            entries,
            max_level: None,
        };
        index.max_level = index.augment();
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in `(start, end)` order
    pub fn entries(&self) -> &[IntervalEntry] {
        &self.entries
    }

    fn augment(&mut self) -> Option<u32> {
        let n = self.entries.len();
        if n == 0 {
            return None;
        }

        // Max end of the right-most subtree at the current level, standing in
        // for right children beyond the end of the array.
        let mut last_i = 0;
        let mut last = 0;
        for i in (0..n).step_by(2) {
            last_i = i;
            last = self.entries[i].end;
            self.max_end[i] = last;
        }

        let mut k = 1u32;
        while (1usize << k) <= n {
            let x = 1usize << (k - 1);
            let first = (x << 1) - 1;
            let step = x << 2;
            for i in (first..n).step_by(step) {
                let left = self.max_end[i - x];
                let right = if i + x < n { self.max_end[i + x] } else { last };
                self.max_end[i] = self.entries[i].end.max(left).max(right);
            }
            last_i = if (last_i >> k) & 1 == 1 {
                last_i - x
            } else {
                last_i + x
            };
            if last_i < n && self.max_end[last_i] > last {
                last = self.max_end[last_i];
            }
            k += 1;
        }
        Some(k - 1)
    }

    /// Entries overlapping `[begin, end)`, ordered by `(start, end)`
    ///
    /// An entry overlaps when `start < end && entry.end > begin`, so an empty
    /// query range matches nothing.
    pub fn query(&self, begin: usize, end: usize) -> Vec<&IntervalEntry> {
        let Some(max_level) = self.max_level else {
            return Vec::new();
        };
        if begin >= end {
            return Vec::new();
        }

        let n = self.entries.len();
        let mut hits = Vec::new();
        // (node, level, right half pending)
        let mut stack = vec![((1usize << max_level) - 1, max_level, false)];

        while let Some((x, k, visit_right)) = stack.pop() {
            if k <= LINEAR_SCAN_LEVEL {
                let first = (x >> k) << k;
                let last = (first + (1usize << (k + 1)) - 1).min(n);
                for i in first..last {
                    if self.entries[i].start >= end {
                        break;
                    }
                    if self.entries[i].end > begin {
                        hits.push(i);
                    }
                }
            } else if !visit_right {
                let left = x - (1usize << (k - 1));
                stack.push((x, k, true));
                if left >= n || self.max_end[left] > begin {
                    stack.push((left, k - 1, false));
                }
            } else if x < n && self.entries[x].start < end {
                if self.entries[x].end > begin {
                    hits.push(x);
                }
                stack.push((x + (1usize << (k - 1)), k - 1, false));
            }
        }

        hits.sort_unstable();
        hits.into_iter().map(|i| &self.entries[i]).collect()
    }
}

/// One exported text with its source intervals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub plain_text_source: String,
    /// MD5 of the exported text, lowercase hex
    pub plain_text_md5: String,
    #[serde(default)]
    pub text_intervals: Vec<(usize, usize, SourceCoordinates)>,
}

/// Provenance resolved for one re-tokenized text
#[derive(Debug, Clone)]
pub struct ResolvedProvenance {
    pub plain_text_source: String,
    pub index: ProvenanceIndex,
}

impl ResolvedProvenance {
    /// Text source without image provenance
    pub fn placeholder() -> Self {
        Self {
            plain_text_source: PLACEHOLDER_SOURCE.to_string(),
            index: ProvenanceIndex::default(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.plain_text_source == PLACEHOLDER_SOURCE
    }
}

/// Document data records keyed by document name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentDataStore {
    records: BTreeMap<String, DocumentRecord>,
}

impl DocumentDataStore {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let store = Self::from_json(&content)?;
        log::info!("loaded {} document data records from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn insert(&mut self, name: impl Into<String>, record: DocumentRecord) {
        self.records.insert(name.into(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record, in name order, whose checksum matches the text
    pub fn find(&self, text: &str) -> Option<&DocumentRecord> {
        let checksum = text_checksum(text);
        self.records
            .values()
            .find(|r| r.plain_text_md5.eq_ignore_ascii_case(&checksum))
    }

    /// Text source and interval index for a re-tokenized text
    ///
    /// Without a matching record the placeholder source and an empty index are
    /// returned. An invalid stored interval is an error.
    pub fn resolve(&self, text: &str, document: &str) -> Result<ResolvedProvenance> {
        match self.find(text) {
            Some(record) => Ok(ResolvedProvenance {
                plain_text_source: record.plain_text_source.clone(),
                index: ProvenanceIndex::new(
                    record.text_intervals.iter().cloned().map(IntervalEntry::from),
                )?,
            }),
            None => {
                log::warn!(
                    "no document data found for {}, using placeholder target source",
                    document
                );
                Ok(ResolvedProvenance::placeholder())
            }
        }
    }
}

/// Lowercase hex MD5 of the UTF-8 text
pub fn text_checksum(text: &str) -> String {
    hex::encode(Md5::digest(text.as_bytes()))
}
