//! The flat annotation record shared by every layer
//!
//! Layout elements, tokens and paragraphs all become an [`Annotation`]: a
//! typed, half-open char range over the unit text plus an open metadata bag.
//! Records are created by the offset index builder or the segmenter, rebased
//! once by the accumulator, anchored once, and never changed after export.

use crate::layout::Polygon;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Page id used when an offset cannot be attributed to exactly one page
pub const PLACEHOLDER_PAGE_ID: &str = ":placeholder:";

/// Layer an annotation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnnotationKind {
    #[serde(rename = "px:Page")]
    Page,
    #[serde(rename = "px:TextRegion")]
    TextRegion,
    #[serde(rename = "px:TextLine")]
    TextLine,
    #[serde(rename = "tt:Word")]
    Word,
    #[serde(rename = "tt:Paragraph")]
    Paragraph,
    #[serde(rename = "tt:Token")]
    Token,
}

impl AnnotationKind {
    /// Serialized type tag
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Page => "px:Page",
            AnnotationKind::TextRegion => "px:TextRegion",
            AnnotationKind::TextLine => "px:TextLine",
            AnnotationKind::Word => "tt:Word",
            AnnotationKind::Paragraph => "tt:Paragraph",
            AnnotationKind::Token => "tt:Token",
        }
    }

    /// Whether records of this kind come from the page layout
    pub fn is_layout(&self) -> bool {
        matches!(
            self,
            AnnotationKind::Page
                | AnnotationKind::TextRegion
                | AnnotationKind::TextLine
                | AnnotationKind::Word
        )
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Open metadata bag with typed access to the keys pagealign itself reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coords: Vec<Polygon>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Text repository version ids for one processing unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextVersions {
    pub txt: String,
    pub segmented: String,
    pub conll: String,
}

/// One annotated char range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    pub id: String,
    pub page_id: String,
    pub offset: usize,
    pub length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmented_version_id: Option<String>,
    #[serde(default)]
    pub begin_anchor: usize,
    #[serde(default)]
    pub end_anchor: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txt_version_id: Option<String>,
    #[serde(default)]
    pub char_start: usize,
    #[serde(default)]
    pub char_end: usize,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Annotation {
    pub fn new(
        kind: AnnotationKind,
        id: impl Into<String>,
        page_id: impl Into<String>,
        offset: usize,
        length: usize,
    ) -> Self {
        Self {
            kind,
            id: id.into(),
            page_id: page_id.into(),
            offset,
            length,
            segmented_version_id: None,
            begin_anchor: 0,
            end_anchor: 0,
            txt_version_id: None,
            char_start: 0,
            char_end: 0,
            metadata: Metadata::default(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.metadata.text = Some(text.into());
        self
    }

    pub fn with_coords(mut self, coords: Vec<Polygon>) -> Self {
        self.metadata.coords = coords;
        self
    }

    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.extra.insert(key.to_string(), value.into());
        self
    }

    /// Exclusive end of the char range
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Shift the range into a larger offset space
    pub fn rebase(&mut self, delta: usize) {
        self.offset += delta;
    }

    /// Attach the unit's text repository versions and the char range they address
    pub fn attach_versions(&mut self, versions: &TextVersions) {
        self.segmented_version_id = Some(versions.segmented.clone());
        self.txt_version_id = Some(versions.txt.clone());
        self.char_start = self.offset;
        self.char_end = self.end();
    }
}

/// Deterministic URN scheme for annotation ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdScheme {
    namespace: String,
}

impl IdScheme {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Prefix shared by every element of a page; also the page annotation id
    pub fn page(&self, page_id: &str) -> String {
        format!("urn:{}:{}", self.namespace, page_id)
    }

    pub fn region(&self, page_id: &str, region_id: &str) -> String {
        format!("{}:textregion:{}", self.page(page_id), region_id)
    }

    pub fn line(&self, page_id: &str, line_id: &str) -> String {
        format!("{}:textline:{}", self.page(page_id), line_id)
    }

    pub fn word(&self, page_id: &str, word_id: &str) -> String {
        format!("{}:word:{}", self.page(page_id), word_id)
    }

    pub fn paragraph(&self, base_name: &str, number: usize) -> String {
        format!("urn:{}:{}:paragraph:{}", self.namespace, base_name, number)
    }

    pub fn token(&self, base_name: &str, index: usize) -> String {
        format!("urn:{}:{}:token:{}", self.namespace, base_name, index)
    }

    pub fn canvas(&self, page_id: &str) -> String {
        format!("urn:{}:canvas:{}", self.namespace, page_id)
    }

    /// Web Annotation id derived from the annotation id, stable across runs
    pub fn web_annotation(&self, annotation_id: &str) -> String {
        let uuid = Uuid::new_v5(&Uuid::NAMESPACE_URL, annotation_id.as_bytes());
        self.external_annotation(&uuid.to_string())
    }

    /// Web Annotation id for an annotation that already has an external id
    pub fn external_annotation(&self, id: &str) -> String {
        format!("urn:{}:annotation:{}", self.namespace, id)
    }
}

impl Default for IdScheme {
    fn default() -> Self {
        Self::new(crate::config::defaults::ID_NAMESPACE)
    }
}
