//! Re-alignment of externally produced annotations
//!
//! Entity and event annotators work on the exported plain text, re-tokenized
//! on their side. Their char ranges are trusted only against the interval
//! index of the exact text they annotated, found through its checksum.

use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::provenance::{DocumentDataStore, ResolvedProvenance};
use crate::text::CharIndex;
use crate::webanno::{provenance_targets, Body, ClassifyingBody, Selector, Target, WebAnnotation};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Embedded default entity dictionary
pub const DEFAULT_ENTITIES: &str = include_str!("../configs/entities.toml");

/// Longest prefix or suffix search window is twice this
const MAX_FIX_LEN: usize = 20;

/// Named entity labels mapped to vocabulary terms
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityDictionary {
    base_uri: String,
    labels: BTreeMap<String, String>,
}

/// Vocabulary term of one entity label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTerm<'a> {
    pub uri: String,
    pub label: &'a str,
}

impl EntityDictionary {
    pub fn from_toml(content: &str) -> Result<Self> {
        let dictionary: Self = toml::from_str(content)?;
        if dictionary.labels.is_empty() {
            return Err(Error::Configuration(
                "entity dictionary defines no labels".into(),
            ));
        }
        Ok(dictionary)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml(&content)
    }

    pub fn embedded() -> Result<Self> {
        Self::from_toml(DEFAULT_ENTITIES)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn term(&self, label: &str) -> Result<EntityTerm<'_>> {
        let description = self
            .labels
            .get(label)
            .ok_or_else(|| Error::UnknownEntity(label.to_string()))?;
        Ok(EntityTerm {
            uri: format!("{}{}", self.base_uri, label),
            label: description,
        })
    }
}

/// Annotated text exported by an external annotation tool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalDocument {
    pub text: String,
    #[serde(default)]
    pub annotations: Vec<ExternalAnnotation>,
}

impl ExternalDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// One externally produced annotation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExternalAnnotation {
    NamedEntity {
        id: String,
        begin: usize,
        end: usize,
        value: String,
    },
    EventPredicate {
        id: String,
        begin: usize,
        end: usize,
        category: String,
        relation_type: String,
        /// Ids of the event's arguments
        #[serde(default)]
        arguments: Vec<String>,
    },
    /// An argument without its own range takes the range of `target`
    EventArgument {
        id: String,
        role: String,
        begin: Option<usize>,
        end: Option<usize>,
        target: Option<String>,
    },
}

impl ExternalAnnotation {
    pub fn id(&self) -> &str {
        match self {
            ExternalAnnotation::NamedEntity { id, .. }
            | ExternalAnnotation::EventPredicate { id, .. }
            | ExternalAnnotation::EventArgument { id, .. } => id,
        }
    }

    /// Own char range, if the annotation has one
    pub fn range(&self) -> Option<(usize, usize)> {
        match *self {
            ExternalAnnotation::NamedEntity { begin, end, .. }
            | ExternalAnnotation::EventPredicate { begin, end, .. } => Some((begin, end)),
            ExternalAnnotation::EventArgument {
                begin: Some(begin),
                end: Some(end),
                ..
            } => Some((begin, end)),
            ExternalAnnotation::EventArgument { .. } => None,
        }
    }
}

/// Text quote selector with prefix and suffix context
fn quote_selector(text: &CharIndex<'_>, begin: usize, end: usize) -> Selector {
    Selector::TextQuoteSelector {
        exact: text.slice(begin, end).to_string(),
        prefix: Some(prefix(text, begin)).filter(|p| !p.is_empty()),
        suffix: Some(suffix(text, end)).filter(|s| !s.is_empty()),
    }
}

/// Context before `begin`: the preceding window, left-trimmed, starting after
/// the last space within its first [`MAX_FIX_LEN`] chars
fn prefix(text: &CharIndex<'_>, begin: usize) -> String {
    let window = text.slice(begin.saturating_sub(MAX_FIX_LEN * 2), begin);
    let window: Vec<char> = window.trim_start().replace('\n', " ").chars().collect();
    let head = &window[..window.len().min(MAX_FIX_LEN)];
    match head.iter().rposition(|&c| c == ' ') {
        Some(space) => window[space + 1..].iter().collect(),
        None => window.iter().collect(),
    }
}

/// Context after `end`: the following window, right-trimmed, cut at the last
/// space within its first [`MAX_FIX_LEN`] chars
fn suffix(text: &CharIndex<'_>, end: usize) -> String {
    let window = text.slice(end, end + MAX_FIX_LEN * 2);
    let window: Vec<char> = window.trim_end().replace('\n', " ").chars().collect();
    let head = &window[..window.len().min(MAX_FIX_LEN)];
    match head.iter().rposition(|&c| c == ' ') {
        Some(space) => window[..space].iter().collect(),
        None => window.iter().collect(),
    }
}

/// Turns external annotations into Web Annotations with provenance targets
pub struct Realigner<'a> {
    context: &'a RunContext,
    provenance: &'a ResolvedProvenance,
}

impl<'a> Realigner<'a> {
    pub fn new(context: &'a RunContext, provenance: &'a ResolvedProvenance) -> Self {
        Self {
            context,
            provenance,
        }
    }

    /// Web Annotations for every usable annotation, ordered by start offset
    ///
    /// Annotations that cannot be converted are logged and left out.
    pub fn realign(&self, document: &ExternalDocument) -> Vec<WebAnnotation> {
        let text = CharIndex::new(&document.text);
        let ranges: HashMap<&str, (usize, usize)> = document
            .annotations
            .iter()
            .filter_map(|a| a.range().map(|r| (a.id(), r)))
            .collect();

        let mut positioned: Vec<(usize, WebAnnotation)> = Vec::new();
        for annotation in &document.annotations {
            if let ExternalAnnotation::NamedEntity { value, .. } = annotation {
                if value.is_empty() {
                    continue;
                }
            }
            let range = annotation.range().or_else(|| match annotation {
                ExternalAnnotation::EventArgument {
                    target: Some(target),
                    ..
                } => ranges.get(target.as_str()).copied(),
                _ => None,
            });
            let Some((begin, end)) = range else {
                log::warn!("annotation {} has no char range, skipping", annotation.id());
                continue;
            };
            if begin > end || end > text.len() {
                log::warn!(
                    "annotation {} range [{}, {}) is outside the text ({} chars), skipping",
                    annotation.id(),
                    begin,
                    end,
                    text.len()
                );
                continue;
            }

            match self.body(annotation) {
                Ok(body) => positioned.push((
                    begin,
                    self.web_annotation(annotation.id(), body, &text, begin, end),
                )),
                Err(e) => log::warn!("skipping annotation {}: {}", annotation.id(), e),
            }
        }

        positioned.sort_by_key(|(begin, _)| *begin);
        positioned.into_iter().map(|(_, wa)| wa).collect()
    }

    fn body(&self, annotation: &ExternalAnnotation) -> Result<Body> {
        let wiki = self.context.config.event_wiki_base();
        match annotation {
            ExternalAnnotation::NamedEntity { value, .. } => {
                let term = self.context.entities.term(value)?;
                Ok(Body::Classifications(vec![ClassifyingBody::specific_resource(
                    term.uri, term.label,
                )]))
            }
            ExternalAnnotation::EventPredicate {
                category,
                relation_type,
                ..
            } => {
                let category = category.replace('+', "Plus").replace('-', "Min");
                Ok(Body::Classifications(vec![
                    ClassifyingBody::uri(format!("{wiki}{category}")),
                    ClassifyingBody::uri(format!("{wiki}{relation_type}")),
                ]))
            }
            ExternalAnnotation::EventArgument { role, .. } => {
                Ok(Body::Classifying(ClassifyingBody::uri(format!("{wiki}{role}"))))
            }
        }
    }

    fn web_annotation(
        &self,
        id: &str,
        body: Body,
        text: &CharIndex<'_>,
        begin: usize,
        end: usize,
    ) -> WebAnnotation {
        let mut targets = vec![Target::untyped(&self.provenance.plain_text_source)
            .with_selectors(vec![
                quote_selector(text, begin, end),
                Selector::TextPositionSelector { start: begin, end },
            ])];

        let intervals = self.provenance.index.query(begin, end);
        if intervals.len() > 1 {
            log::warn!(
                "annotation {} overlaps {} source intervals",
                id,
                intervals.len()
            );
        }
        targets.extend(provenance_targets(&intervals));

        WebAnnotation::new(
            self.context.ids.external_annotation(id),
            self.context.generated,
            body,
            targets,
        )
    }
}

/// Re-aligned output of one external document
#[derive(Debug, Clone)]
pub struct RealignedDocument {
    pub plain_text_source: String,
    pub text: String,
    pub web_annotations: Vec<WebAnnotation>,
}

/// Resolve provenance for an external document and convert its annotations
pub fn realign_document(
    context: &RunContext,
    store: &DocumentDataStore,
    document: ExternalDocument,
    name: &str,
) -> Result<RealignedDocument> {
    let provenance = store.resolve(&document.text, name)?;
    let web_annotations = Realigner::new(context, &provenance).realign(&document);
    log::info!(
        "{}: {} web annotations against {}",
        name,
        web_annotations.len(),
        provenance.plain_text_source
    );
    Ok(RealignedDocument {
        plain_text_source: provenance.plain_text_source,
        text: document.text,
        web_annotations,
    })
}
