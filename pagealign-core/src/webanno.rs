//! W3C Web Annotation model and target assembly
//!
//! Annotations are turned into Web Annotations by one pure mapping: the body
//! follows from the annotation kind, the targets from its coordinates, its
//! page and its anchor range.

use crate::annotation::{Annotation, AnnotationKind, IdScheme};
use crate::context::{IiifIndex, RunContext};
use crate::error::Result;
use crate::layout::{BoundingBox, Polygon};
use crate::provenance::IntervalEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ANNO_CONTEXT: &str = "http://www.w3.org/ns/anno.jsonld";
pub const REPUBLIC_CONTEXT: &str = "https://brambg.github.io/ns/republic.jsonld";
pub const HUC_DI_TT_CONTEXT: &str = "https://knaw-huc.github.io/ns/huc-di-tt.jsonld";
pub const IIIF_SELECTOR_CONTEXT: &str = "http://iiif.io/api/annex/openannotation/context.json";
pub const MEDIA_FRAGMENTS: &str = "http://www.w3.org/TR/media-frags/";
pub const RFC_5147: &str = "http://tools.ietf.org/rfc/rfc5147";
pub const TEAM_TEXT_NS: &str = "https://brambg.github.io/ns/team-text#";
pub const PAGEXML_NS: &str = "https://brambg.github.io/ns/pagexml#";

/// Version id used in text target urls when the unit has no known versions
pub const PLACEHOLDER_VERSION: &str = "placeholder";

/// Agent credited with producing the annotated content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generator {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

impl Generator {
    pub fn software(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "Software".to_string(),
            name: name.into(),
        }
    }
}

/// One Web Annotation, ready for export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebAnnotation {
    #[serde(rename = "@context")]
    pub context: &'static str,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motivation: Option<&'static str>,
    pub generated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<Generator>,
    pub body: Body,
    pub target: Vec<Target>,
}

impl WebAnnotation {
    pub fn new(id: String, generated: DateTime<Utc>, body: Body, target: Vec<Target>) -> Self {
        Self {
            context: ANNO_CONTEXT,
            id,
            kind: "Annotation",
            motivation: None,
            generated,
            generator: None,
            body,
            target,
        }
    }

    pub fn with_motivation(mut self, motivation: &'static str) -> Self {
        self.motivation = Some(motivation);
        self
    }

    pub fn with_generator(mut self, generator: Option<Generator>) -> Self {
        self.generator = generator;
        self
    }
}

/// Namespaces of the layer tags used as body types
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerContext {
    pub tt: &'static str,
    pub px: &'static str,
}

impl Default for LayerContext {
    fn default() -> Self {
        Self {
            tt: TEAM_TEXT_NS,
            px: PAGEXML_NS,
        }
    }
}

/// Body describing the layout or token element an annotation stands for
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerBody {
    #[serde(rename = "@context")]
    pub context: LayerContext,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// What a classifying body points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ClassSource {
    Uri(String),
    Labelled { id: String, label: String },
}

/// Body classifying the target against a controlled vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifyingBody {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    pub purpose: &'static str,
    pub source: ClassSource,
}

impl ClassifyingBody {
    pub fn uri(source: impl Into<String>) -> Self {
        Self {
            kind: None,
            purpose: "classifying",
            source: ClassSource::Uri(source.into()),
        }
    }

    pub fn specific_resource(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: Some("SpecificResource"),
            purpose: "classifying",
            source: ClassSource::Labelled {
                id: id.into(),
                label: label.into(),
            },
        }
    }
}

/// Annotation body, shaped per annotation kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Body {
    Layer(LayerBody),
    Classifications(Vec<ClassifyingBody>),
    Classifying(ClassifyingBody),
}

impl Body {
    /// Body of a layout, paragraph or token annotation
    pub fn layer(annotation: &Annotation) -> Self {
        Body::Layer(LayerBody {
            context: LayerContext::default(),
            id: annotation.id.clone(),
            kind: annotation.kind,
            text: annotation.metadata.text.clone(),
        })
    }
}

/// Kind of resource a target addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TargetKind {
    Image,
    Canvas,
    Text,
}

/// Selector inside a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Selector {
    FragmentSelector {
        #[serde(rename = "conformsTo")]
        conforms_to: &'static str,
        value: String,
    },
    SvgSelector {
        value: String,
    },
    #[serde(rename = "iiif:ImageApiSelector")]
    ImageApi {
        #[serde(rename = "@context")]
        context: &'static str,
        region: String,
    },
    #[serde(rename = "urn:republic:TextAnchorSelector")]
    TextAnchor {
        #[serde(rename = "@context")]
        context: &'static str,
        start: usize,
        end: usize,
    },
    TextQuoteSelector {
        exact: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        suffix: Option<String>,
    },
    TextPositionSelector {
        start: usize,
        end: usize,
    },
}

impl Selector {
    /// Media fragment `xywh=` selector for a region
    pub fn media_fragment(region: &BoundingBox) -> Self {
        Selector::FragmentSelector {
            conforms_to: MEDIA_FRAGMENTS,
            value: format!("xywh={region}"),
        }
    }

    /// RFC 5147 `char=` selector for a char range
    pub fn char_fragment(start: usize, end: usize) -> Self {
        Selector::FragmentSelector {
            conforms_to: RFC_5147,
            value: format!("char={start},{end}"),
        }
    }

    pub fn image_api(region: &BoundingBox) -> Self {
        Selector::ImageApi {
            context: IIIF_SELECTOR_CONTEXT,
            region: region.to_string(),
        }
    }
}

/// One selector or a list of them, as the target requires
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Selectors {
    One(Selector),
    Many(Vec<Selector>),
}

/// One target of a Web Annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<&'static str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TargetKind>,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<Selectors>,
}

impl Target {
    pub fn new(kind: TargetKind, source: impl Into<String>) -> Self {
        Self {
            context: None,
            kind: Some(kind),
            source: source.into(),
            selector: None,
        }
    }

    /// Target without a declared resource type
    pub fn untyped(source: impl Into<String>) -> Self {
        Self {
            context: None,
            kind: None,
            source: source.into(),
            selector: None,
        }
    }

    pub fn with_context(mut self, context: &'static str) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = Some(Selectors::One(selector));
        self
    }

    pub fn with_selectors(mut self, selectors: Vec<Selector>) -> Self {
        self.selector = Some(Selectors::Many(selectors));
        self
    }

    /// Selectors of the target, flattened
    pub fn selectors(&self) -> Vec<&Selector> {
        match &self.selector {
            None => Vec::new(),
            Some(Selectors::One(s)) => vec![s],
            Some(Selectors::Many(list)) => list.iter().collect(),
        }
    }
}

/// Full resolution image url
pub fn full_image_url(iiif_base_url: &str) -> String {
    format!("{iiif_base_url}/full/max/0/default.jpg")
}

/// Url of a rectangular image region
pub fn region_image_url(iiif_base_url: &str, region: &BoundingBox) -> String {
    format!("{iiif_base_url}/{region}/max/0/default.jpg")
}

/// SVG outline of all polygons, one closed sub-path per polygon
///
/// The image is sized to the largest coordinates over all polygons.
pub fn svg_selector(polygons: &[Polygon]) -> Selector {
    let height = polygons.iter().map(Polygon::max_y).max().unwrap_or(0);
    let width = polygons.iter().map(Polygon::max_x).max().unwrap_or(0);
    let path = polygons
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| {
            let steps = p
                .points()
                .iter()
                .enumerate()
                .map(|(i, pt)| format!("{}{} {}", if i == 0 { 'M' } else { 'L' }, pt.x(), pt.y()))
                .collect::<Vec<_>>()
                .join(" ");
            format!("{steps} Z")
        })
        .collect::<Vec<_>>()
        .join(" ");
    Selector::SvgSelector {
        value: format!(r#"<svg height="{height}" width="{width}"><path d="{path}"/></svg>"#),
    }
}

/// Builds target lists for annotations of one run
#[derive(Debug, Clone, Copy)]
pub struct TargetAssembler<'a> {
    ids: &'a IdScheme,
    iiif: &'a IiifIndex,
    text_repo_base_url: &'a str,
}

impl<'a> TargetAssembler<'a> {
    pub fn new(ids: &'a IdScheme, iiif: &'a IiifIndex, text_repo_base_url: &'a str) -> Self {
        Self {
            ids,
            iiif,
            text_repo_base_url,
        }
    }

    pub fn from_context(context: &'a RunContext) -> Self {
        Self::new(
            &context.ids,
            &context.iiif,
            context.config.text_repo_base_url(),
        )
    }

    /// Targets of an annotation produced by this run
    ///
    /// Image and canvas targets need the IIIF base url of the page, so an
    /// unknown page is an error when the annotation has coordinates or is a
    /// page record.
    pub fn targets(&self, annotation: &Annotation) -> Result<Vec<Target>> {
        let mut targets = Vec::new();
        let coords = &annotation.metadata.coords;

        if !coords.is_empty() {
            let base_url = self.iiif.base_url(&annotation.page_id)?;
            targets.extend(self.image_targets(base_url, coords));
            targets.push(self.canvas_target(&annotation.page_id, coords));
        }

        if annotation.kind == AnnotationKind::Page {
            let base_url = self.iiif.base_url(&annotation.page_id)?;
            targets.push(Target::new(TargetKind::Image, full_image_url(base_url)));
        }

        targets.extend(self.text_targets(annotation));
        Ok(targets)
    }

    /// A region image per polygon, then the full image with every selector
    fn image_targets(&self, base_url: &str, coords: &[Polygon]) -> Vec<Target> {
        let mut targets = Vec::with_capacity(coords.len() + 1);
        let mut selectors = Vec::with_capacity(coords.len() + 1);
        for region in coords.iter().filter_map(Polygon::bounding_box) {
            targets.push(Target::new(
                TargetKind::Image,
                region_image_url(base_url, &region),
            ));
            selectors.push(Selector::media_fragment(&region));
        }
        selectors.push(svg_selector(coords));
        targets.push(Target::new(TargetKind::Image, full_image_url(base_url)).with_selectors(selectors));
        targets
    }

    fn canvas_target(&self, page_id: &str, coords: &[Polygon]) -> Target {
        let mut selectors: Vec<Selector> = coords
            .iter()
            .filter_map(Polygon::bounding_box)
            .map(|region| Selector::image_api(&region))
            .collect();
        selectors.push(svg_selector(coords));
        Target::new(TargetKind::Canvas, self.ids.canvas(page_id))
            .with_context(REPUBLIC_CONTEXT)
            .with_selectors(selectors)
    }

    /// Anchor range target, cutout view target and the optional char range target
    pub fn text_targets(&self, annotation: &Annotation) -> Vec<Target> {
        let base = self.text_repo_base_url;
        let segmented = annotation
            .segmented_version_id
            .as_deref()
            .unwrap_or(PLACEHOLDER_VERSION);
        let (begin, end) = (annotation.begin_anchor, annotation.end_anchor);

        let mut targets = vec![
            Target::new(
                TargetKind::Text,
                format!("{base}/rest/versions/{segmented}/contents"),
            )
            .with_selector(Selector::TextAnchor {
                context: REPUBLIC_CONTEXT,
                start: begin,
                end,
            }),
            Target::new(
                TargetKind::Text,
                format!("{base}/view/versions/{segmented}/segments/index/{begin}/{end}"),
            ),
        ];

        if let Some(txt) = annotation.txt_version_id.as_deref() {
            targets.push(
                Target::new(
                    TargetKind::Text,
                    format!("{base}/rest/versions/{txt}/contents"),
                )
                .with_selector(Selector::char_fragment(annotation.char_start, annotation.char_end)),
            );
        }
        targets
    }
}

/// Region image, full image with media fragment and canvas targets per interval
///
/// Intervals are expected in ascending order, as returned by the index.
pub fn provenance_targets(intervals: &[&IntervalEntry]) -> Vec<Target> {
    let mut targets = Vec::with_capacity(intervals.len() * 3);
    for interval in intervals {
        let source = &interval.data;
        let Some(region) = source.coords.bounding_box() else {
            log::warn!(
                "interval [{}, {}) has no coordinates, skipping image targets",
                interval.start,
                interval.end
            );
            continue;
        };
        targets.push(Target::new(
            TargetKind::Image,
            region_image_url(&source.iiif_base_uri, &region),
        ));
        targets.push(
            Target::new(TargetKind::Image, full_image_url(&source.iiif_base_uri))
                .with_selector(Selector::media_fragment(&region)),
        );
        targets.push(
            Target::new(TargetKind::Canvas, source.canvas_id.clone())
                .with_context(HUC_DI_TT_CONTEXT)
                .with_selector(Selector::image_api(&region)),
        );
    }
    targets
}

/// Web Annotation for an annotation produced by this run
pub fn to_web_annotation(context: &RunContext, annotation: &Annotation) -> Result<WebAnnotation> {
    let targets = TargetAssembler::from_context(context).targets(annotation)?;
    Ok(WebAnnotation::new(
        context.ids.web_annotation(&annotation.id),
        context.generated,
        Body::layer(annotation),
        targets,
    )
    .with_motivation("classifying")
    .with_generator(context.config.generator().cloned()))
}
