//! Offset indexing, token anchoring and Web Annotation assembly for page layout text
//!
//! Text recognised on scanned pages comes with a layout tree of regions,
//! lines and words. This crate concatenates the text of a group of pages into
//! one offset space, records a char range for every layout element, segments
//! the text into tokens and exports everything as W3C Web Annotations whose
//! targets point back at the text, the IIIF image and the canvas.
//!
//! Char offsets are counted in Unicode scalar values throughout.
//!
//! # Example
//!
//! ```rust
//! use pagealign_core::{
//!     Config, LayoutDocument, LayoutLine, LayoutPage, LayoutRegion, LayoutWord, Polygon,
//!     RuleTokenizer, RunContext, UnitProcessor, IiifIndex,
//! };
//!
//! let square = Polygon::from_pairs(&[(0, 0), (40, 0), (40, 10), (0, 10)]);
//! let word = |id: &str, text: &str| LayoutWord {
//!     id: id.to_string(),
//!     text: text.to_string(),
//!     coords: square.clone(),
//! };
//! let page = LayoutPage {
//!     id: "NL_1_0001".to_string(),
//!     regions: vec![LayoutRegion {
//!         id: "r1".to_string(),
//!         coords: square.clone(),
//!         lines: vec![LayoutLine {
//!             id: "l1".to_string(),
//!             coords: square.clone(),
//!             words: vec![word("w1", "Go "), word("w2", "home.\n")],
//!         }],
//!     }],
//! };
//!
//! let mut iiif = IiifIndex::new();
//! iiif.insert("NL_1_0001", "https://iiif.example.org/NL_1_0001");
//! let context = RunContext::new(Config::default()).unwrap().with_iiif(iiif);
//! let tokenizer = RuleTokenizer::with_default_rules().unwrap();
//!
//! let output = UnitProcessor::new(&context, &tokenizer)
//!     .process_documents("NL_1_0001_0001", &[LayoutDocument::new("NL_1_0001.json", page)])
//!     .unwrap();
//!
//! assert_eq!(output.text, "Go home.\n");
//! assert_eq!(output.tokens.len(), 4);
//! assert_eq!(output.web_annotations.len(), output.annotations.len());
//! ```

pub mod accumulator;
pub mod annotation;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod layout;
pub mod offset_index;
pub mod ordering;
pub mod pages;
pub mod pipeline;
pub mod provenance;
pub mod realign;
pub mod segmenter;
pub mod text;
pub mod tokenizer;
pub mod webanno;

pub use accumulator::{accumulate, AccumulatedUnit, Accumulator};
pub use annotation::{Annotation, AnnotationKind, IdScheme, Metadata, TextVersions};
pub use config::{Config, ConfigBuilder};
pub use context::{IiifIndex, MetadataRecord, MetadataTable, RunContext, VersionTable};
pub use error::{Error, Result};
pub use export::UnitOutput;
pub use layout::{LayoutDocument, LayoutLine, LayoutPage, LayoutRegion, LayoutWord, Point, Polygon};
pub use offset_index::{IndexedDocument, OffsetIndexBuilder};
pub use ordering::sort_annotations;
pub use pages::PageRanges;
pub use pipeline::{process_units, ProcessingUnit, RunSummary, UnitProcessor, UnitReport};
pub use provenance::{DocumentDataStore, ProvenanceIndex, ResolvedProvenance, SourceCoordinates};
pub use realign::{realign_document, EntityDictionary, ExternalDocument, RealignedDocument};
pub use segmenter::{segment_range, AnchorResolver, Segmentation, Segmenter, Token};
pub use tokenizer::{RuleTokenizer, Tokenizer, TokenizerRules};
pub use webanno::{TargetAssembler, WebAnnotation};
