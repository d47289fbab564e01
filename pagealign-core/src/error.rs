//! Error types for alignment and annotation export

use thiserror::Error;

/// Errors that can occur while indexing, anchoring or exporting annotations
#[derive(Debug, Error)]
pub enum Error {
    /// A layout element could not be resolved to its own text range
    #[error("Malformed layout in {document}: element '{element}' {reason}")]
    MalformedLayout {
        document: String,
        element: String,
        reason: String,
    },

    /// A page id has no IIIF base url, so image targets cannot be formed
    #[error("No IIIF base url known for page '{0}'")]
    UnknownPage(String),

    /// More than one metadata record matches a processing unit
    #[error("{count} metadata records match '{unit}', correct the metadata table")]
    AmbiguousMetadata { unit: String, count: usize },

    /// A provenance interval with no extent
    #[error("Invalid provenance interval [{start}, {end})")]
    InvalidInterval { start: usize, end: usize },

    /// A named entity label missing from the entity dictionary
    #[error("Unknown entity label '{0}'")]
    UnknownEntity(String),

    /// The tokenizer rejected its input
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Invalid configuration or rule file
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// File access failure
    #[error("Failed to access {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV table failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing failure
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Build an I/O error for a path
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Whether this error must stop the whole run instead of only the current unit
    pub fn aborts_run(&self) -> bool {
        matches!(
            self,
            Error::AmbiguousMetadata { .. } | Error::Configuration(_)
        )
    }
}

/// Result type for pagealign operations
pub type Result<T> = std::result::Result<T, Error>;
