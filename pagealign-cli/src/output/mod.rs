//! Run summary formatting module

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

/// Trait for run summary formatters
pub trait SummaryFormatter: Send {
    /// Report an item whose files were written
    fn written(&mut self, name: &str, files: &[PathBuf]) -> Result<()>;

    /// Report an item that failed
    fn failed(&mut self, name: &str, reason: &str) -> Result<()>;

    /// Finalize output (e.g., write the collected JSON)
    fn finish(&mut self) -> Result<()>;
}

pub mod json;
pub mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

/// Supported summary formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    /// One line per item
    #[default]
    Text,
    /// JSON object with written and failed items
    Json,
}

impl SummaryFormat {
    /// Formatter writing to `writer`
    pub fn formatter<'w, W: Write + Send + 'w>(self, writer: W) -> Box<dyn SummaryFormatter + 'w> {
        match self {
            SummaryFormat::Text => Box::new(TextFormatter::new(writer)),
            SummaryFormat::Json => Box::new(JsonFormatter::new(writer)),
        }
    }
}
