//! JSON summary formatter

use super::SummaryFormatter;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

/// JSON formatter - collects items and writes one object at the end
pub struct JsonFormatter<W: Write> {
    writer: W,
    summary: RunSummaryData,
}

/// Data structure for JSON output
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RunSummaryData {
    pub written: Vec<WrittenItem>,
    pub failed: Vec<FailedItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WrittenItem {
    pub name: String,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FailedItem {
    pub name: String,
    pub error: String,
}

impl<W: Write> JsonFormatter<W> {
    /// Create a new JSON formatter
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            summary: RunSummaryData::default(),
        }
    }
}

impl<W: Write + Send> SummaryFormatter for JsonFormatter<W> {
    fn written(&mut self, name: &str, files: &[PathBuf]) -> Result<()> {
        self.summary.written.push(WrittenItem {
            name: name.to_string(),
            files: files.to_vec(),
        });
        Ok(())
    }

    fn failed(&mut self, name: &str, reason: &str) -> Result<()> {
        self.summary.failed.push(FailedItem {
            name: name.to_string(),
            error: reason.to_string(),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, &self.summary)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
