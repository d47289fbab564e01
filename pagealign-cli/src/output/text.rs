//! Plain text summary formatter

use super::SummaryFormatter;
use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;

/// Text formatter - one line per item, then the totals
pub struct TextFormatter<W: Write> {
    writer: W,
    written: usize,
    failed: usize,
}

impl<W: Write> TextFormatter<W> {
    /// Create a new text formatter
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            failed: 0,
        }
    }
}

impl<W: Write + Send> SummaryFormatter for TextFormatter<W> {
    fn written(&mut self, name: &str, files: &[PathBuf]) -> Result<()> {
        self.written += 1;
        writeln!(self.writer, "✓ {name} ({} files)", files.len())?;
        Ok(())
    }

    fn failed(&mut self, name: &str, reason: &str) -> Result<()> {
        self.failed += 1;
        writeln!(self.writer, "✗ {name}: {reason}")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        writeln!(
            self.writer,
            "{} written, {} failed",
            self.written, self.failed
        )?;
        self.writer.flush()?;
        Ok(())
    }
}
