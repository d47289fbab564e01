//! Multi-document accumulator
//!
//! Chains the offset index builder over the pages of one processing unit so
//! the whole unit shares one continuous offset space.

use crate::annotation::{Annotation, IdScheme};
use crate::error::Result;
use crate::layout::LayoutDocument;
use crate::offset_index::{IndexedDocument, OffsetIndexBuilder};
use crate::pages::PageRanges;

/// Text and annotations of a whole unit, offsets in the global space
#[derive(Debug, Clone, Default)]
pub struct AccumulatedUnit {
    pub text: String,
    /// Length of `text` in chars
    pub char_len: usize,
    pub annotations: Vec<Annotation>,
    pub page_ranges: PageRanges,
}

impl AccumulatedUnit {
    /// Paragraphs of the unit text, each keeping its closing newline
    pub fn paragraphs(&self) -> Vec<&str> {
        self.text.split_inclusive('\n').collect()
    }
}

/// Incrementally rebases indexed documents into one unit
#[derive(Debug)]
pub struct Accumulator<'a> {
    builder: OffsetIndexBuilder<'a>,
    unit: AccumulatedUnit,
}

impl<'a> Accumulator<'a> {
    pub fn new(ids: &'a IdScheme) -> Self {
        Self {
            builder: OffsetIndexBuilder::new(ids),
            unit: AccumulatedUnit::default(),
        }
    }

    /// Index a layout document and append it to the unit
    pub fn push(&mut self, document: &LayoutDocument) -> Result<()> {
        let indexed = self.builder.build(document)?;
        self.push_indexed(indexed);
        Ok(())
    }

    /// Append an already indexed document, rebasing it by the unit length so far
    pub fn push_indexed(&mut self, document: IndexedDocument) {
        let start = self.unit.char_len;
        let end = start + document.char_len;

        self.unit
            .annotations
            .extend(document.annotations.into_iter().map(|mut a| {
                a.rebase(start);
                a
            }));
        self.unit.text.push_str(&document.text);
        self.unit.char_len = end;
        self.unit.page_ranges.insert(&document.page_id, start, end);
    }

    pub fn finish(self) -> AccumulatedUnit {
        self.unit
    }
}

/// Index and accumulate the documents of one unit, in the given order
pub fn accumulate(ids: &IdScheme, documents: &[LayoutDocument]) -> Result<AccumulatedUnit> {
    let mut accumulator = Accumulator::new(ids);
    for document in documents {
        accumulator.push(document)?;
    }
    Ok(accumulator.finish())
}
