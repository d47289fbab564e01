//! Character offset helpers
//!
//! All offsets exchanged by pagealign count Unicode scalar values, while Rust
//! strings are indexed by byte. [`CharIndex`] bridges the two for one text.

/// Number of chars in a string
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset lookup table for the char boundaries of one text
#[derive(Debug, Clone)]
pub struct CharIndex<'a> {
    text: &'a str,
    /// Byte offset of every char, plus the total byte length at the end
    byte_offsets: Vec<usize>,
}

impl<'a> CharIndex<'a> {
    /// Index the char boundaries of `text`
    pub fn new(text: &'a str) -> Self {
        let mut byte_offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        byte_offsets.push(text.len());
        Self { text, byte_offsets }
    }

    /// Length of the text in chars
    pub fn len(&self) -> usize {
        self.byte_offsets.len() - 1
    }

    /// Whether the text is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte offset of a char offset, clamped to the end of the text
    pub fn byte_offset(&self, char_offset: usize) -> usize {
        self.byte_offsets[char_offset.min(self.len())]
    }

    /// Slice by char range, clamping both ends to the text
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        let start = self.byte_offset(start);
        let end = self.byte_offset(end).max(start);
        &self.text[start..end]
    }
}
