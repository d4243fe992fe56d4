//! Character dictionary for the recognizer
//!
//! Index 0 is the CTC blank and never maps to a real glyph. The final entry
//! is always a single space.

use std::io::Read;
use tracing::info;

use crate::error::{OcrError, Result};

/// Placeholder stored at index 0
pub const PLACEHOLDER: &str = "black";

/// Ordered index → glyph table, read-only once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    entries: Vec<String>,
}

impl LabelTable {
    /// Build from newline-delimited dictionary content.
    ///
    /// Lines are split on `\n` only, so a `\r` or surrounding whitespace in
    /// the source stays part of the entry. Trailing empty lines are dropped.
    pub fn parse(content: &str) -> Self {
        let mut lines: Vec<&str> = content.split('\n').collect();
        if !content.is_empty() {
            while lines.last().is_some_and(|line| line.is_empty()) {
                lines.pop();
            }
        }

        let mut entries = Vec::with_capacity(lines.len() + 2);
        entries.push(PLACEHOLDER.to_string());
        entries.extend(lines.into_iter().map(str::to_string));
        entries.push(" ".to_string());

        info!("loaded {} labels", entries.len());
        Self { entries }
    }

    /// Build from a UTF-8 byte stream
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let content = String::from_utf8(bytes)
            .map_err(|e| OcrError::Dictionary(format!("dictionary is not valid UTF-8: {}", e)))?;
        Ok(Self::parse(&content))
    }

    /// Raw entry for an engine index, `None` when out of range
    pub fn get(&self, index: i32) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get(i))
            .map(String::as_str)
    }

    /// Glyph that an index contributes to recognized text.
    ///
    /// The placeholder at index 0 contributes nothing, same as an
    /// out-of-range index.
    pub fn glyph(&self, index: i32) -> Option<&str> {
        if index == 0 {
            return None;
        }
        self.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_adds_placeholder_and_space() {
        let table = LabelTable::parse("A\nB");
        assert_eq!(table.len(), 4);
        assert_eq!(table.entries(), &["black", "A", "B", " "]);
    }

    #[test]
    fn test_trailing_newline_dropped() {
        let table = LabelTable::parse("A\nB\n\n");
        assert_eq!(table.entries(), &["black", "A", "B", " "]);
    }

    #[test]
    fn test_whitespace_preserved() {
        let table = LabelTable::parse("A\r\n B \n");
        assert_eq!(table.get(1), Some("A\r"));
        assert_eq!(table.get(2), Some(" B "));
    }

    #[test]
    fn test_empty_content() {
        let table = LabelTable::parse("");
        assert_eq!(table.entries(), &["black", "", " "]);
    }

    #[test]
    fn test_out_of_range_lookup() {
        let table = LabelTable::parse("A\nB");
        assert_eq!(table.get(-1), None);
        assert_eq!(table.get(4), None);
        assert_eq!(table.get(3), Some(" "));
    }

    #[test]
    fn test_placeholder_is_not_a_glyph() {
        let table = LabelTable::parse("A\nB");
        assert_eq!(table.get(0), Some(PLACEHOLDER));
        assert_eq!(table.glyph(0), None);
        assert_eq!(table.glyph(1), Some("A"));
        assert_eq!(table.glyph(4), None);
    }

    #[test]
    fn test_from_reader_rejects_invalid_utf8() {
        let bytes: &[u8] = &[0x41, 0xff, 0xfe];
        let result = LabelTable::from_reader(bytes);
        assert!(matches!(result, Err(OcrError::Dictionary(_))));
    }

    #[test]
    fn test_from_reader_multibyte() {
        let table = LabelTable::from_reader("京\n沪\n".as_bytes()).unwrap();
        assert_eq!(table.get(1), Some("京"));
        assert_eq!(table.get(2), Some("沪"));
    }
}
