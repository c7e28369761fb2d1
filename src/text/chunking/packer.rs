//! Delimiter based greedy packing
//!
//! Parts are accumulated in reading order until the next one would push the
//! buffer over the budget. No look-ahead, no re-balancing: an oversized part is
//! passed through untouched and left to the next cascade level.

use super::error::{ChunkingError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreedyPacker {
    delimiter: String,
    delimiter_chars: usize,
}

impl GreedyPacker {
    /// blank line between paragraphs
    pub const PARAGRAPH_DELIMITER: &'static str = "\n\n";
    pub const LINE_DELIMITER: &'static str = "\n";

    pub fn new(delimiter: impl Into<String>) -> Result<Self> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(ChunkingError::configuration(
                "packing delimiter must not be empty",
            ));
        }
        let delimiter_chars = delimiter.chars().count();
        Ok(Self {
            delimiter,
            delimiter_chars,
        })
    }

    pub fn paragraphs() -> Self {
        Self {
            delimiter: Self::PARAGRAPH_DELIMITER.to_string(),
            delimiter_chars: 2,
        }
    }

    pub fn lines() -> Self {
        Self {
            delimiter: Self::LINE_DELIMITER.to_string(),
            delimiter_chars: 1,
        }
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Split `text` on the delimiter and pack the trimmed parts into blocks
    /// of at most `max_chars` characters (single oversized parts excepted).
    pub fn pack(&self, text: &str, max_chars: usize) -> Vec<String> {
        let mut blocks = Vec::new();
        let mut current = String::new();
        let mut current_chars = 0;

        for part in text
            .split(self.delimiter.as_str())
            .map(str::trim)
            .filter(|p| !p.is_empty())
        {
            let part_chars = part.chars().count();
            if current_chars + part_chars + self.delimiter_chars <= max_chars {
                current.push_str(part);
                current.push_str(&self.delimiter);
                current_chars += part_chars + self.delimiter_chars;
            } else {
                self.flush(&mut blocks, &current);
                current.clear();
                current.push_str(part);
                current.push_str(&self.delimiter);
                current_chars = part_chars + self.delimiter_chars;
            }
        }
        self.flush(&mut blocks, &current);
        blocks
    }

    // the buffer always ends with the delimiter, which is not part of the block
    fn flush(&self, blocks: &mut Vec<String>, buffer: &str) {
        let trimmed = buffer
            .strip_suffix(self.delimiter.as_str())
            .unwrap_or(buffer)
            .trim();
        if !trimmed.is_empty() {
            blocks.push(trimmed.to_string());
        }
    }
}

/// Greedy packing with an ad-hoc delimiter
pub fn pack(text: &str, delimiter: &str, max_chars: usize) -> Result<Vec<String>> {
    Ok(GreedyPacker::new(delimiter)?.pack(text, max_chars))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_paragraphs_are_merged() {
        let text = format!("{}\n\n{}", "a".repeat(200), "b".repeat(250));
        let blocks = GreedyPacker::paragraphs().pack(&text, 500);
        assert_eq!(blocks, vec![text.clone()]);
    }

    #[test]
    fn test_flush_when_next_part_does_not_fit() {
        let text = format!("{}\n\n{}", "a".repeat(300), "b".repeat(300));
        let blocks = GreedyPacker::paragraphs().pack(&text, 500);
        assert_eq!(blocks, vec!["a".repeat(300), "b".repeat(300)]);
    }

    #[test]
    fn test_delimiter_counts_towards_budget() {
        // 4 + 1 + 4 + 1 = 10 fits, the third part does not
        let blocks = GreedyPacker::lines().pack("aaaa\nbbbb\ncccc", 10);
        assert_eq!(blocks, vec!["aaaa\nbbbb", "cccc"]);

        // trailing delimiter is reserved even for the last part
        let blocks = GreedyPacker::lines().pack("aaaa\nbbbb", 9);
        assert_eq!(blocks, vec!["aaaa", "bbbb"]);
    }

    #[test]
    fn test_oversized_part_is_passed_through() {
        let text = format!("short\n\n{}\n\ntail", "x".repeat(40));
        let blocks = GreedyPacker::paragraphs().pack(&text, 20);
        assert_eq!(blocks, vec!["short".to_string(), "x".repeat(40), "tail".to_string()]);
    }

    #[test]
    fn test_delimiter_missing() {
        let blocks = GreedyPacker::paragraphs().pack("  single line of text  ", 5);
        assert_eq!(blocks, vec!["single line of text"]);
    }

    #[test]
    fn test_empty_parts_are_dropped() {
        let blocks = GreedyPacker::paragraphs().pack("\n\n\n\n  \n\nfirst\n\n\n\n\nsecond\n\n", 100);
        assert_eq!(blocks, vec!["first\n\nsecond"]);
        assert!(GreedyPacker::paragraphs().pack(" \n\n \t ", 100).is_empty());
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 3 hangul syllables are 9 bytes but 3 chars
        let blocks = GreedyPacker::lines().pack("가나다\n라마바", 8);
        assert_eq!(blocks, vec!["가나다\n라마바"]);
    }

    #[test]
    fn test_custom_delimiter() {
        let blocks = pack("a|b|c", "|", 4).unwrap();
        assert_eq!(blocks, vec!["a|b", "c"]);
        assert!(matches!(
            pack("abc", "", 4),
            Err(ChunkingError::Configuration(_))
        ));
    }
}
