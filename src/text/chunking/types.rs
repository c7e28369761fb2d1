//! Core data structures for progressive text chunking

/// Text fragment accepted by the cascade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Fragment content (trimmed)
    pub text: String,
    /// Cascade level that accepted this fragment
    pub level: SplitLevel,
}

impl Fragment {
    pub fn new(text: impl Into<String>, level: SplitLevel) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }

    /// Length in characters (not bytes)
    pub fn char_length(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Check if this fragment exceeds the budget
    ///
    /// Only sentence-level fragments can legitimately be oversized: a single
    /// sentence is never cut.
    pub fn is_oversized(&self, max_chars: usize) -> bool {
        self.char_length() > max_chars
    }
}

/// Levels of the splitting cascade, coarse to fine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SplitLevel {
    /// Blank-line separated paragraphs (possibly several packed together)
    Paragraph,
    /// Newline separated lines of an oversized paragraph block
    Line,
    /// Sentences of an oversized line block (terminal level)
    Sentence,
}

impl SplitLevel {
    /// Check if this level is the terminal one
    pub fn is_terminal(&self) -> bool {
        matches!(self, SplitLevel::Sentence)
    }

    /// Check if fragments at this level are guaranteed to fit the budget
    pub fn guarantees_bound(&self) -> bool {
        !self.is_terminal()
    }

    /// Get a human-readable description of the level
    pub fn description(&self) -> &'static str {
        match self {
            SplitLevel::Paragraph => "Paragraph block",
            SplitLevel::Line => "Line block",
            SplitLevel::Sentence => "Sentence block",
        }
    }
}

impl std::fmt::Display for SplitLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_creation() {
        let fragment = Fragment::new("세종은 조선의 임금이다.", SplitLevel::Paragraph);

        assert_eq!(fragment.text, "세종은 조선의 임금이다.");
        assert_eq!(fragment.level, SplitLevel::Paragraph);
        // characters, not bytes
        assert_eq!(fragment.char_length(), 13);
        assert!(!fragment.is_empty());
        assert!(fragment.is_oversized(12));
        assert!(!fragment.is_oversized(13));
    }

    #[test]
    fn test_split_level_properties() {
        assert!(SplitLevel::Paragraph.guarantees_bound());
        assert!(SplitLevel::Line.guarantees_bound());
        assert!(!SplitLevel::Sentence.guarantees_bound());
        assert!(SplitLevel::Sentence.is_terminal());
        assert!(SplitLevel::Paragraph < SplitLevel::Line);
        assert!(SplitLevel::Line < SplitLevel::Sentence);
    }

    #[test]
    fn test_split_level_display() {
        assert_eq!(format!("{}", SplitLevel::Paragraph), "Paragraph block");
        assert_eq!(format!("{}", SplitLevel::Sentence), "Sentence block");
    }
}
