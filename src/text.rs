pub mod chunking;

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

// 합니다. / 했어요? / 입니까! ...
static KOREAN_SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[다요니][.?!]+\s*").unwrap());

/// Locates sentence starts in a text
///
/// Implementations return byte offsets (ascending, on char boundaries) where a
/// new sentence begins. Offsets `0` and `text.len()` are implicit.
pub trait SentenceBoundaryDetector: Send + Sync {
    fn boundaries(&self, text: &str) -> Vec<usize>;

    fn name(&self) -> &'static str;
}

/// Pattern based detector for Korean prose
///
/// A sentence ends after one of the sentence-final syllables (다, 요, 니)
/// directly followed by terminal punctuation. The punctuation run and any
/// following whitespace stay with the sentence they close.
#[derive(Debug, Clone, Copy, Default)]
pub struct KoreanSentenceDetector;

impl SentenceBoundaryDetector for KoreanSentenceDetector {
    fn boundaries(&self, text: &str) -> Vec<usize> {
        KOREAN_SENTENCE_END
            .find_iter(text)
            .map(|m| m.end())
            .filter(|end| *end < text.len())
            .collect()
    }

    fn name(&self) -> &'static str {
        "korean"
    }
}

/// Terminal level of the chunking cascade: splits on sentence boundaries and
/// packs sentences greedily, joined by a single space.
///
/// There is no finer level, so a sentence longer than the budget is emitted
/// as it is.
#[derive(Clone)]
pub struct SentenceSplitter {
    detector: Arc<dyn SentenceBoundaryDetector>,
}

impl std::fmt::Debug for SentenceSplitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceSplitter")
            .field("detector", &self.detector.name())
            .finish()
    }
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceSplitter {
    pub fn new() -> Self {
        Self::with_detector(Arc::new(KoreanSentenceDetector))
    }

    pub fn with_detector(detector: Arc<dyn SentenceBoundaryDetector>) -> Self {
        Self { detector }
    }

    pub fn detector_name(&self) -> &'static str {
        self.detector.name()
    }

    /// Trimmed, non-empty sentences in reading order
    pub fn sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut boundaries = self.detector.boundaries(text);
        boundaries.sort_unstable();
        boundaries.dedup();

        let mut sentences = Vec::new();
        let mut prev = 0;
        for boundary in boundaries {
            if boundary == 0 || boundary >= text.len() || !text.is_char_boundary(boundary) {
                continue;
            }
            sentences.push(&text[prev..boundary]);
            prev = boundary;
        }
        sentences.push(&text[prev..]);

        sentences
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn split_sentences(&self, text: &str, max_chars: usize) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        // includes the trailing separator space
        let mut current_chars = 0;

        for sentence in self.sentences(text) {
            let sentence_chars = sentence.chars().count();
            if current_chars + sentence_chars <= max_chars {
                current.push_str(sentence);
                current.push(' ');
                current_chars += sentence_chars + 1;
            } else {
                let trimmed = current.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
                current.clear();
                current.push_str(sentence);
                current.push(' ');
                current_chars = sentence_chars + 1;
            }
        }
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        chunks
    }
}
