//! Progressive chunker: paragraph -> line -> sentence cascade

use super::{
    config::ChunkingConfig,
    error::Result,
    packer::GreedyPacker,
    types::{Fragment, SplitLevel},
};
use crate::text::SentenceSplitter;
use tracing::{debug, warn};

/// Progressive text chunker
///
/// Prefers the coarsest natural boundary that fits the budget and only
/// descends a level for blocks that are still too large. Output order is the
/// reading order of the input (depth-first, left to right).
#[derive(Debug, Clone)]
pub struct ProgressiveChunker {
    config: ChunkingConfig,
    paragraph_packer: GreedyPacker,
    line_packer: GreedyPacker,
    sentence_splitter: SentenceSplitter,
}

impl ProgressiveChunker {
    /// Create a chunker with the reference sentence detector
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        Self::with_sentence_splitter(config, SentenceSplitter::new())
    }

    pub fn with_sentence_splitter(
        config: ChunkingConfig,
        sentence_splitter: SentenceSplitter,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            paragraph_packer: GreedyPacker::paragraphs(),
            line_packer: GreedyPacker::lines(),
            sentence_splitter,
        })
    }

    /// Segment one document text into ordered fragments
    pub fn segment(&self, text: &str) -> Vec<Fragment> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let max_chars = self.config.max_chars;
        let mut fragments = Vec::new();

        // Level 1: paragraphs
        let blocks = self.paragraph_packer.pack(text, max_chars);
        debug!("Packed {} paragraph blocks", blocks.len());

        for block in blocks {
            if block.chars().count() <= max_chars {
                fragments.push(Fragment::new(block, SplitLevel::Paragraph));
                continue;
            }

            // Level 2: lines of an oversized paragraph block
            let lines = self.line_packer.pack(&block, max_chars);
            debug!(
                "Paragraph block too large ({} chars), split into {} line blocks",
                block.chars().count(),
                lines.len()
            );
            for line in lines {
                if line.chars().count() <= max_chars {
                    fragments.push(Fragment::new(line, SplitLevel::Line));
                    continue;
                }

                // Level 3: sentences (terminal)
                for sentence_block in self.sentence_splitter.split_sentences(&line, max_chars) {
                    let fragment = Fragment::new(sentence_block, SplitLevel::Sentence);
                    if fragment.is_oversized(max_chars) {
                        warn!(
                            "Single sentence exceeds max_chars ({} > {}), kept whole: {:?}",
                            fragment.char_length(),
                            max_chars,
                            crate::util::text::preview(&fragment.text, 50)
                        );
                    }
                    fragments.push(fragment);
                }
            }
        }

        fragments.retain_mut(|fragment| {
            let trimmed = fragment.text.trim();
            if trimmed.len() != fragment.text.len() {
                fragment.text = trimmed.to_string();
            }
            !fragment.is_empty()
        });
        debug!("Segmented text into {} fragments", fragments.len());
        fragments
    }

    /// Segment and keep only the fragment texts
    pub fn segment_text(&self, text: &str) -> Vec<String> {
        self.segment(text).into_iter().map(|f| f.text).collect()
    }

    /// Get configuration reference
    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    pub fn max_chars(&self) -> usize {
        self.config.max_chars
    }

    pub fn sentence_splitter(&self) -> &SentenceSplitter {
        &self.sentence_splitter
    }
}
