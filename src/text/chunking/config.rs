//! Configuration and run statistics for progressive text chunking

use super::error::{ChunkingError, Result};
use super::types::{Fragment, SplitLevel};
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Configuration for progressive text chunking
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Soft per-chunk size bound in characters
    #[serde(default = "ChunkingConfig::default_max_chars")]
    pub max_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: Self::DEFAULT_MAX_CHARS,
        }
    }
}

impl ChunkingConfig {
    pub const DEFAULT_MAX_CHARS: usize = 500;
    pub const ENV_PREFIX: &'static str = "CHUNK_";

    fn default_max_chars() -> usize {
        Self::DEFAULT_MAX_CHARS
    }

    pub fn new(max_chars: usize) -> Result<Self> {
        let config = Self { max_chars };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 {
            return Err(ChunkingError::configuration(
                "max_chars must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Statistical information collected over a chunking run
#[derive(Debug, Clone, Default)]
pub struct ChunkingStatistics {
    /// Total processing time
    pub total_processing_time: Duration,

    /// Input statistics
    pub documents_processed: usize,
    pub empty_documents: usize,
    pub input_char_count: usize,

    /// Output chunk statistics
    pub total_chunks_created: usize,
    pub paragraph_chunks: usize,
    pub line_chunks: usize,
    pub sentence_chunks: usize,
    /// Sentence chunks longer than max_chars (a single sentence over budget)
    pub oversized_chunks: usize,
    /// Paragraph or line chunks longer than max_chars (always a bug)
    pub bound_violations: usize,
    pub max_chars_in_chunk: usize,

    /// Derived metrics
    pub avg_chars_per_chunk: f32,
    pub paragraph_preservation_rate: f32,
    pub chunks_per_second: f32,
}

impl ChunkingStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing for total processing
    pub fn start_total_timing(&self) -> Instant {
        Instant::now()
    }

    /// Finish total timing
    pub fn finish_total_timing(&mut self, start: Instant) {
        self.total_processing_time = start.elapsed();
    }

    /// Record one segmented document and its fragments
    pub fn record_document(&mut self, text: &str, fragments: &[Fragment], max_chars: usize) {
        self.documents_processed += 1;
        self.input_char_count += text.chars().count();
        if fragments.is_empty() {
            self.empty_documents += 1;
        }
        for fragment in fragments {
            self.record_fragment(fragment, max_chars);
        }
    }

    /// Record fragment creation by level
    pub fn record_fragment(&mut self, fragment: &Fragment, max_chars: usize) {
        self.total_chunks_created += 1;
        match fragment.level {
            SplitLevel::Paragraph => self.paragraph_chunks += 1,
            SplitLevel::Line => self.line_chunks += 1,
            SplitLevel::Sentence => self.sentence_chunks += 1,
        }
        let length = fragment.char_length();
        if length > max_chars {
            if fragment.level.guarantees_bound() {
                tracing::error!(
                    "{} exceeds max_chars ({} > {})",
                    fragment.level,
                    length,
                    max_chars
                );
                self.bound_violations += 1;
            } else {
                self.oversized_chunks += 1;
            }
        }
        self.max_chars_in_chunk = self.max_chars_in_chunk.max(length);
    }

    /// Calculate derived metrics (call this after all processing is complete)
    pub fn calculate_derived_metrics(&mut self) {
        if self.total_chunks_created > 0 {
            self.avg_chars_per_chunk =
                self.input_char_count as f32 / self.total_chunks_created as f32;
            self.paragraph_preservation_rate =
                self.paragraph_chunks as f32 / self.total_chunks_created as f32;
        }

        let total_seconds = self.total_processing_time.as_secs_f32();
        if total_seconds > 0.0 {
            self.chunks_per_second = self.total_chunks_created as f32 / total_seconds;
        }
    }

    /// Get summary as string for logging
    pub fn summary(&self) -> String {
        format!(
            "Chunking Stats: {} documents ({} empty), {} chars -> {} chunks ({:.1} avg chars/chunk) in {}ms | \
            paragraph/line/sentence: {}/{}/{}, oversized: {}, bound violations: {}, longest: {} chars | \
            Para preservation: {:.1}% | Speed: {:.1} chunks/s",
            self.documents_processed,
            self.empty_documents,
            self.input_char_count,
            self.total_chunks_created,
            self.avg_chars_per_chunk,
            self.total_processing_time.as_millis(),
            self.paragraph_chunks,
            self.line_chunks,
            self.sentence_chunks,
            self.oversized_chunks,
            self.bound_violations,
            self.max_chars_in_chunk,
            self.paragraph_preservation_rate * 100.0,
            self.chunks_per_second
        )
    }
}
