pub mod cli;
pub mod pipeline;
pub mod record;
pub mod text;
pub mod util;

pub use pipeline::{ChunkPipeline, PipelineConfig, RunSummary};
pub use record::{ChunkRecord, ChunkRecordBuilder, Document};
pub use text::chunking::{ChunkingError, Fragment, ProgressiveChunker, SplitLevel};
