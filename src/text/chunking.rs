//! Progressive text chunking for embedding generation
//!
//! Text is packed at the coarsest natural boundary that fits the character
//! budget (paragraph, then line, then sentence).

pub mod chunker;
pub mod config;
pub mod error;
pub mod packer;
pub mod types;

// Re-export main public interfaces
pub use chunker::ProgressiveChunker;
pub use config::{ChunkingConfig, ChunkingStatistics};
pub use error::{ChunkingError, Result};
pub use packer::{GreedyPacker, pack};
pub use types::{Fragment, SplitLevel};
