//! Command line arguments for chunk-builder

use crate::pipeline::PipelineConfig;
use crate::util::id_generator::IdScheme;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "chunk-builder")]
#[command(author, version, about = "Split JSONL documents into bounded-size chunk records", long_about = None)]
pub struct Cli {
    /// Input JSONL file ("-" for stdin)
    #[arg(short, long)]
    pub input: String,

    /// Output JSONL file ("-" for stdout)
    #[arg(short, long, default_value = "data/chunks.jsonl")]
    pub output: String,

    /// Soft maximum chunk length in characters (env: CHUNK_MAX_CHARS)
    #[arg(short, long)]
    pub max_chars: Option<usize>,

    /// Documents segmented concurrently (env: CHUNK_WORKERS)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Chunk id scheme (env: CHUNK_ID_SCHEME)
    #[arg(long, value_enum)]
    pub id_scheme: Option<IdScheme>,

    /// Snowflake node id, derived from the host address when omitted (env: CHUNK_NODE_ID)
    #[arg(long)]
    pub node_id: Option<i32>,
}

impl Cli {
    /// Flags given on the command line win over `config`
    pub fn apply(&self, config: PipelineConfig) -> PipelineConfig {
        PipelineConfig {
            max_chars: self.max_chars.unwrap_or(config.max_chars),
            workers: self.workers.unwrap_or(config.workers),
            id_scheme: self.id_scheme.unwrap_or(config.id_scheme),
            node_id: self.node_id.or(config.node_id),
        }
    }
}
