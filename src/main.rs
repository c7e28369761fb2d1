//! chunk-builder: JSONL documents in, JSONL chunk records out
//!
//! ```bash
//! chunk-builder --input data/documents.jsonl --output data/chunks.jsonl --max-chars 500
//! cat docs.jsonl | CHUNK_WORKERS=4 chunk-builder -i - -o -
//! ```

use anyhow::{Context, Result};
use chunk_builder::cli::Cli;
use chunk_builder::pipeline::{self, ChunkPipeline, PipelineConfig, RunSummary};
use chunk_builder::util::{shutdown, tracing as logging};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging_from_env().context("cannot initialize logging")?;

    let result = run(cli).await;
    match &result {
        Ok(summary) => {
            tracing::info!("{}", summary.statistics.summary());
            if summary.interrupted {
                tracing::warn!(
                    "interrupted: {} documents, {} chunks written",
                    summary.documents,
                    summary.chunks
                );
            }
        }
        Err(e) => tracing::error!("chunk-builder failed: {:?}", e),
    }
    logging::shutdown_logging();
    result.map(|_| ())
}

async fn run(cli: Cli) -> Result<RunSummary> {
    let config = cli.apply(PipelineConfig::from_env()?);
    let pipeline = ChunkPipeline::from_config(&config)
        .context("invalid configuration")?
        .with_shutdown(shutdown::spawn_ctrl_c_handler());

    tracing::info!("chunking {} -> {}", cli.input, cli.output);
    let reader = pipeline::open_input(&cli.input)
        .with_context(|| format!("cannot open input {}", cli.input))?;
    let writer = pipeline::open_output(&cli.output)
        .with_context(|| format!("cannot create output {}", cli.output))?;

    let summary = if pipeline.workers() > 1 {
        pipeline.run_parallel(reader, writer).await?
    } else {
        tokio::task::spawn_blocking(move || pipeline.run(reader, writer))
            .await
            .context("chunking task failed")??
    };
    Ok(summary)
}
