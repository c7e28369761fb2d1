//! JSONL in, JSONL out: decode documents, segment them and write chunk records

use crate::record::{ChunkRecordBuilder, Document};
use crate::text::chunking::{
    ChunkingConfig, ChunkingError, ChunkingStatistics, Fragment, ProgressiveChunker, Result,
};
use crate::util::id_generator::{self, IdGenerator, IdScheme};
use crate::util::shutdown::ShutdownSignal;
use futures::StreamExt;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Path value meaning stdin (input) or stdout (output)
pub const STDIO_PATH: &str = "-";

/// Run configuration, read from `CHUNK_*` environment variables
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    #[serde(default = "PipelineConfig::default_max_chars")]
    pub max_chars: usize,
    /// number of documents segmented concurrently
    #[serde(default = "PipelineConfig::default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub id_scheme: IdScheme,
    /// snowflake only
    #[serde(default)]
    pub node_id: Option<i32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chars: ChunkingConfig::DEFAULT_MAX_CHARS,
            workers: 1,
            id_scheme: IdScheme::default(),
            node_id: None,
        }
    }
}

impl PipelineConfig {
    fn default_max_chars() -> usize {
        ChunkingConfig::DEFAULT_MAX_CHARS
    }

    fn default_workers() -> usize {
        1
    }

    pub fn from_env() -> Result<Self> {
        envy::prefixed(ChunkingConfig::ENV_PREFIX)
            .from_env::<Self>()
            .map_err(|e| {
                ChunkingError::configuration(format!("cannot read pipeline config from env: {e}"))
            })
    }

    pub fn validate(&self) -> Result<()> {
        self.chunking().validate()?;
        if self.workers == 0 {
            return Err(ChunkingError::configuration(
                "workers must be greater than 0",
            ));
        }
        Ok(())
    }

    pub fn chunking(&self) -> ChunkingConfig {
        ChunkingConfig {
            max_chars: self.max_chars,
        }
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub documents: usize,
    pub chunks: usize,
    /// stopped by a shutdown request before the input was exhausted
    pub interrupted: bool,
    pub statistics: ChunkingStatistics,
}

#[derive(Debug, Clone)]
pub struct ChunkPipeline {
    chunker: Arc<ProgressiveChunker>,
    builder: ChunkRecordBuilder,
    workers: usize,
    shutdown: ShutdownSignal,
}

impl ChunkPipeline {
    pub fn new(config: &PipelineConfig, id_generator: Arc<dyn IdGenerator>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            chunker: Arc::new(ProgressiveChunker::new(config.chunking())?),
            builder: ChunkRecordBuilder::new(id_generator),
            workers: config.workers,
            shutdown: ShutdownSignal::never(),
        })
    }

    /// Pipeline with the id generator selected by `config.id_scheme`
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let generator = id_generator::new_generator(config.id_scheme, config.node_id);
        tracing::info!(
            "chunk pipeline: max_chars={}, workers={}, id={}",
            config.max_chars,
            config.workers,
            generator.name()
        );
        Self::new(config, generator)
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn chunker(&self) -> &ProgressiveChunker {
        &self.chunker
    }

    /// Process the whole input on the current thread, one document at a time
    pub fn run<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let start = summary.statistics.start_total_timing();

        for (index, line) in reader.lines().enumerate() {
            if self.shutdown.is_shutdown() {
                tracing::warn!("shutdown requested, stop before line {}", index + 1);
                summary.interrupted = true;
                break;
            }
            let line_no = index + 1;
            let document = read_document(line, line_no).inspect_err(log_failure)?;
            let fragments = self.chunker.segment(&document.text);
            self.write_document(&document, fragments, line_no, &mut writer, &mut summary)?;
        }
        writer.flush()?;
        Ok(self.finish(summary, start))
    }

    /// Like [`ChunkPipeline::run`], but segments up to `workers` documents at
    /// once on the blocking pool. Records are still written in input order.
    ///
    /// Reading lines and writing records stay on the calling task and block
    /// it; give the reader and writer their own buffers (as [`open_input`] and
    /// [`open_output`] do). The future is `Send` when `R` and `W` are.
    pub async fn run_parallel<R: BufRead, W: Write>(
        &self,
        reader: R,
        mut writer: W,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let start = summary.statistics.start_total_timing();
        let stopped = AtomicBool::new(false);

        let tasks = reader
            .lines()
            .enumerate()
            .take_while(|(index, _)| {
                if self.shutdown.is_shutdown() {
                    tracing::warn!("shutdown requested, stop before line {}", index + 1);
                    stopped.store(true, Ordering::Relaxed);
                    return false;
                }
                true
            })
            .map(|(index, line)| {
                let chunker = self.chunker.clone();
                async move {
                    let line_no = index + 1;
                    let document = read_document(line, line_no)?;
                    let (document, fragments) = tokio::task::spawn_blocking(move || {
                        let fragments = chunker.segment(&document.text);
                        (document, fragments)
                    })
                    .await
                    .map_err(|e| {
                        ChunkingError::worker(format!("segmentation of line {line_no}: {e}"))
                    })?;
                    Ok::<_, ChunkingError>((line_no, document, fragments))
                }
            });

        let mut results = std::pin::pin!(futures::stream::iter(tasks).buffered(self.workers));
        while let Some(result) = results.next().await {
            let (line_no, document, fragments) = result.inspect_err(log_failure)?;
            self.write_document(&document, fragments, line_no, &mut writer, &mut summary)?;
        }
        writer.flush()?;
        summary.interrupted = stopped.load(Ordering::Relaxed);
        Ok(self.finish(summary, start))
    }

    // records of one document are written all at once, or not at all
    fn write_document<W: Write>(
        &self,
        document: &Document,
        fragments: Vec<Fragment>,
        line_no: usize,
        writer: &mut W,
        summary: &mut RunSummary,
    ) -> Result<()> {
        summary
            .statistics
            .record_document(&document.text, &fragments, self.chunker.max_chars());
        let records = self.builder.build(document, fragments)?;
        if records.is_empty() {
            tracing::debug!("line {}: empty document '{}'", line_no, document.title);
        }

        let mut buf = String::new();
        for record in &records {
            buf.push_str(&record.to_json_line()?);
            buf.push('\n');
        }
        writer.write_all(buf.as_bytes())?;

        summary.documents += 1;
        summary.chunks += records.len();
        tracing::debug!(
            "line {}: '{}' -> {} chunks",
            line_no,
            document.title,
            records.len()
        );
        Ok(())
    }

    fn finish(&self, mut summary: RunSummary, start: std::time::Instant) -> RunSummary {
        summary.statistics.finish_total_timing(start);
        summary.statistics.calculate_derived_metrics();
        summary
    }
}

fn read_document(line: std::io::Result<String>, line_no: usize) -> Result<Document> {
    let line = line.map_err(|e| ChunkingError::read(line_no, e))?;
    Document::from_json_line(&line, line_no)
}

fn log_failure(e: &ChunkingError) {
    match e.line() {
        Some(line) if e.is_input_error() => {
            tracing::error!("rejected input line {}: {}", line, e)
        }
        _ => tracing::error!("{} error: {}", e.category(), e),
    }
}

/// Buffered reader over a file, or stdin for `-`
pub fn open_input(path: &str) -> Result<Box<dyn BufRead + Send>> {
    if path == STDIO_PATH {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }
    Ok(Box::new(BufReader::new(File::open(path)?)))
}

/// Buffered writer to a file (parent directories created), or stdout for `-`
pub fn open_output(path: &str) -> Result<Box<dyn Write + Send>> {
    if path == STDIO_PATH {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    }
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Box::new(BufWriter::new(File::create(path)?)))
}
