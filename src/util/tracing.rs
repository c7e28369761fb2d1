use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, WithExportConfig, WithHttpConfig, WithTonicConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::{SdkLogger, SdkLoggerProvider};
use opentelemetry_semantic_conventions::resource::{DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_VERSION};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*};

const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");
const EXPORT_TIMEOUT: Duration = Duration::from_secs(10);
static LOGGER_PROVIDER: OnceLock<SdkLoggerProvider> = OnceLock::new();

type OtlpLogLayer = OpenTelemetryTracingBridge<SdkLoggerProvider, SdkLogger>;

/// Read from `LOG_*` environment variables
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub app_name: Option<String>,
    pub level: Option<String>,
    pub file_name: Option<String>,
    pub file_dir: Option<String>,
    pub use_json: bool,
    /// log to stderr (stdout may carry the chunk stream); `LOG_USE_STDOUT` is accepted too
    #[serde(alias = "use_stdout")]
    pub use_console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: None,
            level: None,
            file_name: None,
            file_dir: None,
            use_json: false,
            use_console: true,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self> {
        envy::prefixed("LOG_")
            .from_env::<Self>()
            .context("cannot read logging config from env:")
    }

    fn level(&self) -> tracing::Level {
        self.level
            .as_deref()
            .and_then(|l| l.parse().ok())
            .unwrap_or(tracing::Level::INFO)
    }

    /// `LOG_LEVEL` as the default, refined by `directives` (`RUST_LOG` syntax)
    fn env_filter(&self, directives: &str) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.level()).into())
            .parse_lossy(directives)
    }

    fn service_name(&self) -> String {
        self.app_name
            .clone()
            .unwrap_or_else(|| SERVICE_NAME.to_string())
    }

    fn open_file(&self) -> Result<Option<File>> {
        let Some(file_name) = self.file_name.as_deref() else {
            return Ok(None);
        };
        let dir = match self.file_dir.as_deref() {
            Some(d) => PathBuf::from(d),
            None => env::current_dir()?,
        };
        std::fs::create_dir_all(&dir).context("create log file directory:")?;
        let path = dir.join(file_name);
        let file = File::create(&path).with_context(|| format!("create log file {path:?}:"))?;
        Ok(Some(file))
    }
}

pub fn init_logging(conf: &LoggingConfig) -> Result<()> {
    let subscriber = build_subscriber(conf)?;
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;
    Ok(())
}

/// Env config, or the defaults if it cannot be read
pub fn init_logging_from_env() -> Result<()> {
    let conf = LoggingConfig::from_env()
        .inspect_err(|e| eprintln!("using default logging config: {e:?}"))
        .unwrap_or_default();
    init_logging(&conf)
}

/// Flush pending OTLP log records (no-op when export is off)
pub fn shutdown_logging() {
    if let Some(provider) = LOGGER_PROVIDER.get() {
        let _ = provider
            .shutdown()
            .inspect_err(|e| eprintln!("failed to shutdown logger provider: {e:?}"));
    }
}

fn resource(service_name: String) -> Resource {
    Resource::builder()
        .with_service_name(service_name)
        .with_attribute(KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")))
        .with_attribute(KeyValue::new(
            DEPLOYMENT_ENVIRONMENT_NAME,
            env::var("DEPLOYMENT_ENVIRONMENT_NAME").unwrap_or_else(|_| "development".to_string()),
        ))
        .build()
}

// OTLP_AUTH_TOKEN: base64(public_key:secret_key)
fn authorization() -> Option<String> {
    env::var("OTLP_AUTH_TOKEN")
        .ok()
        .map(|token| format!("Basic {token}"))
}

/// OTLP log export over grpc (`OTLP_ADDR`) or http (`OTLP_HTTP_ADDR`)
fn otlp_log_layer(service_name: String) -> Result<Option<OtlpLogLayer>> {
    let exporter = match (env::var("OTLP_ADDR"), env::var("OTLP_HTTP_ADDR")) {
        (Ok(addr), _) => {
            let mut metadata = opentelemetry_otlp::tonic_types::metadata::MetadataMap::new();
            if let Some(auth) = authorization() {
                metadata.insert(
                    "authorization",
                    auth.parse().context("invalid OTLP_AUTH_TOKEN")?,
                );
            }
            LogExporter::builder()
                .with_tonic()
                .with_endpoint(addr)
                .with_timeout(EXPORT_TIMEOUT)
                .with_metadata(metadata)
                .build()?
        }
        (_, Ok(addr)) => {
            let headers: HashMap<String, String> = authorization()
                .map(|auth| ("Authorization".to_string(), auth))
                .into_iter()
                .collect();
            LogExporter::builder()
                .with_http()
                .with_endpoint(addr)
                .with_timeout(EXPORT_TIMEOUT)
                .with_headers(headers)
                .build()?
        }
        _ => return Ok(None),
    };

    let provider = SdkLoggerProvider::builder()
        .with_resource(resource(service_name))
        .with_batch_exporter(exporter)
        .build();
    let layer = OpenTelemetryTracingBridge::new(&provider);
    LOGGER_PROVIDER.set(provider).ok();
    Ok(Some(layer))
}

/// Console (stderr), file and OTLP layers as configured
///
/// `RUST_LOG` directives apply on top of `LOG_LEVEL`.
pub fn build_subscriber(conf: &LoggingConfig) -> Result<Box<dyn Subscriber + Send + Sync>> {
    let level = conf.level();
    let otlp_filter = EnvFilter::new("info")
        .add_directive("hyper=off".parse()?)
        .add_directive("h2=off".parse()?)
        .add_directive("tonic=off".parse()?);
    let otlp = otlp_log_layer(conf.service_name())?.with_filter(otlp_filter);

    let (json_file, text_file) = match conf.open_file()? {
        Some(f) if conf.use_json => (Some(f), None),
        Some(f) => (None, Some(f)),
        None => (None, None),
    };
    let json_console = conf.use_console && conf.use_json;
    let text_console = conf.use_console && !conf.use_json;
    let directives = env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();

    let subscriber = tracing_subscriber::registry()
        .with(conf.env_filter(&directives))
        .with(otlp)
        .with(json_file.map(|f| {
            fmt::layer()
                .with_writer(f.with_max_level(level))
                .with_ansi(false)
                .json()
        }))
        .with(text_file.map(|f| {
            fmt::layer()
                .with_writer(f.with_max_level(level))
                .with_ansi(false)
        }))
        .with(json_console.then(|| fmt::layer().with_writer(std::io::stderr).json()))
        .with(text_console.then(|| fmt::layer().with_writer(std::io::stderr)));
    Ok(Box::new(subscriber))
}

// for tests: plain output captured by the test harness
pub fn tracing_init_test(level: tracing::Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_test_writer()
        .try_init();
}
