//! Error types for document chunking

/// Error types for chunking runs
#[derive(thiserror::Error, Debug)]
pub enum ChunkingError {
    #[error("Input decode failed at line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Input read failed at line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing required field '{field}' at line {line}")]
    MissingField { line: usize, field: &'static str },

    #[error("Invalid field '{field}' at line {line}: expected {expected}")]
    InvalidField {
        line: usize,
        field: &'static str,
        expected: &'static str,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Id generation failed: {0}")]
    IdGeneration(String),

    #[error("Worker failed: {0}")]
    Worker(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for chunking operations
pub type Result<T> = std::result::Result<T, ChunkingError>;

impl ChunkingError {
    /// Create a decode error for an input line
    pub fn decode(line: usize, source: serde_json::Error) -> Self {
        Self::Decode { line, source }
    }

    /// Reading the line itself failed (e.g. invalid UTF-8)
    pub fn read(line: usize, source: std::io::Error) -> Self {
        Self::Read { line, source }
    }

    pub fn missing_field(line: usize, field: &'static str) -> Self {
        Self::MissingField { line, field }
    }

    pub fn invalid_field(line: usize, field: &'static str, expected: &'static str) -> Self {
        Self::InvalidField {
            line,
            field,
            expected,
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an id generation error
    pub fn id_generation<S: Into<String>>(msg: S) -> Self {
        Self::IdGeneration(msg.into())
    }

    pub fn worker<S: Into<String>>(msg: S) -> Self {
        Self::Worker(msg.into())
    }

    /// Input line the error refers to, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Decode { line, .. }
            | Self::Read { line, .. }
            | Self::MissingField { line, .. }
            | Self::InvalidField { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Whether the error concerns the input data itself (as opposed to the environment)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. }
                | Self::Read { .. }
                | Self::MissingField { .. }
                | Self::InvalidField { .. }
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode",
            Self::Read { .. } => "read",
            Self::MissingField { .. } => "missing_field",
            Self::InvalidField { .. } => "invalid_field",
            Self::Configuration(_) => "configuration",
            Self::IdGeneration(_) => "id_generation",
            Self::Worker(_) => "worker",
            Self::Io(_) => "io",
            Self::Serialize(_) => "serialize",
        }
    }
}
