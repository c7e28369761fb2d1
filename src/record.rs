//! Document and chunk records exchanged as JSON lines

use crate::text::chunking::{ChunkingError, Fragment, Result};
use crate::util::id_generator::IdGenerator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Input document, one per JSONL line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub url: String,
    pub text: String,
    pub source_type: String,
}

impl Document {
    pub const REQUIRED_FIELDS: [&'static str; 4] = ["title", "url", "text", "source_type"];

    /// Decode one input line (`line_no` is 1-based and only used for errors)
    ///
    /// Every required field must be present and a string.
    pub fn from_json_line(line: &str, line_no: usize) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(line).map_err(|e| ChunkingError::decode(line_no, e))?;
        let object = value
            .as_object()
            .ok_or_else(|| ChunkingError::invalid_field(line_no, "<root>", "JSON object"))?;

        for field in Self::REQUIRED_FIELDS {
            match object.get(field) {
                None => return Err(ChunkingError::missing_field(line_no, field)),
                Some(serde_json::Value::String(_)) => {}
                Some(_) => return Err(ChunkingError::invalid_field(line_no, field, "string")),
            }
        }
        // unknown fields are ignored
        serde_json::from_value(value).map_err(|e| ChunkingError::decode(line_no, e))
    }
}

/// Output chunk; serialized in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub chunk_text: String,
    pub chunk_index: usize,
    pub title: String,
    pub url: String,
    pub source_type: String,
}

impl ChunkRecord {
    /// One JSON line without the trailing newline (non-ASCII kept as is)
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Turns a document's ordered fragments into chunk records
#[derive(Clone)]
pub struct ChunkRecordBuilder {
    id_generator: Arc<dyn IdGenerator>,
}

impl std::fmt::Debug for ChunkRecordBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkRecordBuilder")
            .field("id_generator", &self.id_generator.name())
            .finish()
    }
}

impl ChunkRecordBuilder {
    pub fn new(id_generator: Arc<dyn IdGenerator>) -> Self {
        Self { id_generator }
    }

    /// `chunk_index` is the fragment position; metadata is copied from the document
    pub fn build(&self, document: &Document, fragments: Vec<Fragment>) -> Result<Vec<ChunkRecord>> {
        fragments
            .into_iter()
            .enumerate()
            .map(|(chunk_index, fragment)| {
                Ok(ChunkRecord {
                    id: self.id_generator.generate()?,
                    chunk_text: fragment.text,
                    chunk_index,
                    title: document.title.clone(),
                    url: document.url.clone(),
                    source_type: document.source_type.clone(),
                })
            })
            .collect()
    }
}
