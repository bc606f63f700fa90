//! Retrieval backend wire types.
//!
//! The backend answers a [`RetrievalRequest`] with two parallel lists:
//! structured `references` and scored `raw` text chunks. They are correlated
//! by position only; nothing on the wire ties `references[i]` to `raw[i]`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// Body of the POST sent to the retrieval backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRequest {
    pub query: String,
    pub top_k: u32,
    /// Always sent, currently always empty.
    #[serde(default)]
    pub metadata_filters: serde_json::Map<String, serde_json::Value>,
}

impl RetrievalRequest {
    pub fn new(query: impl Into<String>, top_k: u32) -> Self {
        Self {
            query: query.into(),
            top_k,
            metadata_filters: serde_json::Map::new(),
        }
    }
}

/// What the backend returned. Either list may be missing or empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    #[serde(default)]
    pub references: Vec<Reference>,

    /// `"Score: 0.6172 | Text: ..."` strings
    #[serde(default)]
    pub raw: Vec<String>,
}

impl RetrievalResult {
    pub fn is_empty(&self) -> bool {
        self.references.is_empty() && self.raw.is_empty()
    }
}

/// A retrieval backend.
///
/// Implementations report failures from `try_retrieve`; callers that only
/// care about results use `retrieve`, which treats every failure as "no
/// results".
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Human-readable backend name, for logs.
    fn name(&self) -> &str;

    /// One attempt, no retry.
    async fn try_retrieve(&self, query: &str) -> Result<RetrievalResult, RetrievalError>;

    /// Like `try_retrieve`, but failures degrade to an empty result.
    async fn retrieve(&self, query: &str) -> RetrievalResult {
        match self.try_retrieve(query).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(backend = %self.name(), error = %e, "Error calling retrieval service");
                RetrievalResult::default()
            }
        }
    }
}

/// Structured metadata about one retrieved chunk.
///
/// Fields of an unexpected JSON type read as absent, so one odd reference
/// never costs the rest of the response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_name: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub score: Option<f64>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,

    #[serde(default, deserialize_with = "lenient::extras")]
    pub extras: ReferenceExtras,
}

/// Storage-specific identifiers attached to a reference.
///
/// `key`, `format`, `source`, `checksum` and `version` are passed through to
/// the UI as the backend sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceExtras {
    /// Object key in the backing store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<serde_json::Value>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub filename: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,

    /// Document format, e.g. `"pdf"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<serde_json::Value>,

    /// Storage backend the document came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<serde_json::Value>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<serde_json::Value>,

    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl ReferenceExtras {
    /// `key`, when the backend sent it as a string.
    pub fn key_str(&self) -> Option<&str> {
        self.key.as_ref().and_then(serde_json::Value::as_str)
    }

    /// `format`, when the backend sent it as a string.
    pub fn format_str(&self) -> Option<&str> {
        self.format.as_ref().and_then(serde_json::Value::as_str)
    }
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::ReferenceExtras;

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(Value::deserialize(d)?.as_f64())
    }

    pub fn extras<'de, D: Deserializer<'de>>(d: D) -> Result<ReferenceExtras, D::Error> {
        match Value::deserialize(d)? {
            v @ Value::Object(_) => Ok(serde_json::from_value(v).unwrap_or_default()),
            _ => Ok(ReferenceExtras::default()),
        }
    }
}

/// Score and body extracted from one raw chunk string.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedChunk {
    pub score: f64,
    pub text: String,
}

/// Attribution record surfaced to the host UI. Never sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub source: SourceInfo,
    /// Excerpts of the retrieved text (one per record)
    pub document: Vec<String>,
    pub metadata: Vec<SourceMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub name: String,

    /// Absent (not `null`) when no URL is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Per-excerpt metadata. Missing values serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub source: String,
    pub file: Option<String>,
    pub relevance_score: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub storage: Option<serde_json::Value>,
    pub key: Option<serde_json::Value>,
    pub checksum: Option<serde_json::Value>,
    pub version: Option<serde_json::Value>,
    pub format: Option<serde_json::Value>,
}
