//! Context composition: merging a retrieval result into one context block.
//!
//! The backend returns `references` and `raw` as two parallel lists. Item `i`
//! is built from `references[i]` and `raw[i]`, whichever exist:
//!
//! 1. text comes from the reference, else from the parsed raw chunk
//! 2. items without text are dropped (no placeholder, later items keep
//!    their own positions)
//! 3. each kept item adds a `[Source: name]` excerpt to the context and one
//!    [`SourceRecord`] for the UI
//!
//! Context order is the positional order of the lists, not relevance order.
//!
//! The pairing is purely positional. If a backend ever drops or reorders
//! entries in only one of the lists, text and scores get attributed to the
//! wrong reference. There is nothing on the wire to detect that, so this
//! module does not try.

use ragbridge_config::FilterConfig;
use ragbridge_core::error::ComposeError;
use ragbridge_core::retrieval::{
    Reference, ReferenceExtras, RetrievalResult, SourceInfo, SourceMetadata, SourceRecord,
};
use ragbridge_core::template::Template;
use tracing::{debug, info};

use crate::parser::parse_raw_chunk;

/// Longest excerpt stored in a [`SourceRecord`], in characters.
pub const DOCUMENT_EXCERPT_CHARS: usize = 1000;

/// Default `type` when the reference does not name a format.
const DEFAULT_SOURCE_KIND: &str = "document";

/// The composed context and the sources it was built from.
///
/// Both are empty, or both are populated from the same items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposedContext {
    /// Template-formatted context block
    pub context: String,
    pub sources: Vec<SourceRecord>,
}

impl ComposedContext {
    pub fn is_empty(&self) -> bool {
        self.context.is_empty()
    }
}

/// Builds context blocks with a fixed template.
#[derive(Debug, Clone)]
pub struct ContextComposer {
    template: Template,
}

impl ContextComposer {
    /// Create a composer. The template may only use `{context}` and `{query}`.
    pub fn new(template: &str) -> Result<Self, ComposeError> {
        Ok(Self {
            template: Template::parse(template)?,
        })
    }

    pub fn from_config(config: &FilterConfig) -> Result<Self, ComposeError> {
        Self::new(&config.context_template)
    }

    /// Merge `result` into a context block for `query`.
    pub fn compose(&self, result: &RetrievalResult, query: &str) -> ComposedContext {
        if result.is_empty() {
            return ComposedContext::default();
        }

        let missing = Reference::default();
        let count = result.references.len().max(result.raw.len());

        let mut parts = Vec::with_capacity(count);
        let mut sources = Vec::with_capacity(count);

        for index in 0..count {
            let reference = result.references.get(index).unwrap_or(&missing);
            let raw = result.raw.get(index).map(String::as_str);

            let Some(item) = ResolvedItem::resolve(index, reference, raw) else {
                debug!(index, "No text for retrieved item, skipping");
                continue;
            };

            parts.push(format!("[Source: {}]\n{}\n", item.name, item.text));
            sources.push(item.into_source_record(&reference.extras));
        }

        let context = parts.join("\n");
        if context.is_empty() {
            return ComposedContext::default();
        }

        let formatted = self.template.render(&context, query);
        info!(
            sources = sources.len(),
            length = formatted.len(),
            "Formatted context"
        );

        ComposedContext {
            context: formatted,
            sources,
        }
    }
}

/// One item that survived text resolution.
struct ResolvedItem {
    name: String,
    filename: Option<String>,
    text: String,
    score: f64,
    url: Option<String>,
}

impl ResolvedItem {
    fn resolve(index: usize, reference: &Reference, raw: Option<&str>) -> Option<Self> {
        let mut score = reference.score.unwrap_or(0.0);

        let text = match non_empty(&reference.text) {
            Some(text) => text.to_string(),
            None => match raw {
                Some(raw) => {
                    let parsed = parse_raw_chunk(raw);
                    if score == 0.0 {
                        score = parsed.score;
                    }
                    parsed.text
                }
                None => String::new(),
            },
        };

        if text.is_empty() {
            return None;
        }

        let filename = filename_from_extras(&reference.extras).map(str::to_string);

        let name = non_empty(&reference.title)
            .or_else(|| non_empty(&reference.source_name))
            .map(str::to_string)
            .or_else(|| filename.clone())
            .unwrap_or_else(|| format!("Source {}", index + 1));

        let url = non_empty(&reference.url)
            .or_else(|| non_empty(&reference.extras.url))
            .map(str::to_string);

        Some(Self {
            name,
            filename,
            text,
            score,
            url,
        })
    }

    fn into_source_record(self, extras: &ReferenceExtras) -> SourceRecord {
        let excerpt = truncate_chars(&self.text, DOCUMENT_EXCERPT_CHARS);

        SourceRecord {
            source: SourceInfo {
                name: self.name.clone(),
                url: self.url,
            },
            document: vec![excerpt],
            metadata: vec![SourceMetadata {
                source: self.name,
                file: self.filename,
                relevance_score: self.score,
                kind: non_empty_str(extras.format_str())
                    .unwrap_or(DEFAULT_SOURCE_KIND)
                    .to_string(),
                storage: extras.source.clone(),
                key: extras.key.clone(),
                checksum: extras.checksum.clone(),
                version: extras.version.clone(),
                format: extras.format.clone(),
            }],
        }
    }
}

/// `key`, then `filename`, then `name`; first non-empty wins.
pub fn filename_from_extras(extras: &ReferenceExtras) -> Option<&str> {
    non_empty_str(extras.key_str())
        .or_else(|| non_empty(&extras.filename))
        .or_else(|| non_empty(&extras.name))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    non_empty_str(value.as_deref())
}

fn non_empty_str(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
