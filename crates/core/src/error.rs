//! Error types for the RagBridge domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. None of these ever reach
//! the end user: the filter recovers from all of them and hands the chat body
//! back to the host.

use thiserror::Error;

/// The top-level error type for all RagBridge operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Retrieval backend ---
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- Context assembly ---
    #[error("Compose error: {0}")]
    Compose(#[from] ComposeError),

    // --- Host event channel ---
    #[error("Event sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to the retrieval backend.
#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Retrieval service not configured")]
    NotConfigured,

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Retrieval service returned status {status_code}: {body}")]
    Status { status_code: u16, body: String },

    #[error("Malformed retrieval response: {0}")]
    Decode(String),
}

/// Failures rendering the context template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Unknown placeholder {{{0}}} (only {{context}} and {{query}} are supported)")]
    UnknownPlaceholder(String),

    #[error("Unbalanced brace at byte {position}")]
    UnbalancedBrace { position: usize },

    #[error("Template is missing the {{{0}}} placeholder")]
    MissingPlaceholder(&'static str),
}

/// Failures while turning a retrieval result into a context block.
#[derive(Debug, Clone, Error)]
pub enum ComposeError {
    #[error("Template rendering failed: {0}")]
    Template(#[from] TemplateError),
}

/// Failures delivering an event to the host.
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    #[error("Event channel closed")]
    Closed,

    #[error("Event rejected by host: {0}")]
    Rejected(String),
}
