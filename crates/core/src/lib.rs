//! # RagBridge Core
//!
//! Domain types, traits, and error definitions for the RagBridge context
//! filter. No HTTP stack lives here; the retrieval client, the filter hook
//! and the CLI all build against these types.

pub mod error;
pub mod event;
pub mod message;
pub mod retrieval;
pub mod template;

// Re-export key types at crate root for ergonomics
pub use error::{ComposeError, Error, Result, RetrievalError, SinkError, TemplateError};
pub use event::{ChannelSink, EventSink, FilterEvent};
pub use message::{ChatMessage, ChatRequest, MessageContent, Role, UserInfo};
pub use retrieval::{
    ParsedChunk, Reference, ReferenceExtras, RetrievalRequest, RetrievalResult, Retriever,
    SourceInfo, SourceMetadata, SourceRecord,
};
pub use template::Template;
