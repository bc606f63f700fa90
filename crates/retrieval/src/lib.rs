//! Retrieval for RagBridge: the HTTP backend client, raw chunk parsing, and
//! the context composer that turns a retrieval result into a context block
//! plus source records.

pub mod client;
pub mod composer;
pub mod parser;

pub use client::HttpRetriever;
pub use composer::{ComposedContext, ContextComposer, DOCUMENT_EXCERPT_CHARS};
pub use parser::{ChunkParseError, parse_raw_chunk, try_parse_raw_chunk};
