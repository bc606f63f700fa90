//! The RagBridge chat filter.
//!
//! The host calls [`ContextFilter::inlet`] before every model request and
//! [`ContextFilter::outlet`] after it. The inlet looks up the latest user
//! message, asks the retrieval backend for context, inserts that context as
//! a system message right before the user message, and reports each source
//! to the host's event sink.
//!
//! Retrieval is an enhancement, never a dependency: every failure is logged
//! and the chat body goes through, changed or not.

pub mod hook;

pub use hook::{ContextFilter, InletOutcome};

#[cfg(test)]
mod test_helpers;
