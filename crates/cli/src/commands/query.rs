//! `ragbridge query` — Show what the backend returns for a question.
//!
//! Unlike the hook, backend failures are reported instead of swallowed.

use std::path::Path;

use ragbridge_core::retrieval::Retriever;
use ragbridge_retrieval::{ContextComposer, HttpRetriever};

pub async fn run(config_path: &Path, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let retriever = HttpRetriever::from_config(&config.filter)?;
    let composer = ContextComposer::from_config(&config.filter)?;

    let result = retriever.try_retrieve(text).await?;
    let composed = composer.compose(&result, text);

    let output = serde_json::json!({
        "references": result.references.len(),
        "raw": result.raw.len(),
        "context": composed.context,
        "sources": composed.sources,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
