//! `ragbridge inlet` — Run a chat body through the inlet hook.

use std::path::{Path, PathBuf};

use ragbridge_core::event::ChannelSink;
use ragbridge_core::message::ChatRequest;
use ragbridge_filter::ContextFilter;

/// Sink capacity; a collector task drains it concurrently.
const EVENT_BUFFER: usize = 32;

pub async fn run(config_path: &Path, file: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let filter = ContextFilter::from_config(config.filter)?;
    filter.on_startup().await;

    let body: ChatRequest = serde_json::from_str(&super::read_input(file)?)?;

    let (sink, mut events) = ChannelSink::new(EVENT_BUFFER);
    let collector = tokio::spawn(async move {
        let mut collected = Vec::new();
        while let Some(event) = events.recv().await {
            collected.push(event);
        }
        collected
    });

    let (body, outcome) = filter.inlet_with_outcome(body, None, Some(&sink)).await;
    drop(sink);
    let events = collector.await?;

    filter.on_shutdown().await;

    let output = serde_json::json!({
        "outcome": outcome,
        "body": body,
        "events": events,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
