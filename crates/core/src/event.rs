//! Host event channel: how source attributions reach the UI.
//!
//! The host optionally hands the filter an [`EventSink`]. Events are emitted
//! one at a time and each emission is awaited before the next one starts, so
//! the host sees them in exactly the order they were produced.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::SinkError;
use crate::retrieval::SourceRecord;

/// Events the filter sends to the host.
///
/// Serializes as `{"type": "source", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum FilterEvent {
    /// One retrieved source, for citation display
    Source(SourceRecord),
}

/// A destination for filter events, provided by the host.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: FilterEvent) -> std::result::Result<(), SinkError>;
}

/// Forwards events into a bounded `tokio::sync::mpsc` channel.
///
/// `emit` waits for channel capacity, which gives the host back-pressure.
pub struct ChannelSink {
    sender: mpsc::Sender<FilterEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver the host reads from.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<FilterEvent>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&self, event: FilterEvent) -> std::result::Result<(), SinkError> {
        self.sender.send(event).await.map_err(|_| SinkError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::SourceInfo;

    fn record(name: &str) -> SourceRecord {
        SourceRecord {
            source: SourceInfo {
                name: name.into(),
                url: None,
            },
            document: vec![],
            metadata: vec![],
        }
    }

    #[test]
    fn event_wire_shape() {
        let v = serde_json::to_value(FilterEvent::Source(record("Doc1"))).unwrap();
        assert_eq!(v["type"], "source");
        assert_eq!(v["data"]["source"]["name"], "Doc1");
    }

    #[tokio::test]
    async fn channel_sink_preserves_order() {
        let (sink, mut rx) = ChannelSink::new(8);
        for name in ["a", "b", "c"] {
            sink.emit(FilterEvent::Source(record(name))).await.unwrap();
        }
        for expected in ["a", "b", "c"] {
            let FilterEvent::Source(r) = rx.recv().await.unwrap();
            assert_eq!(r.source.name, expected);
        }
    }

    #[tokio::test]
    async fn closed_channel_is_an_error() {
        let (sink, rx) = ChannelSink::new(1);
        drop(rx);
        let err = sink.emit(FilterEvent::Source(record("x"))).await;
        assert!(matches!(err, Err(SinkError::Closed)));
    }
}
