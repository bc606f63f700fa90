//! In-memory retrievers and sinks for hook tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ragbridge_core::error::{RetrievalError, SinkError};
use ragbridge_core::event::{EventSink, FilterEvent};
use ragbridge_core::retrieval::{Reference, RetrievalResult, Retriever};

/// A result with one titled reference per name.
pub fn doc_result(names: &[&str]) -> RetrievalResult {
    RetrievalResult {
        references: names
            .iter()
            .map(|name| Reference {
                text: Some(format!("{name} body")),
                title: Some((*name).to_string()),
                score: Some(0.5),
                ..Reference::default()
            })
            .collect(),
        raw: vec![],
    }
}

/// Always returns the same result and records queries.
pub struct StaticRetriever {
    result: RetrievalResult,
    queries: Mutex<Vec<String>>,
}

impl StaticRetriever {
    pub fn new(result: RetrievalResult) -> Self {
        Self {
            result,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(RetrievalResult::default())
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    fn name(&self) -> &str {
        "static"
    }

    async fn try_retrieve(&self, query: &str) -> Result<RetrievalResult, RetrievalError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.result.clone())
    }
}

pub struct FailingRetriever;

#[async_trait]
impl Retriever for FailingRetriever {
    fn name(&self) -> &str {
        "failing"
    }

    async fn try_retrieve(&self, _query: &str) -> Result<RetrievalResult, RetrievalError> {
        Err(RetrievalError::Transport("connection refused".into()))
    }
}

/// Keeps every event it receives.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<FilterEvent>>,
}

impl RecordingSink {
    /// Source names, in emission order.
    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| match e {
                FilterEvent::Source(record) => record.source.name.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: FilterEvent) -> Result<(), SinkError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Accepts `limit` events, then rejects everything.
pub struct FailingSink {
    limit: usize,
    accepted: AtomicUsize,
}

impl FailingSink {
    pub fn after(limit: usize) -> Self {
        Self {
            limit,
            accepted: AtomicUsize::new(0),
        }
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSink for FailingSink {
    async fn emit(&self, _event: FilterEvent) -> Result<(), SinkError> {
        if self.accepted() >= self.limit {
            return Err(SinkError::Rejected("client went away".into()));
        }
        self.accepted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
