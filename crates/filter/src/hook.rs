//! Inlet / outlet hooks.
//!
//! Inlet state machine (linear, first match wins):
//!
//! ```text
//! disabled            → Disabled
//! no endpoint URL     → NotConfigured
//! no messages         → NoMessages
//! no user message     → NoUserMessage
//! blank query         → EmptyQuery
//! otherwise           → retrieve → compose → inject → emit
//! ```

use std::sync::Arc;

use ragbridge_config::FilterConfig;
use ragbridge_core::error::Result;
use ragbridge_core::event::{EventSink, FilterEvent};
use ragbridge_core::message::{ChatMessage, ChatRequest, UserInfo};
use ragbridge_core::retrieval::Retriever;
use ragbridge_retrieval::{ContextComposer, HttpRetriever};
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// What the inlet did with a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InletOutcome {
    /// Filter switched off
    Disabled,
    /// No retrieval endpoint
    NotConfigured,
    NoMessages,
    NoUserMessage,
    /// Latest user message has no text
    EmptyQuery,
    /// Retrieval returned nothing usable (or failed)
    NoContext,
    /// Retrieval ran but `inject_context` is off
    InjectionDisabled,
    /// Context inserted and all sources emitted
    Injected { sources: usize },
    /// Context inserted, but the sink failed after `emitted` events
    EmitFailed { emitted: usize, reason: String },
}

impl InletOutcome {
    /// Whether the body was changed.
    pub fn modified(&self) -> bool {
        matches!(
            self,
            InletOutcome::Injected { .. } | InletOutcome::EmitFailed { .. }
        )
    }
}

/// The context-injecting chat filter.
pub struct ContextFilter {
    config: FilterConfig,
    retriever: Option<Arc<dyn Retriever>>,
    composer: ContextComposer,
}

impl ContextFilter {
    /// Create a filter around an existing retriever.
    pub fn new(config: FilterConfig, retriever: Arc<dyn Retriever>) -> Result<Self> {
        let composer = ContextComposer::from_config(&config)?;
        Ok(Self {
            config,
            retriever: Some(retriever),
            composer,
        })
    }

    /// Create a filter that talks to the configured HTTP endpoint.
    ///
    /// An empty endpoint is allowed; the inlet then reports `NotConfigured`.
    pub fn from_config(config: FilterConfig) -> Result<Self> {
        let composer = ContextComposer::from_config(&config)?;
        let retriever: Option<Arc<dyn Retriever>> = if config.is_configured() {
            Some(Arc::new(HttpRetriever::from_config(&config)?))
        } else {
            None
        };
        Ok(Self {
            config,
            retriever,
            composer,
        })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Ordering among the host's filters.
    pub fn priority(&self) -> i32 {
        self.config.priority
    }

    /// Whether the host should run this filter for `pipeline_id`.
    pub fn applies_to(&self, pipeline_id: &str) -> bool {
        self.config.applies_to(pipeline_id)
    }

    pub async fn on_startup(&self) {
        info!("Filter loaded");
        info!(enabled = self.config.enabled, "Enabled: {}", self.config.enabled);
        info!(url = %self.config.rag_service_url, "URL: {}", self.config.rag_service_url);
    }

    pub async fn on_shutdown(&self) {
        info!("Filter unloaded");
    }

    /// Run the inlet and return only the body.
    pub async fn inlet(
        &self,
        body: ChatRequest,
        user: Option<&UserInfo>,
        sink: Option<&dyn EventSink>,
    ) -> ChatRequest {
        self.inlet_with_outcome(body, user, sink).await.0
    }

    /// Run the inlet and report what happened.
    pub async fn inlet_with_outcome(
        &self,
        mut body: ChatRequest,
        user: Option<&UserInfo>,
        sink: Option<&dyn EventSink>,
    ) -> (ChatRequest, InletOutcome) {
        let user_id = user.and_then(|u| u.id.as_deref()).unwrap_or("anonymous");
        info!(user = user_id, "Inlet filter triggered");

        if !self.config.enabled {
            info!("Filter is disabled, skipping");
            return (body, InletOutcome::Disabled);
        }

        let retriever = match &self.retriever {
            Some(r) if self.config.is_configured() => r.clone(),
            _ => {
                warn!("Retrieval service URL not configured, skipping");
                return (body, InletOutcome::NotConfigured);
            }
        };

        if body.messages.is_empty() {
            return (body, InletOutcome::NoMessages);
        }

        let Some(user_index) = body.last_user_index() else {
            return (body, InletOutcome::NoUserMessage);
        };

        let query = body.messages[user_index].text();
        if query.trim().is_empty() {
            return (body, InletOutcome::EmptyQuery);
        }

        let result = retriever.retrieve(&query).await;

        if !self.config.inject_context {
            debug!("Context injection disabled, leaving body unchanged");
            return (body, InletOutcome::InjectionDisabled);
        }

        let composed = self.composer.compose(&result, &query);
        if composed.is_empty() {
            debug!("No context retrieved");
            return (body, InletOutcome::NoContext);
        }

        info!(index = user_index, "Injecting context into messages");
        body.messages
            .insert(user_index, ChatMessage::system(composed.context));

        let sources = composed.sources.len();
        let Some(sink) = sink else {
            return (body, InletOutcome::Injected { sources });
        };

        for (emitted, record) in composed.sources.into_iter().enumerate() {
            if let Err(e) = sink.emit(FilterEvent::Source(record)).await {
                error!(error = %e, emitted, "inlet error: emitting source failed");
                return (
                    body,
                    InletOutcome::EmitFailed {
                        emitted,
                        reason: e.to_string(),
                    },
                );
            }
        }

        (body, InletOutcome::Injected { sources })
    }

    /// Post-call hook. Returns the response untouched.
    pub async fn outlet<B: Send>(
        &self,
        body: B,
        _user: Option<&UserInfo>,
        _sink: Option<&dyn EventSink>,
    ) -> B {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use ragbridge_core::message::Role;
    use serde_json::json;

    fn config() -> FilterConfig {
        FilterConfig {
            rag_service_url: "http://rag.test/query".into(),
            context_template: "CTX {context} Q {query}".into(),
            ..FilterConfig::default()
        }
    }

    fn filter_with(config: FilterConfig, retriever: Arc<StaticRetriever>) -> ContextFilter {
        ContextFilter::new(config, retriever).unwrap()
    }

    fn conversation() -> ChatRequest {
        ChatRequest::new(vec![
            ChatMessage::system("You are helpful."),
            ChatMessage::user("earlier question"),
            ChatMessage::assistant("earlier answer"),
            ChatMessage::user("What is A?"),
        ])
    }

    #[tokio::test]
    async fn injects_before_last_user_message_and_emits() {
        let retriever = Arc::new(StaticRetriever::new(doc_result(&["Doc1", "Doc2"])));
        let filter = filter_with(config(), retriever.clone());
        let sink = RecordingSink::default();

        let (body, outcome) = filter
            .inlet_with_outcome(conversation(), None, Some(&sink))
            .await;

        assert_eq!(outcome, InletOutcome::Injected { sources: 2 });
        assert_eq!(body.messages.len(), 5);
        assert_eq!(body.messages[3].role, Role::System);
        assert!(body.messages[3].text().starts_with("CTX [Source: Doc1]"));
        assert!(body.messages[3].text().ends_with("Q What is A?"));
        assert_eq!(body.messages[4].text(), "What is A?");
        assert_eq!(body.messages[1].text(), "earlier question");

        assert_eq!(retriever.queries(), vec!["What is A?".to_string()]);
        assert_eq!(sink.names(), vec!["Doc1", "Doc2"]);
    }

    #[tokio::test]
    async fn events_arrive_in_index_order() {
        let retriever = Arc::new(StaticRetriever::new(doc_result(&["zeta", "alpha", "mid"])));
        let filter = filter_with(config(), retriever);
        let sink = RecordingSink::default();

        filter.inlet(conversation(), None, Some(&sink)).await;
        assert_eq!(sink.names(), vec!["zeta", "alpha", "mid"]);
    }

    #[tokio::test]
    async fn disabled_is_pass_through() {
        let retriever = Arc::new(StaticRetriever::new(doc_result(&["Doc1"])));
        let filter = filter_with(
            FilterConfig {
                enabled: false,
                ..config()
            },
            retriever.clone(),
        );

        let (body, outcome) = filter.inlet_with_outcome(conversation(), None, None).await;
        assert_eq!(outcome, InletOutcome::Disabled);
        assert_eq!(body, conversation());
        assert!(retriever.queries().is_empty());
    }

    #[tokio::test]
    async fn augmented_body_passes_through_twice_when_disabled() {
        let retriever = Arc::new(StaticRetriever::new(doc_result(&["Doc1"])));
        let augmented = filter_with(config(), retriever.clone())
            .inlet(conversation(), None, None)
            .await;

        let disabled = filter_with(
            FilterConfig {
                enabled: false,
                ..config()
            },
            retriever,
        );
        let once = disabled.inlet(augmented.clone(), None, None).await;
        let twice = disabled.inlet(once.clone(), None, None).await;
        assert_eq!(once, augmented);
        assert_eq!(twice, augmented);
    }

    #[tokio::test]
    async fn missing_url_is_not_configured() {
        let retriever = Arc::new(StaticRetriever::new(doc_result(&["Doc1"])));
        let filter = filter_with(
            FilterConfig {
                rag_service_url: "   ".into(),
                ..config()
            },
            retriever.clone(),
        );
        let (_, outcome) = filter.inlet_with_outcome(conversation(), None, None).await;
        assert_eq!(outcome, InletOutcome::NotConfigured);
        assert!(retriever.queries().is_empty());
    }

    #[tokio::test]
    async fn from_config_without_url_is_not_configured() {
        let filter = ContextFilter::from_config(FilterConfig::default()).unwrap();
        let (body, outcome) = filter.inlet_with_outcome(conversation(), None, None).await;
        assert_eq!(outcome, InletOutcome::NotConfigured);
        assert_eq!(body, conversation());
    }

    #[tokio::test]
    async fn message_guards() {
        let retriever = Arc::new(StaticRetriever::new(doc_result(&["Doc1"])));
        let filter = filter_with(config(), retriever.clone());

        let (_, outcome) = filter
            .inlet_with_outcome(ChatRequest::default(), None, None)
            .await;
        assert_eq!(outcome, InletOutcome::NoMessages);

        let only_assistant = ChatRequest::new(vec![ChatMessage::assistant("hello")]);
        let (_, outcome) = filter.inlet_with_outcome(only_assistant, None, None).await;
        assert_eq!(outcome, InletOutcome::NoUserMessage);

        let blank = ChatRequest::new(vec![
            ChatMessage::user("real question"),
            ChatMessage::user("  \n\t "),
        ]);
        let (body, outcome) = filter.inlet_with_outcome(blank.clone(), None, None).await;
        assert_eq!(outcome, InletOutcome::EmptyQuery);
        assert_eq!(body, blank);

        assert!(retriever.queries().is_empty());
    }

    #[tokio::test]
    async fn empty_retrieval_leaves_body_unchanged() {
        let retriever = Arc::new(StaticRetriever::empty());
        let filter = filter_with(config(), retriever);
        let sink = RecordingSink::default();

        let (body, outcome) = filter
            .inlet_with_outcome(conversation(), None, Some(&sink))
            .await;
        assert_eq!(outcome, InletOutcome::NoContext);
        assert_eq!(body, conversation());
        assert!(sink.names().is_empty());
    }

    #[tokio::test]
    async fn failing_retrieval_leaves_body_unchanged() {
        let filter = ContextFilter::new(config(), Arc::new(FailingRetriever)).unwrap();
        let (body, outcome) = filter.inlet_with_outcome(conversation(), None, None).await;
        assert_eq!(outcome, InletOutcome::NoContext);
        assert_eq!(body, conversation());
    }

    #[tokio::test]
    async fn injection_disabled_still_queries_but_does_not_touch_body() {
        let retriever = Arc::new(StaticRetriever::new(doc_result(&["Doc1"])));
        let filter = filter_with(
            FilterConfig {
                inject_context: false,
                ..config()
            },
            retriever.clone(),
        );
        let sink = RecordingSink::default();

        let (body, outcome) = filter
            .inlet_with_outcome(conversation(), None, Some(&sink))
            .await;
        assert_eq!(outcome, InletOutcome::InjectionDisabled);
        assert_eq!(body, conversation());
        assert_eq!(retriever.queries().len(), 1);
        assert!(sink.names().is_empty());
    }

    #[tokio::test]
    async fn sink_failure_keeps_injected_body() {
        let retriever = Arc::new(StaticRetriever::new(doc_result(&["a", "b", "c"])));
        let filter = filter_with(config(), retriever);
        let sink = FailingSink::after(1);

        let (body, outcome) = filter
            .inlet_with_outcome(conversation(), None, Some(&sink))
            .await;
        assert!(matches!(outcome, InletOutcome::EmitFailed { emitted: 1, .. }));
        assert!(outcome.modified());
        assert_eq!(body.messages.len(), 5);
        assert_eq!(sink.accepted(), 1);
    }

    #[tokio::test]
    async fn no_sink_is_fine() {
        let retriever = Arc::new(StaticRetriever::new(doc_result(&["Doc1"])));
        let filter = filter_with(config(), retriever);
        let (body, outcome) = filter.inlet_with_outcome(conversation(), None, None).await;
        assert_eq!(outcome, InletOutcome::Injected { sources: 1 });
        assert_eq!(body.messages.len(), 5);
    }

    #[tokio::test]
    async fn host_fields_survive_injection() {
        let retriever = Arc::new(StaticRetriever::new(doc_result(&["Doc1"])));
        let filter = filter_with(config(), retriever);
        let body: ChatRequest = serde_json::from_value(json!({
            "model": "llama3",
            "chat_id": "c-1",
            "messages": [{"role": "user", "content": "What is A?", "id": "m-9"}]
        }))
        .unwrap();

        let out = filter.inlet(body, None, None).await;
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["model"], "llama3");
        assert_eq!(v["chat_id"], "c-1");
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["id"], "m-9");
    }

    #[tokio::test]
    async fn multimodal_query_uses_text_parts() {
        let retriever = Arc::new(StaticRetriever::new(doc_result(&["Doc1"])));
        let filter = filter_with(config(), retriever.clone());
        let body: ChatRequest = serde_json::from_value(json!({
            "messages": [{"role": "user", "content": [
                {"type": "text", "text": "describe"},
                {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
            ]}]
        }))
        .unwrap();

        let (_, outcome) = filter.inlet_with_outcome(body, None, None).await;
        assert_eq!(outcome, InletOutcome::Injected { sources: 1 });
        assert_eq!(retriever.queries(), vec!["describe".to_string()]);
    }

    #[tokio::test]
    async fn outlet_is_identity() {
        let filter = filter_with(config(), Arc::new(StaticRetriever::empty()));
        let response = json!({"choices": [{"message": {"content": "hi"}}]});
        let out = filter.outlet(response.clone(), None, None).await;
        assert_eq!(out, response);
    }

    #[test]
    fn invalid_template_fails_construction() {
        let result = ContextFilter::new(
            FilterConfig {
                context_template: "{context} {missing}".into(),
                ..config()
            },
            Arc::new(StaticRetriever::empty()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn pipelines_and_priority() {
        let filter = filter_with(
            FilterConfig {
                pipelines: vec!["llama3".into()],
                priority: 7,
                ..config()
            },
            Arc::new(StaticRetriever::empty()),
        );
        assert!(filter.applies_to("llama3"));
        assert!(!filter.applies_to("mistral"));
        assert_eq!(filter.priority(), 7);
    }

    #[test]
    fn outcome_serializes_with_state_tag() {
        let v = serde_json::to_value(InletOutcome::Injected { sources: 2 }).unwrap();
        assert_eq!(v, json!({"state": "injected", "sources": 2}));
        assert!(!InletOutcome::NoContext.modified());
    }
}
