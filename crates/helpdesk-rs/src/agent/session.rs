//! Per-session conversation ownership and the inbound entry point.
//!
//! [`ChatService`] is what a front end talks to. It owns the shared,
//! read-only [`ToolSet`] and one [`ConversationHistory`] per session id.
//! Each session's history sits behind an async mutex held for the whole
//! exchange, so utterances of one session are resolved strictly one after
//! another while different sessions proceed independently.
//!
//! Sessions live until [`ChatService::reset`] or
//! [`ChatService::evict_idle`] removes them. Long-running hosts serving many
//! sessions should call `evict_idle` periodically.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::ChatModel;
use crate::agent::config::AgentConfig;
use crate::agent::events::{EventHandler, NoopHandler};
use crate::agent::harness::Harness;
use crate::agent::history::{ConversationHistory, Turn};
use crate::agent::outcome::Reply;
use crate::agent::prompt::PromptTemplate;
use crate::clock::{Clock, SystemClock};
use crate::tools::core::ToolSet;

/// Shared handle to one session's history.
pub type SessionHandle = Arc<AsyncMutex<ConversationHistory>>;

struct SessionEntry {
    handle: SessionHandle,
    last_used: Instant,
}

/// Session id → history map. Sessions are created on first use.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The history of `session_id`, creating an empty one if needed.
    /// Marks the session as used now.
    pub fn session(&self, session_id: &str) -> SessionHandle {
        let mut map = self.map();
        let entry = map.entry(session_id.to_string()).or_insert_with(|| {
            debug!("New session: {session_id}");
            SessionEntry {
                handle: Arc::new(AsyncMutex::new(ConversationHistory::new())),
                last_used: Instant::now(),
            }
        });
        entry.last_used = Instant::now();
        entry.handle.clone()
    }

    /// Drop sessions unused for at least `max_idle`. Sessions with an
    /// exchange in flight are kept. Returns how many were dropped.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut map = self.map();
        let before = map.len();
        map.retain(|id, entry| {
            let keep =
                entry.last_used.elapsed() < max_idle || Arc::strong_count(&entry.handle) > 1;
            if !keep {
                debug!("Evicting idle session: {id}");
            }
            keep
        });
        before - map.len()
    }

    /// Forget a session. Returns whether it existed.
    pub fn remove(&self, session_id: &str) -> bool {
        self.map().remove(session_id).is_some()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.map().contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }
}

/// The support assistant's inbound interface.
pub struct ChatService {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolSet>,
    template: PromptTemplate,
    config: AgentConfig,
    clock: Arc<dyn Clock>,
    event_handler: Arc<dyn EventHandler>,
    sessions: SessionStore,
}

impl ChatService {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: Arc<ToolSet>,
        template: PromptTemplate,
        config: AgentConfig,
    ) -> Self {
        Self {
            model,
            tools,
            template,
            config,
            clock: Arc::new(SystemClock),
            event_handler: Arc::new(NoopHandler),
            sessions: SessionStore::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = handler;
        self
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn harness(&self) -> Harness<'_> {
        Harness::new(self.model.as_ref(), &self.tools, &self.template, &self.config)
            .with_clock(self.clock.as_ref())
            .with_event_handler(self.event_handler.as_ref())
    }

    /// Resolve one utterance in `session_id` and record the exchange.
    pub async fn handle_user_utterance(&self, session_id: &str, text: &str) -> Reply {
        let session = self.sessions.session(session_id);
        let mut history = session.lock().await;
        self.harness().respond(&mut history, text).await.into()
    }

    /// Like [`handle_user_utterance`](Self::handle_user_utterance), ending
    /// early with a cancelled reply once `stop` returns `true`.
    pub async fn handle_with_stop(
        &self,
        session_id: &str,
        text: &str,
        stop: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Reply {
        let session = self.sessions.session(session_id);
        let mut history = session.lock().await;
        self.harness()
            .with_stop_signal(stop)
            .respond(&mut history, text)
            .await
            .into()
    }

    /// Current turns of a session (empty for unknown sessions).
    pub async fn history(&self, session_id: &str) -> Vec<Turn> {
        if !self.sessions.contains(session_id) {
            return Vec::new();
        }
        self.sessions.session(session_id).lock().await.snapshot()
    }

    /// Forget a session's history.
    pub fn reset(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id)
    }

    /// Forget sessions idle for at least `max_idle`.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        self.sessions.evict_idle(max_idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::outcome::FailureKind;
    use crate::{ChatCompletion, ChatRequest, MessageRole, ModelFuture};

    /// Answers with the last user message, after a short delay.
    struct EchoModel;

    impl ChatModel for EchoModel {
        fn chat<'a>(&'a self, body: &'a ChatRequest) -> ModelFuture<'a> {
            let last_user = body
                .messages
                .iter()
                .rev()
                .find(|m| m.role == MessageRole::User)
                .and_then(|m| m.content.clone())
                .unwrap_or_default();
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(ChatCompletion::text(format!("echo: {last_user}")))
            })
        }
    }

    fn service() -> ChatService {
        ChatService::new(
            Arc::new(EchoModel),
            Arc::new(ToolSet::new()),
            PromptTemplate::new("sys"),
            AgentConfig::default(),
        )
    }

    #[test]
    fn store_creates_on_first_use() {
        let store = SessionStore::new();
        assert!(store.is_empty());
        let a = store.session("a");
        let again = store.session("a");
        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(store.len(), 1);
        assert!(store.remove("a"));
        assert!(!store.remove("a"));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let service = service();
        let reply = service.handle_user_utterance("alice", "hello").await;
        assert_eq!(reply.final_text, "echo: hello");
        assert!(reply.failure.is_none());

        service.handle_user_utterance("bob", "hi").await;
        assert_eq!(service.history("alice").await.len(), 2);
        assert_eq!(service.history("bob").await.len(), 2);
        assert!(service.history("carol").await.is_empty());

        assert!(service.reset("alice"));
        assert!(service.history("alice").await.is_empty());
    }

    #[tokio::test]
    async fn same_session_is_sequential() {
        let service = service();
        let (a, b) = tokio::join!(
            service.handle_user_utterance("s", "first"),
            service.handle_user_utterance("s", "second"),
        );
        assert_eq!(a.final_text, "echo: first");
        assert_eq!(b.final_text, "echo: second");

        // Exchanges never interleave.
        let turns = service.history("s").await;
        assert_eq!(turns.len(), 4);
        for pair in turns.chunks(2) {
            assert_eq!(pair[1].text(), format!("echo: {}", pair[0].text()));
        }
    }

    #[test]
    fn idle_sessions_are_evicted() {
        let store = SessionStore::new();
        store.session("a");
        let busy = store.session("b");
        assert_eq!(store.evict_idle(Duration::from_secs(3600)), 0);
        assert_eq!(store.evict_idle(Duration::ZERO), 1);
        assert!(!store.contains("a"));
        assert!(store.contains("b"));

        drop(busy);
        assert_eq!(store.evict_idle(Duration::ZERO), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn evicted_session_starts_over() {
        let service = service();
        service.handle_user_utterance("s", "hello").await;
        assert_eq!(service.evict_idle(Duration::ZERO), 1);
        assert!(service.history("s").await.is_empty());

        service.handle_user_utterance("s", "again").await;
        assert_eq!(service.history("s").await.len(), 2);
    }

    #[tokio::test]
    async fn stopped_exchange_is_not_recorded() {
        let service = service();
        let reply = service.handle_with_stop("s", "never mind", || true).await;
        assert_eq!(reply.failure, Some(FailureKind::Cancelled));
        assert_eq!(reply.final_text, service.config().messages.cancelled);
        assert!(service.history("s").await.is_empty());
    }
}
