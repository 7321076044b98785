//! Events and handlers for observing the [`Harness`](super::harness::Harness).
//!
//! The harness reports its progress through [`HarnessEvent`] values. Callers
//! implement [`EventHandler`] to react to them (logging, printing an agent
//! trace in a REPL, metrics in tests).
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | Tests or fire-and-forget runs |
//! | [`LoggingHandler`] | Structured logging via `tracing` |
//! | [`FnEventHandler`] | Quick closures for simple callbacks |
//! | [`CompositeEventHandler`] | Compose multiple handlers in order |

use tracing::{debug, info, warn};

use crate::error::AdapterError;
use crate::tools::core::ToolArgs;
use crate::tools::result::ToolResult;

// ── Events ─────────────────────────────────────────────────────────

/// Events emitted by the harness during a run.
#[derive(Debug)]
pub enum HarnessEvent<'a> {
    /// A run for one utterance is starting.
    RunStart { trace_id: &'a str, utterance: &'a str },
    /// A new round is starting (1-based).
    RoundStart { round: u32, max_rounds: u32 },
    /// A model call failed and will be retried with a clarified prompt.
    ModelRetry {
        round: u32,
        attempt: u32,
        max_retries: u32,
        error: &'a AdapterError,
    },
    /// The model produced text alongside tool calls.
    Text(&'a str),
    /// The model is requesting tool calls this round.
    ToolCallsReceived { round: u32, count: usize },
    /// A single tool is about to be executed.
    ToolExecuting { name: &'a str, arguments: &'a ToolArgs },
    /// A single tool finished executing.
    ToolResult {
        name: &'a str,
        call_id: &'a str,
        result: &'a ToolResult,
    },
    /// The model produced a final answer.
    Finished { answer: &'a str },
    /// The round limit was hit with tool calls still pending.
    RoundLimitReached { max_rounds: u32 },
    /// Model calls kept failing after all retries.
    AdapterExhausted { error: &'a AdapterError },
    /// The stop signal ended the run.
    Cancelled,
}

// ── Handler trait ──────────────────────────────────────────────────

/// Observer of harness events.
///
/// The default implementation ignores every event.
///
/// ```ignore
/// struct PrintTools;
///
/// impl EventHandler for PrintTools {
///     fn on_event(&self, event: &HarnessEvent<'_>) {
///         if let HarnessEvent::ToolExecuting { name, .. } = event {
///             println!("-> {name}");
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    fn on_event(&self, _event: &HarnessEvent<'_>) {}
}

/// Ignores all events.
pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// An event handler backed by a closure.
///
/// ```ignore
/// let handler = FnEventHandler::new(|event| {
///     if let HarnessEvent::Text(text) = event {
///         println!("{text}");
///     }
/// });
/// ```
pub struct FnEventHandler<F>(F)
where
    F: Fn(&HarnessEvent<'_>) + Send + Sync;

impl<F> FnEventHandler<F>
where
    F: Fn(&HarnessEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for FnEventHandler<F>
where
    F: Fn(&HarnessEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &HarnessEvent<'_>) {
        (self.0)(event)
    }
}

/// An event handler that delegates to multiple inner handlers in order.
///
/// ```ignore
/// let handler = CompositeEventHandler::new()
///     .with(LoggingHandler)
///     .with_if(verbose, FnEventHandler::new(print_step));
/// ```
pub struct CompositeEventHandler {
    handlers: Vec<Box<dyn EventHandler>>,
}

impl CompositeEventHandler {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Add a handler to the chain. Handlers are called in registration order.
    pub fn with(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Conditionally add a handler to the chain.
    pub fn with_if(self, condition: bool, handler: impl EventHandler + 'static) -> Self {
        if condition { self.with(handler) } else { self }
    }

}

impl Default for CompositeEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for CompositeEventHandler {
    fn on_event(&self, event: &HarnessEvent<'_>) {
        for handler in &self.handlers {
            handler.on_event(event);
        }
    }
}

/// Logs every event through `tracing`.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &HarnessEvent<'_>) {
        match event {
            HarnessEvent::RunStart { trace_id, utterance } => {
                let preview: String = utterance.chars().take(80).collect();
                info!("[{trace_id}] utterance: {preview}");
            }
            HarnessEvent::RoundStart { round, max_rounds } => {
                info!("[round {round}/{max_rounds}]");
            }
            HarnessEvent::ModelRetry {
                round,
                attempt,
                max_retries,
                error,
            } => {
                warn!("Model call failed in round {round}: {error}. Retrying ({attempt}/{max_retries})...");
            }
            HarnessEvent::Text(text) => {
                let preview: String = text.chars().take(200).collect();
                debug!(
                    "LLM text: {preview}{}",
                    if text.chars().count() > 200 { "..." } else { "" }
                );
            }
            HarnessEvent::ToolCallsReceived { round, count } => {
                debug!("{count} tool call(s) in round {round}");
            }
            HarnessEvent::ToolExecuting { name, .. } => {
                debug!("Executing tool: {name}");
            }
            HarnessEvent::ToolResult { name, result, .. } => {
                if result.success {
                    debug!("Tool {name} succeeded");
                } else {
                    info!(
                        "Tool {name} failed ({:?}): {}",
                        result.error,
                        result.message.as_deref().unwrap_or("")
                    );
                }
            }
            HarnessEvent::Finished { answer } => {
                info!("Agent finished ({} chars)", answer.chars().count());
            }
            HarnessEvent::RoundLimitReached { max_rounds } => {
                info!("Agent hit round limit ({max_rounds})");
            }
            HarnessEvent::AdapterExhausted { error } => {
                warn!("Giving up after repeated model failures: {error}");
            }
            HarnessEvent::Cancelled => {
                info!("Stop signal received, ending agent loop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn composite_calls_every_handler_in_order() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let a = seen.clone();
        let b = seen.clone();
        let handler = CompositeEventHandler::new()
            .with(FnEventHandler::new(move |_| a.lock().unwrap().push("a")))
            .with_if(false, FnEventHandler::new(|_| panic!("skipped handler called")))
            .with(FnEventHandler::new(move |_| b.lock().unwrap().push("b")));

        handler.on_event(&HarnessEvent::Cancelled);
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn fn_handler_sees_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let handler = FnEventHandler::new(move |event| {
            if let HarnessEvent::RoundStart { .. } = event {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });
        handler.on_event(&HarnessEvent::RoundStart {
            round: 1,
            max_rounds: 3,
        });
        handler.on_event(&HarnessEvent::Finished { answer: "ok" });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn logging_handler_accepts_all_events() {
        let err = AdapterError::EmptyResponse;
        let result = ToolResult::not_found("missing");
        let args = ToolArgs::new();
        let handler = LoggingHandler;
        handler.on_event(&HarnessEvent::RunStart {
            trace_id: "tr-test",
            utterance: "merhaba",
        });
        handler.on_event(&HarnessEvent::ModelRetry {
            round: 1,
            attempt: 1,
            max_retries: 2,
            error: &err,
        });
        handler.on_event(&HarnessEvent::ToolExecuting {
            name: "get_order_status",
            arguments: &args,
        });
        handler.on_event(&HarnessEvent::ToolResult {
            name: "get_order_status",
            call_id: "c1",
            result: &result,
        });
        handler.on_event(&HarnessEvent::AdapterExhausted { error: &err });
    }
}
