//! The agent loop.
//!
//! [`Harness`] resolves one user utterance: it asks the model, runs whichever
//! tools the model requests, feeds the observations back and repeats until
//! the model answers in text. A run always ends in a [`LoopOutcome`]; every
//! failure path carries a natural-language reply for the user.
//!
//! ```text
//! AwaitingModel ──FinalAnswer──▶ Answer
//!      │  ▲
//!  ToolCalls│  │observations
//!      ▼  │
//! ExecutingTools
//!
//! AwaitingModel ──round limit──▶ Failure(RoundLimitExceeded)
//! AwaitingModel ──retries spent──▶ Failure(AdapterExhausted)
//! AwaitingModel ──stop signal──▶ Failure(Cancelled)
//! ```

use serde_json::Value;
use tracing::{debug, info};

use crate::agent::config::AgentConfig;
use crate::agent::events::{EventHandler, HarnessEvent};
use crate::agent::history::{ConversationHistory, Turn};
use crate::agent::outcome::{AgentStep, FailureKind, LoopOutcome, LoopRun};
use crate::agent::prompt::PromptTemplate;
use crate::api::adapter::{ModelAdapter, ModelTurn};
use crate::api::tracing::{generate_span_id, generate_trace_id};
use crate::clock::{Clock, SystemClock, format_date};
use crate::tools::core::{ToolInvocationRequest, ToolSet};
use crate::{ChatModel, ToolCall};

/// Runs the tool-calling loop for one utterance at a time.
///
/// Borrows everything it needs; construct one per utterance (it is cheap) or
/// keep one around and call [`respond`](Self::respond) repeatedly.
pub struct Harness<'a> {
    model: &'a dyn ChatModel,
    tools: &'a ToolSet,
    template: &'a PromptTemplate,
    config: &'a AgentConfig,
    clock: &'a dyn Clock,
    event_handler: &'a dyn EventHandler,
    /// Checked before each model call. If it returns `true`, the run ends
    /// with [`FailureKind::Cancelled`].
    stop_signal: Option<Box<dyn Fn() -> bool + Send + Sync + 'a>>,
}

impl<'a> Harness<'a> {
    pub fn new(
        model: &'a dyn ChatModel,
        tools: &'a ToolSet,
        template: &'a PromptTemplate,
        config: &'a AgentConfig,
    ) -> Self {
        Self {
            model,
            tools,
            template,
            config,
            clock: &SystemClock,
            event_handler: &super::events::NoopHandler,
            stop_signal: None,
        }
    }

    /// Use another clock for "today" and "tomorrow".
    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Set an event handler for observing the loop.
    pub fn with_event_handler(mut self, handler: &'a dyn EventHandler) -> Self {
        self.event_handler = handler;
        self
    }

    /// Set a stop signal, checked before every model call.
    pub fn with_stop_signal(mut self, signal: impl Fn() -> bool + Send + Sync + 'a) -> Self {
        self.stop_signal = Some(Box::new(signal));
        self
    }

    fn stopped(&self) -> bool {
        self.stop_signal.as_ref().is_some_and(|signal| signal())
    }

    /// Resolve `utterance` against a snapshot of prior turns.
    ///
    /// Does not touch any history store; see [`respond`](Self::respond).
    pub async fn run(&self, history: &[Turn], utterance: &str) -> LoopRun {
        let mut run = LoopRun {
            trace_id: generate_trace_id(),
            outcome: LoopOutcome::Answer(String::new()),
            steps: Vec::new(),
            rounds_used: 0,
            model_calls: 0,
        };
        let max_rounds = self.config.max_rounds;
        let max_retries = self.config.retry.max_retries;
        let messages = &self.config.messages;
        let tomorrow = format_date(self.clock.tomorrow());
        let adapter = ModelAdapter::new(self.model, &self.config.model);
        let mut prompt = self.template.context(utterance, self.clock.today());
        // Last text the model produced alongside tool calls.
        let mut partial_text: Option<String> = None;
        // Retries spent so far. The budget covers the whole utterance.
        let mut attempt = 0;

        info!(
            "Harness run started: trace_id={}, model={}, history={} turn(s)",
            run.trace_id,
            self.config.model.model,
            history.len()
        );
        self.event_handler.on_event(&HarnessEvent::RunStart {
            trace_id: &run.trace_id,
            utterance,
        });

        for round in 0..max_rounds {
            let round_no = round + 1;
            let span_id = generate_span_id(&run.trace_id, round_no);
            self.event_handler.on_event(&HarnessEvent::RoundStart {
                round: round_no,
                max_rounds,
            });

            // ── Model call with retries ──
            let turn = loop {
                if self.stopped() {
                    self.event_handler.on_event(&HarnessEvent::Cancelled);
                    run.outcome = LoopOutcome::Failure {
                        kind: FailureKind::Cancelled,
                        detail: messages.cancelled.clone(),
                    };
                    return self.finish(run);
                }

                run.model_calls += 1;
                match adapter.invoke(&prompt, history, self.tools).await {
                    Ok(turn) => {
                        prompt.clear_clarification();
                        break turn;
                    }
                    Err(error) if attempt < max_retries => {
                        attempt += 1;
                        self.event_handler.on_event(&HarnessEvent::ModelRetry {
                            round: round_no,
                            attempt,
                            max_retries,
                            error: &error,
                        });
                        let delay = self.config.retry.delay_for(&error, attempt - 1);
                        if !delay.is_zero() {
                            debug!("[{span_id}] backing off {}ms", delay.as_millis());
                            tokio::time::sleep(delay).await;
                        }
                        prompt.set_clarification(messages.clarification_for(&tomorrow));
                    }
                    Err(error) => {
                        self.event_handler
                            .on_event(&HarnessEvent::AdapterExhausted { error: &error });
                        run.outcome = LoopOutcome::Failure {
                            kind: FailureKind::AdapterExhausted,
                            detail: messages.for_error(&error).to_string(),
                        };
                        return self.finish(run);
                    }
                }
            };
            run.rounds_used = round_no;

            // ── Dispatch ──
            let (calls, text) = match turn {
                ModelTurn::FinalAnswer(answer) => {
                    self.event_handler
                        .on_event(&HarnessEvent::Finished { answer: &answer });
                    run.outcome = LoopOutcome::Answer(answer);
                    return self.finish(run);
                }
                ModelTurn::ToolCalls { calls, text } => (calls, text),
            };

            if let Some(t) = &text {
                self.event_handler.on_event(&HarnessEvent::Text(t));
                partial_text = Some(t.clone());
            }
            self.event_handler.on_event(&HarnessEvent::ToolCallsReceived {
                round: round_no,
                count: calls.len(),
            });
            debug!("[{span_id}] executing {} tool call(s)", calls.len());

            let mut wire_calls = Vec::with_capacity(calls.len());
            let mut observations = Vec::with_capacity(calls.len());
            for call in calls {
                self.event_handler.on_event(&HarnessEvent::ToolExecuting {
                    name: &call.tool_name,
                    arguments: &call.arguments,
                });
                let (resolved, result) = self.tools.dispatch(&call.tool_name, call.arguments).await;
                self.event_handler.on_event(&HarnessEvent::ToolResult {
                    name: &call.tool_name,
                    call_id: &call.call_id,
                    result: &result,
                });

                wire_calls.push(ToolCall::function(
                    call.call_id.clone(),
                    call.tool_name.clone(),
                    Value::Object(resolved.clone()).to_string(),
                ));
                observations.push((call.call_id.clone(), result.to_observation()));
                run.steps.push(AgentStep {
                    request: ToolInvocationRequest {
                        call_id: call.call_id,
                        tool_name: call.tool_name,
                        arguments: resolved,
                    },
                    result,
                });
            }
            prompt.push_tool_round(wire_calls, text, observations);
        }

        self.event_handler
            .on_event(&HarnessEvent::RoundLimitReached { max_rounds });
        run.outcome = LoopOutcome::Failure {
            kind: FailureKind::RoundLimitExceeded,
            detail: partial_text.unwrap_or_else(|| messages.round_limit.clone()),
        };
        self.finish(run)
    }

    /// Run the loop and record the exchange in `history`.
    ///
    /// The user turn and the reply are appended together after the run, then
    /// the history is trimmed to the configured window. A cancelled run
    /// leaves the history untouched.
    pub async fn respond(&self, history: &mut ConversationHistory, utterance: &str) -> LoopRun {
        let snapshot = history.snapshot();
        let run = self.run(&snapshot, utterance).await;
        if run.outcome.failure_kind() != Some(FailureKind::Cancelled) {
            history.record_exchange(utterance, run.outcome.text());
            history.trim(self.config.history_window);
        }
        run
    }

    fn finish(&self, run: LoopRun) -> LoopRun {
        let status = match run.outcome.failure_kind() {
            None => "answered".to_string(),
            Some(kind) => kind.to_string(),
        };
        info!(
            "Harness run finished: trace_id={}, status={status}, rounds={}/{}, model_calls={}, tool_calls={}",
            run.trace_id,
            run.rounds_used,
            self.config.max_rounds,
            run.model_calls,
            run.steps.len()
        );
        run
    }
}
