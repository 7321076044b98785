//! What a run produced: the agent trace and how it ended.

use std::fmt;

use crate::tools::core::ToolInvocationRequest;
use crate::tools::result::ToolResult;

/// One executed tool call, with the arguments as actually run.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStep {
    pub request: ToolInvocationRequest,
    pub result: ToolResult,
}

impl AgentStep {
    pub fn tool_name(&self) -> &str {
        &self.request.tool_name
    }

    /// A resolved string argument of the call.
    pub fn argument(&self, key: &str) -> Option<&str> {
        self.request.arguments.get(key).and_then(|v| v.as_str())
    }
}

/// Why a run ended without a model answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The model was still requesting tools when the round limit was hit.
    RoundLimitExceeded,
    /// Model calls kept failing after all retries.
    AdapterExhausted,
    /// The run was stopped from outside.
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::RoundLimitExceeded => write!(f, "round limit exceeded"),
            FailureKind::AdapterExhausted => write!(f, "model retries exhausted"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal state of the agent loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    Answer(String),
    /// `detail` is the natural-language reply shown to the user.
    Failure { kind: FailureKind, detail: String },
}

impl LoopOutcome {
    /// The text to show the user.
    pub fn text(&self) -> &str {
        match self {
            LoopOutcome::Answer(text) => text,
            LoopOutcome::Failure { detail, .. } => detail,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            LoopOutcome::Answer(_) => None,
            LoopOutcome::Failure { kind, .. } => Some(*kind),
        }
    }
}

/// The result of a complete [`Harness::run()`](super::harness::Harness::run).
#[derive(Debug, Clone)]
pub struct LoopRun {
    /// Correlation ID used in this run's log lines.
    pub trace_id: String,
    pub outcome: LoopOutcome,
    /// Tool calls executed, in order.
    pub steps: Vec<AgentStep>,
    /// Successful model turns.
    pub rounds_used: u32,
    /// Model calls including failed attempts.
    pub model_calls: u32,
}

/// What the inbound entry point returns for one utterance.
#[derive(Debug, Clone)]
pub struct Reply {
    pub final_text: String,
    pub steps: Vec<AgentStep>,
    pub failure: Option<FailureKind>,
}

impl From<LoopRun> for Reply {
    fn from(run: LoopRun) -> Self {
        let failure = run.outcome.failure_kind();
        let final_text = match run.outcome {
            LoopOutcome::Answer(text) => text,
            LoopOutcome::Failure { detail, .. } => detail,
        };
        Self {
            final_text,
            steps: run.steps,
            failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_from_failure_keeps_detail() {
        let run = LoopRun {
            trace_id: "tr-test".into(),
            outcome: LoopOutcome::Failure {
                kind: FailureKind::RoundLimitExceeded,
                detail: "sorry".into(),
            },
            steps: vec![],
            rounds_used: 3,
            model_calls: 3,
        };
        assert_eq!(run.outcome.text(), "sorry");
        let reply = Reply::from(run);
        assert_eq!(reply.final_text, "sorry");
        assert_eq!(reply.failure, Some(FailureKind::RoundLimitExceeded));
    }

    #[test]
    fn answer_has_no_failure() {
        let outcome = LoopOutcome::Answer("done".into());
        assert_eq!(outcome.failure_kind(), None);
        assert_eq!(outcome.text(), "done");
    }
}
