//! Typed errors at the model boundary and for startup configuration.
//!
//! Tool-level failures are never errors: they are encoded as
//! [`ToolResult`](crate::tools::result::ToolResult) values and fed back to the
//! model. Only the model call itself ([`AdapterError`]) and configuration
//! validation ([`ConfigError`]) produce `Err`.

use std::time::Duration;

/// A failed model invocation.
///
/// The harness retries these with a clarifying re-prompt and, once the retry
/// budget is spent, turns them into a user-facing apology. Classification
/// (transient or not, which tool was involved) is done on the variant, never
/// on the rendered message.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("model API HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The call did not complete within the configured timeout.
    #[error("model call timed out after {:.0}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// The response body was not a valid chat completion.
    #[error("malformed model response: {0}")]
    Malformed(String),

    /// The model returned neither text nor tool calls.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// A tool call carried arguments that are not a JSON object.
    #[error("invalid arguments for tool '{tool}': {detail}")]
    InvalidArguments { tool: String, detail: String },

    /// The model asked for a tool that is not registered.
    #[error("model requested unknown tool '{0}'")]
    UnknownTool(String),

    /// The provider rejected the model's own tool call (`tool_use_failed`).
    #[error("provider rejected tool call{}: {detail}", .tool.as_deref().map(|t| format!(" to '{t}'")).unwrap_or_default())]
    ToolUseFailed {
        tool: Option<String>,
        detail: String,
    },
}

impl AdapterError {
    /// The tool this failure is about, when the error names one.
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            AdapterError::InvalidArguments { tool, .. } => Some(tool),
            AdapterError::UnknownTool(tool) => Some(tool),
            AdapterError::ToolUseFailed { tool, .. } => tool.as_deref(),
            _ => None,
        }
    }

    /// Whether waiting before the next attempt is likely to help.
    ///
    /// Network failures, timeouts, rate limits and 5xx responses are
    /// transient. Everything else is a problem with what the model produced
    /// and is retried immediately with a clarified prompt.
    pub fn is_transient(&self) -> bool {
        match self {
            AdapterError::Transport(_) | AdapterError::Timeout(_) => true,
            AdapterError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Invalid startup configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("temperature must be within [0, 1], got {0}")]
    Temperature(f32),

    #[error("max_tokens must be greater than zero")]
    MaxTokens,

    #[error("timeout must be greater than zero")]
    Timeout,

    #[error("max_rounds must be greater than zero")]
    MaxRounds,

    #[error("history window must hold at least one exchange (2 turns), got {0}")]
    HistoryWindow(usize),

    #[error("model name must not be empty")]
    Model,

    #[error("API key must not be empty")]
    ApiKey,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}
