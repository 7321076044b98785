//! Configuration types for the [`Harness`](super::harness::Harness).
//!
//! Defaults match a small support assistant: 3 rounds per utterance, 2 extra
//! attempts after a failed model call, a 10-turn history window and a 30s
//! model timeout. User-facing fallback texts live in [`FallbackMessages`] so
//! an application can supply them in its conversation language.
//!
//! ```ignore
//! let config = AgentConfig::new(ModelConfig::new("llama3-8b-8192"))
//!     .with_max_rounds(3)
//!     .with_retries(2)
//!     .with_messages(FallbackMessages::default().with_coaching("find_nearest_store", "..."));
//! config.validate()?;
//! ```

use std::collections::HashMap;
use std::time::Duration;

use crate::DEFAULT_MODEL;
use crate::agent::history::DEFAULT_HISTORY_WINDOW;
use crate::api::retry::RetryConfig;
use crate::error::{AdapterError, ConfigError};

/// Default round limit per utterance.
pub const DEFAULT_MAX_ROUNDS: u32 = 3;

// ── Model ─────────────────────────────────────────────────────────

/// Parameters of each model invocation.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,
    /// Sampling temperature in `[0, 1]`. Default: `0.0`.
    pub temperature: f32,
    /// Maximum tokens per response. Default: `1024`.
    pub max_tokens: u32,
    /// Upper bound on one model call. Default: 30s.
    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: 1024,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ModelConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Model);
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ConfigError::Temperature(self.temperature));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::MaxTokens);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Timeout);
        }
        Ok(())
    }
}

// ── User-facing texts ─────────────────────────────────────────────

/// Natural-language replies used when the loop cannot produce an answer.
#[derive(Debug, Clone)]
pub struct FallbackMessages {
    /// Reply when the round limit is hit and the model produced no text.
    pub round_limit: String,
    /// Reply when model calls keep failing and no coaching text applies.
    pub adapter_exhausted: String,
    /// Reply when the model answered with an empty string.
    pub empty_answer: String,
    /// Reply when the stop signal ended the run. Not recorded in history.
    pub cancelled: String,
    /// Re-prompt sent after a failed model call. `{tomorrow}` is replaced
    /// with tomorrow's date (`YYYY-MM-DD`).
    pub clarification: String,
    /// Per-tool guidance shown instead of `adapter_exhausted` when the
    /// failing call was for that tool.
    pub coaching: HashMap<String, String>,
}

impl Default for FallbackMessages {
    fn default() -> Self {
        Self {
            round_limit: "Sorry, I could not finish this request. Please try rephrasing it."
                .to_string(),
            adapter_exhausted: "Sorry, something went wrong while processing your request. \
                                Please try again or ask in a different way."
                .to_string(),
            empty_answer: "Sorry, I could not produce an answer.".to_string(),
            cancelled: "(request cancelled)".to_string(),
            clarification: "Your previous reply could not be used. Call exactly one of the \
                            available tools with arguments matching its parameters, or answer \
                            in plain text. Dates must be YYYY-MM-DD; tomorrow is {tomorrow}."
                .to_string(),
            coaching: HashMap::new(),
        }
    }
}

impl FallbackMessages {
    /// Register guidance for failures involving `tool`.
    pub fn with_coaching(mut self, tool: impl Into<String>, text: impl Into<String>) -> Self {
        self.coaching.insert(tool.into(), text.into());
        self
    }

    /// The clarification re-prompt with the date filled in.
    pub fn clarification_for(&self, tomorrow: &str) -> String {
        self.clarification.replace("{tomorrow}", tomorrow)
    }

    /// Coaching for `tool` if configured, else the generic apology.
    pub fn exhausted_for(&self, tool: Option<&str>) -> &str {
        tool.and_then(|t| self.coaching.get(t))
            .map_or(self.adapter_exhausted.as_str(), String::as_str)
    }

    /// The reply after the last attempt failed with `error`.
    pub fn for_error(&self, error: &AdapterError) -> &str {
        match error {
            AdapterError::EmptyResponse => &self.empty_answer,
            other => self.exhausted_for(other.tool_name()),
        }
    }
}

// ── Agent ─────────────────────────────────────────────────────────

/// Configuration for the agent loop.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: ModelConfig,
    /// Maximum successful model turns per utterance. Default: `3`.
    pub max_rounds: u32,
    /// Turns kept in history after each exchange. Default: `10`.
    pub history_window: usize,
    /// Extra attempts after a failed model call. Default: 2 retries.
    pub retry: RetryConfig,
    pub messages: FallbackMessages,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}

impl AgentConfig {
    pub fn new(model: ModelConfig) -> Self {
        Self {
            model,
            max_rounds: DEFAULT_MAX_ROUNDS,
            history_window: DEFAULT_HISTORY_WINDOW,
            retry: RetryConfig::default(),
            messages: FallbackMessages::default(),
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_history_window(mut self, turns: usize) -> Self {
        self.history_window = turns;
        self
    }

    /// Set the number of extra attempts, keeping the backoff settings.
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_messages(mut self, messages: FallbackMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model.validate()?;
        if self.max_rounds == 0 {
            return Err(ConfigError::MaxRounds);
        }
        if self.history_window < 2 {
            return Err(ConfigError::HistoryWindow(self.history_window));
        }
        Ok(())
    }
}
