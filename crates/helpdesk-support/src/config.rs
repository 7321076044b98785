//! Support-assistant configuration with sensible defaults.
//!
//! [`SupportConfig`] captures the settings the assistant needs and converts
//! them into helpdesk-rs types via [`build_agent_config`](SupportConfig::build_agent_config),
//! [`build_tool_set`](SupportConfig::build_tool_set) and
//! [`build_service`](SupportConfig::build_service).

use std::sync::Arc;
use std::time::Duration;

use helpdesk_rs::agent::config::{AgentConfig, ModelConfig};
use helpdesk_rs::agent::history::DEFAULT_HISTORY_WINDOW;
use helpdesk_rs::agent::session::ChatService;
use helpdesk_rs::api::retry::DEFAULT_MAX_RETRIES;
use helpdesk_rs::clock::Clock;
use helpdesk_rs::error::ConfigError;
use helpdesk_rs::tools::core::ToolSet;
use helpdesk_rs::{ChatModel, DEFAULT_MODEL};

use crate::prompt::{support_messages, support_prompt_template};
use crate::tools::SupportToolsExt;

/// Configuration for a support-assistant process.
#[derive(Debug, Clone)]
pub struct SupportConfig {
    /// Model identifier. Default: `"llama3-8b-8192"`.
    pub model: String,
    /// Sampling temperature. Default: `0.0`.
    pub temperature: f32,
    /// Maximum tokens per LLM response. Default: `1024`.
    pub max_tokens: u32,
    /// Per-call model timeout in seconds. Default: `30`.
    pub timeout_secs: u64,
    /// Maximum model rounds per utterance. Default: `3`.
    pub max_rounds: u32,
    /// Extra attempts after a failed model call. Default: `2`.
    pub max_retries: u32,
    /// Turns of history kept per session. Default: `10`.
    pub history_window: usize,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: 1024,
            timeout_secs: 30,
            max_rounds: 3,
            max_retries: DEFAULT_MAX_RETRIES,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

impl SupportConfig {
    /// Build a validated [`AgentConfig`] with the Turkish fallback texts.
    pub fn build_agent_config(&self) -> Result<AgentConfig, ConfigError> {
        let model = ModelConfig::new(self.model.clone())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        let config = AgentConfig::new(model)
            .with_max_rounds(self.max_rounds)
            .with_retries(self.max_retries)
            .with_history_window(self.history_window)
            .with_messages(support_messages());
        config.validate()?;
        Ok(config)
    }

    /// Build a [`ToolSet`] with the four support tools.
    pub fn build_tool_set(&self, clock: Arc<dyn Clock>) -> ToolSet {
        ToolSet::new().with_support_tools(clock)
    }

    /// Wire everything into a [`ChatService`] over `model`.
    pub fn build_service(
        &self,
        model: Arc<dyn ChatModel>,
        clock: Arc<dyn Clock>,
    ) -> Result<ChatService, ConfigError> {
        let config = self.build_agent_config()?;
        let tools = self.build_tool_set(clock.clone());
        Ok(
            ChatService::new(model, Arc::new(tools), support_prompt_template(), config)
                .with_clock(clock),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_rs::clock::SystemClock;

    #[test]
    fn defaults_match_assistant() {
        let config = SupportConfig::default().build_agent_config().unwrap();
        assert_eq!(config.model.model, "llama3-8b-8192");
        assert_eq!(config.max_rounds, 3);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.history_window, 10);
        assert_eq!(config.model.timeout, Duration::from_secs(30));
        assert!(config.messages.empty_answer.starts_with("Üzgünüm"));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let config = SupportConfig {
            temperature: 2.0,
            ..Default::default()
        };
        assert_eq!(
            config.build_agent_config().unwrap_err(),
            ConfigError::Temperature(2.0)
        );

        let config = SupportConfig {
            max_rounds: 0,
            ..Default::default()
        };
        assert_eq!(config.build_agent_config().unwrap_err(), ConfigError::MaxRounds);
    }

    #[test]
    fn tool_set_has_support_tools() {
        let tools = SupportConfig::default().build_tool_set(Arc::new(SystemClock));
        assert_eq!(tools.len(), 4);
        assert!(tools.contains("get_order_status"));
        assert!(tools.contains("find_nearest_store"));
    }
}
