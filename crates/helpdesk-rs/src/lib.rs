//! Tool-calling agent loop for customer-support assistants.
//!
//! `helpdesk-rs` drives an OpenAI-compatible chat completions API (Groq by
//! default) with a small, fixed set of tools. The core abstraction is the
//! [`Harness`](agent::harness::Harness): it asks the model, runs whichever
//! tools the model requests, feeds the results back and repeats until the
//! model answers in text, the round limit is hit, or the model keeps
//! producing calls that cannot be executed.
//!
//! # Getting started
//!
//! ```ignore
//! use std::sync::Arc;
//! use helpdesk_rs::prelude::*;
//!
//! let client = ChatClient::new(api_key)?;
//! let tools = ToolSet::new().with(MyLookupTool::new());
//! let service = ChatService::new(
//!     Arc::new(client),
//!     Arc::new(tools),
//!     PromptTemplate::new("You answer customer-support requests."),
//!     AgentConfig::default(),
//! );
//!
//! let reply = service.handle_user_utterance("cli", "Where is my order 123456?").await;
//! println!("{}", reply.final_text);
//! ```
//!
//! # Where to find things
//!
//! - **Declare and register tools:** [`Tool`](tools::core::Tool),
//!   [`ToolSet`](tools::core::ToolSet) and
//!   [`ToolDeclaration`](tools::declaration::ToolDeclaration). Every tool
//!   returns a [`ToolResult`](tools::result::ToolResult); failures are values.
//! - **Talk to the model:** [`ChatClient`] implements [`ChatModel`];
//!   [`ModelAdapter`](api::adapter::ModelAdapter) turns one call into a
//!   [`ModelTurn`](api::adapter::ModelTurn) or a typed
//!   [`AdapterError`](error::AdapterError).
//! - **Run the loop:** [`Harness`](agent::harness::Harness) with
//!   [`AgentConfig`](agent::config::AgentConfig). Observe it with an
//!   [`EventHandler`](agent::events::EventHandler).
//! - **Hold conversations:** [`ConversationHistory`](agent::history::ConversationHistory)
//!   per session, owned by [`ChatService`](agent::session::ChatService).

pub mod agent;
pub mod api;
pub mod clock;
pub mod error;
pub mod prelude;
pub mod tools;

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::error::{AdapterError, ConfigError};

// ── Constants ──────────────────────────────────────────────────────

pub const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default model for all completions.
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body. Unused optional fields are omitted from
/// serialization.
#[derive(Serialize, Debug, Clone, Default)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// A message on the wire.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// An assistant message requesting tool calls, optionally with the text
    /// the model produced alongside them.
    pub fn assistant_tool_calls(calls: Vec<ToolCall>, text: Option<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: text,
            tool_calls: Some(calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }
}

// ── Tool types ─────────────────────────────────────────────────────

/// The type of a tool definition. Currently always `Function`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ToolType {
    #[serde(rename = "function")]
    Function,
}

/// Tool definition sent to the API (OpenAI function-calling format).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ToolDef {
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    pub function: FunctionDef,
}

impl ToolDef {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: ToolType::Function,
            function: FunctionDef {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// The type of a tool call. Currently always `Function`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum CallType {
    #[serde(rename = "function")]
    Function,
}

/// A tool call returned by the model.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: CallType,
    pub function: FunctionCallData,
}

impl ToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: CallType::Function,
            function: FunctionCallData {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FunctionCallData {
    pub name: String,
    /// Raw JSON text as produced by the model.
    pub arguments: String,
}

// ── Response types ─────────────────────────────────────────────────

/// Raw API response (internal deserialization target).
#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorBody>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

/// Error envelope of an OpenAI-compatible provider.
#[derive(Deserialize, Debug)]
struct RawErrorResponse {
    error: ApiErrorBody,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    failed_generation: Option<String>,
}

/// Clean return type from [`ChatModel::chat`].
#[derive(Debug, Clone, Default)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

impl ChatCompletion {
    /// A text-only completion.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            finish_reason: Some("stop".into()),
            ..Default::default()
        }
    }

    /// A completion requesting the given tool calls.
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            finish_reason: Some("tool_calls".into()),
            ..Default::default()
        }
    }
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

// ── Model seam ─────────────────────────────────────────────────────

/// Boxed future returned by [`ChatModel::chat`].
pub type ModelFuture<'a> = Pin<Box<dyn Future<Output = Result<ChatCompletion, AdapterError>> + Send + 'a>>;

/// Anything that can answer a chat completion request.
///
/// [`ChatClient`] is the HTTP implementation; tests substitute scripted
/// models. Uses a boxed future so the trait stays dyn-compatible.
pub trait ChatModel: Send + Sync {
    fn chat<'a>(&'a self, body: &'a ChatRequest) -> ModelFuture<'a>;
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for an OpenAI-compatible chat completions endpoint.
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// Create a client for the Groq endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::ApiKey);
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("helpdesk-rs/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            endpoint: GROQ_URL.to_string(),
        })
    }

    /// Point the client at another OpenAI-compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a chat completion request.
    pub async fn complete(&self, body: &ChatRequest) -> Result<ChatCompletion, AdapterError> {
        let tool_count = body.tools.as_ref().map_or(0, |t| t.len());
        debug!(
            "LLM request: model={}, messages={}, tools={}, max_tokens={}, temp={}",
            body.model,
            body.messages.len(),
            tool_count,
            body.max_tokens,
            body.temperature,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| AdapterError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AdapterError::Transport(format!("failed to read response: {e}")))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(classify_http_error(status.as_u16(), text));
        }

        parse_completion(&text)
    }
}

impl ChatModel for ChatClient {
    fn chat<'a>(&'a self, body: &'a ChatRequest) -> ModelFuture<'a> {
        Box::pin(self.complete(body))
    }
}

/// Turn a non-success response into an [`AdapterError`].
///
/// A `tool_use_failed` error means the provider could not parse the model's
/// own tool call; the tool name is recovered from `failed_generation`.
fn classify_http_error(status: u16, body: String) -> AdapterError {
    if let Ok(raw) = serde_json::from_str::<RawErrorResponse>(&body)
        && raw.error.code.as_deref() == Some("tool_use_failed")
    {
        let tool = raw
            .error
            .failed_generation
            .as_deref()
            .and_then(failed_generation_tool);
        return AdapterError::ToolUseFailed {
            tool,
            detail: raw.error.message,
        };
    }
    AdapterError::Http { status, body }
}

/// Extract the tool name from a provider's `failed_generation` payload.
///
/// Handles the JSON shapes (`{"name": ..}`, `{"function": {"name": ..}}`, or
/// a list of either) and the `<function=name{...}` text form.
fn failed_generation_tool(generation: &str) -> Option<String> {
    fn name_of(value: &serde_json::Value) -> Option<String> {
        match value {
            serde_json::Value::Array(items) => items.iter().find_map(name_of),
            serde_json::Value::Object(map) => map
                .get("name")
                .and_then(|n| n.as_str())
                .or_else(|| map.get("function")?.get("name")?.as_str())
                .map(str::to_string),
            _ => None,
        }
    }

    let trimmed = generation.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return name_of(&value);
    }
    let rest = trimmed.strip_prefix("<function=")?;
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    (!name.is_empty()).then_some(name)
}

/// Parse a successful response body.
fn parse_completion(text: &str) -> Result<ChatCompletion, AdapterError> {
    let parsed: RawChatResponse =
        serde_json::from_str(text).map_err(|e| AdapterError::Malformed(e.to_string()))?;

    if let Some(err) = parsed.error {
        return Err(AdapterError::Malformed(format!("API error: {}", err.message)));
    }

    if let Some(ref usage) = parsed.usage {
        debug!(
            "Token usage: prompt={}, completion={}, total={}",
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0),
            usage.total_tokens.unwrap_or(0),
        );
    }

    let Some(choice) = parsed.choices.and_then(|c| c.into_iter().next()) else {
        debug!("LLM output: empty (no choices)");
        return Ok(ChatCompletion {
            usage: parsed.usage,
            ..Default::default()
        });
    };

    debug!(
        "LLM output: {} chars text, {} tool call(s)",
        choice.message.content.as_ref().map_or(0, |s| s.len()),
        choice.message.tool_calls.as_ref().map_or(0, |t| t.len())
    );

    Ok(ChatCompletion {
        content: choice.message.content,
        tool_calls: choice.message.tool_calls.unwrap_or_default(),
        usage: parsed.usage,
        finish_reason: choice.finish_reason,
    })
}
