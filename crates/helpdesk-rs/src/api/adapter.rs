//! One model invocation.
//!
//! [`ModelAdapter::invoke`] renders the prompt context, attaches the tool
//! declarations, calls the model under a timeout and interprets the
//! completion. The result is either a final answer or a list of tool calls
//! that are guaranteed to name registered tools and carry object arguments.
//! Anything else is an [`AdapterError`].

use serde_json::Value;
use tracing::debug;

use crate::agent::config::ModelConfig;
use crate::agent::history::Turn;
use crate::agent::prompt::PromptContext;
use crate::error::AdapterError;
use crate::tools::core::{ToolArgs, ToolInvocationRequest, ToolSet};
use crate::{ChatCompletion, ChatModel, ChatRequest, ToolCall};

/// What the model decided to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelTurn {
    /// Text with no tool calls.
    FinalAnswer(String),
    /// One or more tool calls, optionally with accompanying text.
    ToolCalls {
        calls: Vec<ToolInvocationRequest>,
        text: Option<String>,
    },
}

/// Wraps a [`ChatModel`] with the request shape and response checks of one
/// agent round.
pub struct ModelAdapter<'a> {
    model: &'a dyn ChatModel,
    config: &'a ModelConfig,
}

impl<'a> ModelAdapter<'a> {
    pub fn new(model: &'a dyn ChatModel, config: &'a ModelConfig) -> Self {
        Self { model, config }
    }

    /// The request body for the current prompt state.
    pub fn request(&self, prompt: &PromptContext, history: &[Turn], tools: &ToolSet) -> ChatRequest {
        let defs = tools.definitions();
        let has_tools = !defs.is_empty();
        ChatRequest {
            model: self.config.model.clone(),
            messages: prompt.render(history),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            tools: has_tools.then_some(defs),
            tool_choice: has_tools.then(|| "auto".to_string()),
        }
    }

    /// Call the model once.
    pub async fn invoke(
        &self,
        prompt: &PromptContext,
        history: &[Turn],
        tools: &ToolSet,
    ) -> Result<ModelTurn, AdapterError> {
        let body = self.request(prompt, history, tools);
        let completion = match tokio::time::timeout(self.config.timeout, self.model.chat(&body)).await {
            Ok(result) => result?,
            Err(_) => return Err(AdapterError::Timeout(self.config.timeout)),
        };
        interpret(completion, tools)
    }
}

/// Turn a raw completion into a [`ModelTurn`].
pub fn interpret(completion: ChatCompletion, tools: &ToolSet) -> Result<ModelTurn, AdapterError> {
    let text = completion
        .content
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    if completion.tool_calls.is_empty() {
        return text.map(ModelTurn::FinalAnswer).ok_or(AdapterError::EmptyResponse);
    }

    let calls = completion
        .tool_calls
        .into_iter()
        .enumerate()
        .map(|(i, call)| to_request(i, call, tools))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ModelTurn::ToolCalls { calls, text })
}

fn to_request(index: usize, call: ToolCall, tools: &ToolSet) -> Result<ToolInvocationRequest, AdapterError> {
    let name = call.function.name.trim().to_string();
    if !tools.contains(&name) {
        return Err(AdapterError::UnknownTool(name));
    }
    let arguments = parse_arguments(&name, &call.function.arguments)?;
    let call_id = if call.id.is_empty() {
        format!("call_{index}")
    } else {
        call.id
    };
    debug!("Model requested {name} ({call_id})");
    Ok(ToolInvocationRequest {
        call_id,
        tool_name: name,
        arguments,
    })
}

/// Parse the model's raw argument text into an object.
///
/// Empty text means no arguments. Some models encode the object as a JSON
/// string; that one level of nesting is unwrapped.
fn parse_arguments(tool: &str, raw: &str) -> Result<ToolArgs, AdapterError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(ToolArgs::new());
    }
    let invalid = |detail: String| AdapterError::InvalidArguments {
        tool: tool.to_string(),
        detail,
    };
    let value: Value = serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(ToolArgs::new()),
        Value::String(inner) => match serde_json::from_str::<Value>(&inner) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(invalid(format!("expected a JSON object, got string {inner:?}"))),
        },
        other => Err(invalid(format!("expected a JSON object, got {other}"))),
    }
}
