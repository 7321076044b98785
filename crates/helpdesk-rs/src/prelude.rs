//! Convenience re-exports for common `helpdesk-rs` types.
//!
//! ```ignore
//! use helpdesk_rs::prelude::*;
//! ```
//!
//! Pulls in the client, the tool traits, the harness and its configuration,
//! and the event handlers. Lower-level pieces (adapter internals, retry
//! tuning, trace IDs) are imported from their modules directly.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{ChatClient, ChatModel, ChatRequest, Message, ToolDef};

// ── Agent runtime ───────────────────────────────────────────────────
pub use crate::agent::{
    AgentConfig, AgentStep, ChatService, CompositeEventHandler, ConversationHistory,
    EventHandler, FailureKind, FallbackMessages, FnEventHandler, Harness, HarnessEvent,
    LoggingHandler, LoopOutcome, LoopRun, ModelConfig, NoopHandler, PromptTemplate, Reply, Turn,
};

// ── Errors and time ─────────────────────────────────────────────────
pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::error::{AdapterError, ConfigError};

// ── Tools ───────────────────────────────────────────────────────────
pub use crate::tools::core::{Tool, ToolArgs, ToolFuture, ToolSet, parse_tool_args, str_arg};
pub use crate::tools::declaration::{ParamType, ToolDeclaration};
pub use crate::tools::result::{ToolErrorKind, ToolResult};
