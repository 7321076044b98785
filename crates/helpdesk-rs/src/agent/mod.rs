//! Agent runtime: the [`Harness`] loop and its supporting modules.
//!
//! - [`harness::Harness`]: the tool-calling loop for one utterance. Start here.
//! - [`config::AgentConfig`]: round limit, retries, history window and the
//!   user-facing fallback texts.
//! - [`events`]: [`EventHandler`] trait and [`HarnessEvent`] enum for
//!   observing the loop.
//! - [`history`]: bounded per-session [`ConversationHistory`].
//! - [`prompt`]: [`PromptTemplate`] and [`SystemPromptBuilder`].
//! - [`outcome`]: agent trace and terminal states.
//! - [`session`]: [`ChatService`], the per-session entry point.

pub mod config;
pub mod events;
pub mod harness;
pub mod history;
pub mod outcome;
pub mod prompt;
pub mod session;

// Re-export commonly used items at the module level.
pub use config::{AgentConfig, FallbackMessages, ModelConfig};
pub use events::{
    CompositeEventHandler, EventHandler, FnEventHandler, HarnessEvent, LoggingHandler, NoopHandler,
};
pub use harness::Harness;
pub use history::{ConversationHistory, Role, Turn};
pub use outcome::{AgentStep, FailureKind, LoopOutcome, LoopRun, Reply};
pub use prompt::{PromptContext, PromptTemplate, SystemPromptBuilder};
pub use session::{ChatService, SessionStore};
