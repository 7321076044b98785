//! Everything between the [`Harness`](crate::agent::harness::Harness) loop
//! and the hosted model:
//!
//! - [`adapter`]: one model invocation, from prompt context to a
//!   [`ModelTurn`](adapter::ModelTurn) or a typed error.
//! - [`retry`]: backoff for transient failures.
//! - [`tracing`]: correlation IDs for log lines.

pub mod adapter;
pub mod retry;
pub mod tracing;

pub use adapter::{ModelAdapter, ModelTurn};
pub use retry::RetryConfig;
pub use tracing::{generate_span_id, generate_trace_id};
