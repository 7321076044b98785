//! Tools the model can call.
//!
//! - [`core`]: the [`Tool`](core::Tool) trait and the [`ToolSet`](core::ToolSet) registry.
//! - [`declaration`]: typed parameter declarations and their JSON Schema.
//! - [`result`]: the structured [`ToolResult`](result::ToolResult) every call produces.

pub mod core;
pub mod declaration;
pub mod result;
