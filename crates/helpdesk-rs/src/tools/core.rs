//! Tool abstraction and the registry that dispatches to it.
//!
//! The [`Tool`] trait defines what every tool provides: a static
//! [`ToolDeclaration`] and an async `execute` method returning a
//! [`ToolResult`]. Tools are collected into a [`ToolSet`], which exports the
//! declarations for the model and validates arguments before dispatch.

use futures::FutureExt;
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::ToolDef;
use crate::tools::declaration::ToolDeclaration;
use crate::tools::result::ToolResult;

/// Arguments of a tool call, keyed by parameter name.
pub type ToolArgs = Map<String, Value>;

/// Boxed future returned by [`Tool::execute`].
///
/// Type alias to keep trait signatures and implementations readable.
pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = ToolResult> + Send + 'a>>;

// ── Tool trait ─────────────────────────────────────────────────────

/// A tool the model can invoke via function calling.
///
/// # Example
///
/// ```ignore
/// struct OrderStatus { decl: ToolDeclaration }
///
/// impl Tool for OrderStatus {
///     fn declaration(&self) -> &ToolDeclaration { &self.decl }
///
///     fn execute(&self, args: ToolArgs) -> ToolFuture<'_> {
///         Box::pin(async move {
///             let args: OrderArgs = match parse_tool_args(&args) {
///                 Ok(a) => a,
///                 Err(e) => return e,
///             };
///             lookup(&args.order_id)
///         })
///     }
/// }
/// ```
pub trait Tool: Send + Sync {
    /// The declared name, description and parameters.
    fn declaration(&self) -> &ToolDeclaration;

    /// Rewrite arguments before validation, e.g. resolve relative dates.
    ///
    /// Runs after defaults are filled in. The resolved arguments are what the
    /// agent trace records.
    fn normalize(&self, _args: &mut ToolArgs) {}

    /// Execute the tool with validated arguments.
    ///
    /// Failures are returned as unsuccessful [`ToolResult`]s. Uses a boxed
    /// future so that the trait is dyn-compatible (object-safe).
    fn execute(&self, args: ToolArgs) -> ToolFuture<'_>;

    /// The tool's name (convenience, delegates to the declaration).
    fn name(&self) -> &str {
        self.declaration().name()
    }
}

/// A tool call requested by the model, as routed to the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocationRequest {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: ToolArgs,
}

// ── ToolSet ────────────────────────────────────────────────────────

struct Registered {
    tool: Box<dyn Tool>,
    validator: Option<jsonschema::Validator>,
}

/// A fixed collection of tools that can be dispatched by name.
///
/// Built once at startup and shared read-only afterwards (wrap it in an
/// `Arc` to share across sessions).
///
/// ```ignore
/// let tools = ToolSet::new()
///     .with(OrderStatus::new())
///     .with(UpdateEmail::new());
///
/// let defs = tools.definitions();
/// let result = tools.invoke("get_order_status", json!({"order_id": "123456"})).await;
/// ```
pub struct ToolSet {
    tools: HashMap<String, Registered>,
}

impl fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.tools.keys().collect();
        names.sort();
        f.debug_struct("ToolSet").field("tools", &names).finish()
    }
}

impl ToolSet {
    /// Create an empty tool set.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        let validator = match jsonschema::validator_for(&tool.declaration().parameter_schema()) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Tool {name}: parameter schema does not compile, skipping validation: {e}");
                None
            }
        };
        if self.tools.contains_key(&name) {
            debug!("Tool {name} re-registered, replacing previous implementation");
        }
        self.tools.insert(
            name,
            Registered {
                tool: Box::new(tool),
                validator,
            },
        );
    }

    /// Register a tool (builder pattern).
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.register(tool);
        self
    }

    /// The declaration of a registered tool.
    pub fn lookup(&self, name: &str) -> Option<&ToolDeclaration> {
        self.tools.get(name).map(|r| r.tool.declaration())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All tool definitions for the model, in name order.
    pub fn definitions(&self) -> Vec<ToolDef> {
        self.names()
            .into_iter()
            .filter_map(|n| self.lookup(n))
            .map(ToolDeclaration::to_tool_def)
            .collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool with arguments as produced by the model.
    ///
    /// Arguments that are not a JSON object yield a validation failure.
    pub async fn invoke(&self, name: &str, arguments: Value) -> ToolResult {
        match arguments_object(name, arguments) {
            Ok(args) => self.dispatch(name, args).await.1,
            Err(result) => result,
        }
    }

    /// Validate and execute one tool call.
    ///
    /// Returns the resolved arguments (nulls dropped, defaults filled,
    /// normalized) together with the result. Never panics: an unknown name
    /// is a not-found result and a panicking tool is an internal failure.
    pub async fn dispatch(&self, name: &str, arguments: ToolArgs) -> (ToolArgs, ToolResult) {
        let Some(entry) = self.tools.get(name) else {
            warn!("[tool] unknown tool '{name}'");
            return (
                arguments,
                ToolResult::not_found(format!("unknown tool '{name}'")),
            );
        };

        let mut args = fill_defaults(entry.tool.declaration(), arguments);
        if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| {
            entry.tool.normalize(&mut args);
        })) {
            return (args, panic_result(name, panic.as_ref()));
        }

        if let Some(validator) = &entry.validator
            && let Some(error) = validation_errors(name, validator, &args)
        {
            debug!("[tool] {name} rejected: {error}");
            return (args, ToolResult::validation(error));
        }

        log_tool_call(name, &args);
        let start = Instant::now();

        let future = match std::panic::catch_unwind(AssertUnwindSafe(|| {
            entry.tool.execute(args.clone())
        })) {
            Ok(f) => f,
            Err(panic) => return (args, panic_result(name, panic.as_ref())),
        };
        let result = match AssertUnwindSafe(future).catch_unwind().await {
            Ok(r) => r,
            Err(panic) => panic_result(name, panic.as_ref()),
        };

        debug!(
            "Tool {name} completed in {:.0}ms (success={})",
            start.elapsed().as_secs_f64() * 1000.0,
            result.success
        );
        trace!("Tool {name} result: {}", result.to_observation());

        (args, result)
    }
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::new()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Require a JSON object, turning anything else into a validation failure.
pub fn arguments_object(tool: &str, arguments: Value) -> Result<ToolArgs, ToolResult> {
    match arguments {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(ToolArgs::new()),
        other => Err(ToolResult::validation(format!(
            "arguments for tool '{tool}' must be a JSON object, got {other}"
        ))),
    }
}

/// Drop `null` values and fill declared defaults for absent parameters.
fn fill_defaults(decl: &ToolDeclaration, mut args: ToolArgs) -> ToolArgs {
    args.retain(|_, v| !v.is_null());
    for p in decl.params() {
        if let Some(default) = &p.default
            && !args.contains_key(&p.name)
        {
            args.insert(p.name.clone(), default.clone());
        }
    }
    args
}

/// Validate arguments against the tool's compiled JSON Schema.
///
/// Returns `None` if valid, or a message listing every violation.
fn validation_errors(
    tool: &str,
    validator: &jsonschema::Validator,
    args: &ToolArgs,
) -> Option<String> {
    let value = Value::Object(args.clone());
    let errors: Vec<String> = validator
        .iter_errors(&value)
        .map(|e| format!("  - {}: {e}", e.instance_path()))
        .collect();

    if errors.is_empty() {
        None
    } else {
        Some(format!(
            "argument validation failed for tool '{tool}':\n{}",
            errors.join("\n")
        ))
    }
}

fn panic_result(name: &str, panic: &(dyn Any + Send)) -> ToolResult {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    warn!("[tool] {name} panicked: {detail}");
    ToolResult::internal(format!("tool '{name}' failed unexpectedly"))
}

/// Log a tool call at INFO level with a truncated preview of arguments.
pub fn log_tool_call(name: &str, args: &ToolArgs) {
    let arguments = Value::Object(args.clone()).to_string();
    let args_preview: String = arguments.chars().take(120).collect();
    info!(
        "[tool] {}({args_preview}{})",
        name,
        if arguments.chars().count() > 120 { "..." } else { "" }
    );
    trace!("[tool] {name} arguments: {arguments}");
}

/// Deserialize validated arguments into a typed struct.
///
/// The error is a validation [`ToolResult`] suitable for returning directly
/// from [`Tool::execute`].
pub fn parse_tool_args<T: serde::de::DeserializeOwned>(args: &ToolArgs) -> Result<T, ToolResult> {
    serde_json::from_value(Value::Object(args.clone()))
        .map_err(|e| ToolResult::validation(format!("invalid tool arguments: {e}")))
}

/// Extract a string argument.
pub fn str_arg<'a>(args: &'a ToolArgs, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

// ── Tests ──────────────────────────────────────────────────────────
