//! The tool contract and the invocation pipeline.
//!
//! Every capability a model can call is a [`Tool`]. Tools are collected into
//! a [`ToolRegistry`], whose [`invoke`](ToolRegistry::invoke) runs one call
//! through lookup, schema validation, confirmation and approval, then
//! execution. Every stage reports failure as a [`ToolResult`]; nothing a
//! tool does can make `invoke` return an error or unwind into the caller.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::pin::Pin;
use std::time::Instant;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, info, trace, warn};

use super::types::{ToolConfirmation, ToolInvocation, ToolKind, ToolResult};
use crate::ToolDef;
use crate::approval::{ApprovalContext, ApprovalDecision, ApprovalManager};
use crate::config::AgentConfig;
use crate::error::ToolError;

/// Maximum size (in bytes) for tool output before truncation.
pub const DEFAULT_MAX_RESULT_BYTES: usize = 100 * 1024;

/// Marker appended to output cut at [`DEFAULT_MAX_RESULT_BYTES`].
pub const TRUNCATION_MARKER: &str = "\n\n[Output truncated]\n";

/// Boxed future returned by the async [`Tool`] hooks.
///
/// Type alias to keep trait signatures and implementations readable.
pub type ToolFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ── Tool trait ─────────────────────────────────────────────────────

/// A tool that an LLM agent can invoke via function-calling.
///
/// Implementors provide:
/// - A static definition ([`Tool::definition`]) with the tool's name,
///   description and JSON Schema parameters.
/// - A [`kind`](Tool::kind), which drives the default
///   [`is_mutating`](Tool::is_mutating).
/// - An async [`execute`](Tool::execute).
///
/// [`validate`](Tool::validate) defaults to checking parameters against the
/// definition's schema. [`confirmation`](Tool::confirmation) defaults to
/// `None`, which skips the approval stage entirely.
///
/// # Example
///
/// ```ignore
/// #[derive(Deserialize, JsonSchema)]
/// struct EchoArgs { text: String }
///
/// struct Echo;
///
/// impl Tool for Echo {
///     fn definition(&self) -> ToolDef {
///         ToolDef::new("echo", "Echo the input", json_schema_for::<EchoArgs>())
///     }
///
///     fn kind(&self) -> ToolKind { ToolKind::Read }
///
///     fn execute<'a>(&'a self, invocation: &'a ToolInvocation)
///         -> ToolFuture<'a, Result<ToolResult, ToolError>>
///     {
///         Box::pin(async move {
///             let args: EchoArgs = invocation.parse()?;
///             Ok(ToolResult::success(args.text))
///         })
///     }
/// }
/// ```
pub trait Tool: Send + Sync {
    /// The tool definition sent to the LLM API.
    fn definition(&self) -> ToolDef;

    /// Side-effect category of this tool.
    fn kind(&self) -> ToolKind;

    /// Execute the tool. Failures the model can act on belong in
    /// [`ToolResult::error`]; `Err` is reserved for faults.
    fn execute<'a>(
        &'a self,
        invocation: &'a ToolInvocation,
    ) -> ToolFuture<'a, Result<ToolResult, ToolError>>;

    /// The tool's name (convenience, delegates to definition).
    fn name(&self) -> String {
        self.definition().function.name
    }

    fn description(&self) -> String {
        self.definition().function.description
    }

    /// Check parameters before anything else runs. Returns one message per
    /// violation; empty means valid.
    fn validate(&self, params: &Value) -> Vec<String> {
        validate_against_schema(&self.definition().function.parameters, params)
    }

    /// Describe what [`execute`](Tool::execute) is about to do, so an
    /// approval manager can decide on it.
    fn confirmation<'a>(
        &'a self,
        _invocation: &'a ToolInvocation,
    ) -> ToolFuture<'a, Option<ToolConfirmation>> {
        Box::pin(async { None })
    }

    /// Whether a call with these parameters changes state.
    fn is_mutating(&self, _params: &Value) -> bool {
        self.kind().is_mutating()
    }
}

// ── ToolRegistry ───────────────────────────────────────────────────

/// Named tools plus the invocation pipeline.
///
/// Registration is expected to happen once at startup; `invoke` only reads
/// the map, so concurrent invocations through `&self` are fine.
///
/// # Example
///
/// ```ignore
/// let registry = ToolRegistry::with_builtin_tools(&config);
/// let result = registry
///     .invoke("shell", json!({"command": "cargo --version"}), &cwd, Some(&approvals))
///     .await;
/// println!("{}", result.to_model_output());
/// ```
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
    /// When set, only these names are exported and invokable.
    allowed_tools: Option<HashSet<String>>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .field("allowed_tools", &self.allowed_tools)
            .finish()
    }
}

impl ToolRegistry {
    /// Create an empty registry with no allow-list.
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
            allowed_tools: None,
        }
    }

    /// Create an empty registry using the config's allow-list.
    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new().with_allowed_tools(config.allowed_tools.clone())
    }

    /// Create a registry holding every built-in tool, configured from
    /// `config`: `read_file`, `write_file`, `edit`, `shell`, `list_dir`,
    /// `grep`.
    pub fn with_builtin_tools(config: &AgentConfig) -> Self {
        use super::common::{Grep, ListDir, ReadFile, WriteFile};
        use super::edit::EditTool;
        use super::shell::ShellTool;

        Self::from_config(config)
            .with(ReadFile)
            .with(WriteFile)
            .with(EditTool)
            .with(ShellTool::from_config(config))
            .with(ListDir)
            .with(Grep)
    }

    /// Restrict exported tools to `names`. `None` or an empty list removes
    /// the restriction.
    pub fn with_allowed_tools<I, S>(mut self, names: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = names
            .map(|n| n.into_iter().map(Into::into).collect::<HashSet<String>>())
            .filter(|allowed| !allowed.is_empty());
        self
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name();
        if self.tools.contains_key(&name) {
            warn!("Overwriting existing tool: {name}");
        }
        debug!("Registered tool: {name} ({})", tool.kind());
        self.tools.insert(name, Box::new(tool));
    }

    /// Register a tool (builder pattern).
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.register(tool);
        self
    }

    /// Remove a tool. Returns whether it was present.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.tools.remove(name).is_some()
    }

    fn is_allowed(&self, name: &str) -> bool {
        self.allowed_tools
            .as_ref()
            .is_none_or(|allowed| allowed.contains(name))
    }

    /// Look up a registered tool by name, honoring the allow-list.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        if !self.is_allowed(name) {
            return None;
        }
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// All registered tools that pass the allow-list, ordered by name.
    pub fn get_tools(&self) -> Vec<&dyn Tool> {
        self.tools
            .iter()
            .filter(|(name, _)| self.is_allowed(name))
            .map(|(_, t)| t.as_ref())
            .collect()
    }

    /// Function-calling definitions for every tool in [`get_tools`](Self::get_tools).
    pub fn get_schema(&self) -> Vec<ToolDef> {
        self.get_tools().iter().map(|t| t.definition()).collect()
    }

    /// Number of registered tools, ignoring the allow-list.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run one tool call through the pipeline.
    ///
    /// 1. Lookup. Unknown names produce an error result. Unlike a plain
    ///    registry lookup, a registered tool outside the allow-list is
    ///    refused here too, so a model cannot call a tool it was never shown.
    /// 2. Validation. Any violation produces an error result listing them in
    ///    the `validation_errors` metadata.
    /// 3. Confirmation and approval, only when `approval` is supplied and the
    ///    tool returns a confirmation. A rejection or a declined prompt
    ///    produces an error result.
    /// 4. Execution. `Err` values become `Internal error` results.
    ///
    /// A panic in the tool's `validate`, `confirmation` or `execute` is caught
    /// and reported as an `Internal error` result.
    pub async fn invoke(
        &self,
        name: &str,
        params: Value,
        cwd: &Path,
        approval: Option<&dyn ApprovalManager>,
    ) -> ToolResult {
        let Some(tool) = self.get(name) else {
            warn!("[tool] unknown tool requested: {name}");
            return ToolResult::error(format!("Unknown tool: {name}"))
                .with_metadata("tool_name", name);
        };

        let errors = match std::panic::catch_unwind(AssertUnwindSafe(|| tool.validate(&params))) {
            Ok(errors) => errors,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("[tool] {name} panicked during validation: {message}");
                return internal_error(name, &message);
            }
        };
        if !errors.is_empty() {
            warn!("[tool] {name} rejected invalid parameters: {}", errors.join("; "));
            return ToolResult::error(format!("Invalid parameters: {}", errors.join("; ")))
                .with_metadata("tool_name", name)
                .with_metadata("validation_errors", errors);
        }

        log_tool_call(name, &params);
        let invocation = ToolInvocation::new(params, cwd);

        if let Some(manager) = approval
            && let Some(rejection) = self.approve(tool, &invocation, manager).await
        {
            return rejection;
        }

        let start = Instant::now();
        let outcome = AssertUnwindSafe(tool.execute(&invocation))
            .catch_unwind()
            .await;
        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                error!("[tool] {name} failed: {e}");
                internal_error(name, &e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("[tool] {name} panicked: {message}");
                internal_error(name, &message)
            }
        };

        debug!(
            "[tool] {name} completed in {:.0}ms (success={}, {} bytes)",
            start.elapsed().as_secs_f64() * 1000.0,
            result.success,
            result.output.len()
        );
        trace!("[tool] {name} output: {}", result.output);
        result
    }

    /// Confirmation and approval stage. Returns `Some` with an error result
    /// when the call must not run.
    async fn approve(
        &self,
        tool: &dyn Tool,
        invocation: &ToolInvocation,
        manager: &dyn ApprovalManager,
    ) -> Option<ToolResult> {
        let name = tool.name();
        let confirmation = match AssertUnwindSafe(tool.confirmation(invocation))
            .catch_unwind()
            .await
        {
            Ok(confirmation) => confirmation?,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("[tool] {name} panicked during confirmation: {message}");
                return Some(internal_error(&name, &message));
            }
        };
        let context =
            ApprovalContext::from_confirmation(&confirmation, tool.is_mutating(&invocation.params));

        match manager.check_approval(&context) {
            ApprovalDecision::Approved => None,
            ApprovalDecision::Rejected => {
                warn!("[tool] {name} rejected by safety policy: {}", confirmation.description);
                Some(ToolResult::error("Operation rejected by safety policy"))
            }
            ApprovalDecision::NeedsConfirmation => {
                if manager.request_confirmation(&confirmation).await {
                    None
                } else {
                    info!("[tool] {name} declined by user: {}", confirmation.description);
                    Some(ToolResult::error("User rejected the operation"))
                }
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Validate parameters against a JSON Schema.
///
/// Parameters must be a JSON object. Each schema violation is reported as
/// `"<instance path>: <message>"`, or just the message at the root.
pub fn validate_against_schema(schema: &Value, params: &Value) -> Vec<String> {
    if !params.is_object() {
        return vec![format!("parameters must be a JSON object, got {params}")];
    }

    let validator = match jsonschema::validator_for(schema) {
        Ok(v) => v,
        Err(e) => {
            // An unusable schema is a tool bug, not a caller mistake.
            warn!("[tool] skipping validation, schema does not compile: {e}");
            return Vec::new();
        }
    };

    validator
        .iter_errors(params)
        .map(|e| {
            let path = e.instance_path().to_string();
            if path.is_empty() {
                e.to_string()
            } else {
                format!("{path}: {e}")
            }
        })
        .collect()
}

/// Log a tool call at INFO level with a truncated preview of arguments.
pub fn log_tool_call(name: &str, params: &Value) {
    let arguments = params.to_string();
    let args_preview: String = arguments.chars().take(120).collect();
    info!(
        "[tool] {}({args_preview}{})",
        name,
        if arguments.chars().count() > 120 { "..." } else { "" }
    );
    debug!("[tool] {name} full args ({} bytes)", arguments.len());
}

/// Cut `s` to at most `max` bytes on a char boundary and append
/// [`TRUNCATION_MARKER`] if anything was dropped.
pub fn truncate_result(mut s: String, max: usize) -> String {
    if s.len() <= max {
        return s;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
    s.push_str(TRUNCATION_MARKER);
    s
}

fn internal_error(name: &str, message: &str) -> ToolResult {
    ToolResult::error(format!("Internal error: {message}")).with_metadata("tool_name", name)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}

// ── Tests ──────────────────────────────────────────────────────────
