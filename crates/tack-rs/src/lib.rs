//! Execution core for LLM coding agents: a guarded tool-invocation pipeline
//! and a token-budgeted conversation context.
//!
//! `tack-rs` does not talk to a model. A driving loop (yours) asks the
//! [`ContextManager`](context::ContextManager) for the message list, sends it
//! to whatever client it uses, and hands each returned tool call to
//! [`ToolRegistry::invoke`](tools::core::ToolRegistry::invoke). Results go
//! back into the context as tool-result entries; after each model turn the
//! loop checks [`needs_compression`](context::ContextManager::needs_compression)
//! and compacts history with a summary when the window runs hot.
//!
//! # Getting started
//!
//! ```ignore
//! use tack_rs::prelude::*;
//!
//! let config = AgentConfig::default();
//! let registry = ToolRegistry::with_builtin_tools(&config);
//! let approvals = PolicyApprovalManager::new(ApprovalPolicy::OnMutation, |_c| false);
//!
//! let mut context = ContextManager::new(&config, "You are a coding agent.");
//! context.add_user_message("List the src directory.");
//!
//! // ... model returns a tool call ...
//! let result = registry
//!     .invoke("list_dir", serde_json::json!({"path": "src"}), &cwd, Some(&approvals))
//!     .await;
//! context.add_tool_result("call_1", result.to_model_output());
//! ```
//!
//! # Where to find things
//!
//! - **The tool contract:** [`Tool`](tools::core::Tool) and the data it
//!   produces ([`ToolResult`](tools::types::ToolResult),
//!   [`ToolConfirmation`](tools::types::ToolConfirmation),
//!   [`FileDiff`](tools::types::FileDiff)).
//! - **The invocation pipeline:** [`ToolRegistry`](tools::core::ToolRegistry)
//!   runs lookup → validate → confirm → approve → execute for one call.
//! - **Safety decisions:** [`ApprovalManager`](approval::ApprovalManager) and
//!   the reference [`PolicyApprovalManager`](approval::PolicyApprovalManager).
//! - **Built-in tools:** [`tools::shell`], [`tools::edit`], [`tools::common`].
//! - **Conversation state and compaction:** [`context`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`tools`] | Tool trait, registry pipeline, shell/edit and simple file tools |
//! | [`context`] | Conversation entries, token accounting, compaction |
//! | [`approval`] | Approval context/decision types and policy manager |
//! | [`config`] | Deserializable agent configuration |
//! | [`error`] | Internal fault types |

pub mod approval;
pub mod config;
pub mod context;
pub mod error;
pub mod prelude;
pub mod tools;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Re-export schemars for downstream crates.
pub use schemars;

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`. This is the bridge between strong Rust types
/// and the `serde_json::Value` that function-calling APIs expect.
///
/// # Example
///
/// ```
/// use tack_rs::json_schema_for;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct GrepArgs {
///     pattern: String,
///     #[serde(default)]
///     path: Option<String>,
/// }
///
/// let schema = json_schema_for::<GrepArgs>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"pattern".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
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

/// A role-tagged record as consumed by a chat-completion client.
///
/// Absent fields are omitted from the serialized form entirely, so a
/// tool-call-only assistant message carries no `content` key.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
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

/// Tool definition exported to the model (function-calling format).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ToolDef {
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    pub function: FunctionDef,
}

impl ToolDef {
    /// Create a function-calling tool definition.
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

/// A tool call requested by the model.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: CallType,
    pub function: FunctionCallData,
}

impl ToolCall {
    /// Build a function tool call from its parts.
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

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FunctionCallData {
    pub name: String,
    pub arguments: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let sys = Message::system("hello");
        assert_eq!(sys.role, MessageRole::System);
        assert_eq!(sys.content.as_deref(), Some("hello"));

        let user = Message::user("world");
        assert_eq!(user.role, MessageRole::User);

        let tool = Message::tool_result("call-1", "result");
        assert_eq!(tool.role, MessageRole::Tool);
        assert_eq!(tool.tool_call_id.as_deref(), Some("call-1"));
    }

    #[test]
    fn message_skips_absent_fields() {
        let msg = Message {
            role: MessageRole::Assistant,
            content: None,
            tool_calls: Some(vec![ToolCall::function("c1", "shell", "{}")]),
            tool_call_id: None,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("content").is_none());
        assert!(json.get("tool_call_id").is_none());
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["tool_calls"][0]["type"], "function");
        assert_eq!(json["tool_calls"][0]["function"]["name"], "shell");
    }

    #[test]
    fn tool_def_serializes_as_function() {
        let def = ToolDef::new("echo", "Echo", serde_json::json!({"type": "object"}));
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "echo");
    }
}
