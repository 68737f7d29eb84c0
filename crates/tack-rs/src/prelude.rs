//! Convenience re-exports for common `tack-rs` types.
//!
//! Meant to be glob-imported by driving loops:
//!
//! ```ignore
//! use tack_rs::prelude::*;
//! ```
//!
//! This pulls in the registry and tool contract, the built-in tools, the
//! approval types, the context manager, and configuration. Helpers such as
//! schema validation and path resolution stay in their modules.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{Message, MessageRole, ToolCall, ToolDef, json_schema_for};

// ── Configuration and errors ────────────────────────────────────────
pub use crate::config::{AgentConfig, ModelConfig, ShellEnvironmentPolicy};
pub use crate::error::{ConfigError, ToolError};

// ── Approval ────────────────────────────────────────────────────────
pub use crate::approval::{
    ApprovalContext, ApprovalDecision, ApprovalManager, ApprovalPolicy, PolicyApprovalManager,
};

// ── Context management ──────────────────────────────────────────────
pub use crate::context::{
    CharEstimateCounter, ContextManager, ConversationEntry, TokenCounter, TokenUsage,
};

// ── Tools ───────────────────────────────────────────────────────────
pub use crate::tools::spec::ToolSpec;
pub use crate::tools::{
    EditTool, FileDiff, Grep, ListDir, ReadFile, ShellTool, Tool, ToolConfirmation, ToolFuture,
    ToolInvocation, ToolKind, ToolRegistry, ToolResult, WriteFile,
};
