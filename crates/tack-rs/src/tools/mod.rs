//! Tools and the invocation pipeline.
//!
//! Every capability the model can call is a [`Tool`]. Tools live in a
//! [`ToolRegistry`], which exports their schemas and runs each call through
//! validate, confirm, approve and execute, always producing a
//! [`ToolResult`].
//!
//! # Submodules
//!
//! - [`core`]: the [`Tool`] trait, [`ToolRegistry`], schema validation and
//!   result truncation.
//! - [`types`]: invocation, confirmation, diff and result value types.
//! - [`shell`]: [`ShellTool`], with blocked patterns, timeouts and an
//!   environment policy.
//! - [`edit`]: [`EditTool`], exact string replacement.
//! - [`common`]: `read_file`, `write_file`, `list_dir`, `grep`.
//! - [`spec`]: [`ToolSpec`](spec::ToolSpec) builder for tool descriptions.
//! - [`paths`]: path resolution against the invocation's working directory.
//! - [`names`]: canonical tool names.

pub mod common;
pub mod core;
pub mod edit;
pub mod names;
pub mod paths;
pub mod shell;
pub mod spec;
pub mod types;

pub use common::{Grep, ListDir, ReadFile, WriteFile};
pub use core::{
    DEFAULT_MAX_RESULT_BYTES, TRUNCATION_MARKER, Tool, ToolFuture, ToolRegistry, truncate_result,
    validate_against_schema,
};
pub use edit::EditTool;
pub use shell::{ShellTool, build_environment};
pub use types::{FileDiff, ToolConfirmation, ToolInvocation, ToolKind, ToolResult};
