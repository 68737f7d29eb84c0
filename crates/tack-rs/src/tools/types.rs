//! Values that flow through the invocation pipeline.
//!
//! A [`ToolInvocation`] goes into a tool, a [`ToolConfirmation`] may come out
//! of its confirmation hook, and exactly one [`ToolResult`] comes out of
//! every [`ToolRegistry::invoke`](super::core::ToolRegistry::invoke) call.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use similar::TextDiff;

use crate::error::ToolError;

// ── ToolKind ───────────────────────────────────────────────────────

/// Broad category of a tool's side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Read,
    Write,
    Shell,
    Network,
    Memory,
    Mcp,
}

impl ToolKind {
    /// Whether tools of this kind change state outside the conversation.
    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            ToolKind::Write | ToolKind::Shell | ToolKind::Network | ToolKind::Memory
        )
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ToolKind::Read => "read",
            ToolKind::Write => "write",
            ToolKind::Shell => "shell",
            ToolKind::Network => "network",
            ToolKind::Memory => "memory",
            ToolKind::Mcp => "mcp",
        };
        f.write_str(s)
    }
}

// ── ToolInvocation ─────────────────────────────────────────────────

/// Validated parameters plus the working directory a call runs in.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub params: Value,
    pub cwd: PathBuf,
}

impl ToolInvocation {
    pub fn new(params: Value, cwd: impl Into<PathBuf>) -> Self {
        Self {
            params,
            cwd: cwd.into(),
        }
    }

    /// Deserialize the parameters into a tool's typed argument struct.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ToolError> {
        Ok(T::deserialize(&self.params)?)
    }
}

// ── FileDiff ───────────────────────────────────────────────────────

const DIFF_CONTEXT_LINES: usize = 3;

/// Before/after content of a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: PathBuf,
    pub old_content: String,
    pub new_content: String,
    pub is_new_file: bool,
}

impl FileDiff {
    pub fn new(
        path: impl Into<PathBuf>,
        old_content: impl Into<String>,
        new_content: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            old_content: old_content.into(),
            new_content: new_content.into(),
            is_new_file: false,
        }
    }

    /// A diff describing creation of `path` with `content`.
    pub fn created(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            old_content: String::new(),
            new_content: content.into(),
            is_new_file: true,
        }
    }

    /// Render the change as a unified diff with three lines of context.
    ///
    /// New files diff against `/dev/null`. Identical content renders as an
    /// empty string.
    pub fn to_unified(&self) -> String {
        let from = if self.is_new_file {
            "/dev/null".to_string()
        } else {
            format!("a/{}", self.path.display())
        };
        let to = format!("b/{}", self.path.display());

        TextDiff::from_lines(self.old_content.as_str(), self.new_content.as_str())
            .unified_diff()
            .context_radius(DIFF_CONTEXT_LINES)
            .header(&from, &to)
            .to_string()
    }
}

// ── ToolConfirmation ───────────────────────────────────────────────

/// A preview of what a tool is about to do, produced before execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfirmation {
    pub tool_name: String,
    pub params: Value,
    pub description: String,
    pub diff: Option<FileDiff>,
    pub affected_paths: Vec<PathBuf>,
    pub command: Option<String>,
    pub is_dangerous: bool,
}

impl ToolConfirmation {
    pub fn new(tool_name: impl Into<String>, params: Value, description: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            params,
            description: description.into(),
            diff: None,
            affected_paths: Vec::new(),
            command: None,
            is_dangerous: false,
        }
    }

    pub fn with_diff(mut self, diff: FileDiff) -> Self {
        self.diff = Some(diff);
        self
    }

    pub fn with_affected_path(mut self, path: impl AsRef<Path>) -> Self {
        self.affected_paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn dangerous(mut self, is_dangerous: bool) -> Self {
        self.is_dangerous = is_dangerous;
        self
    }
}

// ── ToolResult ─────────────────────────────────────────────────────

/// The terminal outcome of one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty", default)]
    pub metadata: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<FileDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl ToolResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            metadata: Map::new(),
            diff: None,
            exit_code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(message.into()),
            metadata: Map::new(),
            diff: None,
            exit_code: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_diff(mut self, diff: FileDiff) -> Self {
        self.diff = Some(diff);
        self
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Text handed back to the model as the tool message content.
    pub fn to_model_output(&self) -> String {
        if self.success {
            return self.output.clone();
        }
        let mut out = format!("Error: {}", self.error.as_deref().unwrap_or("unknown error"));
        if !self.output.is_empty() {
            out.push_str("\n\nOutput:\n");
            out.push_str(&self.output);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn kind_mutating() {
        assert!(ToolKind::Write.is_mutating());
        assert!(ToolKind::Shell.is_mutating());
        assert!(!ToolKind::Read.is_mutating());
        assert!(!ToolKind::Mcp.is_mutating());
        assert_eq!(ToolKind::Network.to_string(), "network");
    }

    #[test]
    fn invocation_parses_typed_args() {
        #[derive(Deserialize)]
        struct Args {
            path: String,
            #[serde(default)]
            limit: Option<u32>,
        }

        let inv = ToolInvocation::new(serde_json::json!({"path": "a.txt"}), "/tmp");
        let args: Args = inv.parse().unwrap();
        assert_eq!(args.path, "a.txt");
        assert!(args.limit.is_none());

        let bad = ToolInvocation::new(serde_json::json!({"limit": 3}), "/tmp");
        assert!(matches!(
            bad.parse::<Args>(),
            Err(ToolError::InvalidArguments(_))
        ));
    }

    #[test]
    fn error_result_model_output() {
        let r = ToolResult::error("boom").with_output("partial");
        assert!(!r.success);
        assert_eq!(r.to_model_output(), "Error: boom\n\nOutput:\npartial");

        let ok = ToolResult::success("fine");
        assert_eq!(ok.to_model_output(), "fine");
    }

    #[test]
    fn result_serialization_skips_empty_fields() {
        let json = serde_json::to_value(ToolResult::success("x")).unwrap();
        assert!(json.get("error").is_none());
        assert!(json.get("metadata").is_none());
        assert!(json.get("exit_code").is_none());

        let json =
            serde_json::to_value(ToolResult::error("y").with_metadata("blocked", true)).unwrap();
        assert_eq!(json["metadata"]["blocked"], true);
    }

    #[test]
    fn unified_preview_shows_changed_lines_only() {
        let diff = FileDiff::new("src/a.rs", "one\ntwo\nthree\n", "one\nTWO\nthree\n");
        let text = diff.to_unified();
        assert!(text.starts_with("--- a/src/a.rs\n+++ b/src/a.rs\n"));
        assert!(text.contains("@@ -1,3 +1,3 @@"));
        assert!(text.contains(" one\n-two\n+TWO\n three\n"));
        assert!(!text.contains("-one"));
        assert!(!text.contains("+three"));
    }

    #[test]
    fn unified_preview_keeps_separate_changes_apart() {
        let old = "a\nb\nc\nd\ne\nf\ng\nh\ni\nj\n";
        let new = "A\nb\nc\nd\ne\nf\ng\nh\ni\nJ\n";
        let text = FileDiff::new("f", old, new).to_unified();
        assert_eq!(text.matches("@@ -").count(), 2);
        assert!(text.contains("-a\n+A\n"));
        assert!(text.contains("-j\n+J\n"));
        for unchanged in ["b", "e", "i"] {
            assert!(!text.contains(&format!("-{unchanged}\n")));
            assert!(!text.contains(&format!("+{unchanged}\n")));
        }

        let close = FileDiff::new("f", "a\nb\nc\nd\ne\n", "A\nb\nc\nd\nE\n").to_unified();
        assert!(close.contains(" c\n"));
        assert!(!close.contains("-c\n"));
        assert!(!close.contains("+c\n"));
    }

    #[test]
    fn unified_preview_for_new_file() {
        let diff = FileDiff::created("notes.md", "hello\nworld");
        let text = diff.to_unified();
        assert!(text.starts_with("--- /dev/null\n+++ b/notes.md\n"));
        assert!(text.contains("+hello\n+world\n"));
    }

    #[test]
    fn unified_preview_identical_has_no_hunk() {
        let diff = FileDiff::new("same.txt", "a\nb\n", "a\nb\n");
        assert_eq!(diff.to_unified(), "");
    }
}
