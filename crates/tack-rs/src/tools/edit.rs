//! The `edit` tool: exact, literal text replacement in a file, or creation
//! of a new file when `old_string` is empty.

use std::path::Path;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

use super::core::{Tool, ToolFuture};
use super::names::EDIT;
use super::paths::{ensure_parent_directory, resolve_path};
use super::spec::ToolSpec;
use super::types::{FileDiff, ToolConfirmation, ToolInvocation, ToolKind, ToolResult};
use crate::ToolDef;
use crate::error::ToolError;

/// Candidate lines reported when `old_string` is not found.
const MAX_NEAR_MISSES: usize = 3;
/// Characters of each candidate line shown in the no-match diagnostic.
const NEAR_MISS_PREVIEW_CHARS: usize = 80;

/// Typed arguments for `edit`.
#[derive(Deserialize, JsonSchema)]
pub struct EditArgs {
    /// Path to the file to edit, relative to the working directory.
    pub path: String,
    /// Exact text to replace, including whitespace and indentation. Leave
    /// empty to create a new file.
    #[serde(default)]
    pub old_string: String,
    /// Replacement text.
    pub new_string: String,
    /// Replace every occurrence instead of requiring a unique match.
    #[serde(default)]
    pub replace_all: bool,
}

impl EditArgs {
    fn apply(&self, content: &str) -> String {
        if self.replace_all {
            content.replace(&self.old_string, &self.new_string)
        } else {
            content.replacen(&self.old_string, &self.new_string, 1)
        }
    }
}

/// Edit files by exact string replacement.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditTool;

impl Tool for EditTool {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(EDIT)
            .purpose("Edit a file by replacing an exact string with new text")
            .when_to_use(
                "For precise, surgical changes to an existing file. old_string must match \
                 exactly, including whitespace and indentation, and must be unique unless \
                 replace_all is true. With an empty old_string, creates a new file",
            )
            .when_not_to_use(
                "For complete rewrites of existing files, use write_file instead. \
                 Read the file first if you are unsure of its exact contents",
            )
            .parameters_for::<EditArgs>()
            .example(
                "edit(path='src/lib.rs', old_string='fn old()', new_string='fn new()')",
                "Replaces the single occurrence and reports the line delta",
            )
            .output_format("Confirmation with the number of replacements and line delta")
            .disambiguate(
                "Need to replace the whole file",
                "write_file",
                "write_file overwrites; edit requires an exact match",
            )
            .to_tool_def()
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Write
    }

    fn confirmation<'a>(
        &'a self,
        invocation: &'a ToolInvocation,
    ) -> ToolFuture<'a, Option<ToolConfirmation>> {
        Box::pin(async move {
            let args: EditArgs = invocation.parse().ok()?;
            let path = resolve_path(&invocation.cwd, &args.path);
            let params = invocation.params.clone();

            if !path.exists() {
                return Some(
                    ToolConfirmation::new(EDIT, params, format!("Create new file: {}", path.display()))
                        .with_diff(FileDiff::created(&path, args.new_string.as_str()))
                        .with_affected_path(&path),
                );
            }

            let confirmation =
                ToolConfirmation::new(EDIT, params, format!("Edit file: {}", path.display()))
                    .with_affected_path(&path);
            // Execution refuses this call, so there is no result to preview.
            if args.old_string.is_empty() {
                return Some(confirmation);
            }
            match tokio::fs::read_to_string(&path).await {
                Ok(old) => {
                    let new = args.apply(&old);
                    Some(confirmation.with_diff(FileDiff::new(&path, old, new)))
                }
                Err(_) => Some(confirmation),
            }
        })
    }

    fn execute<'a>(
        &'a self,
        invocation: &'a ToolInvocation,
    ) -> ToolFuture<'a, Result<ToolResult, ToolError>> {
        Box::pin(async move {
            let args: EditArgs = invocation.parse()?;
            let path = resolve_path(&invocation.cwd, &args.path);

            if !path.exists() {
                return create_file(&path, &args).await;
            }

            let old_content = match tokio::fs::read_to_string(&path).await {
                Ok(c) => c,
                Err(e) => {
                    return Ok(ToolResult::error(format!(
                        "Failed to read {}: {e}",
                        path.display()
                    )));
                }
            };

            if args.old_string.is_empty() {
                return Ok(ToolResult::error(format!(
                    "old_string is empty but file {} already exists. Provide old_string to \
                     edit, or use write_file to overwrite.",
                    path.display()
                )));
            }

            let occurrences = old_content.matches(args.old_string.as_str()).count();
            if occurrences == 0 {
                return Ok(no_match_error(&args.old_string, &old_content, &path));
            }
            if occurrences > 1 && !args.replace_all {
                return Ok(ToolResult::error(format!(
                    "old_string found {occurrences} times in {}. Either:\n\
                     1. Provide more surrounding context to make the match unique, or\n\
                     2. Set replace_all to true to replace every occurrence.",
                    path.display()
                ))
                .with_metadata("occurrence_count", occurrences));
            }

            let new_content = args.apply(&old_content);
            let replace_count = if args.replace_all { occurrences } else { 1 };

            if new_content == old_content {
                return Ok(ToolResult::error(format!(
                    "No changes made to {}; old_string and new_string are identical.",
                    path.display()
                )));
            }

            if let Err(e) = tokio::fs::write(&path, &new_content).await {
                return Ok(ToolResult::error(format!(
                    "Failed to write to {}: {e}",
                    path.display()
                )));
            }

            let line_diff =
                new_content.lines().count() as i64 - old_content.lines().count() as i64;
            let delta = match line_diff {
                d if d > 0 => format!(" +{d} lines."),
                d if d < 0 => format!(" {d} lines."),
                _ => String::new(),
            };
            debug!(
                "[edit] {}: {replace_count} replacement(s), {line_diff:+} lines",
                path.display()
            );

            Ok(ToolResult::success(format!(
                "Edited {}, replaced {replace_count} occurrence(s).{delta}",
                path.display()
            ))
            .with_diff(FileDiff::new(&path, old_content, new_content))
            .with_metadata("path", path.display().to_string())
            .with_metadata("line_diff", line_diff)
            .with_metadata("replace_count", replace_count))
        })
    }
}

async fn create_file(path: &Path, args: &EditArgs) -> Result<ToolResult, ToolError> {
    if !args.old_string.is_empty() {
        return Ok(ToolResult::error(format!(
            "File does not exist: {}. To create a new file, use an empty old_string.",
            path.display()
        )));
    }

    let written = async {
        ensure_parent_directory(path).await?;
        tokio::fs::write(path, &args.new_string).await
    }
    .await;
    if let Err(e) = written {
        return Ok(ToolResult::error(format!(
            "Failed to write to {}: {e}",
            path.display()
        )));
    }

    let lines = args.new_string.lines().count();
    debug!("[edit] created {} ({lines} lines)", path.display());
    Ok(ToolResult::success(format!(
        "Created {} with {lines} lines.",
        path.display()
    ))
    .with_diff(FileDiff::created(path, args.new_string.as_str()))
    .with_metadata("path", path.display().to_string())
    .with_metadata("is_new_file", true)
    .with_metadata("lines", lines))
}

/// Explain a failed match. Lists up to three lines containing the first
/// whitespace-delimited token of `old_string`, or general guidance when no
/// line does.
fn no_match_error(old_string: &str, content: &str, path: &Path) -> ToolResult {
    let candidates: Vec<(usize, String)> = match old_string.split_whitespace().next() {
        Some(token) => content
            .lines()
            .enumerate()
            .filter(|(_, line)| line.contains(token))
            .take(MAX_NEAR_MISSES)
            .map(|(i, line)| (i + 1, line.trim().chars().take(NEAR_MISS_PREVIEW_CHARS).collect()))
            .collect(),
        None => Vec::new(),
    };

    let mut message = format!("old_string not found in {}.", path.display());
    if candidates.is_empty() {
        message.push_str(
            " Make sure the text matches exactly, including:\n\
             - All whitespace and indentation\n\
             - Line breaks\n\
             - Any invisible characters\n\
             Try re-reading the file with read_file and then editing.",
        );
    } else {
        message.push_str("\n\nPossible similar lines:");
        for (line_no, preview) in &candidates {
            message.push_str(&format!("\n  Line {line_no}: {preview}"));
        }
        message.push_str(
            "\n\nMake sure old_string matches exactly (including whitespace and indentation).",
        );
    }
    ToolResult::error(message).with_metadata("candidates", candidates.len())
}
