//! Simple filesystem tools that share the [`Tool`] contract with `shell`
//! and `edit`.
//!
//! | Tool | Name | Kind |
//! |------|------|------|
//! | [`ReadFile`] | `read_file` | Read |
//! | [`WriteFile`] | `write_file` | Write |
//! | [`ListDir`] | `list_dir` | Read |
//! | [`Grep`] | `grep` | Read |
//!
//! All of them resolve paths against the invocation's working directory.

use std::path::Path;

use schemars::JsonSchema;
use serde::Deserialize;
use tokio::fs;
use tokio::process::Command;

use super::core::{DEFAULT_MAX_RESULT_BYTES, Tool, ToolFuture, truncate_result};
use super::names::{GREP, LIST_DIR, READ_FILE, WRITE_FILE};
use super::paths::{ensure_parent_directory, resolve_path};
use super::spec::ToolSpec;
use super::types::{FileDiff, ToolConfirmation, ToolInvocation, ToolKind, ToolResult};
use crate::ToolDef;
use crate::error::ToolError;

// ── Defaults ────────────────────────────────────────────────────────

/// Maximum matching lines grep reports per file.
pub const DEFAULT_MAX_GREP_MATCHES: u32 = 200;

/// Bytes inspected when deciding whether a file is binary.
const BINARY_SNIFF_BYTES: usize = 8 * 1024;

// ── Typed argument structs ──────────────────────────────────────────

/// Typed arguments for `read_file`.
#[derive(Deserialize, JsonSchema)]
pub struct ReadFileArgs {
    /// File path, relative to the working directory.
    pub path: String,
    /// First line to return, 1-based.
    #[serde(default)]
    #[schemars(range(min = 1))]
    pub offset: Option<usize>,
    /// Maximum number of lines to return.
    #[serde(default)]
    #[schemars(range(min = 1))]
    pub limit: Option<usize>,
}

/// Typed arguments for `write_file`.
#[derive(Deserialize, JsonSchema)]
pub struct WriteFileArgs {
    /// File path, relative to the working directory.
    pub path: String,
    /// Full content to write.
    pub content: String,
}

/// Typed arguments for `list_dir`.
#[derive(Deserialize, JsonSchema)]
pub struct ListDirArgs {
    /// Directory to list (default '.').
    #[serde(default = "default_dir")]
    pub path: String,
    /// Include entries whose name starts with '.'.
    #[serde(default)]
    pub include_hidden: bool,
}

fn default_dir() -> String {
    ".".into()
}

/// Typed arguments for `grep`.
#[derive(Deserialize, JsonSchema)]
pub struct GrepArgs {
    /// Regex pattern to search for.
    pub pattern: String,
    /// Directory or file to search in (default '.').
    #[serde(default)]
    pub path: Option<String>,
    /// File glob filter (e.g. '*.rs').
    #[serde(default)]
    pub glob: Option<String>,
    /// Case-insensitive search.
    #[serde(default)]
    pub case_insensitive: bool,
}

// ── ReadFile ────────────────────────────────────────────────────────

/// Read a text file with line numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadFile;

impl Tool for ReadFile {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(READ_FILE)
            .purpose("Read a text file and return its lines with line numbers")
            .when_to_use("When you need the contents of a file whose path you already know")
            .when_not_to_use(
                "When searching for a pattern across many files, use grep. \
                 When browsing a directory, use list_dir",
            )
            .parameters_for::<ReadFileArgs>()
            .example(
                "read_file(path='src/main.rs', offset=40, limit=20)",
                "Lines 40 to 59, each prefixed with its line number",
            )
            .output_format("One line per row: right-aligned line number, a tab, the line")
            .disambiguate(
                "Need to find which files contain a keyword",
                GREP,
                "grep searches content across files",
            )
            .to_tool_def()
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Read
    }

    fn execute<'a>(
        &'a self,
        invocation: &'a ToolInvocation,
    ) -> ToolFuture<'a, Result<ToolResult, ToolError>> {
        Box::pin(async move {
            let args: ReadFileArgs = invocation.parse()?;
            let path = resolve_path(&invocation.cwd, &args.path);

            let meta = match fs::metadata(&path).await {
                Ok(m) => m,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(ToolResult::error(format!(
                        "File not found: {}",
                        path.display()
                    )));
                }
                Err(e) => return Err(ToolError::io(&path, e)),
            };
            if meta.is_dir() {
                return Ok(ToolResult::error(format!(
                    "'{}' is a directory, not a file. Use {LIST_DIR} to browse directories.",
                    path.display()
                )));
            }

            let bytes = fs::read(&path).await.map_err(|e| ToolError::io(&path, e))?;
            if bytes.iter().take(BINARY_SNIFF_BYTES).any(|b| *b == 0) {
                return Ok(ToolResult::error(format!(
                    "Cannot read binary file: {}",
                    path.display()
                )));
            }
            let text = String::from_utf8_lossy(&bytes);
            let total_lines = text.lines().count();

            let start = args.offset.unwrap_or(1).max(1);
            if total_lines > 0 && start > total_lines {
                return Ok(ToolResult::error(format!(
                    "Offset {start} is past the end of {} ({total_lines} lines).",
                    path.display()
                )));
            }
            let shown: Vec<String> = text
                .lines()
                .enumerate()
                .skip(start - 1)
                .take(args.limit.unwrap_or(usize::MAX))
                .map(|(i, line)| format!("{:>6}\t{line}", i + 1))
                .collect();

            Ok(
                ToolResult::success(truncate_result(shown.join("\n"), DEFAULT_MAX_RESULT_BYTES))
                    .with_metadata("path", path.display().to_string())
                    .with_metadata("total_lines", total_lines)
                    .with_metadata("shown_lines", shown.len()),
            )
        })
    }
}

// ── WriteFile ───────────────────────────────────────────────────────

/// Create or overwrite a file with the given content.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteFile;

impl Tool for WriteFile {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(WRITE_FILE)
            .purpose("Write content to a file, creating it or replacing it entirely")
            .when_to_use("When creating a new file or rewriting a file from scratch")
            .when_not_to_use("For small changes to an existing file, use edit")
            .parameters_for::<WriteFileArgs>()
            .example(
                "write_file(path='notes/todo.md', content='- ship it\\n')",
                "Creates notes/ if needed and writes the file",
            )
            .output_format("Confirmation with the path and line count")
            .disambiguate(
                "Changing a few lines of a large file",
                "edit",
                "edit replaces an exact snippet and leaves the rest untouched",
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
            let args: WriteFileArgs = invocation.parse().ok()?;
            let path = resolve_path(&invocation.cwd, &args.path);
            let params = invocation.params.clone();

            let confirmation = if path.exists() {
                let conf = ToolConfirmation::new(
                    WRITE_FILE,
                    params,
                    format!("Overwrite file: {}", path.display()),
                );
                match fs::read_to_string(&path).await {
                    Ok(old) => conf.with_diff(FileDiff::new(&path, old, args.content)),
                    Err(_) => conf,
                }
            } else {
                ToolConfirmation::new(
                    WRITE_FILE,
                    params,
                    format!("Create new file: {}", path.display()),
                )
                .with_diff(FileDiff::created(&path, args.content))
            };
            Some(confirmation.with_affected_path(&path))
        })
    }

    fn execute<'a>(
        &'a self,
        invocation: &'a ToolInvocation,
    ) -> ToolFuture<'a, Result<ToolResult, ToolError>> {
        Box::pin(async move {
            let args: WriteFileArgs = invocation.parse()?;
            let path = resolve_path(&invocation.cwd, &args.path);

            if path.is_dir() {
                return Ok(ToolResult::error(format!(
                    "'{}' is a directory, not a file.",
                    path.display()
                )));
            }
            let old = fs::read_to_string(&path).await.ok();

            let written = async {
                ensure_parent_directory(&path).await?;
                fs::write(&path, &args.content).await
            }
            .await;
            if let Err(e) = written {
                return Ok(ToolResult::error(format!(
                    "Failed to write to {}: {e}",
                    path.display()
                )));
            }

            let lines = args.content.lines().count();
            let is_new_file = old.is_none();
            let (verb, diff) = match old {
                Some(old) => ("Wrote", FileDiff::new(&path, old, args.content.as_str())),
                None => ("Created", FileDiff::created(&path, args.content.as_str())),
            };
            Ok(
                ToolResult::success(format!("{verb} {} ({lines} lines).", path.display()))
                    .with_diff(diff)
                    .with_metadata("path", path.display().to_string())
                    .with_metadata("is_new_file", is_new_file)
                    .with_metadata("bytes", args.content.len()),
            )
        })
    }
}

// ── ListDir ─────────────────────────────────────────────────────────

/// List one directory, directories first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListDir;

impl Tool for ListDir {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(LIST_DIR)
            .purpose("List the entries of a directory")
            .when_to_use("When you need to discover what exists in a directory")
            .when_not_to_use(
                "When you already know the file path, use read_file. \
                 When searching content, use grep",
            )
            .parameters_for::<ListDirArgs>()
            .example(
                "list_dir(path='src')",
                "Subdirectories (with trailing '/') then files, one per line",
            )
            .output_format("One entry per line. Directories end with '/'")
            .to_tool_def()
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Read
    }

    fn execute<'a>(
        &'a self,
        invocation: &'a ToolInvocation,
    ) -> ToolFuture<'a, Result<ToolResult, ToolError>> {
        Box::pin(async move {
            let args: ListDirArgs = invocation.parse()?;
            let path = resolve_path(&invocation.cwd, &args.path);

            if !path.exists() {
                return Ok(ToolResult::error(format!(
                    "Directory does not exist: {}",
                    path.display()
                )));
            }
            if !path.is_dir() {
                return Ok(ToolResult::error(format!(
                    "Not a directory: {}",
                    path.display()
                )));
            }

            let entries = read_entries(&path, args.include_hidden)
                .await
                .map_err(|e| ToolError::io(&path, e))?;
            let count = entries.len();
            let output = if entries.is_empty() {
                format!("Directory is empty: {}", path.display())
            } else {
                entries
                    .into_iter()
                    .map(|(name, is_dir)| if is_dir { format!("{name}/") } else { name })
                    .collect::<Vec<_>>()
                    .join("\n")
            };

            Ok(
                ToolResult::success(truncate_result(output, DEFAULT_MAX_RESULT_BYTES))
                    .with_metadata("path", path.display().to_string())
                    .with_metadata("entries", count),
            )
        })
    }
}

/// `(name, is_dir)` pairs: directories first, then case-insensitive name.
async fn read_entries(dir: &Path, include_hidden: bool) -> std::io::Result<Vec<(String, bool)>> {
    let mut entries = Vec::new();
    let mut reader = fs::read_dir(dir).await?;
    while let Some(entry) = reader.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !include_hidden && name.starts_with('.') {
            continue;
        }
        let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
        entries.push((name, is_dir));
    }
    entries.sort_by(|(a, a_dir), (b, b_dir)| {
        b_dir
            .cmp(a_dir)
            .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
    });
    Ok(entries)
}

// ── Grep ────────────────────────────────────────────────────────────

/// Regex search over file contents via the system `grep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Grep;

impl Tool for Grep {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(GREP)
            .purpose("Search for a regex pattern in file contents")
            .when_to_use("When you need to find text matching a pattern across files")
            .when_not_to_use("When you already know the file path, use read_file")
            .parameters_for::<GrepArgs>()
            .example(
                "grep(pattern='fn main', glob='*.rs')",
                "Matching lines prefixed with file:line_number",
            )
            .output_format("Matching lines prefixed with file_path:line_number:")
            .disambiguate(
                "Need to read a file you already know",
                READ_FILE,
                "read_file returns the whole file; grep returns only matching lines",
            )
            .to_tool_def()
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Read
    }

    fn execute<'a>(
        &'a self,
        invocation: &'a ToolInvocation,
    ) -> ToolFuture<'a, Result<ToolResult, ToolError>> {
        Box::pin(async move {
            let args: GrepArgs = invocation.parse()?;
            let search_path = args.path.as_deref().unwrap_or(".");

            let mut cmd = Command::new("grep");
            cmd.arg("-rnI")
                .arg("--color=never")
                .arg(format!("--max-count={DEFAULT_MAX_GREP_MATCHES}"));
            if args.case_insensitive {
                cmd.arg("-i");
            }
            if let Some(glob) = &args.glob {
                cmd.arg(format!("--include={glob}"));
            }
            cmd.arg("-e")
                .arg(&args.pattern)
                .arg(search_path)
                .current_dir(&invocation.cwd)
                .kill_on_drop(true);

            let output = cmd.output().await.map_err(ToolError::Spawn)?;
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);

            // grep exits 1 when nothing matched.
            let result = match output.status.code() {
                Some(0) => {
                    let matches = stdout.lines().count();
                    ToolResult::success(truncate_result(
                        stdout.trim_end().to_string(),
                        DEFAULT_MAX_RESULT_BYTES,
                    ))
                    .with_metadata("matches", matches)
                }
                Some(1) => ToolResult::success("No matches found").with_metadata("matches", 0),
                code => {
                    let message = match stderr.trim() {
                        "" => format!("grep exited with code {}", code.unwrap_or(-1)),
                        msg => msg.to_string(),
                    };
                    ToolResult::error(message).with_exit_code(code.unwrap_or(-1))
                }
            };
            Ok(result.with_metadata("pattern", args.pattern.as_str()))
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inv(dir: &Path, params: serde_json::Value) -> ToolInvocation {
        ToolInvocation::new(params, dir)
    }

    #[test]
    fn definitions_use_canonical_names() {
        assert_eq!(ReadFile.definition().function.name, READ_FILE);
        assert_eq!(WriteFile.definition().function.name, WRITE_FILE);
        assert_eq!(ListDir.definition().function.name, LIST_DIR);
        assert_eq!(Grep.definition().function.name, GREP);
        assert!(Grep.definition().function.description.contains("When NOT to use:"));
    }

    #[test]
    fn only_write_file_mutates() {
        let params = json!({});
        assert!(!ReadFile.is_mutating(&params));
        assert!(WriteFile.is_mutating(&params));
        assert!(!ListDir.is_mutating(&params));
        assert!(!Grep.is_mutating(&params));
    }

    #[test]
    fn grep_schema_requires_only_pattern() {
        let schema = crate::json_schema_for::<GrepArgs>();
        assert_eq!(schema["required"], json!(["pattern"]));
    }

    // ── read_file ──────────────────────────────────────────────

    #[tokio::test]
    async fn read_file_numbers_lines_with_window() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a\nb\nc\nd\n").unwrap();

        let result = ReadFile
            .execute(&inv(dir.path(), json!({"path": "a.txt", "offset": 2, "limit": 2})))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "     2\tb\n     3\tc");
        assert_eq!(result.metadata["total_lines"], 4);
        assert_eq!(result.metadata["shown_lines"], 2);
    }

    #[tokio::test]
    async fn read_file_offset_past_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "only\n").unwrap();
        let result = ReadFile
            .execute(&inv(dir.path(), json!({"path": "a.txt", "offset": 5})))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap_or_default().contains("past the end"));
    }

    #[tokio::test]
    async fn read_file_hints_on_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let result = ReadFile
            .execute(&inv(dir.path(), json!({"path": "sub"})))
            .await
            .unwrap();
        let error = result.error.unwrap_or_default();
        assert!(error.contains("is a directory"));
        assert!(error.contains(LIST_DIR));
    }

    #[tokio::test]
    async fn read_file_rejects_binary_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bin"), [0x7f, 0x45, 0x00, 0x01]).unwrap();

        let result = ReadFile
            .execute(&inv(dir.path(), json!({"path": "bin"})))
            .await
            .unwrap();
        assert!(result.error.unwrap_or_default().starts_with("Cannot read binary file"));

        let result = ReadFile
            .execute(&inv(dir.path(), json!({"path": "missing.txt"})))
            .await
            .unwrap();
        assert!(result.error.unwrap_or_default().starts_with("File not found"));
    }

    // ── write_file ─────────────────────────────────────────────

    #[tokio::test]
    async fn write_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let result = WriteFile
            .execute(&inv(
                dir.path(),
                json!({"path": "deep/er/out.txt", "content": "one\ntwo\n"}),
            ))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.starts_with("Created "));
        assert_eq!(result.metadata["is_new_file"], true);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("deep/er/out.txt")).unwrap(),
            "one\ntwo\n"
        );
    }

    #[tokio::test]
    async fn write_file_confirmation_diffs_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "old\n").unwrap();
        let invocation = inv(dir.path(), json!({"path": "a.txt", "content": "new\n"}));

        let conf = WriteFile.confirmation(&invocation).await.unwrap();
        assert!(conf.description.starts_with("Overwrite file: "));
        let diff = conf.diff.unwrap();
        assert_eq!(diff.old_content, "old\n");
        assert!(!diff.is_new_file);

        let result = WriteFile.execute(&invocation).await.unwrap();
        assert_eq!(result.metadata["is_new_file"], false);
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "new\n");
    }

    // ── list_dir ───────────────────────────────────────────────

    #[tokio::test]
    async fn list_dir_orders_dirs_first_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("zeta")).unwrap();
        std::fs::create_dir(dir.path().join("Alpha")).unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("A.txt"), "").unwrap();
        std::fs::write(dir.path().join(".hidden"), "").unwrap();

        let result = ListDir
            .execute(&inv(dir.path(), json!({})))
            .await
            .unwrap();
        assert_eq!(result.output, "Alpha/\nzeta/\nA.txt\nb.txt");
        assert_eq!(result.metadata["entries"], 4);

        let result = ListDir
            .execute(&inv(dir.path(), json!({"include_hidden": true})))
            .await
            .unwrap();
        assert!(result.output.contains(".hidden"));
    }

    #[tokio::test]
    async fn list_dir_empty_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();

        let result = ListDir
            .execute(&inv(dir.path(), json!({"path": "empty"})))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.starts_with("Directory is empty: "));

        let result = ListDir
            .execute(&inv(dir.path(), json!({"path": "nope"})))
            .await
            .unwrap();
        assert!(result.error.unwrap_or_default().starts_with("Directory does not exist: "));
    }

    // ── grep ───────────────────────────────────────────────────

    #[tokio::test]
    async fn grep_finds_matches_and_reports_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn main() {}\nfn helper() {}\n").unwrap();
        std::fs::write(dir.path().join("b.md"), "fn in markdown\n").unwrap();

        let result = Grep
            .execute(&inv(dir.path(), json!({"pattern": "fn main", "glob": "*.rs"})))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("a.rs:1:fn main() {}"));
        assert_eq!(result.metadata["matches"], 1);

        let result = Grep
            .execute(&inv(dir.path(), json!({"pattern": "absent_token"})))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "No matches found");
    }

    #[tokio::test]
    async fn grep_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "Hello World\n").unwrap();
        let result = Grep
            .execute(&inv(
                dir.path(),
                json!({"pattern": "hello", "case_insensitive": true}),
            ))
            .await
            .unwrap();
        assert!(result.output.contains("Hello World"));
    }
}
