//! The `shell` tool: run a command line with bounded risk and bounded
//! resource use.
//!
//! Commands run through the platform shell in their own process group, with
//! an environment filtered by [`ShellEnvironmentPolicy`]. On timeout the
//! whole group is killed, so background children do not outlive the call.
//! Output is capped at [`DEFAULT_MAX_RESULT_BYTES`].
//!
//! Known-catastrophic commands are caught twice. The confirmation hook marks
//! them dangerous (case-sensitive match on the raw command) and leaves the
//! consequence to the approval manager. Execution re-checks on the
//! lower-cased command and refuses unconditionally.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use schemars::JsonSchema;
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::core::{DEFAULT_MAX_RESULT_BYTES, Tool, ToolFuture, truncate_result};
use super::names::SHELL;
use super::paths::resolve_path;
use super::spec::ToolSpec;
use super::types::{ToolConfirmation, ToolInvocation, ToolKind, ToolResult};
use crate::ToolDef;
use crate::config::{AgentConfig, ShellEnvironmentPolicy};
use crate::error::ToolError;

/// Default blocked shell command patterns (substring match).
pub const DEFAULT_BLOCKED_COMMANDS: &[&str] = &[
    "rm -rf /",
    "rm -rf ~",
    "rm -rf /*",
    "dd if=/dev/zero",
    "dd if=/dev/random",
    "mkfs",
    "fdisk",
    "parted",
    ":(){ :|:& };:",
    "chmod 777 /",
    "chmod -R 777",
    "shutdown",
    "reboot",
    "halt",
    "poweroff",
    "init 0",
    "init 6",
];

/// Default command timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Typed arguments for `shell`.
#[derive(Deserialize, JsonSchema)]
pub struct ShellArgs {
    /// Shell command to execute (e.g. 'cargo test', 'git log --oneline -5').
    pub command: String,
    /// Timeout in seconds (default 120, max 600).
    #[serde(default = "default_timeout")]
    #[schemars(range(min = 1, max = 600))]
    pub timeout: u64,
    /// Working directory for the command. Relative paths resolve against the
    /// current working directory.
    #[serde(default)]
    pub cwd: Option<String>,
}

// ── ShellTool ───────────────────────────────────────────────────────

/// Execute shell commands.
pub struct ShellTool {
    blocked_commands: Vec<String>,
    environment: ShellEnvironmentPolicy,
    max_result_bytes: usize,
}

impl ShellTool {
    pub fn new() -> Self {
        Self {
            blocked_commands: DEFAULT_BLOCKED_COMMANDS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            environment: ShellEnvironmentPolicy::default(),
            max_result_bytes: DEFAULT_MAX_RESULT_BYTES,
        }
    }

    /// Build from the config's blocked commands and environment policy.
    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new()
            .blocked_commands(config.blocked_commands.clone())
            .environment(config.shell_environment.clone())
    }

    /// Add a blocked command pattern.
    pub fn block_command(mut self, pattern: impl Into<String>) -> Self {
        self.blocked_commands.push(pattern.into());
        self
    }

    /// Replace the entire blocked commands list.
    pub fn blocked_commands(mut self, patterns: Vec<String>) -> Self {
        self.blocked_commands = patterns;
        self
    }

    pub fn environment(mut self, policy: ShellEnvironmentPolicy) -> Self {
        self.environment = policy;
        self
    }

    pub fn max_result_bytes(mut self, max: usize) -> Self {
        self.max_result_bytes = max;
        self
    }

    /// Case-sensitive match on the raw command, used for confirmations.
    fn matches_blocked(&self, command: &str) -> bool {
        self.blocked_commands
            .iter()
            .any(|pattern| command.contains(pattern.as_str()))
    }

    /// Case-insensitive match, used as the hard gate in `execute`.
    fn matches_blocked_ignore_case(&self, command: &str) -> bool {
        let command = command.trim().to_lowercase();
        self.blocked_commands
            .iter()
            .any(|pattern| command.contains(&pattern.to_lowercase()))
    }

    async fn run(&self, args: ShellArgs, invocation: &ToolInvocation) -> Result<ToolResult, ToolError> {
        if self.matches_blocked_ignore_case(&args.command) {
            warn!("[shell] blocked command: {}", args.command);
            return Ok(ToolResult::error(format!(
                "Command blocked for safety reasons: {}",
                args.command
            ))
            .with_metadata("blocked", true));
        }

        let cwd: PathBuf = match &args.cwd {
            Some(dir) => resolve_path(&invocation.cwd, dir),
            None => invocation.cwd.clone(),
        };
        if !cwd.is_dir() {
            return Ok(ToolResult::error(format!(
                "Working directory does not exist: {}",
                cwd.display()
            )));
        }

        let env = build_environment(&self.environment, std::env::vars_os());
        debug!("[shell] running `{}` in {}", args.command, cwd.display());

        let mut child = shell_command(&args.command)
            .current_dir(&cwd)
            .env_clear()
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ToolError::Spawn)?;

        let pid = child.id();
        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();

        let completed = tokio::time::timeout(Duration::from_secs(args.timeout), async {
            tokio::join!(child.wait(), read_pipe(&mut stdout), read_pipe(&mut stderr))
        })
        .await;

        let (status, stdout, stderr) = match completed {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    "[shell] `{}` timed out after {}s, killing process group {pid:?}",
                    args.command, args.timeout
                );
                kill_process_group(pid, &mut child);
                let _ = child.wait().await;
                return Ok(ToolResult::error(format!(
                    "Command timed out after {} seconds.",
                    args.timeout
                )));
            }
        };

        let status = status.map_err(ToolError::Spawn)?;
        let exit_code = status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&stdout);
        let stderr = String::from_utf8_lossy(&stderr);

        let output = truncate_result(
            format_output(&stdout, &stderr, exit_code),
            self.max_result_bytes,
        );

        let mut result = if exit_code == 0 {
            ToolResult::success(output)
        } else {
            let error = if stderr.trim().is_empty() {
                format!("Command exited with code {exit_code}")
            } else {
                stderr.into_owned()
            };
            ToolResult::error(error).with_output(output)
        };
        result = result.with_exit_code(exit_code);
        Ok(result)
    }
}

impl Default for ShellTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for ShellTool {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(SHELL)
            .purpose("Run a shell command and return its output")
            .when_to_use(
                "When you need an operation not covered by other tools: builds, tests, \
                 git commands, package managers, data processing",
            )
            .when_not_to_use(
                "When a dedicated tool exists for the task. Use read_file to read files, \
                 edit to change them, grep to search content, list_dir to browse",
            )
            .parameters_for::<ShellArgs>()
            .example(
                "shell(command='cargo test', timeout=300)",
                "Runs the test suite and returns its output and exit code",
            )
            .output_format(
                "Command stdout, then stderr after a '--- stderr ---' line if non-empty, \
                 then 'Exit code: N' if non-zero",
            )
            .to_tool_def()
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Shell
    }

    fn confirmation<'a>(
        &'a self,
        invocation: &'a ToolInvocation,
    ) -> ToolFuture<'a, Option<ToolConfirmation>> {
        Box::pin(async move {
            let args: ShellArgs = invocation.parse().ok()?;
            let dangerous = self.matches_blocked(&args.command);
            let description = if dangerous {
                format!("Execute (BLOCKED): {}", args.command)
            } else {
                format!("Execute: {}", args.command)
            };
            Some(
                ToolConfirmation::new(SHELL, invocation.params.clone(), description)
                    .with_command(args.command)
                    .dangerous(dangerous),
            )
        })
    }

    fn execute<'a>(
        &'a self,
        invocation: &'a ToolInvocation,
    ) -> ToolFuture<'a, Result<ToolResult, ToolError>> {
        Box::pin(async move {
            let args: ShellArgs = invocation.parse()?;
            self.run(args, invocation).await
        })
    }
}

// ── Process helpers ─────────────────────────────────────────────────

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command).process_group(0);
    cmd
}

#[cfg(not(unix))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Kill the child's whole process group. The child leads its own group
/// (`process_group(0)`), so its pid is the group id.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>, child: &mut Child) {
    match pid.and_then(|p| libc::pid_t::try_from(p).ok()) {
        Some(pgid) => {
            // SAFETY: killpg has no memory-safety preconditions.
            let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
            if rc != 0 {
                warn!(
                    "[shell] killpg({pgid}) failed: {}",
                    std::io::Error::last_os_error()
                );
                let _ = child.start_kill();
            }
        }
        None => {
            let _ = child.start_kill();
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>, child: &mut Child) {
    let _ = child.start_kill();
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: &mut Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(pipe) = pipe.as_mut()
        && let Err(e) = pipe.read_to_end(&mut buf).await
    {
        debug!("[shell] pipe read failed: {e}");
    }
    buf
}

/// Compose the model-facing output from captured streams.
fn format_output(stdout: &str, stderr: &str, exit_code: i32) -> String {
    let mut output = String::new();
    if !stdout.trim().is_empty() {
        output.push_str(stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        output.push_str("\n--- stderr ---\n");
        output.push_str(stderr.trim_end());
    }
    if exit_code != 0 {
        output.push_str(&format!("\nExit code: {exit_code}"));
    }
    output
}

// ── Environment ─────────────────────────────────────────────────────

/// Build a child environment from `base` under `policy`.
///
/// Variables whose names match an exclude pattern (glob, case-insensitive)
/// are dropped unless `ignore_default_excludes` is set. `set_vars` is
/// applied last and always wins.
pub fn build_environment<I>(policy: &ShellEnvironmentPolicy, base: I) -> HashMap<OsString, OsString>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut env: HashMap<OsString, OsString> = base.into_iter().collect();

    if !policy.ignore_default_excludes {
        let patterns: Vec<String> = policy
            .exclude_patterns
            .iter()
            .map(|p| p.to_uppercase())
            .collect();
        env.retain(|key, _| {
            let key = key.to_string_lossy().to_uppercase();
            !patterns.iter().any(|p| env_glob_matches(p, &key))
        });
    }

    for (key, value) in &policy.set_vars {
        env.insert(OsString::from(key), OsString::from(value));
    }
    env
}

/// Glob match for variable names. `*` matches any run of characters, `?`
/// matches exactly one; everything else is literal.
fn env_glob_matches(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    let mut pi = 0;
    let mut ni = 0;
    // Backtracking point for the last `*`.
    let mut star_pi = usize::MAX;
    let mut star_ni = 0;

    while ni < name.len() {
        if pi < pattern.len() && pattern[pi] == '*' {
            star_pi = pi;
            star_ni = ni;
            pi += 1;
            continue;
        }
        if pi < pattern.len() && (pattern[pi] == '?' || pattern[pi] == name[ni]) {
            pi += 1;
            ni += 1;
            continue;
        }
        if star_pi != usize::MAX {
            star_ni += 1;
            ni = star_ni;
            pi = star_pi + 1;
            continue;
        }
        return false;
    }

    while pi < pattern.len() && pattern[pi] == '*' {
        pi += 1;
    }
    pi == pattern.len()
}

// ── Tests ───────────────────────────────────────────────────────────
