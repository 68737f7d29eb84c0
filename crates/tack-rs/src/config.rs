//! Agent configuration consumed by the tool pipeline and context manager.
//!
//! [`AgentConfig`] is read-only from this crate's point of view: a loader
//! (the `tack-code` binary, or your own) builds it once and hands references
//! to the [`ToolRegistry`](crate::tools::core::ToolRegistry) and
//! [`ContextManager`](crate::context::ContextManager). Every field has a
//! default, so a partial JSON file is a valid config.
//!
//! # Example JSON
//!
//! ```json
//! {
//!   "model": { "name": "gpt-4o", "context_window": 128000 },
//!   "allowed_tools": ["read_file", "edit", "shell"],
//!   "shell_environment": {
//!     "exclude_patterns": ["*KEY*", "*TOKEN*"],
//!     "set_vars": { "PAGER": "cat" }
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tools::shell::DEFAULT_BLOCKED_COMMANDS;

/// Default model name.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default context window size in tokens.
pub const DEFAULT_CONTEXT_WINDOW: usize = 128_000;

/// Environment variable name patterns stripped from shell subprocesses by default.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &["*KEY*", "*SECRET*", "*TOKEN*"];

/// Model selection and context window size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model name. Also keys the tokenizer used for entry token counts.
    pub name: String,
    /// Context window size in tokens.
    pub context_window: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
            context_window: DEFAULT_CONTEXT_WINDOW,
        }
    }
}

/// How the shell tool builds the environment of the commands it spawns.
///
/// The inherited environment is filtered by `exclude_patterns` (glob,
/// case-insensitive) unless `ignore_default_excludes` is set, then
/// `set_vars` is applied on top. Explicit variables always win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellEnvironmentPolicy {
    pub ignore_default_excludes: bool,
    pub exclude_patterns: Vec<String>,
    pub set_vars: HashMap<String, String>,
}

impl Default for ShellEnvironmentPolicy {
    fn default() -> Self {
        Self {
            ignore_default_excludes: false,
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            set_vars: HashMap::new(),
        }
    }
}

/// Top-level agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub model: ModelConfig,
    /// When set, only tools named here are exported and invokable through
    /// [`ToolRegistry::get_tools`](crate::tools::core::ToolRegistry::get_tools).
    /// An empty list restricts nothing.
    pub allowed_tools: Option<Vec<String>>,
    pub shell_environment: ShellEnvironmentPolicy,
    /// Substrings that make a shell command unconditionally blocked.
    pub blocked_commands: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            allowed_tools: None,
            shell_environment: ShellEnvironmentPolicy::default(),
            blocked_commands: DEFAULT_BLOCKED_COMMANDS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

impl AgentConfig {
    /// Load a config from a JSON file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.name.trim().is_empty() {
            return Err(ConfigError::Invalid("model.name must not be empty".into()));
        }
        if self.model.context_window == 0 {
            return Err(ConfigError::Invalid(
                "model.context_window must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Set the model name.
    pub fn with_model(mut self, name: impl Into<String>) -> Self {
        self.model.name = name.into();
        self
    }

    /// Set the context window size in tokens.
    pub fn with_context_window(mut self, tokens: usize) -> Self {
        self.model.context_window = tokens;
        self
    }

    /// Restrict exported tools to the given names.
    pub fn with_allowed_tools<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the shell environment policy.
    pub fn with_shell_environment(mut self, policy: ShellEnvironmentPolicy) -> Self {
        self.shell_environment = policy;
        self
    }

    /// Add a single blocked shell command pattern.
    pub fn block_command(mut self, pattern: impl Into<String>) -> Self {
        self.blocked_commands.push(pattern.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.model.name, DEFAULT_MODEL);
        assert_eq!(config.model.context_window, DEFAULT_CONTEXT_WINDOW);
        assert!(config.allowed_tools.is_none());
        assert!(!config.shell_environment.ignore_default_excludes);
        assert_eq!(config.shell_environment.exclude_patterns.len(), 3);
        assert!(config.blocked_commands.contains(&"rm -rf /".to_string()));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: AgentConfig =
            serde_json::from_str(r#"{"model": {"context_window": 8000}}"#).unwrap();
        assert_eq!(config.model.context_window, 8000);
        assert_eq!(config.model.name, DEFAULT_MODEL);
        assert!(!config.blocked_commands.is_empty());
    }

    #[test]
    fn builder_methods() {
        let config = AgentConfig::default()
            .with_model("small-model")
            .with_context_window(1000)
            .with_allowed_tools(["read_file", "shell"])
            .block_command("drop database");
        assert_eq!(config.model.name, "small-model");
        assert_eq!(config.model.context_window, 1000);
        assert_eq!(
            config.allowed_tools,
            Some(vec!["read_file".to_string(), "shell".to_string()])
        );
        assert!(config.blocked_commands.contains(&"drop database".to_string()));
    }

    #[test]
    fn validate_rejects_zero_window() {
        let config = AgentConfig::default().with_context_window(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_reads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.json");
        std::fs::write(
            &path,
            r#"{"allowed_tools": ["edit"], "shell_environment": {"set_vars": {"PAGER": "cat"}}}"#,
        )
        .unwrap();

        let config = AgentConfig::load(&path).unwrap();
        assert_eq!(config.allowed_tools, Some(vec!["edit".to_string()]));
        assert_eq!(
            config.shell_environment.set_vars.get("PAGER").map(String::as_str),
            Some("cat")
        );
    }

    #[test]
    fn load_reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = AgentConfig::load(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert!(matches!(
            AgentConfig::load(&bad),
            Err(ConfigError::Parse { .. })
        ));
    }
}
