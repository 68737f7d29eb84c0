//! Session configuration for the command-line driver.
//!
//! [`CodeConfig`] pairs the library's [`AgentConfig`] with the choices that
//! only matter to a terminal session (working directory, approval policy)
//! and turns them into a registry and an approval manager.

use std::path::{Path, PathBuf};

use tack_rs::approval::{ApprovalPolicy, PolicyApprovalManager};
use tack_rs::config::AgentConfig;
use tack_rs::error::ConfigError;
use tack_rs::tools::core::ToolRegistry;
use tracing::debug;

use crate::confirm::prompt_on_terminal;

/// Configuration for one `tack-code` session.
#[derive(Debug, Clone)]
pub struct CodeConfig {
    pub agent: AgentConfig,
    /// Approval policy applied to every invocation. Default: `on_mutation`.
    pub policy: ApprovalPolicy,
    /// Directory tool paths resolve against. Default: `"."`.
    pub workdir: PathBuf,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            policy: ApprovalPolicy::default(),
            workdir: PathBuf::from("."),
        }
    }
}

impl CodeConfig {
    /// Load the agent configuration from `path` when given, otherwise use
    /// defaults. The result is validated either way.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let agent = match path {
            Some(p) => {
                debug!("Loading agent config from {}", p.display());
                AgentConfig::load(p)?
            }
            None => AgentConfig::default(),
        };
        agent.validate()?;
        Ok(Self {
            agent,
            ..Self::default()
        })
    }

    pub fn with_policy(mut self, policy: ApprovalPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the working directory, canonicalized when it exists.
    pub fn with_workdir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.workdir = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        self
    }

    /// Registry with every built-in tool, honoring the allow-list.
    pub fn build_registry(&self) -> ToolRegistry {
        ToolRegistry::with_builtin_tools(&self.agent)
    }

    /// Approval manager for this session. With `assume_yes` every call that
    /// is not dangerous is approved without prompting; otherwise the policy
    /// decides and confirmations are asked on the terminal.
    pub fn build_approvals(&self, assume_yes: bool) -> PolicyApprovalManager {
        if assume_yes {
            PolicyApprovalManager::auto()
        } else {
            PolicyApprovalManager::new(self.policy, prompt_on_terminal)
        }
    }
}
