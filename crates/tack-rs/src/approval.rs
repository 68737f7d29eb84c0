//! Safety approval for tool calls.
//!
//! The registry asks an [`ApprovalManager`] about every call whose tool
//! produced a [`ToolConfirmation`]. The manager answers in two steps:
//!
//! 1. [`check_approval`](ApprovalManager::check_approval) is a fast, pure
//!    policy decision. It never blocks on a human.
//! 2. [`request_confirmation`](ApprovalManager::request_confirmation) is
//!    only reached on [`ApprovalDecision::NeedsConfirmation`] and is the one
//!    place allowed to wait for a person (terminal prompt, UI dialog).
//!
//! [`PolicyApprovalManager`] is a ready-made implementation driven by an
//! [`ApprovalPolicy`] and a confirmer closure.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::tools::{ToolConfirmation, ToolFuture};

// ── Types ──────────────────────────────────────────────────────────

/// What the approval manager sees about a pending call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalContext {
    pub tool_name: String,
    pub params: Value,
    pub is_mutating: bool,
    pub affected_paths: Vec<PathBuf>,
    pub command: Option<String>,
    pub is_dangerous: bool,
}

impl ApprovalContext {
    /// Build a context from a tool's confirmation and its mutating flag.
    pub fn from_confirmation(confirmation: &ToolConfirmation, is_mutating: bool) -> Self {
        Self {
            tool_name: confirmation.tool_name.clone(),
            params: confirmation.params.clone(),
            is_mutating,
            affected_paths: confirmation.affected_paths.clone(),
            command: confirmation.command.clone(),
            is_dangerous: confirmation.is_dangerous,
        }
    }
}

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    /// Run without asking anyone.
    Approved,
    /// Refuse. Execution never starts.
    Rejected,
    /// Ask a human via [`ApprovalManager::request_confirmation`].
    NeedsConfirmation,
}

// ── ApprovalManager trait ──────────────────────────────────────────

/// Policy and confirmation gate consulted by the tool registry.
pub trait ApprovalManager: Send + Sync {
    /// Decide what to do with a call. Must not block.
    fn check_approval(&self, context: &ApprovalContext) -> ApprovalDecision;

    /// Ask for a human decision. Returns `true` to proceed.
    fn request_confirmation<'a>(&'a self, confirmation: &'a ToolConfirmation)
    -> ToolFuture<'a, bool>;
}

// ── PolicyApprovalManager ──────────────────────────────────────────

/// When [`PolicyApprovalManager`] asks for confirmation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalPolicy {
    /// Approve everything that is not dangerous.
    Auto,
    /// Ask before mutating calls; approve reads.
    #[default]
    OnMutation,
    /// Ask before every call that produced a confirmation.
    Always,
    /// Reject mutating calls outright; approve reads.
    ReadOnly,
}

impl fmt::Display for ApprovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApprovalPolicy::Auto => "auto",
            ApprovalPolicy::OnMutation => "on_mutation",
            ApprovalPolicy::Always => "always",
            ApprovalPolicy::ReadOnly => "read_only",
        };
        f.write_str(s)
    }
}

type Confirmer = Arc<dyn Fn(&ToolConfirmation) -> bool + Send + Sync>;

/// Approval manager driven by an [`ApprovalPolicy`].
///
/// Dangerous calls are always rejected regardless of policy. Confirmations
/// are serialized so at most one prompt is open at a time, and the confirmer
/// runs on the blocking thread pool so a terminal `read_line` does not stall
/// the async runtime.
///
/// # Example
///
/// ```ignore
/// let approvals = PolicyApprovalManager::new(ApprovalPolicy::OnMutation, |c| {
///     eprintln!("{}", c.description);
///     true
/// });
/// ```
pub struct PolicyApprovalManager {
    policy: ApprovalPolicy,
    confirmer: Confirmer,
    prompt_lock: tokio::sync::Mutex<()>,
}

impl PolicyApprovalManager {
    pub fn new<F>(policy: ApprovalPolicy, confirmer: F) -> Self
    where
        F: Fn(&ToolConfirmation) -> bool + Send + Sync + 'static,
    {
        Self {
            policy,
            confirmer: Arc::new(confirmer),
            prompt_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// A manager that approves every non-dangerous call without prompting.
    pub fn auto() -> Self {
        Self::new(ApprovalPolicy::Auto, |_| true)
    }

    pub fn policy(&self) -> ApprovalPolicy {
        self.policy
    }
}

impl fmt::Debug for PolicyApprovalManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyApprovalManager")
            .field("policy", &self.policy)
            .finish()
    }
}

impl ApprovalManager for PolicyApprovalManager {
    fn check_approval(&self, context: &ApprovalContext) -> ApprovalDecision {
        if context.is_dangerous {
            warn!(
                "[approval] rejecting dangerous call to {} ({})",
                context.tool_name,
                context.command.as_deref().unwrap_or("no command")
            );
            return ApprovalDecision::Rejected;
        }

        let decision = match (self.policy, context.is_mutating) {
            (ApprovalPolicy::Auto, _) => ApprovalDecision::Approved,
            (ApprovalPolicy::Always, _) => ApprovalDecision::NeedsConfirmation,
            (ApprovalPolicy::OnMutation, true) => ApprovalDecision::NeedsConfirmation,
            (ApprovalPolicy::ReadOnly, true) => ApprovalDecision::Rejected,
            (ApprovalPolicy::OnMutation | ApprovalPolicy::ReadOnly, false) => {
                ApprovalDecision::Approved
            }
        };
        debug!(
            "[approval] {} under {} policy: {decision:?}",
            context.tool_name, self.policy
        );
        decision
    }

    fn request_confirmation<'a>(
        &'a self,
        confirmation: &'a ToolConfirmation,
    ) -> ToolFuture<'a, bool> {
        Box::pin(async move {
            let _guard = self.prompt_lock.lock().await;
            let confirmer = Arc::clone(&self.confirmer);
            let confirmation = confirmation.clone();
            match tokio::task::spawn_blocking(move || confirmer(&confirmation)).await {
                Ok(approved) => approved,
                Err(e) => {
                    warn!("[approval] confirmer failed: {e}");
                    false
                }
            }
        })
    }
}
