//! End-to-end tests for the invocation pipeline with the built-in tools.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::json;
use tack_rs::prelude::*;

fn registry(config: &AgentConfig) -> ToolRegistry {
    ToolRegistry::with_builtin_tools(config)
}

#[test]
fn schema_lists_builtin_tools_in_name_order() {
    let names: Vec<String> = registry(&AgentConfig::default())
        .get_schema()
        .into_iter()
        .map(|d| d.function.name)
        .collect();
    assert_eq!(
        names,
        ["edit", "grep", "list_dir", "read_file", "shell", "write_file"]
    );
}

#[tokio::test]
async fn allow_list_hides_and_refuses_tools() {
    let config = AgentConfig::default().with_allowed_tools(["read_file", "list_dir"]);
    let registry = registry(&config);
    assert_eq!(registry.get_schema().len(), 2);

    let dir = tempfile::tempdir().unwrap();
    let result = registry
        .invoke("shell", json!({"command": "echo hi"}), dir.path(), None)
        .await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Unknown tool: shell"));
}

#[tokio::test]
async fn invalid_parameters_have_no_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let approvals = PolicyApprovalManager::new(ApprovalPolicy::Always, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        true
    });

    let result = registry(&AgentConfig::default())
        .invoke("edit", json!({"path": "new.txt"}), dir.path(), Some(&approvals))
        .await;

    assert!(!result.success);
    assert!(result.error.unwrap_or_default().starts_with("Invalid parameters: "));
    assert!(result.metadata["validation_errors"].as_array().is_some_and(|e| !e.is_empty()));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join("new.txt").exists());
}

#[tokio::test]
async fn blocked_command_refused_without_approval_manager() {
    let dir = tempfile::tempdir().unwrap();
    let config = AgentConfig::default().block_command("touch");
    let result = registry(&config)
        .invoke("shell", json!({"command": "TOUCH=1; touch marker.txt"}), dir.path(), None)
        .await;

    assert!(!result.success);
    assert_eq!(result.metadata["blocked"], true);
    assert!(!dir.path().join("marker.txt").exists());
}

#[tokio::test]
async fn dangerous_call_rejected_before_confirmer() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let approvals = PolicyApprovalManager::new(ApprovalPolicy::Auto, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        true
    });
    let config = AgentConfig::default().block_command("touch");

    let result = registry(&config)
        .invoke("shell", json!({"command": "touch marker.txt"}), dir.path(), Some(&approvals))
        .await;

    assert_eq!(result.error.as_deref(), Some("Operation rejected by safety policy"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join("marker.txt").exists());
}

#[tokio::test]
async fn declined_edit_leaves_file_and_shows_diff() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.rs");
    std::fs::write(&path, "fn main() {\n    println!(\"hi\");\n}\n").unwrap();

    let seen: Arc<Mutex<Option<ToolConfirmation>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&seen);
    let approvals = PolicyApprovalManager::new(ApprovalPolicy::OnMutation, move |c| {
        *slot.lock().unwrap() = Some(c.clone());
        false
    });

    let result = registry(&AgentConfig::default())
        .invoke(
            "edit",
            json!({"path": "main.rs", "old_string": "\"hi\"", "new_string": "\"bye\""}),
            dir.path(),
            Some(&approvals),
        )
        .await;

    assert_eq!(result.error.as_deref(), Some("User rejected the operation"));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "fn main() {\n    println!(\"hi\");\n}\n"
    );

    let confirmation = seen.lock().unwrap().take().unwrap();
    assert_eq!(confirmation.affected_paths, vec![path.clone()]);
    let preview = confirmation.diff.unwrap().to_unified();
    assert!(preview.contains("-    println!(\"hi\");"));
    assert!(preview.contains("+    println!(\"bye\");"));
}

#[tokio::test]
async fn approved_edit_flows_into_context() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "alpha\nbeta\n").unwrap();
    let config = AgentConfig::default();
    let approvals = PolicyApprovalManager::new(ApprovalPolicy::OnMutation, |_| true);

    let mut context = ContextManager::new(&config, "You are a coding agent.");
    context.add_user_message("Rename beta to gamma.");
    context.add_assistant_message(
        "",
        vec![ToolCall::function(
            "call_1",
            "edit",
            r#"{"path":"a.txt","old_string":"beta","new_string":"gamma"}"#,
        )],
    );

    let result = registry(&config)
        .invoke(
            "edit",
            json!({"path": "a.txt", "old_string": "beta", "new_string": "gamma"}),
            dir.path(),
            Some(&approvals),
        )
        .await;
    assert!(result.success, "{:?}", result.error);
    context.add_tool_result("call_1", result.to_model_output());

    assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "alpha\ngamma\n");
    let messages = context.get_messages();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[3].role, MessageRole::Tool);
    assert_eq!(messages[3].tool_call_id.as_deref(), Some("call_1"));
}

#[tokio::test]
async fn read_only_policy_rejects_writes_but_allows_reads() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "content\n").unwrap();
    let approvals = PolicyApprovalManager::new(ApprovalPolicy::ReadOnly, |_| true);
    let registry = registry(&AgentConfig::default());

    let write = registry
        .invoke(
            "write_file",
            json!({"path": "a.txt", "content": "clobbered"}),
            dir.path(),
            Some(&approvals),
        )
        .await;
    assert!(!write.success);
    assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "content\n");

    let read = registry
        .invoke("read_file", json!({"path": "a.txt"}), dir.path(), Some(&approvals))
        .await;
    assert!(read.success);
    assert!(read.output.contains("content"));
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn timeout_kills_background_descendants() {
    let dir = tempfile::tempdir().unwrap();
    let result = registry(&AgentConfig::default())
        .invoke(
            "shell",
            json!({"command": "sleep 60 & echo $! > bg.pid; wait", "timeout": 1}),
            dir.path(),
            None,
        )
        .await;
    assert_eq!(result.error.as_deref(), Some("Command timed out after 1 seconds."));

    let pid = std::fs::read_to_string(dir.path().join("bg.pid")).unwrap();
    let stat_path = format!("/proc/{}/stat", pid.trim());

    // The orphaned sleep may linger as a zombie until its new parent reaps it.
    let mut gone = false;
    for _ in 0..50 {
        match std::fs::read_to_string(&stat_path) {
            Err(_) => {
                gone = true;
                break;
            }
            Ok(stat) => {
                let state = stat.rsplit_once(") ").and_then(|(_, rest)| rest.chars().next());
                if state == Some('Z') {
                    gone = true;
                    break;
                }
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(gone, "background process survived the timeout");
}
