//! A driving loop without a model: canned tool calls go through the
//! registry, results land in the context, and history is compacted once the
//! reported usage crosses the threshold.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example scripted_session
//! ```

use serde_json::json;
use tack_rs::prelude::*;

#[tokio::main]
async fn main() -> Result<(), String> {
    let workdir = std::env::temp_dir().join("tack-scripted-session");
    std::fs::create_dir_all(&workdir).map_err(|e| e.to_string())?;

    // A small window so the demo reaches the compaction threshold.
    let config = AgentConfig::default().with_context_window(1_000);
    let registry = ToolRegistry::with_builtin_tools(&config);
    let approvals = PolicyApprovalManager::auto();
    let mut context = ContextManager::new(&config, "You are a coding agent.");

    context.add_user_message("Create a greeting file and show me what it says.");

    // What a model might have asked for, one call per turn.
    let turns = [
        ("edit", json!({"path": "hello.txt", "new_string": "hello\n"})),
        ("edit", json!({"path": "hello.txt", "old_string": "hello", "new_string": "hello, world"})),
        ("shell", json!({"command": "cat hello.txt"})),
    ];

    for (i, (name, params)) in turns.into_iter().enumerate() {
        let call_id = format!("call_{i}");
        context.add_assistant_message(
            "",
            vec![ToolCall::function(&call_id, name, params.to_string())],
        );

        let result = registry.invoke(name, params, &workdir, Some(&approvals)).await;
        println!("{name}: {}", result.to_model_output());
        context.add_tool_result(&call_id, result.to_model_output());

        // Pretend the model reported its usage for this turn.
        let usage = TokenUsage::new(300 * (i as u64 + 1), 40);
        context.set_latest_usage(usage);
        context.add_usage(usage);

        if context.needs_compression() {
            println!("-- compacting {} entries --", context.message_count());
            context.replace_with_summary(
                "Created hello.txt and changed its content to 'hello, world'.",
            );
        }
    }

    println!(
        "\n{} messages in context | {}",
        context.get_messages().len(),
        context.total_usage().summary()
    );
    Ok(())
}
