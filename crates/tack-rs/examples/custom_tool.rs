//! Defining a tool of your own and running it through the same pipeline as
//! the built-in tools.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example custom_tool
//! ```

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use tack_rs::prelude::*;
use tack_rs::schemars;

/// Arguments for `save_note`.
#[derive(Deserialize, JsonSchema)]
struct SaveNoteArgs {
    /// Title for the note, used as the file name.
    title: String,
    /// Note content (markdown).
    content: String,
}

/// Writes notes under `notes/` in the working directory.
struct SaveNote;

impl Tool for SaveNote {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder("save_note")
            .purpose("Save a markdown note to the notebook")
            .when_to_use("When the user asks to save, remember, or write down something")
            .when_not_to_use("When the user is only asking a question")
            .parameters_for::<SaveNoteArgs>()
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
            let args: SaveNoteArgs = invocation.parse().ok()?;
            let path = invocation.cwd.join("notes").join(format!("{}.md", args.title));
            Some(
                ToolConfirmation::new("save_note", invocation.params.clone(), "Save note")
                    .with_diff(FileDiff::created(&path, args.content))
                    .with_affected_path(&path),
            )
        })
    }

    fn execute<'a>(
        &'a self,
        invocation: &'a ToolInvocation,
    ) -> ToolFuture<'a, Result<ToolResult, ToolError>> {
        Box::pin(async move {
            let args: SaveNoteArgs = invocation.parse()?;
            let dir = invocation.cwd.join("notes");
            let path = dir.join(format!("{}.md", args.title));
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| ToolError::io(&dir, e))?;
            tokio::fs::write(&path, &args.content)
                .await
                .map_err(|e| ToolError::io(&path, e))?;
            Ok(ToolResult::success(format!(
                "Saved note '{}' ({} bytes)",
                args.title,
                args.content.len()
            )))
        })
    }
}

#[tokio::main]
async fn main() {
    let workdir = std::env::temp_dir().join("tack-custom-tool");
    let registry = ToolRegistry::new().with(SaveNote);

    // Ask on stdout, approve everything: the diff is what a user would see.
    let approvals = PolicyApprovalManager::new(ApprovalPolicy::OnMutation, |c| {
        println!("{}\n{}", c.description, c.diff.as_ref().map(FileDiff::to_unified).unwrap_or_default());
        true
    });

    let result = registry
        .invoke(
            "save_note",
            json!({"title": "ephemeral", "content": "lasting for a very short time\n"}),
            &workdir,
            Some(&approvals),
        )
        .await;
    println!("{}", result.to_model_output());

    let invalid = registry
        .invoke("save_note", json!({"title": 7}), &workdir, Some(&approvals))
        .await;
    println!("{}", invalid.to_model_output());
}
