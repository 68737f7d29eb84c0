//! Terminal confirmation prompt.
//!
//! Prompts go to stderr so stdout stays reserved for the JSON result.

use std::io::{self, BufRead, Write};

use tack_rs::tools::types::ToolConfirmation;

/// Diff lines shown before the preview is cut.
const MAX_DIFF_PREVIEW_LINES: usize = 200;

const RULE: &str = "────────────────────────────────────────────────────";

/// Render the block shown above the `[y/N]` question.
pub fn render_confirmation(confirmation: &ToolConfirmation) -> String {
    let mut out = String::from("\n─── Confirmation required ──────────────────────────\n");
    out.push_str(&format!("  Tool: {}\n", confirmation.tool_name));
    out.push_str(&format!("  Action: {}\n", confirmation.description));
    if let Some(command) = &confirmation.command {
        out.push_str(&format!("  Command: {command}\n"));
    }
    for path in &confirmation.affected_paths {
        out.push_str(&format!("  Path: {}\n", path.display()));
    }
    if let Some(diff) = &confirmation.diff {
        let unified = diff.to_unified();
        let total = unified.lines().count();
        for line in unified.lines().take(MAX_DIFF_PREVIEW_LINES) {
            out.push_str(line);
            out.push('\n');
        }
        if total > MAX_DIFF_PREVIEW_LINES {
            out.push_str(&format!(
                "  ... {} more diff lines\n",
                total - MAX_DIFF_PREVIEW_LINES
            ));
        }
    }
    out.push_str(RULE);
    out.push('\n');
    out
}

/// Whether a typed answer means yes. Anything but `y`/`yes` is a no.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Show `confirmation` on `output` and read the answer from `input`.
/// Write or read failures count as a refusal.
pub fn prompt_with<R: BufRead, W: Write>(
    confirmation: &ToolConfirmation,
    input: &mut R,
    output: &mut W,
) -> bool {
    let shown = output
        .write_all(render_confirmation(confirmation).as_bytes())
        .and_then(|()| output.write_all(b"  Proceed? [y/N]: "))
        .and_then(|()| output.flush());
    if shown.is_err() {
        return false;
    }

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(0) | Err(_) => false,
        Ok(_) => is_affirmative(&answer),
    }
}

/// Ask on the controlling terminal (stderr out, stdin in).
pub fn prompt_on_terminal(confirmation: &ToolConfirmation) -> bool {
    let stdin = io::stdin();
    let stderr = io::stderr();
    prompt_with(confirmation, &mut stdin.lock(), &mut stderr.lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;
    use tack_rs::tools::types::FileDiff;

    fn shell_confirmation() -> ToolConfirmation {
        ToolConfirmation::new("shell", json!({"command": "make"}), "Execute: make")
            .with_command("make")
    }

    #[test]
    fn answers() {
        assert!(is_affirmative("y\n"));
        assert!(is_affirmative("  YES "));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative("yep"));
    }

    #[test]
    fn render_includes_command_and_diff() {
        let conf = ToolConfirmation::new("edit", json!({}), "Edit file: /w/a.txt")
            .with_affected_path("/w/a.txt")
            .with_diff(FileDiff::new("/w/a.txt", "old\n", "new\n"));
        let text = render_confirmation(&conf);
        assert!(text.contains("  Tool: edit\n"));
        assert!(text.contains("  Path: /w/a.txt\n"));
        assert!(text.contains("-old\n+new\n"));

        let text = render_confirmation(&shell_confirmation());
        assert!(text.contains("  Command: make\n"));
    }

    #[test]
    fn prompt_reads_answer() {
        let mut out = Vec::new();
        assert!(prompt_with(&shell_confirmation(), &mut Cursor::new("y\n"), &mut out));
        let shown = String::from_utf8(out).unwrap();
        assert!(shown.ends_with("Proceed? [y/N]: "));

        let mut out = Vec::new();
        assert!(!prompt_with(&shell_confirmation(), &mut Cursor::new("\n"), &mut out));
    }

    #[test]
    fn closed_input_is_refusal() {
        let mut out = Vec::new();
        assert!(!prompt_with(&shell_confirmation(), &mut Cursor::new(""), &mut out));
    }
}
