//! One stored turn of dialogue.

use crate::{Message, MessageRole, ToolCall};

/// A stored conversation entry with its token count.
///
/// `token_count` is computed once when the entry is created and never
/// recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationEntry {
    pub role: MessageRole,
    pub content: String,
    /// Set only on tool-result entries.
    pub tool_call_id: Option<String>,
    /// Set only on assistant entries that request tool use.
    pub tool_calls: Vec<ToolCall>,
    pub token_count: usize,
}

impl ConversationEntry {
    pub fn user(content: impl Into<String>, token_count: usize) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            tool_call_id: None,
            tool_calls: Vec::new(),
            token_count,
        }
    }

    pub fn assistant(
        content: impl Into<String>,
        tool_calls: Vec<ToolCall>,
        token_count: usize,
    ) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            tool_call_id: None,
            tool_calls,
            token_count,
        }
    }

    pub fn tool_result(
        call_id: impl Into<String>,
        content: impl Into<String>,
        token_count: usize,
    ) -> Self {
        Self {
            role: MessageRole::Tool,
            content: content.into(),
            tool_call_id: Some(call_id.into()),
            tool_calls: Vec::new(),
            token_count,
        }
    }

    /// Render as a wire message. Empty content and empty tool-call lists are
    /// omitted.
    pub fn to_message(&self) -> Message {
        Message {
            role: self.role,
            content: (!self.content.is_empty()).then(|| self.content.clone()),
            tool_calls: (!self.tool_calls.is_empty()).then(|| self.tool_calls.clone()),
            tool_call_id: self.tool_call_id.clone().filter(|id| !id.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_call_only_assistant_has_no_content() {
        let entry = ConversationEntry::assistant(
            "",
            vec![ToolCall::function("c1", "shell", r#"{"command":"ls"}"#)],
            0,
        );
        let msg = entry.to_message();
        assert!(msg.content.is_none());
        assert_eq!(msg.tool_calls.as_ref().map(Vec::len), Some(1));

        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("content").is_none());
    }

    #[test]
    fn tool_result_carries_call_id() {
        let msg = ConversationEntry::tool_result("c1", "ok", 1).to_message();
        assert_eq!(msg.role, MessageRole::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("c1"));
        assert!(msg.tool_calls.is_none());
    }

    #[test]
    fn user_entry_renders_content_only() {
        let json = serde_json::to_value(ConversationEntry::user("hi", 1).to_message()).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }
}
