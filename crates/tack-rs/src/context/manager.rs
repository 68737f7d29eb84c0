//! The canonical conversation sent to the model.

use std::fmt;

use tracing::debug;

use super::entry::ConversationEntry;
use super::tokens::{CharEstimateCounter, TokenCounter};
use super::usage::TokenUsage;
use crate::config::AgentConfig;
use crate::{Message, ToolCall};

/// Compaction triggers when the latest reported usage exceeds this share of
/// the context window, expressed as `NUMERATOR / DENOMINATOR` so the
/// comparison is exact in integers.
const COMPACTION_NUMERATOR: u128 = 4;
const COMPACTION_DENOMINATOR: u128 = 5;

/// Owns the ordered conversation, usage counters and compaction.
///
/// Entries are only ever appended, or replaced wholesale by
/// [`replace_with_summary`](Self::replace_with_summary). Mutation takes
/// `&mut self`, so a driving loop that shares the manager must serialize
/// turns itself.
///
/// # Example
///
/// ```ignore
/// let mut context = ContextManager::new(&config, system_prompt);
/// context.add_user_message("Fix the failing test.");
///
/// let response = client.chat(context.get_messages()).await?;
/// context.set_latest_usage(response.usage);
/// context.add_usage(response.usage);
///
/// if context.needs_compression() {
///     let summary = summarize(&context.get_messages()).await?;
///     context.replace_with_summary(&summary);
/// }
/// ```
pub struct ContextManager {
    system_prompt: String,
    model_name: String,
    context_window: usize,
    entries: Vec<ConversationEntry>,
    latest_usage: TokenUsage,
    total_usage: TokenUsage,
    counter: Box<dyn TokenCounter>,
}

impl fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextManager")
            .field("model_name", &self.model_name)
            .field("context_window", &self.context_window)
            .field("entries", &self.entries.len())
            .field("latest_usage", &self.latest_usage)
            .field("total_usage", &self.total_usage)
            .finish()
    }
}

impl ContextManager {
    /// Create a manager for the configured model, counting tokens with
    /// [`CharEstimateCounter`] until another counter is supplied.
    pub fn new(config: &AgentConfig, system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            model_name: config.model.name.clone(),
            context_window: config.model.context_window,
            entries: Vec::new(),
            latest_usage: TokenUsage::default(),
            total_usage: TokenUsage::default(),
            counter: Box::new(CharEstimateCounter::new()),
        }
    }

    /// Replace the token counter. Affects entries added afterwards only.
    pub fn with_token_counter(mut self, counter: impl TokenCounter + 'static) -> Self {
        self.counter = Box::new(counter);
        self
    }

    fn count(&self, text: &str) -> usize {
        self.counter.count(text, &self.model_name)
    }

    // ── Appending ──────────────────────────────────────────────────

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        let content = content.into();
        let tokens = self.count(&content);
        self.entries.push(ConversationEntry::user(content, tokens));
    }

    /// Append an assistant turn. `content` may be empty when the turn only
    /// requests tool calls.
    pub fn add_assistant_message(&mut self, content: impl Into<String>, tool_calls: Vec<ToolCall>) {
        let content = content.into();
        let tokens = self.count(&content);
        self.entries
            .push(ConversationEntry::assistant(content, tool_calls, tokens));
    }

    pub fn add_tool_result(&mut self, tool_call_id: impl Into<String>, content: impl Into<String>) {
        let content = content.into();
        let tokens = self.count(&content);
        self.entries
            .push(ConversationEntry::tool_result(tool_call_id, content, tokens));
    }

    // ── Reading ────────────────────────────────────────────────────

    /// The message list for the next model call: the system prompt (if
    /// non-empty) followed by every stored entry in order.
    pub fn get_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.entries.len() + 1);
        if !self.system_prompt.is_empty() {
            messages.push(Message::system(self.system_prompt.clone()));
        }
        messages.extend(self.entries.iter().map(ConversationEntry::to_message));
        messages
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    /// Number of stored entries, excluding the system prompt.
    pub fn message_count(&self) -> usize {
        self.entries.len()
    }

    /// Sum of stored entry token counts. Excludes the system prompt.
    pub fn estimated_tokens(&self) -> usize {
        self.entries.iter().map(|e| e.token_count).sum()
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn context_window(&self) -> usize {
        self.context_window
    }

    // ── Usage ──────────────────────────────────────────────────────

    pub fn latest_usage(&self) -> TokenUsage {
        self.latest_usage
    }

    pub fn total_usage(&self) -> TokenUsage {
        self.total_usage
    }

    /// Overwrite the usage snapshot from the most recent model call.
    pub fn set_latest_usage(&mut self, usage: TokenUsage) {
        self.latest_usage = usage;
    }

    /// Accumulate usage into the running total.
    pub fn add_usage(&mut self, usage: TokenUsage) {
        self.total_usage += usage;
    }

    /// Whether the latest reported usage is above 80% of the context window.
    /// Exactly 80% does not trigger.
    pub fn needs_compression(&self) -> bool {
        let used = u128::from(self.latest_usage.total_tokens);
        let window = self.context_window as u128;
        used * COMPACTION_DENOMINATOR > window * COMPACTION_NUMERATOR
    }

    // ── Compaction ─────────────────────────────────────────────────

    /// Discard the whole conversation and replace it with a restoration
    /// message wrapping `summary`, an acknowledgment, and a continuation
    /// instruction.
    ///
    /// The running total usage is kept. The latest usage snapshot is reset,
    /// since it described a conversation that no longer exists.
    pub fn replace_with_summary(&mut self, summary: &str) {
        let discarded = self.entries.len();
        let discarded_tokens = self.estimated_tokens();

        let restoration = restoration_message(summary);
        let restoration_tokens = self.count(&restoration);
        let ack_tokens = self.count(ACKNOWLEDGMENT);
        let continue_tokens = self.count(CONTINUATION);

        let replacement = vec![
            ConversationEntry::user(restoration, restoration_tokens),
            ConversationEntry::assistant(ACKNOWLEDGMENT, Vec::new(), ack_tokens),
            ConversationEntry::user(CONTINUATION, continue_tokens),
        ];
        self.entries = replacement;
        self.latest_usage = TokenUsage::default();

        debug!(
            "Compacted context: {discarded} entries (~{discarded_tokens} tokens) -> 3 entries (~{} tokens)",
            self.estimated_tokens()
        );
    }
}

// ── Compaction templates ───────────────────────────────────────────

const ACKNOWLEDGMENT: &str = "I've reviewed the context from the previous session. I understand:
- The original goal and what was requested
- Which actions are ALREADY COMPLETED (I will NOT repeat these)
- The current state of the project
- What still needs to be done

I'll continue with the REMAINING tasks only, starting from where we left off.";

const CONTINUATION: &str = "Continue with the REMAINING work only. Do NOT repeat any completed actions. \
Proceed with the next step as described in the context above.";

fn restoration_message(summary: &str) -> String {
    format!(
        "# Context Restoration (Previous Session Compacted)

The previous conversation was compacted due to context length limits. \
Below is a detailed summary of the work done so far.

**CRITICAL: Actions listed under \"COMPLETED ACTIONS\" are already done. DO NOT repeat them.**

---

{summary}

---

Resume work from where we left off. Focus ONLY on the remaining tasks."
    )
}
