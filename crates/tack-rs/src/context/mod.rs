//! Conversation state and token-budget compaction.
//!
//! - **[`usage`]**: [`TokenUsage`], the prompt/completion/total counters a
//!   model client reports per call.
//! - **[`tokens`]**: the [`TokenCounter`] seam and the default
//!   [`CharEstimateCounter`].
//! - **[`entry`]**: [`ConversationEntry`], one stored turn with its token
//!   count.
//! - **[`manager`]**: [`ContextManager`], which owns the ordered
//!   conversation, decides when the window is running hot, and replaces
//!   history with a fixed three-entry summary when asked.

pub mod entry;
pub mod manager;
pub mod tokens;
pub mod usage;

pub use entry::ConversationEntry;
pub use manager::ContextManager;
pub use tokens::{CharEstimateCounter, DEFAULT_CHARS_PER_TOKEN, TokenCounter};
pub use usage::TokenUsage;
