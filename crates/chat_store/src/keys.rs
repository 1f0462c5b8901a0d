//! Canonical storage keys used by the chat session.

pub const CONVERSATIONS: &str = "llm-chat-conversations";
pub const CURRENT_CONVERSATION: &str = "llm-chat-current";
pub const SETTINGS: &str = "llm-chat-settings";
pub const INPUT_DRAFT: &str = "llm-chat-input-draft";
