use openai_api::{ChatMessage, ChatRequest, MessageRole};

use crate::conversation::{derive_title, Conversation, Message};
use crate::settings::ChatSettings;

/// Fixed message surfaced when the caller cancels a generation.
pub const CANCELLED_MESSAGE: &str = "Response cancelled";

/// Conversation-state reducer.
///
/// Owns the transcript list and applies every mutation as an atomic value
/// transition: user-message append plus assistant placeholder in one step,
/// visible-text replacement per increment, and placeholder rollback on
/// failure. A single streaming flag guards against concurrent sends across
/// all conversations; external readers treat the state as read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    conversations: Vec<Conversation>,
    current_id: Option<String>,
    /// Id of the conversation with a generation in flight. Stream updates
    /// and rollback target this conversation even if the selection moves.
    streaming_id: Option<String>,
    settings: ChatSettings,
    error: Option<String>,
    input_draft: String,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(ChatSettings::default())
    }
}

impl ChatSession {
    pub fn new(settings: ChatSettings) -> Self {
        Self::from_parts(Vec::new(), None, settings)
    }

    /// Rebuild a session from persisted state. A current-conversation
    /// pointer that no longer resolves is cleared rather than kept dangling.
    pub fn from_parts(
        conversations: Vec<Conversation>,
        current_id: Option<String>,
        settings: ChatSettings,
    ) -> Self {
        let current_id = current_id
            .filter(|id| conversations.iter().any(|conversation| conversation.id == *id));

        Self {
            conversations,
            current_id,
            streaming_id: None,
            settings,
            error: None,
            input_draft: String::new(),
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ChatSettings) {
        self.settings = settings;
    }

    pub fn current_conversation_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    pub fn current_conversation(&self) -> Option<&Conversation> {
        let id = self.current_id.as_deref()?;
        self.conversations
            .iter()
            .find(|conversation| conversation.id == id)
    }

    fn conversation_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations
            .iter_mut()
            .find(|conversation| conversation.id == id)
    }

    /// True while a generation is in flight anywhere in the session.
    pub fn is_generation_active(&self) -> bool {
        self.streaming_id.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn input_draft(&self) -> &str {
        &self.input_draft
    }

    pub fn set_input_draft(&mut self, draft: impl Into<String>) {
        self.input_draft = draft.into();
    }

    /// Create, select, and return the id of a fresh conversation.
    pub fn create_conversation(&mut self) -> String {
        let conversation = Conversation::new();
        let id = conversation.id.clone();
        self.conversations.insert(0, conversation);
        self.current_id = Some(id.clone());
        self.error = None;
        id
    }

    pub fn select_conversation(&mut self, id: &str) -> bool {
        if self.conversations.iter().any(|conversation| conversation.id == id) {
            self.current_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Pure metadata update; no state-machine interaction.
    pub fn rename_conversation(&mut self, id: &str, title: impl Into<String>) -> bool {
        match self
            .conversations
            .iter_mut()
            .find(|conversation| conversation.id == id)
        {
            Some(conversation) => {
                conversation.title = title.into();
                true
            }
            None => false,
        }
    }

    /// Remove a conversation. When the selected one goes away the first
    /// remaining conversation takes over, or selection clears entirely.
    pub fn delete_conversation(&mut self, id: &str) -> bool {
        let before = self.conversations.len();
        self.conversations.retain(|conversation| conversation.id != id);
        if self.conversations.len() == before {
            return false;
        }

        if self.current_id.as_deref() == Some(id) {
            self.current_id = self
                .conversations
                .first()
                .map(|conversation| conversation.id.clone());
        }
        true
    }

    /// idle -> sending: append the user message and the empty assistant
    /// placeholder atomically and return the request to run.
    ///
    /// Returns `None` for blank content or while another generation is
    /// active (the guard is global, not per conversation); neither case
    /// mutates the transcript. A conversation is created lazily when none is
    /// selected.
    pub fn begin_send(&mut self, content: &str) -> Option<ChatRequest> {
        let content = content.trim();
        if content.is_empty() || self.streaming_id.is_some() {
            return None;
        }

        if self.current_conversation().is_none() {
            self.create_conversation();
        }

        let model = self.settings.model.clone();
        let temperature = self.settings.temperature;
        let max_tokens = self.settings.max_tokens;
        let system_prompt = self.settings.system_prompt.trim().to_string();

        let target_id = self.current_id.clone()?;
        let conversation = self.conversation_mut(&target_id)?;

        let mut messages = Vec::new();
        if !system_prompt.is_empty() {
            messages.push(ChatMessage::system(system_prompt));
        }
        messages.extend(
            conversation
                .messages
                .iter()
                .filter(|message| message.role != MessageRole::System)
                .map(|message| ChatMessage::new(message.role, message.content.clone())),
        );
        messages.push(ChatMessage::user(content));

        let first_exchange = conversation.messages.is_empty();
        conversation.messages.push(Message::user(content));
        conversation.messages.push(Message::assistant_placeholder());
        if first_exchange {
            conversation.title = derive_title(content);
        }

        self.streaming_id = Some(target_id);
        self.error = None;

        Some(
            ChatRequest::new(model, messages)
                .with_temperature(temperature)
                .with_max_tokens(max_tokens),
        )
    }

    /// Replace the placeholder content with the latest filtered visible
    /// text. The content is monotonically revised, not strictly growing,
    /// because the reasoning filter recomputes from the full accumulation.
    pub fn apply_stream_update(&mut self, visible: &str) {
        let Some(id) = self.streaming_id.clone() else {
            return;
        };

        if let Some(conversation) = self.conversation_mut(&id) {
            if let Some(message) = conversation
                .messages
                .last_mut()
                .filter(|message| message.role == MessageRole::Assistant)
            {
                message.content.clear();
                message.content.push_str(visible);
            }
        }
    }

    /// streaming -> completed: the transcript retains the final content.
    pub fn complete_generation(&mut self) {
        self.streaming_id = None;
    }

    /// streaming/sending -> cancelled: placeholder rollback plus the fixed
    /// cancellation message.
    pub fn cancel_generation(&mut self) {
        self.finish_with_error(CANCELLED_MESSAGE.to_string());
    }

    /// streaming/sending -> failed: placeholder rollback plus the mapped
    /// transport message.
    pub fn fail_generation(&mut self, message: impl Into<String>) {
        self.finish_with_error(message.into());
    }

    fn finish_with_error(&mut self, message: String) {
        if let Some(id) = self.streaming_id.take() {
            self.rollback_placeholder(&id);
        }
        self.error = Some(message);
    }

    fn rollback_placeholder(&mut self, id: &str) {
        if let Some(conversation) = self.conversation_mut(id) {
            if conversation
                .messages
                .last()
                .is_some_and(|message| message.role == MessageRole::Assistant)
            {
                conversation.messages.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::MessageRole;

    fn session() -> ChatSession {
        ChatSession::new(ChatSettings::default())
    }

    #[test]
    fn begin_send_rejects_blank_content() {
        let mut session = session();
        assert!(session.begin_send("   \n\t").is_none());
        assert!(session.conversations().is_empty());
        assert!(!session.is_generation_active());
    }

    #[test]
    fn rollback_only_removes_trailing_assistant_message() {
        let mut session = session();
        session.begin_send("question").expect("send");
        session.apply_stream_update("partial");
        session.fail_generation("boom");

        let conversation = session.current_conversation().expect("conversation");
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].role, MessageRole::User);

        // A second failure without an active stream leaves the transcript alone.
        session.fail_generation("boom again");
        let conversation = session.current_conversation().expect("conversation");
        assert_eq!(conversation.messages.len(), 1);
    }

    #[test]
    fn stale_current_pointer_is_cleared_on_load() {
        let session =
            ChatSession::from_parts(Vec::new(), Some("ghost".to_string()), ChatSettings::default());
        assert!(session.current_conversation_id().is_none());
    }
}
