use llm_chat::conversation::{MessageRole, DEFAULT_TITLE};
use llm_chat::session::{ChatSession, CANCELLED_MESSAGE};
use llm_chat::settings::ChatSettings;

fn session() -> ChatSession {
    ChatSession::new(ChatSettings::default())
}

#[test]
fn first_send_creates_conversation_with_placeholder_and_title() {
    let mut session = session();
    let request = session.begin_send("Hello").expect("send accepted");

    let conversation = session.current_conversation().expect("conversation");
    assert_eq!(conversation.title, "Hello");
    assert_eq!(conversation.messages.len(), 2);
    assert_eq!(conversation.messages[0].role, MessageRole::User);
    assert_eq!(conversation.messages[0].content, "Hello");
    assert_eq!(conversation.messages[1].role, MessageRole::Assistant);
    assert_eq!(conversation.messages[1].content, "");
    assert!(session.is_generation_active());

    // System prompt leads, the new user message closes the payload.
    assert_eq!(request.messages.first().map(|m| m.role), Some(MessageRole::System));
    assert_eq!(request.messages.last().map(|m| m.content.as_str()), Some("Hello"));
    assert!(request.stream);
}

#[test]
fn stream_updates_replace_rather_than_append() {
    let mut session = session();
    session.begin_send("Hello").expect("send accepted");

    session.apply_stream_update("");
    session.apply_stream_update("Hi");
    session.apply_stream_update("Hi there");

    let conversation = session.current_conversation().expect("conversation");
    assert_eq!(conversation.messages[1].content, "Hi there");

    session.complete_generation();
    assert!(!session.is_generation_active());
    let conversation = session.current_conversation().expect("conversation");
    assert_eq!(conversation.messages[1].content, "Hi there");
}

#[test]
fn send_is_refused_while_a_generation_is_active() {
    let mut session = session();
    session.begin_send("first").expect("send accepted");
    assert!(session.begin_send("second").is_none());

    let conversation = session.current_conversation().expect("conversation");
    assert_eq!(conversation.messages.len(), 2);
}

#[test]
fn guard_is_global_across_conversations() {
    let mut session = session();
    let busy = session.create_conversation();
    let idle = session.create_conversation();
    session.select_conversation(&busy);
    session.begin_send("working on it").expect("send accepted");

    // Switching the selection does not bypass the guard, and updates keep
    // landing in the conversation that started the stream.
    assert!(session.select_conversation(&idle));
    assert!(session.begin_send("elsewhere").is_none());
    session.apply_stream_update("still going");

    session.select_conversation(&busy);
    let conversation = session.current_conversation().expect("conversation");
    assert_eq!(conversation.messages[1].content, "still going");
    assert!(session
        .conversations()
        .iter()
        .find(|c| c.id == idle)
        .is_some_and(|c| c.messages.is_empty()));
}

#[test]
fn cancel_rolls_back_placeholder_and_records_message() {
    let mut session = session();
    session.begin_send("Hello").expect("send accepted");
    session.apply_stream_update("partial answ");

    session.cancel_generation();

    assert!(!session.is_generation_active());
    assert_eq!(session.error(), Some(CANCELLED_MESSAGE));
    let conversation = session.current_conversation().expect("conversation");
    assert_eq!(conversation.messages.len(), 1);
    assert_eq!(conversation.messages[0].role, MessageRole::User);
}

#[test]
fn failure_before_any_content_still_rolls_back() {
    let mut session = session();
    session.begin_send("Hello").expect("send accepted");

    session.fail_generation("Connection error. Check that the model server is running.");

    let conversation = session.current_conversation().expect("conversation");
    assert_eq!(conversation.messages.len(), 1);
    assert_eq!(
        session.error(),
        Some("Connection error. Check that the model server is running.")
    );
}

#[test]
fn second_send_carries_prior_history_without_old_system_entries() {
    let mut session = session();
    session.begin_send("first question").expect("send accepted");
    session.apply_stream_update("first answer");
    session.complete_generation();

    let request = session.begin_send("second question").expect("send accepted");

    let roles: Vec<MessageRole> = request.messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
        ]
    );
    assert_eq!(request.messages[2].content, "first answer");
}

#[test]
fn blank_system_prompt_is_omitted_from_request() {
    let mut settings = ChatSettings::default();
    settings.system_prompt = "   ".to_string();
    let mut session = ChatSession::new(settings);

    let request = session.begin_send("Hello").expect("send accepted");
    assert_eq!(request.messages.len(), 1);
    assert_eq!(request.messages[0].role, MessageRole::User);
}

#[test]
fn title_derives_only_from_first_exchange() {
    let mut session = session();
    session.begin_send("first message").expect("send accepted");
    session.apply_stream_update("reply");
    session.complete_generation();

    session.begin_send("second message").expect("send accepted");
    session.complete_generation();

    let conversation = session.current_conversation().expect("conversation");
    assert_eq!(conversation.title, "first message");
}

#[test]
fn deleting_selected_conversation_falls_back_to_first_remaining() {
    let mut session = session();
    let a = session.create_conversation();
    let b = session.create_conversation();
    // b was created last, so it sits first and is selected.
    assert_eq!(session.current_conversation_id(), Some(b.as_str()));

    assert!(session.delete_conversation(&b));
    assert_eq!(session.current_conversation_id(), Some(a.as_str()));

    assert!(session.delete_conversation(&a));
    assert!(session.current_conversation_id().is_none());
    assert!(!session.delete_conversation(&a));
}

#[test]
fn deleting_unselected_conversation_keeps_selection() {
    let mut session = session();
    let a = session.create_conversation();
    let b = session.create_conversation();

    assert!(session.delete_conversation(&a));
    assert_eq!(session.current_conversation_id(), Some(b.as_str()));
}

#[test]
fn new_conversation_uses_default_title() {
    let mut session = session();
    session.create_conversation();
    let conversation = session.current_conversation().expect("conversation");
    assert_eq!(conversation.title, DEFAULT_TITLE);
    assert!(conversation.messages.is_empty());
}
