use std::sync::Arc;
use std::time::Duration;

use chat_store::MemoryStore;
use llm_chat::backend::MockBackend;
use llm_chat::conversation::MessageRole;
use llm_chat::runtime::ChatRuntime;
use llm_chat::session::CANCELLED_MESSAGE;

fn slow_runtime() -> Arc<ChatRuntime> {
    let backend = MockBackend::default().with_chunk_delay(Duration::from_millis(500));
    Arc::new(ChatRuntime::new(
        Arc::new(MemoryStore::new()),
        Arc::new(backend),
    ))
}

async fn wait_until_streaming(runtime: &ChatRuntime) {
    for _ in 0..200 {
        if runtime.with_session(|session| session.is_generation_active()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("generation never became active");
}

#[tokio::test]
async fn stop_generation_cancels_and_rolls_back() {
    let runtime = slow_runtime();

    let handle = {
        let runtime = Arc::clone(&runtime);
        tokio::spawn(async move { runtime.send_message("Hello").await })
    };

    wait_until_streaming(&runtime).await;
    assert!(runtime.stop_generation());
    assert!(handle.await.expect("send task"));

    runtime.with_session(|session| {
        assert!(!session.is_generation_active());
        assert_eq!(session.error(), Some(CANCELLED_MESSAGE));
        let conversation = session.current_conversation().expect("conversation");
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].role, MessageRole::User);
    });
}

#[tokio::test]
async fn stop_generation_without_active_stream_is_a_no_op() {
    let runtime = slow_runtime();
    assert!(!runtime.stop_generation());
    runtime.with_session(|session| assert!(session.error().is_none()));
}

#[tokio::test]
async fn send_works_again_after_cancellation() {
    let runtime = slow_runtime();

    let handle = {
        let runtime = Arc::clone(&runtime);
        tokio::spawn(async move { runtime.send_message("first").await })
    };
    wait_until_streaming(&runtime).await;
    runtime.stop_generation();
    handle.await.expect("send task");

    // The signal from the cancelled run must not leak into the next one.
    assert!(runtime.send_message("second").await);
    runtime.with_session(|session| {
        assert!(session.error().is_none());
        let conversation = session.current_conversation().expect("conversation");
        assert_eq!(conversation.messages.len(), 3);
        assert_eq!(conversation.messages[0].content, "first");
        assert_eq!(conversation.messages[1].content, "second");
        assert_eq!(conversation.messages[2].role, MessageRole::Assistant);
    });
}
