use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chat_store::{keys, KeyValueStore, KeyValueStoreExt};
use openai_api::{CancellationSignal, ErrorKind};

use crate::backend::CompletionBackend;
use crate::conversation::Conversation;
use crate::session::ChatSession;
use crate::settings::ChatSettings;

/// Wires the [`ChatSession`] reducer to a completion backend and a
/// key/value store.
///
/// The runtime owns the single-generation guarantee at the async level: one
/// cancellation signal slot, armed on send and cleared on every terminal
/// transition. Persistence is best-effort; store failures are logged and
/// never interrupt a generation.
pub struct ChatRuntime {
    session: Arc<Mutex<ChatSession>>,
    store: Arc<dyn KeyValueStore>,
    backend: Arc<dyn CompletionBackend>,
    active: Mutex<Option<CancellationSignal>>,
}

impl ChatRuntime {
    /// Restore session state from the store and attach the backend.
    pub fn new(store: Arc<dyn KeyValueStore>, backend: Arc<dyn CompletionBackend>) -> Self {
        let conversations: Vec<Conversation> = store.load_or(keys::CONVERSATIONS, Vec::new());
        let current: Option<String> = store.load_or(keys::CURRENT_CONVERSATION, None);
        let settings: ChatSettings = store.load_or(keys::SETTINGS, ChatSettings::default());
        let draft: String = store.load_or(keys::INPUT_DRAFT, String::new());

        let mut session = ChatSession::from_parts(conversations, current, settings);
        session.set_input_draft(draft);

        Self {
            session: Arc::new(Mutex::new(session)),
            store,
            backend,
            active: Mutex::new(None),
        }
    }

    /// Read the session under the lock. The closure must not block.
    pub fn with_session<R>(&self, read: impl FnOnce(&ChatSession) -> R) -> R {
        read(&lock_unpoisoned(&self.session))
    }

    /// Run one full generation: reducer transition, backend stream, terminal
    /// transition, with the transcript persisted at each step.
    ///
    /// Returns `false` without side effects when the reducer refuses the
    /// send (blank content, or a generation already active).
    pub async fn send_message(&self, content: &str) -> bool {
        let request = {
            let mut session = lock_unpoisoned(&self.session);
            let Some(request) = session.begin_send(content) else {
                return false;
            };
            persist_transcript(self.store.as_ref(), &session);
            request
        };

        let cancellation: CancellationSignal = Arc::new(AtomicBool::new(false));
        *lock_unpoisoned(&self.active) = Some(Arc::clone(&cancellation));

        let session = Arc::clone(&self.session);
        let store = Arc::clone(&self.store);
        let mut emit = move |text: &str| {
            let mut session = lock_unpoisoned(&session);
            session.apply_stream_update(text);
            persist_transcript(store.as_ref(), &session);
        };

        let result = self.backend.run(request, cancellation, &mut emit).await;

        {
            let mut session = lock_unpoisoned(&self.session);
            match result {
                Ok(()) => session.complete_generation(),
                Err(error) if error.kind() == ErrorKind::Abort => session.cancel_generation(),
                Err(error) => session.fail_generation(error.user_message()),
            }
            persist_transcript(self.store.as_ref(), &session);
        }
        *lock_unpoisoned(&self.active) = None;
        true
    }

    /// Arm the active cancellation signal. Idempotent; a no-op when nothing
    /// is streaming.
    pub fn stop_generation(&self) -> bool {
        match lock_unpoisoned(&self.active).as_ref() {
            Some(signal) => {
                signal.store(true, Ordering::Release);
                true
            }
            None => false,
        }
    }

    pub fn create_conversation(&self) -> String {
        let mut session = lock_unpoisoned(&self.session);
        let id = session.create_conversation();
        persist_transcript(self.store.as_ref(), &session);
        id
    }

    pub fn select_conversation(&self, id: &str) -> bool {
        let mut session = lock_unpoisoned(&self.session);
        let selected = session.select_conversation(id);
        if selected {
            persist_transcript(self.store.as_ref(), &session);
        }
        selected
    }

    pub fn rename_conversation(&self, id: &str, title: &str) -> bool {
        let mut session = lock_unpoisoned(&self.session);
        let renamed = session.rename_conversation(id, title);
        if renamed {
            persist_transcript(self.store.as_ref(), &session);
        }
        renamed
    }

    pub fn delete_conversation(&self, id: &str) -> bool {
        let mut session = lock_unpoisoned(&self.session);
        let deleted = session.delete_conversation(id);
        if deleted {
            persist_transcript(self.store.as_ref(), &session);
        }
        deleted
    }

    pub fn update_settings(&self, settings: ChatSettings) {
        let mut session = lock_unpoisoned(&self.session);
        session.set_settings(settings);
        if let Err(error) = self
            .store
            .save_value(keys::SETTINGS, session.settings())
        {
            log::warn!("failed to persist settings: {error}");
        }
    }

    pub fn set_input_draft(&self, draft: &str) {
        let mut session = lock_unpoisoned(&self.session);
        session.set_input_draft(draft);
        if let Err(error) = self.store.save_value(keys::INPUT_DRAFT, &draft) {
            log::warn!("failed to persist input draft: {error}");
        }
    }

    pub fn clear_error(&self) {
        lock_unpoisoned(&self.session).clear_error();
    }
}

fn persist_transcript(store: &dyn KeyValueStore, session: &ChatSession) {
    if let Err(error) = store.save_value(keys::CONVERSATIONS, &session.conversations()) {
        log::warn!("failed to persist conversations: {error}");
    }
    let result = match session.current_conversation_id() {
        Some(id) => store.save_value(keys::CURRENT_CONVERSATION, &id),
        None => store.remove(keys::CURRENT_CONVERSATION),
    };
    if let Err(error) = result {
        log::warn!("failed to persist conversation selection: {error}");
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
