//! Streaming chat session engine for OpenAI-compatible endpoints.
//!
//! The engine is split along its seams: `openai_api` owns transport (SSE
//! parsing, reasoning-markup filtering, error mapping), `chat_store` owns
//! best-effort persistence, and this crate owns the conversation state
//! machine. [`session::ChatSession`] is a pure reducer over transcripts;
//! [`runtime::ChatRuntime`] wires the reducer to a [`backend::CompletionBackend`]
//! and a key/value store, guaranteeing at most one active generation and
//! placeholder rollback on every failure path.

pub mod backend;
pub mod conversation;
pub mod runtime;
pub mod session;
pub mod settings;

pub use backend::{ApiBackend, CompletionBackend, MockBackend};
pub use conversation::{Conversation, Message};
pub use runtime::ChatRuntime;
pub use session::ChatSession;
pub use settings::{ChatSettings, Theme};
