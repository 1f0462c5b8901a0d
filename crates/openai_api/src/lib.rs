//! Transport-only client primitives for OpenAI-compatible chat endpoints.
//!
//! This crate owns request building, SSE stream parsing, reasoning-markup
//! filtering, and error mapping for `chat/completions` transport only. It
//! intentionally contains no conversation state and no persistence coupling.
//!
//! Streamed assistant text is surfaced as whole-buffer replacements: the
//! reasoning filter is recomputed over the full accumulated text on every
//! fragment because delimiter pairs may straddle chunk boundaries.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod payload;
pub mod sse;
pub mod url;

pub use reqwest::StatusCode;

pub use client::CancellationSignal;
pub use client::ChatApiClient;
pub use config::ChatApiConfig;
pub use error::{ChatApiError, ErrorKind};
pub use events::{CompletionDelta, FinishReason};
pub use filter::{strip_reasoning, ReasoningMarkers};
pub use payload::{ChatMessage, ChatRequest, MessageRole};
pub use sse::SseStreamParser;
pub use url::{completions_url, proxy_url};
