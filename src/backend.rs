use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use openai_api::{
    strip_reasoning, CancellationSignal, ChatApiClient, ChatApiConfig, ChatApiError, ChatRequest,
    ReasoningMarkers,
};

use crate::settings::ChatSettings;

/// Seam between the session runtime and whatever produces completions.
///
/// `emit` receives the full visible text accumulated so far on every call;
/// implementations never emit bare increments.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn run(
        &self,
        request: ChatRequest,
        cancellation: CancellationSignal,
        emit: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<(), ChatApiError>;
}

/// Production backend over [`ChatApiClient`].
#[derive(Debug)]
pub struct ApiBackend {
    client: ChatApiClient,
}

impl ApiBackend {
    pub fn new(config: ChatApiConfig) -> Result<Self, ChatApiError> {
        Ok(Self {
            client: ChatApiClient::new(config)?,
        })
    }

    /// Derive the transport configuration from user settings. In proxy mode
    /// the upstream coordinates ride in the request body and the origin is
    /// taken from the settings base URL.
    pub fn from_settings(settings: &ChatSettings) -> Result<Self, ChatApiError> {
        let mut config =
            ChatApiConfig::new(settings.api_base_url.clone()).with_api_key(settings.api_key.clone());
        if settings.use_proxy {
            config = config.with_proxy(settings.proxy_origin.clone());
        }
        Self::new(config)
    }
}

#[async_trait]
impl CompletionBackend for ApiBackend {
    async fn run(
        &self,
        request: ChatRequest,
        cancellation: CancellationSignal,
        emit: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<(), ChatApiError> {
        self.client
            .stream_completion(&request, Some(&cancellation), |text| emit(text))
            .await
            .map(|_| ())
    }
}

/// Scripted backend for tests and offline demos. Replays a fixed chunk
/// sequence through the same accumulate-and-filter pipeline the real
/// transport uses, honoring the cancellation signal between chunks.
#[derive(Debug, Clone)]
pub struct MockBackend {
    chunks: Vec<String>,
    chunk_delay: Duration,
    markers: ReasoningMarkers,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(vec![
            "<think>weighing how to".to_string(),
            " answer</think>Hello".to_string(),
            "! How can I help you today?".to_string(),
        ])
    }
}

impl MockBackend {
    pub fn new(chunks: Vec<String>) -> Self {
        Self {
            chunks,
            chunk_delay: Duration::ZERO,
            markers: ReasoningMarkers::default(),
        }
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn run(
        &self,
        _request: ChatRequest,
        cancellation: CancellationSignal,
        emit: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<(), ChatApiError> {
        let mut accumulated = String::new();
        for chunk in &self.chunks {
            if cancellation.load(Ordering::Acquire) {
                return Err(ChatApiError::Cancelled);
            }
            if !self.chunk_delay.is_zero() {
                tokio::time::sleep(self.chunk_delay).await;
            }
            if cancellation.load(Ordering::Acquire) {
                return Err(ChatApiError::Cancelled);
            }
            accumulated.push_str(chunk);
            emit(&strip_reasoning(&accumulated, &self.markers));
        }
        Ok(())
    }
}
