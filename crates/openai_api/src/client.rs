use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, Response};

use crate::config::ChatApiConfig;
use crate::error::{status_message, ChatApiError};
use crate::events::ChatCompletionResponse;
use crate::filter::{strip_reasoning, ReasoningMarkers};
use crate::payload::{ChatRequest, ProxyRequest};
use crate::sse::SseStreamParser;
use crate::url::{completions_url, proxy_url};

/// Cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct ChatApiClient {
    http: Client,
    config: ChatApiConfig,
    markers: ReasoningMarkers,
}

impl ChatApiClient {
    pub fn new(config: ChatApiConfig) -> Result<Self, ChatApiError> {
        Self::with_markers(config, ReasoningMarkers::default())
    }

    pub fn with_markers(
        config: ChatApiConfig,
        markers: ReasoningMarkers,
    ) -> Result<Self, ChatApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ChatApiError::from)?;
        Ok(Self {
            http,
            config,
            markers,
        })
    }

    pub fn config(&self) -> &ChatApiConfig {
        &self.config
    }

    pub fn endpoint(&self) -> Result<String, ChatApiError> {
        if self.config.use_proxy {
            if self.config.proxy_origin.trim().is_empty() {
                return Err(ChatApiError::InvalidEndpoint(
                    "proxy mode requires a proxy origin".to_string(),
                ));
            }
            return Ok(proxy_url(&self.config.proxy_origin));
        }

        Ok(completions_url(&self.config.api_base_url))
    }

    pub fn build_request(
        &self,
        request: &ChatRequest,
    ) -> Result<reqwest::RequestBuilder, ChatApiError> {
        let endpoint = self.endpoint()?;

        if self.config.use_proxy {
            // The relay attaches the upstream Authorization header itself, so
            // the coordinates travel in the body and no header is set here.
            let body = ProxyRequest {
                request,
                api_base_url: &self.config.api_base_url,
                api_key: self.config.api_key.as_deref(),
            };
            return Ok(self.http.post(endpoint).json(&body));
        }

        let mut builder = self.http.post(endpoint).json(request);
        if let Some(api_key) = self
            .config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            builder = builder.bearer_auth(api_key);
        }
        Ok(builder)
    }

    /// Issue the request and map any non-success status to a user-facing
    /// message. The raw transport failure never reaches the caller directly.
    pub async fn send(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Response, ChatApiError> {
        if is_cancelled(cancellation) {
            return Err(ChatApiError::Cancelled);
        }

        let response = self.build_request(request)?.send();
        let response = await_or_cancel(response, cancellation)
            .await?
            .map_err(ChatApiError::from)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = await_or_cancel(response.text(), cancellation)
            .await?
            .unwrap_or_default();
        Err(ChatApiError::Status(status, status_message(status, &body)))
    }

    /// Run one completion and surface visible text through `on_text`.
    ///
    /// Every invocation of `on_text` carries the full filtered text so far;
    /// consumers replace, never append. Returns the final visible text.
    pub async fn stream_completion<F>(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
        mut on_text: F,
    ) -> Result<String, ChatApiError>
    where
        F: FnMut(&str),
    {
        let response = self.send(request, cancellation).await?;

        if !request.stream {
            let decoded = await_or_cancel(response.json::<ChatCompletionResponse>(), cancellation)
                .await?
                .map_err(ChatApiError::from)?;
            let visible = strip_reasoning(&decoded.first_content(), &self.markers);
            on_text(&visible);
            return Ok(visible);
        }

        let mut bytes = response.bytes_stream();
        let mut parser = SseStreamParser::default();
        let mut accumulated = String::new();
        let mut visible = String::new();

        loop {
            let Some(chunk) = await_or_cancel(bytes.next(), cancellation).await? else {
                break;
            };
            if is_cancelled(cancellation) {
                return Err(ChatApiError::Cancelled);
            }
            let chunk = chunk.map_err(ChatApiError::from)?;

            for delta in parser.feed(&chunk) {
                let Some(fragment) = delta.content else {
                    continue;
                };
                accumulated.push_str(&fragment);
                // Markers may straddle chunk boundaries, so the filter is
                // recomputed over the whole accumulation each time.
                visible = strip_reasoning(&accumulated, &self.markers);
                on_text(&visible);
            }

            if parser.is_done() {
                break;
            }
        }

        if is_cancelled(cancellation) {
            return Err(ChatApiError::Cancelled);
        }

        log::debug!(
            "stream finished: {} raw chars, {} visible",
            accumulated.len(),
            visible.len()
        );
        Ok(visible)
    }
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, ChatApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(ChatApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(ChatApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}
