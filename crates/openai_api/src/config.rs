use std::time::Duration;

use crate::url::DEFAULT_API_BASE_URL;

/// Transport configuration for chat-completion requests.
#[derive(Debug, Clone)]
pub struct ChatApiConfig {
    /// Base URL of the OpenAI-compatible upstream.
    pub api_base_url: String,
    /// Optional bearer token passed to `Authorization` in direct mode.
    pub api_key: Option<String>,
    /// Route requests through the same-origin relay instead of the upstream.
    pub use_proxy: bool,
    /// Origin the relay is served from; only read when `use_proxy` is set.
    pub proxy_origin: String,
    /// Optional request timeout.
    pub timeout: Option<Duration>,
}

impl Default for ChatApiConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            use_proxy: false,
            proxy_origin: String::new(),
            timeout: None,
        }
    }
}

impl ChatApiConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = if api_key.trim().is_empty() {
            None
        } else {
            Some(api_key)
        };
        self
    }

    pub fn with_proxy(mut self, proxy_origin: impl Into<String>) -> Self {
        self.use_proxy = true;
        self.proxy_origin = proxy_origin.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
