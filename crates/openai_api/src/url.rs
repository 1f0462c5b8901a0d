/// Default base URL for a locally hosted OpenAI-compatible server.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:1234/v1";

/// Path appended to the proxy origin in proxy mode.
pub const PROXY_CHAT_PATH: &str = "/api/chat";

/// Normalize a base URL to a chat-completions endpoint.
///
/// Normalization rules:
/// 1) keep `/chat/completions` unchanged
/// 2) append `/chat/completions` otherwise
/// 3) an empty/blank input falls back to the default base URL
pub fn completions_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_API_BASE_URL
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        return trimmed.to_string();
    }
    format!("{trimmed}/chat/completions")
}

/// Build the same-origin relay endpoint used in proxy mode.
pub fn proxy_url(origin: &str) -> String {
    let trimmed = origin.trim().trim_end_matches('/');
    format!("{trimmed}{PROXY_CHAT_PATH}")
}
