use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

/// Coarse failure taxonomy surfaced to session callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Auth,
    Server,
    Parse,
    Abort,
}

#[derive(Debug)]
pub enum ChatApiError {
    InvalidEndpoint(String),
    Request(reqwest::Error),
    /// Non-success HTTP status with its already-mapped user-facing message.
    Status(StatusCode, String),
    Decode(JsonError),
    Cancelled,
}

impl ChatApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEndpoint(_) | Self::Request(_) => ErrorKind::Network,
            Self::Status(status, _) if *status == StatusCode::UNAUTHORIZED => ErrorKind::Auth,
            Self::Status(..) => ErrorKind::Server,
            Self::Decode(_) => ErrorKind::Parse,
            Self::Cancelled => ErrorKind::Abort,
        }
    }

    /// Message suitable for the conversation-level error slot. Mapped
    /// messages are surfaced as-is; raw transport errors are wrapped.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status(_, message) => message.clone(),
            Self::Request(_) => {
                "Connection error. Check that the model server is running.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ChatApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEndpoint(value) => write!(f, "invalid endpoint: {value}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Decode(error) => write!(f, "decode error: {error}"),
            Self::Cancelled => write!(f, "Response cancelled"),
        }
    }
}

impl std::error::Error for ChatApiError {}

impl From<reqwest::Error> for ChatApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for ChatApiError {
    fn from(error: JsonError) -> Self {
        Self::Decode(error)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<ErrorPayloadFields>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayloadFields {
    message: Option<String>,
}

/// Map a non-success status and response body to a user-facing message.
pub fn status_message(status: StatusCode, body: &str) -> String {
    match status.as_u16() {
        401 => "Invalid or missing API key".to_string(),
        404 => "Endpoint not found. Check the base URL.".to_string(),
        429 => "Rate limit exceeded. Try again later.".to_string(),
        500 => "Internal server error".to_string(),
        code => {
            if let Ok(ErrorPayload { error: Some(fields) }) =
                serde_json::from_str::<ErrorPayload>(body)
            {
                if let Some(message) = fields.message.filter(|value| !value.trim().is_empty()) {
                    return message;
                }
            }

            if body.trim().is_empty() {
                format!("Error {code}")
            } else {
                body.to_string()
            }
        }
    }
}
