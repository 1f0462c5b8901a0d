use serde::Deserialize;

/// Reason the upstream reported for ending a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    Other,
}

impl FinishReason {
    pub fn parse(value: &str) -> Self {
        match value {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "content_filter" => Self::ContentFilter,
            "tool_calls" => Self::ToolCalls,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ContentFilter => "content_filter",
            Self::ToolCalls => "tool_calls",
            Self::Other => "other",
        }
    }
}

/// One parsed streaming event. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionDelta {
    pub content: Option<String>,
    pub finish_reason: Option<FinishReason>,
}

/// Wire shape of one streamed chunk. Optional fields decode to absent,
/// never to an error.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// Wire shape of a non-streaming completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ResponseChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseChoice {
    #[serde(default)]
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Extract the first choice as a normalized delta event.
    pub fn into_delta(mut self) -> Option<CompletionDelta> {
        if self.choices.is_empty() {
            return None;
        }

        let choice = self.choices.swap_remove(0);
        Some(CompletionDelta {
            content: choice.delta.content,
            finish_reason: choice
                .finish_reason
                .as_deref()
                .map(FinishReason::parse),
        })
    }
}

impl ChatCompletionResponse {
    /// Content of the first choice's message, empty when absent.
    pub fn first_content(mut self) -> String {
        if self.choices.is_empty() {
            return String::new();
        }

        self.choices
            .swap_remove(0)
            .message
            .content
            .unwrap_or_default()
    }
}
