use crate::events::{ChatCompletionChunk, CompletionDelta};

const DATA_PREFIX: &str = "data: ";
const DONE_PAYLOAD: &str = "[DONE]";

/// Incremental parser for SSE chat-completion streams.
///
/// Raw bytes are buffered across feeds so that lines, and the multi-byte
/// characters inside them, reassemble before decoding no matter where the
/// chunk boundaries fall. The parser becomes terminal after a `[DONE]`
/// payload or the first delta carrying a finish reason; later feeds emit
/// nothing.
#[derive(Debug, Default)]
pub struct SseStreamParser {
    buffer: Vec<u8>,
    done: bool,
}

impl SseStreamParser {
    /// Feed arbitrary bytes into the parser and drain complete delta events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<CompletionDelta> {
        if self.done {
            return Vec::new();
        }

        self.buffer.extend_from_slice(bytes);

        let mut deltas = Vec::new();
        while let Some(split) = self.buffer.iter().position(|&byte| byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(0..=split).collect();

            if self.done {
                continue;
            }

            // Newlines are ASCII, so a complete line never ends inside a
            // multi-byte sequence; partial characters stay buffered.
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            if let Some(delta) = self.process_line(line.trim()) {
                deltas.push(delta);
            }
        }

        deltas
    }

    /// Parse a complete SSE payload string in one shot.
    pub fn parse_frames(input: &str) -> Vec<CompletionDelta> {
        let mut parser = Self::default();
        parser.feed(input.as_bytes())
    }

    /// True once a `[DONE]` payload or a finish reason was observed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.iter().all(u8::is_ascii_whitespace)
    }

    fn process_line(&mut self, line: &str) -> Option<CompletionDelta> {
        let payload = line.strip_prefix(DATA_PREFIX)?.trim();
        if payload.is_empty() {
            return None;
        }

        if payload == DONE_PAYLOAD {
            self.done = true;
            return None;
        }

        let chunk = match serde_json::from_str::<ChatCompletionChunk>(payload) {
            Ok(chunk) => chunk,
            Err(error) => {
                log::warn!("skipping malformed SSE payload: {error}");
                return None;
            }
        };

        let delta = chunk.into_delta()?;
        if delta.finish_reason.is_some() {
            self.done = true;
        }

        Some(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::SseStreamParser;

    #[test]
    fn parse_sse_lines_incrementally() {
        let mut parser = SseStreamParser::default();
        let mut deltas = Vec::new();

        deltas.extend(
            parser.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n"),
        );
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].content.as_deref(), Some("Hello"));

        deltas.extend(parser.feed(b"data: [DONE]\n"));
        assert_eq!(deltas.len(), 1);
        assert!(parser.is_done());
        assert!(parser.is_empty_buffer());
    }

    #[test]
    fn finish_reason_marks_parser_done() {
        let mut parser = SseStreamParser::default();
        let deltas = parser.feed(
            b"data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n",
        );

        assert_eq!(deltas.len(), 1);
        assert!(parser.is_done());
        assert!(parser
            .feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n")
            .is_empty());
    }
}
