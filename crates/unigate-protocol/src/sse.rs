use bytes::Bytes;
use serde::Serialize;

/// Out-of-band terminal marker closing a successful event stream.
pub const DONE_FRAME: &[u8] = b"data: [DONE]\n\n";

const DONE_SENTINEL: &str = "[DONE]";

/// Encode one value as a `data: <json>\n\n` event-stream frame.
pub fn data_frame<T: Serialize>(value: &T) -> serde_json::Result<Bytes> {
    let json = serde_json::to_vec(value)?;
    let mut frame = Vec::with_capacity(json.len() + 8);
    frame.extend_from_slice(b"data: ");
    frame.extend_from_slice(&json);
    frame.extend_from_slice(b"\n\n");
    Ok(Bytes::from(frame))
}

pub fn is_done(data: &str) -> bool {
    data.trim() == DONE_SENTINEL
}

/// Incremental parser for `data:`-only event streams, the framing used by
/// OpenAI-compatible upstreams. Bytes arrive in arbitrary chunk boundaries;
/// completed event payloads come out. Multi-line `data:` fields are joined
/// with `\n` per the SSE spec; comment lines and field names other than
/// `data` are ignored.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    data_lines: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bytes(&mut self, chunk: &Bytes) -> Vec<String> {
        match std::str::from_utf8(chunk) {
            Ok(text) => self.push_str(text),
            Err(_) => Vec::new(),
        }
    }

    pub fn push_str(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.find('\n') {
            let mut line = self.buffer[..pos].to_string();
            self.buffer.drain(..=pos);
            if line.ends_with('\r') {
                line.pop();
            }
            self.take_line(&line, &mut events);
        }

        events
    }

    /// Flush whatever is buffered once the transport closes. An event not
    /// followed by a blank line is still surfaced.
    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let mut line = std::mem::take(&mut self.buffer);
            if line.ends_with('\r') {
                line.pop();
            }
            self.take_line(&line, &mut events);
        }
        if !self.data_lines.is_empty() {
            events.push(std::mem::take(&mut self.data_lines).join("\n"));
        }
        events
    }

    fn take_line(&mut self, line: &str, events: &mut Vec<String>) {
        if line.is_empty() {
            if !self.data_lines.is_empty() {
                events.push(std::mem::take(&mut self.data_lines).join("\n"));
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }
        if let Some(value) = line.strip_prefix("data:") {
            self.data_lines.push(value.trim_start().to_string());
        } else if line == "data" {
            self.data_lines.push(String::new());
        }
        // Other field names (event, id, retry) carry nothing for this protocol.
    }
}
