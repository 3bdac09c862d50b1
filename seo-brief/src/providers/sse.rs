//! Server-sent events decoding for the streaming Messages API.

use anyhow::{anyhow, Result};
use serde::Deserialize;

/// One `event:`/`data:` block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental decoder. Network chunks may split events (and UTF-8
/// sequences) anywhere, so bytes are buffered until a blank line.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(pos) = find_blank_line(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            if let Some(event) = parse_block(&String::from_utf8_lossy(&block)) {
                events.push(event);
            }
        }
        events
    }
}

fn find_blank_line(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

fn parse_block(block: &str) -> Option<SseEvent> {
    let mut event = SseEvent::default();
    let mut data_lines = Vec::new();

    for line in block.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => event.event = Some(value.to_string()),
            "data" => data_lines.push(value),
            _ => {}
        }
    }

    if data_lines.is_empty() {
        return None;
    }
    event.data = data_lines.join("\n");
    Some(event)
}

/// What a Messages API stream event means for the text being built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamDelta {
    Text(String),
    Stop,
    Ignored,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessageEvent {
    ContentBlockDelta { delta: Delta },
    MessageStop,
    Error { error: ApiError },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Delta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Interpret one event. Error events become errors.
pub fn stream_delta(event: &SseEvent) -> Result<StreamDelta> {
    let parsed: MessageEvent = serde_json::from_str(&event.data)
        .map_err(|e| anyhow!("malformed stream event: {} ({})", e, event.data))?;

    match parsed {
        MessageEvent::ContentBlockDelta {
            delta: Delta::TextDelta { text },
        } => Ok(StreamDelta::Text(text)),
        MessageEvent::MessageStop => Ok(StreamDelta::Stop),
        MessageEvent::Error { error } => Err(anyhow!("{}: {}", error.kind, error.message)),
        _ => Ok(StreamDelta::Ignored),
    }
}
