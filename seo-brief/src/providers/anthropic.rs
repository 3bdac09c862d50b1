//! Text generation over the Anthropic Messages API.

use anyhow::{anyhow, Context, Result};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::providers::json::parse_json;
use crate::providers::prompts::{brief_step_prompt, paragraph_prompt, section_prompt, Prompt};
use crate::providers::sse::{stream_delta, SseDecoder, StreamDelta};
use crate::services::{
    BriefStepRequest, GenerationService, ParagraphRequest, SectionRequest, TextStream,
};
use crate::types::ContentBrief;

pub const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

const BRIEF_MAX_TOKENS: u32 = 8192;
const SECTION_MAX_TOKENS: u32 = 4096;
const PARAGRAPH_MAX_TOKENS: u32 = 1024;

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

pub struct AnthropicClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: API_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Point at a different endpoint (proxies, test servers)
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    async fn send(&self, prompt: &Prompt, max_tokens: u32, stream: bool) -> Result<reqwest::Response> {
        let body = MessagesRequest {
            model: &self.model,
            system: &prompt.system,
            messages: vec![Message {
                role: "user",
                content: &prompt.user,
            }],
            max_tokens,
            stream,
            temperature: 0.7,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .context("Messages API request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Messages API returned HTTP {}: {}", status, text);
        }
        Ok(response)
    }

    /// Run a prompt to completion and return the concatenated text
    pub async fn complete(&self, prompt: &Prompt, max_tokens: u32) -> Result<String> {
        let response = self.send(prompt, max_tokens, false).await?;
        let text = response.text().await?;
        let parsed: MessagesResponse = serde_json::from_str(&text)
            .with_context(|| format!("Messages API parse error | Raw: {}", text))?;

        let reply: String = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();
        if reply.trim().is_empty() {
            anyhow::bail!("Messages API returned no text");
        }
        Ok(reply)
    }

    /// Run a prompt with streaming and yield text deltas as they arrive
    pub async fn stream(&self, prompt: &Prompt, max_tokens: u32) -> Result<TextStream> {
        let response = self.send(prompt, max_tokens, true).await?;
        let mut bytes = response.bytes_stream();

        let stream = try_stream! {
            let mut decoder = SseDecoder::new();
            'read: while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(anyhow::Error::from)?;
                for event in decoder.push(&chunk) {
                    match stream_delta(&event)? {
                        StreamDelta::Text(text) => {
                            yield text;
                        }
                        StreamDelta::Stop => break 'read,
                        StreamDelta::Ignored => {}
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }
}

/// Parse a brief-step reply. Accepts either `{"<section>": {...}}` or the
/// bare section object.
pub fn parse_brief_reply(step_key: &str, reply: &str) -> Result<ContentBrief> {
    let value: Value = parse_json(reply).context("brief reply is not JSON")?;

    let wrapped = match value {
        Value::Object(map) if map.contains_key(step_key) => Value::Object(map),
        Value::Object(map) => {
            let mut outer = serde_json::Map::new();
            outer.insert(step_key.to_string(), Value::Object(map));
            Value::Object(outer)
        }
        other => return Err(anyhow!("brief reply is not a JSON object: {}", other)),
    };

    serde_json::from_value(wrapped).with_context(|| format!("brief reply has the wrong shape for {}", step_key))
}

#[async_trait]
impl GenerationService for AnthropicClient {
    async fn generate_brief_step(&self, request: &BriefStepRequest) -> Result<ContentBrief> {
        let prompt = brief_step_prompt(request);
        tracing::debug!(step = request.step.number(), chars = prompt.user.len(), "brief step prompt");
        let reply = self.complete(&prompt, BRIEF_MAX_TOKENS).await?;
        parse_brief_reply(request.step.section_key(), &reply)
    }

    async fn generate_section(&self, request: &SectionRequest) -> Result<TextStream> {
        let prompt = section_prompt(request);
        tracing::debug!(
            section = %request.section.heading,
            correction = request.correction.is_some(),
            "section prompt"
        );
        self.stream(&prompt, SECTION_MAX_TOKENS).await
    }

    async fn regenerate_paragraph(&self, request: &ParagraphRequest) -> Result<String> {
        let prompt = paragraph_prompt(request);
        self.complete(&prompt, PARAGRAPH_MAX_TOKENS).await
    }
}
