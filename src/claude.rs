//! Client for the Anthropic messages API.
//!
//! Sends the full conversation history and returns the assistant reply
//! with its usage metadata. One request at a time; the caller owns the
//! busy-flag discipline.

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One segment of a message body, in the API's content-block shape.
/// Only text blocks exist here; the request never asks for anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Segment {
    Text { text: String },
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Segment::Text { text } => text,
        }
    }
}

/// A conversation entry. Content is non-empty by construction and never
/// mutated after append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<Segment>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![Segment::Text { text: text.into() }],
        }
    }

    /// All segments concatenated, for rendering.
    pub fn text(&self) -> String {
        self.content.iter().map(Segment::text).collect()
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: &'a [Message],
}

/// Token counts reported by the API. Logged, not interpreted.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// The assistant's reply to a completed request.
#[derive(Debug, Clone, Deserialize)]
pub struct Reply {
    pub content: Vec<Segment>,
    pub usage: Usage,
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    api_key: String,
}

impl ChatClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
        }
    }

    /// Post the whole history and wait for the reply.
    pub async fn send(&self, model: &str, max_tokens: u32, history: &[Message]) -> Result<Reply> {
        let request = MessagesRequest {
            model,
            max_tokens,
            temperature: 0.0,
            messages: history,
        };

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Claude API error {}: {}", status, text));
        }

        let reply: Reply = response.json().await?;
        if reply.content.is_empty() {
            return Err(anyhow!("Claude reply contained no content"));
        }
        Ok(reply)
    }

    pub fn list_models() -> Vec<String> {
        vec![
            "claude-sonnet-4-20250514".to_string(),
            "claude-3-5-sonnet-20241022".to_string(),
            "claude-3-5-haiku-20241022".to_string(),
            "claude-3-opus-20240229".to_string(),
        ]
    }
}
