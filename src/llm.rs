use crate::config::Config;
use crate::conversation::{Exchange, Role};
use crate::stream::CompletionStream;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One entry of the backend's ordered message list.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: MessageRole::User, content: content.into() }
    }
}

impl From<&Exchange> for Message {
    fn from(exchange: &Exchange) -> Self {
        let role = match exchange.role {
            Role::Author => MessageRole::User,
            Role::Editor => MessageRole::Assistant,
        };
        Self { role, content: exchange.content.clone() }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync + Debug {
    /// Single-shot call: the full response text, assembled server-side.
    async fn chat(&self, system: &str, messages: &[Message]) -> Result<String>;

    /// Streaming call: a handle yielding cumulative text snapshots as
    /// content deltas arrive.
    async fn chat_stream(&self, system: &str, messages: &[Message]) -> Result<CompletionStream>;
}

pub fn create_llm(config: &Config) -> Result<Box<dyn LlmClient>> {
    match config.llm.provider.as_str() {
        "anthropic" => {
            let cfg = config.llm.anthropic.as_ref().context("Anthropic config missing")?;
            if cfg.api_key.trim().is_empty() {
                return Err(anyhow!("Anthropic API key is not configured"));
            }
            Ok(Box::new(AnthropicClient::new(
                &cfg.api_key,
                &cfg.model,
                &cfg.base_url,
                cfg.max_tokens,
            )))
        }
        other => Err(anyhow!("Unknown LLM provider: {}", other)),
    }
}

#[derive(Debug)]
pub struct AnthropicClient {
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(api_key: &str, model: &str, base_url: &str, max_tokens: u32) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_tokens,
            client: reqwest::Client::new(),
        }
    }

    async fn send(&self, system: &str, messages: &[Message], stream: bool) -> Result<reqwest::Response> {
        let url = format!("{}/v1/messages", self.base_url);
        let request_body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages,
            stream,
        };

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request_body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Backend API error ({}): {}", status, error_text));
        }
        Ok(resp)
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

fn concat_content(response: MessagesResponse) -> String {
    response
        .content
        .into_iter()
        .filter_map(|part| part.text)
        .collect()
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn chat(&self, system: &str, messages: &[Message]) -> Result<String> {
        let resp = self.send(system, messages, false).await?;
        let response_text = resp.text().await?;
        let result: MessagesResponse = serde_json::from_str(&response_text)
            .with_context(|| format!("Failed to parse backend response: {}", response_text))?;
        Ok(concat_content(result))
    }

    async fn chat_stream(&self, system: &str, messages: &[Message]) -> Result<CompletionStream> {
        let resp = self.send(system, messages, true).await?;
        let chunks = resp
            .bytes_stream()
            .map(|item| item.map(|bytes| bytes.to_vec()).map_err(anyhow::Error::from));
        Ok(CompletionStream::new(chunks))
    }
}
