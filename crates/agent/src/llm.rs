use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sarpipe_core::config::LlmConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One chat-style request to the model: a fixed system instruction plus the
/// per-case user instruction.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LlmRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &LlmRequest) -> Result<String>;
}

/// Client for any endpoint speaking the OpenAI chat-completions protocol
/// (OpenAI itself, or a local Ollama at `/v1`).
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl OpenAiCompatibleClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build http client for model endpoint")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(&self, request: &LlmRequest) -> Result<String> {
        let mut builder = self.http.post(self.endpoint()).json(&chat_completion_body(request));
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder.send().await.context("model request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("model endpoint returned {status}: {}", truncate(&body, 200)));
        }

        let payload: ChatCompletionResponse =
            response.json().await.context("model response body was not valid json")?;
        first_choice_content(payload)
    }
}

pub fn chat_completion_body(request: &LlmRequest) -> Value {
    json!({
        "model": request.model,
        "messages": [
            { "role": "system", "content": request.system },
            { "role": "user", "content": request.user },
        ],
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
    })
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

fn first_choice_content(payload: ChatCompletionResponse) -> Result<String> {
    payload
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("model returned no message content"))
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
