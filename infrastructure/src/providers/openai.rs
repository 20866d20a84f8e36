//! OpenAI chat completions adapter
//!
//! `POST {base_url}/v1/chat/completions` with bearer authentication.

use super::ProviderAdapter;
use super::http::{join_url, non_empty, send_json};
use async_trait::async_trait;
use consensus_application::{ProviderError, RawCompletion};
use consensus_domain::{ProviderId, QueryOptions, TokenUsage};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAiAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiAdapter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    total_tokens: Option<u64>,
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn provider_id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    async fn complete(
        &self,
        model_id: &str,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<RawCompletion, ProviderError> {
        let body = ChatRequest {
            model: model_id,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let request = self
            .client
            .post(join_url(&self.base_url, "/v1/chat/completions"))
            .bearer_auth(&self.api_key)
            .timeout(options.timeout)
            .json(&body);

        let response: ChatResponse = send_json(ProviderId::OpenAi, request).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::malformed(ProviderId::OpenAi, "response has no choices"))?;

        let usage = response.usage.unwrap_or_default();
        Ok(RawCompletion::new(
            non_empty(ProviderId::OpenAi, content)?,
            TokenUsage::new(usage.prompt_tokens, usage.completion_tokens)
                .with_reported_total(usage.total_tokens),
        ))
    }
}
