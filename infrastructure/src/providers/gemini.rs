//! Gemini generateContent adapter
//!
//! `POST {base_url}/v1beta/models/{model}:generateContent` with the key in
//! the `x-goog-api-key` header.

use super::ProviderAdapter;
use super::http::{join_url, non_empty, send_json};
use async_trait::async_trait;
use consensus_application::{ProviderError, RawCompletion};
use consensus_domain::{ProviderId, QueryOptions, TokenUsage};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiAdapter {
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
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    total_token_count: Option<u64>,
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn provider_id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    async fn complete(
        &self,
        model_id: &str,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<RawCompletion, ProviderError> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_tokens,
            },
        };

        let url = join_url(
            &self.base_url,
            &format!("/v1beta/models/{}:generateContent", model_id),
        );
        let request = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(options.timeout)
            .json(&body);

        let response: GenerateResponse = send_json(ProviderId::Gemini, request).await?;

        let content: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or_else(|| ProviderError::malformed(ProviderId::Gemini, "response has no candidates"))?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        let usage = response.usage_metadata.unwrap_or_default();
        Ok(RawCompletion::new(
            non_empty(ProviderId::Gemini, content)?,
            TokenUsage::new(usage.prompt_token_count, usage.candidates_token_count)
                .with_reported_total(usage.total_token_count),
        ))
    }
}
