//! Anthropic messages adapter
//!
//! `POST {base_url}/v1/messages` with `x-api-key` and `anthropic-version`
//! headers. Text is the concatenation of all `text` content blocks.

use super::ProviderAdapter;
use super::http::{join_url, non_empty, send_json};
use async_trait::async_trait;
use consensus_application::{ProviderError, RawCompletion};
use consensus_domain::{ProviderId, QueryOptions, TokenUsage};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

pub struct AnthropicAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    api_version: String,
}

impl AnthropicAdapter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn provider_id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    async fn complete(
        &self,
        model_id: &str,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<RawCompletion, ProviderError> {
        let body = MessagesRequest {
            model: model_id,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let request = self
            .client
            .post(join_url(&self.base_url, "/v1/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .timeout(options.timeout)
            .json(&body);

        let response: MessagesResponse = send_json(ProviderId::Anthropic, request).await?;

        let content: String = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        let usage = response.usage.unwrap_or_default();
        Ok(RawCompletion::new(
            non_empty(ProviderId::Anthropic, content)?,
            TokenUsage::new(usage.input_tokens, usage.output_tokens),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_domain::FailureReason;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> AnthropicAdapter {
        AnthropicAdapter::new("ant-key").with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_concatenates_text_blocks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "ant-key"))
            .and(header("anthropic-version", DEFAULT_API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [
                    {"type": "text", "text": "First part. "},
                    {"type": "tool_use", "id": "t1", "name": "noop", "input": {}},
                    {"type": "text", "text": "Second part."}
                ],
                "usage": {"input_tokens": 20, "output_tokens": 15}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let completion = adapter(&server)
            .complete("claude-sonnet-4-5", "Explain ownership", &QueryOptions::default())
            .await
            .unwrap();

        assert_eq!(completion.content, "First part. Second part.");
        assert_eq!(completion.usage.total_tokens, 35);
    }

    #[tokio::test]
    async fn test_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "type": "error",
                "error": {"type": "authentication_error", "message": "invalid x-api-key"}
            })))
            .mount(&server)
            .await;

        let err = adapter(&server)
            .complete("claude-sonnet-4-5", "p", &QueryOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureReason::Auth);
        assert!(err.message.contains("invalid x-api-key"));
    }

    #[tokio::test]
    async fn test_no_text_blocks_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
            .mount(&server)
            .await;

        let err = adapter(&server)
            .complete("claude-sonnet-4-5", "p", &QueryOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureReason::MalformedResponse);
    }

    #[tokio::test]
    async fn test_overloaded_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = adapter(&server)
            .complete("claude-sonnet-4-5", "p", &QueryOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureReason::Upstream);
    }
}
