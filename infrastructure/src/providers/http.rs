//! Shared HTTP plumbing for the vendor adapters.

use consensus_application::ProviderError;
use consensus_domain::{FailureReason, ProviderId};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Longest slice of an error body kept in a [`ProviderError`] message
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Send a prepared request and decode a JSON success body.
///
/// Non-2xx statuses are classified through [`ProviderError::from_status`];
/// undecodable bodies become `MalformedResponse`.
pub(crate) async fn send_json<R: DeserializeOwned>(
    provider_id: ProviderId,
    request: reqwest::RequestBuilder,
) -> Result<R, ProviderError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ProviderError::new(provider_id, FailureReason::Timeout, e.to_string())
        } else {
            ProviderError::transport(provider_id, e.to_string())
        }
    })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::transport(provider_id, e.to_string()))?;

    if !status.is_success() {
        debug!(provider = %provider_id, status = status.as_u16(), "Provider returned error status");
        return Err(ProviderError::from_status(
            provider_id,
            status.as_u16(),
            truncate(&body),
        ));
    }

    serde_json::from_str(&body).map_err(|e| {
        ProviderError::malformed(provider_id, format!("could not decode response: {}", e))
    })
}

/// Join a base URL and a path without doubling the slash
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    cut.push_str("...");
    cut
}

/// Reject completions that carry no text
pub(crate) fn non_empty(provider_id: ProviderId, content: String) -> Result<String, ProviderError> {
    if content.trim().is_empty() {
        Err(ProviderError::malformed(provider_id, "completion contained no text"))
    } else {
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://api.openai.com/", "/v1/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(join_url("http://127.0.0.1:1234", "v1/messages"), "http://127.0.0.1:1234/v1/messages");
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(2000);
        let cut = truncate(&body);
        assert_eq!(cut.chars().count(), MAX_ERROR_BODY_CHARS + 3);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_non_empty() {
        assert!(non_empty(ProviderId::OpenAi, "  ".into()).is_err());
        assert_eq!(non_empty(ProviderId::OpenAi, "hi".into()).unwrap(), "hi");
    }
}
