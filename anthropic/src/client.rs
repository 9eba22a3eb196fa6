//! Anthropic API client implementation

use crate::{
    error::ClaudeError,
    messages::{MessagesRequest, MessagesResponse},
};
use reqwest::{Client, StatusCode};

/// Production Messages API base URL.
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1";

/// Value sent in the `anthropic-version` header.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic API client
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    /// Create a new client with API key from environment
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError::MissingApiKey` if `ANTHROPIC_API_KEY` is not set
    /// or empty
    pub fn from_env() -> Result<Self, ClaudeError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ClaudeError::MissingApiKey)?;

        Ok(Self::new(api_key))
    }

    /// Create a new client with explicit API key
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Point the client at a different base URL (proxies, test servers).
    #[must_use]
    pub fn with_base_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.api_url
    }

    /// Create messages (non-streaming)
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn messages(&self, request: MessagesRequest) -> Result<MessagesResponse, ClaudeError> {
        tracing::debug!(model = %request.model, max_tokens = request.max_tokens, "Sending messages request");

        let response = self
            .client
            .post(format!("{}/messages", self.api_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ClaudeError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<MessagesResponse>()
                .await
                .map_err(|e| ClaudeError::ResponseParseFailed(e.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(ClaudeError::RateLimited),
            StatusCode::UNAUTHORIZED => Err(ClaudeError::Unauthorized),
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(status = status.as_u16(), "Anthropic API returned an error");
                Err(ClaudeError::ApiError {
                    status: status.as_u16(),
                    message: body,
                })
            }
        }
    }

    /// Send a single user prompt and return the concatenated text reply.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Self::messages`], plus
    /// `ClaudeError::EmptyResponse` when the reply has no text blocks.
    pub async fn complete(&self, request: MessagesRequest) -> Result<String, ClaudeError> {
        let text = self.messages(request).await?.text();
        if text.trim().is_empty() {
            return Err(ClaudeError::EmptyResponse);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    #[test]
    fn test_client_creation() {
        let client = AnthropicClient::new("test-key".to_string());
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url(), DEFAULT_API_URL);
    }

    #[test]
    fn base_url_override_strips_trailing_slash() {
        let client = AnthropicClient::new("k".to_string()).with_base_url("http://127.0.0.1:9999/");
        assert_eq!(client.base_url(), "http://127.0.0.1:9999");
    }

    #[test]
    fn debug_output_hides_api_key() {
        let client = AnthropicClient::new("secret-key".to_string());
        assert!(!format!("{client:?}").contains("secret-key"));
    }

    #[test]
    fn test_messages_request_creation() {
        let request = MessagesRequest::new(vec![Message::user("Hello")]);
        assert_eq!(request.messages.len(), 1);
    }
}
