//! Messages API request and response types

use crate::types::{ContentBlock, Message, Role, StopReason, Usage};
use serde::{Deserialize, Serialize};

/// Model used when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Request to create a message
#[derive(Clone, Debug, Serialize)]
pub struct MessagesRequest {
    /// Model to use (e.g., "claude-sonnet-4-5-20250929")
    pub model: String,
    /// Conversation history
    pub messages: Vec<Message>,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Sampling temperature (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl MessagesRequest {
    /// Create a basic request with sensible defaults
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            messages,
            max_tokens: 4096,
            system: None,
            temperature: None,
        }
    }

    /// Builder: Set model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builder: Set max tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Builder: Set system prompt
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Builder: Set temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Response from creating a message
#[derive(Clone, Debug, Deserialize)]
pub struct MessagesResponse {
    /// Unique identifier for this message
    pub id: String,
    /// Model that generated the response
    pub model: String,
    /// Role (always "assistant" for responses)
    pub role: Role,
    /// Content blocks in the response
    pub content: Vec<ContentBlock>,
    /// Why the model stopped generating
    pub stop_reason: Option<StopReason>,
    /// Token usage statistics
    pub usage: Usage,
}

impl MessagesResponse {
    /// Concatenate every text block of the reply.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_request_builder() {
        let req = MessagesRequest::new(vec![Message::user("Hello")])
            .with_model("claude-3-opus-20240229")
            .with_max_tokens(1000)
            .with_system("You are helpful");

        assert_eq!(req.model, "claude-3-opus-20240229");
        assert_eq!(req.max_tokens, 1000);
        assert_eq!(req.system, Some("You are helpful".to_string()));
    }

    #[test]
    #[allow(clippy::unwrap_used)] // Test code
    fn optional_fields_are_omitted_from_the_wire() {
        let req = MessagesRequest::new(vec![Message::user("Test")]);
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["max_tokens"], 4096);
        assert!(json.get("system").is_none());
        assert!(json.get("temperature").is_none());
    }

    #[test]
    #[allow(clippy::unwrap_used)] // Test code
    fn text_joins_text_blocks_and_skips_others() {
        let response: MessagesResponse = serde_json::from_value(serde_json::json!({
            "id": "msg_1",
            "model": DEFAULT_MODEL,
            "role": "assistant",
            "content": [
                {"type": "text", "text": "[{\"a\":"},
                {"type": "tool_use", "id": "t1", "name": "noop", "input": {}},
                {"type": "text", "text": "1}]"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 4}
        }))
        .unwrap();

        assert_eq!(response.text(), "[{\"a\":1}]");
        assert_eq!(response.stop_reason, Some(StopReason::EndTurn));
    }
}
