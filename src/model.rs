//! Request and response types for the gateway endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::SentinelError;

/// Body keys owned by [`ChatRequest`] fields; never taken from `extra`.
pub const RESERVED_PARAMS: &[&str] = &[
    "model",
    "messages",
    "stream",
    "metadata",
    "temperature",
    "max_tokens",
];

/// Role of the message sender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Body of `POST /v1/chat/completions`.
///
/// The gateway speaks the OpenAI Chat Completions dialect. Parameters the SDK
/// has no field for go through [`with_param`](Self::with_param) and are sent
/// at the top level of the body. Keys in [`RESERVED_PARAMS`] are never sent
/// from `extra`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,

    /// Extra context handed to the gateway's security pipeline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
            metadata: None,
            temperature: None,
            max_tokens: None,
            extra: Map::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Add an arbitrary top-level parameter such as `top_p`.
    ///
    /// Keys that belong to a typed field (see [`RESERVED_PARAMS`]) are ignored.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if RESERVED_PARAMS.contains(&key.as_str()) {
            warn!(%key, "ignoring reserved chat request parameter");
            return self;
        }
        self.extra.insert(key, value.into());
        self
    }

    /// Drop any reserved keys inserted into `extra` directly.
    pub(crate) fn strip_reserved_params(&mut self) {
        self.extra.retain(|key, _| {
            let reserved = RESERVED_PARAMS.contains(&key.as_str());
            if reserved {
                warn!(%key, "dropping reserved chat request parameter");
            }
            !reserved
        });
    }

    /// Reject requests the gateway could never accept.
    pub fn validate(&self) -> Result<(), SentinelError> {
        if self.model.trim().is_empty() {
            return Err(SentinelError::Validation("model must not be empty".to_string()));
        }
        if self.messages.is_empty() {
            return Err(SentinelError::Validation(
                "at least one message is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Body of `POST /v1/sanitize`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SanitizeRequest<'a> {
    pub prompt: &'a str,
}

/// Body of `POST /v1/process`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ProcessRequest<'a> {
    pub response: &'a str,
}

/// Body of `POST /v1/policies`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PolicyRequest<'a> {
    pub policies: &'a Value,
}

/// Result of sanitizing a prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SanitizeResult {
    pub sanitized_prompt: String,
    pub detected_entities: Vec<Value>,
    pub policy_violations: Vec<Value>,
    pub encryption_applied: bool,
}

/// Result of screening a model response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessResult {
    pub processed_response: String,
    pub detected_entities: Vec<Value>,
    pub policy_violations: Vec<Value>,
    pub encryption_applied: bool,
}

/// Outcome of a policy update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PolicyUpdate {
    pub success: bool,
    pub message: String,
}

/// Text delta carried by a streamed chat-completion chunk, if any.
///
/// Reads `choices[0].delta.content`.
pub fn delta_content(event: &Value) -> Option<&str> {
    event
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_request_body() {
        let request = ChatRequest::new("test-model", vec![ChatMessage::user("test")]);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "test-model",
                "messages": [{"role": "user", "content": "test"}],
                "stream": false
            })
        );
    }

    #[test]
    fn test_request_with_params() {
        let request = ChatRequest::new("test-model", vec![ChatMessage::user("test")])
            .with_temperature(0.5)
            .with_max_tokens(100)
            .with_metadata(json!({"tenant": "acme"}))
            .with_param("top_p", 0.9)
            .with_param("frequency_penalty", 0.5);

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["temperature"], json!(0.5));
        assert_eq!(body["max_tokens"], json!(100));
        assert_eq!(body["metadata"], json!({"tenant": "acme"}));
        assert_eq!(body["top_p"], json!(0.9));
        assert_eq!(body["frequency_penalty"], json!(0.5));
    }

    #[test]
    fn test_reserved_params_ignored() {
        let request = ChatRequest::new("m", vec![ChatMessage::user("hi")])
            .with_param("stream", true)
            .with_param("model", "other")
            .with_param("max_tokens", 5)
            .with_param("top_p", 0.9);
        assert_eq!(request.extra.len(), 1);

        let body = serde_json::to_string(&request).unwrap();
        for key in RESERVED_PARAMS {
            let occurrences = body.matches(&format!("\"{}\":", key)).count();
            assert!(occurrences <= 1, "{key} appears {occurrences} times in {body}");
        }
        assert_eq!(body.matches("\"stream\":").count(), 1);
        assert!(body.contains("\"stream\":false"));
        assert!(body.contains("\"model\":\"m\""));
    }

    #[test]
    fn test_strip_reserved_params() {
        let mut request = ChatRequest::new("m", vec![ChatMessage::user("hi")]);
        request.extra.insert("stream".to_string(), json!(true));
        request.extra.insert("temperature".to_string(), json!(2.0));
        request.extra.insert("seed".to_string(), json!(7));

        request.strip_reserved_params();
        let body = serde_json::to_string(&request).unwrap();
        assert_eq!(body.matches("\"stream\":").count(), 1);
        assert!(!body.contains("temperature"));
        assert_eq!(request.extra.len(), 1);
        assert_eq!(request.extra["seed"], json!(7));
    }

    #[test]
    fn test_validate() {
        assert!(ChatRequest::new("m", vec![ChatMessage::user("hi")])
            .validate()
            .is_ok());
        assert!(matches!(
            ChatRequest::new(" ", vec![ChatMessage::user("hi")]).validate(),
            Err(SentinelError::Validation(_))
        ));
        assert!(matches!(
            ChatRequest::new("m", vec![]).validate(),
            Err(SentinelError::Validation(_))
        ));
    }

    #[test]
    fn test_sanitize_result_defaults() {
        let result: SanitizeResult =
            serde_json::from_value(json!({"sanitizedPrompt": "hello [NAME]"})).unwrap();
        assert_eq!(result.sanitized_prompt, "hello [NAME]");
        assert!(result.detected_entities.is_empty());
        assert!(!result.encryption_applied);
    }

    #[test]
    fn test_delta_content() {
        let chunk = json!({"choices": [{"index": 0, "delta": {"content": "Hel"}}]});
        assert_eq!(delta_content(&chunk), Some("Hel"));
        assert_eq!(delta_content(&json!({"choices": []})), None);
        assert_eq!(delta_content(&json!({"a": 1})), None);
    }
}
