//! Async client for the Sentinel gateway.

use futures::Stream;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::SentinelError;
use crate::http::{add_extra_headers, build_http_client};
use crate::model::{
    ChatRequest, PolicyRequest, PolicyUpdate, ProcessRequest, ProcessResult, SanitizeRequest,
    SanitizeResult,
};
use crate::options::ClientOptions;
use crate::sse::SseResponseExt;

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const SANITIZE_PATH: &str = "/v1/sanitize";
const PROCESS_PATH: &str = "/v1/process";
const POLICIES_PATH: &str = "/v1/policies";

/// Client for the gateway's HTTP API.
///
/// Cloning is cheap; clones share the underlying connection pool.
///
/// # Example
/// ```no_run
/// use futures::StreamExt;
/// use sentinel_sdk::{ChatMessage, ChatRequest, ClientOptions, SentinelClient};
///
/// # async fn run() -> Result<(), sentinel_sdk::SentinelError> {
/// let client = SentinelClient::new(ClientOptions::from_env())?;
/// let request = ChatRequest::new("gpt-4o", vec![ChatMessage::user("Hello!")]);
///
/// let mut events = std::pin::pin!(client.chat_stream(request).await?);
/// while let Some(event) = events.next().await {
///     println!("{}", event?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SentinelClient {
    http: reqwest::Client,
    options: ClientOptions,
}

impl SentinelClient {
    /// Build a client. Fails on an unusable API key, header or proxy.
    pub fn new(options: ClientOptions) -> Result<Self, SentinelError> {
        let http = build_http_client(&options)?;
        Ok(Self { http, options })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Send a chat completion request and return the gateway's JSON response.
    ///
    /// `request.stream` is forced to `false`; use
    /// [`chat_stream`](Self::chat_stream) for streaming.
    pub async fn chat(&self, mut request: ChatRequest) -> Result<Value, SentinelError> {
        request.validate()?;
        request.strip_reserved_params();
        request.stream = false;
        self.post_json(CHAT_COMPLETIONS_PATH, &request).await
    }

    /// Send a streaming chat completion request.
    ///
    /// Yields one JSON value per `data:` frame, in arrival order, and ends at
    /// the `[DONE]` sentinel or when the connection closes.
    pub async fn chat_stream(
        &self,
        request: ChatRequest,
    ) -> Result<impl Stream<Item = Result<Value, SentinelError>> + Send, SentinelError> {
        self.chat_stream_as::<Value>(request).await
    }

    /// Like [`chat_stream`](Self::chat_stream), deserializing each event into `T`.
    pub async fn chat_stream_as<T>(
        &self,
        mut request: ChatRequest,
    ) -> Result<impl Stream<Item = Result<T, SentinelError>> + Send, SentinelError>
    where
        T: DeserializeOwned + Send,
    {
        request.validate()?;
        request.strip_reserved_params();
        request.stream = true;
        let response = self.send(CHAT_COMPLETIONS_PATH, &request).await?;
        debug!(model = %request.model, "chat stream opened");
        Ok(response.sse_events_as::<T>())
    }

    /// Ask the gateway to sanitize a prompt before it reaches a model.
    pub async fn sanitize_prompt(&self, prompt: &str) -> Result<SanitizeResult, SentinelError> {
        self.post_json(SANITIZE_PATH, &SanitizeRequest { prompt }).await
    }

    /// Ask the gateway to screen a model response.
    pub async fn process_response(&self, response: &str) -> Result<ProcessResult, SentinelError> {
        self.post_json(PROCESS_PATH, &ProcessRequest { response }).await
    }

    /// Replace the gateway's security policies.
    pub async fn configure_policies(&self, policies: &Value) -> Result<PolicyUpdate, SentinelError> {
        self.post_json(POLICIES_PATH, &PolicyRequest { policies }).await
    }

    /// POST `body` and decode the JSON reply. An empty reply decodes as `{}`.
    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, SentinelError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(path, body).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_value(Value::Object(Default::default()))?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// POST `body` and turn non-success statuses into classified errors.
    async fn send<B>(&self, path: &str, body: &B) -> Result<reqwest::Response, SentinelError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.options.url(path);
        debug!(%url, "sending gateway request");

        let req = add_extra_headers(self.http.post(&url), &self.options.extra_headers)?;
        let response = req.json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(%url, error = %e, "failed to read gateway error body");
                    String::new()
                }
            };
            let err = SentinelError::from_gateway_response(status, &body);
            warn!(%url, status = status.as_u16(), kind = %err.kind(), "gateway request failed");
            return Err(err);
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChatMessage;

    #[tokio::test]
    async fn test_chat_rejects_empty_messages() {
        let client = SentinelClient::new(ClientOptions::new()).unwrap();
        let err = client
            .chat(ChatRequest::new("test-model", vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_chat_stream_rejects_empty_model() {
        let client = SentinelClient::new(ClientOptions::new()).unwrap();
        let result = client
            .chat_stream(ChatRequest::new("", vec![ChatMessage::user("hi")]))
            .await;
        assert!(matches!(result, Err(SentinelError::Validation(_))));
    }
}
