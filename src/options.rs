//! Client configuration.

use std::collections::HashMap;
use std::time::Duration;

/// Gateway address used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";

/// Connect and read timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable consulted by [`ClientOptions::from_env`].
pub const API_KEY_ENV: &str = "SENTINEL_API_KEY";

/// A secret string type for sensitive data like API keys.
/// Prevents accidental logging or display of secrets.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret string.
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Get the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// Connection settings for a [`SentinelClient`](crate::client::SentinelClient).
///
/// # Example
/// ```rust
/// use sentinel_sdk::options::ClientOptions;
/// use std::time::Duration;
///
/// let options = ClientOptions::new()
///     .with_endpoint("https://sentinel.internal/")
///     .with_api_key("sk-test")
///     .with_timeout(Duration::from_secs(10));
///
/// assert_eq!(options.endpoint, "https://sentinel.internal");
/// ```
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Gateway base URL, without a trailing slash
    pub endpoint: String,

    /// API key sent as a bearer token
    pub api_key: Option<SecretString>,

    /// Connect timeout and idle time allowed between reads
    pub timeout: Option<Duration>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            timeout: Some(DEFAULT_TIMEOUT),
            proxy: None,
            extra_headers: None,
        }
    }
}

impl ClientOptions {
    /// Create options with the default endpoint and timeout and no API key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default options with the API key taken from `SENTINEL_API_KEY`, if set.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.is_empty())
                .map(SecretString::new),
            ..Self::default()
        }
    }

    /// Set the gateway endpoint. A trailing `/` is removed.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<SecretString>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the connect and read timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Full URL for a gateway path such as `/v1/chat/completions`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::new();
        assert_eq!(options.endpoint, "http://localhost:8080");
        assert_eq!(options.timeout, Some(Duration::from_secs(30)));
        assert!(options.api_key.is_none());
        assert!(options.extra_headers.is_none());
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let options = ClientOptions::new().with_endpoint("http://test.example.com/");
        assert_eq!(options.endpoint, "http://test.example.com");
        assert_eq!(
            options.url("/v1/sanitize"),
            "http://test.example.com/v1/sanitize"
        );
    }

    #[test]
    fn test_secret_is_redacted() {
        let options = ClientOptions::new().with_api_key("sk-very-secret");
        let debug = format!("{:?}", options);
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(
            options.api_key.as_ref().map(SecretString::expose_secret),
            Some("sk-very-secret")
        );
    }

    #[test]
    fn test_with_header() {
        let options = ClientOptions::new()
            .with_header("X-Tenant", "acme")
            .with_header("X-Trace", "1");
        let headers = options.extra_headers.unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["X-Tenant"], "acme");
    }
}
