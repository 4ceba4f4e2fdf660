//! HTTP client construction and request shaping for the gateway.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use std::collections::HashMap;

use crate::error::SentinelError;
use crate::options::ClientOptions;

/// `User-Agent` sent with every request.
pub const SDK_USER_AGENT: &str = concat!("sentinel-sdk-rust/", env!("CARGO_PKG_VERSION"));

/// Build a configured HTTP client from client options.
///
/// Applies the timeout, the proxy and the default headers (content type,
/// user agent, bearer auth). The timeout bounds connecting and each read,
/// so a stream that keeps delivering chunks is never cut off.
pub fn build_http_client(options: &ClientOptions) -> Result<Client, SentinelError> {
    let mut builder = Client::builder().default_headers(default_headers(options)?);

    if let Some(timeout) = options.timeout {
        builder = builder.connect_timeout(timeout).read_timeout(timeout);
    }

    if let Some(proxy_url) = &options.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| SentinelError::Config(format!("invalid proxy {}: {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Headers attached to every gateway request.
pub fn default_headers(options: &ClientOptions) -> Result<HeaderMap, SentinelError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(SDK_USER_AGENT));

    if let Some(api_key) = &options.api_key {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|_| SentinelError::Config("Invalid API key".to_string()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

/// Add extra headers to a request if specified in client options.
pub fn add_extra_headers(
    mut request: RequestBuilder,
    extra_headers: &Option<HashMap<String, String>>,
) -> Result<RequestBuilder, SentinelError> {
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| SentinelError::Config(format!("Invalid header name: {}", key)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| SentinelError::Config(format!("Invalid value for header {}", key)))?;
            request = request.header(name, value);
        }
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_build_http_client() {
        let options = ClientOptions::new()
            .with_api_key("test")
            .with_timeout(Duration::from_secs(30));

        let client = build_http_client(&options);
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_http_client_with_proxy() {
        let options = ClientOptions::new().with_proxy("http://proxy.example.com:8080");

        let client = build_http_client(&options);
        assert!(client.is_ok());
    }

    #[test]
    fn test_default_headers_without_key() {
        let headers = default_headers(&ClientOptions::new()).unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert!(headers[USER_AGENT]
            .to_str()
            .unwrap()
            .starts_with("sentinel-sdk-rust/"));
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_default_headers_with_key() {
        let headers = default_headers(&ClientOptions::new().with_api_key("test-key")).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer test-key");
        assert!(headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn test_invalid_api_key() {
        let options = ClientOptions::new().with_api_key("bad\nkey");
        assert!(matches!(
            default_headers(&options),
            Err(SentinelError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_extra_header() {
        let client = Client::new();
        let request = client.post("http://localhost/");
        let mut headers = HashMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        assert!(add_extra_headers(request, &Some(headers)).is_err());
    }
}
