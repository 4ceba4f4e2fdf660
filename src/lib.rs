//! # sentinel-sdk - Client for the Sentinel LLM gateway
//!
//! A small async client for a Sentinel gateway, the firewall that sits
//! between an application and its LLM providers.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - OpenAI-style chat completions, blocking or streamed
//! - Incremental Server-Sent Events decoding that tolerates arbitrary chunking
//! - Prompt sanitization, response screening and policy configuration
//! - Gateway errors classified by [`ErrorKind`]
//!
//! ## Example
//! ```no_run
//! use sentinel_sdk::{ChatMessage, ChatRequest, ClientOptions, SentinelClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SentinelClient::new(
//!         ClientOptions::new()
//!             .with_endpoint("http://localhost:8080")
//!             .with_api_key("your-api-key"),
//!     )?;
//!
//!     let request = ChatRequest::new("gpt-4o", vec![ChatMessage::user("Hello!")])
//!         .with_temperature(0.7);
//!
//!     let response = client.chat(request).await?;
//!     println!("{}", response);
//!     Ok(())
//! }
//! ```
//!
//! The stream decoder works without a client, on any chunk source:
//! ```
//! use sentinel_sdk::sse::decode_chunks;
//! use serde_json::Value;
//!
//! let events: Vec<Value> = decode_chunks::<_, Value>(["data: {\"a\":1}\n", "data: [DONE]\n"])
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(events.len(), 1);
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod model;
pub mod options;
pub mod sse;

// Re-exports for convenience
pub use client::SentinelClient;
pub use error::{ErrorKind, SentinelError};
pub use model::{ChatMessage, ChatRequest, PolicyUpdate, ProcessResult, Role, SanitizeResult};
pub use options::{ClientOptions, SecretString};
pub use sse::{SseResponseExt, StreamDecoder};
