//! Stream a chat completion through a Sentinel gateway.
//!
//! Run with:
//! ```bash
//! export SENTINEL_API_KEY="your-api-key"
//! RUST_LOG=sentinel_sdk=debug cargo run --example chat_stream
//! ```

use std::io::Write;

use futures::StreamExt;
use sentinel_sdk::model::delta_content;
use sentinel_sdk::{ChatMessage, ChatRequest, ClientOptions, ErrorKind, SentinelClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = SentinelClient::new(ClientOptions::from_env())?;

    let sanitized = client
        .sanitize_prompt("My card number is 4111 1111 1111 1111")
        .await?;
    println!("Sanitized prompt: {}", sanitized.sanitized_prompt);

    let request = ChatRequest::new(
        "gpt-4o",
        vec![
            ChatMessage::system("You are a concise assistant."),
            ChatMessage::user(sanitized.sanitized_prompt),
        ],
    )
    .with_max_tokens(256);

    let stream = match client.chat_stream(request).await {
        Ok(stream) => stream,
        Err(e) if matches!(e.kind(), ErrorKind::Security | ErrorKind::Policy) => {
            eprintln!("Blocked by gateway: {}", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    futures::pin_mut!(stream);

    print!("Response: ");
    while let Some(event) = stream.next().await {
        if let Some(text) = delta_content(&event?) {
            print!("{}", text);
            std::io::stdout().flush()?;
        }
    }
    println!();

    Ok(())
}
