//! Stream a response and print each event's kind as it arrives.
//!
//! Requires `OPENAI_API_KEY` (or `AI_GATEWAY_API_KEY`) in the environment.

use promptrig::{LlmRequest, Message, Provider, ProviderFactory};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let provider = ProviderFactory::from_env()?;
    let request = LlmRequest::new(
        "gpt-5-mini",
        vec![Message::user("Write a haiku about running water.")],
    );

    let mut stream = provider.stream(&request).await?;
    while let Some(event) = stream.next_event().await {
        println!("{}", event?.kind());
    }
    Ok(())
}
