//! Send a synchronous completion request and print the reply.
//!
//! Requires `OPENAI_API_KEY` (or `AI_GATEWAY_API_KEY`) in the environment.

use promptrig::{Conversation, GenerationOptions, LlmRequest, Provider, ProviderFactory};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let provider = ProviderFactory::from_env()?;
    let conversation =
        Conversation::system("You are a helpful assistant.").with_user("Say this is a test");
    let request = LlmRequest::new("gpt-5-mini", conversation.into_messages())
        .with_options(GenerationOptions::default().max_output_tokens(64));

    let response = provider.complete(&request).await?;
    println!("{}", response.text().unwrap_or_default());
    Ok(())
}
