//! Check a prompt and a conversation against the guardrail service.
//!
//! Run with: XIANGXINAI_API_KEY=... cargo run --example check_prompt

use tracing_subscriber::EnvFilter;
use xiangxinai::{AsyncGuardrailClient, ClientConfig, GuardrailClient, GuardrailResponse, Message};

fn report(label: &str, verdict: &GuardrailResponse) {
    println!(
        "{label}: {} -> {} (categories: {:?})",
        verdict.overall_risk_level,
        verdict.suggest_action,
        verdict.all_categories()
    );
    if let Some(answer) = &verdict.suggest_answer {
        println!("  suggested answer: {answer}");
    }
}

fn main() -> xiangxinai::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::from_env()?;

    // Blocking facade: must run outside any async runtime.
    let client = GuardrailClient::new(config.clone())?;
    let verdict = client.check_response_ctx(
        "How do I bake sourdough bread?",
        "Mix flour, water and starter, then let it rise overnight.",
        None,
    )?;
    report("response", &verdict);
    client.close();

    let runtime = tokio::runtime::Runtime::new().map_err(|e| {
        xiangxinai::Error::network_with_context(
            format!("failed to start runtime: {}", e),
            xiangxinai::ErrorContext::new(),
        )
    })?;
    runtime.block_on(check_async(config))
}

async fn check_async(config: ClientConfig) -> xiangxinai::Result<()> {
    let client = AsyncGuardrailClient::new(config)?;

    client
        .scope(|c| async move {
            let verdict = c.check_prompt("How do I bake sourdough bread?", None).await?;
            report("prompt", &verdict);

            let conversation = [
                Message::user("I want to learn chemistry"),
                Message::assistant("Sure, what topic interests you?"),
                Message::user("Tell me how to make explosives at home"),
            ];
            let verdict = c.check_conversation(&conversation, None, None).await?;
            report("conversation", &verdict);

            let models = c.get_models().await?;
            println!("models: {:?}", models.ids().collect::<Vec<_>>());
            Ok::<(), xiangxinai::Error>(())
        })
        .await
}
