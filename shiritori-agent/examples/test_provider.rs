//! Example: Ask a real model for one shiritori word
//!
//! Run with:
//!   # Gemini (default):
//!   GOOGLE_API_KEY=xxx cargo run --example test_provider -- りんご ごりら
//!
//!   # Use local Ollama:
//!   cargo run --example test_provider -- --ollama りんご
//!
//!   # Just output the prompt:
//!   cargo run --example test_provider -- --prompt-only りんご ごりら

use shiritori_agent::{build_prompt, LlmPlayer, Player};
use shiritori_core::{AnyProvider, GameConfig, GameState, ProviderConfig, TurnEngine};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().skip(1).collect();

    let use_ollama = args.iter().any(|arg| arg == "--ollama");
    let prompt_only = args.iter().any(|arg| arg == "--prompt-only");
    let words: Vec<&str> = args
        .iter()
        .filter(|arg| !arg.starts_with("--"))
        .map(String::as_str)
        .collect();

    // Replay the given chain so the prompt reflects a real position
    let config = GameConfig::new();
    let mut state = GameState::new(&config);
    let engine = TurnEngine::new(&config);
    for word in &words {
        let outcome = engine.play_turn(&mut state, Some(word))?;
        if outcome.ends_game() {
            println!("Chain ends at {}: {}", word, state.status().describe(&config));
            return Ok(());
        }
    }
    let ctx = state.context();

    if prompt_only {
        for message in build_prompt(&ctx) {
            println!("=== {:?} ===\n{}\n", message.role, message.content);
        }
        return Ok(());
    }

    let provider_config = if use_ollama {
        println!("Using Ollama (localhost:11434)...");
        ProviderConfig::local("http://localhost:11434/v1", "llama3")
    } else {
        println!("Using Gemini...");
        ProviderConfig::gemini(env::var("GOOGLE_API_KEY").unwrap_or_default())
    };

    let provider = Arc::new(AnyProvider::from_config(provider_config)?);
    let mut player = LlmPlayer::new(ctx.player.clone(), provider);
    let reply = player.next_word(&ctx).await;
    println!("{} -> {:?}", ctx.player, reply);

    Ok(())
}
