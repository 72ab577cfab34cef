//! Streaming chat demo
//!
//! Loads a settings file, validates every configured provider, then streams
//! one answer from the default provider token by token.
//!
//! Run with: cargo run --example stream_chat -- vaultchat.yaml "What is a zettelkasten?"

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use std::io::Write;
use tracing_subscriber::EnvFilter;
use vaultchat_core::chat::{ChatSession, Conversation};
use vaultchat_core::config::load_from_yaml;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: stream_chat <settings.yaml> [question]");
    };
    let question = args
        .next()
        .unwrap_or_else(|| "Summarize what you can do in one sentence.".to_string());

    let config = load_from_yaml(&path).with_context(|| format!("loading {}", path))?;
    let session = ChatSession::from_config(&config)?;

    println!("\n🔌 Providers\n");
    for provider in session.registry().list() {
        let result = provider.validate().await;
        match result.error {
            None => println!("  ✅ {} ({})", provider.display_name(), provider.id()),
            Some(error) => println!("  ❌ {} ({}): {}", provider.display_name(), provider.id(), error),
        }
    }

    let mut conversation = Conversation::default();
    let mut stream = session
        .ask_stream(None, &mut conversation, &question)
        .await
        .context("starting the answer")?;

    println!("\n💬 {}\n", question);
    let mut answer = String::new();
    while let Some(delta) = stream.next().await {
        let delta = delta?;
        if delta.done {
            break;
        }
        print!("{}", delta.content);
        std::io::stdout().flush()?;
        answer.push_str(&delta.content);
    }
    println!("\n");

    conversation.push_assistant(answer);
    println!("📝 Transcript\n\n{}", conversation.to_markdown("Demo chat"));
    Ok(())
}
