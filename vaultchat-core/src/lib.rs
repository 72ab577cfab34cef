//! VaultChat Core Library
//!
//! Multi-provider LLM client for chatting with a note vault. Five backends
//! with different wire dialects (OpenRouter, MiniMax, Ollama, generic
//! OpenAI-compatible servers and Gemini) sit behind one [`Provider`] trait;
//! their streams are normalized into a single sequence of [`TokenDelta`]s.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use futures::StreamExt;
//! use vaultchat_core::chat::{ChatSession, Conversation};
//!
//! let config = vaultchat_core::config::load_from_yaml("vaultchat.yaml")?;
//! let session = ChatSession::from_config(&config)?;
//! let mut conversation = Conversation::default();
//!
//! let mut stream = session.ask_stream(None, &mut conversation, "What's due this week?").await?;
//! while let Some(delta) = stream.next().await {
//!     print!("{}", delta?.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod config;
pub mod http;
pub mod protocol;
pub mod providers;
pub mod stream;

pub use protocol::{ChatRequest, ChatResponse, Message, MessageRole, ModelInfo, TokenDelta};
pub use providers::{Provider, ProviderError, ProviderRegistry, ProviderResult};

/// Returns the version of the VaultChat Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
