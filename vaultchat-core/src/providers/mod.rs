//! LLM provider adapters
//!
//! Each adapter translates the uniform chat protocol into one backend's wire
//! dialect and normalizes answers and streams back. The registry holds the
//! configured instances by id.

pub mod adapter;
pub mod error;
pub mod factory;
pub mod gemini;
pub mod generic;
pub mod minimax;
pub mod ollama;
pub mod openai;
pub mod openrouter;
pub mod registry;

pub use adapter::{EmptyResponsePolicy, Provider};
pub use error::{ProviderError, ProviderResult};
pub use factory::build_provider;
pub use registry::ProviderRegistry;

// Re-export concrete providers
pub use gemini::GeminiProvider;
pub use generic::{normalize_endpoint, OpenAiCompatibleProvider};
pub use minimax::MiniMaxProvider;
pub use ollama::OllamaProvider;
pub use openrouter::OpenRouterProvider;
