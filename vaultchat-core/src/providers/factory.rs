//! Builds adapters from configuration entries

use super::adapter::Provider;
use super::error::ProviderResult;
use super::gemini::GeminiProvider;
use super::generic::OpenAiCompatibleProvider;
use super::minimax::MiniMaxProvider;
use super::ollama::OllamaProvider;
use super::openrouter::OpenRouterProvider;
use crate::config::{ProviderEntry, ProviderSettings};
use crate::http::HttpSettings;
use std::sync::Arc;

/// Create the adapter described by `entry`
pub fn build_provider(entry: &ProviderEntry, http: HttpSettings) -> ProviderResult<Arc<dyn Provider>> {
    let id = entry.id.clone();
    let empty = entry.empty_response;

    let provider: Arc<dyn Provider> = match &entry.settings {
        ProviderSettings::OpenRouter(s) => {
            Arc::new(OpenRouterProvider::new(id, s.clone(), http, empty)?)
        }
        ProviderSettings::MiniMax(s) => Arc::new(MiniMaxProvider::new(id, s.clone(), http, empty)?),
        ProviderSettings::Ollama(s) => Arc::new(OllamaProvider::new(id, s.clone(), http, empty)?),
        ProviderSettings::OpenAiCompatible(s) => {
            Arc::new(OpenAiCompatibleProvider::new(id, s.clone(), http, empty)?)
        }
        ProviderSettings::Gemini(s) => Arc::new(GeminiProvider::new(id, s.clone(), http, empty)?),
    };

    Ok(provider)
}
