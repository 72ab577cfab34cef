//! Grounded chat sessions

use super::conversation::Conversation;
use super::grounding::{Grounder, Grounding};
use super::store::DocumentStore;
use crate::config::{ChatDefaults, GroundingConfig, VaultChatConfig};
use crate::protocol::{ChatRequest, ChatResponse, Message};
use crate::providers::{Provider, ProviderError, ProviderRegistry, ProviderResult};
use crate::stream::TokenStream;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from a chat session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("No provider selected")]
    NoProviderSelected,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Binds providers, note grounding and request defaults
pub struct ChatSession {
    registry: ProviderRegistry,
    grounder: Option<Grounder<Arc<dyn DocumentStore>>>,
    defaults: ChatDefaults,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("registry", &self.registry)
            .field("grounded", &self.grounder.is_some())
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl ChatSession {
    /// A session without note grounding
    pub fn new(registry: ProviderRegistry, defaults: ChatDefaults) -> Self {
        Self {
            registry,
            grounder: None,
            defaults,
        }
    }

    /// Build the registry and defaults from configuration
    pub fn from_config(config: &VaultChatConfig) -> ProviderResult<Self> {
        Ok(Self::new(
            ProviderRegistry::from_config(config)?,
            config.defaults.clone(),
        ))
    }

    /// Ground questions in notes from `store`
    pub fn with_store<S>(mut self, store: S, config: GroundingConfig) -> Self
    where
        S: DocumentStore + 'static,
    {
        let store: Arc<dyn DocumentStore> = Arc::new(store);
        self.grounder = Some(Grounder::new(store, config));
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn defaults(&self) -> &ChatDefaults {
        &self.defaults
    }

    /// Apply changed settings: providers are rebuilt wholesale
    pub fn reconfigure(&mut self, config: &VaultChatConfig) -> ProviderResult<()> {
        self.registry.rebuild(config)?;
        self.defaults = config.defaults.clone();
        info!("Chat session reconfigured with {} providers", self.registry.len());
        Ok(())
    }

    /// Resolve the provider for a call
    pub fn provider(&self, id: Option<&str>) -> Result<Arc<dyn Provider>, ChatError> {
        let id = id
            .or(self.defaults.provider.as_deref())
            .ok_or(ChatError::NoProviderSelected)?;
        self.registry
            .get(id)
            .ok_or_else(|| ChatError::UnknownProvider(id.to_string()))
    }

    /// Retrieve notes for a question
    pub async fn ground(&self, question: &str) -> Grounding {
        match &self.grounder {
            Some(grounder) => grounder.ground(question).await,
            None => Grounding::default(),
        }
    }

    /// Request for `question` asked after the turns already in `conversation`
    pub fn build_request(
        &self,
        conversation: &Conversation,
        grounding: &Grounding,
        question: &str,
    ) -> ChatRequest {
        let mut messages = Vec::with_capacity(conversation.len() + 2);
        messages.push(Message::system(
            grounding.system_prompt(conversation.system_prompt()),
        ));
        messages.extend(conversation.messages().iter().cloned());
        messages.push(Message::user(question));

        let request = ChatRequest::new(self.defaults.model.clone().unwrap_or_default(), messages)
            .with_max_tokens(self.defaults.max_tokens);
        match self.defaults.temperature {
            Some(temperature) => request.with_temperature(temperature),
            None => request,
        }
    }

    /// Ask and wait for the whole answer
    ///
    /// On success the question and the answer are appended to the
    /// conversation; on failure it is left untouched.
    pub async fn ask(
        &self,
        provider_id: Option<&str>,
        conversation: &mut Conversation,
        question: &str,
    ) -> Result<ChatResponse, ChatError> {
        let provider = self.provider(provider_id)?;
        let grounding = self.ground(question).await;
        let request = self.build_request(conversation, &grounding, question);

        debug!(
            "Asking {} with {} notes attached",
            provider.id(),
            grounding.sources.len()
        );
        let response = provider.chat(request).await?;

        conversation.push_user(question);
        conversation.push_assistant(response.text.clone());
        Ok(response)
    }

    /// Ask and stream the answer
    ///
    /// The question is appended once the provider accepts the request; the
    /// caller appends the accumulated answer with
    /// [`Conversation::push_assistant`].
    pub async fn ask_stream(
        &self,
        provider_id: Option<&str>,
        conversation: &mut Conversation,
        question: &str,
    ) -> Result<TokenStream, ChatError> {
        let provider = self.provider(provider_id)?;
        let grounding = self.ground(question).await;
        let request = self
            .build_request(conversation, &grounding, question)
            .with_streaming();

        let stream = provider.chat_stream(request).await?;
        conversation.push_user(question);
        Ok(stream)
    }
}
