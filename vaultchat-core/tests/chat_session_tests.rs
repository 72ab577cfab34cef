//! Chat session tests with an in-memory vault and a scripted provider

use async_trait::async_trait;
use futures::stream;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use vaultchat_core::chat::{
    ChatError, ChatSession, Conversation, DocumentStore, SearchHit, StoreError,
};
use vaultchat_core::config::{ChatDefaults, GroundingConfig};
use vaultchat_core::protocol::{
    ChatRequest, ChatResponse, MessageRole, ModelInfo, TokenDelta, ValidationResult,
};
use vaultchat_core::providers::{Provider, ProviderError, ProviderRegistry, ProviderResult};
use vaultchat_core::stream::{collect_text, TokenStream};

/// Answers with a fixed text, or fails, and remembers every request
struct ScriptedProvider {
    id: String,
    answer: Result<String, ProviderError>,
    seen: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    fn answering(id: &str, answer: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            answer: Ok(answer.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing(id: &str, error: ProviderError) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            answer: Err(error),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn last_request(&self) -> ChatRequest {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        "Scripted"
    }

    async fn validate(&self) -> ValidationResult {
        ValidationResult::ok()
    }

    async fn list_models(&self) -> Vec<ModelInfo> {
        Vec::new()
    }

    async fn chat(&self, request: ChatRequest) -> ProviderResult<ChatResponse> {
        self.seen.lock().unwrap().push(request);
        self.answer.clone().map(ChatResponse::new)
    }

    async fn chat_stream(&self, request: ChatRequest) -> ProviderResult<TokenStream> {
        self.seen.lock().unwrap().push(request);
        let answer = self.answer.clone()?;
        let mut deltas: Vec<ProviderResult<TokenDelta>> = answer
            .split_inclusive(' ')
            .map(|word| Ok(TokenDelta::text(word)))
            .collect();
        deltas.push(Ok(TokenDelta::done()));
        Ok(Box::pin(stream::iter(deltas)))
    }
}

/// Vault held in memory; search matches titles containing a query word
#[derive(Default)]
struct MemoryVault {
    notes: HashMap<String, (String, String)>,
    broken: bool,
}

impl MemoryVault {
    fn with_note(mut self, path: &str, title: &str, text: &str) -> Self {
        self.notes
            .insert(path.to_string(), (title.to_string(), text.to_string()));
        self
    }
}

#[async_trait]
impl DocumentStore for MemoryVault {
    async fn read_document(&self, path: &str) -> Result<String, StoreError> {
        self.notes
            .get(path)
            .map(|(_, text)| text.clone())
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, StoreError> {
        if self.broken {
            return Err(StoreError::Search("index unavailable".to_string()));
        }
        let query = query.to_lowercase();
        let mut hits: Vec<SearchHit> = self
            .notes
            .iter()
            .filter(|(_, (title, _))| {
                query
                    .split_whitespace()
                    .any(|word| title.to_lowercase().contains(word.trim_matches('?')))
            })
            .map(|(path, (title, _))| SearchHit::new(title.clone(), path.clone(), 1.0))
            .collect();
        hits.sort_by(|a, b| a.path.cmp(&b.path));
        hits.truncate(limit);
        Ok(hits)
    }
}

fn session_with(provider: Arc<ScriptedProvider>) -> ChatSession {
    let mut registry = ProviderRegistry::new();
    registry.register(provider);
    let defaults = ChatDefaults {
        provider: Some("scripted".to_string()),
        ..Default::default()
    };
    ChatSession::new(registry, defaults)
}

#[tokio::test]
async fn test_ask_appends_both_turns() {
    let provider = ScriptedProvider::answering("scripted", "Forty-two.");
    let session = session_with(provider.clone());
    let mut conversation = Conversation::new("Be helpful.");

    let response = session
        .ask(None, &mut conversation, "What is the answer?")
        .await
        .unwrap();
    assert_eq!(response.text, "Forty-two.");
    assert_eq!(conversation.len(), 2);
    assert_eq!(conversation.messages()[1].role, MessageRole::Assistant);

    let request = provider.last_request();
    assert_eq!(request.messages[0].role, MessageRole::System);
    assert_eq!(request.messages[0].content, "Be helpful.");
    assert_eq!(request.messages.last().unwrap().content, "What is the answer?");
    assert_eq!(request.max_tokens, Some(2048));
    assert_eq!(request.temperature, None);
}

#[tokio::test]
async fn test_configured_temperature_is_sent() {
    let provider = ScriptedProvider::answering("scripted", "ok");
    let mut registry = ProviderRegistry::new();
    registry.register(provider.clone());
    let session = ChatSession::new(
        registry,
        ChatDefaults {
            provider: Some("scripted".to_string()),
            temperature: Some(0.2),
            ..Default::default()
        },
    );

    session
        .ask(None, &mut Conversation::default(), "hi")
        .await
        .unwrap();
    assert_eq!(provider.last_request().temperature, Some(0.2));
}

#[tokio::test]
async fn test_history_is_sent_in_order() {
    let provider = ScriptedProvider::answering("scripted", "ok");
    let session = session_with(provider.clone());
    let mut conversation = Conversation::default();

    session.ask(None, &mut conversation, "first").await.unwrap();
    session.ask(None, &mut conversation, "second").await.unwrap();

    let contents: Vec<_> = provider
        .last_request()
        .messages
        .iter()
        .skip(1)
        .map(|m| m.content.clone())
        .collect();
    assert_eq!(contents, vec!["first", "ok", "second"]);
}

#[tokio::test]
async fn test_failed_ask_leaves_conversation_untouched() {
    let provider = ScriptedProvider::failing("scripted", ProviderError::api(500, "down"));
    let session = session_with(provider);
    let mut conversation = Conversation::default();

    let err = session.ask(None, &mut conversation, "hi").await.unwrap_err();
    assert_eq!(err, ChatError::Provider(ProviderError::api(500, "down")));
    assert!(conversation.is_empty());
}

#[tokio::test]
async fn test_provider_resolution() {
    let session = session_with(ScriptedProvider::answering("scripted", "ok"));
    let mut conversation = Conversation::default();

    let err = session
        .ask(Some("missing"), &mut conversation, "hi")
        .await
        .unwrap_err();
    assert_eq!(err, ChatError::UnknownProvider("missing".to_string()));

    let unselected = ChatSession::new(ProviderRegistry::new(), ChatDefaults::default());
    let err = unselected
        .ask(None, &mut conversation, "hi")
        .await
        .unwrap_err();
    assert_eq!(err, ChatError::NoProviderSelected);
}

#[tokio::test]
async fn test_grounded_question_carries_note_excerpts() {
    let provider = ScriptedProvider::answering("scripted", "See your recipe.");
    let vault = MemoryVault::default()
        .with_note("Cooking/Pancakes.md", "Pancakes", "# Pancakes\n\nFlour, milk, eggs.")
        .with_note("Work/Standup.md", "Standup", "Daily at 9.");
    let session = session_with(provider.clone()).with_store(vault, GroundingConfig::default());
    let mut conversation = Conversation::new("Be helpful.");

    session
        .ask(None, &mut conversation, "How do I make pancakes?")
        .await
        .unwrap();

    let system = provider.last_request().messages[0].content.clone();
    assert!(system.starts_with("Be helpful.\n\n"));
    assert!(system.contains("[1] Pancakes (Cooking/Pancakes.md)"));
    assert!(system.contains("Flour, milk, eggs."));
    assert!(!system.contains("Daily at 9."));
}

#[tokio::test]
async fn test_store_failure_answers_ungrounded() {
    let provider = ScriptedProvider::answering("scripted", "ok");
    let vault = MemoryVault {
        broken: true,
        ..Default::default()
    };
    let session = session_with(provider.clone()).with_store(vault, GroundingConfig::default());
    let mut conversation = Conversation::new("Base.");

    session.ask(None, &mut conversation, "anything").await.unwrap();
    assert_eq!(provider.last_request().messages[0].content, "Base.");
}

#[tokio::test]
async fn test_ask_stream_appends_question_after_handshake() {
    let provider = ScriptedProvider::answering("scripted", "streamed answer here");
    let session = session_with(provider.clone());
    let mut conversation = Conversation::default();

    let stream = session
        .ask_stream(None, &mut conversation, "go")
        .await
        .unwrap();
    assert_eq!(conversation.len(), 1);
    assert_eq!(provider.last_request().stream, Some(true));

    let answer = collect_text(stream).await.unwrap();
    assert_eq!(answer, "streamed answer here");
    conversation.push_assistant(answer);
    assert_eq!(conversation.len(), 2);
}

#[tokio::test]
async fn test_ask_stream_rejected_handshake() {
    let provider = ScriptedProvider::failing(
        "scripted",
        ProviderError::Authentication("bad key".to_string()),
    );
    let session = session_with(provider);
    let mut conversation = Conversation::default();

    let result = session.ask_stream(None, &mut conversation, "go").await;
    assert!(matches!(result, Err(ChatError::Provider(ProviderError::Authentication(_)))));
    assert!(conversation.is_empty());
}
