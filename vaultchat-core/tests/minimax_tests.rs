//! Tests for the MiniMax adapter against a mock server

use futures::StreamExt;
use serde_json::json;
use vaultchat_core::config::{MiniMaxSettings, SecretString};
use vaultchat_core::http::HttpSettings;
use vaultchat_core::protocol::ChatRequest;
use vaultchat_core::providers::{EmptyResponsePolicy, MiniMaxProvider, Provider, ProviderError};
use vaultchat_core::stream::collect_text;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHAT_PATH: &str = "/v1/text/chatcompletion_v2";

fn settings(server: &MockServer) -> MiniMaxSettings {
    MiniMaxSettings {
        api_key: SecretString::new("mm-key"),
        base_url: Some(format!("{}/v1", server.uri())),
        ..Default::default()
    }
}

fn provider(settings: MiniMaxSettings) -> MiniMaxProvider {
    MiniMaxProvider::new("mm", settings, HttpSettings::default(), EmptyResponsePolicy::Allow)
        .unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "mm-1",
        "choices": [{"message": {"role": "assistant", "content": content}, "finish_reason": "stop"}],
        "base_resp": {"status_code": 0, "status_msg": "success"}
    })
}

#[tokio::test]
async fn test_validate_reports_base_resp_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "base_resp": {"status_code": 1004, "status_msg": "login fail"}
        })))
        .mount(&server)
        .await;

    let result = provider(settings(&server)).validate().await;
    assert!(!result.valid);
    let error = result.error.unwrap();
    assert!(error.starts_with("Invalid MiniMax API key"), "{}", error);
    assert!(error.contains("login fail"));
}

#[tokio::test]
async fn test_validate_sends_tiny_probe() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("authorization", "Bearer mm-key"))
        .and(body_partial_json(json!({"max_tokens": 1, "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("p")))
        .expect(1)
        .mount(&server)
        .await;

    assert!(provider(settings(&server)).validate().await.valid);
}

#[tokio::test]
async fn test_validate_uses_configured_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_partial_json(json!({"model": "MiniMax-M1", "max_tokens": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("p")))
        .expect(1)
        .mount(&server)
        .await;

    let configured = MiniMaxSettings {
        model: Some("MiniMax-M1".to_string()),
        ..settings(&server)
    };
    assert!(provider(configured).validate().await.valid);
}

#[tokio::test]
async fn test_base_resp_error_is_not_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "base_resp": {"status_code": 1008, "status_msg": "insufficient balance"}
        })))
        .mount(&server)
        .await;

    let err = provider(settings(&server))
        .chat(ChatRequest::new("MiniMax-M2", vec!["hi"]))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Api { .. }));
    assert!(err.to_string().contains("insufficient balance"));
}

#[tokio::test]
async fn test_chat_strips_reasoning_and_clamps_temperature() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_partial_json(json!({"model": "MiniMax-M2", "temperature": 1.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "<think>The user greets me.</think>\n\nHello!",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(settings(&server))
        .chat(ChatRequest::new("MiniMax-M2", vec!["hi"]).with_temperature(3.0))
        .await
        .unwrap();
    assert_eq!(response.text, "Hello!");
}

#[tokio::test]
async fn test_chat_keeps_reasoning_when_requested() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "<think>plan</think>Answer",
        )))
        .mount(&server)
        .await;

    let response = provider(MiniMaxSettings {
        show_thinking: true,
        ..settings(&server)
    })
    .chat(ChatRequest::new("", vec!["hi"]))
    .await
    .unwrap();
    assert_eq!(response.text, "<think>plan</think>Answer");
}

#[tokio::test]
async fn test_stream_suppresses_split_reasoning_block() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"<thi\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"nk>hmm</th\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"ink>\\n\\nThe \"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"answer\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let stream = provider(settings(&server))
        .chat_stream(ChatRequest::new("MiniMax-M2", vec!["hi"]))
        .await
        .unwrap();
    assert_eq!(collect_text(stream).await.unwrap(), "The answer");
}

#[tokio::test]
async fn test_stream_ends_with_one_terminal_delta() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let deltas: Vec<_> = provider(settings(&server))
        .chat_stream(ChatRequest::new("MiniMax-M2", vec!["hi"]))
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(deltas.len(), 2);
    assert!(deltas.last().unwrap().as_ref().unwrap().done);
    assert_eq!(deltas.iter().filter(|d| d.as_ref().unwrap().done).count(), 1);
}

#[tokio::test]
async fn test_list_models_is_static() {
    let models = provider(MiniMaxSettings::default()).list_models().await;
    let ids: Vec<_> = models.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["MiniMax-M2", "MiniMax-M2-Stable"]);
}
