//! Conversion between the uniform protocol and the OpenAI dialect

use super::types::*;
use crate::protocol::{ChatRequest, ChatResponse, CompletionUsage, Message, ModelInfo};
use crate::providers::error::{ProviderError, ProviderResult};

/// Convert a ChatRequest to the OpenAI wire format
///
/// `model` is the already-resolved model id; the request's own field may be
/// empty.
pub fn to_openai_request(request: &ChatRequest, model: &str, stream: bool) -> OpenAIRequest {
    OpenAIRequest {
        model: model.to_string(),
        messages: request.messages.iter().map(to_openai_message).collect(),
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        stream,
    }
}

fn to_openai_message(message: &Message) -> OpenAIMessage {
    OpenAIMessage {
        role: message.role.as_str().to_string(),
        content: message.content.clone(),
    }
}

/// Convert an OpenAI response to a ChatResponse
///
/// Only the first choice's `content` is used. A `null` content becomes empty
/// text; the empty-response policy decides what that means.
pub fn from_openai_response(response: OpenAIResponse) -> ProviderResult<ChatResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Parse("Response contained no choices".to_string()))?;

    let mut chat = ChatResponse::new(choice.message.content.unwrap_or_default());
    if let Some(usage) = response.usage {
        chat = chat.with_usage(CompletionUsage::new(
            usage.prompt_tokens,
            usage.completion_tokens,
        ));
    }
    Ok(chat)
}

/// Convert a streaming chunk to its visible text, if any
pub fn from_openai_stream_chunk(chunk: OpenAIStreamChunk) -> Option<String> {
    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|text| !text.is_empty())
}

/// Convert a model listing to ModelInfo entries
pub fn from_openai_models(list: OpenAIModelList) -> Vec<ModelInfo> {
    list.data
        .into_iter()
        .map(|m| {
            let name = m.name.unwrap_or_else(|| m.id.clone());
            let info = ModelInfo::new(m.id, name);
            match m.context_length {
                Some(len) => info.with_context_length(len),
                None => info,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Message;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let request = ChatRequest::new("", vec![Message::system("s"), Message::user("u")])
            .with_max_tokens(100);
        let body = serde_json::to_value(to_openai_request(&request, "gpt-4o", true)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4o",
                "messages": [
                    {"role": "system", "content": "s"},
                    {"role": "user", "content": "u"}
                ],
                "max_tokens": 100,
                "stream": true
            })
        );
    }

    #[test]
    fn test_reasoning_content_is_ignored() {
        let response: OpenAIResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "Answer", "reasoning_content": "hmm"}}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4}
        }))
        .unwrap();
        let chat = from_openai_response(response).unwrap();
        assert_eq!(chat.text, "Answer");
        assert_eq!(chat.usage.unwrap().total_tokens, 4);
    }

    #[test]
    fn test_null_content_is_empty_text() {
        let response: OpenAIResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": null}}]})).unwrap();
        assert_eq!(from_openai_response(response).unwrap().text, "");
    }

    #[test]
    fn test_no_choices_is_parse_error() {
        let response: OpenAIResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(
            from_openai_response(response),
            Err(ProviderError::Parse(_))
        ));
    }

    #[test]
    fn test_model_listing() {
        let list: OpenAIModelList = serde_json::from_value(json!({
            "data": [
                {"id": "openai/gpt-4o", "name": "GPT-4o", "context_length": 128000},
                {"id": "local-model"}
            ]
        }))
        .unwrap();
        let models = from_openai_models(list);
        assert_eq!(models[0].name, "GPT-4o");
        assert_eq!(models[0].context_length, Some(128000));
        assert_eq!(models[1].name, "local-model");
    }
}
