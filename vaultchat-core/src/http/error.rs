//! HTTP error mapping utilities

use crate::providers::error::ProviderError;
use reqwest::StatusCode;
use serde_json::Value;

/// Longest raw body excerpt carried in an error when no envelope message exists
const MAX_RAW_BODY_CHARS: usize = 300;

/// Map HTTP status code and response body to a ProviderError
pub fn map_http_error(status: StatusCode, body: Option<&str>) -> ProviderError {
    let error_message = body
        .and_then(|b| serde_json::from_str::<Value>(b).ok())
        .and_then(|v| extract_error_message(&v))
        .or_else(|| body.map(str::trim).filter(|b| !b.is_empty()).map(truncate_body))
        .unwrap_or_else(|| {
            format!(
                "HTTP error {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
            .trim_end()
            .to_string()
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::Authentication(error_message)
        }

        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderError::Timeout,

        status => ProviderError::api(status.as_u16(), error_message),
    }
}

/// Extract the human-readable message from a JSON error envelope
///
/// Recognized shapes:
/// - `{ "error": { "message": "..." } }` (OpenAI, OpenRouter, Gemini)
/// - `{ "error": "..." }` (Ollama)
/// - `{ "message": "..." }` / `{ "detail": "..." }` (generic servers)
/// - `{ "base_resp": { "status_code": n, "status_msg": "..." } }` with `n != 0` (MiniMax)
pub fn extract_error_message(json: &Value) -> Option<String> {
    if let Some(error) = json.get("error") {
        if let Some(message) = error.get("message").and_then(Value::as_str) {
            return Some(message.to_string());
        }
        if let Some(message) = error.as_str() {
            return Some(message.to_string());
        }
    }

    if let Some(base) = json.get("base_resp") {
        let code = base.get("status_code").and_then(Value::as_i64).unwrap_or(0);
        if code != 0 {
            let message = base
                .get("status_msg")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Some(format!("{} (code {})", message, code));
        }
    }

    for key in ["message", "detail"] {
        if let Some(message) = json.get(key).and_then(Value::as_str) {
            return Some(message.to_string());
        }
    }

    None
}

/// Turn an error envelope found in a successful (2xx) body into an error
///
/// Credential rejections carried in the envelope (`error.code` 401/403,
/// MiniMax `base_resp` 1004/2049) become [`ProviderError::Authentication`].
pub fn error_from_envelope(json: &Value) -> Option<ProviderError> {
    let message = extract_error_message(json)?;

    let code = json
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(Value::as_i64)
        .or_else(|| {
            json.get("base_resp")
                .and_then(|b| b.get("status_code"))
                .and_then(Value::as_i64)
        });

    Some(match code {
        Some(401) | Some(403) | Some(1004) | Some(2049) => ProviderError::Authentication(message),
        Some(code) if (400..600).contains(&code) => ProviderError::api(code as u16, message),
        _ => ProviderError::api(None, message),
    })
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_RAW_BODY_CHARS {
        return body.to_string();
    }
    let cut: String = body.chars().take(MAX_RAW_BODY_CHARS).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_openai_envelope() {
        let err = map_http_error(
            StatusCode::BAD_REQUEST,
            Some(r#"{"error":{"message":"model not found","type":"invalid_request_error"}}"#),
        );
        assert_eq!(err, ProviderError::api(400, "model not found"));
    }

    #[test]
    fn test_unauthorized_maps_to_authentication() {
        let err = map_http_error(
            StatusCode::UNAUTHORIZED,
            Some(r#"{"error":{"message":"No auth credentials found","code":401}}"#),
        );
        assert_eq!(
            err,
            ProviderError::Authentication("No auth credentials found".to_string())
        );
    }

    #[test]
    fn test_ollama_string_envelope() {
        let err = map_http_error(
            StatusCode::NOT_FOUND,
            Some(r#"{"error":"model 'llama9' not found"}"#),
        );
        assert_eq!(err, ProviderError::api(404, "model 'llama9' not found"));
    }

    #[test]
    fn test_plain_text_body() {
        let err = map_http_error(StatusCode::BAD_GATEWAY, Some("upstream exploded\n"));
        assert_eq!(err, ProviderError::api(502, "upstream exploded"));
    }

    #[test]
    fn test_empty_body_uses_status() {
        let err = map_http_error(StatusCode::SERVICE_UNAVAILABLE, Some(""));
        assert_eq!(
            err,
            ProviderError::api(503, "HTTP error 503 Service Unavailable")
        );
    }

    #[test]
    fn test_gateway_timeout() {
        assert_eq!(
            map_http_error(StatusCode::GATEWAY_TIMEOUT, None),
            ProviderError::Timeout
        );
    }

    #[test]
    fn test_minimax_base_resp() {
        let body = json!({"base_resp": {"status_code": 1004, "status_msg": "login fail"}});
        assert_eq!(
            extract_error_message(&body).as_deref(),
            Some("login fail (code 1004)")
        );

        let ok = json!({"base_resp": {"status_code": 0, "status_msg": "success"}});
        assert_eq!(extract_error_message(&ok), None);
    }

    #[test]
    fn test_envelope_in_success_body() {
        let body = json!({"error": {"message": "Rate limit exceeded", "code": 429}});
        assert_eq!(
            error_from_envelope(&body),
            Some(ProviderError::api(429, "Rate limit exceeded"))
        );

        let body = json!({"base_resp": {"status_code": 2049, "status_msg": "invalid api key"}});
        assert!(matches!(
            error_from_envelope(&body),
            Some(ProviderError::Authentication(_))
        ));

        let ok = json!({"choices": [{"message": {"content": "hi"}}]});
        assert_eq!(error_from_envelope(&ok), None);
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(1000);
        match map_http_error(StatusCode::INTERNAL_SERVER_ERROR, Some(&body)) {
            ProviderError::Api { message, .. } => {
                assert!(message.ends_with("..."));
                assert_eq!(message.len(), MAX_RAW_BODY_CHARS + 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
