//! HTTP client implementation using reqwest

use crate::http::error::map_http_error;
use crate::http::{redact_url, HttpSettings, USER_AGENT};
use crate::providers::error::{ProviderError, ProviderResult};
use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Shared HTTP client with connection pooling
///
/// Cloning is cheap; every clone shares one connection pool.
#[derive(Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: Arc<Client>,

    /// Timeouts applied to each call
    settings: HttpSettings,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("settings", &self.settings)
            .finish()
    }
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> ProviderResult<Self> {
        Self::with_settings(HttpSettings::default())
    }

    /// Create a new HTTP client with custom timeouts
    ///
    /// Only the connect timeout is set on the pool; the request timeout is
    /// applied per call so streaming bodies are not cut off mid-answer.
    pub fn with_settings(settings: HttpSettings) -> ProviderResult<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(settings.connect_timeout)
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client: Arc::new(client),
            settings,
        })
    }

    /// Transport settings in effect
    pub fn settings(&self) -> &HttpSettings {
        &self.settings
    }

    /// POST a JSON body and return the successful response text
    pub async fn post_json<B>(
        &self,
        provider: &str,
        url: &str,
        headers: HeaderMap,
        body: &B,
    ) -> ProviderResult<String>
    where
        B: Serialize + ?Sized,
    {
        let request = self
            .client
            .post(url)
            .headers(headers)
            .timeout(self.settings.request_timeout)
            .json(body);
        let response = self.execute(provider, url, request).await?;
        read_text(provider, response).await
    }

    /// GET a URL and return the successful response text
    pub async fn get_text(
        &self,
        provider: &str,
        url: &str,
        headers: HeaderMap,
    ) -> ProviderResult<String> {
        let request = self
            .client
            .get(url)
            .headers(headers)
            .timeout(self.settings.request_timeout);
        let response = self.execute(provider, url, request).await?;
        read_text(provider, response).await
    }

    /// POST a JSON body for a streaming answer
    ///
    /// Resolves once response headers arrive with a success status; the body
    /// is left unread for the caller to consume incrementally.
    pub async fn post_stream<B>(
        &self,
        provider: &str,
        url: &str,
        headers: HeaderMap,
        body: &B,
    ) -> ProviderResult<Response>
    where
        B: Serialize + ?Sized,
    {
        let request = self.client.post(url).headers(headers).json(body);
        match tokio::time::timeout(
            self.settings.request_timeout,
            self.execute(provider, url, request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Timed out waiting for stream headers from {} [url: {}]",
                    provider,
                    redact_url(url)
                );
                Err(ProviderError::Timeout)
            }
        }
    }

    /// Send a request and map non-success statuses to errors
    async fn execute(
        &self,
        provider: &str,
        url: &str,
        request: RequestBuilder,
    ) -> ProviderResult<Response> {
        let request_id = Uuid::new_v4();

        info!(
            "Executing HTTP request to {} [request_id: {}]",
            provider, request_id
        );
        debug!("Request URL: {}", redact_url(url));

        let response = request
            .header("X-Request-ID", request_id.to_string())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!(
                        "Request timeout for {} [request_id: {}]",
                        provider, request_id
                    );
                    ProviderError::Timeout
                } else if e.is_connect() {
                    error!(
                        "Connection error for {} [request_id: {}]: {}",
                        provider, request_id, e
                    );
                    ProviderError::Network(format!("Connection failed: {}", e))
                } else {
                    error!(
                        "Request error for {} [request_id: {}]: {}",
                        provider, request_id, e
                    );
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        debug!("Response status: {} [request_id: {}]", status, request_id);

        if !status.is_success() {
            let body = response.text().await.ok();

            warn!(
                "Request failed with status {} for {} [request_id: {}]",
                status, provider, request_id
            );

            return Err(map_http_error(status, body.as_deref()));
        }

        Ok(response)
    }
}

async fn read_text(provider: &str, response: Response) -> ProviderResult<String> {
    response.text().await.map_err(|e| {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Network(format!(
                "Failed to read response body from {}: {}",
                provider, e
            ))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, AUTHORIZATION};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_post_json_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("authorization", "Bearer k"))
            .and(body_json(json!({"ping": true})))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer k"));

        let text = client
            .post_json("test", &format!("{}/echo", server.uri()), headers, &json!({"ping": true}))
            .await
            .unwrap();
        assert_eq!(text, "pong");
    }

    #[tokio::test]
    async fn test_error_status_is_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"error": {"message": "bad key"}})),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let err = client
            .get_text("test", &format!("{}/models", server.uri()), HeaderMap::new())
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::Authentication("bad key".to_string()));
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = HttpClient::with_settings(
            HttpSettings::default().with_request_timeout(Duration::from_millis(50)),
        )
        .unwrap();
        let err = client
            .get_text("test", &server.uri(), HeaderMap::new())
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::Timeout);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = HttpClient::new().unwrap();
        let err = client
            .get_text("test", "http://127.0.0.1:1/nothing", HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)), "got {:?}", err);
    }
}
