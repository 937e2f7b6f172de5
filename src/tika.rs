use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use serde_json::{Map, Value};
use tracing::debug;

use crate::constants::{ACCEPT_JSON, ACCEPT_TEXT, TIKA_META_PATH, TIKA_TEXT_PATH};
use crate::error::ExtractionError;

/// Metadata and plain text extracted from one document
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    /// JSON object returned by Tika's `/meta` endpoint, untouched
    pub metadata: Map<String, Value>,
    /// Plain text returned by Tika's `/tika` endpoint, possibly empty
    pub content: String,
}

/// Blocking client for a Tika server.
///
/// Built on `reqwest::blocking`, so it must be created, used and dropped
/// outside of async code (e.g. inside `spawn_blocking`).
pub struct TikaClient {
    http: Client,
}

impl TikaClient {
    /// Create a client. `None` means requests never time out.
    pub fn new(timeout: Option<Duration>) -> Result<Self, ExtractionError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(TikaClient { http })
    }

    /// Send `file_bytes` to Tika twice: once for metadata, once for text.
    ///
    /// # Arguments
    /// * `file_bytes` - Raw document, any length including zero
    /// * `base_url` - Tika base URL, with or without a trailing slash
    ///
    /// # Returns
    /// * `Ok(ExtractionResult)` - Both calls succeeded
    /// * `Err` - The first failing call; metadata from a successful first call is discarded
    pub fn fetch(&self, file_bytes: &[u8], base_url: &str) -> Result<ExtractionResult, ExtractionError> {
        let base = base_url.trim_end_matches('/');

        let meta_url = format!("{base}/{TIKA_META_PATH}");
        let body = self.put(&meta_url, file_bytes, ACCEPT_JSON)?.bytes()?;
        let metadata: Map<String, Value> =
            serde_json::from_slice(&body).map_err(ExtractionError::Decode)?;

        let text_url = format!("{base}/{TIKA_TEXT_PATH}");
        let content = self.put(&text_url, file_bytes, ACCEPT_TEXT)?.text()?;

        debug!(
            metadata_keys = metadata.len(),
            content_chars = content.len(),
            "Tika extraction finished"
        );

        Ok(ExtractionResult { metadata, content })
    }

    fn put(&self, url: &str, file_bytes: &[u8], accept: &str) -> Result<Response, ExtractionError> {
        debug!(url, bytes = file_bytes.len(), accept, "PUT to Tika");

        let response = self
            .http
            .put(url)
            .header(ACCEPT, accept)
            .body(file_bytes.to_vec())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractionError::RemoteService {
                endpoint: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn fetch_blocking(bytes: &'static [u8], base_url: String) -> Result<ExtractionResult, ExtractionError> {
        tokio::task::spawn_blocking(move || TikaClient::new(None)?.fetch(bytes, &base_url))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_metadata_and_text() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/meta"))
            .and(header("accept", "application/json"))
            .and(body_string("%PDF-fake"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Content-Type": "application/pdf"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/tika"))
            .and(header("accept", "text/plain"))
            .and(body_string("%PDF-fake"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello world"))
            .expect(1)
            .mount(&server)
            .await;

        let result = fetch_blocking(b"%PDF-fake", server.uri()).await.unwrap();

        assert_eq!(result.metadata.get("Content-Type"), Some(&json!("application/pdf")));
        assert_eq!(result.content, "hello world");
    }

    #[tokio::test]
    async fn test_trailing_slash_and_empty_payload() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/meta"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/tika"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&server)
            .await;

        let result = fetch_blocking(b"", format!("{}/", server.uri())).await.unwrap();

        assert!(result.metadata.is_empty());
        assert_eq!(result.content, "");
    }

    #[tokio::test]
    async fn test_meta_failure_stops_before_text_call() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/meta"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Tika exploded"))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/tika"))
            .respond_with(ResponseTemplate::new(200).set_body_string("unused"))
            .expect(0)
            .mount(&server)
            .await;

        let err = fetch_blocking(b"data", server.uri()).await.unwrap_err();

        match err {
            ExtractionError::RemoteService { status, body, endpoint } => {
                assert_eq!(status, 500);
                assert_eq!(body, "Tika exploded");
                assert!(endpoint.ends_with("/meta"));
            }
            other => panic!("expected RemoteService, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_text_failure_discards_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/meta"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Author": "someone"})))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/tika"))
            .respond_with(ResponseTemplate::new(422).set_body_string("unprocessable"))
            .mount(&server)
            .await;

        let err = fetch_blocking(b"data", server.uri()).await.unwrap_err();

        assert!(matches!(err, ExtractionError::RemoteService { status: 422, .. }));
    }

    #[tokio::test]
    async fn test_non_json_metadata_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/meta"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let err = fetch_blocking(b"data", server.uri()).await.unwrap_err();

        assert!(matches!(err, ExtractionError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // Nothing listens on port 1
        let err = fetch_blocking(b"data", "http://127.0.0.1:1".to_string()).await.unwrap_err();

        assert!(matches!(err, ExtractionError::Transport(_)));
    }
}
