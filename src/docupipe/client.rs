use async_trait::async_trait;
use base64::Engine as _;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::models::{
    CreateDocumentRequest, CreateDocumentResponse, DocumentBody, FileBody, StandardizeRequest,
    StandardizeResponse,
};
use super::DocumentService;
use crate::config::{ApiKey, DocuPipeConfig};
use crate::error::{Service, UpstreamError};

const API_KEY_HEADER: &str = "X-API-Key";

/// reqwest-backed DocuPipe client. No retries; non-success is an error.
#[derive(Debug, Clone)]
pub struct DocuPipeClient {
    http: Client,
    base_url: String,
    api_key: ApiKey,
}

impl DocuPipeClient {
    pub fn new(config: &DocuPipeConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl DocumentService for DocuPipeClient {
    async fn upload(&self, contents: &[u8], filename: &str) -> Result<String, UpstreamError> {
        let body = CreateDocumentRequest {
            document: DocumentBody {
                file: FileBody {
                    contents: base64::engine::general_purpose::STANDARD.encode(contents),
                    filename,
                },
            },
        };

        let resp = self
            .http
            .post(self.url("document"))
            .header(API_KEY_HEADER, self.api_key.expose())
            .header("accept", "application/json")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let data: CreateDocumentResponse = read_json(resp).await?;
        non_empty_id(data.document_id, "documentId")
    }

    async fn fetch_resource(&self, path: &str) -> Result<Value, UpstreamError> {
        let resp = self
            .http
            .get(self.url(path))
            .header(API_KEY_HEADER, self.api_key.expose())
            .send()
            .await?;

        read_json(resp).await
    }

    async fn request_standardization(
        &self,
        document_id: &str,
        schema_id: &str,
    ) -> Result<String, UpstreamError> {
        let body = StandardizeRequest {
            document_id,
            schema_id,
        };

        let resp = self
            .http
            .post(self.url("standardize"))
            .header(API_KEY_HEADER, self.api_key.expose())
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let data: StandardizeResponse = read_json(resp).await?;
        non_empty_id(data.standardization_id, "standardizationId")
    }
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, UpstreamError> {
    if !resp.status().is_success() {
        return Err(UpstreamError::from_response(Service::DocuPipe, resp).await);
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| UpstreamError::Parse(format!("DocuPipe returned invalid JSON: {}", e)))
}

fn non_empty_id(id: Option<String>, field: &str) -> Result<String, UpstreamError> {
    match id {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(UpstreamError::Parse(format!(
            "DocuPipe response has no {}",
            field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(HeaderMap, Value)>>>;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str) -> DocuPipeClient {
        DocuPipeClient::new(&DocuPipeConfig {
            api_key: ApiKey::new("test-key"),
            base_url: format!("{}/", base_url),
            schema_id: "59839e02".into(),
        })
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("x-api-key").and_then(|v| v.to_str().ok()) == Some("test-key")
    }

    async fn create_document(
        State(seen): State<Seen>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if !authorized(&headers) {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "bad key" })));
        }
        seen.lock().unwrap().push((headers, body));
        (StatusCode::OK, Json(json!({ "documentId": "doc_1", "jobId": "job_9" })))
    }

    async fn standardize(
        State(seen): State<Seen>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        seen.lock().unwrap().push((headers, body));
        Json(json!({ "standardizationId": "std_1" }))
    }

    async fn get_document(headers: HeaderMap, Path(id): Path<String>) -> (StatusCode, Json<Value>) {
        if !authorized(&headers) {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "bad key" })));
        }
        (StatusCode::OK, Json(json!({ "documentId": id, "status": "processing" })))
    }

    fn router(seen: Seen) -> Router {
        Router::new()
            .route("/document", post(create_document))
            .route("/document/:id", get(get_document))
            .route("/standardize", post(standardize))
            .with_state(seen)
    }

    #[tokio::test]
    async fn test_upload_sends_base64_contents() {
        let seen = Seen::default();
        let base = spawn(router(seen.clone())).await;

        let id = client(&base).upload(b"hello", "invoice.pdf").await.unwrap();
        assert_eq!(id, "doc_1");

        let seen = seen.lock().unwrap();
        let (headers, body) = &seen[0];
        assert_eq!(
            body,
            &json!({ "document": { "file": { "contents": "aGVsbG8=", "filename": "invoice.pdf" } } })
        );
        assert_eq!(headers["accept"], "application/json");
        assert_eq!(headers["content-type"], "application/json");
    }

    #[tokio::test]
    async fn test_upload_rejected_key_is_upstream_error() {
        let base = spawn(router(Seen::default())).await;
        let mut client = client(&base);
        client.api_key = ApiKey::new("wrong-key");

        let err = client.upload(b"hello", "invoice.pdf").await.unwrap_err();
        match err {
            UpstreamError::Api {
                service, status, ..
            } => {
                assert_eq!(service, Service::DocuPipe);
                assert_eq!(status, 401);
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_server_error() {
        let app = Router::new().route(
            "/document",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = spawn(app).await;

        let err = client(&base).upload(b"x", "a.pdf").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Api { status: 500, ref message, .. } if message == "boom"));
    }

    #[tokio::test]
    async fn test_upload_empty_id_is_parse_error() {
        let app = Router::new().route(
            "/document",
            post(|| async { Json(json!({ "documentId": "" })) }),
        );
        let base = spawn(app).await;

        let err = client(&base).upload(b"x", "a.pdf").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Parse(_)));
    }

    #[tokio::test]
    async fn test_fetch_resource_returns_body() {
        let base = spawn(router(Seen::default())).await;

        let payload = client(&base).fetch_resource("document/doc_1").await.unwrap();
        assert_eq!(payload, json!({ "documentId": "doc_1", "status": "processing" }));
    }

    #[tokio::test]
    async fn test_fetch_resource_non_json_body() {
        let app = Router::new().route("/document/:id", get(|| async { "<html>maintenance</html>" }));
        let base = spawn(app).await;

        let err = client(&base).fetch_resource("document/doc_1").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Parse(_)));
    }

    #[tokio::test]
    async fn test_request_standardization() {
        let seen = Seen::default();
        let base = spawn(router(seen.clone())).await;

        let id = client(&base)
            .request_standardization("doc_1", "59839e02")
            .await
            .unwrap();
        assert_eq!(id, "std_1");

        let seen = seen.lock().unwrap();
        let (headers, body) = &seen[0];
        assert_eq!(body, &json!({ "documentId": "doc_1", "schemaId": "59839e02" }));
        assert_eq!(headers["x-api-key"], "test-key");
    }

    #[test]
    fn test_url_joining() {
        let client = client("https://app.docupipe.ai");
        assert_eq!(client.url("document"), "https://app.docupipe.ai/document");
        assert_eq!(
            client.url("/standardization/std_1"),
            "https://app.docupipe.ai/standardization/std_1"
        );
    }
}
