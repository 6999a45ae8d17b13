pub mod client;
pub mod models;

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::UpstreamError;

pub use client::DocuPipeClient;

/// A file picked for upload. Nothing is persisted locally.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub filename: String,
    pub contents: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(filename: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            contents,
        }
    }

    /// Read a file from disk; the filename sent upstream is its last path component.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let contents = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        Ok(Self { filename, contents })
    }
}

/// The document-processing service: upload, fetch by path, standardize.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Submit a document and return the service-assigned document id.
    async fn upload(&self, contents: &[u8], filename: &str) -> Result<String, UpstreamError>;

    /// GET a resource (e.g. `document/{id}`) and return its JSON body as-is.
    async fn fetch_resource(&self, path: &str) -> Result<Value, UpstreamError>;

    /// Start standardizing `document_id` onto `schema_id`; returns the job id.
    async fn request_standardization(
        &self,
        document_id: &str,
        schema_id: &str,
    ) -> Result<String, UpstreamError>;
}

pub fn document_path(document_id: &str) -> String {
    format!("document/{}", document_id)
}

pub fn standardization_path(standardization_id: &str) -> String {
    format!("standardization/{}", standardization_id)
}

/// Parsing has finished once `status == "completed"`.
pub fn is_parsed(payload: &Value) -> bool {
    payload.get("status").and_then(Value::as_str) == Some("completed")
}

/// Standardized output is ready once `data` is present and non-null.
pub fn is_standardized(payload: &Value) -> bool {
    payload.get("data").is_some_and(|d| !d.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_parsed() {
        assert!(is_parsed(&json!({ "status": "completed", "result": {} })));
        assert!(!is_parsed(&json!({ "status": "processing" })));
        assert!(!is_parsed(&json!({ "status": "COMPLETED" })));
        assert!(!is_parsed(&json!({})));
    }

    #[test]
    fn test_is_standardized() {
        assert!(is_standardized(&json!({ "data": { "field": "value" } })));
        assert!(is_standardized(&json!({ "data": [] })));
        assert!(!is_standardized(&json!({ "data": null })));
        assert!(!is_standardized(&json!({ "status": "running" })));
    }

    #[test]
    fn test_resource_paths() {
        assert_eq!(document_path("doc_1"), "document/doc_1");
        assert_eq!(standardization_path("std_1"), "standardization/std_1");
    }

    #[tokio::test]
    async fn test_upload_from_path_uses_file_name() {
        let dir = std::env::temp_dir().join(format!("docupipe-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("receipt.png");
        tokio::fs::write(&path, b"\x89PNG").await.unwrap();

        let upload = DocumentUpload::from_path(&path).await.unwrap();
        assert_eq!(upload.filename, "receipt.png");
        assert_eq!(upload.contents, b"\x89PNG");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
