use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct CreateDocumentRequest<'a> {
    pub document: DocumentBody<'a>,
}

#[derive(Debug, Serialize)]
pub struct DocumentBody<'a> {
    pub file: FileBody<'a>,
}

#[derive(Debug, Serialize)]
pub struct FileBody<'a> {
    /// Base64 of the raw file bytes.
    pub contents: String,
    pub filename: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentResponse {
    pub document_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardizeRequest<'a> {
    pub document_id: &'a str,
    pub schema_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardizeResponse {
    pub standardization_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_document_shape() {
        let body = CreateDocumentRequest {
            document: DocumentBody {
                file: FileBody {
                    contents: "aGVsbG8=".into(),
                    filename: "invoice.pdf",
                },
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "document": { "file": { "contents": "aGVsbG8=", "filename": "invoice.pdf" } } })
        );
    }

    #[test]
    fn test_standardize_uses_camel_case() {
        let body = StandardizeRequest {
            document_id: "doc_1",
            schema_id: "59839e02",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "documentId": "doc_1", "schemaId": "59839e02" })
        );
    }

    #[test]
    fn test_responses_tolerate_extra_fields() {
        let resp: StandardizeResponse = serde_json::from_value(json!({
            "standardizationId": "std_1",
            "status": "queued"
        }))
        .unwrap();
        assert_eq!(resp.standardization_id.as_deref(), Some("std_1"));
    }
}
