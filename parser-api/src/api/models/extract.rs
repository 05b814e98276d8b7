use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request payload for text extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ExtractionRequest {
    /// URL of the file to download. The file type is taken from the extension of the URL path,
    /// ignoring any query string.
    #[serde(default)]
    #[schema(example = "https://example.com/reports/q3.xlsx?token=abc")]
    pub file_url: Option<String>,
}

/// Text extracted from a downloaded file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExtractionResponse {
    pub extracted_text: String,
    /// Size in bytes as reported by the remote host, or the number of bytes received when it
    /// did not report one
    pub file_size: u64,
}

/// Liveness message
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_tolerates_missing_and_extra_fields() {
        let request: ExtractionRequest = serde_json::from_str(r#"{"other": 1}"#).unwrap();
        assert!(request.file_url.is_none());

        let request: ExtractionRequest = serde_json::from_str(r#"{"file_url": null}"#).unwrap();
        assert!(request.file_url.is_none());

        let request: ExtractionRequest = serde_json::from_str(r#"{"file_url": "https://host/a.pdf"}"#).unwrap();
        assert_eq!(request.file_url.as_deref(), Some("https://host/a.pdf"));
    }
}
