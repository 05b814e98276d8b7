//! HTTP handlers for text extraction.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::info;

use crate::{
    AppState,
    api::models::extract::{ExtractionRequest, ExtractionResponse, StatusResponse},
    errors::{Error, ErrorResponse, Result},
    extract,
    file_type::FileType,
};

#[utoipa::path(
    get,
    path = "/",
    tag = "status",
    summary = "Liveness check",
    responses(
        (status = 200, description = "Service is running", body = StatusResponse),
    )
)]
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "Parser API is working".to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/extract_text",
    tag = "extraction",
    summary = "Extract text from a remote file",
    description = "Download the file at `file_url` and return its plain text. The format is chosen from the URL's extension: pdf, epub, txt, docx, xlsx or csv. Spreadsheet rows are rendered as `(header: value,\theader: value)` lines.",
    request_body = ExtractionRequest,
    responses(
        (status = 200, description = "Text extracted", body = ExtractionResponse),
        (status = 400, description = "Missing URL, malformed body or unsupported file type", body = ErrorResponse),
        (status = 413, description = "File exceeds the configured size limit", body = ErrorResponse),
        (status = 500, description = "Download or extraction failed", body = ErrorResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn extract_text(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ExtractionRequest>, JsonRejection>,
) -> Result<Json<ExtractionResponse>> {
    let Json(request) = payload.map_err(|e| Error::BadRequest {
        message: format!("Invalid request body: {}", e.body_text()),
    })?;

    let file_url = request
        .file_url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| Error::BadRequest {
            message: "No file URL provided".to_string(),
        })?;

    let file_type = FileType::from_url(&file_url).ok_or_else(|| Error::BadRequest {
        message: "Unsupported file type".to_string(),
    })?;

    let content = state.fetcher.fetch(&file_url).await?;
    let file_size = content.size();

    let extracted_text = extract::extract_blocking(file_type, content.bytes).await?;

    info!(%file_url, %file_type, file_size, "Parsed file");

    Ok(Json(ExtractionResponse { extracted_text, file_size }))
}
