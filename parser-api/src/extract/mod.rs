//! Text extraction, dispatched on the resolved [`FileType`].
//!
//! | Type | Reader |
//! |------|--------|
//! | `docx` | [`document::extract_docx`] - body paragraphs, one per line |
//! | `xlsx` | [`tabular::extract_xlsx`] - every sheet, header-prefixed rows |
//! | `csv` | [`tabular::extract_csv`] - header-prefixed rows, UTF-8 only |
//! | `epub` | [`document::extract_epub`] - spine chapters in reading order |
//! | `pdf`, `txt` | [`document::extract_document`] |
//!
//! Extraction either succeeds for the whole file or fails; no partial output is returned.

pub mod document;
pub mod tabular;

use bytes::Bytes;
use thiserror::Error;

use crate::file_type::FileType;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("File is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Failed to read PDF: {0}")]
    Pdf(String),

    #[error("Failed to read EPUB: {0}")]
    Epub(String),

    #[error("Failed to open archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Missing document part: {0}")]
    MissingPart(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} is not a document type")]
    UnexpectedType(FileType),

    /// The extraction task panicked or was cancelled
    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// Extract the plain text of `content`, interpreted as `file_type`.
pub fn extract_text(file_type: FileType, content: &[u8]) -> Result<String, ExtractError> {
    match file_type {
        FileType::Docx => document::extract_docx(content),
        FileType::Xlsx => tabular::extract_xlsx(content),
        FileType::Csv => tabular::extract_csv(content),
        FileType::Pdf | FileType::Epub | FileType::Txt => document::extract_document(content, file_type),
    }
}

/// Run [`extract_text`] on the blocking thread pool.
///
/// Parsing is CPU-bound, so it is kept off the async workers. A panic inside one of the parser
/// libraries is reported as [`ExtractError::Task`] instead of tearing down the connection.
#[tracing::instrument(skip(content), fields(bytes = content.len()))]
pub async fn extract_blocking(file_type: FileType, content: Bytes) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || extract_text(file_type, &content))
        .await
        .map_err(|e| ExtractError::Task(e.to_string()))?
}
