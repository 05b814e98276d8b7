//! File type resolution from download URLs.
//!
//! The type of a remote file is taken purely from the suffix of its URL path. No content
//! sniffing is done: callers must supply URLs with a recognizable extension.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// The document formats the service knows how to extract text from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Epub,
    Txt,
    Docx,
    Xlsx,
    Csv,
}

impl FileType {
    pub const ALL: [FileType; 6] = [
        FileType::Pdf,
        FileType::Epub,
        FileType::Txt,
        FileType::Docx,
        FileType::Xlsx,
        FileType::Csv,
    ];

    /// Resolve the file type of a URL.
    ///
    /// The query string (everything from the first `?`) is discarded, then the text after the
    /// last `.` is lowercased and matched exactly. A URL without any `.` uses the whole path as
    /// its "extension", which is simply unsupported. Returns `None` for unsupported types.
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split('?').next().unwrap_or_default();
        let extension = path.rsplit('.').next().unwrap_or_default();
        extension.to_lowercase().parse().ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Epub => "epub",
            FileType::Txt => "txt",
            FileType::Docx => "docx",
            FileType::Xlsx => "xlsx",
            FileType::Csv => "csv",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedFileType(pub String);

impl fmt::Display for UnsupportedFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported file type: {}", self.0)
    }
}

impl std::error::Error for UnsupportedFileType {}

impl FromStr for FileType {
    type Err = UnsupportedFileType;

    /// Exact, case-sensitive match on the lowercase tag.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|file_type| file_type.as_str() == s)
            .ok_or_else(|| UnsupportedFileType(s.to_string()))
    }
}
