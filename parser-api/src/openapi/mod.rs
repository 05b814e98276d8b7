//! OpenAPI documentation for the extraction API.
//!
//! The document is served as JSON at `/api-docs/openapi.json` and rendered with Scalar at
//! `/docs`.

use utoipa::OpenApi;

use crate::{api, errors::ErrorResponse, file_type::FileType};

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::extract::root,
        api::handlers::extract::extract_text,
    ),
    components(
        schemas(
            api::models::extract::ExtractionRequest,
            api::models::extract::ExtractionResponse,
            api::models::extract::StatusResponse,
            ErrorResponse,
            FileType,
        )
    ),
    tags(
        (name = "extraction", description = "Download a document by URL and return its plain text.

Supported extensions, matched case-insensitively on the URL path:
- `pdf`, `epub`, `txt`, `docx`: text content, one paragraph or line per line
- `xlsx`, `csv`: one line per data row, each cell prefixed by its column header

The query string is ignored when resolving the type, so signed URLs work as-is."),
        (name = "status", description = "Service liveness."),
    ),
    info(
        title = "Parser API",
        description = "Text extraction for remote documents.

## Errors

Every error response has the same shape:

```json
{ \"error\": \"Unsupported file type\" }
```

| Status | Meaning |
|--------|---------|
| 400 | Missing `file_url`, malformed body or unsupported extension |
| 413 | The file is larger than the configured limit |
| 500 | The download failed or the file could not be parsed |"
    )
)]
pub struct ApiDoc;
