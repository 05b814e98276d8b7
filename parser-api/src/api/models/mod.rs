//! API request and response data models.
//!
//! All models are annotated with `utoipa` so they appear in the generated OpenAPI document.

pub mod extract;
