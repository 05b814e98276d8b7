//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # Endpoints
//!
//! - `GET /`: liveness message
//! - `POST /extract_text`: download a file and return its plain text
//!
//! API documentation is available at `/docs` when the server is running.

pub mod handlers;
pub mod models;
