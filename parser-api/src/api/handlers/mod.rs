//! HTTP request handlers.
//!
//! Handlers return [`crate::errors::Error`], which converts to the matching status code and a
//! JSON `{"error": ...}` body.

pub mod extract;
