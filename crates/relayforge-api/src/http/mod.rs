//! HTTP/REST API layer for relayforge.
//!
//! Axum-based REST API at `/api/v1/` with envelope response format and
//! CORS support. Artifact downloads are the one non-envelope response.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
