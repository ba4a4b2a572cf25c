//! Custom axum extractors.

pub mod query;
