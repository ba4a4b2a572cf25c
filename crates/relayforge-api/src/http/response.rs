//! Envelope response format for all API responses.
//!
//! Every JSON response is wrapped in a consistent envelope:
//! ```json
//! {
//!   "data": { ... },
//!   "meta": { "request_id": "...", "timestamp": "...", "response_time_ms": 5 },
//!   "errors": [],
//!   "_links": { "self": "..." }
//! }
//! ```
//!
//! Listing responses also carry `meta.pagination` and the matching
//! `X-Pagination-*` headers.

use std::collections::HashMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use relayforge_core::repository::Page;

/// Envelope response wrapping all API data.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// The main response payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Request metadata.
    pub meta: ApiMeta,

    /// Error list (empty on success).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ApiErrorDetail>,

    /// HATEOAS-style links for discoverability.
    #[serde(rename = "_links", skip_serializing_if = "HashMap::is_empty")]
    pub links: HashMap<String, String>,
}

/// Metadata included in every response.
#[derive(Debug, Serialize)]
pub struct ApiMeta {
    /// Unique request identifier for tracing.
    pub request_id: String,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
    /// Response time in milliseconds.
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

/// Position of a listing page within the whole result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub pages: u64,
}

impl<T> From<&Page<T>> for PaginationMeta {
    fn from(page: &Page<T>) -> Self {
        Self {
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            pages: page.total_pages(),
        }
    }
}

impl PaginationMeta {
    /// `X-Pagination-*` headers for this page.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let values = [
            ("x-pagination-page", u64::from(self.page)),
            ("x-pagination-perpage", u64::from(self.per_page)),
            ("x-pagination-total", self.total),
            ("x-pagination-pages", self.pages),
        ];
        for (name, value) in values {
            headers.insert(HeaderName::from_static(name), HeaderValue::from(value));
        }
        headers
    }
}

/// Individual error detail.
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response with data.
    pub fn success(data: T, request_id: String, response_time_ms: u64) -> Self {
        Self {
            data: Some(data),
            meta: ApiMeta {
                request_id,
                timestamp: chrono::Utc::now().to_rfc3339(),
                response_time_ms,
                pagination: None,
            },
            errors: Vec::new(),
            links: HashMap::new(),
        }
    }

    /// Attach pagination metadata.
    pub fn with_pagination(mut self, pagination: PaginationMeta) -> Self {
        self.meta.pagination = Some(pagination);
        self
    }

    /// Add a HATEOAS link.
    pub fn with_link(mut self, rel: &str, href: &str) -> Self {
        self.links.insert(rel.to_string(), href.to_string());
        self
    }
}

impl ApiResponse<()> {
    /// Create an error response (no data).
    pub fn error(code: &str, message: &str, request_id: String, response_time_ms: u64) -> Self {
        Self {
            data: None,
            meta: ApiMeta {
                request_id,
                timestamp: chrono::Utc::now().to_rfc3339(),
                response_time_ms,
                pagination: None,
            },
            errors: vec![ApiErrorDetail {
                code: code.to_string(),
                message: message.to_string(),
            }],
            links: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_meta_from_page() {
        let page = Page {
            items: vec![1, 2, 3, 4, 5],
            total: 25,
            page: 3,
            per_page: 10,
        };
        let meta = PaginationMeta::from(&page);
        assert_eq!(meta.pages, 3);

        let headers = meta.headers();
        assert_eq!(headers["x-pagination-page"], "3");
        assert_eq!(headers["x-pagination-perpage"], "10");
        assert_eq!(headers["x-pagination-total"], "25");
        assert_eq!(headers["x-pagination-pages"], "3");
    }

    #[test]
    fn test_success_envelope_shape() {
        let resp = ApiResponse::success(vec!["a"], "req-1".to_string(), 4)
            .with_pagination(PaginationMeta {
                page: 1,
                per_page: 10,
                total: 1,
                pages: 1,
            })
            .with_link("self", "/api/v1/builds");

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["data"][0], "a");
        assert_eq!(json["meta"]["pagination"]["perPage"], 10);
        assert_eq!(json["_links"]["self"], "/api/v1/builds");
        assert!(json.get("errors").is_none());
    }
}
