//! Query parameter extractors for list endpoints.

use serde::Deserialize;

use relayforge_core::repository::PageRequest;
use relayforge_types::config::ServiceConfig;
use relayforge_types::error::BuildError;

/// `?page=&perPage=` for paginated listings.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    /// 1-based page number (default 1).
    pub page: Option<u32>,
    /// Page size (default and cap come from configuration).
    pub per_page: Option<u32>,
}

impl PageQuery {
    /// Resolve against configured defaults. Oversized pages are clamped,
    /// zero values rejected.
    pub fn resolve(&self, config: &ServiceConfig) -> Result<PageRequest, BuildError> {
        let page = self.page.unwrap_or(1);
        let per_page = self
            .per_page
            .unwrap_or(config.default_per_page)
            .min(config.max_per_page);
        PageRequest::new(page, per_page)
    }
}
