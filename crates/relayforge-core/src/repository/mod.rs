//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (relayforge-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod build;

use relayforge_types::error::BuildError;

/// A 1-based page window over an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Result<Self, BuildError> {
        if page == 0 {
            return Err(BuildError::BadRequest("page must be at least 1".to_string()));
        }
        if per_page == 0 {
            return Err(BuildError::BadRequest(
                "perPage must be at least 1".to_string(),
            ));
        }
        Ok(Self { page, per_page })
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }
}

/// One page of results plus the size of the whole listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.per_page.max(1)))
    }
}
