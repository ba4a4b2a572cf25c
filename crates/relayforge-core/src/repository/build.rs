//! Build record repository trait definition.

use relayforge_types::build::{GatewayBuild, RelayBuild, RelayBuildDraft};
use relayforge_types::error::RepositoryError;
use relayforge_types::id::BuildId;

use super::{Page, PageRequest};

/// Repository trait for gateway and relay build persistence.
///
/// Implementations live in relayforge-infra (e.g., SqliteBuildRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait BuildRepository: Send + Sync {
    /// List relay builds in ascending build id order, sliced to one page.
    /// `total` counts every relay build regardless of the slice.
    fn list_relay_builds(
        &self,
        page: PageRequest,
    ) -> impl std::future::Future<Output = Result<Page<RelayBuild>, RepositoryError>> + Send;

    /// Get a relay build by its id.
    fn get_relay_build(
        &self,
        id: BuildId,
    ) -> impl std::future::Future<Output = Result<Option<RelayBuild>, RepositoryError>> + Send;

    /// Persist a draft under a newly assigned unique id. Returns the stored record.
    fn create_relay_build(
        &self,
        draft: &RelayBuildDraft,
    ) -> impl std::future::Future<Output = Result<RelayBuild, RepositoryError>> + Send;

    /// Delete a relay build. Only used to roll back a failed customization.
    fn delete_relay_build(
        &self,
        id: BuildId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a gateway build by its id.
    fn get_gateway_build(
        &self,
        id: BuildId,
    ) -> impl std::future::Future<Output = Result<Option<GatewayBuild>, RepositoryError>> + Send;

    /// Register a gateway build produced by the upstream gateway flow.
    fn create_gateway_build(
        &self,
        build: &GatewayBuild,
    ) -> impl std::future::Future<Output = Result<GatewayBuild, RepositoryError>> + Send;

    /// List all gateway builds in ascending build id order.
    fn list_gateway_builds(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<GatewayBuild>, RepositoryError>> + Send;
}
