//! Customizer trait definition.
//!
//! The customizer embeds a relay build's configuration (keys, channels,
//! commands) into a binary template. How it does so is opaque to the
//! pipeline; implementations live in relayforge-infra.

use relayforge_types::build::RelayBuild;
use relayforge_types::error::CustomizeError;

/// Produces the customized binary for a persisted relay build.
///
/// May suspend for an externally bounded time. The pipeline wraps every
/// call in its own deadline, so implementations may also report
/// [`CustomizeError::Timeout`] themselves.
pub trait Customizer: Send + Sync {
    fn customize(
        &self,
        build: &RelayBuild,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, CustomizeError>> + Send;
}
