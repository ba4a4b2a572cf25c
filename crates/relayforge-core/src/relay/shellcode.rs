//! ShellcodeGenerator trait definition.

use relayforge_types::build::{Architecture, ShellcodeRequest};
use relayforge_types::error::ShellcodeError;

/// Converts a customized binary into shellcode in the requested encoding.
///
/// Implementations run external converters and must bound their own run
/// time, reporting an overrun as [`ShellcodeError::Timeout`].
pub trait ShellcodeGenerator: Send + Sync {
    fn generate(
        &self,
        payload: &[u8],
        request: &ShellcodeRequest,
        arch: Architecture,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, ShellcodeError>> + Send;
}
