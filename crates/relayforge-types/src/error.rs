use std::time::Duration;

use thiserror::Error;

use crate::id::BuildId;

/// Fault kinds produced by the relay build pipeline and its lookups.
///
/// Each variant has a distinct [`code`](BuildError::code) and maps onto one
/// [`FaultClass`] so callers can decide whether to fix the request, retry,
/// restart the gateway, or give up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("gateway build {0} does not exist")]
    MissingParent(BuildId),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    InvalidGateway(String),

    #[error("{0}")]
    Customizer(String),

    #[error("{0}")]
    GatewayResponse(String),

    #[error("unrecognized shellcode output format: {0}")]
    UnrecognizedFormat(u32),

    #[error("unknown error. {0}")]
    Unknown(String),

    #[error("build {0} not found")]
    NotFound(BuildId),

    #[error("build id {0} out of range")]
    OutOfRange(i64),
}

/// What a caller should do about a [`BuildError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// The request itself is wrong and must be changed.
    ClientError,
    /// The requested record does not exist.
    NotFound,
    /// Transient; the same request may succeed later.
    RetryLater,
    /// Gateway infrastructure is unreachable; restart it before retrying.
    RestartGateway,
    /// This combination of inputs cannot be customized.
    Domain,
    /// Unclassified internal failure.
    Internal,
}

impl BuildError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            BuildError::BadRequest(_) => "BAD_REQUEST",
            BuildError::MissingParent(_) => "MISSING_PARENT",
            BuildError::Timeout(_) => "TIMEOUT",
            BuildError::InvalidGateway(_) => "INVALID_GATEWAY",
            BuildError::Customizer(_) => "CUSTOMIZER_ERROR",
            BuildError::GatewayResponse(_) => "GATEWAY_RESPONSE_ERROR",
            BuildError::UnrecognizedFormat(_) => "UNRECOGNIZED_FORMAT",
            BuildError::Unknown(_) => "UNKNOWN",
            BuildError::NotFound(_) => "NOT_FOUND",
            BuildError::OutOfRange(_) => "OUT_OF_RANGE",
        }
    }

    pub fn class(&self) -> FaultClass {
        match self {
            BuildError::BadRequest(_)
            | BuildError::UnrecognizedFormat(_)
            | BuildError::OutOfRange(_) => FaultClass::ClientError,
            BuildError::NotFound(_) => FaultClass::NotFound,
            BuildError::Timeout(_) => FaultClass::RetryLater,
            BuildError::InvalidGateway(_) => FaultClass::RestartGateway,
            BuildError::Customizer(_) | BuildError::GatewayResponse(_) => FaultClass::Domain,
            // The pipeline assumes parent references were checked upstream.
            BuildError::MissingParent(_) | BuildError::Unknown(_) => FaultClass::Internal,
        }
    }
}

/// Failures reported by the customizer collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustomizeError {
    #[error("customization timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("gateway is not available: {0}")]
    InvalidGateway(String),

    #[error("customization failed: {0}")]
    Customizer(String),

    #[error("malformed gateway response: {0}")]
    GatewayResponse(String),

    #[error("{0}")]
    Other(String),
}

impl From<CustomizeError> for BuildError {
    fn from(e: CustomizeError) -> Self {
        let message = e.to_string();
        match e {
            CustomizeError::Timeout(_) => BuildError::Timeout(message),
            CustomizeError::InvalidGateway(_) => BuildError::InvalidGateway(message),
            CustomizeError::Customizer(_) => BuildError::Customizer(message),
            CustomizeError::GatewayResponse(_) => BuildError::GatewayResponse(message),
            CustomizeError::Other(_) => BuildError::Unknown(message),
        }
    }
}

/// Failures reported by the shellcode generator collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellcodeError {
    #[error("unrecognized output format: {0}")]
    UnrecognizedFormat(u32),

    #[error("shellcode generation failed: {0}")]
    Generation(String),

    #[error("shellcode conversion timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl From<ShellcodeError> for BuildError {
    fn from(e: ShellcodeError) -> Self {
        let message = e.to_string();
        match e {
            ShellcodeError::UnrecognizedFormat(format) => BuildError::UnrecognizedFormat(format),
            ShellcodeError::Timeout(_) => BuildError::Timeout(message),
            ShellcodeError::Generation(_) => BuildError::Unknown(message),
        }
    }
}

/// Errors from repository operations (used by trait definitions in relayforge-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("build id space exhausted")]
    Exhausted,
}

impl From<RepositoryError> for BuildError {
    fn from(e: RepositoryError) -> Self {
        BuildError::Unknown(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_fault_has_distinct_code() {
        let faults = [
            BuildError::BadRequest(String::new()),
            BuildError::MissingParent(BuildId(1)),
            BuildError::Timeout(String::new()),
            BuildError::InvalidGateway(String::new()),
            BuildError::Customizer(String::new()),
            BuildError::GatewayResponse(String::new()),
            BuildError::UnrecognizedFormat(99),
            BuildError::Unknown(String::new()),
            BuildError::NotFound(BuildId(5)),
            BuildError::OutOfRange(70000),
        ];
        let mut codes: Vec<&str> = faults.iter().map(BuildError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), faults.len());
    }

    #[test]
    fn test_fault_classes() {
        assert_eq!(
            BuildError::Timeout("slow".into()).class(),
            FaultClass::RetryLater
        );
        assert_eq!(
            BuildError::InvalidGateway("down".into()).class(),
            FaultClass::RestartGateway
        );
        assert_eq!(
            BuildError::Customizer("x86 template".into()).class(),
            FaultClass::Domain
        );
        assert_eq!(BuildError::OutOfRange(70000).class(), FaultClass::ClientError);
        assert_eq!(BuildError::Unknown("boom".into()).class(), FaultClass::Internal);
    }

    #[test]
    fn test_customize_error_conversion() {
        let err: BuildError = CustomizeError::Timeout(Duration::from_secs(30)).into();
        assert_eq!(
            err,
            BuildError::Timeout("customization timed out after 30s".to_string())
        );

        let err: BuildError = CustomizeError::Other("socket closed".into()).into();
        assert_eq!(err.code(), "UNKNOWN");
    }

    #[test]
    fn test_shellcode_error_conversion() {
        let err: BuildError = ShellcodeError::UnrecognizedFormat(42).into();
        assert_eq!(err, BuildError::UnrecognizedFormat(42));

        let err: BuildError = ShellcodeError::Generation("exit 1".into()).into();
        assert!(matches!(err, BuildError::Unknown(_)));

        let err: BuildError = ShellcodeError::Timeout(Duration::from_secs(60)).into();
        assert_eq!(
            err,
            BuildError::Timeout("shellcode conversion timed out after 60s".to_string())
        );
        assert_eq!(err.class(), FaultClass::RetryLater);
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
