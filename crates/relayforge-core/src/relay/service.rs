//! Relay build customization service.
//!
//! Orchestrates one customization request end to end:
//!
//! 1. Validate the request and resolve the artifact extension
//! 2. Look up the parent gateway build and derive a draft from it
//! 3. Persist the draft (the record exists only once this returns)
//! 4. Run the customizer under a deadline
//! 5. For shellcode builds, run the shellcode generator
//! 6. Name and return the artifact
//!
//! Any failure after step 3 deletes the record again before the error is
//! returned. A failed rollback is logged and never replaces the original error.
//! If the request future is dropped mid-pipeline, the delete is spawned onto
//! the runtime instead.

use std::sync::Arc;
use std::time::Duration;

use relayforge_types::build::{BinaryType, BuildRequest, GatewayBuild, RelayBuild};
use relayforge_types::error::{BuildError, CustomizeError, RepositoryError};
use relayforge_types::id::BuildId;
use tracing::{debug, info, warn};

use crate::relay::customizer::Customizer;
use crate::relay::derive::derive_draft;
use crate::relay::format::{artifact_file_name, resolve_extension};
use crate::relay::shellcode::ShellcodeGenerator;
use crate::repository::build::BuildRepository;
use crate::repository::{Page, PageRequest};

/// Content type of every delivered artifact.
pub const ARTIFACT_CONTENT_TYPE: &str = "application/octet-stream";

/// Longest accepted human name; it ends up in the artifact file name.
const MAX_NAME_LEN: usize = 64;

/// A finished relay artifact and the record it was built from.
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    pub build: RelayBuild,
    pub file_name: String,
    pub content_type: &'static str,
    pub payload: Vec<u8>,
}

/// Service owning the relay build lifecycle.
///
/// Generic over the store and both collaborators so relayforge-core never
/// depends on relayforge-infra.
pub struct RelayBuildService<R: BuildRepository, C: Customizer, S: ShellcodeGenerator> {
    repo: Arc<R>,
    customizer: C,
    shellcode: S,
    customize_timeout: Duration,
}

impl<R: BuildRepository + 'static, C: Customizer, S: ShellcodeGenerator> RelayBuildService<R, C, S> {
    /// Create a new RelayBuildService.
    ///
    /// - `repo`: persistence for gateway and relay build records
    /// - `customizer`: embeds configuration into the relay template
    /// - `shellcode`: converts customized binaries into shellcode
    /// - `customize_timeout`: deadline for a single customizer call
    pub fn new(repo: R, customizer: C, shellcode: S, customize_timeout: Duration) -> Self {
        Self {
            repo: Arc::new(repo),
            customizer,
            shellcode,
            customize_timeout,
        }
    }

    /// Create, customize and package a new relay build.
    #[tracing::instrument(
        name = "customize_relay",
        skip_all,
        fields(
            parent = %request.parent_gateway_build_id,
            arch = %request.architecture,
            kind = %request.binary_type,
        )
    )]
    pub async fn customize(&self, mut request: BuildRequest) -> Result<BuildArtifact, BuildError> {
        validate_request(&request)?;

        if request.binary_type == BinaryType::Shellcode {
            request.shellcode.get_or_insert_with(Default::default);
        }
        let extension = resolve_extension(request.binary_type, request.shellcode.as_ref())?;

        let parent = self.get_gateway_build(request.parent_gateway_build_id).await?;
        let draft = derive_draft(&request, &parent);

        let build = self.repo.create_relay_build(&draft).await.map_err(|e| {
            warn!(error = %e, "failed to persist relay build");
            BuildError::from(e)
        })?;
        debug!(build_id = %build.build_id, "relay build record persisted");
        let guard = PersistedBuild::new(Arc::clone(&self.repo), build.build_id);

        match self.produce_payload(&build, &request).await {
            Ok(payload) => {
                guard.keep();
                let file_name = artifact_file_name(&build, extension);
                info!(
                    build_id = %build.build_id,
                    file = %file_name,
                    bytes = payload.len(),
                    "relay build ready"
                );
                Ok(BuildArtifact {
                    build,
                    file_name,
                    content_type: ARTIFACT_CONTENT_TYPE,
                    payload,
                })
            }
            Err(err) => {
                warn!(build_id = %build.build_id, code = err.code(), error = %err, "relay build failed");
                guard.rollback().await;
                Err(err)
            }
        }
    }

    /// Customize, then convert to shellcode when the build asks for it.
    async fn produce_payload(
        &self,
        build: &RelayBuild,
        request: &BuildRequest,
    ) -> Result<Vec<u8>, BuildError> {
        debug!(build_id = %build.build_id, "customizing");
        let output = tokio::time::timeout(self.customize_timeout, self.customizer.customize(build))
            .await
            .map_err(|_| CustomizeError::Timeout(self.customize_timeout))??;

        match (build.binary_type, request.shellcode.as_ref()) {
            (BinaryType::Shellcode, Some(shellcode)) => {
                debug!(build_id = %build.build_id, format = shellcode.format, "converting to shellcode");
                Ok(self.shellcode.generate(&output, shellcode, build.arch).await?)
            }
            _ => Ok(output),
        }
    }

    /// List relay builds in ascending id order.
    pub async fn list_relay_builds(&self, page: PageRequest) -> Result<Page<RelayBuild>, BuildError> {
        Ok(self.repo.list_relay_builds(page).await?)
    }

    /// Get a relay build by a raw id, which must lie in `[0, 65535]`.
    pub async fn get_relay_build(&self, raw_id: i64) -> Result<RelayBuild, BuildError> {
        let id = BuildId::from_raw(raw_id)?;
        self.repo
            .get_relay_build(id)
            .await?
            .ok_or(BuildError::NotFound(id))
    }

    /// Get a gateway build, failing with `MissingParent` when absent.
    pub async fn get_gateway_build(&self, id: BuildId) -> Result<GatewayBuild, BuildError> {
        self.repo
            .get_gateway_build(id)
            .await?
            .ok_or(BuildError::MissingParent(id))
    }

    /// Register a gateway build produced elsewhere.
    pub async fn import_gateway_build(&self, build: GatewayBuild) -> Result<GatewayBuild, BuildError> {
        self.repo
            .create_gateway_build(&build)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(msg) => BuildError::BadRequest(msg),
                other => other.into(),
            })
    }

    pub async fn list_gateway_builds(&self) -> Result<Vec<GatewayBuild>, BuildError> {
        Ok(self.repo.list_gateway_builds().await?)
    }
}

/// Reject requests whose name cannot be embedded in a file name.
fn validate_request(request: &BuildRequest) -> Result<(), BuildError> {
    if let Some(name) = request.name.as_deref() {
        if name.len() > MAX_NAME_LEN {
            return Err(BuildError::BadRequest(format!(
                "name longer than {MAX_NAME_LEN} characters"
            )));
        }
        if name
            .chars()
            .any(|c| c.is_control() || matches!(c, '/' | '\\' | ':' | '"' | '*' | '?' | '<' | '>' | '|'))
        {
            return Err(BuildError::BadRequest(format!(
                "name '{}' contains characters not allowed in a file name",
                name.escape_debug()
            )));
        }
    }
    Ok(())
}

/// Rollback handle for a relay build record created by the current request.
///
/// Consume with [`keep`](Self::keep) or [`rollback`](Self::rollback).
/// Dropping it armed means the request future was cancelled mid-pipeline;
/// the delete is then spawned on the current runtime.
struct PersistedBuild<R: BuildRepository + 'static> {
    repo: Arc<R>,
    build_id: BuildId,
    armed: bool,
}

impl<R: BuildRepository + 'static> PersistedBuild<R> {
    fn new(repo: Arc<R>, build_id: BuildId) -> Self {
        Self {
            repo,
            build_id,
            armed: true,
        }
    }

    fn keep(mut self) {
        self.armed = false;
    }

    async fn rollback(mut self) {
        self.armed = false;
        delete_record(self.repo.as_ref(), self.build_id).await;
    }
}

impl<R: BuildRepository + 'static> Drop for PersistedBuild<R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let build_id = self.build_id;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(%build_id, "relay build request cancelled; rolling back in background");
                let repo = Arc::clone(&self.repo);
                handle.spawn(async move { delete_record(repo.as_ref(), build_id).await });
            }
            Err(_) => warn!(
                %build_id,
                "relay build request cancelled outside a runtime; record left in store"
            ),
        }
    }
}

async fn delete_record<R: BuildRepository>(repo: &R, build_id: BuildId) {
    match repo.delete_relay_build(build_id).await {
        Ok(()) => debug!(%build_id, "relay build rolled back"),
        Err(e) => warn!(%build_id, error = %e, "rollback of relay build failed"),
    }
}
