//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! `RelayBuildService` is generic over its ports; AppState pins it to the
//! concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use relayforge_core::relay::service::RelayBuildService;
use relayforge_infra::config::load_service_config;
use relayforge_infra::customizer::HttpCustomizer;
use relayforge_infra::filesystem::{database_url, resolve_data_dir};
use relayforge_infra::shellcode::CommandShellcodeGenerator;
use relayforge_infra::sqlite::build::SqliteBuildRepository;
use relayforge_infra::sqlite::pool::DatabasePool;
use relayforge_types::config::ServiceConfig;

/// Concrete type alias for the service generics pinned to infra implementations.
pub type ConcreteRelayBuildService =
    RelayBuildService<SqliteBuildRepository, HttpCustomizer, CommandShellcodeGenerator>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub build_service: Arc<ConcreteRelayBuildService>,
    pub config: Arc<ServiceConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_service_config(&data_dir).await;
        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;

        tracing::debug!(data_dir = %data_dir.display(), gateway = %config.gateway_url, "state initialized");

        Self::from_parts(data_dir, config, db_pool)
    }

    /// Wire services over an already opened database.
    pub fn from_parts(
        data_dir: PathBuf,
        config: ServiceConfig,
        db_pool: DatabasePool,
    ) -> anyhow::Result<Self> {
        let customizer =
            HttpCustomizer::new(config.gateway_url.clone(), config.customize_timeout())?;
        let shellcode = CommandShellcodeGenerator::new(
            config.shellcode_tool.clone(),
            config.shellcode_tool_args.clone(),
            config.temp_dir.clone(),
            config.shellcode_timeout(),
        );

        let build_service = RelayBuildService::new(
            SqliteBuildRepository::new(db_pool),
            customizer,
            shellcode,
            config.customize_timeout(),
        );

        Ok(Self {
            build_service: Arc::new(build_service),
            config: Arc::new(config),
            data_dir,
        })
    }
}
