//! SQLite build repository implementation.
//!
//! Implements `BuildRepository` from `relayforge-core` using sqlx with split read/write pools.
//! Structured configuration (channels, commands, peripherals) is stored as JSON text.

use relayforge_core::repository::build::BuildRepository;
use relayforge_core::repository::{Page, PageRequest};
use relayforge_types::build::{GatewayBuild, RelayBuild, RelayBuildDraft, RelayCommands};
use relayforge_types::channel::Channel;
use relayforge_types::error::RepositoryError;
use relayforge_types::id::{AgentId, BuildId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `BuildRepository`.
pub struct SqliteBuildRepository {
    pool: DatabasePool,
}

impl SqliteBuildRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Storage shape of a channel. Unlike the API shape it keeps the startup command.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelRecord {
    interface_id: u64,
    hash: u64,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    is_return_channel: bool,
    #[serde(default)]
    is_negotiation_channel: bool,
    #[serde(default)]
    jitter: Value,
    #[serde(default)]
    startup_command: Value,
}

impl From<&Channel> for ChannelRecord {
    fn from(channel: &Channel) -> Self {
        Self {
            interface_id: channel.interface_id,
            hash: channel.hash,
            error: channel.error.clone(),
            is_return_channel: channel.is_return_channel,
            is_negotiation_channel: channel.is_negotiation_channel,
            jitter: channel.jitter.clone(),
            startup_command: channel.startup_command().clone(),
        }
    }
}

impl From<ChannelRecord> for Channel {
    fn from(record: ChannelRecord) -> Self {
        let mut channel =
            Channel::new(record.hash, record.interface_id).with_startup_command(record.startup_command);
        channel.error = record.error;
        channel.is_return_channel = record.is_return_channel;
        channel.is_negotiation_channel = record.is_negotiation_channel;
        channel.jitter = record.jitter;
        channel
    }
}

/// Internal row type for mapping SQLite rows to domain RelayBuild.
struct RelayBuildRow {
    build_id: i64,
    arch: String,
    binary_type: String,
    name: Option<String>,
    startup_commands: String,
    broadcast_key: String,
    public_key: String,
    channels: String,
    commands: String,
    peripherals: String,
    parent_gateway_agent_id: String,
    created_at: String,
}

impl RelayBuildRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            build_id: row.try_get("build_id")?,
            arch: row.try_get("arch")?,
            binary_type: row.try_get("binary_type")?,
            name: row.try_get("name")?,
            startup_commands: row.try_get("startup_commands")?,
            broadcast_key: row.try_get("broadcast_key")?,
            public_key: row.try_get("public_key")?,
            channels: row.try_get("channels")?,
            commands: row.try_get("commands")?,
            peripherals: row.try_get("peripherals")?,
            parent_gateway_agent_id: row.try_get("parent_gateway_agent_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_build(self) -> Result<RelayBuild, RepositoryError> {
        Ok(RelayBuild {
            build_id: parse_build_id(self.build_id)?,
            arch: self.arch.parse().map_err(RepositoryError::Query)?,
            binary_type: self.binary_type.parse().map_err(RepositoryError::Query)?,
            name: self.name,
            startup_commands: from_json(&self.startup_commands, "startup_commands")?,
            broadcast_key: self.broadcast_key,
            public_key: self.public_key,
            channels: channels_from_json(&self.channels)?,
            commands: from_json(&self.commands, "commands")?,
            peripherals: from_json(&self.peripherals, "peripherals")?,
            parent_gateway_agent_id: self
                .parent_gateway_agent_id
                .parse::<AgentId>()
                .map_err(RepositoryError::Query)?,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain GatewayBuild.
struct GatewayBuildRow {
    build_id: i64,
    agent_id: String,
    broadcast_key: String,
    public_key: String,
    channels: String,
    relay_commands: String,
    peripherals: String,
    created_at: String,
}

impl GatewayBuildRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            build_id: row.try_get("build_id")?,
            agent_id: row.try_get("agent_id")?,
            broadcast_key: row.try_get("broadcast_key")?,
            public_key: row.try_get("public_key")?,
            channels: row.try_get("channels")?,
            relay_commands: row.try_get("relay_commands")?,
            peripherals: row.try_get("peripherals")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_build(self) -> Result<GatewayBuild, RepositoryError> {
        Ok(GatewayBuild {
            build_id: parse_build_id(self.build_id)?,
            agent_id: self
                .agent_id
                .parse::<AgentId>()
                .map_err(RepositoryError::Query)?,
            broadcast_key: self.broadcast_key,
            public_key: self.public_key,
            channels: channels_from_json(&self.channels)?,
            relay_commands: from_json::<RelayCommands>(&self.relay_commands, "relay_commands")?,
            peripherals: from_json(&self.peripherals, "peripherals")?,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn parse_build_id(raw: i64) -> Result<BuildId, RepositoryError> {
    u16::try_from(raw)
        .map(BuildId)
        .map_err(|_| RepositoryError::Query(format!("stored build id {raw} out of range")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Query(e.to_string()))
}

fn from_json<T: DeserializeOwned>(text: &str, column: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(text)
        .map_err(|e| RepositoryError::Query(format!("invalid {column} JSON: {e}")))
}

fn channels_to_json(channels: &[Channel]) -> Result<String, RepositoryError> {
    let records: Vec<ChannelRecord> = channels.iter().map(ChannelRecord::from).collect();
    to_json(&records)
}

fn channels_from_json(text: &str) -> Result<Vec<Channel>, RepositoryError> {
    let records: Vec<ChannelRecord> = from_json(text, "channels")?;
    Ok(records.into_iter().map(Channel::from).collect())
}

fn map_rows<T>(
    rows: &[sqlx::sqlite::SqliteRow],
    convert: impl Fn(&sqlx::sqlite::SqliteRow) -> Result<T, RepositoryError>,
) -> Result<Vec<T>, RepositoryError> {
    rows.iter().map(convert).collect()
}

fn relay_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<RelayBuild, RepositoryError> {
    RelayBuildRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_build()
}

fn gateway_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<GatewayBuild, RepositoryError> {
    GatewayBuildRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_build()
}

impl BuildRepository for SqliteBuildRepository {
    async fn list_relay_builds(
        &self,
        page: PageRequest,
    ) -> Result<Page<RelayBuild>, RepositoryError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM relay_builds")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let offset = i64::try_from(page.offset())
            .map_err(|_| RepositoryError::Query("page offset too large".to_string()))?;

        let rows = sqlx::query("SELECT * FROM relay_builds ORDER BY build_id ASC LIMIT ? OFFSET ?")
            .bind(i64::from(page.per_page))
            .bind(offset)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(Page {
            items: map_rows(&rows, relay_from_row)?,
            total: total.max(0) as u64,
            page: page.page,
            per_page: page.per_page,
        })
    }

    async fn get_relay_build(&self, id: BuildId) -> Result<Option<RelayBuild>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM relay_builds WHERE build_id = ?")
            .bind(i64::from(id.0))
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(relay_from_row).transpose()
    }

    async fn create_relay_build(
        &self,
        draft: &RelayBuildDraft,
    ) -> Result<RelayBuild, RepositoryError> {
        let created_at = Utc::now();

        // Next id is computed inside the insert; the single-connection writer
        // pool serializes concurrent creates.
        let result = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO relay_builds (build_id, arch, binary_type, name, startup_commands, broadcast_key, public_key, channels, commands, peripherals, parent_gateway_agent_id, created_at)
             SELECT COALESCE(MAX(build_id), 0) + 1, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ? FROM relay_builds
             RETURNING build_id",
        )
        .bind(draft.arch.to_string())
        .bind(draft.binary_type.to_string())
        .bind(&draft.name)
        .bind(to_json(&draft.startup_commands)?)
        .bind(&draft.broadcast_key)
        .bind(&draft.public_key)
        .bind(channels_to_json(&draft.channels)?)
        .bind(to_json(&draft.commands)?)
        .bind(to_json(&draft.peripherals)?)
        .bind(draft.parent_gateway_agent_id.to_string())
        .bind(format_datetime(&created_at))
        .fetch_one(&self.pool.writer)
        .await;

        match result {
            Ok((build_id,)) => Ok(draft.clone().into_build(parse_build_id(build_id)?, created_at)),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("CHECK") => {
                Err(RepositoryError::Exhausted)
            }
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn delete_relay_build(&self, id: BuildId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM relay_builds WHERE build_id = ?")
            .bind(i64::from(id.0))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn get_gateway_build(
        &self,
        id: BuildId,
    ) -> Result<Option<GatewayBuild>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM gateway_builds WHERE build_id = ?")
            .bind(i64::from(id.0))
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(gateway_from_row).transpose()
    }

    async fn create_gateway_build(
        &self,
        build: &GatewayBuild,
    ) -> Result<GatewayBuild, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO gateway_builds (build_id, agent_id, broadcast_key, public_key, channels, relay_commands, peripherals, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(i64::from(build.build_id.0))
        .bind(build.agent_id.to_string())
        .bind(&build.broadcast_key)
        .bind(&build.public_key)
        .bind(channels_to_json(&build.channels)?)
        .bind(to_json(&build.relay_commands)?)
        .bind(to_json(&build.peripherals)?)
        .bind(format_datetime(&build.created_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(build.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                Err(RepositoryError::Conflict(format!(
                    "gateway build {} already exists",
                    build.build_id
                )))
            }
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn list_gateway_builds(&self) -> Result<Vec<GatewayBuild>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM gateway_builds ORDER BY build_id ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        map_rows(&rows, gateway_from_row)
    }
}
