//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows only one writer at a time. This module provides a `DatabasePool`
//! with a multi-connection reader pool for concurrent reads and a single-connection
//! writer pool for serialized writes. Both use WAL journal mode and enforce foreign keys.
//!
//! Relay build ids are assigned inside the writer connection, so the
//! single-writer pool is also what keeps id assignment race-free.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Split read/write pool for SQLite with WAL mode.
///
/// - `reader`: Multi-connection pool (up to 8) for concurrent SELECT queries.
/// - `writer`: Single-connection pool for serialized INSERT/UPDATE/DELETE.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Create a new DatabasePool with split reader/writer connections.
    ///
    /// Runs migrations automatically on the writer pool.
    /// Both pools use WAL journal mode, foreign key enforcement, and 5-second busy timeout.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5))
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);
        let write_opts = base_opts;

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(write_opts)
            .await?;

        // Run migrations on writer before opening reader pool
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(read_opts)
            .await?;

        Ok(Self { reader, writer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_creates_tables() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());

        let pool = DatabasePool::new(&url).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(table_names, vec!["gateway_builds", "relay_builds"]);
    }

    #[tokio::test]
    async fn test_pool_wal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test_wal.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());

        let pool = DatabasePool::new(&url).await.unwrap();

        let result: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();

        assert_eq!(result.0.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_reader_pool_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test_ro.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());

        let pool = DatabasePool::new(&url).await.unwrap();

        let result = sqlx::query("DELETE FROM relay_builds")
            .execute(&pool.reader)
            .await;
        assert!(result.is_err(), "reader pool must reject writes");
    }

    async fn insert_relay_row(pool: &DatabasePool, build_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO relay_builds (build_id, arch, binary_type, broadcast_key, public_key, parent_gateway_agent_id, created_at) \
             VALUES (?, 'x64', 'exe', 'bk', 'pk', '000000000000002a', '2026-03-01T00:00:00Z')",
        )
        .bind(build_id)
        .execute(&pool.writer)
        .await
        .map(|_| ())
    }

    async fn insert_gateway_row(pool: &DatabasePool, build_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO gateway_builds (build_id, agent_id, broadcast_key, public_key, created_at) \
             VALUES (?, '000000000000002a', 'bk', 'pk', '2026-03-01T00:00:00Z')",
        )
        .bind(build_id)
        .execute(&pool.writer)
        .await
        .map(|_| ())
    }

    fn is_check_violation(err: &sqlx::Error) -> bool {
        err.as_database_error()
            .is_some_and(|db| db.message().contains("CHECK constraint failed"))
    }

    #[tokio::test]
    async fn test_build_id_range_check_on_both_tables() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test_check.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());

        let pool = DatabasePool::new(&url).await.unwrap();

        insert_relay_row(&pool, 0).await.unwrap();
        insert_relay_row(&pool, 65535).await.unwrap();
        insert_gateway_row(&pool, 65535).await.unwrap();

        for out_of_range in [65536, -1] {
            let err = insert_relay_row(&pool, out_of_range).await.unwrap_err();
            assert!(is_check_violation(&err), "relay {out_of_range}: {err}");

            let err = insert_gateway_row(&pool, out_of_range).await.unwrap_err();
            assert!(is_check_violation(&err), "gateway {out_of_range}: {err}");
        }

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM relay_builds")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }
}
