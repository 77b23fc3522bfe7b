//! SQLite-backed challenge store.
//!
//! Split into focused submodules:
//! - `challenges`: challenge definitions (add, delete, list, search)
//! - `progress`: per-user completion, stats, leaderboard, progress reports
//! - `members`: display names and handles of users the bot has seen
//! - `search`: fuzzy name similarity scoring
//! - `types`: outcome and report records returned to callers

mod challenges;
mod members;
mod progress;
mod search;
mod types;

pub use search::similarity;
pub use types::*;

use questlog_core::{config::shellexpand, config::StoreConfig, error::QuestError};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// Persistent challenge store backed by SQLite.
///
/// Cheap to clone; every clone shares the same pool. Each operation checks a
/// connection out of the pool for its own duration only.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database and run migrations.
    pub async fn new(config: &StoreConfig) -> Result<Self, QuestError> {
        let db_path = shellexpand(&config.db_path);

        // Ensure parent directory exists.
        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    QuestError::Storage(format!("failed to create data dir: {e}"))
                })?;
            }
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| QuestError::Storage(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            // Progress rows may outlive the challenge they point at.
            .foreign_keys(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| QuestError::Storage(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("Challenge store initialized at {db_path}");

        Ok(Self { pool })
    }

    /// Get the database file size in bytes.
    pub async fn db_size(&self) -> Result<u64, QuestError> {
        let (page_count,): (i64,) = sqlx::query_as("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| QuestError::Storage(format!("pragma failed: {e}")))?;

        let (page_size,): (i64,) = sqlx::query_as("PRAGMA page_size")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| QuestError::Storage(format!("pragma failed: {e}")))?;

        Ok((page_count * page_size) as u64)
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), QuestError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| QuestError::Storage(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] = &[
            ("001_init", include_str!("../../migrations/001_init.sql")),
            (
                "002_unique_keys",
                include_str!("../../migrations/002_unique_keys.sql"),
            ),
            (
                "003_members",
                include_str!("../../migrations/003_members.sql"),
            ),
            (
                "004_stable_ids",
                include_str!("../../migrations/004_stable_ids.sql"),
            ),
        ];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        QuestError::Storage(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| QuestError::Storage(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    QuestError::Storage(format!("failed to record migration {name}: {e}"))
                })?;

            info!("applied migration {name}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
