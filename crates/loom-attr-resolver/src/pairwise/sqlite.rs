// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for stored pairwise identifiers.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use sqlx::Row;

use super::store::{PairwiseIdBackend, PairwiseKey};
use crate::error::StoreError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Create a SqlitePool with WAL mode and common settings.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./pairwise.db")
///
/// # Errors
/// Returns a fatal `StoreError` if the URL is invalid, or the classified
/// connection error.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, StoreError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| StoreError::fatal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.busy_timeout(BUSY_TIMEOUT)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!("pairwise database pool created");
	Ok(pool)
}

/// Pairwise identifiers in a `pairwise_ids` table.
///
/// # Database Constraints
/// - at most one active row per (`relying_party`, `principal`)
/// - `persistent_id` is unique across active and deactivated rows
#[derive(Debug, Clone)]
pub struct SqlitePairwiseIdBackend {
	pool: SqlitePool,
}

impl SqlitePairwiseIdBackend {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Opens the database at `database_url` and creates the schema.
	pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
		let backend = Self::new(create_pool(database_url).await?);
		backend.migrate().await?;
		Ok(backend)
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	#[tracing::instrument(skip(self))]
	pub async fn migrate(&self) -> Result<(), StoreError> {
		sqlx::query(
			r#"
			CREATE TABLE IF NOT EXISTS pairwise_ids (
				id INTEGER PRIMARY KEY AUTOINCREMENT,
				relying_party TEXT NOT NULL,
				principal TEXT NOT NULL,
				persistent_id TEXT NOT NULL UNIQUE,
				created_at TEXT NOT NULL,
				deactivated_at TEXT
			)
			"#,
		)
		.execute(&self.pool)
		.await?;

		sqlx::query(
			r#"
			CREATE UNIQUE INDEX IF NOT EXISTS idx_pairwise_ids_active
			ON pairwise_ids (relying_party, principal)
			WHERE deactivated_at IS NULL
			"#,
		)
		.execute(&self.pool)
		.await?;

		tracing::debug!("pairwise schema ready");
		Ok(())
	}
}

#[async_trait]
impl PairwiseIdBackend for SqlitePairwiseIdBackend {
	#[tracing::instrument(skip(self, key), fields(relying_party = %key.relying_party))]
	async fn find(&self, key: &PairwiseKey) -> Result<Option<String>, StoreError> {
		let row = sqlx::query(
			r#"
			SELECT persistent_id
			FROM pairwise_ids
			WHERE relying_party = ? AND principal = ? AND deactivated_at IS NULL
			"#,
		)
		.bind(&key.relying_party)
		.bind(&key.principal)
		.fetch_optional(&self.pool)
		.await?;

		match row {
			Some(row) => Ok(Some(row.try_get::<String, _>("persistent_id")?)),
			None => Ok(None),
		}
	}

	#[tracing::instrument(skip(self, key, persistent_id), fields(relying_party = %key.relying_party))]
	async fn insert(&self, key: &PairwiseKey, persistent_id: &str) -> Result<(), StoreError> {
		sqlx::query(
			r#"
			INSERT INTO pairwise_ids (relying_party, principal, persistent_id, created_at)
			VALUES (?, ?, ?, ?)
			"#,
		)
		.bind(&key.relying_party)
		.bind(&key.principal)
		.bind(persistent_id)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!("pairwise identifier stored");
		Ok(())
	}

	#[tracing::instrument(skip(self, key), fields(relying_party = %key.relying_party))]
	async fn deactivate(&self, key: &PairwiseKey) -> Result<bool, StoreError> {
		let result = sqlx::query(
			r#"
			UPDATE pairwise_ids
			SET deactivated_at = ?
			WHERE relying_party = ? AND principal = ? AND deactivated_at IS NULL
			"#,
		)
		.bind(Utc::now().to_rfc3339())
		.bind(&key.relying_party)
		.bind(&key.principal)
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}
}
