//! SQLx-backed history store over the `Any` driver.
//!
//! One implementation serves both the embedded SQLite file and a
//! networked PostgreSQL instance; `DB_TYPE` picks the connection URL at
//! startup, so backend selection never leaks into the watch loop.

use crate::config::DbConfig;
use crate::error::WatchError;
use crate::history::HistoryStore;
use crate::models::Observation;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use std::path::Path;
use std::sync::Once;
use tracing::{debug, warn};

// Timestamps are stored as fixed-precision RFC 3339 UTC text so that
// lexicographic order equals chronological order on every backend.
const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS observations ( \
     recorded_at  TEXT NOT NULL, \
     product_name TEXT NOT NULL, \
     price        DOUBLE PRECISION NOT NULL \
 )";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_observations_recorded_at ON observations (recorded_at)";

const SELECT_LATEST: &str = "SELECT recorded_at, product_name, price FROM observations \
     ORDER BY recorded_at DESC LIMIT 1";

const SELECT_ALL: &str = "SELECT recorded_at, product_name, price FROM observations \
     ORDER BY recorded_at ASC";

// The Any driver does not translate placeholder syntax.
const INSERT_SQLITE: &str =
    "INSERT INTO observations (recorded_at, product_name, price) VALUES (?, ?, ?)";
const INSERT_POSTGRES: &str =
    "INSERT INTO observations (recorded_at, product_name, price) VALUES ($1, $2, $3)";

static INSTALL_DRIVERS: Once = Once::new();

/// History store backed by SQLite or PostgreSQL through `sqlx::Any`.
pub struct SqlxHistoryStore {
    pool: AnyPool,
    insert_sql: &'static str,
}

impl SqlxHistoryStore {
    /// Connects per the configured backend and creates the schema if
    /// it does not exist yet.
    pub async fn connect(db: &DbConfig) -> Result<Self> {
        INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);

        let insert_sql = match db {
            DbConfig::Sqlite { file } => {
                ensure_parent_dir(file)?;
                INSERT_SQLITE
            }
            DbConfig::Postgres { .. } => INSERT_POSTGRES,
        };

        let url = db.connection_url();
        debug!("connecting to history store");

        let pool = AnyPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .context("failed to connect to history store")?;

        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .context("failed to create observations table")?;
        sqlx::query(CREATE_INDEX)
            .execute(&pool)
            .await
            .context("failed to create observations index")?;

        Ok(Self { pool, insert_sql })
    }
}

fn ensure_parent_dir(file: &str) -> Result<()> {
    if let Some(parent) = Path::new(file).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create data directory {}", parent.display())
            })?;
        }
    }
    Ok(())
}

fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_observation(row: &AnyRow) -> Result<Observation> {
    let recorded_at: String = row.try_get("recorded_at")?;
    let recorded_at = DateTime::parse_from_rfc3339(&recorded_at)
        .with_context(|| format!("invalid stored timestamp {recorded_at:?}"))?
        .with_timezone(&Utc);

    Ok(Observation {
        recorded_at,
        product_name: row.try_get("product_name")?,
        price: row.try_get("price")?,
    })
}

#[async_trait]
impl HistoryStore for SqlxHistoryStore {
    async fn append(&self, observation: &Observation) -> Result<(), WatchError> {
        sqlx::query(self.insert_sql)
            .bind(encode_timestamp(&observation.recorded_at))
            .bind(observation.product_name.as_str())
            .bind(observation.price)
            .execute(&self.pool)
            .await
            .map_err(|e| WatchError::Store(e.into()))?;

        Ok(())
    }

    async fn latest(&self) -> Result<Option<Observation>, WatchError> {
        let row = sqlx::query(SELECT_LATEST)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| WatchError::Store(e.into()))?;

        match row {
            Some(row) => Ok(Some(row_to_observation(&row).map_err(WatchError::Store)?)),
            None => Ok(None),
        }
    }

    async fn all(&self) -> Result<Vec<Observation>, WatchError> {
        let rows = sqlx::query(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| WatchError::Store(e.into()))?;

        let mut observations = Vec::with_capacity(rows.len());
        for row in &rows {
            match row_to_observation(row) {
                Ok(observation) => observations.push(observation),
                Err(e) => {
                    // Skip the poison row rather than fail the batch.
                    warn!(error = %e, "skipping malformed observation row");
                }
            }
        }

        Ok(observations)
    }
}
