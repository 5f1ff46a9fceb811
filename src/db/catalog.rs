//! Catalog connection and queries.

use crate::config::CatalogConfig;
use crate::error::DatabaseError;
use crate::types::Identifier;
use crate::{Error, Result};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use super::CatalogDb;

impl CatalogDb {
    /// Open an existing catalog database
    ///
    /// The database is opened read-only and is never created: a missing file
    /// is a connection error.
    pub async fn open(path: &Path, config: &CatalogConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to parse database path: {}",
                    e
                )))
            })?
            .create_if_missing(false)
            .read_only(true);

        let pool = SqlitePool::connect_with(options).await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to open catalog {}: {}",
                path.display(),
                e
            )))
        })?;

        tracing::debug!(path = %path.display(), "opened catalog database");

        Ok(Self {
            pool,
            query: catalog_query(config),
        })
    }

    /// Identifiers present in both the staging and the master table
    ///
    /// Values are trimmed; blank and duplicate entries are dropped.
    pub async fn catalog_item_ids(&self) -> Result<HashSet<Identifier>> {
        let rows = sqlx::query(&self.query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to load catalog items: {}",
                    e
                )))
            })?;

        let mut ids = HashSet::with_capacity(rows.len());
        for row in rows {
            let value: Option<String> = row.try_get(0).map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to read catalog item: {}",
                    e
                )))
            })?;
            if let Some(value) = value {
                let value = value.trim();
                if !value.is_empty() {
                    ids.insert(Identifier::new(value));
                }
            }
        }

        tracing::info!(count = ids.len(), "loaded catalog items");
        Ok(ids)
    }
}

/// Staging items that also exist in the master table
///
/// Table and column names come from a validated [`CatalogConfig`] and are
/// plain identifiers, so interpolating them is safe.
fn catalog_query(config: &CatalogConfig) -> String {
    format!(
        r#"
        SELECT DISTINCT s."{sc}"
        FROM "{st}" s
        INNER JOIN "{mt}" m ON m."{mc}" = s."{sc}"
        WHERE s."{sc}" IS NOT NULL
        "#,
        st = config.staging_table,
        sc = config.staging_column,
        mt = config.master_table,
        mc = config.master_column,
    )
}
