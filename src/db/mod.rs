//! Catalog store for imagery-dl
//!
//! The catalog lives in a SQLite database maintained by other tooling. We only
//! read from it: an item belongs to the catalog when its number appears in the
//! staging table and also in the master table.
//!
//! ## Submodules
//!
//! - [`catalog`] — connection handling and the catalog query

use sqlx::sqlite::SqlitePool;

mod catalog;

/// Read-only handle on the catalog database
#[derive(Clone, Debug)]
pub struct CatalogDb {
    pool: SqlitePool,
    query: String,
}

impl CatalogDb {
    /// Close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
