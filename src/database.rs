//! Database handle.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::Result;

/// Shared storage handle.
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    /// Open (or create) the SQLite database at `path`.
    pub async fn new(path: &str, pool_size: u32) -> Result<Self> {
        let options =
            SqliteConnectOptions::new().filename(path).create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }
}
