//! Database module: models, schema and repository for persistent storage.
//!
//! Layout:
//! - `models.rs`: vision rows, write inputs and their validation
//! - `schema.rs`: SQL DDL and column migrations (SQLite-first)
//! - `sqlite.rs`: `VisionRepository`, all reads and writes

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{NewVision, Vision, VisionUpdate};
pub use schema::{MigrationOutcome, SchemaManager, SchemaReport};
pub use sqlite::{SqlitePool, VisionRepository};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Open a pool for `database_url`, creating the database file when missing.
/// In-memory databases get a single connection so every query sees the same data.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(8)
    };
    pool.connect_with(options).await
}
