//! SQL DDL and self-migration for the `visions` table.

use crate::error::VisionError;
use sqlx::SqlitePool;
use tracing::{info, warn};

pub const VISIONS_TABLE: &str = "visions";

/// SQLite schema with:
/// - `id` INTEGER PRIMARY KEY AUTOINCREMENT (ids are never reused)
/// - timestamps as fixed-width RFC3339 text, microsecond precision
/// - defaults for creator/network/status matching the repository defaults
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS visions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NULL,
    category TEXT NOT NULL,
    odds REAL NULL,
    image_url TEXT NULL,
    image_data TEXT NULL, -- data URI
    creator_address TEXT NOT NULL DEFAULT 'Anonymous',
    network TEXT NOT NULL DEFAULT 'Chiliz',
    status TEXT NOT NULL DEFAULT 'active',
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f000Z', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f000Z', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_visions_category ON visions(category);
CREATE INDEX IF NOT EXISTS idx_visions_creator ON visions(creator_address)
"#;

/// Columns added after the first release, applied to older tables on boot.
pub const COLUMN_MIGRATIONS: &[(&str, &str)] = &[("image_data", "TEXT NULL")];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    Applied,
    AlreadyPresent,
    Skipped(String),
}

impl MigrationOutcome {
    pub fn column_available(&self) -> bool {
        !matches!(self, MigrationOutcome::Skipped(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReport {
    pub image_data: MigrationOutcome,
}

impl SchemaReport {
    pub fn image_data_available(&self) -> bool {
        self.image_data.column_available()
    }
}

#[derive(Clone)]
pub struct SchemaManager {
    pool: SqlitePool,
}

impl SchemaManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the table if missing, then bring older tables up to date.
    /// Safe to run on every start.
    pub async fn ensure_schema(&self) -> Result<SchemaReport, VisionError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }

        let mut image_data = MigrationOutcome::AlreadyPresent;
        for (name, sql_type) in COLUMN_MIGRATIONS {
            let outcome = self.ensure_column(name, sql_type).await;
            if *name == "image_data" {
                image_data = outcome;
            }
        }

        info!(table = VISIONS_TABLE, image_data = ?image_data, "schema ready");
        Ok(SchemaReport { image_data })
    }

    /// Add `name` to the table unless it is already there. Failures are
    /// reported as `Skipped` and never abort startup.
    pub async fn ensure_column(&self, name: &str, sql_type: &str) -> MigrationOutcome {
        if !is_identifier(name) {
            warn!(column = name, "refusing to migrate column with invalid name");
            return MigrationOutcome::Skipped(format!("invalid column name `{name}`"));
        }

        match self.column_exists(name).await {
            Ok(true) => {
                info!(column = name, "column already present");
                MigrationOutcome::AlreadyPresent
            }
            Ok(false) => {
                let ddl = format!("ALTER TABLE {VISIONS_TABLE} ADD COLUMN {name} {sql_type}");
                match sqlx::query(&ddl).execute(&self.pool).await {
                    Ok(_) => {
                        info!(column = name, sql_type, "column added");
                        MigrationOutcome::Applied
                    }
                    Err(e) => {
                        warn!(column = name, error = %e, "column migration skipped");
                        MigrationOutcome::Skipped(e.to_string())
                    }
                }
            }
            Err(e) => {
                warn!(column = name, error = %e, "column lookup failed; migration skipped");
                MigrationOutcome::Skipped(e.to_string())
            }
        }
    }

    async fn column_exists(&self, name: &str) -> Result<bool, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
                .bind(VISIONS_TABLE)
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect;

    const LEGACY_DDL: &str = r#"
        CREATE TABLE visions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NULL,
            category TEXT NOT NULL,
            odds REAL NULL,
            image_url TEXT NULL,
            creator_address TEXT NOT NULL DEFAULT 'Anonymous',
            network TEXT NOT NULL DEFAULT 'Chiliz',
            status TEXT NOT NULL DEFAULT 'active',
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f000Z', 'now')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f000Z', 'now'))
        )"#;

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let pool = connect("sqlite::memory:").await.unwrap();
        let schema = SchemaManager::new(pool);

        let first = schema.ensure_schema().await.unwrap();
        assert_eq!(first.image_data, MigrationOutcome::AlreadyPresent);
        let second = schema.ensure_schema().await.unwrap();
        assert_eq!(second, first);
        assert!(second.image_data_available());
    }

    #[tokio::test]
    async fn legacy_table_gains_image_data_without_losing_rows() {
        let pool = connect("sqlite::memory:").await.unwrap();
        sqlx::query(LEGACY_DDL).execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO visions (title, category) VALUES ('Old one', 'Tennis')")
            .execute(&pool)
            .await
            .unwrap();

        let schema = SchemaManager::new(pool.clone());
        let report = schema.ensure_schema().await.unwrap();
        assert_eq!(report.image_data, MigrationOutcome::Applied);

        let (title, image_data): (String, Option<String>) =
            sqlx::query_as("SELECT title, image_data FROM visions")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(title, "Old one");
        assert_eq!(image_data, None);

        let again = schema.ensure_column("image_data", "TEXT NULL").await;
        assert_eq!(again, MigrationOutcome::AlreadyPresent);
    }

    #[tokio::test]
    async fn ensure_column_degrades_instead_of_failing() {
        let pool = connect("sqlite::memory:").await.unwrap();
        let schema = SchemaManager::new(pool);

        // no table yet
        let missing_table = schema.ensure_column("image_data", "TEXT NULL").await;
        assert!(matches!(missing_table, MigrationOutcome::Skipped(_)));
        assert!(!missing_table.column_available());

        let bad_name = schema.ensure_column("x; DROP TABLE visions", "TEXT").await;
        assert!(matches!(bad_name, MigrationOutcome::Skipped(_)));
    }
}
