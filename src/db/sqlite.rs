use crate::db::models::{
    DEFAULT_CREATOR, DEFAULT_NETWORK, DEFAULT_STATUS, NewVision, Vision, VisionUpdate,
    format_timestamp,
};
use crate::error::VisionError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

pub type SqlitePool = Pool<Sqlite>;

const VISION_COLUMNS: &str = "id, title, description, category, odds, image_url, \
     creator_address, network, status, created_at, updated_at";

const VISION_COLUMNS_WITH_IMAGE_DATA: &str = "id, title, description, category, odds, \
     image_url, image_data, creator_address, network, status, created_at, updated_at";

/// Typed CRUD over the `visions` table.
#[derive(Clone)]
pub struct VisionRepository {
    pool: SqlitePool,
    image_data: bool,
}

impl VisionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            image_data: true,
        }
    }

    /// Whether the `image_data` column exists. When it does not, reads report
    /// no image data and writes leave the column out.
    pub fn with_image_data(mut self, available: bool) -> Self {
        self.image_data = available;
        self
    }

    fn columns(&self) -> &'static str {
        if self.image_data {
            VISION_COLUMNS_WITH_IMAGE_DATA
        } else {
            VISION_COLUMNS
        }
    }

    /// Round-trip a trivial query; used by the health probe.
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// All visions, newest first.
    pub async fn get_all(&self) -> Result<Vec<Vision>, VisionError> {
        let sql = format!(
            "SELECT {} FROM visions ORDER BY created_at DESC, id DESC",
            self.columns()
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(|r| self.row_to_model(r)).collect()
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Vision>, VisionError> {
        let sql = format!("SELECT {} FROM visions WHERE id = ?", self.columns());
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| self.row_to_model(r)).transpose()
    }

    pub async fn get_by_category(&self, category: &str) -> Result<Vec<Vision>, VisionError> {
        let sql = format!(
            "SELECT {} FROM visions WHERE category = ? ORDER BY created_at DESC, id DESC",
            self.columns()
        );
        let rows = sqlx::query(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(|r| self.row_to_model(r)).collect()
    }

    /// Every vision posted by `address`, newest first.
    pub async fn get_by_creator(&self, address: &str) -> Result<Vec<Vision>, VisionError> {
        let sql = format!(
            "SELECT {} FROM visions WHERE creator_address = ? ORDER BY created_at DESC, id DESC",
            self.columns()
        );
        let rows = sqlx::query(&sql)
            .bind(address)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(|r| self.row_to_model(r)).collect()
    }

    pub async fn count(&self) -> Result<i64, VisionError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM visions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Validate, apply defaults and insert. Returns the stored row.
    pub async fn create(&self, input: NewVision) -> Result<Vision, VisionError> {
        let input = input.normalized();
        input.validate()?;

        let now = format_timestamp(Utc::now());
        let (image_col, image_param) = if self.image_data {
            (", image_data", ", ?")
        } else {
            ("", "")
        };
        let sql = format!(
            r#"INSERT INTO visions (
                title, description, category, odds, image_url,
                creator_address, network, status, created_at, updated_at{image_col}
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?{image_param})
            RETURNING {}"#,
            self.columns()
        );

        let mut query = sqlx::query(&sql)
            .bind(input.title)
            .bind(input.description)
            .bind(input.category)
            .bind(input.odds)
            .bind(input.image_url)
            .bind(
                input
                    .creator_address
                    .unwrap_or_else(|| DEFAULT_CREATOR.to_string()),
            )
            .bind(input.network.unwrap_or_else(|| DEFAULT_NETWORK.to_string()))
            .bind(input.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()))
            .bind(now.clone())
            .bind(now);
        if self.image_data {
            query = query.bind(input.image_data);
        }

        let row = query.fetch_one(&self.pool).await?;
        self.row_to_model(row)
    }

    /// Replace only the supplied fields and refresh `updated_at`. A new
    /// `image_url` clears the embedded `image_data` of the old one.
    /// `Ok(None)` when no row has this id.
    pub async fn update(
        &self,
        id: i64,
        changes: VisionUpdate,
    ) -> Result<Option<Vision>, VisionError> {
        let changes = changes.normalized();
        changes.validate()?;

        let image_reset = if self.image_data {
            "image_data = CASE WHEN ? IS NULL THEN image_data ELSE NULL END,"
        } else {
            ""
        };
        let sql = format!(
            r#"UPDATE visions SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                category = COALESCE(?, category),
                odds = COALESCE(?, odds),
                image_url = COALESCE(?, image_url),
                {image_reset}
                status = COALESCE(?, status),
                updated_at = ?
              WHERE id = ?
              RETURNING {}"#,
            self.columns()
        );
        let mut query = sqlx::query(&sql)
            .bind(changes.title)
            .bind(changes.description)
            .bind(changes.category)
            .bind(changes.odds)
            .bind(changes.image_url.clone());
        if self.image_data {
            query = query.bind(changes.image_url);
        }
        let row = query
            .bind(changes.status)
            .bind(format_timestamp(Utc::now()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| self.row_to_model(r)).transpose()
    }

    /// Hard delete. Returns the removed row, or `Ok(None)` when absent.
    pub async fn delete(&self, id: i64) -> Result<Option<Vision>, VisionError> {
        let sql = format!("DELETE FROM visions WHERE id = ? RETURNING {}", self.columns());
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| self.row_to_model(r)).transpose()
    }

    fn row_to_model(&self, row: SqliteRow) -> Result<Vision, VisionError> {
        let id: i64 = row.try_get("id")?;
        let title: String = row.try_get("title")?;
        let description: Option<String> = row.try_get("description")?;
        let category: String = row.try_get("category")?;
        let odds: Option<f64> = row.try_get("odds")?;
        let image_url: Option<String> = row.try_get("image_url")?;
        let image_data: Option<String> = if self.image_data {
            row.try_get("image_data")?
        } else {
            None
        };
        let creator_address: Option<String> = row.try_get("creator_address")?;
        let network: Option<String> = row.try_get("network")?;
        let status: Option<String> = row.try_get("status")?;
        let created_at_str: String = row.try_get("created_at")?;
        let updated_at_str: String = row.try_get("updated_at")?;

        Ok(Vision {
            id,
            title,
            description,
            category,
            odds,
            image_url,
            image_data,
            creator_address: creator_address.unwrap_or_else(|| DEFAULT_CREATOR.to_string()),
            network: network.unwrap_or_else(|| DEFAULT_NETWORK.to_string()),
            status: status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            created_at: parse_timestamp(&created_at_str)?,
            updated_at: parse_timestamp(&updated_at_str)?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, VisionError> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
        .with_timezone(&Utc);
    Ok(parsed)
}
