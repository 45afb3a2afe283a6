use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use super::connection::DbConnection;
use crate::domain::commands::points::PointFilter;
use crate::domain::models::collection_point::{CollectionPoint, PointCategory, PointStatus};
use crate::storage::traits::CollectionPointStorage;

const POINT_COLUMNS: &str = "id, reference_name, vpa, description, category, notes, max_amount, \
     status, simulation_enabled, created_at, updated_at";

/// Repository for collection point operations
#[derive(Clone)]
pub struct CollectionPointRepository {
    db: DbConnection,
}

impl CollectionPointRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_point(row: &SqliteRow) -> Result<CollectionPoint> {
        let status: String = row.get("status");
        let category: String = row.get("category");
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");

        Ok(CollectionPoint {
            id: row.get("id"),
            reference_name: row.get("reference_name"),
            vpa: row.get("vpa"),
            description: row.get("description"),
            category: PointCategory::from_string(&category).map_err(|e| anyhow!(e))?,
            notes: row.get("notes"),
            max_amount: row.get("max_amount"),
            status: PointStatus::from_string(&status).map_err(|e| anyhow!(e))?,
            simulation_enabled: row.get("simulation_enabled"),
            created_at: parse_timestamp(&created_at).context("Failed to parse created_at")?,
            updated_at: parse_timestamp(&updated_at).context("Failed to parse updated_at")?,
        })
    }
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

/// Escape LIKE wildcards so the search text matches literally.
/// Pair with `ESCAPE '\'`.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &PointFilter) {
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(category) = filter.category {
        builder.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(search) = filter.search.as_deref() {
        let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
        builder
            .push(" AND (LOWER(id) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(reference_name) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(vpa) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

#[async_trait]
impl CollectionPointStorage for CollectionPointRepository {
    async fn store_point(&self, point: &CollectionPoint) -> Result<()> {
        let simulation_enabled = point.simulation_enabled && point.status == PointStatus::Active;
        sqlx::query(
            r#"
            INSERT INTO collection_points
                (id, reference_name, vpa, description, category, notes, max_amount,
                 status, simulation_enabled, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&point.id)
        .bind(&point.reference_name)
        .bind(&point.vpa)
        .bind(&point.description)
        .bind(point.category.as_str())
        .bind(&point.notes)
        .bind(point.max_amount)
        .bind(point.status.as_str())
        .bind(simulation_enabled)
        .bind(format_timestamp(&point.created_at))
        .bind(format_timestamp(&point.updated_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, point_id: &str) -> Result<Option<CollectionPoint>> {
        let sql = format!("SELECT {} FROM collection_points WHERE id = ?", POINT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(point_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_point).transpose()
    }

    async fn list_points(&self, filter: &PointFilter) -> Result<Vec<CollectionPoint>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM collection_points WHERE 1 = 1",
            POINT_COLUMNS
        ));
        push_filters(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC, id ASC");

        if filter.limit.is_some() || filter.offset.is_some() {
            // SQLite reads a negative LIMIT as "no limit"
            let limit = filter.limit.map_or(-1, i64::from);
            builder
                .push(" LIMIT ")
                .push_bind(limit)
                .push(" OFFSET ")
                .push_bind(i64::from(filter.offset.unwrap_or(0)));
        }

        let rows = builder.build().fetch_all(self.db.pool()).await?;
        rows.iter().map(Self::row_to_point).collect()
    }

    async fn count_points(&self, filter: &PointFilter) -> Result<u64> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) AS total FROM collection_points WHERE 1 = 1");
        push_filters(&mut builder, filter);

        let row = builder.build().fetch_one(self.db.pool()).await?;
        let total: i64 = row.get("total");
        Ok(total as u64)
    }

    async fn find_eligible_for_simulation(&self) -> Result<Vec<CollectionPoint>> {
        let sql = format!(
            "SELECT {} FROM collection_points \
             WHERE status = 'Active' AND simulation_enabled = TRUE ORDER BY id ASC",
            POINT_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(self.db.pool()).await?;
        rows.iter().map(Self::row_to_point).collect()
    }

    async fn update_point(&self, point: &CollectionPoint) -> Result<()> {
        let simulation_enabled = point.simulation_enabled && point.status == PointStatus::Active;
        let result = sqlx::query(
            r#"
            UPDATE collection_points
            SET reference_name = ?, vpa = ?, description = ?, category = ?, notes = ?,
                max_amount = ?, status = ?, simulation_enabled = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&point.reference_name)
        .bind(&point.vpa)
        .bind(&point.description)
        .bind(point.category.as_str())
        .bind(&point.notes)
        .bind(point.max_amount)
        .bind(point.status.as_str())
        .bind(simulation_enabled)
        .bind(format_timestamp(&point.updated_at))
        .bind(&point.id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("Collection point not found: {}", point.id));
        }
        Ok(())
    }

    async fn set_status(&self, point_id: &str, status: PointStatus) -> Result<Option<CollectionPoint>> {
        let result = sqlx::query(
            r#"
            UPDATE collection_points
            SET status = ?,
                simulation_enabled = CASE WHEN ? = 'Inactive' THEN FALSE ELSE simulation_enabled END,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(status.as_str())
        .bind(format_timestamp(&Utc::now()))
        .bind(point_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(point_id).await
    }

    async fn set_simulation_enabled(&self, point_id: &str, enabled: bool) -> Result<Option<CollectionPoint>> {
        let result = sqlx::query(
            r#"
            UPDATE collection_points
            SET simulation_enabled = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(enabled)
        .bind(format_timestamp(&Utc::now()))
        .bind(point_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(point_id).await
    }

    async fn clear_simulation_flags(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE collection_points
            SET simulation_enabled = FALSE, updated_at = ?
            WHERE simulation_enabled = TRUE
            "#,
        )
        .bind(format_timestamp(&Utc::now()))
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_point(&self, point_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM collection_points WHERE id = ?")
            .bind(point_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
