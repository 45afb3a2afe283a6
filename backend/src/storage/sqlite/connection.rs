use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::sync::Arc;

/// DbConnection manages the SQLite pool and schema
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePool::connect(url).await?;

        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS collection_points (
                id TEXT PRIMARY KEY,
                reference_name TEXT NOT NULL,
                vpa TEXT NOT NULL,
                description TEXT,
                category TEXT NOT NULL DEFAULT 'Custom',
                notes TEXT,
                max_amount REAL,
                status TEXT NOT NULL DEFAULT 'Active' CHECK (status IN ('Active', 'Inactive')),
                simulation_enabled BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Recovery scan at startup filters on both columns
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_collection_points_simulation
            ON collection_points(status, simulation_enabled);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                point_id TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                outcome TEXT NOT NULL CHECK (outcome IN ('Success', 'Failed', 'Pending')),
                reference TEXT NOT NULL UNIQUE,
                occurred_at TEXT NOT NULL,
                payer_name TEXT NOT NULL,
                payer_phone TEXT NOT NULL,
                payment_app TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_transactions_point_occurred
            ON transactions(point_id, occurred_at DESC);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_transactions_occurred_at
            ON transactions(occurred_at DESC);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}
