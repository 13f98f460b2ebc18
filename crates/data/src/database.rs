use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

pub struct DatabaseClient {
    pool: PgPool,
}

impl DatabaseClient {
    /// Creates a new database client connected to the specified `PostgreSQL` database.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Connects with bounded retry, for server startup while the database
    /// container is still coming up.
    ///
    /// # Errors
    /// Returns the last connection error once all attempts are exhausted.
    pub async fn connect_with_retry(
        database_url: &str,
        max_connections: u32,
        attempts: u32,
    ) -> Result<Self> {
        let mut remaining = attempts.max(1);
        loop {
            match Self::new(database_url, max_connections).await {
                Ok(client) => return Ok(client),
                Err(e) => {
                    remaining -= 1;
                    if remaining == 0 {
                        return Err(e);
                    }
                    tracing::warn!(
                        "Database not ready ({}), retrying ({} attempts left)",
                        e,
                        remaining
                    );
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    }

    /// Creates the `products` and `snapshots` tables if they do not exist.
    ///
    /// Safe to call on every startup. `snapshots.product_id` carries a
    /// cascading foreign key, so deleting a product removes its snapshots
    /// at the store level.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS products (
                id          BIGSERIAL PRIMARY KEY,
                name        TEXT NOT NULL,
                prompt      TEXT,
                created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS snapshots (
                id          BIGSERIAL PRIMARY KEY,
                product_id  BIGINT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
                title       TEXT NOT NULL,
                price       NUMERIC(10, 2),
                urls        JSONB NOT NULL DEFAULT '[]'::jsonb,
                captured_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_snapshots_product_captured
            ON snapshots (product_id, captured_at)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Returns a clone of the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }
}
