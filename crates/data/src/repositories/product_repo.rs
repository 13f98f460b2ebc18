//! Product repository.
//!
//! Identity and dedup for tracked products, keyed by an optional free-text
//! prompt, plus detail reads that attach each product's snapshot collection.

use anyhow::Result;
use sqlx::PgPool;
use std::collections::HashMap;

use crate::models::{NewProduct, ProductDetail, ProductRecord, SnapshotRecord};

/// Repository for product registry operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a product unconditionally and returns the stored row.
    ///
    /// Does not check for an existing prompt match; use [`Self::find_or_create`]
    /// for idempotent creation.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn create(&self, product: &NewProduct) -> Result<ProductRecord> {
        let record = sqlx::query_as::<_, ProductRecord>(
            r"
            INSERT INTO products (name, prompt)
            VALUES ($1, $2)
            RETURNING id, name, prompt, created_at
            ",
        )
        .bind(&product.name)
        .bind(&product.prompt)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Finds a product by exact prompt equality.
    ///
    /// When duplicate prompts exist the lowest `id` wins, so repeated calls
    /// are deterministic.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn find_by_prompt(&self, prompt: &str) -> Result<Option<ProductRecord>> {
        let record = sqlx::query_as::<_, ProductRecord>(
            r"
            SELECT id, name, prompt, created_at
            FROM products
            WHERE prompt = $1
            ORDER BY id ASC
            LIMIT 1
            ",
        )
        .bind(prompt)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Returns the product matching `prompt`, creating it with `name` if absent.
    ///
    /// Not race-free: there is no unique constraint on `prompt`, so two
    /// concurrent calls can both observe "absent" and both insert. Callers
    /// needing strict dedup must add a unique index and conflict handling at
    /// the store boundary.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn find_or_create(&self, name: &str, prompt: &str) -> Result<ProductRecord> {
        if let Some(existing) = self.find_by_prompt(prompt).await? {
            return Ok(existing);
        }

        self.create(&NewProduct::new(name).with_prompt(prompt)).await
    }

    /// Point lookup by id. `Ok(None)` when absent, never an error.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: i64) -> Result<Option<ProductRecord>> {
        let record = sqlx::query_as::<_, ProductRecord>(
            r"
            SELECT id, name, prompt, created_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Returns true if a product with the given id exists.
    ///
    /// Used as the boundary-layer referential check before snapshot appends;
    /// the foreign key backs it up at the store level.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn exists(&self, id: i64) -> Result<bool> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.0)
    }

    /// Point lookup by id with the product's snapshot collection attached,
    /// snapshots ordered ascending by `captured_at`.
    ///
    /// # Errors
    /// Returns an error if a database query fails.
    pub async fn get_detail(&self, id: i64) -> Result<Option<ProductDetail>> {
        let Some(product) = self.get(id).await? else {
            return Ok(None);
        };

        let snapshots = sqlx::query_as::<_, SnapshotRecord>(
            r"
            SELECT id, product_id, title, price, urls, captured_at
            FROM snapshots
            WHERE product_id = $1
            ORDER BY captured_at ASC, id ASC
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(ProductDetail::new(product, snapshots)))
    }

    /// Lists all products ordered by `id` ascending, each with its snapshot
    /// collection attached.
    ///
    /// # Errors
    /// Returns an error if a database query fails.
    pub async fn list_detail(&self) -> Result<Vec<ProductDetail>> {
        let products = sqlx::query_as::<_, ProductRecord>(
            r"
            SELECT id, name, prompt, created_at
            FROM products
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        if products.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        let snapshots = sqlx::query_as::<_, SnapshotRecord>(
            r"
            SELECT id, product_id, title, price, urls, captured_at
            FROM snapshots
            WHERE product_id = ANY($1)
            ORDER BY captured_at ASC, id ASC
            ",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_product: HashMap<i64, Vec<SnapshotRecord>> = HashMap::new();
        for snapshot in snapshots {
            by_product.entry(snapshot.product_id).or_default().push(snapshot);
        }

        Ok(products
            .into_iter()
            .map(|p| {
                let snaps = by_product.remove(&p.id).unwrap_or_default();
                ProductDetail::new(p, snaps)
            })
            .collect())
    }

    /// Deletes a product and, via the store-level cascade, all its snapshots.
    ///
    /// Returns false when no such product existed.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProduct;

    #[test]
    fn test_repository_struct_size() {
        assert!(std::mem::size_of::<ProductRepository>() > 0);
    }

    #[test]
    fn test_new_product_for_find_or_create() {
        let product = NewProduct::new("X").with_prompt("test-prompt");
        assert_eq!(product.name, "X");
        assert_eq!(product.prompt.as_deref(), Some("test-prompt"));
    }

    // Integration tests would use a real database
    // #[tokio::test]
    // async fn test_find_or_create_returns_existing_id() {
    //     let pool = setup_test_database().await;
    //     let repo = ProductRepository::new(pool);
    //     let first = repo.find_or_create("Test", "test-prompt").await.unwrap();
    //     let again = repo.find_or_create("Other name", "test-prompt").await.unwrap();
    //     assert_eq!(first.id, again.id);
    // }
}
