//! Database repositories for the price tracker.
//!
//! `ProductRepository` is the product registry (identity and prompt-keyed
//! dedup); `SnapshotRepository` is the append-only snapshot log together
//! with its temporal queries.

pub mod product_repo;
pub mod snapshot_repo;

pub use product_repo::ProductRepository;
pub use snapshot_repo::SnapshotRepository;

use sqlx::PgPool;

/// Creates all repositories from a single database pool.
pub struct Repositories {
    pub products: ProductRepository,
    pub snapshots: SnapshotRepository,
}

impl Repositories {
    /// Creates a new set of repositories from a database pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool.clone()),
            snapshots: SnapshotRepository::new(pool),
        }
    }
}
