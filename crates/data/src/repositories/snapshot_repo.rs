//! Snapshot repository: the append-only log and its temporal queries.
//!
//! All reads are filtered or aggregated scans over one product's snapshots.
//! Tie-break policies are fixed here once, in single canonical queries:
//! "latest" prefers the highest `id` among equal capture times, and
//! "lowest price" prefers the most recent capture among equal prices.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::{NewSnapshot, SnapshotRecord};

const SNAPSHOT_COLUMNS: &str = "id, product_id, title, price, urls, captured_at";

/// Repository for snapshot log and temporal query operations.
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    pool: PgPool,
}

impl SnapshotRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends one snapshot and returns the stored row.
    ///
    /// When `captured_at` is absent the store default `now()` applies, so
    /// the capture time is server-assigned. The log is append-only: this
    /// never mutates or removes existing rows. A missing product is rejected
    /// by the foreign key.
    ///
    /// # Errors
    /// Returns an error if the database operation fails, including when
    /// `product_id` references no existing product.
    pub async fn insert(&self, snapshot: &NewSnapshot) -> Result<SnapshotRecord> {
        let record = match snapshot.captured_at {
            Some(captured_at) => {
                sqlx::query_as::<_, SnapshotRecord>(&format!(
                    r"
                    INSERT INTO snapshots (product_id, title, price, urls, captured_at)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING {SNAPSHOT_COLUMNS}
                    "
                ))
                .bind(snapshot.product_id)
                .bind(&snapshot.title)
                .bind(snapshot.price)
                .bind(Json(&snapshot.urls))
                .bind(captured_at)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, SnapshotRecord>(&format!(
                    r"
                    INSERT INTO snapshots (product_id, title, price, urls)
                    VALUES ($1, $2, $3, $4)
                    RETURNING {SNAPSHOT_COLUMNS}
                    "
                ))
                .bind(snapshot.product_id)
                .bind(&snapshot.title)
                .bind(snapshot.price)
                .bind(Json(&snapshot.urls))
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(record)
    }

    /// Returns the single most recent snapshot for a product.
    ///
    /// Ties on `captured_at` break deterministically to the highest `id`.
    /// `Ok(None)` when the product has no snapshots.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn latest(&self, product_id: i64) -> Result<Option<SnapshotRecord>> {
        let record = sqlx::query_as::<_, SnapshotRecord>(&format!(
            r"
            SELECT {SNAPSHOT_COLUMNS}
            FROM snapshots
            WHERE product_id = $1
            ORDER BY captured_at DESC, id DESC
            LIMIT 1
            "
        ))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Returns all snapshots sharing the product's maximum `captured_at`.
    ///
    /// One ingestion run commonly produces several rows with the same
    /// capture time; this returns the whole batch, not just one of them.
    /// Empty when the product has no snapshots, never an error.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn latest_batch(&self, product_id: i64) -> Result<Vec<SnapshotRecord>> {
        let records = sqlx::query_as::<_, SnapshotRecord>(&format!(
            r"
            SELECT {SNAPSHOT_COLUMNS}
            FROM snapshots
            WHERE product_id = $1
              AND captured_at = (
                  SELECT MAX(captured_at) FROM snapshots WHERE product_id = $1
              )
            ORDER BY id ASC
            "
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Returns all snapshots captured within the past `days` days, ordered
    /// ascending by `captured_at`.
    ///
    /// The window is `captured_at >= now - days`, with no upper bound;
    /// `days = 0` returns only rows captured at the query instant itself.
    /// A window too large to represent degenerates to "everything".
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn history(&self, product_id: i64, days: i64) -> Result<Vec<SnapshotRecord>> {
        let cutoff = Duration::try_days(days)
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let records = sqlx::query_as::<_, SnapshotRecord>(&format!(
            r"
            SELECT {SNAPSHOT_COLUMNS}
            FROM snapshots
            WHERE product_id = $1
              AND captured_at >= $2
            ORDER BY captured_at ASC, id ASC
            "
        ))
        .bind(product_id)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Returns the snapshot with the lowest non-null price whose
    /// `captured_at` falls in the inclusive `[start, end]` window.
    ///
    /// An absent bound leaves that side unbounded; callers wanting to
    /// exclude future-dated rows must pass `end = now` explicitly. Among
    /// equal minimal prices the most recent capture wins (then highest
    /// `id`). `Ok(None)` when no priced snapshot is in the window, which
    /// includes the `start > end` caller error.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn lowest_price_in_period(
        &self,
        product_id: i64,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Option<SnapshotRecord>> {
        let record = sqlx::query_as::<_, SnapshotRecord>(&format!(
            r"
            SELECT {SNAPSHOT_COLUMNS}
            FROM snapshots
            WHERE product_id = $1
              AND price IS NOT NULL
              AND ($2::timestamptz IS NULL OR captured_at >= $2)
              AND ($3::timestamptz IS NULL OR captured_at <= $3)
            ORDER BY price ASC, captured_at DESC, id DESC
            LIMIT 1
            "
        ))
        .bind(product_id)
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_repository_struct_size() {
        assert!(std::mem::size_of::<SnapshotRepository>() > 0);
    }

    #[test]
    fn test_new_snapshot_for_insertion() {
        let snap = NewSnapshot::new(1, "snap1")
            .with_price(dec!(1.00))
            .with_urls(vec!["u1".to_string()]);

        assert!(snap.captured_at.is_none()); // store assigns now() on insert
        assert_eq!(snap.title, "snap1");
    }

    #[test]
    fn test_history_window_filtering_logic() {
        // history(days=2) keeps T-1day and drops T-3days
        let now = sample_timestamp();
        let cutoff = now - Duration::days(2);
        let one_day_ago = now - Duration::days(1);
        let three_days_ago = now - Duration::days(3);

        assert!(one_day_ago >= cutoff);
        assert!(three_days_ago < cutoff);
    }

    #[test]
    fn test_history_zero_days_window_is_degenerate() {
        let now = sample_timestamp();
        let cutoff = now - Duration::days(0);
        let just_before = now - Duration::seconds(1);

        assert_eq!(cutoff, now);
        assert!(just_before < cutoff);
    }

    #[test]
    fn test_lowest_price_tie_break_ordering() {
        // The query orders by (price ASC, captured_at DESC, id DESC); verify
        // that ordering key picks the most recent among equal minimal prices.
        let earlier = (dec!(0.50), sample_timestamp() - Duration::days(2), 1_i64);
        let later = (dec!(0.50), sample_timestamp() - Duration::days(1), 2_i64);
        let pricier = (dec!(1.00), sample_timestamp(), 3_i64);

        let mut rows = vec![pricier, earlier, later];
        rows.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then(b.1.cmp(&a.1))
                .then(b.2.cmp(&a.2))
        });

        assert_eq!(rows[0].2, 2); // equal price, later capture wins
    }

    #[test]
    fn test_inverted_window_matches_nothing() {
        let start = sample_timestamp();
        let end = sample_timestamp() - Duration::days(1);
        let candidate = sample_timestamp() - Duration::hours(12);

        // start > end: no captured_at can satisfy both inclusive bounds.
        assert!(!(candidate >= start && candidate <= end));
    }

    // Integration tests would use a real database
    // #[tokio::test]
    // async fn test_latest_batch_returns_all_rows_at_max_timestamp() {
    //     let pool = setup_test_database().await;
    //     let repo = SnapshotRepository::new(pool);
    //     // ... two inserts at T, one at T-1h; latest_batch returns both T rows
    // }
}
