//! Ingestion bridge: turns candidate item batches into snapshot rows.
//!
//! Candidates come from the shopping assistant (or any producer of
//! `{title, price, urls}` records). The bridge appends one snapshot per
//! accepted candidate; it never deduplicates against existing snapshots.

use anyhow::Result;
use sqlx::PgPool;

use shop_viz_core::CandidateItem;

use crate::models::{NewSnapshot, ProductRecord, SnapshotRecord};
use crate::repositories::{ProductRepository, SnapshotRepository};

/// Splits a candidate batch into accepted items and the count of rejects.
///
/// A candidate without a usable title violates the ingestion contract and
/// is rejected; the rest of the batch still proceeds.
#[must_use]
pub fn accept_candidates(items: &[CandidateItem]) -> (Vec<&CandidateItem>, usize) {
    let accepted: Vec<&CandidateItem> = items.iter().filter(|i| i.has_title()).collect();
    let rejected = items.len() - accepted.len();
    (accepted, rejected)
}

/// Appends candidate item batches as snapshots for a product.
#[derive(Debug, Clone)]
pub struct IngestionBridge {
    products: ProductRepository,
    snapshots: SnapshotRepository,
}

impl IngestionBridge {
    /// Creates a new bridge over a database pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool.clone()),
            snapshots: SnapshotRepository::new(pool),
        }
    }

    /// Appends one snapshot per accepted candidate item.
    ///
    /// Candidates with a blank title are skipped with a warning; the rest
    /// of the batch proceeds. Appends are not transactional: on a mid-batch
    /// failure the snapshots already appended remain persisted
    /// (at-least-once, no batch atomicity).
    ///
    /// # Errors
    /// Returns an error if a snapshot insert fails, including when
    /// `product_id` references no existing product.
    pub async fn ingest(
        &self,
        product_id: i64,
        items: &[CandidateItem],
    ) -> Result<Vec<SnapshotRecord>> {
        let (accepted, rejected) = accept_candidates(items);
        if rejected > 0 {
            tracing::warn!(
                product_id,
                rejected,
                "Skipping candidate items without a title"
            );
        }

        let mut appended = Vec::with_capacity(accepted.len());
        for item in accepted {
            let mut snapshot = NewSnapshot::new(product_id, item.title.clone())
                .with_urls(item.urls.clone());
            if let Some(price) = item.price {
                snapshot = snapshot.with_price(price);
            }

            appended.push(self.snapshots.insert(&snapshot).await?);
        }

        tracing::info!(product_id, count = appended.len(), "Ingested snapshot batch");
        Ok(appended)
    }

    /// Finds or creates the product for `prompt`, then ingests the batch.
    ///
    /// # Errors
    /// Returns an error if the product lookup/creation or a snapshot insert
    /// fails.
    pub async fn ingest_prompt(
        &self,
        name: &str,
        prompt: &str,
        items: &[CandidateItem],
    ) -> Result<(ProductRecord, Vec<SnapshotRecord>)> {
        let product = self.products.find_or_create(name, prompt).await?;
        let appended = self.ingest(product.id, items).await?;
        Ok((product, appended))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(title: &str) -> CandidateItem {
        CandidateItem {
            title: title.to_string(),
            price: Some(dec!(9.99)),
            urls: vec!["u".to_string()],
        }
    }

    #[test]
    fn test_accept_all_valid_candidates() {
        let items = vec![item("a"), item("b")];
        let (accepted, rejected) = accept_candidates(&items);
        assert_eq!(accepted.len(), 2);
        assert_eq!(rejected, 0);
    }

    #[test]
    fn test_blank_title_is_rejected_batch_continues() {
        let items = vec![item("a"), item("   "), item("b")];
        let (accepted, rejected) = accept_candidates(&items);
        assert_eq!(rejected, 1);
        let titles: Vec<&str> = accepted.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_batch_accepts_nothing() {
        let (accepted, rejected) = accept_candidates(&[]);
        assert!(accepted.is_empty());
        assert_eq!(rejected, 0);
    }

    #[test]
    fn test_priceless_candidate_is_still_accepted() {
        let items = vec![CandidateItem {
            title: "no price".to_string(),
            price: None,
            urls: vec![],
        }];
        let (accepted, rejected) = accept_candidates(&items);
        assert_eq!(accepted.len(), 1);
        assert_eq!(rejected, 0);
        assert!(accepted[0].price.is_none());
    }
}
