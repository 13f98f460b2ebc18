//! Snapshot data model.
//!
//! A snapshot is one timestamped observation of a product's title, price,
//! and page URLs. The snapshot log is append-only: rows are never updated
//! or individually deleted, only removed wholesale when their product is.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// A persisted snapshot row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SnapshotRecord {
    /// Surrogate identity assigned on insert.
    pub id: i64,
    /// Owning product.
    pub product_id: i64,
    /// Observed title at capture time.
    pub title: String,
    /// Observed price in USD with 2-decimal precision. `None` means the
    /// price was unknown, not zero; such rows never win "cheapest".
    pub price: Option<Decimal>,
    /// Product page links found at capture time, in source order.
    pub urls: Json<Vec<String>>,
    /// When the observation was made, not when it was queried.
    pub captured_at: DateTime<Utc>,
}

impl SnapshotRecord {
    /// Returns true if this snapshot carries a known price.
    #[must_use]
    pub fn has_price(&self) -> bool {
        self.price.is_some()
    }
}

/// Fields required to append a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSnapshot {
    pub product_id: i64,
    pub title: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub urls: Vec<String>,
    /// Capture time override. When absent the store assigns `now()` at the
    /// moment of persistence.
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
}

impl NewSnapshot {
    pub fn new(product_id: i64, title: impl Into<String>) -> Self {
        Self {
            product_id,
            title: title.into(),
            price: None,
            urls: Vec::new(),
            captured_at: None,
        }
    }

    /// Builder method to set the observed price.
    #[must_use]
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    /// Builder method to set the page URLs.
    #[must_use]
    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.urls = urls;
        self
    }

    /// Builder method to set an explicit capture time.
    #[must_use]
    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = Some(captured_at);
        self
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
    fn test_new_snapshot_builder() {
        let snap = NewSnapshot::new(1, "snap1")
            .with_price(dec!(1.00))
            .with_urls(vec!["u1".to_string()])
            .with_captured_at(sample_timestamp());

        assert_eq!(snap.product_id, 1);
        assert_eq!(snap.price, Some(dec!(1.00)));
        assert_eq!(snap.urls, vec!["u1".to_string()]);
        assert_eq!(snap.captured_at, Some(sample_timestamp()));
    }

    #[test]
    fn test_captured_at_defaults_to_store_assigned() {
        let snap: NewSnapshot =
            serde_json::from_str(r#"{"product_id":1,"title":"t","urls":[]}"#).unwrap();
        assert!(snap.captured_at.is_none());
        assert!(snap.price.is_none());
    }

    #[test]
    fn test_record_serializes_urls_as_plain_array() {
        let record = SnapshotRecord {
            id: 7,
            product_id: 1,
            title: "t".to_string(),
            price: Some(dec!(19.99)),
            urls: Json(vec!["https://example.com".to_string()]),
            captured_at: sample_timestamp(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["urls"], serde_json::json!(["https://example.com"]));
    }

    #[test]
    fn test_null_price_is_not_a_candidate() {
        let record = SnapshotRecord {
            id: 8,
            product_id: 1,
            title: "t".to_string(),
            price: None,
            urls: Json(vec![]),
            captured_at: sample_timestamp(),
        };
        assert!(!record.has_price());
    }
}
