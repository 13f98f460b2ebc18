//! Product data model.
//!
//! A product is one tracked shopping query. The `prompt` column is the
//! free-text lookup key used for idempotent find-or-create; it carries no
//! unique constraint, so duplicate prompts are possible under concurrent
//! creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::SnapshotRecord;

/// A persisted product row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductRecord {
    /// Surrogate identity assigned on insert.
    pub id: i64,
    /// Display label.
    pub name: String,
    /// Optional lookup key for find-or-create.
    pub prompt: Option<String>,
    /// Server-assigned creation time, never mutated.
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub prompt: Option<String>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: None,
        }
    }

    /// Builder method to set the lookup prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

/// A product together with its full snapshot collection, as returned by
/// the read API.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub id: i64,
    pub name: String,
    pub prompt: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Snapshots ordered ascending by `captured_at`. Empty for a freshly
    /// created product with no successful ingestion yet.
    pub snapshots: Vec<SnapshotRecord>,
}

impl ProductDetail {
    #[must_use]
    pub fn new(product: ProductRecord, snapshots: Vec<SnapshotRecord>) -> Self {
        Self {
            id: product.id,
            name: product.name,
            prompt: product.prompt,
            created_at: product.created_at,
            snapshots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_product() -> ProductRecord {
        ProductRecord {
            id: 1,
            name: "Test".to_string(),
            prompt: Some("test-prompt".to_string()),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_new_product_builder() {
        let new = NewProduct::new("Headset").with_prompt("headsets under $200");
        assert_eq!(new.name, "Headset");
        assert_eq!(new.prompt.as_deref(), Some("headsets under $200"));
    }

    #[test]
    fn test_new_product_prompt_defaults_absent() {
        let new: NewProduct = serde_json::from_str(r#"{"name":"X"}"#).unwrap();
        assert!(new.prompt.is_none());
    }

    #[test]
    fn test_detail_keeps_product_fields_and_empty_snapshots() {
        let detail = ProductDetail::new(sample_product(), vec![]);
        assert_eq!(detail.id, 1);
        assert_eq!(detail.prompt.as_deref(), Some("test-prompt"));
        assert!(detail.snapshots.is_empty());
    }
}
