//! Candidate item records proposed for ingestion.
//!
//! A candidate item is one `{title, price, urls}` entry produced by the
//! shopping assistant in response to a free-text prompt. The ingestion
//! bridge turns accepted candidates into snapshot rows.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One externally produced product observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    /// Observed product title. Required by contract; candidates without a
    /// usable title are rejected per-item at the ingestion boundary.
    pub title: String,
    /// Price in USD, `None` when the source reported no price.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Product page links found at capture time. May be empty.
    #[serde(default)]
    pub urls: Vec<String>,
}

impl CandidateItem {
    /// Returns true if the candidate satisfies the ingestion contract
    /// (a non-blank title).
    #[must_use]
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}
