//! OpenAI-backed shopping assistant client.
//!
//! Produces candidate `{title, price, urls}` items for a free-text shopping
//! prompt; the data layer's ingestion bridge turns them into snapshots.

pub mod client;

pub use client::{parse_items, ShoppingClient};
