//! Data models for the price tracker.
//!
//! All prices use `rust_decimal::Decimal` for fixed 2-decimal currency
//! semantics. Persisted records derive `sqlx::FromRow`.

pub mod product;
pub mod snapshot;

pub use product::{NewProduct, ProductDetail, ProductRecord};
pub use snapshot::{NewSnapshot, SnapshotRecord};
