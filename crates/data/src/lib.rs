//! Data storage and temporal snapshot queries for the price tracker.
//!
//! This crate provides:
//! - Database client for `PostgreSQL` with idempotent schema setup
//! - Data models for products and their snapshot logs
//! - Repositories for typed database access, including the point-in-time,
//!   windowed, and lowest-price queries over each product's append-only log
//! - The ingestion bridge that turns candidate item batches into snapshots

pub mod database;
pub mod ingest;
pub mod models;
pub mod repositories;

// Re-export commonly used types
pub use database::DatabaseClient;
pub use ingest::IngestionBridge;

// Re-export models
pub use models::{NewProduct, NewSnapshot, ProductDetail, ProductRecord, SnapshotRecord};

// Re-export repositories
pub use repositories::{ProductRepository, Repositories, SnapshotRepository};
