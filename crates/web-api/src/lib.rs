//! REST API for the price tracker.
//!
//! Thin boundary over the data layer: validated inputs in, plain records
//! (products with embedded snapshots, or snapshots) out, with not-found
//! conditions rendered as 404 responses.

pub mod handlers;
pub mod server;

pub use server::{ApiContext, ApiServer};
