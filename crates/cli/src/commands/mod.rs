//! CLI commands for the price tracker.

pub mod fake_history;
pub mod load_products;
pub mod refresh;

pub use fake_history::{run_fake_history, FakeHistoryArgs};
pub use load_products::{run_load_products, LoadProductsArgs};
pub use refresh::{run_refresh, RefreshArgs};
