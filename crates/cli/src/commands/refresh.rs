//! Fetch a fresh snapshot batch for every product that has a prompt.
//!
//! Replays the ingestion path the API uses at product creation: ask the
//! shopping assistant for current candidate items, then append them as a
//! new same-run batch of snapshots. One product failing does not stop the
//! rest of the run.

use anyhow::{anyhow, Result};
use clap::Args;

use shop_viz_core::OpenAiConfig;
use shop_viz_data::{DatabaseClient, IngestionBridge, Repositories};
use shop_viz_openai::ShoppingClient;

/// Arguments for the refresh command.
#[derive(Args, Debug, Clone)]
pub struct RefreshArgs {
    /// Database connection URL (uses DATABASE_URL env var if not provided)
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,

    /// OpenAI API key (uses OPENAI_API_KEY env var if not provided)
    #[arg(long, env = "OPENAI_API_KEY")]
    pub api_key: Option<String>,

    /// OpenAI API base URL
    #[arg(long, default_value = "https://api.openai.com")]
    pub api_url: String,

    /// Model used to generate candidate items
    #[arg(long, default_value = "gpt-4.1-nano")]
    pub model: String,
}

/// Runs the refresh command.
///
/// # Errors
/// Returns an error if required arguments are missing or the database is
/// unreachable; per-product assistant or ingestion failures are logged and
/// skipped.
pub async fn run_refresh(args: RefreshArgs) -> Result<()> {
    let db_url = args
        .db_url
        .ok_or_else(|| anyhow!("DATABASE_URL must be set via --db-url or DATABASE_URL env var"))?;
    let api_key = args
        .api_key
        .ok_or_else(|| anyhow!("OPENAI_API_KEY must be set via --api-key or OPENAI_API_KEY env var"))?;

    let client = DatabaseClient::new(&db_url, 5).await?;
    let repos = Repositories::new(client.pool());
    let bridge = IngestionBridge::new(client.pool());
    let assistant = ShoppingClient::new(&OpenAiConfig {
        api_url: args.api_url,
        api_key,
        model: args.model,
    });

    let products = repos.products.list_detail().await?;
    let mut refreshed = 0usize;

    for product in products {
        let Some(prompt) = product.prompt.as_deref() else {
            continue;
        };

        match assistant.fetch_items(prompt).await {
            Ok(items) => match bridge.ingest(product.id, &items).await {
                Ok(appended) => {
                    tracing::info!(
                        product_id = product.id,
                        count = appended.len(),
                        "Refreshed product"
                    );
                    refreshed += 1;
                }
                Err(e) => {
                    tracing::error!(product_id = product.id, "Ingestion failed: {}", e);
                }
            },
            Err(e) => {
                tracing::error!(product_id = product.id, "Assistant fetch failed: {}", e);
            }
        }
    }

    tracing::info!(refreshed, "Refresh run complete");
    Ok(())
}
