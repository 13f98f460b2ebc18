use clap::{Parser, Subcommand};
use std::sync::Arc;

mod commands;

use commands::{
    run_fake_history, run_load_products, run_refresh, FakeHistoryArgs, LoadProductsArgs,
    RefreshArgs,
};
use shop_viz_core::ConfigLoader;
use shop_viz_data::DatabaseClient;
use shop_viz_openai::ShoppingClient;
use shop_viz_web_api::{ApiContext, ApiServer};

#[derive(Parser)]
#[command(name = "shop-viz")]
#[command(about = "Price-snapshot tracker for AI-sourced shopping queries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Server {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Bulk load products and initial snapshots from a sales CSV
    LoadProducts(LoadProductsArgs),
    /// Seed randomized price history for existing products
    FakeHistory(FakeHistoryArgs),
    /// Fetch a fresh snapshot batch for every product with a prompt
    Refresh(RefreshArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Server { config } => run_server(&config).await?,
        Commands::LoadProducts(args) => run_load_products(args).await?,
        Commands::FakeHistory(args) => run_fake_history(args).await?,
        Commands::Refresh(args) => run_refresh(args).await?,
    }

    Ok(())
}

async fn run_server(config_path: &str) -> anyhow::Result<()> {
    let config = ConfigLoader::load_from(config_path)?;

    let client = DatabaseClient::connect_with_retry(
        &config.database.url,
        config.database.max_connections,
        5,
    )
    .await?;
    client.init_schema().await?;

    let assistant = if config.openai.api_key.is_empty() {
        tracing::warn!("No OpenAI API key configured; new products will start without snapshots");
        None
    } else {
        Some(ShoppingClient::new(&config.openai))
    };

    let context = Arc::new(ApiContext::new(client.pool(), assistant));
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting web API server on {}", addr);

    ApiServer::new(context).serve(&addr).await
}
