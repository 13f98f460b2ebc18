use crate::handlers;
use axum::{
    routing::{delete, get, post},
    Router,
};
use shop_viz_data::{IngestionBridge, ProductRepository, SnapshotRepository};
use shop_viz_openai::ShoppingClient;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state behind every handler: repositories, the ingestion bridge,
/// and the optional shopping assistant used to bootstrap new products.
pub struct ApiContext {
    pub products: ProductRepository,
    pub snapshots: SnapshotRepository,
    pub bridge: IngestionBridge,
    pub assistant: Option<ShoppingClient>,
}

impl ApiContext {
    #[must_use]
    pub fn new(pool: PgPool, assistant: Option<ShoppingClient>) -> Self {
        Self {
            products: ProductRepository::new(pool.clone()),
            snapshots: SnapshotRepository::new(pool.clone()),
            bridge: IngestionBridge::new(pool),
            assistant,
        }
    }
}

pub struct ApiServer {
    context: Arc<ApiContext>,
}

impl ApiServer {
    #[must_use]
    pub fn new(context: Arc<ApiContext>) -> Self {
        Self { context }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/health", get(handlers::health_check))
            .route("/products", get(handlers::list_products))
            .route("/products", post(handlers::create_product))
            .route("/products/:product_id", get(handlers::read_product))
            .route("/products/:product_id", delete(handlers::delete_product))
            .route("/snapshot", post(handlers::create_snapshot))
            .route("/products/:product_id/latest", get(handlers::latest_snapshots))
            .route("/products/:product_id/history", get(handlers::snapshot_history))
            .route("/products/:product_id/best_price", get(handlers::best_price))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.context.clone())
    }

    /// Starts the web server listening on the specified address.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve requests.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Web API listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}
