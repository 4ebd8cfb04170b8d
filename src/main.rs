//! WebCard Backend server binary.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use webcard_backend::config::Config;
use webcard_backend::db::{self, Repository};
use webcard_backend::queries::{self, QueryMap};
use webcard_backend::revalidate::RevalidationClient;
use webcard_backend::{create_router, graphql, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting WebCard Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Persisted query map: {:?}", config.query_map_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Last supported app version: {}", config.version_floor());

    if config.revalidation_endpoint.is_none() {
        tracing::warn!(
            "No revalidation endpoint configured (WEBCARD_REVALIDATION_ENDPOINT). Cache invalidation is disabled!"
        );
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Repository::new(pool);

    // Load the merged persisted query map published at release time. A
    // missing map is only tolerable in dev, where arbitrary operations are
    // allowed anyway.
    let query_map = match queries::load_query_map(&config.query_map_path) {
        Ok(map) => {
            tracing::info!("Loaded {} persisted queries", map.len());
            map
        }
        Err(err) if config.allow_arbitrary_operations => {
            tracing::warn!("No persisted query map loaded: {}", err);
            QueryMap::new()
        }
        Err(err) => return Err(err.into()),
    };

    // Build GraphQL schema
    let schema = graphql::build_schema(repo.clone());

    let revalidation = RevalidationClient::new(
        config.revalidation_endpoint.clone(),
        config.revalidation_token.clone(),
    );

    // Create application state
    let state = AppState {
        repo,
        schema,
        query_map: Arc::new(query_map),
        revalidation,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
