//! WebCard Backend
//!
//! GraphQL backend for the WebCard digital business card platform, with
//! persisted query version reconciliation and cross-surface cache
//! revalidation.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod graphql;
pub mod models;
pub mod queries;
pub mod revalidate;
pub mod version;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use db::Repository;
use graphql::WebCardSchema;
use queries::QueryMap;
use revalidate::RevalidationClient;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub schema: WebCardSchema,
    pub query_map: Arc<QueryMap>,
    pub revalidation: RevalidationClient,
    pub config: Arc<Config>,
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // GraphQL endpoint, gated on the client app version
    let graphql_routes = Router::new()
        .route("/graphql", post(api::graphql_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::app_version_gate,
        ));

    // Health check (no gate)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(graphql_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
