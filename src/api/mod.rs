//! HTTP surface: the GraphQL endpoint and the app-version gate.
//!
//! The GraphQL handler owns the request-scoped plumbing around schema
//! execution: persisted query id resolution, creation of the per-request
//! revalidation collector, and the background flush once the response has
//! been produced.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::auth;
use crate::errors::AppError;
use crate::revalidate::RevalidationCollector;
use crate::version::AppVersion;
use crate::AppState;

/// Header carrying the client app's version.
pub const APP_VERSION_HEADER: &str = "x-app-version";

/// Wire shape of a GraphQL-over-HTTP request. Clients normally send a
/// persisted operation id; raw query text is reserved for development and
/// server-authenticated callers.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLHttpRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub variables: Option<serde_json::Value>,
    #[serde(default)]
    pub operation_name: Option<String>,
}

/// POST /graphql - Execute a persisted or raw GraphQL operation.
pub async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<GraphQLHttpRequest>,
) -> Response {
    // Resolve the operation text through the persisted query map
    let query = if let Some(id) = &request.id {
        match state.query_map.get(id) {
            Some(query) => query.clone(),
            None => return AppError::PersistedQueryNotFound(id.clone()).into_response(),
        }
    } else if let Some(query) = request.query {
        let allowed = state.config.allow_arbitrary_operations
            || auth::check_server_auth(&headers, state.config.api_psk.as_deref());
        if !allowed {
            return AppError::Unauthorized(
                "Arbitrary operations require server authentication".to_string(),
            )
            .into_response();
        }
        query
    } else {
        return AppError::BadRequest("Missing operation id or query".to_string()).into_response();
    };

    let collector = Arc::new(RevalidationCollector::new());

    let mut gql_request = async_graphql::Request::new(query).data(Arc::clone(&collector));
    if let Some(variables) = request.variables {
        gql_request = gql_request.variables(async_graphql::Variables::from_json(variables));
    }
    if let Some(operation_name) = request.operation_name {
        gql_request = gql_request.operation_name(operation_name);
    }

    let response = state.schema.execute(gql_request).await;

    // The response is final; cache invalidation happens behind it
    state.revalidation.flush_in_background(&collector);

    Json(response).into_response()
}

/// Middleware rejecting clients older than the last supported app version.
/// Only the base version is compared, prerelease stripped, so in-flight
/// release trains are gated the same as their production release. Headers
/// that do not parse as a version are ignored.
pub async fn app_version_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let client_version = request
        .headers()
        .get(APP_VERSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<AppVersion>().ok());

    if let Some(version) = client_version {
        if version.base() < state.config.version_floor().base() {
            return AppError::UnsupportedAppVersion.into_response();
        }
    }

    next.run(request).await
}
