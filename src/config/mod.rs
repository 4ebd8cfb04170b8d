//! Configuration module for the WebCard backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.
//! The same configuration is shared by the server binary and the release-time
//! persisted query reconciler.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::version::AppVersion;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key gating arbitrary (non-persisted) GraphQL operations
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Directory holding one persisted query map per released app version
    pub persisted_queries_dir: PathBuf,
    /// Persisted query map produced by the current build (reconciler input)
    pub current_query_map: PathBuf,
    /// Merged persisted query map consumed by the server at request time
    pub query_map_path: PathBuf,
    /// Release channel descriptor declaring the current release version
    pub release_file: PathBuf,
    /// Oldest app version still supported, if overridden
    pub last_supported_app_version: Option<AppVersion>,
    /// Revalidation endpoint receiving cache-invalidation batches
    pub revalidation_endpoint: Option<String>,
    /// Bearer token sent with revalidation calls
    pub revalidation_token: Option<String>,
    /// Accept raw query text without server authentication (dev mode)
    pub allow_arbitrary_operations: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_psk = env::var("WEBCARD_API_PSK").ok();

        let db_path = env::var("WEBCARD_DB_PATH")
            .unwrap_or_else(|_| "./data/app.sqlite".to_string())
            .into();

        let bind_addr = env::var("WEBCARD_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid WEBCARD_BIND_ADDR format");

        let log_level = env::var("WEBCARD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let persisted_queries_dir = env::var("WEBCARD_PERSISTED_QUERIES_DIR")
            .unwrap_or_else(|_| "./persisted-queries".to_string())
            .into();

        let current_query_map = env::var("WEBCARD_CURRENT_QUERY_MAP")
            .unwrap_or_else(|_| "./data/current-query-map.json".to_string())
            .into();

        let query_map_path = env::var("WEBCARD_QUERY_MAP_FILE")
            .unwrap_or_else(|_| "./data/persisted-query-map.json".to_string())
            .into();

        let release_file = env::var("WEBCARD_RELEASE_FILE")
            .unwrap_or_else(|_| "./release.json".to_string())
            .into();

        let last_supported_app_version = env::var("LAST_SUPPORTED_APP_VERSION")
            .ok()
            .map(|v| v.parse().expect("Invalid LAST_SUPPORTED_APP_VERSION format"));

        let revalidation_endpoint = env::var("WEBCARD_REVALIDATION_ENDPOINT").ok();
        let revalidation_token = env::var("WEBCARD_REVALIDATION_TOKEN").ok();

        let allow_arbitrary_operations = env::var("WEBCARD_ALLOW_ARBITRARY_OPERATIONS")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            persisted_queries_dir,
            current_query_map,
            query_map_path,
            release_file,
            last_supported_app_version,
            revalidation_endpoint,
            revalidation_token,
            allow_arbitrary_operations,
        }
    }

    /// Version floor applied by the server's app-version gate. Falls back to
    /// the crate version when no override is set, so a fresh deployment only
    /// supports clients from its own release onwards.
    pub fn version_floor(&self) -> AppVersion {
        self.last_supported_app_version
            .unwrap_or_else(crate_version)
    }
}

fn crate_version() -> AppVersion {
    env!("CARGO_PKG_VERSION")
        .parse()
        .expect("crate version is a valid app version")
}
