//! GraphQL schema for the WebCard API.
//!
//! Mutation resolvers register the web cards and posts they touch with the
//! per-request revalidation collector; the HTTP layer drains it after the
//! response is produced.

mod mutation;
mod query;
mod types;

pub use mutation::MutationRoot;
pub use query::QueryRoot;
pub use types::*;

use async_graphql::{EmptySubscription, Schema};

use crate::db::Repository;

pub type WebCardSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the schema with the repository attached as global data. The
/// revalidation collector is per-request and injected by the HTTP handler.
pub fn build_schema(repo: Repository) -> WebCardSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(repo)
        .finish()
}
