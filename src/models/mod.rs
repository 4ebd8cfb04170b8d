//! Data models for the WebCard platform.
//!
//! These models are shared by the SQLite repository and the GraphQL layer.

mod post;
mod web_card;

pub use post::*;
pub use web_card::*;
