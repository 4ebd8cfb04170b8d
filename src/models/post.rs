//! Post model: a feed entry published under a web card.

use serde::{Deserialize, Serialize};

/// A feed post. Its public page lives under `/{userName}/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub web_card_id: String,
    pub content: String,
    pub created_at: String,
}
