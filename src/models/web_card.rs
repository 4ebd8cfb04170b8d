//! WebCard model: a user's digital business card.

use serde::{Deserialize, Serialize};

/// A digital business card. The username doubles as the public page path and
/// as the cache-invalidation key for revalidation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebCard {
    pub id: String,
    pub user_name: String,
    pub display_name: String,
    /// Color palette applied to the card's modules
    #[serde(default)]
    pub card_colors: Vec<String>,
    pub is_published: bool,
    pub updated_at: String,
}
