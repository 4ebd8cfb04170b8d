//! GraphQL object and input types.

use async_graphql::{InputObject, SimpleObject, ID};

use crate::models::{Post, WebCard};

/// GraphQL view of a web card.
#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "WebCard")]
pub struct WebCardType {
    pub id: ID,
    pub user_name: String,
    pub display_name: String,
    pub card_colors: Vec<String>,
    pub is_published: bool,
}

impl From<WebCard> for WebCardType {
    fn from(card: WebCard) -> Self {
        Self {
            id: ID(card.id),
            user_name: card.user_name,
            display_name: card.display_name,
            card_colors: card.card_colors,
            is_published: card.is_published,
        }
    }
}

/// GraphQL view of a feed post.
#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "Post")]
pub struct PostType {
    pub id: ID,
    pub web_card_id: ID,
    pub content: String,
    pub created_at: String,
}

impl From<Post> for PostType {
    fn from(post: Post) -> Self {
        Self {
            id: ID(post.id),
            web_card_id: ID(post.web_card_id),
            content: post.content,
            created_at: post.created_at,
        }
    }
}

/// Input for `saveCardColors`.
#[derive(Debug, InputObject)]
pub struct SaveCardColorsInput {
    pub card_colors: Vec<String>,
}
