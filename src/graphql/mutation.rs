//! Write-side resolvers.
//!
//! Every mutation that changes a publicly rendered page registers the
//! affected web card username (and post id, where applicable) with the
//! request's revalidation collector. Registration is idempotent, so a batch
//! mutation touching the same card several times still produces a single
//! invalidation.

use std::sync::Arc;

use async_graphql::{Context, Object, Result, ID};

use super::types::{PostType, SaveCardColorsInput, WebCardType};
use crate::db::Repository;
use crate::errors::AppError;
use crate::models::WebCard;
use crate::revalidate::RevalidationCollector;

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Create a new web card.
    async fn create_web_card(
        &self,
        ctx: &Context<'_>,
        user_name: String,
        display_name: String,
    ) -> Result<WebCardType> {
        if user_name.trim().is_empty() {
            return Err(AppError::Validation("userName is required".to_string()).into());
        }
        if display_name.trim().is_empty() {
            return Err(AppError::Validation("displayName is required".to_string()).into());
        }

        let repo = ctx.data_unchecked::<Repository>();
        let card = repo.create_web_card(&user_name, &display_name).await?;

        collector(ctx).add_card(&card.user_name);
        Ok(card.into())
    }

    /// Save a web card's color palette.
    async fn save_card_colors(
        &self,
        ctx: &Context<'_>,
        web_card_id: ID,
        input: SaveCardColorsInput,
    ) -> Result<WebCardType> {
        if input.card_colors.is_empty() {
            return Err(AppError::Validation("at least one color is required".to_string()).into());
        }

        let repo = ctx.data_unchecked::<Repository>();
        let card = repo
            .update_card_colors(web_card_id.as_str(), &input.card_colors)
            .await?;

        collector(ctx).add_card(&card.user_name);
        Ok(card.into())
    }

    /// Publish or unpublish a web card.
    async fn toggle_web_card_published(
        &self,
        ctx: &Context<'_>,
        web_card_id: ID,
        published: bool,
    ) -> Result<WebCardType> {
        let repo = ctx.data_unchecked::<Repository>();
        let card = repo.set_published(web_card_id.as_str(), published).await?;

        collector(ctx).add_card(&card.user_name);
        Ok(card.into())
    }

    /// Publish a post under a web card.
    async fn create_post(
        &self,
        ctx: &Context<'_>,
        web_card_id: ID,
        content: String,
    ) -> Result<PostType> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("content is required".to_string()).into());
        }

        let repo = ctx.data_unchecked::<Repository>();
        let card = load_web_card(repo, web_card_id.as_str()).await?;
        let post = repo.create_post(&card.id, &content).await?;

        let collector = collector(ctx);
        collector.add_card(&card.user_name);
        collector.add_post(&post.id, &card.user_name);
        Ok(post.into())
    }

    /// Edit a post's content.
    async fn update_post(&self, ctx: &Context<'_>, post_id: ID, content: String) -> Result<PostType> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("content is required".to_string()).into());
        }

        let repo = ctx.data_unchecked::<Repository>();
        let post = repo.update_post(post_id.as_str(), &content).await?;
        let card = load_web_card(repo, &post.web_card_id).await?;

        let collector = collector(ctx);
        collector.add_card(&card.user_name);
        collector.add_post(&post.id, &card.user_name);
        Ok(post.into())
    }

    /// Delete a post. The post page and the card's feed both get revalidated.
    async fn delete_post(&self, ctx: &Context<'_>, post_id: ID) -> Result<bool> {
        let repo = ctx.data_unchecked::<Repository>();
        let post = repo
            .get_post(post_id.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id.as_str())))?;
        let card = load_web_card(repo, &post.web_card_id).await?;
        repo.delete_post(&post.id).await?;

        let collector = collector(ctx);
        collector.add_card(&card.user_name);
        collector.add_post(&post.id, &card.user_name);
        Ok(true)
    }
}

fn collector<'a>(ctx: &Context<'a>) -> &'a Arc<RevalidationCollector> {
    ctx.data_unchecked::<Arc<RevalidationCollector>>()
}

async fn load_web_card(repo: &Repository, id: &str) -> Result<WebCard, AppError> {
    repo.get_web_card(id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("WebCard {} missing for mutation", id)))
}
