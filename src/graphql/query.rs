//! Read-side resolvers.

use async_graphql::{Context, Object, Result, ID};

use super::types::{PostType, WebCardType};
use crate::db::Repository;

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Look up a web card by its public username.
    async fn web_card(&self, ctx: &Context<'_>, user_name: String) -> Result<Option<WebCardType>> {
        let repo = ctx.data_unchecked::<Repository>();
        Ok(repo
            .get_web_card_by_username(&user_name)
            .await?
            .map(Into::into))
    }

    /// Look up a post by id.
    async fn post(&self, ctx: &Context<'_>, id: ID) -> Result<Option<PostType>> {
        let repo = ctx.data_unchecked::<Repository>();
        Ok(repo.get_post(id.as_str()).await?.map(Into::into))
    }

    /// A web card's posts, newest first.
    async fn posts(&self, ctx: &Context<'_>, web_card_id: ID) -> Result<Vec<PostType>> {
        let repo = ctx.data_unchecked::<Repository>();
        Ok(repo
            .list_posts_for_web_card(web_card_id.as_str())
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}
