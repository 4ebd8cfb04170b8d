//! Database repository for CRUD operations.
//!
//! Uses prepared statements for data integrity.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{Post, WebCard};

/// Database repository for all data operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== WEB CARD OPERATIONS ====================

    /// Get a web card by ID.
    pub async fn get_web_card(&self, id: &str) -> Result<Option<WebCard>, AppError> {
        let row = sqlx::query(
            "SELECT id, user_name, display_name, card_colors, is_published, updated_at FROM web_cards WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(web_card_from_row))
    }

    /// Get a web card by username.
    pub async fn get_web_card_by_username(
        &self,
        user_name: &str,
    ) -> Result<Option<WebCard>, AppError> {
        let row = sqlx::query(
            "SELECT id, user_name, display_name, card_colors, is_published, updated_at FROM web_cards WHERE user_name = ?",
        )
        .bind(user_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(web_card_from_row))
    }

    /// Create a new web card.
    pub async fn create_web_card(
        &self,
        user_name: &str,
        display_name: &str,
    ) -> Result<WebCard, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO web_cards (id, user_name, display_name, card_colors, is_published, updated_at) VALUES (?, ?, ?, '[]', 0, ?)",
        )
        .bind(&id)
        .bind(user_name)
        .bind(display_name)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(WebCard {
            id,
            user_name: user_name.to_string(),
            display_name: display_name.to_string(),
            card_colors: Vec::new(),
            is_published: false,
            updated_at: now,
        })
    }

    /// Update a web card's color palette.
    pub async fn update_card_colors(
        &self,
        id: &str,
        card_colors: &[String],
    ) -> Result<WebCard, AppError> {
        let existing = self
            .get_web_card(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("WebCard {} not found", id)))?;

        let now = Utc::now().to_rfc3339();
        let colors_json = serde_json::to_string(card_colors)?;

        sqlx::query("UPDATE web_cards SET card_colors = ?, updated_at = ? WHERE id = ?")
            .bind(&colors_json)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(WebCard {
            card_colors: card_colors.to_vec(),
            updated_at: now,
            ..existing
        })
    }

    /// Publish or unpublish a web card.
    pub async fn set_published(&self, id: &str, published: bool) -> Result<WebCard, AppError> {
        let existing = self
            .get_web_card(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("WebCard {} not found", id)))?;

        let now = Utc::now().to_rfc3339();

        sqlx::query("UPDATE web_cards SET is_published = ?, updated_at = ? WHERE id = ?")
            .bind(published as i32)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(WebCard {
            is_published: published,
            updated_at: now,
            ..existing
        })
    }

    // ==================== POST OPERATIONS ====================

    /// Get a post by ID.
    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let row =
            sqlx::query("SELECT id, web_card_id, content, created_at FROM posts WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    /// List a web card's posts, newest first.
    pub async fn list_posts_for_web_card(&self, web_card_id: &str) -> Result<Vec<Post>, AppError> {
        let rows = sqlx::query(
            "SELECT id, web_card_id, content, created_at FROM posts WHERE web_card_id = ? ORDER BY created_at DESC",
        )
        .bind(web_card_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    /// Create a new post under a web card.
    pub async fn create_post(&self, web_card_id: &str, content: &str) -> Result<Post, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query("INSERT INTO posts (id, web_card_id, content, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(web_card_id)
            .bind(content)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        Ok(Post {
            id,
            web_card_id: web_card_id.to_string(),
            content: content.to_string(),
            created_at: now,
        })
    }

    /// Update a post's content.
    pub async fn update_post(&self, id: &str, content: &str) -> Result<Post, AppError> {
        let existing = self
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

        sqlx::query("UPDATE posts SET content = ? WHERE id = ?")
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(Post {
            content: content.to_string(),
            ..existing
        })
    }

    /// Delete a post.
    pub async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Post {} not found", id)));
        }

        Ok(())
    }
}

// Helper functions for row conversion

fn web_card_from_row(row: &sqlx::sqlite::SqliteRow) -> WebCard {
    let is_published: i32 = row.get("is_published");
    let colors_str: String = row.get("card_colors");
    WebCard {
        id: row.get("id"),
        user_name: row.get("user_name"),
        display_name: row.get("display_name"),
        card_colors: parse_json_array(&colors_str),
        is_published: is_published != 0,
        updated_at: row.get("updated_at"),
    }
}

fn post_from_row(row: &sqlx::sqlite::SqliteRow) -> Post {
    Post {
        id: row.get("id"),
        web_card_id: row.get("web_card_id"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}
