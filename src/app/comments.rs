use std::collections::HashMap;

use sqlx::Row;
use uuid::Uuid;

use crate::app::error::{ServiceError, ServiceResult};
use crate::app::posts::post_exists;
use crate::app::users::{author_from_row, UserService};
use crate::domain::comment::CommentView;
use crate::infra::db::Db;

pub const MAX_COMMENT_LEN: usize = 1000;

#[derive(Clone)]
pub struct CommentService {
    db: Db,
}

impl CommentService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn add_comment(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        text: &str,
    ) -> ServiceResult<CommentView> {
        if !post_exists(&self.db, post_id).await? {
            return Err(ServiceError::not_found("post not found"));
        }

        if text.trim().is_empty() {
            return Err(ServiceError::validation("comment text is required"));
        }
        if text.chars().count() > MAX_COMMENT_LEN {
            return Err(ServiceError::validation(
                "comment text exceeds 1000 characters",
            ));
        }

        let author = UserService::new(self.db.clone())
            .get_public(author_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("user not found"))?;

        let row = sqlx::query(
            "INSERT INTO comments (text, author_id, post_id) VALUES ($1, $2, $3) \
             RETURNING id, created_at",
        )
        .bind(text)
        .bind(author_id)
        .bind(post_id)
        .fetch_one(self.db.pool())
        .await?;

        let comment = CommentView {
            id: row.get("id"),
            text: text.to_string(),
            author,
            post_id,
            created_at: row.get("created_at"),
        };

        // Second step: the post's comment list. Not atomic with the insert above.
        sqlx::query(
            "INSERT INTO post_comments (post_id, comment_id, created_at) VALUES ($1, $2, $3) \
             ON CONFLICT DO NOTHING",
        )
        .bind(post_id)
        .bind(comment.id)
        .bind(comment.created_at)
        .execute(self.db.pool())
        .await?;

        tracing::info!(comment_id = %comment.id, post_id = %post_id, author_id = %author_id, "comment added");
        Ok(comment)
    }

    /// Every comment scoped to the post, newest first.
    pub async fn list_for_post(&self, post_id: Uuid) -> ServiceResult<Vec<CommentView>> {
        if !post_exists(&self.db, post_id).await? {
            return Err(ServiceError::not_found("post not found"));
        }

        let rows = sqlx::query(
            "SELECT c.id, c.text, c.post_id, c.created_at, \
                    u.id AS author_id, u.username AS author_username, u.bio AS author_bio, \
                    u.profile_picture AS author_profile_picture, u.gender AS author_gender \
             FROM comments c \
             JOIN users u ON u.id = c.author_id \
             WHERE c.post_id = $1 \
             ORDER BY c.created_at DESC, c.id DESC",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        let comments = rows
            .iter()
            .map(|row| CommentView {
                id: row.get("id"),
                text: row.get("text"),
                author: author_from_row(row),
                post_id: row.get("post_id"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(comments)
    }

    /// Resolves the `comments` list of each post, newest first per post.
    pub async fn for_posts(
        &self,
        post_ids: &[Uuid],
    ) -> ServiceResult<HashMap<Uuid, Vec<CommentView>>> {
        let rows = sqlx::query(
            "SELECT c.id, c.text, pc.post_id, c.created_at, \
                    u.id AS author_id, u.username AS author_username, u.bio AS author_bio, \
                    u.profile_picture AS author_profile_picture, u.gender AS author_gender \
             FROM post_comments pc \
             JOIN comments c ON c.id = pc.comment_id \
             JOIN users u ON u.id = c.author_id \
             WHERE pc.post_id = ANY($1) \
             ORDER BY c.created_at DESC, c.id DESC",
        )
        .bind(post_ids)
        .fetch_all(self.db.pool())
        .await?;

        let mut by_post: HashMap<Uuid, Vec<CommentView>> = HashMap::new();
        for row in &rows {
            let post_id: Uuid = row.get("post_id");
            by_post.entry(post_id).or_default().push(CommentView {
                id: row.get("id"),
                text: row.get("text"),
                author: author_from_row(row),
                post_id,
                created_at: row.get("created_at"),
            });
        }

        Ok(by_post)
    }

    /// Cascade step of post deletion: removes the comment records and the
    /// post's comment list.
    pub async fn delete_for_post(&self, post_id: Uuid) -> ServiceResult<u64> {
        let deleted = sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(post_id)
            .execute(self.db.pool())
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM post_comments WHERE post_id = $1")
            .bind(post_id)
            .execute(self.db.pool())
            .await?;

        Ok(deleted)
    }
}
