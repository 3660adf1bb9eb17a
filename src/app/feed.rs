use std::collections::HashMap;

use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::app::comments::CommentService;
use crate::app::error::ServiceResult;
use crate::app::users::author_from_row;
use crate::domain::post::PostView;
use crate::infra::db::Db;

/// Read side of the post aggregate: every listing returns fully expanded
/// posts (author, liker ids, comments with their authors).
///
/// Listings are not paginated.
#[derive(Clone)]
pub struct FeedService {
    db: Db,
}

impl FeedService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn list_all(&self) -> ServiceResult<Vec<PostView>> {
        let rows = sqlx::query(
            "SELECT p.id, p.image, p.caption, p.created_at, p.updated_at, \
                    u.id AS author_id, u.username AS author_username, u.bio AS author_bio, \
                    u.profile_picture AS author_profile_picture, u.gender AS author_gender \
             FROM posts p \
             JOIN users u ON u.id = p.author_id \
             ORDER BY p.created_at DESC, p.id DESC",
        )
        .fetch_all(self.db.pool())
        .await?;

        self.expand(rows).await
    }

    pub async fn list_by_author(&self, author_id: Uuid) -> ServiceResult<Vec<PostView>> {
        let rows = sqlx::query(
            "SELECT p.id, p.image, p.caption, p.created_at, p.updated_at, \
                    u.id AS author_id, u.username AS author_username, u.bio AS author_bio, \
                    u.profile_picture AS author_profile_picture, u.gender AS author_gender \
             FROM posts p \
             JOIN users u ON u.id = p.author_id \
             WHERE p.author_id = $1 \
             ORDER BY p.created_at DESC, p.id DESC",
        )
        .bind(author_id)
        .fetch_all(self.db.pool())
        .await?;

        self.expand(rows).await
    }

    /// Expanded posts in the order of `ids`. Ids that no longer resolve are skipped.
    pub async fn list_by_ids(&self, ids: &[Uuid]) -> ServiceResult<Vec<PostView>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT p.id, p.image, p.caption, p.created_at, p.updated_at, \
                    u.id AS author_id, u.username AS author_username, u.bio AS author_bio, \
                    u.profile_picture AS author_profile_picture, u.gender AS author_gender \
             FROM posts p \
             JOIN users u ON u.id = p.author_id \
             WHERE p.id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(self.db.pool())
        .await?;

        let mut by_id: HashMap<Uuid, PostView> = self
            .expand(rows)
            .await?
            .into_iter()
            .map(|post| (post.id, post))
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    pub async fn get_post(&self, post_id: Uuid) -> ServiceResult<Option<PostView>> {
        Ok(self.list_by_ids(&[post_id]).await?.pop())
    }

    async fn expand(&self, rows: Vec<PgRow>) -> ServiceResult<Vec<PostView>> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.get("id")).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let like_rows = sqlx::query(
            "SELECT post_id, user_id FROM post_likes \
             WHERE post_id = ANY($1) \
             ORDER BY created_at ASC, user_id ASC",
        )
        .bind(&ids)
        .fetch_all(self.db.pool())
        .await?;

        let mut likes: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for row in like_rows {
            likes
                .entry(row.get("post_id"))
                .or_default()
                .push(row.get("user_id"));
        }

        let mut comments = CommentService::new(self.db.clone())
            .for_posts(&ids)
            .await?;

        let posts = rows
            .iter()
            .map(|row| {
                let id: Uuid = row.get("id");
                PostView {
                    id,
                    author: author_from_row(row),
                    image: row.get("image"),
                    caption: row.get("caption"),
                    likes: likes.remove(&id).unwrap_or_default(),
                    comments: comments.remove(&id).unwrap_or_default(),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                }
            })
            .collect();

        Ok(posts)
    }
}
