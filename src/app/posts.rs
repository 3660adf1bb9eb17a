use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use crate::app::comments::CommentService;
use crate::app::error::{ServiceError, ServiceResult};
use crate::app::feed::FeedService;
use crate::app::media::MediaIngest;
use crate::app::users::UserService;
use crate::domain::post::{BookmarkState, PostView};
use crate::infra::db::Db;

pub const MAX_CAPTION_LEN: usize = 2200;

/// Called after a like actually added the caller to a post's likes.
///
/// Notification delivery would hang off this; nothing is delivered today.
pub trait LikeHook: Send + Sync {
    fn post_liked(&self, post_id: Uuid, liker_id: Uuid, author_id: Uuid);
}

pub struct NoopLikeHook;

impl LikeHook for NoopLikeHook {
    fn post_liked(&self, _post_id: Uuid, _liker_id: Uuid, _author_id: Uuid) {}
}

/// Write side of the post aggregate.
///
/// Multi-step operations (create then index on the author, delete then
/// unindex then cascade) run as separate statements. A crash between steps
/// can leave the denormalized lists briefly out of step with `posts`.
#[derive(Clone)]
pub struct PostService {
    db: Db,
    media: Arc<dyn MediaIngest>,
    like_hook: Arc<dyn LikeHook>,
}

impl PostService {
    pub fn new(db: Db, media: Arc<dyn MediaIngest>, like_hook: Arc<dyn LikeHook>) -> Self {
        Self {
            db,
            media,
            like_hook,
        }
    }

    pub async fn create_post(
        &self,
        author_id: Uuid,
        caption: Option<String>,
        image: Option<Bytes>,
    ) -> ServiceResult<PostView> {
        let image = match image {
            Some(image) if !image.is_empty() => image,
            _ => return Err(ServiceError::validation("image required")),
        };
        if let Some(caption) = &caption {
            if caption.chars().count() > MAX_CAPTION_LEN {
                return Err(ServiceError::validation(
                    "caption must be at most 2200 characters",
                ));
            }
        }

        let users = UserService::new(self.db.clone());
        if users.get_public(author_id).await?.is_none() {
            return Err(ServiceError::not_found("user not found"));
        }

        let image_url = self.media.store_image(author_id, image).await?;

        let post_id: Uuid = sqlx::query_scalar(
            "INSERT INTO posts (author_id, image, caption) VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(author_id)
        .bind(&image_url)
        .bind(caption)
        .fetch_one(self.db.pool())
        .await?;

        users.add_post_ref(author_id, post_id).await?;
        tracing::info!(post_id = %post_id, author_id = %author_id, "post created");

        FeedService::new(self.db.clone())
            .get_post(post_id)
            .await?
            .ok_or_else(|| {
                ServiceError::Internal(anyhow::anyhow!("created post {} not readable", post_id))
            })
    }

    /// Adds the caller to the post's likes. Returns whether the set changed.
    pub async fn like_post(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        let author_id = self.author_of(post_id).await?;

        let result = sqlx::query(
            "INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(post_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        let added = result.rows_affected() > 0;
        if added {
            self.like_hook.post_liked(post_id, user_id, author_id);
        }
        Ok(added)
    }

    /// Removes the caller from the post's likes. Returns whether the set changed.
    pub async fn unlike_post(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        self.author_of(post_id).await?;

        let result = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes the post and everything that references it. Only the author may.
    pub async fn delete_post(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<()> {
        let author_id = self.author_of(post_id).await?;
        if author_id != user_id {
            return Err(ServiceError::forbidden("this post is not yours"));
        }

        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(self.db.pool())
            .await?;

        let users = UserService::new(self.db.clone());
        users.remove_post_ref(author_id, post_id).await?;

        let comments_deleted = CommentService::new(self.db.clone())
            .delete_for_post(post_id)
            .await?;

        sqlx::query("DELETE FROM post_likes WHERE post_id = $1")
            .bind(post_id)
            .execute(self.db.pool())
            .await?;
        let bookmarks_removed = users.remove_bookmarks_of_post(post_id).await?;

        tracing::info!(
            post_id = %post_id,
            author_id = %author_id,
            comments_deleted,
            bookmarks_removed,
            "post deleted"
        );
        Ok(())
    }

    /// Flips the post's membership in the caller's bookmarks.
    pub async fn toggle_bookmark(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<BookmarkState> {
        self.author_of(post_id).await?;

        let users = UserService::new(self.db.clone());
        if users.has_bookmark(user_id, post_id).await? {
            users.remove_bookmark(user_id, post_id).await?;
            Ok(BookmarkState::Unsaved)
        } else {
            users.add_bookmark(user_id, post_id).await?;
            Ok(BookmarkState::Saved)
        }
    }

    async fn author_of(&self, post_id: Uuid) -> ServiceResult<Uuid> {
        let author_id: Option<Uuid> = sqlx::query_scalar("SELECT author_id FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;

        author_id.ok_or_else(|| ServiceError::not_found("post not found"))
    }
}

pub(crate) async fn post_exists(db: &Db, post_id: Uuid) -> ServiceResult<bool> {
    let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
        .bind(post_id)
        .fetch_one(db.pool())
        .await?;
    Ok(exists)
}
