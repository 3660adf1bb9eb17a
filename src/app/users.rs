use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::app::error::ServiceResult;
use crate::app::feed::FeedService;
use crate::domain::user::{Profile, PublicUser, User};
use crate::infra::db::Db;

/// Account lookups plus the denormalized per-user lists (`posts`, `bookmarks`).
///
/// Each list mutation is a single statement; callers sequence them after the
/// primary record change without a surrounding transaction.
#[derive(Clone)]
pub struct UserService {
    db: Db,
}

impl UserService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn get_user(&self, user_id: Uuid) -> ServiceResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, bio, profile_picture, gender, created_at \
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        let user = row.map(|row| User {
            id: row.get("id"),
            username: row.get("username"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            bio: row.get("bio"),
            profile_picture: row.get("profile_picture"),
            gender: row.get("gender"),
            created_at: row.get("created_at"),
        });

        Ok(user)
    }

    pub async fn get_public(&self, user_id: Uuid) -> ServiceResult<Option<PublicUser>> {
        Ok(self.get_user(user_id).await?.map(PublicUser::from))
    }

    pub async fn add_post_ref(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<()> {
        sqlx::query(
            "INSERT INTO user_posts (user_id, post_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(post_id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn remove_post_ref(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM user_posts WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Post ids in the user's `posts` list, newest first.
    pub async fn post_ids(&self, user_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar(
            "SELECT post_id FROM user_posts WHERE user_id = $1 \
             ORDER BY created_at DESC, post_id DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(ids)
    }

    pub async fn add_bookmark(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        let result = sqlx::query(
            "INSERT INTO user_bookmarks (user_id, post_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(post_id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_bookmark(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        let result =
            sqlx::query("DELETE FROM user_bookmarks WHERE user_id = $1 AND post_id = $2")
                .bind(user_id)
                .bind(post_id)
                .execute(self.db.pool())
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn has_bookmark(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        let exists = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_bookmarks WHERE user_id = $1 AND post_id = $2)",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(exists)
    }

    /// Bookmarked post ids, most recently saved first.
    pub async fn bookmark_ids(&self, user_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar(
            "SELECT post_id FROM user_bookmarks WHERE user_id = $1 \
             ORDER BY created_at DESC, post_id DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(ids)
    }

    /// Drops every user's bookmark of a post that no longer exists.
    pub async fn remove_bookmarks_of_post(&self, post_id: Uuid) -> ServiceResult<u64> {
        let result = sqlx::query("DELETE FROM user_bookmarks WHERE post_id = $1")
            .bind(post_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn get_profile(&self, user_id: Uuid) -> ServiceResult<Option<Profile>> {
        let Some(user) = self.get_public(user_id).await? else {
            return Ok(None);
        };

        let row = sqlx::query(
            "SELECT \
                (SELECT COUNT(*) FROM follows WHERE followee_id = $1) AS followers_count, \
                (SELECT COUNT(*) FROM follows WHERE follower_id = $1) AS following_count",
        )
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;

        let feed = FeedService::new(self.db.clone());
        let posts = feed.list_by_ids(&self.post_ids(user_id).await?).await?;
        let bookmarks = feed.list_by_ids(&self.bookmark_ids(user_id).await?).await?;

        Ok(Some(Profile {
            user,
            followers_count: row.get("followers_count"),
            following_count: row.get("following_count"),
            posts,
            bookmarks,
        }))
    }
}

/// Reads the `author_*` columns every expanded query selects.
pub(crate) fn author_from_row(row: &PgRow) -> PublicUser {
    PublicUser {
        id: row.get("author_id"),
        username: row.get("author_username"),
        bio: row.get("author_bio"),
        profile_picture: row.get("author_profile_picture"),
        gender: row.get("author_gender"),
    }
}
