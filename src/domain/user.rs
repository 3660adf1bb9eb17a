use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::post::PostView;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub gender: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Author expansion embedded in posts and comments. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub gender: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            bio: user.bio,
            profile_picture: user.profile_picture,
            gender: user.gender,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: PublicUser,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts: Vec<PostView>,
    pub bookmarks: Vec<PostView>,
}
