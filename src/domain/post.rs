use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::comment::CommentView;
use crate::domain::user::PublicUser;

/// A post with its author, likers and comments resolved.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub author: PublicUser,
    pub image: String,
    pub caption: Option<String>,
    pub likes: Vec<Uuid>,
    pub comments: Vec<CommentView>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkState {
    Saved,
    Unsaved,
}

impl BookmarkState {
    pub fn message(self) -> &'static str {
        match self {
            Self::Saved => "post bookmarked",
            Self::Unsaved => "post removed from bookmarks",
        }
    }
}
