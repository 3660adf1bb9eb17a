use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::user::PublicUser;

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub text: String,
    pub author: PublicUser,
    pub post_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
