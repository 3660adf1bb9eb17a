use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::comments::CommentService;
use crate::app::feed::FeedService;
use crate::app::posts::PostService;
use crate::app::users::UserService;
use crate::domain::comment::CommentView;
use crate::domain::post::{BookmarkState, PostView};
use crate::domain::user::Profile;
use crate::http::{AppError, AuthUser};
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct AckResponse {
    pub success: bool,
    pub message: &'static str,
}

impl AckResponse {
    fn ok(message: &'static str) -> Json<Self> {
        Json(Self {
            success: true,
            message,
        })
    }
}

#[derive(Serialize)]
pub struct PostResponse {
    pub success: bool,
    pub message: &'static str,
    pub post: PostView,
}

#[derive(Serialize)]
pub struct PostsResponse {
    pub success: bool,
    pub posts: Vec<PostView>,
}

#[derive(Serialize)]
pub struct CommentResponse {
    pub success: bool,
    pub message: &'static str,
    pub comment: CommentView,
}

#[derive(Serialize)]
pub struct CommentsResponse {
    pub success: bool,
    pub comments: Vec<CommentView>,
}

#[derive(Serialize)]
pub struct BookmarkResponse {
    pub success: bool,
    #[serde(rename = "type")]
    pub state: BookmarkState,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: Profile,
}

fn path_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::bad_request("invalid id"))
}

fn post_service(state: &AppState) -> PostService {
    PostService::new(
        state.db.clone(),
        state.media.clone(),
        state.like_hook.clone(),
    )
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = state.db.ping().await.is_ok();
    let media = state.media.ping().await.is_ok();
    let status = if db && media { "ok" } else { "degraded" };

    Json(HealthResponse { status })
}

pub(crate) async fn route_not_found() -> AppError {
    AppError::not_found("route not found")
}

// Body limit hits while streaming parts surface here rather than in the limit layer.
fn upload_error(status: StatusCode, err: impl std::fmt::Display) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large("request body too large")
    } else {
        AppError::bad_request(format!("invalid upload: {}", err))
    }
}

#[tracing::instrument(skip_all, fields(user_id = %auth.user_id))]
pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let mut multipart = multipart.map_err(|err| upload_error(err.status(), &err))?;

    let mut caption: Option<String> = None;
    let mut image: Option<Bytes> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| upload_error(err.status(), &err))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "caption" => {
                caption = Some(
                    field
                        .text()
                        .await
                        .map_err(|err| upload_error(err.status(), &err))?,
                );
            }
            "image" => {
                image = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|err| upload_error(err.status(), &err))?,
                );
            }
            _ => {}
        }
    }

    let post = post_service(&state)
        .create_post(auth.user_id, caption, image)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            success: true,
            message: "new post added",
            post,
        }),
    ))
}

#[tracing::instrument(skip_all, fields(user_id = %auth.user_id))]
pub async fn list_posts(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PostsResponse>, AppError> {
    let posts = FeedService::new(state.db.clone()).list_all().await?;

    Ok(Json(PostsResponse {
        success: true,
        posts,
    }))
}

#[tracing::instrument(skip_all, fields(user_id = %auth.user_id))]
pub async fn list_own_posts(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PostsResponse>, AppError> {
    let posts = FeedService::new(state.db.clone())
        .list_by_author(auth.user_id)
        .await?;

    Ok(Json(PostsResponse {
        success: true,
        posts,
    }))
}

#[tracing::instrument(skip_all, fields(user_id = %auth.user_id))]
pub async fn like_post(
    path: Result<Path<Uuid>, PathRejection>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AckResponse>, AppError> {
    let post_id = path_id(path)?;
    let added = post_service(&state).like_post(auth.user_id, post_id).await?;
    tracing::debug!(post_id = %post_id, added, "like");

    Ok(AckResponse::ok("post liked"))
}

#[tracing::instrument(skip_all, fields(user_id = %auth.user_id))]
pub async fn dislike_post(
    path: Result<Path<Uuid>, PathRejection>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AckResponse>, AppError> {
    let post_id = path_id(path)?;
    let removed = post_service(&state)
        .unlike_post(auth.user_id, post_id)
        .await?;
    tracing::debug!(post_id = %post_id, removed, "dislike");

    Ok(AckResponse::ok("post disliked"))
}

#[derive(Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}

#[tracing::instrument(skip_all, fields(user_id = %auth.user_id))]
pub async fn add_comment(
    path: Result<Path<Uuid>, PathRejection>,
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let post_id = path_id(path)?;
    let Json(payload) =
        payload.map_err(|err| AppError::bad_request(format!("invalid body: {}", err)))?;

    let comment = CommentService::new(state.db.clone())
        .add_comment(auth.user_id, post_id, &payload.text)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            success: true,
            message: "comment added",
            comment,
        }),
    ))
}

#[tracing::instrument(skip_all, fields(user_id = %auth.user_id))]
pub async fn list_comments(
    path: Result<Path<Uuid>, PathRejection>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<CommentsResponse>, AppError> {
    let post_id = path_id(path)?;
    let comments = CommentService::new(state.db.clone())
        .list_for_post(post_id)
        .await?;

    Ok(Json(CommentsResponse {
        success: true,
        comments,
    }))
}

#[tracing::instrument(skip_all, fields(user_id = %auth.user_id))]
pub async fn delete_post(
    path: Result<Path<Uuid>, PathRejection>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AckResponse>, AppError> {
    let post_id = path_id(path)?;
    post_service(&state)
        .delete_post(auth.user_id, post_id)
        .await?;

    Ok(AckResponse::ok("post deleted"))
}

#[tracing::instrument(skip_all, fields(user_id = %auth.user_id))]
pub async fn bookmark_post(
    path: Result<Path<Uuid>, PathRejection>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<BookmarkResponse>, AppError> {
    let post_id = path_id(path)?;
    let bookmark = post_service(&state)
        .toggle_bookmark(auth.user_id, post_id)
        .await?;

    Ok(Json(BookmarkResponse {
        success: true,
        state: bookmark,
        message: bookmark.message(),
    }))
}

#[tracing::instrument(skip_all, fields(user_id = %auth.user_id))]
pub async fn get_profile(
    path: Result<Path<Uuid>, PathRejection>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user_id = path_id(path)?;
    let profile = UserService::new(state.db.clone())
        .get_profile(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    Ok(Json(ProfileResponse {
        success: true,
        user: profile,
    }))
}
