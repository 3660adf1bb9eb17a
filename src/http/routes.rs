use axum::{routing::delete, routing::get, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route("/post/add", post(handlers::create_post))
        // Path used by the existing browser client.
        .route("/post/addPost", post(handlers::create_post))
        .route("/post/all", get(handlers::list_posts))
        .route("/post/userpost/all", get(handlers::list_own_posts))
        .route("/post/:id/like", get(handlers::like_post))
        .route("/post/:id/disLike", get(handlers::dislike_post))
        .route("/post/:id/comment", post(handlers::add_comment))
        .route("/post/:id/comment/all", post(handlers::list_comments))
        .route("/post/delete/:id", delete(handlers::delete_post))
        .route("/post/:id/bookmark", post(handlers::bookmark_post))
}

pub fn users() -> Router<AppState> {
    Router::new().route("/user/:id/profile", get(handlers::get_profile))
}
