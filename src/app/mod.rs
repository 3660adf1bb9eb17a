pub mod auth;
pub mod comments;
pub mod error;
pub mod feed;
pub mod media;
pub mod posts;
pub mod users;
