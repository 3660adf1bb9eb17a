pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use std::sync::Arc;

use crate::app::auth::AuthGate;
use crate::app::media::MediaIngest;
use crate::app::posts::LikeHook;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub media: Arc<dyn MediaIngest>,
    pub like_hook: Arc<dyn LikeHook>,
    pub auth: AuthGate,
    pub upload_max_bytes: usize,
    pub cors_origin: String,
}
