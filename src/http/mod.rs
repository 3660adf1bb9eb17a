use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::middleware::map_response;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod middleware;
mod routes;

pub use auth::AuthUser;
pub use error::AppError;

pub fn router(state: AppState) -> Router {
    let api = Router::new().merge(routes::posts()).merge(routes::users());

    let router = Router::new()
        .merge(routes::health())
        .nest("/api/v1", api)
        .fallback(handlers::route_not_found)
        .layer(DefaultBodyLimit::max(state.upload_max_bytes))
        .layer(RequestBodyLimitLayer::new(state.upload_max_bytes))
        .layer(map_response(middleware::json_error_envelope));

    let router = match HeaderValue::from_str(&state.cors_origin) {
        Ok(origin) => router.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        ),
        Err(err) => {
            tracing::warn!(error = %err, origin = %state.cors_origin, "invalid CORS origin, CORS disabled");
            router
        }
    };

    router.with_state(state)
}
