use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::AppError;

/// Rewrites bare error responses produced outside the handlers (the body
/// limit layer, method routing) into the JSON error envelope.
pub async fn json_error_envelope(response: Response) -> Response {
    if is_json(&response) {
        return response;
    }

    match response.status() {
        StatusCode::PAYLOAD_TOO_LARGE => {
            AppError::payload_too_large("request body too large").into_response()
        }
        StatusCode::METHOD_NOT_ALLOWED => {
            let allow = response.headers().get(header::ALLOW).cloned();
            let mut rewritten = AppError::method_not_allowed("method not allowed").into_response();
            if let Some(allow) = allow {
                rewritten.headers_mut().insert(header::ALLOW, allow);
            }
            rewritten
        }
        _ => response,
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| value.starts_with("application/json"))
}
