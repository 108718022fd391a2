use axum::{
    body::{Body, to_bytes},
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use tracing::error;

use crate::{AppState, error::InternalErrorDetail};

const MAX_ERROR_BODY: usize = 16 * 1024;

/// 记录所有 5xx 响应；开发环境下把内部错误原文写进响应体的 `error` 字段
pub async fn log_errors(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let response = next.run(req).await;

    if !response.status().is_server_error() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let detail = parts
        .extensions
        .remove::<InternalErrorDetail>()
        .map(|d| d.0);

    let bytes = match to_bytes(body, MAX_ERROR_BODY).await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to read error response body: {}", e);
            parts.headers.remove(header::CONTENT_LENGTH);
            return Response::from_parts(parts, Body::empty());
        }
    };

    error!(
        "Server error on {} {} - Status: {}, Detail: {}, Body: {}",
        method,
        uri,
        parts.status,
        detail.as_deref().unwrap_or("-"),
        String::from_utf8_lossy(&bytes)
    );

    let body = match detail {
        Some(detail) if state.config.is_development() => with_error_field(&bytes, detail),
        _ => bytes.to_vec(),
    };

    // 重置body以便重新构建响应
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(body))
}

fn with_error_field(bytes: &[u8], detail: String) -> Vec<u8> {
    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(serde_json::Value::Object(mut map)) => {
            map.insert("error".into(), serde_json::Value::String(detail));
            serde_json::to_vec(&map).unwrap_or_else(|_| bytes.to_vec())
        }
        _ => bytes.to_vec(),
    }
}
