use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::handlers::ChatResponse;
use super::HubState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Constant-time string comparison to prevent timing side-channel attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

/// 校验 `x-api-key`；未配置 API Key 时放行
pub fn validate_api_key(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let expected = match expected {
        Some(key) => key,
        None => return true,
    };

    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|provided| constant_time_eq(provided, expected))
        .unwrap_or(false)
}

/// API Key 中间件，`/health` 免校验
pub async fn auth_layer(
    State(state): State<Arc<HubState>>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if req.uri().path() == "/health" {
        return next.run(req).await;
    }

    if !validate_api_key(req.headers(), state.api_key.as_deref()) {
        tracing::warn!(path = %req.uri().path(), "rejected request with missing or invalid API key");
        return (
            StatusCode::UNAUTHORIZED,
            Json(ChatResponse::error("unauthorized")),
        )
            .into_response();
    }

    next.run(req).await
}
