//! Pairing PIN middleware
//!
//! Controllers must present the bridge PIN in the `X-Pairing-Pin` header.
//! Dashes and spaces are ignored, so `031-45-154` matches `03145154`.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::BridgeState;
use crate::error::AppError;

pub const PIN_HEADER: &str = "x-pairing-pin";

/// Middleware that requires the bridge PIN. An unset PIN disables the check.
pub async fn require_pin(
    State(state): State<BridgeState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if state.pin.is_empty() {
        return next.run(req).await;
    }

    match extract_pin(req.headers()) {
        Some(pin) if pins_match(&pin, &state.pin) => next.run(req).await,
        Some(_) => {
            tracing::debug!("Rejected request with wrong pairing PIN");
            AppError::Unauthorized.into_response()
        }
        None => AppError::Unauthorized.into_response(),
    }
}

fn extract_pin(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(PIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn normalize_pin(pin: &str) -> String {
    pin.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

fn pins_match(presented: &str, expected: &str) -> bool {
    normalize_pin(presented) == normalize_pin(expected)
}
