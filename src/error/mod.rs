//! Error handling module

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Errors raised while talking to the Control4 proxy
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Request could not be sent or no response arrived
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Read returned a non-200 status or no usable value
    #[error("Empty result for variable {variable_id}: {reason}")]
    EmptyResult { variable_id: u32, reason: String },

    /// Write answered with a non-success status (strict validation only)
    #[error("Proxy rejected set of variable {variable_id}: HTTP {status}")]
    Rejected { variable_id: u32, status: u16 },
}

/// Startup and registry errors
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Failed to load config {path}: {source}")]
    ConfigLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported device type: {0:?}")]
    UnsupportedDeviceType(String),

    #[error("Invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Errors returned by the local accessory server
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
