//! HTTP handlers module

mod accessories;
mod characteristics;

pub use self::accessories::*;
pub use self::characteristics::*;

use axum::{extract::State, response::IntoResponse, Json};

use super::BridgeState;
use crate::models::HealthResponse;

/// GET /health - Liveness plus registered accessory count
pub async fn health_check(State(state): State<BridgeState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        bridge: state.bridge_name.clone(),
        accessories: state.container.device_count(),
    })
}
