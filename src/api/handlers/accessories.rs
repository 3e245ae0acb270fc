//! Accessory listing handler

use axum::{extract::State, response::IntoResponse, Json};

use crate::api::BridgeState;
use crate::models::AccessoriesResponse;

/// GET /accessories - Bridge and device accessories with current values
pub async fn list_accessories(State(state): State<BridgeState>) -> impl IntoResponse {
    let mut accessories = Vec::with_capacity(state.container.accessories().len());
    for accessory in state.container.accessories() {
        accessories.push(accessory.view().await);
    }

    Json(AccessoriesResponse { accessories })
}
