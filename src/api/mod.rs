//! API module - local accessory server routes

pub mod auth_middleware;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use crate::accessory::AccessoryContainer;
use crate::config::BridgeConfig;

/// Shared accessory server state
#[derive(Clone)]
pub struct BridgeState {
    pub container: Arc<AccessoryContainer>,
    pub bridge_name: String,
    pub pin: String,
}

impl BridgeState {
    pub fn new(container: AccessoryContainer, bridge: &BridgeConfig) -> Self {
        Self {
            container: Arc::new(container),
            bridge_name: bridge.name.clone(),
            pin: bridge.pin.clone(),
        }
    }
}

pub fn routes(state: BridgeState) -> Router<BridgeState> {
    let protected = Router::new()
        .route("/accessories", get(handlers::list_accessories))
        .route(
            "/characteristics",
            get(handlers::get_characteristics).put(handlers::put_characteristics),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            auth_middleware::require_pin,
        ));

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .merge(protected)
}
