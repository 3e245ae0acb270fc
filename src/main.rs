//! c4-accessory-bridge - Control4 proxy accessory bridge
//!
//! Exposes Control4 lights and fans as smart-home accessories. Device state
//! is read from the Control4 proxy at startup and controller writes are
//! forwarded to it as variable `set` commands.

mod accessory;
mod api;
mod config;
mod device;
mod error;
mod models;
mod proxy;
mod sync;

use std::net::SocketAddr;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::BridgeState;
use crate::config::{BridgeFile, Settings};
use crate::device::DeviceRegistry;
use crate::proxy::ProxyCommandClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "c4_accessory_bridge=info,tower_http=info".into()),
        )
        .init();

    tracing::info!("Starting c4-accessory-bridge...");

    // Load configuration
    let settings = Settings::load()?;
    let file = BridgeFile::load(&settings.accessories_config, settings.lenient_config_parse)?;
    tracing::info!(
        "Configuration loaded: bridge {:?} ({}), {} accessories",
        file.bridge.name,
        file.bridge.username,
        file.accessories.len()
    );
    if file.bridge.pin.is_empty() {
        tracing::warn!("No pairing PIN configured, accessory server is unauthenticated");
    }

    let shutdown = CancellationToken::new();
    let client = ProxyCommandClient::new(settings.strict_response_validation);

    // Startup reconciliation runs before anything is exposed
    let registry = DeviceRegistry::build(&file.accessories, &client, &shutdown).await;
    if registry.is_empty() {
        tracing::warn!(
            "No devices registered ({} entries skipped), serving bridge only",
            registry.skipped()
        );
    }
    let container = registry.into_container(&file.bridge);
    let state = BridgeState::new(container, &file.bridge);

    let app = api::routes(state.clone())
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr: SocketAddr = format!("{}:{}", settings.listen_host, file.bridge.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Accessory server listening on {}", addr);

    let server_shutdown = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(server_shutdown.cancelled_owned())
            .await
    });

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    tracing::info!("Shutdown requested, draining in-flight writes...");
    shutdown.cancel();

    let grace = Duration::from_secs(settings.shutdown_grace_secs);
    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            tracing::warn!("Grace period of {:?} elapsed, abandoning in-flight writes", grace);
            server.abort();
        }
    }

    tracing::info!("Stopped");
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
