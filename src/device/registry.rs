//! DeviceRegistry: builds one device + sync engine per configured accessory
//!
//! Entries with an unknown `device_type` or an unusable base URL are logged
//! and skipped; startup continues with the remaining entries.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::accessory::{Accessory, AccessoryContainer, AccessoryInfo};
use crate::config::{AccessoryEntry, BridgeConfig};
use crate::device::DeviceModel;
use crate::error::BridgeError;
use crate::proxy::ProxyCommandClient;
use crate::sync::SynchronizationEngine;

/// Devices successfully constructed from configuration
pub struct DeviceRegistry {
    engines: Vec<Arc<SynchronizationEngine>>,
    skipped: usize,
}

impl DeviceRegistry {
    /// Construct and reconcile every entry, sequentially, in file order
    pub async fn build(
        entries: &[AccessoryEntry],
        client: &ProxyCommandClient,
        shutdown: &CancellationToken,
    ) -> Self {
        let mut engines = Vec::with_capacity(entries.len());
        let mut skipped = 0;

        for entry in entries {
            match Self::init_device(entry, client, shutdown).await {
                Ok(engine) => {
                    tracing::info!(
                        "[Registry] Registered {} {:?} (proxy {})",
                        engine.device().kind(),
                        entry.name,
                        entry.proxy_id
                    );
                    engines.push(engine);
                }
                Err(e) => {
                    tracing::warn!("[Registry] Skipping {:?}: {}", entry.name, e);
                    skipped += 1;
                }
            }
        }

        tracing::info!(
            "[Registry] {} devices registered, {} skipped",
            engines.len(),
            skipped
        );

        Self { engines, skipped }
    }

    async fn init_device(
        entry: &AccessoryEntry,
        client: &ProxyCommandClient,
        shutdown: &CancellationToken,
    ) -> Result<Arc<SynchronizationEngine>, BridgeError> {
        let device = DeviceModel::from_entry(entry)?;
        Ok(SynchronizationEngine::start(device, client.clone(), shutdown.clone()).await)
    }

    pub fn engines(&self) -> &[Arc<SynchronizationEngine>] {
        &self.engines
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Accessories for every registered device, in configuration order
    pub fn accessories(&self) -> Vec<Accessory> {
        self.engines.iter().map(|e| e.accessory()).collect()
    }

    /// Bridge accessory plus all device accessories
    pub fn into_container(self, bridge: &BridgeConfig) -> AccessoryContainer {
        let mut container =
            AccessoryContainer::new(Accessory::bridge(AccessoryInfo::new(&bridge.name, &bridge.username)));
        for accessory in self.accessories() {
            container.add_accessory(accessory);
        }
        container
    }
}
