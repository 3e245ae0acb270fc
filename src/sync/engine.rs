//! SynchronizationEngine: keeps one device consistent between the
//! accessory protocol and the Control4 proxy.
//!
//! Startup pulls the proxy's value into the characteristics once. Remote
//! writes are applied optimistically, sent to the proxy, and rolled back if
//! the command could not be delivered.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::accessory::{Accessory, Characteristic, RemoteWriteHandler};
use crate::device::{DeviceCharacteristics, DeviceModel};
use crate::models::{CharValue, CharacteristicKind, FAN_POWER_VARIABLE, LIGHT_LEVEL_VARIABLE};
use crate::proxy::ProxyCommandClient;

/// Level sent to the proxy when a light is switched on
const LIGHT_FULL_LEVEL: i64 = 100;

pub struct SynchronizationEngine {
    device: DeviceModel,
    client: ProxyCommandClient,
    /// Held across read-modify-write-rollback of one write
    write_lock: Mutex<()>,
    shutdown: CancellationToken,
}

impl SynchronizationEngine {
    pub fn new(device: DeviceModel, client: ProxyCommandClient, shutdown: CancellationToken) -> Self {
        Self {
            device,
            client,
            write_lock: Mutex::new(()),
            shutdown,
        }
    }

    /// Build the engine and run startup reconciliation before returning it
    pub async fn start(
        device: DeviceModel,
        client: ProxyCommandClient,
        shutdown: CancellationToken,
    ) -> Arc<Self> {
        let engine = Arc::new(Self::new(device, client, shutdown));
        engine.reconcile_startup().await;
        engine
    }

    pub fn device(&self) -> &DeviceModel {
        &self.device
    }

    /// Accessory for the container, with writes routed back to this engine
    pub fn accessory(self: &Arc<Self>) -> Accessory {
        self.device.accessory().with_handler(self.clone())
    }

    /// Pull the current state from the proxy. Failures leave the defaults.
    pub async fn reconcile_startup(&self) {
        let coords = &self.device.coords;

        for variable_id in self.device.bound_variables() {
            match self.client.fetch_variable(coords, variable_id).await {
                Ok(raw) => self.apply_proxy_value(raw).await,
                Err(e) => tracing::warn!(
                    "[Sync] {} (proxy {}): initial fetch of {} failed, keeping defaults: {}",
                    self.device.name,
                    coords.proxy_id,
                    variable_id,
                    e
                ),
            }
        }
    }

    async fn apply_proxy_value(&self, raw: i64) {
        match &self.device.characteristics {
            DeviceCharacteristics::Light { power, brightness } => {
                let (on, level) = decode_light_level(raw);
                power.set_value(CharValue::Bool(on)).await;
                brightness.set_value(CharValue::Int(level)).await;
                tracing::info!(
                    "[Sync] {} (proxy {}): on={} brightness={}",
                    self.device.name,
                    self.device.coords.proxy_id,
                    on,
                    level
                );
            }
            DeviceCharacteristics::Fan { power } => {
                let on = decode_fan_power(raw);
                power.set_value(CharValue::Bool(on)).await;
                tracing::info!(
                    "[Sync] {} (proxy {}): on={}",
                    self.device.name,
                    self.device.coords.proxy_id,
                    on
                );
            }
        }
    }

    /// Apply a remote write. Never fails; proxy errors are logged and rolled back.
    pub async fn handle_write(&self, kind: CharacteristicKind, value: CharValue) {
        if self.shutdown.is_cancelled() {
            tracing::info!(
                "[Sync] {}: shutting down, ignoring {:?} write",
                self.device.name,
                kind
            );
            return;
        }

        let _guard = self.write_lock.lock().await;

        match (&self.device.characteristics, kind) {
            (DeviceCharacteristics::Light { power, brightness }, CharacteristicKind::On) => {
                self.write_light_power(power, brightness, value.as_bool()).await;
            }
            (DeviceCharacteristics::Light { brightness, .. }, CharacteristicKind::Brightness) => {
                self.write_light_brightness(brightness, value.as_int()).await;
            }
            (DeviceCharacteristics::Fan { power }, CharacteristicKind::On) => {
                self.write_fan_power(power, value.as_bool()).await;
            }
            (DeviceCharacteristics::Fan { .. }, CharacteristicKind::Brightness) => {
                tracing::warn!("[Sync] {}: fan has no brightness, ignoring write", self.device.name);
            }
        }
    }

    /// Power drives the level to its extreme: on → 100, off → 0
    async fn write_light_power(
        &self,
        power: &Characteristic,
        brightness: &Characteristic,
        on: bool,
    ) {
        let previous_power = power.value().await;
        let previous_brightness = brightness.value().await;
        let level = if on { LIGHT_FULL_LEVEL } else { 0 };

        power.set_value(CharValue::Bool(on)).await;
        brightness.set_value(CharValue::Int(level)).await;

        if let Err(e) = self
            .client
            .set_variable(&self.device.coords, LIGHT_LEVEL_VARIABLE, level)
            .await
        {
            tracing::error!(
                "[Sync] {}: set power={} failed, rolling back: {}",
                self.device.name,
                on,
                e
            );
            power.set_value(previous_power).await;
            brightness.set_value(previous_brightness).await;
        }
    }

    /// Direct level write: no optimistic update, so nothing to roll back
    async fn write_light_brightness(&self, brightness: &Characteristic, level: i64) {
        match self
            .client
            .set_variable(&self.device.coords, LIGHT_LEVEL_VARIABLE, level)
            .await
        {
            Ok(()) => brightness.set_value(CharValue::Int(level)).await,
            Err(e) => tracing::error!(
                "[Sync] {}: set brightness={} failed: {}",
                self.device.name,
                level,
                e
            ),
        }
    }

    async fn write_fan_power(&self, power: &Characteristic, on: bool) {
        let previous = power.value().await;

        power.set_value(CharValue::Bool(on)).await;

        if let Err(e) = self
            .client
            .set_variable(&self.device.coords, FAN_POWER_VARIABLE, i64::from(on))
            .await
        {
            tracing::error!(
                "[Sync] {}: set fan power={} failed, rolling back: {}",
                self.device.name,
                on,
                e
            );
            power.set_value(previous).await;
        }
    }
}

#[async_trait]
impl RemoteWriteHandler for SynchronizationEngine {
    async fn on_remote_write(&self, kind: CharacteristicKind, value: CharValue) {
        self.handle_write(kind, value).await;
    }
}

/// Light level → (power, brightness)
fn decode_light_level(raw: i64) -> (bool, i64) {
    (raw > 0, raw.clamp(0, 100))
}

fn decode_fan_power(raw: i64) -> bool {
    raw == 1
}
