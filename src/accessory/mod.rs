//! Accessory protocol model
//!
//! Minimal bridge/container model consumed by the sync engine:
//! accessories carry characteristics with a shared cached value, and
//! remote writes are delivered to a per-accessory `RemoteWriteHandler`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::{
    AccessoryCategory, AccessoryView, CharValue, CharacteristicKind, CharacteristicView,
    MANUFACTURER,
};

/// Accessory id reserved for the bridge itself
pub const BRIDGE_AID: u64 = 1;
/// Instance id of the power characteristic on every device accessory
pub const POWER_IID: u64 = 10;
/// Instance id of a light's brightness characteristic
pub const BRIGHTNESS_IID: u64 = 11;

const PERMS: [&str; 3] = ["pr", "pw", "ev"];

/// A single characteristic and its cached value
#[derive(Debug)]
pub struct Characteristic {
    iid: u64,
    kind: CharacteristicKind,
    value: RwLock<CharValue>,
}

impl Characteristic {
    pub fn new(iid: u64, kind: CharacteristicKind) -> Arc<Self> {
        Arc::new(Self {
            iid,
            kind,
            value: RwLock::new(kind.default_value()),
        })
    }

    pub fn iid(&self) -> u64 {
        self.iid
    }

    pub fn kind(&self) -> CharacteristicKind {
        self.kind
    }

    pub async fn value(&self) -> CharValue {
        *self.value.read().await
    }

    pub async fn set_value(&self, value: CharValue) {
        *self.value.write().await = value;
    }

    pub async fn view(&self, aid: Option<u64>) -> CharacteristicView {
        CharacteristicView {
            aid,
            iid: self.iid,
            kind: self.kind,
            value: self.value().await,
            perms: PERMS.to_vec(),
        }
    }
}

/// Receives writes a remote controller makes to an accessory's characteristics
#[async_trait]
pub trait RemoteWriteHandler: Send + Sync {
    async fn on_remote_write(&self, kind: CharacteristicKind, value: CharValue);
}

#[derive(Debug, Clone)]
pub struct AccessoryInfo {
    pub name: String,
    pub manufacturer: String,
    pub serial_number: String,
}

impl AccessoryInfo {
    pub fn new(name: &str, serial_number: &str) -> Self {
        Self {
            name: name.to_string(),
            manufacturer: MANUFACTURER.to_string(),
            serial_number: serial_number.to_string(),
        }
    }
}

/// An accessory as registered with the container
pub struct Accessory {
    aid: u64,
    pub info: AccessoryInfo,
    pub category: AccessoryCategory,
    characteristics: Vec<Arc<Characteristic>>,
    handler: Option<Arc<dyn RemoteWriteHandler>>,
}

impl Accessory {
    pub fn new(
        info: AccessoryInfo,
        category: AccessoryCategory,
        characteristics: Vec<Arc<Characteristic>>,
    ) -> Self {
        Self {
            aid: 0,
            info,
            category,
            characteristics,
            handler: None,
        }
    }

    pub fn bridge(info: AccessoryInfo) -> Self {
        Self::new(info, AccessoryCategory::Bridge, Vec::new())
    }

    pub fn with_handler(mut self, handler: Arc<dyn RemoteWriteHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn aid(&self) -> u64 {
        self.aid
    }

    pub fn characteristic(&self, iid: u64) -> Option<&Arc<Characteristic>> {
        self.characteristics.iter().find(|c| c.iid() == iid)
    }

    pub async fn view(&self) -> AccessoryView {
        let mut characteristics = Vec::with_capacity(self.characteristics.len());
        for c in &self.characteristics {
            characteristics.push(c.view(None).await);
        }

        AccessoryView {
            aid: self.aid,
            category: self.category,
            name: self.info.name.clone(),
            manufacturer: self.info.manufacturer.clone(),
            serial_number: self.info.serial_number.clone(),
            characteristics,
        }
    }
}

/// Bridge accessory plus the device accessories behind it
pub struct AccessoryContainer {
    accessories: Vec<Accessory>,
}

impl AccessoryContainer {
    pub fn new(mut bridge: Accessory) -> Self {
        bridge.aid = BRIDGE_AID;
        Self {
            accessories: vec![bridge],
        }
    }

    /// Register an accessory, assigning the next free accessory id
    pub fn add_accessory(&mut self, mut accessory: Accessory) -> u64 {
        let aid = BRIDGE_AID + self.accessories.len() as u64;
        accessory.aid = aid;
        self.accessories.push(accessory);
        aid
    }

    pub fn accessories(&self) -> &[Accessory] {
        &self.accessories
    }

    pub fn bridge(&self) -> &Accessory {
        &self.accessories[0]
    }

    /// Number of device accessories (bridge excluded)
    pub fn device_count(&self) -> usize {
        self.accessories.len() - 1
    }

    pub fn find(&self, aid: u64) -> Option<&Accessory> {
        self.accessories.iter().find(|a| a.aid == aid)
    }

    pub fn characteristic(&self, aid: u64, iid: u64) -> Result<&Arc<Characteristic>, AppError> {
        self.find(aid)
            .and_then(|a| a.characteristic(iid))
            .ok_or_else(|| AppError::NotFound(format!("Characteristic {}.{} not found", aid, iid)))
    }

    /// Deliver a remote write to the owning accessory's handler.
    ///
    /// Accessories without a handler store the value directly.
    pub async fn dispatch_write(&self, aid: u64, iid: u64, value: CharValue) -> Result<(), AppError> {
        let accessory = self
            .find(aid)
            .ok_or_else(|| AppError::NotFound(format!("Accessory {} not found", aid)))?;
        let characteristic = accessory.characteristic(iid).ok_or_else(|| {
            AppError::NotFound(format!("Characteristic {}.{} not found", aid, iid))
        })?;

        if !characteristic.kind().accepts(&value) {
            return Err(AppError::BadRequest(format!(
                "Invalid value {:?} for {:?}",
                value,
                characteristic.kind()
            )));
        }

        match &accessory.handler {
            Some(handler) => handler.on_remote_write(characteristic.kind(), value).await,
            None => characteristic.set_value(value).await,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHandler {
        writes: Mutex<Vec<(CharacteristicKind, CharValue)>>,
    }

    #[async_trait]
    impl RemoteWriteHandler for RecordingHandler {
        async fn on_remote_write(&self, kind: CharacteristicKind, value: CharValue) {
            self.writes.lock().unwrap().push((kind, value));
        }
    }

    fn light_accessory() -> Accessory {
        Accessory::new(
            AccessoryInfo::new("Kitchen", "5"),
            AccessoryCategory::Lightbulb,
            vec![
                Characteristic::new(POWER_IID, CharacteristicKind::On),
                Characteristic::new(BRIGHTNESS_IID, CharacteristicKind::Brightness),
            ],
        )
    }

    #[tokio::test]
    async fn test_characteristic_defaults() {
        let power = Characteristic::new(POWER_IID, CharacteristicKind::On);
        let brightness = Characteristic::new(BRIGHTNESS_IID, CharacteristicKind::Brightness);
        assert_eq!(power.value().await, CharValue::Bool(false));
        assert_eq!(brightness.value().await, CharValue::Int(0));
    }

    #[tokio::test]
    async fn test_container_assigns_ids() {
        let mut container = AccessoryContainer::new(Accessory::bridge(AccessoryInfo::new("Bridge", "")));
        assert_eq!(container.add_accessory(light_accessory()), 2);
        assert_eq!(container.add_accessory(light_accessory()), 3);
        assert_eq!(container.bridge().aid(), BRIDGE_AID);
        assert_eq!(container.device_count(), 2);
        assert_eq!(container.bridge().info.manufacturer, "Control4");
    }

    #[tokio::test]
    async fn test_dispatch_to_handler() {
        let handler = Arc::new(RecordingHandler::default());
        let mut container = AccessoryContainer::new(Accessory::bridge(AccessoryInfo::new("Bridge", "")));
        let aid = container.add_accessory(light_accessory().with_handler(handler.clone()));

        container
            .dispatch_write(aid, BRIGHTNESS_IID, CharValue::Int(40))
            .await
            .unwrap();

        let writes = handler.writes.lock().unwrap();
        assert_eq!(writes.as_slice(), &[(CharacteristicKind::Brightness, CharValue::Int(40))]);
        // Handler owns the cached value
        drop(writes);
        let brightness = container.characteristic(aid, BRIGHTNESS_IID).unwrap();
        assert_eq!(brightness.value().await, CharValue::Int(0));
    }

    #[tokio::test]
    async fn test_dispatch_without_handler_stores_value() {
        let mut container = AccessoryContainer::new(Accessory::bridge(AccessoryInfo::new("Bridge", "")));
        let aid = container.add_accessory(light_accessory());

        container
            .dispatch_write(aid, POWER_IID, CharValue::Bool(true))
            .await
            .unwrap();

        let power = container.characteristic(aid, POWER_IID).unwrap();
        assert_eq!(power.value().await, CharValue::Bool(true));
    }

    #[tokio::test]
    async fn test_dispatch_rejects_bad_input() {
        let mut container = AccessoryContainer::new(Accessory::bridge(AccessoryInfo::new("Bridge", "")));
        let aid = container.add_accessory(light_accessory());

        assert!(matches!(
            container.dispatch_write(aid, POWER_IID, CharValue::Int(1)).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            container.dispatch_write(aid, 99, CharValue::Bool(true)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            container.dispatch_write(42, POWER_IID, CharValue::Bool(true)).await,
            Err(AppError::NotFound(_))
        ));
    }
}
