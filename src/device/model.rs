//! In-memory model of one managed device

use std::sync::Arc;

use crate::accessory::{Accessory, AccessoryInfo, Characteristic, BRIGHTNESS_IID, POWER_IID};
use crate::config::AccessoryEntry;
use crate::error::BridgeError;
use crate::models::{CharacteristicKind, DeviceKind, ProxyCoordinates};

/// Characteristics per device kind
#[derive(Debug, Clone)]
pub enum DeviceCharacteristics {
    Light {
        power: Arc<Characteristic>,
        brightness: Arc<Characteristic>,
    },
    Fan {
        power: Arc<Characteristic>,
    },
}

/// A device: identity, proxy coordinates, and its characteristics.
///
/// The characteristic handles are shared with the registered accessory, so
/// their cached values are what controllers see.
#[derive(Debug, Clone)]
pub struct DeviceModel {
    pub name: String,
    pub coords: ProxyCoordinates,
    pub characteristics: DeviceCharacteristics,
}

impl DeviceModel {
    pub fn from_entry(entry: &AccessoryEntry) -> Result<Self, BridgeError> {
        let kind = DeviceKind::parse(&entry.device_type)?;
        let coords = ProxyCoordinates::new(&entry.base_url, &entry.proxy_id)?;
        Ok(Self::new(&entry.name, kind, coords))
    }

    pub fn new(name: &str, kind: DeviceKind, coords: ProxyCoordinates) -> Self {
        let characteristics = match kind {
            DeviceKind::Light => DeviceCharacteristics::Light {
                power: Characteristic::new(POWER_IID, CharacteristicKind::On),
                brightness: Characteristic::new(BRIGHTNESS_IID, CharacteristicKind::Brightness),
            },
            DeviceKind::Fan => DeviceCharacteristics::Fan {
                power: Characteristic::new(POWER_IID, CharacteristicKind::On),
            },
        };

        Self {
            name: name.to_string(),
            coords,
            characteristics,
        }
    }

    pub fn kind(&self) -> DeviceKind {
        match self.characteristics {
            DeviceCharacteristics::Light { .. } => DeviceKind::Light,
            DeviceCharacteristics::Fan { .. } => DeviceKind::Fan,
        }
    }

    pub fn power(&self) -> &Arc<Characteristic> {
        match &self.characteristics {
            DeviceCharacteristics::Light { power, .. } => power,
            DeviceCharacteristics::Fan { power } => power,
        }
    }

    pub fn brightness(&self) -> Option<&Arc<Characteristic>> {
        match &self.characteristics {
            DeviceCharacteristics::Light { brightness, .. } => Some(brightness),
            DeviceCharacteristics::Fan { .. } => None,
        }
    }

    pub fn characteristic_handles(&self) -> Vec<Arc<Characteristic>> {
        match &self.characteristics {
            DeviceCharacteristics::Light { power, brightness } => {
                vec![power.clone(), brightness.clone()]
            }
            DeviceCharacteristics::Fan { power } => vec![power.clone()],
        }
    }

    /// Distinct proxy variables backing this device's characteristics
    pub fn bound_variables(&self) -> Vec<u32> {
        let kind = self.kind();
        let mut vars: Vec<u32> = self
            .characteristic_handles()
            .iter()
            .map(|c| c.kind().variable_for(kind))
            .collect();
        vars.dedup();
        vars
    }

    /// Build the protocol-facing accessory sharing this model's characteristics
    pub fn accessory(&self) -> Accessory {
        Accessory::new(
            AccessoryInfo::new(&self.name, &self.coords.proxy_id),
            self.kind().category(),
            self.characteristic_handles(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccessoryCategory, CharValue};

    fn entry(device_type: &str, base_url: &str) -> AccessoryEntry {
        AccessoryEntry {
            accessory: "C4".to_string(),
            name: "Kitchen".to_string(),
            device_type: device_type.to_string(),
            proxy_id: "5".to_string(),
            base_url: base_url.to_string(),
        }
    }

    #[test]
    fn test_light_model() {
        let model = DeviceModel::from_entry(&entry("light", "http://p/")).unwrap();
        assert_eq!(model.kind(), DeviceKind::Light);
        assert!(model.brightness().is_some());
        assert_eq!(model.characteristic_handles().len(), 2);
        assert_eq!(model.bound_variables(), vec![1001]);
    }

    #[test]
    fn test_fan_model() {
        let model = DeviceModel::from_entry(&entry("fan", "http://p/")).unwrap();
        assert_eq!(model.kind(), DeviceKind::Fan);
        assert!(model.brightness().is_none());
        assert_eq!(model.bound_variables(), vec![1000]);
        assert_eq!(model.accessory().category, AccessoryCategory::Fan);
        assert_eq!(
            tokio_test::block_on(model.power().value()),
            CharValue::Bool(false)
        );
    }

    #[test]
    fn test_rejects_unknown_type_and_bad_url() {
        assert!(matches!(
            DeviceModel::from_entry(&entry("blinds", "http://p/")),
            Err(BridgeError::UnsupportedDeviceType(_))
        ));
        assert!(matches!(
            DeviceModel::from_entry(&entry("light", "not a url")),
            Err(BridgeError::InvalidBaseUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_accessory_shares_characteristics() {
        let model = DeviceModel::from_entry(&entry("light", "http://p/")).unwrap();
        let accessory = model.accessory();

        model.power().set_value(CharValue::Bool(true)).await;

        let exposed = accessory.characteristic(POWER_IID).unwrap();
        assert_eq!(exposed.value().await, CharValue::Bool(true));
        assert_eq!(accessory.info.serial_number, "5");
    }
}
