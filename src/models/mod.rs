//! Data models for c4-accessory-bridge

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::BridgeError;

// ============================================================================
// Device Models
// ============================================================================

/// Proxy variable holding a light's level (0 = off, 1-100 = on at level)
pub const LIGHT_LEVEL_VARIABLE: u32 = 1001;
/// Proxy variable holding a fan's power state (0 / 1)
pub const FAN_POWER_VARIABLE: u32 = 1000;

pub const MANUFACTURER: &str = "Control4";

/// Supported device kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Light,
    Fan,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Light => "light",
            DeviceKind::Fan => "fan",
        }
    }

    pub fn parse(s: &str) -> Result<Self, BridgeError> {
        match s {
            "light" => Ok(DeviceKind::Light),
            "fan" => Ok(DeviceKind::Fan),
            other => Err(BridgeError::UnsupportedDeviceType(other.to_string())),
        }
    }

    /// Accessory category advertised to controllers
    pub fn category(&self) -> AccessoryCategory {
        match self {
            DeviceKind::Light => AccessoryCategory::Lightbulb,
            DeviceKind::Fan => AccessoryCategory::Fan,
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Characteristic types exposed to the accessory protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacteristicKind {
    On,
    Brightness,
}

impl CharacteristicKind {
    /// Static (device kind, characteristic) → proxy variable binding
    pub fn variable_for(self, device: DeviceKind) -> u32 {
        match (device, self) {
            (DeviceKind::Light, CharacteristicKind::On) => LIGHT_LEVEL_VARIABLE,
            (DeviceKind::Light, CharacteristicKind::Brightness) => LIGHT_LEVEL_VARIABLE,
            (DeviceKind::Fan, _) => FAN_POWER_VARIABLE,
        }
    }

    /// Zero value a characteristic holds until the proxy says otherwise
    pub fn default_value(self) -> CharValue {
        match self {
            CharacteristicKind::On => CharValue::Bool(false),
            CharacteristicKind::Brightness => CharValue::Int(0),
        }
    }

    /// Validate a value written by a controller
    pub fn accepts(self, value: &CharValue) -> bool {
        match (self, value) {
            (CharacteristicKind::On, CharValue::Bool(_)) => true,
            (CharacteristicKind::Brightness, CharValue::Int(v)) => (0..=100).contains(v),
            _ => false,
        }
    }
}

/// Characteristic value as carried on the accessory protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CharValue {
    Bool(bool),
    Int(i64),
}

impl CharValue {
    pub fn as_bool(&self) -> bool {
        match self {
            CharValue::Bool(b) => *b,
            CharValue::Int(v) => *v > 0,
        }
    }

    pub fn as_int(&self) -> i64 {
        match self {
            CharValue::Bool(b) => i64::from(*b),
            CharValue::Int(v) => *v,
        }
    }
}

/// Accessory category (subset of the accessory protocol's categories)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessoryCategory {
    Bridge,
    Lightbulb,
    Fan,
}

/// Where a device lives on the proxy: base URL plus proxy id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyCoordinates {
    pub base_url: Url,
    pub proxy_id: String,
}

impl ProxyCoordinates {
    pub fn new(base_url: &str, proxy_id: &str) -> Result<Self, BridgeError> {
        let parsed = Url::parse(base_url).map_err(|source| BridgeError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;

        Ok(Self {
            base_url: parsed,
            proxy_id: proxy_id.to_string(),
        })
    }
}

// ============================================================================
// Accessory Server Models
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AccessoriesResponse {
    pub accessories: Vec<AccessoryView>,
}

#[derive(Debug, Serialize)]
pub struct AccessoryView {
    pub aid: u64,
    pub category: AccessoryCategory,
    pub name: String,
    pub manufacturer: String,
    pub serial_number: String,
    pub characteristics: Vec<CharacteristicView>,
}

#[derive(Debug, Serialize)]
pub struct CharacteristicView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aid: Option<u64>,
    pub iid: u64,
    #[serde(rename = "type")]
    pub kind: CharacteristicKind,
    pub value: CharValue,
    pub perms: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct CharacteristicsResponse {
    pub characteristics: Vec<CharacteristicView>,
}

#[derive(Debug, Deserialize)]
pub struct CharacteristicsQuery {
    /// Comma-separated `aid.iid` pairs
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct CharacteristicWriteRequest {
    pub characteristics: Vec<CharacteristicWrite>,
}

#[derive(Debug, Deserialize)]
pub struct CharacteristicWrite {
    pub aid: u64,
    pub iid: u64,
    pub value: CharValue,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub bridge: String,
    pub accessories: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device_kind() {
        assert_eq!(DeviceKind::parse("light").unwrap(), DeviceKind::Light);
        assert_eq!(DeviceKind::parse("fan").unwrap(), DeviceKind::Fan);
        assert!(matches!(
            DeviceKind::parse("thermostat"),
            Err(BridgeError::UnsupportedDeviceType(t)) if t == "thermostat"
        ));
        // Case sensitive
        assert!(DeviceKind::parse("Light").is_err());
    }

    #[test]
    fn test_variable_binding() {
        assert_eq!(CharacteristicKind::On.variable_for(DeviceKind::Light), 1001);
        assert_eq!(
            CharacteristicKind::Brightness.variable_for(DeviceKind::Light),
            1001
        );
        assert_eq!(CharacteristicKind::On.variable_for(DeviceKind::Fan), 1000);
    }

    #[test]
    fn test_accepts() {
        assert!(CharacteristicKind::On.accepts(&CharValue::Bool(true)));
        assert!(!CharacteristicKind::On.accepts(&CharValue::Int(1)));
        assert!(CharacteristicKind::Brightness.accepts(&CharValue::Int(0)));
        assert!(CharacteristicKind::Brightness.accepts(&CharValue::Int(100)));
        assert!(!CharacteristicKind::Brightness.accepts(&CharValue::Int(101)));
        assert!(!CharacteristicKind::Brightness.accepts(&CharValue::Bool(true)));
    }

    #[test]
    fn test_char_value_untagged() {
        let v: CharValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, CharValue::Bool(true));
        let v: CharValue = serde_json::from_str("55").unwrap();
        assert_eq!(v, CharValue::Int(55));
        assert_eq!(serde_json::to_string(&CharValue::Int(7)).unwrap(), "7");
    }

    #[test]
    fn test_proxy_coordinates() {
        let coords = ProxyCoordinates::new("http://p/", "5").unwrap();
        assert_eq!(coords.base_url.as_str(), "http://p/");
        assert_eq!(coords.proxy_id, "5");

        assert!(matches!(
            ProxyCoordinates::new("", "5"),
            Err(BridgeError::InvalidBaseUrl { .. })
        ));
    }
}
