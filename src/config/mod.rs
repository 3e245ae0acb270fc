//! Configuration module
//!
//! - `Settings`: runtime knobs from `config/default` + `C4BRIDGE__*` env vars
//! - `BridgeFile`: the bridge/accessories JSON file

use std::path::Path;

use serde::Deserialize;

use crate::error::BridgeError;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_accessories_config")]
    pub accessories_config: String,
    #[serde(default = "default_listen_host")]
    pub listen_host: String,
    /// Treat non-2xx answers to `set` commands as failures
    #[serde(default)]
    pub strict_response_validation: bool,
    /// Continue with an empty configuration when the JSON is malformed
    #[serde(default)]
    pub lenient_config_parse: bool,
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            accessories_config: default_accessories_config(),
            listen_host: default_listen_host(),
            strict_response_validation: false,
            lenient_config_parse: false,
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

fn default_accessories_config() -> String {
    "./accessories_config.json".to_string()
}

fn default_listen_host() -> String {
    "0.0.0.0".to_string()
}

fn default_shutdown_grace_secs() -> u64 {
    5
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::Environment::with_prefix("C4BRIDGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = settings.try_deserialize().unwrap_or_else(|e| {
            tracing::warn!("Invalid settings, using defaults: {}", e);
            Settings::default()
        });

        Ok(settings)
    }
}

/// Top-level accessories configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BridgeFile {
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub accessories: Vec<AccessoryEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub name: String,
    /// Network identity advertised by the bridge
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub pin: String,
}

/// One device entry. `device_type` is validated by the registry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessoryEntry {
    #[serde(default)]
    pub accessory: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub device_type: String,
    #[serde(default)]
    pub proxy_id: String,
    #[serde(default)]
    pub base_url: String,
}

impl BridgeFile {
    /// Read and parse the accessories file.
    ///
    /// A missing or unreadable file is always fatal. Malformed JSON is fatal
    /// unless `lenient` is set, in which case an empty configuration is used.
    pub fn load(path: impl AsRef<Path>, lenient: bool) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| BridgeError::ConfigLoad {
            path: path.display().to_string(),
            source,
        })?;

        Self::parse(&raw, &path.display().to_string(), lenient)
    }

    fn parse(raw: &str, path: &str, lenient: bool) -> Result<Self, BridgeError> {
        match serde_json::from_str(raw) {
            Ok(file) => Ok(file),
            Err(source) if lenient => {
                tracing::warn!(
                    "Malformed config {} ({}), continuing with empty configuration",
                    path,
                    source
                );
                Ok(Self::default())
            }
            Err(source) => Err(BridgeError::ConfigParse {
                path: path.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "bridge": {"name": "C4 Bridge", "username": "CC:22:3D:E3:CE:30", "port": 51826, "pin": "03145154"},
        "accessories": [
            {"accessory": "C4", "name": "Kitchen", "device_type": "light", "proxy_id": "5", "base_url": "http://p/"},
            {"accessory": "C4", "name": "Ceiling Fan", "device_type": "fan", "proxy_id": "9", "base_url": "http://p/"}
        ]
    }"#;

    #[test]
    fn test_parse_full_file() {
        let file = BridgeFile::parse(SAMPLE, "sample", false).unwrap();
        assert_eq!(file.bridge.name, "C4 Bridge");
        assert_eq!(file.bridge.port, 51826);
        assert_eq!(file.bridge.pin, "03145154");
        assert_eq!(file.accessories.len(), 2);
        assert_eq!(file.accessories[0].device_type, "light");
        assert_eq!(file.accessories[1].proxy_id, "9");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let file = BridgeFile::parse(r#"{"accessories": [{"name": "x"}]}"#, "sample", false).unwrap();
        assert_eq!(file.bridge.port, 0);
        assert!(file.bridge.name.is_empty());
        assert!(file.accessories[0].base_url.is_empty());
    }

    #[test]
    fn test_malformed_json_fails_fast() {
        let result = BridgeFile::parse("{not json", "sample", false);
        assert!(matches!(result, Err(BridgeError::ConfigParse { .. })));
    }

    #[test]
    fn test_malformed_json_lenient_is_empty() {
        let file = BridgeFile::parse("{not json", "sample", true).unwrap();
        assert!(file.accessories.is_empty());
        assert!(file.bridge.pin.is_empty());
    }

    #[test]
    fn test_load_from_disk() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(SAMPLE.as_bytes()).unwrap();

        let file = BridgeFile::load(tmp.path(), false).unwrap();
        assert_eq!(file.accessories.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let result = BridgeFile::load("/nonexistent/accessories_config.json", true);
        assert!(matches!(result, Err(BridgeError::ConfigLoad { .. })));
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.accessories_config, "./accessories_config.json");
        assert!(!settings.strict_response_validation);
        assert!(!settings.lenient_config_parse);
        assert_eq!(settings.shutdown_grace_secs, 5);
    }
}
