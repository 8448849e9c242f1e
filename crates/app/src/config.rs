//! Bridge-wide configuration.

use serde::Deserialize;

use habridge_domain::device_class::DeviceClass;
use habridge_domain::error::ValidationError;

/// Settings that shape what the bridge subscribes to and how it publishes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Discovery topic prefix.
    pub base_topic: String,
    /// Device classes whose announcements are bridged.
    pub device_classes: Vec<DeviceClass>,
    /// Retain flag for outbound command publishes.
    pub publish_retain: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_topic: "homeassistant".to_string(),
            device_classes: DeviceClass::DEFAULT_WHITELIST.to_vec(),
            publish_retain: true,
        }
    }
}

impl BridgeConfig {
    /// Check that the configuration can drive a bridge.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the base topic or the whitelist is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base().is_empty() {
            return Err(ValidationError::EmptyBaseTopic);
        }
        if self.device_classes.is_empty() {
            return Err(ValidationError::EmptyWhitelist);
        }
        Ok(())
    }

    /// Base topic without trailing slashes.
    #[must_use]
    pub fn base(&self) -> &str {
        self.base_topic.trim().trim_end_matches('/')
    }

    /// Whether announcements of `class` are bridged.
    #[must_use]
    pub fn allows(&self, class: &DeviceClass) -> bool {
        self.device_classes.contains(class)
    }

    /// Topic filters covering every whitelisted class, with and without a
    /// node id segment.
    #[must_use]
    pub fn discovery_filters(&self) -> Vec<String> {
        let base = self.base();
        self.device_classes
            .iter()
            .flat_map(|class| {
                [
                    format!("{base}/{class}/+/config"),
                    format!("{base}/{class}/+/+/config"),
                ]
            })
            .collect()
    }

    /// Parse a comma-separated whitelist (`switch, light,sensor`).
    #[must_use]
    pub fn parse_whitelist(text: &str) -> Vec<DeviceClass> {
        text.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| DeviceClass::from(name.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.base_topic, "homeassistant");
        assert_eq!(config.device_classes.len(), 9);
        assert!(config.publish_retain);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_build_filters_for_each_class() {
        let config = BridgeConfig {
            base_topic: "ha/".to_string(),
            device_classes: vec![DeviceClass::Switch, DeviceClass::Sensor],
            publish_retain: false,
        };
        assert_eq!(
            config.discovery_filters(),
            vec![
                "ha/switch/+/config",
                "ha/switch/+/+/config",
                "ha/sensor/+/config",
                "ha/sensor/+/+/config",
            ]
        );
    }

    #[test]
    fn should_reject_empty_base_topic() {
        let config = BridgeConfig {
            base_topic: " / ".to_string(),
            ..BridgeConfig::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::EmptyBaseTopic));
    }

    #[test]
    fn should_reject_empty_whitelist() {
        let config = BridgeConfig {
            device_classes: Vec::new(),
            ..BridgeConfig::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::EmptyWhitelist));
    }

    #[test]
    fn should_parse_comma_separated_whitelist() {
        let classes = BridgeConfig::parse_whitelist("switch, binary_sensor,,fan");
        assert_eq!(
            classes,
            vec![
                DeviceClass::Switch,
                DeviceClass::BinarySensor,
                DeviceClass::Other("fan".to_string()),
            ]
        );
    }

    #[test]
    fn should_deserialize_from_toml_with_defaults() {
        let config: BridgeConfig = toml::from_str(
            r#"
                base_topic = "discovery"
                device_classes = ["light", "lock"]
            "#,
        )
        .unwrap();
        assert_eq!(config.base_topic, "discovery");
        assert_eq!(config.device_classes, vec![DeviceClass::Light, DeviceClass::Lock]);
        assert!(config.publish_retain);
    }
}
