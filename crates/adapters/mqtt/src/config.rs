//! MQTT connection configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::MqttError;

/// Smallest keep-alive interval the client accepts.
const MIN_KEEP_ALIVE_SECS: u16 = 5;

/// Configuration for the broker connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Capacity of the client request channel.
    pub channel_capacity: usize,
    /// Pause after a connection error before polling again, in milliseconds.
    pub reconnect_delay_ms: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "habridge".to_string(),
            keep_alive_secs: 30,
            username: None,
            password: None,
            channel_capacity: 64,
            reconnect_delay_ms: 1000,
        }
    }
}

impl MqttConfig {
    /// # Errors
    ///
    /// Returns [`MqttError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), MqttError> {
        if self.broker_host.trim().is_empty() {
            return Err(MqttError::InvalidConfig("broker_host must not be empty"));
        }
        if self.broker_port == 0 {
            return Err(MqttError::InvalidConfig("broker_port must not be zero"));
        }
        if self.client_id.trim().is_empty() {
            return Err(MqttError::InvalidConfig("client_id must not be empty"));
        }
        if self.keep_alive_secs < MIN_KEEP_ALIVE_SECS {
            return Err(MqttError::InvalidConfig("keep_alive_secs must be at least 5"));
        }
        if self.channel_capacity == 0 {
            return Err(MqttError::InvalidConfig("channel_capacity must not be zero"));
        }
        Ok(())
    }

    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub(crate) fn options(&self) -> rumqttc::MqttOptions {
        let mut options =
            rumqttc::MqttOptions::new(&self.client_id, &self.broker_host, self.broker_port);
        options.set_keep_alive(Duration::from_secs(u64::from(self.keep_alive_secs)));
        if let Some(username) = &self.username {
            options.set_credentials(username, self.password.as_deref().unwrap_or_default());
        }
        options
    }
}
