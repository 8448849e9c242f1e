//! MQTT adapter error types.

use habridge_domain::error::BridgeError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The configuration cannot produce a working client.
    #[error("invalid MQTT configuration: {0}")]
    InvalidConfig(&'static str),

    /// The rumqttc client refused a request.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),
}

impl From<MqttError> for BridgeError {
    fn from(err: MqttError) -> Self {
        BridgeError::Transport(Box::new(err))
    }
}
