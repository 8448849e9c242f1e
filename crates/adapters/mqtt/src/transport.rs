//! [`Transport`] implementation over a rumqttc client.

use habridge_app::ports::Transport;
use habridge_domain::error::BridgeError;
use habridge_domain::message::{PublishRequest, Qos, SubscribeRequest};

use crate::config::MqttConfig;
use crate::error::MqttError;
use crate::event_loop::MqttEventLoop;

/// Outbound half of the broker connection.
///
/// Requests are queued on the client channel; they only reach the broker
/// while the paired [`MqttEventLoop`] is being driven.
#[derive(Clone)]
pub struct MqttTransport {
    client: rumqttc::AsyncClient,
}

impl MqttTransport {
    /// Build the client and its event loop. Nothing touches the network
    /// until the event loop runs.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::InvalidConfig`] when `config` is invalid.
    pub fn new(config: &MqttConfig) -> Result<(Self, MqttEventLoop), MqttError> {
        config.validate()?;
        let (client, event_loop) =
            rumqttc::AsyncClient::new(config.options(), config.channel_capacity);
        tracing::info!(
            broker = %config.broker_host,
            port = config.broker_port,
            client_id = %config.client_id,
            "MQTT client created"
        );
        Ok((
            Self { client },
            MqttEventLoop::new(event_loop, config.reconnect_delay()),
        ))
    }

    /// Ask the broker to close the session.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::Client`] when the request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), MqttError> {
        self.client.disconnect().await.map_err(MqttError::Client)
    }
}

impl Transport for MqttTransport {
    async fn subscribe(&self, request: SubscribeRequest) -> Result<(), BridgeError> {
        tracing::debug!(filter = %request.topic_filter, "subscribing");
        self.client
            .subscribe(request.topic_filter, qos(request.qos))
            .await
            .map_err(MqttError::Client)?;
        Ok(())
    }

    async fn publish(&self, request: PublishRequest) -> Result<(), BridgeError> {
        tracing::debug!(topic = %request.topic, retain = request.retain, "publishing");
        self.client
            .publish(
                request.topic,
                qos(request.qos),
                request.retain,
                request.payload.into_bytes(),
            )
            .await
            .map_err(MqttError::Client)?;
        Ok(())
    }
}

fn qos(qos: Qos) -> rumqttc::QoS {
    match qos {
        Qos::AtMostOnce => rumqttc::QoS::AtMostOnce,
        Qos::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
        Qos::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_qos_levels() {
        assert_eq!(qos(Qos::AtMostOnce), rumqttc::QoS::AtMostOnce);
        assert_eq!(qos(Qos::AtLeastOnce), rumqttc::QoS::AtLeastOnce);
        assert_eq!(qos(Qos::ExactlyOnce), rumqttc::QoS::ExactlyOnce);
    }

    #[test]
    fn should_refuse_invalid_config() {
        let config = MqttConfig {
            client_id: String::new(),
            ..MqttConfig::default()
        };
        assert!(matches!(
            MqttTransport::new(&config),
            Err(MqttError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn should_queue_requests_without_a_broker() {
        let (transport, _event_loop) = MqttTransport::new(&MqttConfig::default()).unwrap();

        transport
            .subscribe(SubscribeRequest {
                topic_filter: "homeassistant/switch/+/config".to_string(),
                qos: Qos::AtMostOnce,
            })
            .await
            .unwrap();
        transport
            .publish(PublishRequest {
                topic: "c/plug1".to_string(),
                payload: "ON".to_string(),
                qos: Qos::AtMostOnce,
                retain: true,
            })
            .await
            .unwrap();
    }
}
