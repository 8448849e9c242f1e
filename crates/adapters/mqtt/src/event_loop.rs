//! Inbound half of the broker connection.

use std::time::Duration;

use tokio::sync::mpsc;

use habridge_domain::message::InboundMessage;

/// Something the bridge must react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The broker accepted a (re)connection; subscriptions must be re-issued.
    Connected,
    /// A message arrived on a subscribed topic.
    Message(InboundMessage),
}

/// Drives the rumqttc event loop and forwards what matters.
pub struct MqttEventLoop {
    event_loop: rumqttc::EventLoop,
    reconnect_delay: Duration,
}

impl MqttEventLoop {
    pub(crate) fn new(event_loop: rumqttc::EventLoop, reconnect_delay: Duration) -> Self {
        Self {
            event_loop,
            reconnect_delay,
        }
    }

    /// Poll the connection until `events` is closed.
    ///
    /// Queued subscribe and publish requests only reach the broker while this
    /// loop polls, so forwarding never waits on the consumer. Connection
    /// errors are logged and retried after the reconnect delay; rumqttc
    /// reconnects on the next poll.
    pub async fn run(mut self, events: mpsc::UnboundedSender<TransportEvent>) {
        loop {
            match self.event_loop.poll().await {
                Ok(event) => {
                    let Some(event) = translate(event) else {
                        continue;
                    };
                    if events.send(event).is_err() {
                        tracing::debug!("event receiver dropped, stopping MQTT event loop");
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "MQTT connection error");
                    tokio::time::sleep(self.reconnect_delay).await;
                }
            }
        }
    }
}

/// Keep connection acknowledgements and UTF-8 publishes, drop the rest.
fn translate(event: rumqttc::Event) -> Option<TransportEvent> {
    match event {
        rumqttc::Event::Incoming(rumqttc::Packet::ConnAck(_)) => {
            tracing::info!("MQTT connection acknowledged");
            Some(TransportEvent::Connected)
        }
        rumqttc::Event::Incoming(rumqttc::Packet::Publish(publish)) => {
            let topic = publish.topic.to_string();
            match String::from_utf8(publish.payload.to_vec()) {
                Ok(payload) => Some(TransportEvent::Message(InboundMessage::new(topic, payload))),
                Err(_) => {
                    tracing::debug!(%topic, "non UTF-8 payload dropped");
                    None
                }
            }
        }
        _ => None,
    }
}
