//! Feeds transport events into the bridge, one at a time.

use std::sync::Arc;

use tokio::sync::mpsc;

use habridge_adapter_mqtt::TransportEvent;
use habridge_app::bridge::Bridge;
use habridge_app::outcome::InboundOutcome;
use habridge_app::ports::{AttributeStore, ObjectModel, Transport};

/// Drain `events` until every sender is gone.
///
/// A reconnection re-issues every subscription, since a clean session drops
/// them broker-side.
pub async fn run<T, O, S>(
    bridge: Arc<Bridge<T, O, S>>,
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
)
where
    T: Transport + Send + Sync,
    O: ObjectModel + Send + Sync,
    S: AttributeStore + Send + Sync,
{
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Connected => {
                if let Err(err) = bridge.resubscribe().await {
                    tracing::warn!(error = %err, "resubscribe after reconnect failed");
                }
            }
            TransportEvent::Message(message) => match bridge.handle_message(message).await {
                InboundOutcome::Discovered { id, created, .. } => {
                    tracing::info!(%id, created, "entity discovered");
                }
                InboundOutcome::Routed { updated } => {
                    tracing::trace!(updated, "telemetry routed");
                }
                InboundOutcome::Ignored(reason) => {
                    tracing::debug!(?reason, "message ignored");
                }
                InboundOutcome::Failed(err) => {
                    tracing::warn!(error = %err, "announcement not applied");
                }
            },
        }
    }
    tracing::debug!("transport event stream closed");
}
