//! Command dispatcher: local write requests to command payloads on the bus.

use std::sync::Arc;

use habridge_domain::entity::Command;
use habridge_domain::error::{BridgeError, ReadOnlyEntityError, UnknownEntityError};
use habridge_domain::message::{PublishRequest, Qos};
use habridge_domain::value::Value;

use crate::config::BridgeConfig;
use crate::ports::{ObjectModel, Transport};
use crate::registry::EntityRegistry;

/// Turns local writes into outbound command publishes.
pub struct CommandDispatcher<T, O> {
    transport: Arc<T>,
    objects: Arc<O>,
}

impl<T, O> CommandDispatcher<T, O>
where
    T: Transport + Send + Sync,
    O: ObjectModel + Send + Sync,
{
    pub fn new(transport: Arc<T>, objects: Arc<O>) -> Self {
        Self { transport, objects }
    }

    /// Encode `value` for entity `id` and publish it on its command topic.
    ///
    /// When the entity's state and command topics coincide, the local value
    /// is updated right after a successful publish since no separate echo
    /// will arrive. Otherwise the local value only moves when the device
    /// reports back.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::UnknownEntity`] when `id` is not registered.
    /// - [`BridgeError::ReadOnlyEntity`] when the entity cannot be commanded.
    /// - [`BridgeError::Validation`] when `value` does not fit the entity.
    /// - [`BridgeError::CommandDeliveryFailed`] when the transport refuses
    ///   the publish.
    #[tracing::instrument(skip(self, registry, config), fields(entity_id = %id))]
    pub async fn dispatch(
        &self,
        registry: &EntityRegistry,
        config: &BridgeConfig,
        id: &str,
        value: Value,
    ) -> Result<Command, BridgeError> {
        let record = registry
            .get(id)
            .ok_or_else(|| UnknownEntityError { id: id.to_string() })?;
        let command = record.encode_command(&value)?;

        let Some(command_topic) = record.command_topic.clone() else {
            return Err(ReadOnlyEntityError { id: id.to_string() }.into());
        };

        let request = PublishRequest {
            topic: command_topic,
            payload: command.payload.clone(),
            qos: Qos::AtMostOnce,
            retain: config.publish_retain,
        };
        self.transport
            .publish(request)
            .await
            .map_err(|err| BridgeError::CommandDeliveryFailed(Box::new(err)))?;
        tracing::info!(payload = %command.payload, "command published");

        if record.is_optimistic()
            && let Some(local_ref) = record.local_ref
            && let Err(err) = self.objects.set_value(local_ref, command.value.clone()).await
        {
            tracing::warn!(error = %err, "optimistic local update failed");
        }

        Ok(command)
    }
}
