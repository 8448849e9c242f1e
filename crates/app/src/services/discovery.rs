//! Discovery handler: announcement to record, local object and subscription.

use std::sync::Arc;

use habridge_domain::discovery::{Announcement, DiscoveryTopic};
use habridge_domain::entity::EntityRecord;
use habridge_domain::error::BridgeError;
use habridge_domain::message::{Qos, SubscribeRequest};
use habridge_domain::time::now;

use crate::config::BridgeConfig;
use crate::outcome::{Ignored, InboundOutcome};
use crate::ports::{AttributeStore, ObjectModel, Transport};
use crate::registry::{ENTITY_MAP_ATTRIBUTE, EntityRegistry};
use crate::services::materializer::DeviceMaterializer;

/// Consumes discovery announcements and keeps the registry in sync.
pub struct DiscoveryHandler<T, O, S> {
    transport: Arc<T>,
    materializer: DeviceMaterializer<O>,
    store: Arc<S>,
}

impl<T, O, S> DiscoveryHandler<T, O, S>
where
    T: Transport + Send + Sync,
    O: ObjectModel + Send + Sync,
    S: AttributeStore + Send + Sync,
{
    /// Create a new handler from its collaborating ports.
    pub fn new(transport: Arc<T>, objects: Arc<O>, store: Arc<S>) -> Self {
        Self {
            transport,
            materializer: DeviceMaterializer::new(objects),
            store,
        }
    }

    /// Handle one announcement received on a discovery topic.
    ///
    /// Malformed bodies and non-whitelisted classes are ignored. Otherwise the
    /// announcement is merged into the existing record (or defaults), the
    /// local object is materialized, the state topic subscribed and the
    /// registry persisted. On failure the registry is left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MaterializationFailed`] when the local object
    /// cannot be created, or a storage error when persisting fails.
    #[tracing::instrument(skip(self, registry, config, body), fields(class = %topic.device_class, slug = %topic.object_slug))]
    pub async fn handle(
        &self,
        registry: &mut EntityRegistry,
        config: &BridgeConfig,
        topic: &DiscoveryTopic,
        body: &str,
    ) -> Result<InboundOutcome, BridgeError> {
        if !config.allows(&topic.device_class) {
            tracing::debug!("device class not whitelisted, announcement ignored");
            return Ok(InboundOutcome::Ignored(Ignored::ClassNotAllowed(
                topic.device_class.clone(),
            )));
        }

        let announcement = match Announcement::parse(body) {
            Ok(announcement) => announcement,
            Err(err) => {
                tracing::debug!(error = %err, "malformed announcement ignored");
                return Ok(InboundOutcome::Ignored(Ignored::MalformedAnnouncement(err)));
            }
        };

        let at = now();
        let (mut record, created) = match registry.get(&announcement.unique_id) {
            Some(existing) => {
                let mut record = existing.clone();
                if record.merge(topic, &announcement, at) {
                    tracing::info!(
                        entity_id = %record.id,
                        class = %record.device_class,
                        "device class changed, re-materializing"
                    );
                }
                (record, false)
            }
            None => (EntityRecord::from_announcement(topic, &announcement, at), true),
        };

        let local_ref = self.materializer.materialize(&record).await?;
        record.local_ref = Some(local_ref);

        if let Some(state_topic) = &record.state_topic {
            let request = SubscribeRequest {
                topic_filter: state_topic.clone(),
                qos: Qos::AtMostOnce,
            };
            if let Err(err) = self.transport.subscribe(request).await {
                tracing::warn!(error = %err, topic = %state_topic, "state topic subscription failed");
            }
        }

        let id = record.id.clone();
        let previous = registry.insert(record);
        if let Err(err) = self.persist(registry).await {
            registry.remove(&id);
            if let Some(previous) = previous {
                registry.insert(previous);
            }
            return Err(err);
        }

        tracing::info!(entity_id = %id, %local_ref, created, "entity registered");
        Ok(InboundOutcome::Discovered {
            id,
            local_ref,
            created,
        })
    }

    async fn persist(&self, registry: &EntityRegistry) -> Result<(), BridgeError> {
        let json = registry
            .to_json()
            .map_err(|err| BridgeError::Storage(Box::new(err)))?;
        self.store.write_attribute(ENTITY_MAP_ATTRIBUTE, json).await
    }
}
