//! State router: telemetry payloads to typed local values.

use std::sync::Arc;

use habridge_domain::message::InboundMessage;

use crate::outcome::{Ignored, InboundOutcome};
use crate::ports::ObjectModel;
use crate::registry::EntityRegistry;

/// Writes telemetry into the local object of every matching entity.
pub struct StateRouter<O> {
    objects: Arc<O>,
}

impl<O: ObjectModel + Send + Sync> StateRouter<O> {
    pub fn new(objects: Arc<O>) -> Self {
        Self { objects }
    }

    /// Route one telemetry message.
    ///
    /// Every record whose state topic equals the message topic gets the
    /// payload coerced to its value kind and written to its local object.
    /// A failed write for one record is logged and does not stop the others.
    #[tracing::instrument(skip(self, registry, message), fields(topic = %message.topic))]
    pub async fn route(&self, registry: &EntityRegistry, message: &InboundMessage) -> InboundOutcome {
        let mut matched = 0_usize;
        let mut updated = 0_usize;

        for record in registry.by_state_topic(&message.topic) {
            matched += 1;
            let Some(local_ref) = record.local_ref else {
                tracing::warn!(entity_id = %record.id, "entity has no local object, state dropped");
                continue;
            };

            let value = record.coerce_state(&message.payload);
            tracing::debug!(entity_id = %record.id, %value, "applying state");
            match self.objects.set_value(local_ref, value).await {
                Ok(()) => updated += 1,
                Err(err) => {
                    tracing::warn!(entity_id = %record.id, error = %err, "failed to write state");
                }
            }
        }

        if matched == 0 {
            tracing::debug!("no entity listens on topic");
            return InboundOutcome::Ignored(Ignored::UnmatchedTelemetry);
        }
        InboundOutcome::Routed { updated }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use habridge_domain::device_class::DeviceClass;
    use habridge_domain::discovery::{Announcement, DiscoveryTopic};
    use habridge_domain::entity::EntityRecord;
    use habridge_domain::time::now;
    use habridge_domain::value::Value;

    use crate::services::materializer::DeviceMaterializer;
    use crate::test_support::InMemoryObjectModel;

    async fn register(
        registry: &mut EntityRegistry,
        objects: &Arc<InMemoryObjectModel>,
        class: DeviceClass,
        body: &str,
    ) -> EntityRecord {
        let topic = DiscoveryTopic {
            device_class: class,
            node_id: None,
            object_slug: "obj".to_string(),
        };
        let mut record =
            EntityRecord::from_announcement(&topic, &Announcement::parse(body).unwrap(), now());
        let local_ref = DeviceMaterializer::new(Arc::clone(objects))
            .materialize(&record)
            .await
            .unwrap();
        record.local_ref = Some(local_ref);
        registry.insert(record.clone());
        record
    }

    #[tokio::test]
    async fn should_coerce_on_payload_to_true() {
        let objects = Arc::new(InMemoryObjectModel::default());
        let mut registry = EntityRegistry::new();
        let rec = register(
            &mut registry,
            &objects,
            DeviceClass::Switch,
            r#"{"unique_id":"plug1","state_topic":"s/plug1"}"#,
        )
        .await;
        let router = StateRouter::new(Arc::clone(&objects));

        let outcome = router
            .route(&registry, &InboundMessage::new("s/plug1", "ON"))
            .await;
        assert!(matches!(outcome, InboundOutcome::Routed { updated: 1 }));
        assert_eq!(objects.value(rec.local_ref.unwrap()), Some(Value::Bool(true)));

        router
            .route(&registry, &InboundMessage::new("s/plug1", "garbage"))
            .await;
        assert_eq!(objects.value(rec.local_ref.unwrap()), Some(Value::Bool(false)));
    }

    #[tokio::test]
    async fn should_parse_numeric_sensor_payload() {
        let objects = Arc::new(InMemoryObjectModel::default());
        let mut registry = EntityRegistry::new();
        let rec = register(
            &mut registry,
            &objects,
            DeviceClass::Sensor,
            r#"{"unique_id":"t1","state_topic":"s/t1","unit_of_measurement":"°C"}"#,
        )
        .await;
        let router = StateRouter::new(Arc::clone(&objects));

        router
            .route(&registry, &InboundMessage::new("s/t1", "21.5"))
            .await;
        assert_eq!(objects.value(rec.local_ref.unwrap()), Some(Value::Number(21.5)));
    }

    #[tokio::test]
    async fn should_update_every_record_sharing_the_topic() {
        let objects = Arc::new(InMemoryObjectModel::default());
        let mut registry = EntityRegistry::new();
        let a = register(
            &mut registry,
            &objects,
            DeviceClass::Light,
            r#"{"unique_id":"a","state_topic":"shared"}"#,
        )
        .await;
        let b = register(
            &mut registry,
            &objects,
            DeviceClass::MediaPlayer,
            r#"{"unique_id":"b","state_topic":"shared"}"#,
        )
        .await;
        let router = StateRouter::new(Arc::clone(&objects));

        let outcome = router
            .route(&registry, &InboundMessage::new("shared", "ON"))
            .await;

        assert!(matches!(outcome, InboundOutcome::Routed { updated: 2 }));
        assert_eq!(objects.value(a.local_ref.unwrap()), Some(Value::Bool(true)));
        assert_eq!(
            objects.value(b.local_ref.unwrap()),
            Some(Value::Text("ON".to_string()))
        );
    }

    #[tokio::test]
    async fn should_skip_records_without_local_object() {
        let objects = Arc::new(InMemoryObjectModel::default());
        let mut registry = EntityRegistry::new();
        let topic = DiscoveryTopic {
            device_class: DeviceClass::Switch,
            node_id: None,
            object_slug: "orphan".to_string(),
        };
        let orphan = EntityRecord::from_announcement(
            &topic,
            &Announcement::parse(r#"{"unique_id":"orphan","state_topic":"shared"}"#).unwrap(),
            now(),
        );
        assert!(orphan.local_ref.is_none());
        registry.insert(orphan);
        let router = StateRouter::new(Arc::clone(&objects));

        let outcome = router
            .route(&registry, &InboundMessage::new("shared", "ON"))
            .await;
        assert!(matches!(outcome, InboundOutcome::Routed { updated: 0 }));
        assert_eq!(objects.variable_count(), 0);

        let linked = register(
            &mut registry,
            &objects,
            DeviceClass::Switch,
            r#"{"unique_id":"linked","state_topic":"shared"}"#,
        )
        .await;
        let outcome = router
            .route(&registry, &InboundMessage::new("shared", "ON"))
            .await;
        assert!(matches!(outcome, InboundOutcome::Routed { updated: 1 }));
        assert_eq!(objects.value(linked.local_ref.unwrap()), Some(Value::Bool(true)));
    }

    #[tokio::test]
    async fn should_ignore_unknown_topic() {
        let objects = Arc::new(InMemoryObjectModel::default());
        let registry = EntityRegistry::new();
        let router = StateRouter::new(Arc::clone(&objects));

        let outcome = router
            .route(&registry, &InboundMessage::new("nobody/listens", "1"))
            .await;
        assert!(matches!(
            outcome,
            InboundOutcome::Ignored(Ignored::UnmatchedTelemetry)
        ));
    }

    #[tokio::test]
    async fn should_report_zero_updates_when_writes_fail() {
        let objects = Arc::new(InMemoryObjectModel::default());
        let mut registry = EntityRegistry::new();
        register(
            &mut registry,
            &objects,
            DeviceClass::Switch,
            r#"{"unique_id":"plug1","state_topic":"s/plug1"}"#,
        )
        .await;
        objects.fail_next_writes();
        let router = StateRouter::new(Arc::clone(&objects));

        let outcome = router
            .route(&registry, &InboundMessage::new("s/plug1", "ON"))
            .await;
        assert!(matches!(outcome, InboundOutcome::Routed { updated: 0 }));
    }
}
