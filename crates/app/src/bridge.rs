//! The bridge entry point.
//!
//! [`Bridge`] owns the registry and the active configuration behind one async
//! mutex. Every inbound message and every write request holds that lock for
//! its whole read-modify-write, so callbacks never interleave.

use std::sync::Arc;

use tokio::sync::Mutex;

use habridge_domain::discovery::TopicKind;
use habridge_domain::entity::EntityRecord;
use habridge_domain::error::{BridgeError, UnknownEntityError};
use habridge_domain::message::{InboundMessage, Qos, SubscribeRequest};
use habridge_domain::value::Value;

use crate::config::BridgeConfig;
use crate::outcome::InboundOutcome;
use crate::ports::{AttributeStore, ObjectModel, Transport};
use crate::registry::{ENTITY_MAP_ATTRIBUTE, EntityRegistry};
use crate::services::command_dispatcher::CommandDispatcher;
use crate::services::discovery::DiscoveryHandler;
use crate::services::state_router::StateRouter;

struct BridgeState {
    config: BridgeConfig,
    registry: EntityRegistry,
}

/// Discovery/state/command bridge between the bus and the host object model.
pub struct Bridge<T, O, S> {
    state: Mutex<BridgeState>,
    transport: Arc<T>,
    objects: Arc<O>,
    store: Arc<S>,
    discovery: DiscoveryHandler<T, O, S>,
    router: StateRouter<O>,
    dispatcher: CommandDispatcher<T, O>,
}

impl<T, O, S> Bridge<T, O, S>
where
    T: Transport + Send + Sync,
    O: ObjectModel + Send + Sync,
    S: AttributeStore + Send + Sync,
{
    /// Create a bridge with an empty registry. Call [`Bridge::start`] to load
    /// the persisted registry and subscribe.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] when `config` is invalid.
    pub fn new(
        config: BridgeConfig,
        transport: Arc<T>,
        objects: Arc<O>,
        store: Arc<S>,
    ) -> Result<Self, BridgeError> {
        config.validate()?;
        Ok(Self {
            discovery: DiscoveryHandler::new(
                Arc::clone(&transport),
                Arc::clone(&objects),
                Arc::clone(&store),
            ),
            router: StateRouter::new(Arc::clone(&objects)),
            dispatcher: CommandDispatcher::new(Arc::clone(&transport), Arc::clone(&objects)),
            state: Mutex::new(BridgeState {
                config,
                registry: EntityRegistry::new(),
            }),
            transport,
            objects,
            store,
        })
    }

    /// Load the persisted registry, then subscribe to discovery and to every
    /// known state topic. Returns the number of loaded entities.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Storage`] when the persisted registry cannot be
    /// read or decoded, and [`BridgeError::Transport`] when a subscription
    /// is refused.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) -> Result<usize, BridgeError> {
        let mut state = self.state.lock().await;
        state.registry = self.load_registry().await?;
        let count = state.registry.len();
        tracing::info!(entities = count, "registry loaded");
        self.subscribe_all(&state.config, &state.registry).await?;
        Ok(count)
    }

    /// Replace the configuration, reload the registry and re-subscribe.
    ///
    /// Nothing changes unless the reload and every subscription succeed.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] when `config` is invalid,
    /// otherwise as [`Bridge::start`]. The active configuration is kept in
    /// both cases.
    #[tracing::instrument(skip(self, config), fields(base_topic = %config.base_topic))]
    pub async fn reconfigure(&self, config: BridgeConfig) -> Result<usize, BridgeError> {
        config.validate()?;
        let mut state = self.state.lock().await;
        let registry = self.load_registry().await?;
        self.subscribe_all(&config, &registry).await?;
        let count = registry.len();
        state.config = config;
        state.registry = registry;
        tracing::info!(entities = count, "bridge reconfigured");
        Ok(count)
    }

    /// Re-issue every subscription, e.g. after the transport reconnected.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Transport`] when a subscription is refused.
    pub async fn resubscribe(&self) -> Result<(), BridgeError> {
        let state = self.state.lock().await;
        self.subscribe_all(&state.config, &state.registry).await
    }

    /// Handle one inbound message: discovery announcements first, everything
    /// else as telemetry. Never fails; the outcome says what happened.
    #[tracing::instrument(skip(self, message), fields(topic = %message.topic))]
    pub async fn handle_message(&self, message: InboundMessage) -> InboundOutcome {
        let mut guard = self.state.lock().await;
        let BridgeState { config, registry } = &mut *guard;

        match TopicKind::classify(config.base(), &message.topic) {
            TopicKind::Discovery(topic) => {
                match self
                    .discovery
                    .handle(registry, config, &topic, &message.payload)
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        tracing::warn!(error = %err, "discovery aborted");
                        InboundOutcome::Failed(err)
                    }
                }
            }
            TopicKind::Telemetry => self.router.route(registry, &message).await,
        }
    }

    /// Local write request for entity `id`.
    ///
    /// # Errors
    ///
    /// See [`CommandDispatcher::dispatch`].
    pub async fn write(&self, id: &str, value: Value) -> Result<(), BridgeError> {
        let state = self.state.lock().await;
        self.dispatcher
            .dispatch(&state.registry, &state.config, id, value)
            .await?;
        Ok(())
    }

    /// Snapshot of every known record, ordered by id.
    pub async fn entities(&self) -> Vec<EntityRecord> {
        let state = self.state.lock().await;
        state.registry.iter().cloned().collect()
    }

    /// Snapshot of one record.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnknownEntity`] when `id` is not registered.
    pub async fn entity(&self, id: &str) -> Result<EntityRecord, BridgeError> {
        let state = self.state.lock().await;
        state
            .registry
            .get(id)
            .cloned()
            .ok_or_else(|| UnknownEntityError { id: id.to_string() }.into())
    }

    /// Current local value of entity `id`, if any was ever written.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnknownEntity`] when `id` is not registered, or
    /// the object model's error when the value cannot be read.
    pub async fn current_value(&self, id: &str) -> Result<Option<Value>, BridgeError> {
        let record = self.entity(id).await?;
        match record.local_ref {
            Some(local_ref) => self.objects.get_value(local_ref).await,
            None => Ok(None),
        }
    }

    /// The active configuration.
    pub async fn config(&self) -> BridgeConfig {
        self.state.lock().await.config.clone()
    }

    async fn load_registry(&self) -> Result<EntityRegistry, BridgeError> {
        match self.store.read_attribute(ENTITY_MAP_ATTRIBUTE).await? {
            Some(json) => {
                EntityRegistry::from_json(&json).map_err(|err| BridgeError::Storage(Box::new(err)))
            }
            None => Ok(EntityRegistry::new()),
        }
    }

    async fn subscribe_all(
        &self,
        config: &BridgeConfig,
        registry: &EntityRegistry,
    ) -> Result<(), BridgeError> {
        let filters = config.discovery_filters();
        let topics = registry.state_topics().map(str::to_string);
        let mut count = 0_usize;
        for topic_filter in filters.into_iter().chain(topics) {
            self.transport
                .subscribe(SubscribeRequest {
                    topic_filter,
                    qos: Qos::AtMostOnce,
                })
                .await?;
            count += 1;
        }
        tracing::debug!(subscriptions = count, "subscribed");
        Ok(())
    }
}
