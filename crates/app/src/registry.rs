//! Entity registry: the bridge's source of truth for what is known.
//!
//! Records are keyed by their unique id. A secondary index maps each state
//! topic to the ids listening on it, so telemetry routing does not scan the
//! whole registry. The persisted form is a JSON object `id → record`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use habridge_domain::entity::EntityRecord;

/// Name of the attribute holding the serialized registry.
pub const ENTITY_MAP_ATTRIBUTE: &str = "entity_map";

/// In-memory registry of entity records.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    records: BTreeMap<String, EntityRecord>,
    by_state_topic: HashMap<String, BTreeSet<String>>,
}

impl EntityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from its persisted JSON form.
    ///
    /// The map key wins over a record's own `id` field if they disagree.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when `json` is not a valid entity map.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let map: BTreeMap<String, EntityRecord> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for (id, mut record) in map {
            record.id = id;
            registry.insert(record);
        }
        Ok(registry)
    }

    /// Serialize to the persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if a record cannot be serialized.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.records)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&EntityRecord> {
        self.records.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records.values()
    }

    /// Insert or replace a record, returning the previous one.
    pub fn insert(&mut self, record: EntityRecord) -> Option<EntityRecord> {
        let previous = self.remove(&record.id);
        if let Some(topic) = &record.state_topic {
            self.by_state_topic
                .entry(topic.clone())
                .or_default()
                .insert(record.id.clone());
        }
        self.records.insert(record.id.clone(), record);
        previous
    }

    /// Remove a record, returning it.
    pub fn remove(&mut self, id: &str) -> Option<EntityRecord> {
        let record = self.records.remove(id)?;
        if let Some(topic) = &record.state_topic
            && let Some(ids) = self.by_state_topic.get_mut(topic)
        {
            ids.remove(id);
            if ids.is_empty() {
                self.by_state_topic.remove(topic);
            }
        }
        Some(record)
    }

    /// Every record whose state topic equals `topic`.
    pub fn by_state_topic<'a>(&'a self, topic: &str) -> impl Iterator<Item = &'a EntityRecord> {
        self.by_state_topic
            .get(topic)
            .into_iter()
            .flatten()
            .filter_map(|id| self.records.get(id))
    }

    /// Distinct state topics of all known records.
    pub fn state_topics(&self) -> impl Iterator<Item = &str> {
        self.by_state_topic.keys().map(String::as_str)
    }
}
