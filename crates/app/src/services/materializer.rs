//! Device materializer: turns an entity record into a typed local variable.

use std::sync::Arc;

use habridge_domain::device_class::DeviceClass;
use habridge_domain::entity::EntityRecord;
use habridge_domain::error::BridgeError;
use habridge_domain::id::ObjectId;

use crate::ports::{ObjectModel, VariableSpec};

/// Creates or updates the local object backing an entity record.
pub struct DeviceMaterializer<O> {
    objects: Arc<O>,
}

impl<O: ObjectModel + Send + Sync> DeviceMaterializer<O> {
    /// Create a new materializer backed by the given object model.
    pub fn new(objects: Arc<O>) -> Self {
        Self { objects }
    }

    /// Ensure the local variable for `record` exists with the type and
    /// profile of its class, under the category of its class, carrying its
    /// display name. Controllable classes get their write action enabled.
    ///
    /// Idempotent: the variable is keyed by the entity id, so repeated calls
    /// return the same handle.
    ///
    /// # Errors
    ///
    /// Any object-model failure is reported as
    /// [`BridgeError::MaterializationFailed`].
    #[tracing::instrument(skip(self, record), fields(entity_id = %record.id, class = %record.device_class))]
    pub async fn materialize(&self, record: &EntityRecord) -> Result<ObjectId, BridgeError> {
        self.try_materialize(record)
            .await
            .map_err(|err| match err {
                BridgeError::MaterializationFailed(_) => err,
                other => BridgeError::MaterializationFailed(Box::new(other)),
            })
    }

    async fn try_materialize(&self, record: &EntityRecord) -> Result<ObjectId, BridgeError> {
        let class = &record.device_class;
        let category = self
            .objects
            .ensure_category(class.as_str(), &category_name(class))
            .await?;

        let id = self
            .objects
            .ensure_variable(VariableSpec {
                ident: record.id.clone(),
                category,
                kind: record.value_kind(),
                profile: record.display_profile(),
            })
            .await?;

        self.objects
            .set_display_name(id, &record.display_name)
            .await?;
        self.objects
            .set_write_action(id, record.is_controllable())
            .await?;

        tracing::debug!(local_ref = %id, "entity materialized");
        Ok(id)
    }
}

/// Human label of a class category: `binary_sensor` → `Binary sensor`.
fn category_name(class: &DeviceClass) -> String {
    let spaced = class.as_str().replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
