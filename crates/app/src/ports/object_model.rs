//! Object-model port: the host's categories and typed variables.
//!
//! The host owns the local objects; the bridge only creates them, names
//! them, writes their values and flags the ones whose writes must be routed
//! back to the command dispatcher.

use std::future::Future;
use std::sync::Arc;

use habridge_domain::device_class::DisplayProfile;
use habridge_domain::error::BridgeError;
use habridge_domain::id::{CategoryId, ObjectId};
use habridge_domain::value::{Value, ValueKind};

/// Desired shape of a local variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSpec {
    /// Stable key of the variable (the entity id).
    pub ident: String,
    pub category: CategoryId,
    pub kind: ValueKind,
    pub profile: DisplayProfile,
}

/// Host object model operations used by the bridge.
pub trait ObjectModel {
    /// Return the category with `ident`, creating it (named `name`) if absent.
    fn ensure_category(
        &self,
        ident: &str,
        name: &str,
    ) -> impl Future<Output = Result<CategoryId, BridgeError>> + Send;

    /// Return the variable keyed by `spec.ident`, creating it if absent.
    ///
    /// An existing variable keeps its handle; its category, kind and profile
    /// are brought in line with `spec`.
    fn ensure_variable(
        &self,
        spec: VariableSpec,
    ) -> impl Future<Output = Result<ObjectId, BridgeError>> + Send;

    /// Set the human-readable name of a variable.
    fn set_display_name(
        &self,
        id: ObjectId,
        name: &str,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Enable or disable routing of host writes on this variable to the bridge.
    fn set_write_action(
        &self,
        id: ObjectId,
        enabled: bool,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Write the current value of a variable.
    fn set_value(
        &self,
        id: ObjectId,
        value: Value,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Read the current value of a variable, `None` if never written.
    fn get_value(
        &self,
        id: ObjectId,
    ) -> impl Future<Output = Result<Option<Value>, BridgeError>> + Send;
}

impl<T: ObjectModel + Send + Sync> ObjectModel for Arc<T> {
    fn ensure_category(
        &self,
        ident: &str,
        name: &str,
    ) -> impl Future<Output = Result<CategoryId, BridgeError>> + Send {
        (**self).ensure_category(ident, name)
    }

    fn ensure_variable(
        &self,
        spec: VariableSpec,
    ) -> impl Future<Output = Result<ObjectId, BridgeError>> + Send {
        (**self).ensure_variable(spec)
    }

    fn set_display_name(
        &self,
        id: ObjectId,
        name: &str,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).set_display_name(id, name)
    }

    fn set_write_action(
        &self,
        id: ObjectId,
        enabled: bool,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).set_write_action(id, enabled)
    }

    fn set_value(
        &self,
        id: ObjectId,
        value: Value,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).set_value(id, value)
    }

    fn get_value(
        &self,
        id: ObjectId,
    ) -> impl Future<Output = Result<Option<Value>, BridgeError>> + Send {
        (**self).get_value(id)
    }
}
