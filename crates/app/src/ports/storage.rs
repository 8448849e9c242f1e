//! Storage port: durable named attributes of the bridge instance.

use std::future::Future;
use std::sync::Arc;

use habridge_domain::error::BridgeError;

/// Key/value attribute storage scoped to one bridge instance.
pub trait AttributeStore {
    /// Read an attribute, `None` when it was never written.
    fn read_attribute(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, BridgeError>> + Send;

    /// Write (insert or replace) an attribute.
    fn write_attribute(
        &self,
        name: &str,
        value: String,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

impl<T: AttributeStore + Send + Sync> AttributeStore for Arc<T> {
    fn read_attribute(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, BridgeError>> + Send {
        (**self).read_attribute(name)
    }

    fn write_attribute(
        &self,
        name: &str,
        value: String,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).write_attribute(name, value)
    }
}
