//! In-memory port fakes shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use habridge_domain::device_class::DisplayProfile;
use habridge_domain::error::BridgeError;
use habridge_domain::id::{CategoryId, ObjectId};
use habridge_domain::message::{PublishRequest, SubscribeRequest};
use habridge_domain::value::{Value, ValueKind};

use crate::ports::{AttributeStore, ObjectModel, Transport, VariableSpec};

fn fake_failure(what: &str) -> BridgeError {
    BridgeError::Storage(Box::new(std::io::Error::other(format!("{what} failed"))))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub ident: String,
    pub category: CategoryId,
    pub kind: ValueKind,
    pub profile: DisplayProfile,
    pub name: String,
    pub writable: bool,
    pub value: Option<Value>,
}

#[derive(Default)]
pub struct InMemoryObjectModel {
    categories: Mutex<HashMap<String, (CategoryId, String)>>,
    variables: Mutex<HashMap<ObjectId, Variable>>,
    failing: AtomicBool,
}

impl InMemoryObjectModel {
    pub fn fail_next_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn variable(&self, id: ObjectId) -> Option<Variable> {
        self.variables.lock().unwrap().get(&id).cloned()
    }

    pub fn value(&self, id: ObjectId) -> Option<Value> {
        self.variable(id).and_then(|v| v.value)
    }

    pub fn variable_count(&self) -> usize {
        self.variables.lock().unwrap().len()
    }

    pub fn category_count(&self) -> usize {
        self.categories.lock().unwrap().len()
    }

    pub fn category_name(&self, id: CategoryId) -> Option<String> {
        self.categories
            .lock()
            .unwrap()
            .values()
            .find(|(cid, _)| *cid == id)
            .map(|(_, name)| name.clone())
    }

    fn check(&self, what: &str) -> Result<(), BridgeError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(fake_failure(what));
        }
        Ok(())
    }

    fn with_variable(
        &self,
        id: ObjectId,
        f: impl FnOnce(&mut Variable),
    ) -> Result<(), BridgeError> {
        let mut variables = self.variables.lock().unwrap();
        let var = variables
            .get_mut(&id)
            .ok_or_else(|| fake_failure("variable lookup"))?;
        f(var);
        Ok(())
    }
}

impl ObjectModel for InMemoryObjectModel {
    async fn ensure_category(&self, ident: &str, name: &str) -> Result<CategoryId, BridgeError> {
        self.check("ensure_category")?;
        let mut categories = self.categories.lock().unwrap();
        let (id, _) = categories
            .entry(ident.to_string())
            .or_insert_with(|| (CategoryId::new(), name.to_string()));
        Ok(*id)
    }

    async fn ensure_variable(&self, spec: VariableSpec) -> Result<ObjectId, BridgeError> {
        self.check("ensure_variable")?;
        let mut variables = self.variables.lock().unwrap();
        if let Some((id, var)) = variables.iter_mut().find(|(_, v)| v.ident == spec.ident) {
            var.category = spec.category;
            var.kind = spec.kind;
            var.profile = spec.profile;
            return Ok(*id);
        }
        let id = ObjectId::new();
        variables.insert(
            id,
            Variable {
                name: spec.ident.clone(),
                ident: spec.ident,
                category: spec.category,
                kind: spec.kind,
                profile: spec.profile,
                writable: false,
                value: None,
            },
        );
        Ok(id)
    }

    async fn set_display_name(&self, id: ObjectId, name: &str) -> Result<(), BridgeError> {
        self.check("set_display_name")?;
        self.with_variable(id, |var| var.name = name.to_string())
    }

    async fn set_write_action(&self, id: ObjectId, enabled: bool) -> Result<(), BridgeError> {
        self.check("set_write_action")?;
        self.with_variable(id, |var| var.writable = enabled)
    }

    async fn set_value(&self, id: ObjectId, value: Value) -> Result<(), BridgeError> {
        self.check("set_value")?;
        self.with_variable(id, |var| var.value = Some(value))
    }

    async fn get_value(&self, id: ObjectId) -> Result<Option<Value>, BridgeError> {
        Ok(self.value(id))
    }
}

#[derive(Default)]
pub struct RecordingTransport {
    pub subscriptions: Mutex<Vec<SubscribeRequest>>,
    pub published: Mutex<Vec<PublishRequest>>,
    failing: AtomicBool,
    refusing: AtomicBool,
}

impl RecordingTransport {
    pub fn fail_publishes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn refuse_subscriptions(&self) {
        self.refusing.store(true, Ordering::SeqCst);
    }

    pub fn subscribed_filters(&self) -> Vec<String> {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.topic_filter.clone())
            .collect()
    }

    pub fn published(&self) -> Vec<PublishRequest> {
        self.published.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    async fn subscribe(&self, request: SubscribeRequest) -> Result<(), BridgeError> {
        if self.refusing.load(Ordering::SeqCst) {
            return Err(BridgeError::Transport(Box::new(std::io::Error::other(
                "subscription refused",
            ))));
        }
        self.subscriptions.lock().unwrap().push(request);
        Ok(())
    }

    async fn publish(&self, request: PublishRequest) -> Result<(), BridgeError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BridgeError::Transport(Box::new(std::io::Error::other(
                "broker unreachable",
            ))));
        }
        self.published.lock().unwrap().push(request);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAttributeStore {
    attributes: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl InMemoryAttributeStore {
    pub fn with_attribute(name: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .attributes
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
        store
    }

    pub fn fail_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.lock().unwrap().get(name).cloned()
    }
}

impl AttributeStore for InMemoryAttributeStore {
    async fn read_attribute(&self, name: &str) -> Result<Option<String>, BridgeError> {
        Ok(self.attribute(name))
    }

    async fn write_attribute(&self, name: &str, value: String) -> Result<(), BridgeError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(fake_failure("write_attribute"));
        }
        self.attributes
            .lock()
            .unwrap()
            .insert(name.to_string(), value);
        Ok(())
    }
}
