//! Minimal port fakes backing a real bridge in handler tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use habridge_app::bridge::Bridge;
use habridge_app::config::BridgeConfig;
use habridge_app::ports::{AttributeStore, ObjectModel, Transport, VariableSpec};
use habridge_domain::error::BridgeError;
use habridge_domain::id::{CategoryId, ObjectId};
use habridge_domain::message::{PublishRequest, SubscribeRequest};
use habridge_domain::value::Value;

#[derive(Default)]
pub struct StubTransport {
    published: Mutex<Vec<PublishRequest>>,
    failing: AtomicBool,
}

impl StubTransport {
    pub fn published(&self) -> Vec<PublishRequest> {
        self.published.lock().unwrap().clone()
    }

    pub fn fail_publishes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

impl Transport for StubTransport {
    async fn subscribe(&self, _request: SubscribeRequest) -> Result<(), BridgeError> {
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
pub struct StubObjectModel {
    idents: Mutex<HashMap<String, ObjectId>>,
    values: Mutex<HashMap<ObjectId, Value>>,
}

impl ObjectModel for StubObjectModel {
    async fn ensure_category(&self, _ident: &str, _name: &str) -> Result<CategoryId, BridgeError> {
        Ok(CategoryId::new())
    }

    async fn ensure_variable(&self, spec: VariableSpec) -> Result<ObjectId, BridgeError> {
        let mut idents = self.idents.lock().unwrap();
        Ok(*idents.entry(spec.ident).or_default())
    }

    async fn set_display_name(&self, _id: ObjectId, _name: &str) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn set_write_action(&self, _id: ObjectId, _enabled: bool) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn set_value(&self, id: ObjectId, value: Value) -> Result<(), BridgeError> {
        self.values.lock().unwrap().insert(id, value);
        Ok(())
    }

    async fn get_value(&self, id: ObjectId) -> Result<Option<Value>, BridgeError> {
        Ok(self.values.lock().unwrap().get(&id).cloned())
    }
}

#[derive(Default)]
pub struct StubStore {
    attributes: Mutex<HashMap<String, String>>,
}

impl AttributeStore for StubStore {
    async fn read_attribute(&self, name: &str) -> Result<Option<String>, BridgeError> {
        Ok(self.attributes.lock().unwrap().get(name).cloned())
    }

    async fn write_attribute(&self, name: &str, value: String) -> Result<(), BridgeError> {
        self.attributes
            .lock()
            .unwrap()
            .insert(name.to_string(), value);
        Ok(())
    }
}

pub type TestState = crate::state::AppState<StubTransport, StubObjectModel, StubStore>;

pub fn test_state() -> (TestState, Arc<StubTransport>) {
    let transport = Arc::new(StubTransport::default());
    let bridge = Bridge::new(
        BridgeConfig::default(),
        Arc::clone(&transport),
        Arc::new(StubObjectModel::default()),
        Arc::new(StubStore::default()),
    )
    .unwrap();
    (crate::state::AppState::new(Arc::new(bridge)), transport)
}
