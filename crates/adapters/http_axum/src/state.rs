//! Shared application state for axum handlers.

use std::sync::Arc;

use habridge_app::bridge::Bridge;

/// Application state shared across all axum handlers.
///
/// `Clone` is implemented manually so the port types themselves do not need
/// to be `Clone`; only the `Arc` is cloned.
pub struct AppState<T, O, S> {
    pub bridge: Arc<Bridge<T, O, S>>,
}

impl<T, O, S> Clone for AppState<T, O, S> {
    fn clone(&self) -> Self {
        Self {
            bridge: Arc::clone(&self.bridge),
        }
    }
}

impl<T, O, S> AppState<T, O, S> {
    /// Wrap a bridge that is also driven by the transport pump.
    pub fn new(bridge: Arc<Bridge<T, O, S>>) -> Self {
        Self { bridge }
    }
}
