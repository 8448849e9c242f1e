//! # habridge-adapter-mqtt
//!
//! MQTT adapter: the bridge's [`Transport`](habridge_app::ports::Transport)
//! over a rumqttc client.
//!
//! ## Responsibilities
//! - Connect to the broker with the configured identity and credentials
//! - Queue subscribe and publish requests from the bridge
//! - Drive the connection and forward inbound publishes and (re)connections
//!   as [`TransportEvent`]s
//!
//! ## Dependency rule
//! Same as other adapters: depends on `habridge-app` and `habridge-domain`.

pub mod config;
pub mod error;
pub mod event_loop;
pub mod transport;

pub use config::MqttConfig;
pub use error::MqttError;
pub use event_loop::{MqttEventLoop, TransportEvent};
pub use transport::MqttTransport;
