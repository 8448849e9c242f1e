//! # habridge-app
//!
//! Application layer - the discovery/state/command bridge and the **port
//! definitions** (traits) it drives.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Transport` - subscribe/publish on the message bus
//!   - `ObjectModel` - the host's categories and typed variables
//!   - `AttributeStore` - durable named attributes of the bridge instance
//! - Keep the **entity registry** (id → record, plus a state-topic index)
//! - Implement the bridge services:
//!   - `DiscoveryHandler` - announcement → record → local object → subscription
//!   - `DeviceMaterializer` - record → typed local variable
//!   - `StateRouter` - telemetry → coerced local value
//!   - `CommandDispatcher` - local write → command payload on the bus
//! - Expose the [`bridge::Bridge`] entry point that serializes callbacks
//!
//! ## Dependency rule
//! Depends on `habridge-domain` only (plus `tokio::sync` for the callback lock).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod bridge;
pub mod config;
pub mod outcome;
pub mod ports;
pub mod registry;
pub mod services;

#[cfg(test)]
mod test_support;
