//! Bridge services: the discovery/state/command use-cases.
//!
//! Each service holds the port implementations it needs (constructor
//! injection) and receives the registry from the caller, which is
//! responsible for serializing access to it.

pub mod command_dispatcher;
pub mod discovery;
pub mod materializer;
pub mod state_router;
