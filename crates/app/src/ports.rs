//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the bridge core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod object_model;
pub mod storage;
pub mod transport;

pub use object_model::{ObjectModel, VariableSpec};
pub use storage::AttributeStore;
pub use transport::Transport;
