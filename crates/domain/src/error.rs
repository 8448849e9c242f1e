//! Common error types used across the workspace.
//!
//! [`BridgeError`] is the error that crosses port boundaries. Each adapter
//! defines its own typed error and converts into it via `From`.

use crate::value::ValueKind;

/// Boxed source error carried by the IO-flavoured variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for bridge operations.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A write request referenced an identifier absent from the registry.
    #[error("unknown entity")]
    UnknownEntity(#[from] UnknownEntityError),

    /// A write request targeted an entity that cannot be commanded.
    #[error("entity is read-only")]
    ReadOnlyEntity(#[from] ReadOnlyEntityError),

    /// The transport refused the outbound command publish.
    #[error("command delivery failed")]
    CommandDeliveryFailed(#[source] BoxError),

    /// The host object model could not create or update the local object.
    #[error("materialization failed")]
    MaterializationFailed(#[source] BoxError),

    /// The transport failed outside of a command publish (e.g. subscribe).
    #[error("transport error")]
    Transport(#[source] BoxError),

    /// Persistence failed.
    #[error("storage error")]
    Storage(#[source] BoxError),
}

/// Domain invariant violations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("base discovery topic must not be empty")]
    EmptyBaseTopic,
    #[error("device class whitelist must not be empty")]
    EmptyWhitelist,
    #[error("value does not fit a {expected} entity")]
    UnsupportedValue {
        /// The value type the entity is bound to.
        expected: ValueKind,
    },
}

/// No record exists for the requested entity id.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("no entity registered with id {id}")]
pub struct UnknownEntityError {
    pub id: String,
}

/// The entity has no command topic or its class is not controllable.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("entity {id} does not accept commands")]
pub struct ReadOnlyEntityError {
    pub id: String,
}
