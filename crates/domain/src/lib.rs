//! # habridge-domain
//!
//! Pure domain model for the Home Assistant discovery bridge.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **device classes** and the table mapping each class to a local
//!   value type, display profile and controllability
//! - Define **entity records** (one per announced device function) and the
//!   payload coercion/encoding rules they carry
//! - Parse **discovery announcements** and classify inbound topics
//! - Define the **bus envelopes** exchanged with the transport
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device_class;
pub mod discovery;
pub mod entity;
pub mod message;
pub mod value;
