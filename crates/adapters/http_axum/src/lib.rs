//! # habridge-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a small JSON API over the bridge registry
//!   (`/api/entities`, `/api/entities/{id}`)
//! - Turn `PUT /api/entities/{id}/value` into a local write request
//! - Map bridge errors into HTTP status codes
//!
//! ## Dependency rule
//! Depends on `habridge-app` (for the bridge and port traits) and
//! `habridge-domain` (for request/response types). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
mod test_support;
