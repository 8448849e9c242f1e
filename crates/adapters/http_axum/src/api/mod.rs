//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod entities;

use axum::Router;
use axum::routing::{get, put};

use habridge_app::ports::{AttributeStore, ObjectModel, Transport};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<T, O, S>() -> Router<AppState<T, O, S>>
where
    T: Transport + Send + Sync + 'static,
    O: ObjectModel + Send + Sync + 'static,
    S: AttributeStore + Send + Sync + 'static,
{
    Router::new()
        .route("/entities", get(entities::list::<T, O, S>))
        .route("/entities/{id}", get(entities::get::<T, O, S>))
        .route("/entities/{id}/value", put(entities::write_value::<T, O, S>))
}
