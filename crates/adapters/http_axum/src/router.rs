//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use habridge_app::ports::{AttributeStore, ObjectModel, Transport};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Mounts API routes under `/api` and includes a [`TraceLayer`] that logs
/// each HTTP request/response at the `DEBUG` level.
pub fn build<T, O, S>(state: AppState<T, O, S>) -> Router
where
    T: Transport + Send + Sync + 'static,
    O: ObjectModel + Send + Sync + 'static,
    S: AttributeStore + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
