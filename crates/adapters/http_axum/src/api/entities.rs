//! JSON REST handlers for bridged entities.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use habridge_app::ports::{AttributeStore, ObjectModel, Transport};
use habridge_domain::entity::EntityRecord;
use habridge_domain::value::Value;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for a local write.
#[derive(Deserialize)]
pub struct WriteValueRequest {
    pub value: Value,
}

/// An entity record together with the current value of its local object.
#[derive(Serialize)]
pub struct EntityView {
    #[serde(flatten)]
    pub record: EntityRecord,
    pub value: Option<Value>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<EntityRecord>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<EntityView>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the write endpoint.
///
/// The command is on the bus; the device has not confirmed it yet.
pub enum WriteResponse {
    Accepted,
}

impl IntoResponse for WriteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted => StatusCode::ACCEPTED.into_response(),
        }
    }
}

/// `GET /api/entities`
pub async fn list<T, O, S>(State(state): State<AppState<T, O, S>>) -> ListResponse
where
    T: Transport + Send + Sync + 'static,
    O: ObjectModel + Send + Sync + 'static,
    S: AttributeStore + Send + Sync + 'static,
{
    ListResponse::Ok(Json(state.bridge.entities().await))
}

/// `GET /api/entities/{id}`
pub async fn get<T, O, S>(
    State(state): State<AppState<T, O, S>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    T: Transport + Send + Sync + 'static,
    O: ObjectModel + Send + Sync + 'static,
    S: AttributeStore + Send + Sync + 'static,
{
    let record = state.bridge.entity(&id).await?;
    let value = state.bridge.current_value(&id).await?;
    Ok(GetResponse::Ok(Json(EntityView { record, value })))
}

/// `PUT /api/entities/{id}/value`
pub async fn write_value<T, O, S>(
    State(state): State<AppState<T, O, S>>,
    Path(id): Path<String>,
    Json(req): Json<WriteValueRequest>,
) -> Result<WriteResponse, ApiError>
where
    T: Transport + Send + Sync + 'static,
    O: ObjectModel + Send + Sync + 'static,
    S: AttributeStore + Send + Sync + 'static,
{
    state.bridge.write(&id, req.value).await?;
    Ok(WriteResponse::Accepted)
}
