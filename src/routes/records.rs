//! Activities and items: free-form documents with no schema beyond an `id`.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::Value;

use crate::error::ApiError;
use crate::routes::object_body;
use crate::state::AppState;
use crate::store::{Collection, Document, Filter};

async fn list(state: &AppState, collection: Collection) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(state.store()?.list(collection, &Filter::all()).await?))
}

async fn create(
    state: &AppState,
    collection: Collection,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let Json(body) = payload?;
    let stored = state.store()?.insert(collection, object_body(body)?).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn delete(state: &AppState, collection: Collection, id: i64) -> Result<Json<Value>, ApiError> {
    state.store()?.delete(collection, id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// `GET /api/activities`
pub async fn list_activities(State(state): State<AppState>) -> Result<Json<Vec<Document>>, ApiError> {
    list(&state, Collection::Activities).await
}

/// `POST /api/activities`
pub async fn create_activity(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    create(&state, Collection::Activities, payload).await
}

/// `DELETE /api/activities/{id}`
pub async fn delete_activity(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>, ApiError> {
    delete(&state, Collection::Activities, id).await
}

/// `GET /api/items`
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Document>>, ApiError> {
    list(&state, Collection::Items).await
}

/// `POST /api/items`
pub async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    create(&state, Collection::Items, payload).await
}

/// `DELETE /api/items/{id}`
pub async fn delete_item(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>, ApiError> {
    delete(&state, Collection::Items, id).await
}
