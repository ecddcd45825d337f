//! Class CRUD routes.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use layout::Point;
use serde_json::Value;

use crate::error::ApiError;
use crate::models::{Class, Record, Student, parse_records};
use crate::routes::{json_kind, object_body};
use crate::services::roster;
use crate::state::AppState;
use crate::store::{Collection, Filter};

/// `GET /api/classes`: list classes.
pub async fn list_classes(State(state): State<AppState>) -> Result<Json<Vec<Class>>, ApiError> {
    let docs = state.store()?.list(Collection::Classes, &Filter::all()).await?;
    Ok(Json(parse_records(docs)))
}

/// `POST /api/classes`: create one class.
pub async fn create_class(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Class>), ApiError> {
    let Json(body) = payload?;
    let class = Class::from_document(object_body(body)?)?;
    let stored = state.store()?.insert(Collection::Classes, class.to_document()?).await?;
    Ok((StatusCode::CREATED, Json(Class::from_document(stored)?)))
}

/// `POST /api/classes/batch`: create one class per name in `{"names": [...]}`.
pub async fn create_classes_batch(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<Class>>), ApiError> {
    let Json(body) = payload?;
    let names = parse_class_names(&body)?;
    let store = state.store()?;

    let mut created = Vec::with_capacity(names.len());
    for name in names {
        let class = Class::from_document(object_body(serde_json::json!({ "name": name }))?)?;
        let stored = store.insert(Collection::Classes, class.to_document()?).await?;
        created.push(Class::from_document(stored)?);
    }
    tracing::info!(count = created.len(), "classes created in batch");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Validate the batch body: `names` must be an array of non-empty strings.
pub(crate) fn parse_class_names(body: &Value) -> Result<Vec<String>, ApiError> {
    let names = match body.get("names") {
        Some(Value::Array(names)) => names,
        Some(other) => {
            return Err(ApiError::BadRequest(format!("names must be an array, got {}", json_kind(other))));
        }
        None => return Err(ApiError::BadRequest("names is required".into())),
    };
    names
        .iter()
        .map(|name| match name.as_str().map(str::trim) {
            Some(trimmed) if !trimmed.is_empty() => Ok(trimmed.to_owned()),
            _ => Err(ApiError::BadRequest("every class name must be a non-empty string".into())),
        })
        .collect()
}

/// `GET /api/classes/{id}`: fetch one class.
pub async fn get_class(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Class>, ApiError> {
    let doc = state
        .store()?
        .get(Collection::Classes, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("class {id}")))?;
    Ok(Json(Class::from_document(doc)?))
}

/// `PUT /api/classes/{id}`: replace a class.
pub async fn replace_class(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Class>, ApiError> {
    let Json(body) = payload?;
    let class = Class::from_document(object_body(body)?)?;
    let stored = state.store()?.replace(Collection::Classes, id, class.to_document()?).await?;
    Ok(Json(Class::from_document(stored)?))
}

/// `DELETE /api/classes/{id}`: delete a class; its students become unassigned.
pub async fn delete_class(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>, ApiError> {
    let store = state.store()?;
    let detached = roster::delete_class(store.as_ref(), id).await?;
    Ok(Json(serde_json::json!({ "ok": true, "detached_students": detached })))
}

/// `PUT /api/classes/{id}/position`: save where the class sits on the overview.
pub async fn save_class_position(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<Point>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(position) = payload?;
    state.store()?.save_position(Collection::Classes, id, position).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// `GET /api/classes/{id}/students`: students of one class.
pub async fn list_class_students(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Student>>, ApiError> {
    let store = state.store()?;
    Ok(Json(roster::class_students(store.as_ref(), id).await?))
}
