//! Student CRUD and position routes.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use layout::Point;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::models::{Record, Student, parse_records};
use crate::routes::object_body;
use crate::services::roster;
use crate::state::AppState;
use crate::store::{Collection, Filter};

#[derive(Debug, Default, Deserialize)]
pub struct StudentQuery {
    pub class_id: Option<i64>,
}

/// `GET /api/students`: list students, optionally `?class_id=`.
pub async fn list_students(
    State(state): State<AppState>,
    query: Result<Query<StudentQuery>, QueryRejection>,
) -> Result<Json<Vec<Student>>, ApiError> {
    let Query(query) = query?;
    let filter = query
        .class_id
        .map_or_else(Filter::all, |class_id| Filter::field_eq("class_id", class_id));
    let docs = state.store()?.list(Collection::Students, &filter).await?;
    Ok(Json(parse_records(docs)))
}

/// `POST /api/students`: create a student.
pub async fn create_student(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Student>), ApiError> {
    let Json(body) = payload?;
    let student = Student::from_document(object_body(body)?)?;
    let store = state.store()?;
    if let Some(class_id) = student.class_id {
        if store.get(Collection::Classes, class_id).await?.is_none() {
            return Err(ApiError::BadRequest(format!("class {class_id} does not exist")));
        }
    }
    let stored = store.insert(Collection::Students, student.to_document()?).await?;
    Ok((StatusCode::CREATED, Json(Student::from_document(stored)?)))
}

/// `GET /api/students/{id}`: fetch one student.
pub async fn get_student(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Student>, ApiError> {
    let doc = state
        .store()?
        .get(Collection::Students, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("student {id}")))?;
    Ok(Json(Student::from_document(doc)?))
}

/// `PUT /api/students/{id}`: replace a student (name, class, connections, existence).
pub async fn replace_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Student>, ApiError> {
    let Json(body) = payload?;
    let student = Student::from_document(object_body(body)?)?;
    let stored = state
        .store()?
        .replace(Collection::Students, id, student.to_document()?)
        .await?;
    Ok(Json(Student::from_document(stored)?))
}

/// `DELETE /api/students/{id}`: delete a student and unlink it from the others.
pub async fn delete_student(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>, ApiError> {
    let store = state.store()?;
    roster::delete_student(store.as_ref(), id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// `PUT /api/students/{id}/position`: write back a drag.
pub async fn save_student_position(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<Point>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(position) = payload?;
    state.store()?.save_position(Collection::Students, id, position).await?;
    tracing::debug!(id, x = position.x, y = position.y, "student position saved");
    Ok(Json(serde_json::json!({ "ok": true })))
}
