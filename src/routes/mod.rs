//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the JSON REST surface under `/api`, a health check, and (when
//! `STATIC_DIR` is set) the built frontend as a fallback for every other
//! path. The same route table is served whichever storage backend is active.

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

pub mod arrange;
pub mod classes;
pub mod records;
pub mod students;

use std::any::Any;

use axum::Router;
use axum::body::Body;
use axum::http::{Response, StatusCode, header};
use axum::routing::{delete, get, post, put};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods(cors::Any)
        .allow_headers(cors::Any);
    let production = state.config.production;
    let static_dir = state.config.static_dir.clone();

    let router = Router::new()
        .route("/api/classes", get(classes::list_classes).post(classes::create_class))
        .route("/api/classes/batch", post(classes::create_classes_batch))
        .route("/api/classes/arrange", post(arrange::arrange_classes))
        .route(
            "/api/classes/{id}",
            get(classes::get_class)
                .put(classes::replace_class)
                .delete(classes::delete_class),
        )
        .route("/api/classes/{id}/position", put(classes::save_class_position))
        .route("/api/classes/{id}/students", get(classes::list_class_students))
        .route("/api/classes/{id}/layout", get(arrange::preview_layout))
        .route("/api/classes/{id}/arrange", post(arrange::arrange_class))
        .route("/api/classes/{id}/groups", get(arrange::class_groups))
        .route("/api/classes/{id}/similar-names", get(arrange::similar_names))
        .route("/api/students", get(students::list_students).post(students::create_student))
        .route(
            "/api/students/{id}",
            get(students::get_student)
                .put(students::replace_student)
                .delete(students::delete_student),
        )
        .route("/api/students/{id}/position", put(students::save_student_position))
        .route("/api/activities", get(records::list_activities).post(records::create_activity))
        .route("/api/activities/{id}", delete(records::delete_activity))
        .route("/api/items", get(records::list_items).post(records::create_item))
        .route("/api/items/{id}", delete(records::delete_item))
        .route("/healthz", get(healthz))
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true)),
        None => router,
    };

    router
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
            panic_response(panic.as_ref(), production)
        }))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
}

/// 500 response for a panicking handler. The panic message is only exposed
/// outside production.
fn panic_response(panic: &(dyn Any + Send), production: bool) -> Response<Body> {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "handler panicked");

    let mut body = serde_json::json!({ "error": "internal server error", "code": "E_INTERNAL", "retryable": false });
    if !production {
        body["detail"] = serde_json::Value::String(detail.to_owned());
    }

    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Require a JSON object body.
pub(crate) fn object_body(value: serde_json::Value) -> Result<crate::store::Document, crate::error::ApiError> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(crate::error::ApiError::BadRequest(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
