use super::*;
use axum::body::Body;
use axum::http::{Method, Request};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::state::test_helpers::{seed, test_app_state, unavailable_app_state};
use crate::store::Collection;

async fn send(state: &AppState, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();
    let response = app(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn seed_class_with_students(state: &AppState, names: &[&str]) -> (i64, Vec<i64>) {
    let class_id = seed(state, Collection::Classes, json!({ "name": "3-1" })).await;
    let mut ids = Vec::new();
    for name in names {
        ids.push(seed(state, Collection::Students, json!({ "name": name, "class_id": class_id })).await);
    }
    (class_id, ids)
}

// =============================================================================
// BASICS
// =============================================================================

#[tokio::test]
async fn healthz_is_ok() {
    let (state, _dir) = test_app_state().await;
    let (status, _) = send(&state, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_store_answers_503_with_code() {
    let state = unavailable_app_state();
    let (status, body) = send(&state, Method::GET, "/api/classes", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "E_STORAGE_UNAVAILABLE");
    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (state, _dir) = test_app_state().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/classes")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "E_BAD_REQUEST");
}

#[test]
fn panic_response_hides_detail_in_production() {
    let panic: Box<dyn Any + Send> = Box::new("boom");
    let dev = panic_response(panic.as_ref(), false);
    let prod = panic_response(panic.as_ref(), true);
    assert_eq!(dev.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(prod.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn object_body_rejects_arrays() {
    assert!(object_body(json!({ "name": "a" })).is_ok());
    assert!(object_body(json!([1, 2])).is_err());
    assert_eq!(json_kind(&json!(null)), "null");
}

// =============================================================================
// CLASSES AND STUDENTS
// =============================================================================

#[tokio::test]
async fn create_then_list_classes() {
    let (state, _dir) = test_app_state().await;
    let (status, created) = send(&state, Method::POST, "/api/classes", Some(json!({ "name": "4-2" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 1);

    let (status, list) = send(&state, Method::GET, "/api/classes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    assert_eq!(list[0]["name"], "4-2");
}

#[tokio::test]
async fn create_class_requires_name() {
    let (state, _dir) = test_app_state().await;
    let (status, _) = send(&state, Method::POST, "/api/classes", Some(json!({ "name": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn batch_creates_one_class_per_name() {
    let (state, _dir) = test_app_state().await;
    let body = json!({ "names": ["1-1", "1-2", "1-3"] });
    let (status, created) = send(&state, Method::POST, "/api/classes/batch", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let ids: Vec<i64> = created.as_array().unwrap().iter().filter_map(|c| c["id"].as_i64()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn batch_rejects_non_array_names() {
    let (state, _dir) = test_app_state().await;
    let (status, body) = send(&state, Method::POST, "/api/classes/batch", Some(json!({ "names": "1-1" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E_BAD_REQUEST");
}

#[tokio::test]
async fn missing_student_is_404() {
    let (state, _dir) = test_app_state().await;
    let (status, body) = send(&state, Method::GET, "/api/students/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E_NOT_FOUND");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn student_for_unknown_class_is_rejected() {
    let (state, _dir) = test_app_state().await;
    let body = json!({ "name": "Mina", "class_id": 9 });
    let (status, _) = send(&state, Method::POST, "/api/students", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn students_filter_by_class() {
    let (state, _dir) = test_app_state().await;
    let (class_id, _) = seed_class_with_students(&state, &["Mina", "Joon"]).await;
    seed(&state, Collection::Students, json!({ "name": "Loner" })).await;

    let (_, all) = send(&state, Method::GET, "/api/students", None).await;
    assert_eq!(all.as_array().map(Vec::len), Some(3));
    let (_, filtered) = send(&state, Method::GET, &format!("/api/students?class_id={class_id}"), None).await;
    assert_eq!(filtered.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn student_position_round_trips() {
    let (state, _dir) = test_app_state().await;
    let (_, ids) = seed_class_with_students(&state, &["Mina"]).await;
    let uri = format!("/api/students/{}/position", ids[0]);
    let (status, _) = send(&state, Method::PUT, &uri, Some(json!({ "x": 12.5, "y": -3.0 }))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, student) = send(&state, Method::GET, &format!("/api/students/{}", ids[0]), None).await;
    assert_eq!(student["position"], json!({ "x": 12.5, "y": -3.0 }));
}

#[tokio::test]
async fn out_of_range_positions_are_rejected_on_both_routes() {
    let (state, _dir) = test_app_state().await;
    let (class_id, ids) = seed_class_with_students(&state, &["Mina"]).await;
    for uri in [format!("/api/classes/{class_id}/position"), format!("/api/students/{}/position", ids[0])] {
        let request = Request::builder()
            .method(Method::PUT)
            .uri(&uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"x": 1e999, "y": 0}"#))
            .unwrap();
        let response = app(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn position_for_missing_student_is_404() {
    let (state, _dir) = test_app_state().await;
    let (status, _) = send(&state, Method::PUT, "/api/students/7/position", Some(json!({ "x": 1.0, "y": 1.0 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_class_detaches_students() {
    let (state, _dir) = test_app_state().await;
    let (class_id, ids) = seed_class_with_students(&state, &["Mina", "Joon"]).await;
    let (status, body) = send(&state, Method::DELETE, &format!("/api/classes/{class_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detached_students"], 2);

    let (status, student) = send(&state, Method::GET, &format!("/api/students/{}", ids[0]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(student["class_id"], Value::Null);
}

#[tokio::test]
async fn new_student_does_not_inherit_deleted_students_group() {
    let (state, _dir) = test_app_state().await;
    let (class_id, ids) = seed_class_with_students(&state, &["A"]).await;
    let body = json!({ "name": "B", "class_id": class_id, "connections": [ids[0]] });
    let (_, b) = send(&state, Method::POST, "/api/students", Some(body)).await;
    let b_id = b["id"].as_i64().unwrap();
    let (status, _) = send(&state, Method::DELETE, &format!("/api/students/{b_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let body = json!({ "name": "C", "class_id": class_id });
    let (_, c) = send(&state, Method::POST, "/api/students", Some(body)).await;
    assert_ne!(c["id"], b["id"]);

    let (_, view) = send(&state, Method::GET, &format!("/api/classes/{class_id}/groups"), None).await;
    assert_eq!(view["groups"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn activities_create_list_delete() {
    let (state, _dir) = test_app_state().await;
    let (status, created) = send(&state, Method::POST, "/api/activities", Some(json!({ "title": "Field trip" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();

    let (_, list) = send(&state, Method::GET, "/api/activities", None).await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    let (status, _) = send(&state, Method::DELETE, &format!("/api/activities/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&state, Method::DELETE, &format!("/api/activities/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// LAYOUT, GROUPS, SIMILARITY
// =============================================================================

#[tokio::test]
async fn layout_preview_places_every_student() {
    let (state, _dir) = test_app_state().await;
    let names = ["A", "B", "C", "D", "E", "F", "G"];
    let (class_id, ids) = seed_class_with_students(&state, &names).await;
    let uri = format!("/api/classes/{class_id}/layout?mode=grid&width=1000&height=800&policy=reset");
    let (status, view) = send(&state, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["mode"], "grid");
    let positions = view["positions"].as_object().unwrap();
    assert_eq!(positions.len(), ids.len());
    let first = &positions[&ids[0].to_string()];
    assert_eq!(*first, json!({ "x": 380.0, "y": 280.0 }));
}

#[tokio::test]
async fn layout_preview_rejects_unknown_mode() {
    let (state, _dir) = test_app_state().await;
    let (class_id, _) = seed_class_with_students(&state, &["A"]).await;
    let (status, _) = send(&state, Method::GET, &format!("/api/classes/{class_id}/layout?mode=spiral"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&state, Method::GET, &format!("/api/classes/{class_id}/layout?width=0"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn layout_for_missing_class_is_404() {
    let (state, _dir) = test_app_state().await;
    let (status, _) = send(&state, Method::GET, "/api/classes/99/layout", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn arrange_returns_circular_layout_by_default() {
    let (state, _dir) = test_app_state().await;
    let (class_id, ids) = seed_class_with_students(&state, &["A", "B", "C", "D"]).await;
    let uri = format!("/api/classes/{class_id}/arrange?width=1920&height=1080");
    let (status, view) = send(&state, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["mode"], "circular");
    // First ID sits at the top of the circle.
    assert_eq!(view["positions"][ids[0].to_string()], json!({ "x": 960.0, "y": 162.0 }));
}

#[tokio::test]
async fn arrange_classes_covers_overview() {
    let (state, _dir) = test_app_state().await;
    seed(&state, Collection::Classes, json!({ "name": "1-1" })).await;
    seed(&state, Collection::Classes, json!({ "name": "1-2" })).await;
    let (status, view) = send(&state, Method::POST, "/api/classes/arrange?mode=grid", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["positions"].as_object().map(serde_json::Map::len), Some(2));
}

#[tokio::test]
async fn groups_follow_connections() {
    let (state, _dir) = test_app_state().await;
    let class_id = seed(&state, Collection::Classes, json!({ "name": "2-1" })).await;
    let a = seed(&state, Collection::Students, json!({ "name": "A", "class_id": class_id, "connections": [2] })).await;
    let b = seed(&state, Collection::Students, json!({ "name": "B", "class_id": class_id })).await;
    let c = seed(&state, Collection::Students, json!({ "name": "C", "class_id": class_id })).await;

    let (status, view) = send(&state, Method::GET, &format!("/api/classes/{class_id}/groups"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["groups"].as_array().map(Vec::len), Some(2));
    assert_eq!(view["colors"][a.to_string()], view["colors"][b.to_string()]);
    assert_ne!(view["colors"][a.to_string()], view["colors"][c.to_string()]);
}

#[tokio::test]
async fn similar_names_validates_threshold() {
    let (state, _dir) = test_app_state().await;
    let (class_id, _) = seed_class_with_students(&state, &["Kim Minji", "Kim Minju", "Park"]).await;
    let uri = format!("/api/classes/{class_id}/similar-names?threshold=0.8");
    let (status, pairs) = send(&state, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pairs.as_array().map(Vec::len), Some(1));

    let uri = format!("/api/classes/{class_id}/similar-names?threshold=1.5");
    let (status, _) = send(&state, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
