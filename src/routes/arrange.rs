//! Layout, grouping, and similarity routes.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use layout::similarity::SimilarPair;
use layout::{LayoutMode, PositionPolicy};
use serde::Deserialize;

use crate::config::CanvasSize;
use crate::error::ApiError;
use crate::services::arrange::{self, LayoutRequest, LayoutView};
use crate::services::grouping::{self, GroupView};
use crate::services::roster::{self, Scope};
use crate::state::AppState;

const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.5;

/// `?mode=&width=&height=&policy=`; anything omitted falls back to config.
#[derive(Debug, Default, Deserialize)]
pub struct LayoutQuery {
    pub mode: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub policy: Option<String>,
}

impl LayoutQuery {
    pub(crate) fn resolve(&self, state: &AppState) -> Result<LayoutRequest, ApiError> {
        let mode = match self.mode.as_deref() {
            Some(raw) => raw.parse::<LayoutMode>().map_err(|e| ApiError::BadRequest(e.to_string()))?,
            None => LayoutMode::default(),
        };
        let policy = match self.policy.as_deref() {
            Some(raw) => raw.parse::<PositionPolicy>().map_err(|e| ApiError::BadRequest(e.to_string()))?,
            None => state.config.position_policy,
        };
        let canvas = CanvasSize {
            width: self.width.unwrap_or(state.config.canvas.width),
            height: self.height.unwrap_or(state.config.canvas.height),
        };
        if !(canvas.width.is_finite() && canvas.width > 0.0 && canvas.height.is_finite() && canvas.height > 0.0) {
            return Err(ApiError::BadRequest("width and height must be positive".into()));
        }
        Ok(LayoutRequest { mode, canvas, policy })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SimilarityQuery {
    pub threshold: Option<f64>,
}

/// `GET /api/classes/{id}/layout`: computed positions, nothing persisted.
pub async fn preview_layout(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    query: Result<Query<LayoutQuery>, QueryRejection>,
) -> Result<Json<LayoutView>, ApiError> {
    let Query(query) = query?;
    let request = query.resolve(&state)?;
    let store = state.store()?;
    Ok(Json(arrange::preview(store.as_ref(), Scope::Class(id), request).await?))
}

/// `POST /api/classes/{id}/arrange`: lay out a class and persist positions
/// in the background.
pub async fn arrange_class(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    query: Result<Query<LayoutQuery>, QueryRejection>,
) -> Result<Json<LayoutView>, ApiError> {
    let Query(query) = query?;
    run_arrange(&state, Scope::Class(id), &query).await
}

/// `POST /api/classes/arrange`: lay out the class overview.
pub async fn arrange_classes(
    State(state): State<AppState>,
    query: Result<Query<LayoutQuery>, QueryRejection>,
) -> Result<Json<LayoutView>, ApiError> {
    let Query(query) = query?;
    run_arrange(&state, Scope::Classes, &query).await
}

async fn run_arrange(state: &AppState, scope: Scope, query: &LayoutQuery) -> Result<Json<LayoutView>, ApiError> {
    let request = query.resolve(state)?;
    // Write handles are dropped: the writes finish on their own.
    let (view, _writes) = arrange::arrange(state.store()?, scope, request).await?;
    Ok(Json(view))
}

/// `GET /api/classes/{id}/groups`: connection groups and per-student colors.
pub async fn class_groups(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<GroupView>, ApiError> {
    let store = state.store()?;
    let members = roster::members(store.as_ref(), Scope::Class(id)).await?;
    Ok(Json(grouping::group_view(&members)))
}

/// `GET /api/classes/{id}/similar-names`: legacy name-similarity edges.
pub async fn similar_names(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    query: Result<Query<SimilarityQuery>, QueryRejection>,
) -> Result<Json<Vec<SimilarPair>>, ApiError> {
    let Query(query) = query?;
    let threshold = query.threshold.unwrap_or(DEFAULT_SIMILARITY_THRESHOLD);
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ApiError::BadRequest("threshold must be between 0 and 1".into()));
    }
    let store = state.store()?;
    let members = roster::members(store.as_ref(), Scope::Class(id)).await?;
    Ok(Json(grouping::similar_names(&members, threshold)))
}
