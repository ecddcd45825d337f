//! Arrange service: compute a layout and write positions back.
//!
//! DESIGN
//! ======
//! The layout itself is synchronous and comes from the `layout` crate. The
//! write-back is fire-and-forget: one spawned task per entity whose position
//! changed, each independent of the others. The HTTP response does not wait
//! for them, and a failed write is logged and dropped without touching the
//! other writes or the returned map.

#[cfg(test)]
#[path = "arrange_test.rs"]
mod arrange_test;

use std::sync::Arc;

use layout::{Entity, EntityId, LayoutMode, Point, PositionMap, PositionPolicy, apply_policy};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::CanvasSize;
use crate::services::roster::{self, Member, Scope};
use crate::store::{Collection, DocumentStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutRequest {
    pub mode: LayoutMode,
    pub canvas: CanvasSize,
    pub policy: PositionPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutView {
    pub mode: LayoutMode,
    pub policy: PositionPolicy,
    pub width: f64,
    pub height: f64,
    pub positions: PositionMap,
}

/// Final positions for `members` under `request`.
#[must_use]
pub fn compute(members: &[Member], request: LayoutRequest) -> PositionMap {
    let ids: Vec<EntityId> = members.iter().map(|m| m.entity.id).collect();
    let computed = request.mode.compute(&ids, request.canvas.width, request.canvas.height);
    let entities: Vec<Entity> = members.iter().map(|m| m.entity.clone()).collect();
    apply_policy(request.policy, &entities, &computed)
}

/// Spawn one independent save per entity whose position differs from what
/// is stored. Dropping the returned handles detaches the tasks.
///
/// Each save is conditional on the position `members` was loaded with, so a
/// drag saved after the layout was computed is never overwritten by it.
#[must_use]
pub fn persist_positions(
    store: Arc<dyn DocumentStore>,
    collection: Collection,
    members: &[Member],
    positions: &PositionMap,
) -> Vec<JoinHandle<()>> {
    members
        .iter()
        .filter_map(|member| {
            let id = member.entity.id;
            let position = *positions.get(&id)?;
            let loaded = member.entity.position;
            (loaded != Some(position)).then_some((id, loaded, position))
        })
        .map(|(id, loaded, position)| spawn_save(Arc::clone(&store), collection, id, loaded, position))
        .collect()
}

fn spawn_save(
    store: Arc<dyn DocumentStore>,
    collection: Collection,
    id: EntityId,
    loaded: Option<Point>,
    position: Point,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match store.save_position_if(collection, id, loaded, position).await {
            Ok(true) => debug!(%collection, id, x = position.x, y = position.y, "position saved"),
            Ok(false) => debug!(%collection, id, "position changed since layout; skipped"),
            Err(e) => error!(%collection, id, error = %e, "position write failed; dropping"),
        }
    })
}

/// Load `scope`, lay it out, and start writing the result back.
///
/// # Errors
///
/// Returns an error only if loading fails; write failures are logged.
pub async fn arrange(
    store: Arc<dyn DocumentStore>,
    scope: Scope,
    request: LayoutRequest,
) -> Result<(LayoutView, Vec<JoinHandle<()>>), StoreError> {
    let members = roster::members(store.as_ref(), scope).await?;
    let positions = compute(&members, request);
    let writes = persist_positions(store, scope.collection(), &members, &positions);
    info!(?scope, mode = %request.mode, count = members.len(), writes = writes.len(), "arranged");
    Ok((view(request, positions), writes))
}

/// Layout preview without any write-back.
///
/// # Errors
///
/// Propagates storage errors from loading the scope.
pub async fn preview(store: &dyn DocumentStore, scope: Scope, request: LayoutRequest) -> Result<LayoutView, StoreError> {
    let members = roster::members(store, scope).await?;
    Ok(view(request, compute(&members, request)))
}

fn view(request: LayoutRequest, positions: PositionMap) -> LayoutView {
    LayoutView {
        mode: request.mode,
        policy: request.policy,
        width: request.canvas.width,
        height: request.canvas.height,
        positions,
    }
}
