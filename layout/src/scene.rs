//! Live position map read by the render loop, plus the drag gesture.
//!
//! The render loop always reads `positions` as they are now; a drag updates
//! the dragged entity's entry on every pointer move and yields exactly one
//! write-back when the pointer is released.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use serde::Serialize;

use crate::consts::NODE_RADIUS;
use crate::geometry::{EntityId, Point, PositionMap};
use crate::group::Grouping;

/// Position to persist after a drag ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionWrite {
    pub id: EntityId,
    pub position: Point,
}

/// Drag in progress between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy)]
struct Drag {
    id: EntityId,
    /// Offset from the pointer to the node center at grab time.
    offset: Point,
    origin: Point,
}

#[derive(Debug, Default)]
pub struct Scene {
    pub positions: PositionMap,
    pub grouping: Grouping,
    drag: Option<Drag>,
}

impl Scene {
    #[must_use]
    pub fn new(positions: PositionMap, grouping: Grouping) -> Self {
        Self { positions, grouping, drag: None }
    }

    /// Swap in freshly fetched data. An active drag keeps its live position.
    pub fn replace(&mut self, mut positions: PositionMap, grouping: Grouping) {
        if let Some(drag) = self.drag {
            if let Some(current) = self.positions.get(&drag.id) {
                positions.insert(drag.id, *current);
            } else {
                self.drag = None;
            }
        }
        self.positions = positions;
        self.grouping = grouping;
    }

    /// Topmost node under `point`. Higher IDs are drawn later and win ties.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<EntityId> {
        self.positions
            .iter()
            .rev()
            .find(|(_, center)| center.distance(point) <= NODE_RADIUS)
            .map(|(id, _)| *id)
    }

    #[must_use]
    pub fn dragging(&self) -> Option<EntityId> {
        self.drag.map(|d| d.id)
    }

    /// Start dragging the node under `point`. Returns the grabbed ID.
    pub fn begin_drag(&mut self, point: Point) -> Option<EntityId> {
        let id = self.hit_test(point)?;
        let center = *self.positions.get(&id)?;
        self.drag = Some(Drag { id, offset: Point::new(center.x - point.x, center.y - point.y), origin: center });
        Some(id)
    }

    /// Move the dragged node so it follows the pointer.
    pub fn drag_to(&mut self, point: Point) {
        let Some(drag) = self.drag else {
            return;
        };
        self.positions.insert(drag.id, Point::new(point.x + drag.offset.x, point.y + drag.offset.y));
    }

    /// Finish the drag. Returns the write-back, or `None` if nothing moved.
    pub fn end_drag(&mut self) -> Option<PositionWrite> {
        let drag = self.drag.take()?;
        let position = *self.positions.get(&drag.id)?;
        if position == drag.origin {
            return None;
        }
        Some(PositionWrite { id: drag.id, position })
    }
}
