//! Points, entity IDs, and the read-only entity view the core operates on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Storage-assigned entity identifier.
pub type EntityId = i64;

/// Entity ID → screen position. Ordered by ID so serialization and iteration
/// never depend on hash order.
pub type PositionMap = BTreeMap<EntityId, Point>;

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// The slice of a student or class record that layout and grouping read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    #[serde(default)]
    pub connections: Vec<EntityId>,
    #[serde(default)]
    pub position: Option<Point>,
}

impl Entity {
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self { id, connections: Vec::new(), position: None }
    }

    #[must_use]
    pub fn with_connections(mut self, connections: impl Into<Vec<EntityId>>) -> Self {
        self.connections = connections.into();
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }
}
