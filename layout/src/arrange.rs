//! Deterministic placement of entities on the canvas.
//!
//! Both layouts are pure functions of the ID sequence and the canvas size.
//! There is no incremental state: adding a single entity re-places every
//! other entity as well.

#[cfg(test)]
#[path = "arrange_test.rs"]
mod arrange_test;

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{CIRCLE_RADIUS_RATIO, CIRCLE_START_ANGLE, GRID_ASPECT, GRID_SPACING};
use crate::geometry::{EntityId, Point, PositionMap};

/// Which layout to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Clock face, ordered by ascending ID.
    #[default]
    Circular,
    /// Row-major grid in input order.
    Grid,
}

impl LayoutMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Circular => "circular",
            Self::Grid => "grid",
        }
    }

    /// Run the layout this mode names.
    #[must_use]
    pub fn compute(self, entity_ids: &[EntityId], width: f64, height: f64) -> PositionMap {
        match self {
            Self::Circular => compute_circular_layout(entity_ids, width, height),
            Self::Grid => compute_grid_layout(entity_ids, width, height),
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown layout mode: {0}")]
pub struct ParseModeError(pub String);

impl FromStr for LayoutMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "circular" | "circle" => Ok(Self::Circular),
            "grid" => Ok(Self::Grid),
            _ => Err(ParseModeError(s.to_owned())),
        }
    }
}

/// Place entities evenly on a circle centered in the canvas.
///
/// IDs are sorted ascending first, so any permutation of the same set yields
/// the same map. Sorted index 0 sits at 12 o'clock and the rest follow
/// clockwise at `2π / N` increments. A single entity is placed at the top of
/// the circle, not at the center. Duplicate IDs collapse to one entry.
#[must_use]
pub fn compute_circular_layout(entity_ids: &[EntityId], canvas_width: f64, canvas_height: f64) -> PositionMap {
    let mut sorted = entity_ids.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut positions = PositionMap::new();
    if sorted.is_empty() {
        return positions;
    }

    let center = Point::new(canvas_width / 2.0, canvas_height / 2.0);
    let radius = canvas_width.min(canvas_height) * CIRCLE_RADIUS_RATIO;
    #[allow(clippy::cast_precision_loss)]
    let step = (2.0 * PI) / sorted.len() as f64;

    for (i, id) in sorted.into_iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let angle = CIRCLE_START_ANGLE + i as f64 * step;
        positions.insert(id, Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin()));
    }

    positions
}

/// Column and row counts for a grid of `count` cells.
#[must_use]
pub fn grid_dimensions(count: usize) -> (usize, usize) {
    if count == 0 {
        return (0, 0);
    }
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let columns = ((count as f64 * GRID_ASPECT).sqrt().ceil() as usize).max(1);
    let rows = count.div_ceil(columns);
    (columns, rows)
}

/// Pack entities into a centered grid, row-major, in the order given.
///
/// Unlike the circular layout this is order-sensitive: permuting the input
/// moves entities to different cells. If an ID appears twice the later cell
/// wins.
#[must_use]
pub fn compute_grid_layout(entity_ids: &[EntityId], container_width: f64, container_height: f64) -> PositionMap {
    let mut positions = PositionMap::new();
    let (columns, rows) = grid_dimensions(entity_ids.len());
    if columns == 0 {
        return positions;
    }

    #[allow(clippy::cast_precision_loss)]
    let start_x = (container_width - columns as f64 * GRID_SPACING) / 2.0 + GRID_SPACING / 2.0;
    #[allow(clippy::cast_precision_loss)]
    let start_y = (container_height - rows as f64 * GRID_SPACING) / 2.0 + GRID_SPACING / 2.0;

    for (index, id) in entity_ids.iter().enumerate() {
        let col = index % columns;
        let row = index / columns;
        #[allow(clippy::cast_precision_loss)]
        let point = Point::new(start_x + col as f64 * GRID_SPACING, start_y + row as f64 * GRID_SPACING);
        positions.insert(*id, point);
    }

    positions
}
