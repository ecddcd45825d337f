//! Shared numeric constants for the layout crate.

// ── Circular layout ─────────────────────────────────────────────

/// Circle radius as a fraction of the smaller canvas dimension.
pub const CIRCLE_RADIUS_RATIO: f64 = 0.35;

/// Angle of the first entity on the circle (12 o'clock).
pub const CIRCLE_START_ANGLE: f64 = -std::f64::consts::FRAC_PI_2;

// ── Grid layout ─────────────────────────────────────────────────

/// Distance between neighbouring grid cell centers.
pub const GRID_SPACING: f64 = 120.0;

/// Widening factor applied to `N` before taking the square root for the
/// column count, so grids come out slightly wider than tall.
pub const GRID_ASPECT: f64 = 1.2;

// ── Nodes ───────────────────────────────────────────────────────

/// Radius of a drawn node. Also the hit radius for drag gestures.
pub const NODE_RADIUS: f64 = 50.0;
