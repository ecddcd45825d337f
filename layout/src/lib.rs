//! Layout and grouping core for the classroom particle board.
//!
//! Everything in this crate is a pure, synchronous function of its inputs.
//! The server feeds it entity lists loaded from storage and persists whatever
//! positions come back; a render consumer reads the resulting position and
//! group maps every frame.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`arrange`] | Circular and grid layouts, [`arrange::LayoutMode`] |
//! | [`group`] | Union-find connectivity grouping and group colors |
//! | [`similarity`] | Levenshtein distance and normalized name similarity |
//! | [`policy`] | Whether stored positions survive a re-layout |
//! | [`scene`] | Live position map with hit-testing and drag gestures |
//! | [`palette`] | Fixed display palettes |
//! | [`geometry`] | `Point` and the entity input type |
//! | [`consts`] | Shared numeric constants (radius ratio, grid pitch, etc.) |

pub mod arrange;
pub mod consts;
pub mod geometry;
pub mod group;
pub mod palette;
pub mod policy;
pub mod scene;
pub mod similarity;

pub use arrange::{LayoutMode, compute_circular_layout, compute_grid_layout};
pub use geometry::{Entity, EntityId, Point, PositionMap};
pub use group::{Grouping, group_by_connectivity};
pub use policy::{PositionPolicy, apply_policy};
pub use similarity::{levenshtein, similarity};
