//! Domain services used by HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own loading, layout, and write-back so route handlers can
//! stay focused on request parsing and status mapping.

pub mod arrange;
pub mod grouping;
pub mod roster;
