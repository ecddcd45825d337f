//! Fixed display palettes.

/// A CSS hex color.
pub type Color = &'static str;

/// Colors assigned to connectivity groups, cycled by group index.
pub const GROUP_PALETTE: [Color; 10] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8", "#F7DC6F", "#BB8FCE", "#85C1E2", "#F8B739", "#52B788",
];

/// Fallback colors for entities with neither an explicit color nor a group.
pub const DEFAULT_PALETTE: [Color; 8] =
    ["#A8DADC", "#E9C46A", "#F4A261", "#E76F51", "#2A9D8F", "#B5838D", "#6D6875", "#90BE6D"];

/// Group color for the `index`-th distinct group.
#[must_use]
pub fn group_color(index: usize) -> Color {
    GROUP_PALETTE[index % GROUP_PALETTE.len()]
}

/// Fallback color for the entity drawn at `index`.
#[must_use]
pub fn default_color(index: usize) -> Color {
    DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()]
}
