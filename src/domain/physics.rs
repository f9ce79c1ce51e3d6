/// Pixel ↔ grid geometry and the fixed probe set.
///
/// Dave occupies a 16×16 box anchored at (px, py). Eight probe points
/// around that box are tested against the level each tick:
///
/// ```text
///        0   1
///     7 ┌─────┐ 2
///       │     │
///     6 │     │ 3
///       └─────┘
///        5   4
/// ```
///
/// Grid conversion truncates toward zero, so pixels -15..=-1 land in
/// column/row 0. Anything outside the 100×10 grid is open space.

pub const TILE_SIZE: i32 = 16;
pub const GRID_W: i32 = 100;
pub const GRID_H: i32 = 10;

/// Probe offsets from (px, py).
pub const PROBES: [(i32, i32); 8] = [
    (4, -1),  // head left
    (10, -1), // head right
    (11, 4),  // right upper
    (11, 12), // right lower
    (10, 16), // foot right
    (4, 16),  // foot left
    (3, 12),  // left lower
    (3, 4),   // left upper
];

pub const HEAD_LEFT: usize = 0;
pub const HEAD_RIGHT: usize = 1;
pub const RIGHT_UPPER: usize = 2;
pub const RIGHT_LOWER: usize = 3;
pub const FOOT_RIGHT: usize = 4;
pub const FOOT_LEFT: usize = 5;
pub const LEFT_LOWER: usize = 6;
pub const LEFT_UPPER: usize = 7;

/// Body centre, used for the climbable check.
pub const CLIMB_POINT: (i32, i32) = (6, 8);
/// Just below the left foot, used by gravity.
pub const GRAVITY_POINT: (i32, i32) = (4, 17);

pub fn on_grid(p: i32) -> i32 {
    p / TILE_SIZE
}

/// Flat index of a cell, `None` when it lies outside the grid.
pub fn cell_index(x: i32, y: i32) -> Option<usize> {
    if (0..GRID_W).contains(&x) && (0..GRID_H).contains(&y) {
        Some((y * GRID_W + x) as usize)
    } else {
        None
    }
}

/// Vertical snap after landing: round py to the nearest row boundary.
/// Uses truncated remainder, so negative py rounds toward the boundary
/// on the same side of zero as the remainder.
pub fn settle(py: i32) -> i32 {
    let rem = py % TILE_SIZE;
    if rem < 8 {
        py - rem
    } else {
        py + TILE_SIZE - rem
    }
}

/// Is pixel column `px` inside the 20-column viewport starting at `view_x`?
/// Compared in pixels, so -15..=-1 is left of column 0, not in it.
pub fn is_visible(px: i32, view_x: i32) -> bool {
    let rel = px - view_x * TILE_SIZE;
    (0..20 * TILE_SIZE).contains(&rel)
}
