use crate::DEFAULT_BASE_COST;

/// Persistent terrain state of a single grid position. The position itself is implied by the
/// cell's index in the owning [TerrainGrid](crate::TerrainGrid); search bookkeeping lives in the
/// search context, never here.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub walkable: bool,
    pub base_cost: f32,
    /// Accumulated slow effect of this tick, always within `[1.0, cap]`.
    pub slow_multiplier: f32,
}

impl Default for Cell {
    fn default() -> Cell {
        Cell {
            walkable: true,
            base_cost: DEFAULT_BASE_COST,
            slow_multiplier: 1.0,
        }
    }
}

impl Cell {
    pub fn new(walkable: bool) -> Cell {
        Cell {
            walkable,
            ..Cell::default()
        }
    }
    /// Cost of entering this cell, including any slow effect.
    pub fn movement_cost(&self) -> f32 {
        self.base_cost * self.slow_multiplier
    }
    pub fn is_slowed(&self) -> bool {
        self.slow_multiplier > 1.0
    }
    /// Adds `delta` to the slow multiplier and clamps the result to `[1.0, cap]`.
    pub(crate) fn add_slow(&mut self, delta: f32, cap: f32) {
        self.slow_multiplier = (self.slow_multiplier + delta).clamp(1.0, cap.max(1.0));
    }
    pub(crate) fn reset_slow(&mut self) {
        self.slow_multiplier = 1.0;
    }
}
