use crate::cell::Cell;
use crate::{DEFAULT_BASE_COST, SLOW_MULTIPLIER_CAP};
use core::fmt;
use grid_util::point::Point;
use log::{debug, info};
use petgraph::unionfind::UnionFind;
use smallvec::SmallVec;

/// [TerrainGrid] is the authoritative terrain model: a fixed-size, row-major array of [Cell]s,
/// the designated start and end of the map and a [UnionFind] structure recording which walkable
/// cells are 4-connected. The components are kept exact when cells are unblocked; blocking a cell
/// can split a component, so it only flags them as dirty until [update](Self::update) is called.
#[derive(Clone, Debug)]
pub struct TerrainGrid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    start: Point,
    end: Point,
    min_base_cost: f32,
    pub slow_multiplier_cap: f32,
    pub components: UnionFind<usize>,
    pub components_dirty: bool,
}

impl TerrainGrid {
    /// Creates a fully walkable grid. Start and end default to opposite corners.
    pub fn new(width: usize, height: usize) -> TerrainGrid {
        debug_assert!(width > 0 && height > 0, "grid must not be empty");
        let mut grid = TerrainGrid {
            width,
            height,
            cells: vec![Cell::default(); width * height],
            start: Point::new(0, 0),
            end: Point::new(width as i32 - 1, height as i32 - 1),
            min_base_cost: DEFAULT_BASE_COST,
            slow_multiplier_cap: SLOW_MULTIPLIER_CAP,
            components: UnionFind::new(width * height),
            components_dirty: false,
        };
        grid.generate_components();
        grid
    }
    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }
    pub fn point_in_bounds(&self, point: Point) -> bool {
        self.in_bounds(point.x, point.y)
    }
    fn ix(&self, x: i32, y: i32) -> usize {
        debug_assert!(self.in_bounds(x, y));
        y as usize * self.width + x as usize
    }
    /// Flat index of an in-bounds point into the cell storage.
    pub fn get_ix_point(&self, point: &Point) -> usize {
        self.ix(point.x, point.y)
    }
    pub fn get_cell(&self, x: i32, y: i32) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            Some(&self.cells[self.ix(x, y)])
        } else {
            None
        }
    }
    fn get_cell_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        if self.in_bounds(x, y) {
            let ix = self.ix(x, y);
            Some(&mut self.cells[ix])
        } else {
            None
        }
    }

    pub fn start(&self) -> Point {
        self.start
    }
    pub fn end(&self) -> Point {
        self.end
    }
    pub fn set_start_end(&mut self, start: Point, end: Point) {
        self.start = start;
        self.end = end;
    }

    /// The in-bounds orthogonal neighbours of a point in the fixed order up, down, left, right.
    /// Walkability is not considered.
    pub fn neighbors(&self, point: &Point) -> SmallVec<[Point; 4]> {
        [
            Point::new(point.x, point.y - 1),
            Point::new(point.x, point.y + 1),
            Point::new(point.x - 1, point.y),
            Point::new(point.x + 1, point.y),
        ]
        .into_iter()
        .filter(|p| self.point_in_bounds(*p))
        .collect()
    }
    /// False when out of bounds or blocked.
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.get_cell(x, y).is_some_and(|cell| cell.walkable)
    }
    pub fn can_move_to(&self, point: Point) -> bool {
        self.is_walkable(point.x, point.y)
    }
    /// Lower bound on the cost of entering any cell. Slow effects only raise costs, so the smallest
    /// base cost is enough.
    pub fn min_base_cost(&self) -> f32 {
        self.min_base_cost
    }
    /// Effective cost of entering a cell, `None` when out of bounds.
    pub fn movement_cost(&self, point: &Point) -> Option<f32> {
        self.get_cell(point.x, point.y).map(Cell::movement_cost)
    }

    /// Blocks or unblocks a cell. Joins newly connected components and flags the components as
    /// dirty if they are (potentially) broken apart. Connectivity between start and end is not
    /// checked here; see [RepathCoordinator](crate::RepathCoordinator).
    pub fn set_obstacle(&mut self, x: i32, y: i32, blocked: bool) {
        let Some(cell) = self.get_cell_mut(x, y) else {
            debug!("Ignoring obstacle change outside the grid at ({x}, {y})");
            return;
        };
        let was_walkable = cell.walkable;
        cell.walkable = !blocked;
        if blocked {
            if was_walkable {
                self.components_dirty = true;
            }
        } else {
            let p = Point::new(x, y);
            let p_ix = self.get_ix_point(&p);
            for n in self.neighbors(&p) {
                if self.can_move_to(n) {
                    let n_ix = self.get_ix_point(&n);
                    self.components.union(p_ix, n_ix);
                }
            }
        }
    }
    /// Sets the intrinsic cost of a cell. Negative costs are raised to zero, NaN is ignored.
    pub fn set_base_cost(&mut self, x: i32, y: i32, cost: f32) {
        if cost.is_nan() {
            return;
        }
        let cost = cost.max(0.0);
        let Some(cell) = self.get_cell_mut(x, y) else {
            return;
        };
        let old = cell.base_cost;
        cell.base_cost = cost;
        if cost < self.min_base_cost {
            self.min_base_cost = cost;
        } else if old <= self.min_base_cost && cost > old {
            // The cheapest cell got more expensive
            self.min_base_cost = self
                .cells
                .iter()
                .map(|c| c.base_cost)
                .fold(f32::INFINITY, f32::min);
        }
    }

    /// Raises the slow multiplier of every walkable cell within Chebyshev distance `radius` of the
    /// center by `delta`, clamped to [slow_multiplier_cap](Self::slow_multiplier_cap). Overlapping
    /// zones stack additively up to the cap.
    pub fn apply_cost_modifier(&mut self, center_x: i32, center_y: i32, radius: i32, delta: f32) {
        if radius < 0 || delta.is_nan() || delta <= 0.0 {
            debug!("Ignoring cost modifier with radius {radius} and delta {delta}");
            return;
        }
        let cap = self.slow_multiplier_cap;
        let x_min = center_x.saturating_sub(radius).max(0);
        let y_min = center_y.saturating_sub(radius).max(0);
        let x_max = center_x.saturating_add(radius).min(self.width as i32 - 1);
        let y_max = center_y.saturating_add(radius).min(self.height as i32 - 1);
        for y in y_min..=y_max {
            for x in x_min..=x_max {
                let ix = self.ix(x, y);
                let cell = &mut self.cells[ix];
                if cell.walkable {
                    cell.add_slow(delta, cap);
                }
            }
        }
        debug!("Applied slow delta {delta} around ({center_x}, {center_y}) with radius {radius}");
    }
    /// Clears every slow effect. Must run once per tick before that tick's modifiers are applied.
    pub fn reset_cost_modifiers(&mut self) {
        self.cells.iter_mut().for_each(Cell::reset_slow);
    }

    /// Sum of the movement costs of every cell entered along the path. The first cell is where the
    /// path starts and is not entered.
    pub fn path_cost(&self, path: &[Point]) -> f32 {
        path.iter()
            .skip(1)
            .filter_map(|p| self.movement_cost(p))
            .sum()
    }

    /// Checks if start and goal are on the same component.
    pub fn reachable(&self, start: &Point, goal: &Point) -> bool {
        !self.unreachable(start, goal)
    }
    /// Checks if start and goal are not on the same component. Blocked or out-of-bounds endpoints
    /// are unreachable.
    pub fn unreachable(&self, start: &Point, goal: &Point) -> bool {
        if self.can_move_to(*start) && self.can_move_to(*goal) {
            let start_ix = self.get_ix_point(start);
            let goal_ix = self.get_ix_point(goal);
            !self.components.equiv(start_ix, goal_ix)
        } else {
            true
        }
    }

    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            self.generate_components();
        }
    }
    /// Generates a new [UnionFind] structure and links up walkable neighbours to the same
    /// components.
    pub fn generate_components(&mut self) {
        let w = self.width as i32;
        let h = self.height as i32;
        self.components = UnionFind::new(self.width * self.height);
        self.components_dirty = false;
        for y in 0..h {
            for x in 0..w {
                if !self.is_walkable(x, y) {
                    continue;
                }
                let parent_ix = self.ix(x, y);
                for p in [Point::new(x + 1, y), Point::new(x, y + 1)] {
                    if self.can_move_to(p) {
                        let ix = self.get_ix_point(&p);
                        self.components.union(parent_ix, ix);
                    }
                }
            }
        }
        info!("Generated connected components for {w}x{h} grid");
    }
}

impl fmt::Display for TerrainGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let p = Point::new(x, y);
                let c = if p == self.start {
                    'S'
                } else if p == self.end {
                    'E'
                } else {
                    match self.get_cell(x, y) {
                        Some(cell) if !cell.walkable => '#',
                        Some(cell) if cell.is_slowed() => '~',
                        _ => '.',
                    }
                };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbour_order_is_up_down_left_right() {
        let grid = TerrainGrid::new(3, 3);
        let n = grid.neighbors(&Point::new(1, 1));
        assert_eq!(
            n.as_slice(),
            &[
                Point::new(1, 0),
                Point::new(1, 2),
                Point::new(0, 1),
                Point::new(2, 1)
            ]
        );
    }

    #[test]
    fn corner_has_two_neighbours() {
        let grid = TerrainGrid::new(3, 3);
        let n = grid.neighbors(&Point::new(0, 0));
        assert_eq!(n.as_slice(), &[Point::new(0, 1), Point::new(1, 0)]);
        let n = grid.neighbors(&Point::new(2, 2));
        assert_eq!(n.as_slice(), &[Point::new(2, 1), Point::new(1, 2)]);
    }

    #[test]
    fn walkability_and_bounds() {
        let mut grid = TerrainGrid::new(4, 2);
        assert!(grid.is_walkable(3, 1));
        assert!(!grid.is_walkable(4, 1));
        assert!(!grid.is_walkable(-1, 0));
        grid.set_obstacle(2, 1, true);
        assert!(!grid.is_walkable(2, 1));
        grid.set_obstacle(2, 1, false);
        assert!(grid.is_walkable(2, 1));
        // Out-of-bounds changes are ignored
        grid.set_obstacle(9, 9, true);
    }

    #[test]
    fn modifier_uses_chebyshev_radius() {
        let mut grid = TerrainGrid::new(5, 5);
        grid.apply_cost_modifier(2, 2, 1, 0.5);
        for y in 0..5 {
            for x in 0..5 {
                let expected = if (x - 2_i32).abs() <= 1 && (y - 2_i32).abs() <= 1 {
                    1.5
                } else {
                    1.0
                };
                assert_eq!(grid.get_cell(x, y).unwrap().slow_multiplier, expected);
            }
        }
    }

    #[test]
    fn modifier_skips_blocked_cells_and_clips_to_grid() {
        let mut grid = TerrainGrid::new(3, 3);
        grid.set_obstacle(1, 0, true);
        grid.apply_cost_modifier(0, 0, 1, 0.25);
        assert_eq!(grid.get_cell(1, 0).unwrap().slow_multiplier, 1.0);
        assert_eq!(grid.get_cell(0, 1).unwrap().slow_multiplier, 1.25);
        assert_eq!(grid.get_cell(2, 2).unwrap().slow_multiplier, 1.0);
    }

    #[test]
    fn overlapping_modifiers_stack_up_to_cap() {
        let mut grid = TerrainGrid::new(3, 3);
        grid.apply_cost_modifier(1, 1, 0, 0.5);
        grid.apply_cost_modifier(1, 1, 0, 0.5);
        let cell = grid.get_cell(1, 1).unwrap();
        assert_eq!(cell.slow_multiplier, SLOW_MULTIPLIER_CAP);
        assert_eq!(grid.movement_cost(&Point::new(1, 1)), Some(SLOW_MULTIPLIER_CAP));
    }

    #[test]
    fn invalid_modifiers_are_ignored() {
        let mut grid = TerrainGrid::new(3, 3);
        grid.apply_cost_modifier(1, 1, -1, 0.5);
        grid.apply_cost_modifier(1, 1, 1, -0.5);
        grid.apply_cost_modifier(1, 1, 1, f32::NAN);
        assert!(grid.cells.iter().all(|c| c.slow_multiplier == 1.0));
    }

    #[test]
    fn reset_clears_all_modifiers() {
        let mut grid = TerrainGrid::new(4, 4);
        grid.apply_cost_modifier(1, 1, 2, 0.4);
        grid.reset_cost_modifiers();
        assert!(grid.cells.iter().all(|c| c.slow_multiplier == 1.0));
    }

    #[test]
    fn base_cost_is_never_negative() {
        let mut grid = TerrainGrid::new(2, 2);
        grid.set_base_cost(0, 1, 3.0);
        assert_eq!(grid.movement_cost(&Point::new(0, 1)), Some(3.0));
        grid.set_base_cost(0, 1, -2.0);
        assert_eq!(grid.movement_cost(&Point::new(0, 1)), Some(0.0));
        grid.set_base_cost(0, 1, f32::NAN);
        assert_eq!(grid.movement_cost(&Point::new(0, 1)), Some(0.0));
    }

    #[test]
    fn min_base_cost_follows_cheapest_cell() {
        let mut grid = TerrainGrid::new(3, 3);
        assert_eq!(grid.min_base_cost(), 1.0);
        grid.set_base_cost(1, 1, 0.5);
        grid.set_base_cost(2, 2, 0.25);
        assert_eq!(grid.min_base_cost(), 0.25);
        grid.set_base_cost(2, 2, 3.0);
        assert_eq!(grid.min_base_cost(), 0.5);
        grid.set_base_cost(1, 1, 2.0);
        assert_eq!(grid.min_base_cost(), 1.0);
        grid.set_base_cost(0, 0, -4.0);
        assert_eq!(grid.min_base_cost(), 0.0);
    }

    #[test]
    fn path_cost_skips_first_cell() {
        let mut grid = TerrainGrid::new(3, 1);
        grid.set_base_cost(0, 0, 10.0);
        grid.apply_cost_modifier(2, 0, 0, 0.5);
        let path = [Point::new(0, 0), Point::new(1, 0), Point::new(2, 0)];
        assert_eq!(grid.path_cost(&path), 2.5);
    }

    /// Tests whether points are correctly mapped to different connected components
    #[test]
    fn test_component_generation() {
        // Corresponds to the following 3x2 grid:
        //  ___
        // | # |
        // | # |
        //  ___
        let mut grid = TerrainGrid::new(3, 2);
        grid.set_obstacle(1, 0, true);
        grid.set_obstacle(1, 1, true);
        assert!(grid.components_dirty);
        grid.update();
        assert!(!grid.components_dirty);
        let p1 = Point::new(0, 0);
        let p2 = Point::new(0, 1);
        let p3 = Point::new(2, 0);
        assert!(grid.reachable(&p1, &p2));
        assert!(grid.unreachable(&p1, &p3));
        assert!(grid.unreachable(&p1, &Point::new(1, 0)));
    }

    #[test]
    fn unblocking_joins_components_without_regeneration() {
        let mut grid = TerrainGrid::new(3, 1);
        grid.set_obstacle(1, 0, true);
        grid.update();
        assert!(grid.unreachable(&Point::new(0, 0), &Point::new(2, 0)));
        grid.set_obstacle(1, 0, false);
        assert!(!grid.components_dirty);
        assert!(grid.reachable(&Point::new(0, 0), &Point::new(2, 0)));
    }

    #[test]
    fn display_marks_cells() {
        let mut grid = TerrainGrid::new(3, 2);
        grid.set_obstacle(1, 0, true);
        grid.apply_cost_modifier(1, 1, 0, 0.2);
        assert_eq!(grid.to_string(), "S#.\n.~E\n");
    }
}
