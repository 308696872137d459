//! Decides when paths are recomputed and from where as the terrain changes between ticks.
//!
//! Topology changes (obstacles placed or removed) recompute the cached start-to-end path and
//! reroute every active agent from the cell it currently occupies. Slow zones never trigger a
//! search: they only feed into the movement costs seen by later searches and are rebuilt from
//! scratch every tick.
use crate::search::AstarSearch;
use crate::terrain::TerrainGrid;
use crate::DEFAULT_CELL_SIZE;
use core::fmt;
use grid_util::point::Point;
use log::{debug, info};
use smallvec::SmallVec;

/// An agent walking the grid. Agents are owned by the caller; the coordinator only reads their
/// position and hands them new routes.
pub trait RoutedAgent {
    /// Current position in world units.
    fn world_position(&self) -> (f32, f32);
    /// Replaces the remaining route of the agent.
    fn set_path(&mut self, path: Vec<Point>);
}

impl<T: RoutedAgent + ?Sized> RoutedAgent for Box<T> {
    fn world_position(&self) -> (f32, f32) {
        (**self).world_position()
    }
    fn set_path(&mut self, path: Vec<Point>) {
        (**self).set_path(path)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RepathConfig {
    /// Side length of a cell in world units.
    pub cell_size: f32,
}

impl Default for RepathConfig {
    fn default() -> RepathConfig {
        RepathConfig {
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

/// Reasons an obstacle placement is refused. In every case the grid is left untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementError {
    OutOfBounds { x: i32, y: i32 },
    AlreadyBlocked { x: i32, y: i32 },
    /// The cell is the designated start or end.
    OnEndpoint { x: i32, y: i32 },
    /// Blocking the cell would leave no path from start to end.
    WouldDisconnect { x: i32, y: i32 },
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlacementError::OutOfBounds { x, y } => {
                write!(f, "cell ({x}, {y}) is outside the grid")
            }
            PlacementError::AlreadyBlocked { x, y } => {
                write!(f, "cell ({x}, {y}) is already blocked")
            }
            PlacementError::OnEndpoint { x, y } => {
                write!(f, "cell ({x}, {y}) is the start or end of the map")
            }
            PlacementError::WouldDisconnect { x, y } => {
                write!(f, "blocking cell ({x}, {y}) would cut the start off from the end")
            }
        }
    }
}

impl std::error::Error for PlacementError {}

/// Outcome of rerouting the active agents after a topology change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RerouteReport {
    /// Agents that received a fresh route.
    pub rerouted: usize,
    /// Agents for which no route exists any more; they keep walking their old one.
    pub kept_stale: usize,
    /// Agents whose position does not map onto the grid.
    pub off_grid: usize,
}

/// Owns the terrain and the search, and keeps the canonical start-to-end path in sync with
/// obstacle changes. Obstacles normally go through
/// [try_place_obstacle](Self::try_place_obstacle) and [remove_obstacle](Self::remove_obstacle);
/// unchecked terrain edits such as moving the endpoints or changing base costs go through
/// [edit_terrain](Self::edit_terrain), which refreshes the cached path afterwards.
#[derive(Clone, Debug)]
pub struct RepathCoordinator {
    grid: TerrainGrid,
    search: AstarSearch,
    cached_path: Vec<Point>,
    pub config: RepathConfig,
}

impl RepathCoordinator {
    pub fn new(grid: TerrainGrid, config: RepathConfig) -> RepathCoordinator {
        let mut coordinator = RepathCoordinator {
            grid,
            search: AstarSearch::new(),
            cached_path: Vec::new(),
            config,
        };
        coordinator.grid.update();
        coordinator.recompute_cached_path();
        info!(
            "Initial path calculated with {} cells",
            coordinator.cached_path.len()
        );
        coordinator
    }
    pub fn grid(&self) -> &TerrainGrid {
        &self.grid
    }
    /// The search used for every query, e.g. to change its heuristic factor. Call
    /// [recompute_cached_path](Self::recompute_cached_path) to apply a change to the cached path.
    pub fn search_mut(&mut self) -> &mut AstarSearch {
        &mut self.search
    }
    /// Runs an arbitrary edit on the terrain, then regenerates the components if needed and
    /// recomputes the cached path. Unlike [try_place_obstacle](Self::try_place_obstacle) nothing
    /// is validated, so the cached path may end up empty. Agents are not rerouted; call
    /// [reroute_agents](Self::reroute_agents) for that.
    pub fn edit_terrain<F>(&mut self, edit: F) -> &[Point]
    where
        F: FnOnce(&mut TerrainGrid),
    {
        edit(&mut self.grid);
        self.grid.update();
        self.recompute_cached_path()
    }
    /// The current start-to-end path, empty when none exists.
    pub fn cached_path(&self) -> &[Point] {
        &self.cached_path
    }

    pub fn find_path(&mut self, start: Point, end: Point) -> Vec<Point> {
        self.search.find_path(&self.grid, start, end)
    }
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.grid.is_walkable(x, y)
    }
    pub fn neighbors(&self, x: i32, y: i32) -> SmallVec<[Point; 4]> {
        self.grid.neighbors(&Point::new(x, y))
    }

    /// Starts a new tick by clearing last tick's slow effects. Call before any
    /// [apply_slow_zone](Self::apply_slow_zone) of the tick.
    pub fn begin_tick(&mut self) {
        self.grid.reset_cost_modifiers();
    }
    /// Registers a slow zone for the current tick. Costs change but topology does not, so no path
    /// is recomputed.
    pub fn apply_slow_zone(&mut self, center_x: i32, center_y: i32, radius: i32, delta: f32) {
        self.grid
            .apply_cost_modifier(center_x, center_y, radius, delta);
    }

    /// Recomputes the cached start-to-end path.
    pub fn recompute_cached_path(&mut self) -> &[Point] {
        let (start, end) = (self.grid.start(), self.grid.end());
        self.cached_path = self.search.find_path(&self.grid, start, end);
        &self.cached_path
    }
    /// Recomputes the cached path only if there currently is none, e.g. before spawning agents.
    pub fn ensure_cached_path(&mut self) -> &[Point] {
        if self.cached_path.is_empty() {
            debug!("No cached path, recalculating");
            self.recompute_cached_path();
        }
        &self.cached_path
    }

    /// Maps a world position onto the cell containing it, `None` when outside the grid.
    pub fn world_to_cell(&self, x: f32, y: f32) -> Option<Point> {
        let size = self.config.cell_size;
        if !(size > 0.0) || !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return None;
        }
        let cell = Point::new((x / size).floor() as i32, (y / size).floor() as i32);
        self.grid.point_in_bounds(cell).then_some(cell)
    }

    /// Tentatively blocks a cell and commits the change only if the end stays reachable from the
    /// start. On success the new cached path is returned and all agents are rerouted; on failure
    /// the cell is exactly as walkable as before the call.
    pub fn try_place_obstacle<A: RoutedAgent>(
        &mut self,
        x: i32,
        y: i32,
        agents: &mut [A],
    ) -> Result<&[Point], PlacementError> {
        let cell = Point::new(x, y);
        if !self.grid.point_in_bounds(cell) {
            return Err(PlacementError::OutOfBounds { x, y });
        }
        if cell == self.grid.start() || cell == self.grid.end() {
            return Err(PlacementError::OnEndpoint { x, y });
        }
        if !self.grid.can_move_to(cell) {
            return Err(PlacementError::AlreadyBlocked { x, y });
        }

        self.grid.set_obstacle(x, y, true);
        self.grid.update();
        let (start, end) = (self.grid.start(), self.grid.end());
        let path = self.search.find_path(&self.grid, start, end);
        if path.is_empty() {
            // Unblocking rejoins the components, so they stay exact after the rollback.
            self.grid.set_obstacle(x, y, false);
            info!("Rejected obstacle at {cell}: it would seal off {end}");
            return Err(PlacementError::WouldDisconnect { x, y });
        }
        info!("Placed obstacle at {cell}, new path has {} cells", path.len());
        self.cached_path = path;
        self.reroute_agents(agents);
        Ok(self.cached_path.as_slice())
    }

    /// Unblocks a cell, then refreshes the cached path and reroutes the agents. Returns false if
    /// the cell was not blocked.
    pub fn remove_obstacle<A: RoutedAgent>(&mut self, x: i32, y: i32, agents: &mut [A]) -> bool {
        if !self.grid.in_bounds(x, y) || self.grid.is_walkable(x, y) {
            return false;
        }
        self.grid.set_obstacle(x, y, false);
        self.recompute_cached_path();
        self.reroute_agents(agents);
        info!("Removed obstacle at ({x}, {y})");
        true
    }

    /// Gives every agent a fresh route from its current cell to the end. An agent standing on a
    /// blocked cell is routed out of it. Agents without a route keep their old one and may walk
    /// into newly blocked cells.
    pub fn reroute_agents<A: RoutedAgent>(&mut self, agents: &mut [A]) -> RerouteReport {
        let end = self.grid.end();
        let mut report = RerouteReport::default();
        for agent in agents.iter_mut() {
            let (wx, wy) = agent.world_position();
            let Some(cell) = self.world_to_cell(wx, wy) else {
                report.off_grid += 1;
                continue;
            };
            let path = self.search.find_escape_path(&self.grid, cell, end);
            if path.is_empty() {
                debug!("No route from {cell}, agent keeps its current path");
                report.kept_stale += 1;
            } else {
                agent.set_path(path);
                report.rerouted += 1;
            }
        }
        info!(
            "Rerouted {} agents ({} kept stale paths, {} off the grid)",
            report.rerouted, report.kept_stale, report.off_grid
        );
        report
    }
}
