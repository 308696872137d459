use crate::manhattan_distance;
use crate::open_list::{OpenEntry, OpenList};
use crate::terrain::TerrainGrid;
use fxhash::FxBuildHasher;
use grid_util::point::Point;
use indexmap::map::Entry::{Occupied, Vacant};
use indexmap::IndexMap;
use log::{debug, info, warn};

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Marks the start node, which has no parent.
const NO_PARENT: usize = usize::MAX;

/// Lifecycle of a single query. Invalid endpoints leave the search [Idle](SearchState::Idle).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchState {
    #[default]
    Idle,
    Running,
    Found,
    Exhausted,
}

/// Per-query bookkeeping for a visited cell. Presence in the [SearchContext] is what marks a cell
/// as visited, so a genuine cost of zero is never mistaken for "unvisited".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scratch {
    /// Index of the parent in the scratch map, `usize::MAX` for the start.
    pub parent: usize,
    pub g_cost: f32,
    pub h_cost: f32,
    pub closed: bool,
}

/// Scratch storage owned by a search and reused between queries. The open list refers to visited
/// cells by their index in the scratch map, which acts as the weak back-reference for path
/// reconstruction.
#[derive(Clone, Debug, Default)]
pub struct SearchContext {
    scratch: FxIndexMap<Point, Scratch>,
    open: OpenList<usize>,
    expanded: usize,
}

impl SearchContext {
    pub fn new() -> SearchContext {
        SearchContext::default()
    }
    /// Forgets everything about the previous query while keeping the allocations.
    pub fn reset(&mut self) {
        self.scratch.clear();
        self.open.clear();
        self.expanded = 0;
    }
    pub fn scratch(&self, point: &Point) -> Option<&Scratch> {
        self.scratch.get(point)
    }
    pub fn visited(&self) -> usize {
        self.scratch.len()
    }
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    fn reverse_path(&self, start: usize) -> Vec<Point> {
        let mut i = start;
        let mut path: Vec<Point> = std::iter::from_fn(|| {
            self.scratch.get_index(i).map(|(node, value)| {
                i = value.parent;
                *node
            })
        })
        .collect();
        path.reverse();
        path
    }
}

/// A* over a [TerrainGrid] with the Manhattan distance as heuristic, scaled by the grid's
/// [min_base_cost](TerrainGrid::min_base_cost) so that it never overestimates.
#[derive(Clone, Debug)]
pub struct AstarSearch {
    /// Scales the heuristic. 1.0 is plain A*, 0.0 makes the search behave like Dijkstra and values
    /// above 1.0 give weighted A*, which expands fewer cells but may return longer paths.
    pub heuristic_factor: f32,
    context: SearchContext,
    state: SearchState,
}

impl Default for AstarSearch {
    fn default() -> AstarSearch {
        AstarSearch::new()
    }
}

impl AstarSearch {
    pub fn new() -> AstarSearch {
        AstarSearch {
            heuristic_factor: 1.0,
            context: SearchContext::new(),
            state: SearchState::Idle,
        }
    }
    /// Uniform-cost search, useful as a reference for the heuristic search.
    pub fn dijkstra() -> AstarSearch {
        AstarSearch {
            heuristic_factor: 0.0,
            ..AstarSearch::new()
        }
    }
    /// Outcome of the last query.
    pub fn state(&self) -> SearchState {
        self.state
    }
    /// Number of cells expanded by the last query.
    pub fn expanded(&self) -> usize {
        self.context.expanded()
    }
    pub fn context(&self) -> &SearchContext {
        &self.context
    }

    /// Computes a path from start to end, both included, in which every cell is walkable. Returns
    /// an empty path if either endpoint is outside the grid or blocked, or if the end cannot be
    /// reached. A walkable start equal to the end yields the single-cell path.
    pub fn find_path(&mut self, grid: &TerrainGrid, start: Point, end: Point) -> Vec<Point> {
        self.find_path_inspect(grid, start, end, |_, _| {})
    }

    /// Like [find_path](Self::find_path), but the start may be blocked, for an agent standing on a
    /// cell that was just turned into an obstacle. The returned path then begins with that blocked
    /// cell and is walkable from the second cell on.
    pub fn find_escape_path(&mut self, grid: &TerrainGrid, start: Point, end: Point) -> Vec<Point> {
        self.search(grid, start, end, true, |_, _| {})
            .map(|(path, _cost)| path)
            .unwrap_or_default()
    }

    /// Like [find_path](Self::find_path), but also returns the summed movement cost of the path.
    pub fn find_path_and_cost(
        &mut self,
        grid: &TerrainGrid,
        start: Point,
        end: Point,
    ) -> Option<(Vec<Point>, f32)> {
        self.search(grid, start, end, false, |_, _| {})
    }

    /// Like [find_path](Self::find_path), calling `on_expand` with every cell taken off the open
    /// list for expansion, together with its total cost estimate.
    pub fn find_path_inspect<F>(
        &mut self,
        grid: &TerrainGrid,
        start: Point,
        end: Point,
        on_expand: F,
    ) -> Vec<Point>
    where
        F: FnMut(Point, f32),
    {
        self.search(grid, start, end, false, on_expand)
            .map(|(path, _cost)| path)
            .unwrap_or_default()
    }

    fn search<F>(
        &mut self,
        grid: &TerrainGrid,
        start: Point,
        end: Point,
        allow_blocked_start: bool,
        mut on_expand: F,
    ) -> Option<(Vec<Point>, f32)>
    where
        F: FnMut(Point, f32),
    {
        self.state = SearchState::Idle;
        self.context.reset();
        if !grid.point_in_bounds(start) || !grid.point_in_bounds(end) {
            debug!("Endpoint outside the grid: {start} -> {end}");
            return None;
        }
        if !allow_blocked_start && !grid.can_move_to(start) {
            debug!("Start {start} is blocked");
            self.state = SearchState::Exhausted;
            return None;
        }
        if start == end {
            self.state = SearchState::Found;
            return Some((vec![start], 0.0));
        }
        if !grid.can_move_to(end) {
            debug!("End {end} is blocked");
            self.state = SearchState::Exhausted;
            return None;
        }
        // A clean component table lets unreachable goals be rejected without flood-filling.
        if !grid.components_dirty && grid.can_move_to(start) && grid.unreachable(&start, &end) {
            info!("{end} is not reachable from {start}");
            self.state = SearchState::Exhausted;
            return None;
        }

        self.state = SearchState::Running;
        let h_scale = self.heuristic_factor * grid.min_base_cost();
        let heuristic = |p: &Point| manhattan_distance(p, &end) as f32 * h_scale;
        let start_h = heuristic(&start);
        self.context.scratch.insert(
            start,
            Scratch {
                parent: NO_PARENT,
                g_cost: 0.0,
                h_cost: start_h,
                closed: false,
            },
        );
        self.context.open.push(OpenEntry::new(0, 0.0, start_h));

        while let Some(OpenEntry { g_cost, node: index, .. }) = self.context.open.pop() {
            let point = {
                let Some((node, scratch)) = self.context.scratch.get_index_mut(index) else {
                    continue;
                };
                // The same cell may have been queued several times when a cheaper way to reach
                // it was found. Only the best, still open entry is expanded.
                if scratch.closed || g_cost > scratch.g_cost {
                    continue;
                }
                scratch.closed = true;
                on_expand(*node, g_cost + scratch.h_cost);
                *node
            };
            self.context.expanded += 1;

            if point == end {
                self.state = SearchState::Found;
                return Some((self.context.reverse_path(index), g_cost));
            }

            for neighbor in grid.neighbors(&point) {
                let move_cost = match grid.get_cell(neighbor.x, neighbor.y) {
                    Some(cell) if cell.walkable => cell.movement_cost(),
                    _ => continue,
                };
                let new_cost = g_cost + move_cost;
                let h;
                let n;
                match self.context.scratch.entry(neighbor) {
                    Vacant(e) => {
                        h = heuristic(e.key());
                        n = e.index();
                        e.insert(Scratch {
                            parent: index,
                            g_cost: new_cost,
                            h_cost: h,
                            closed: false,
                        });
                    }
                    Occupied(mut e) => {
                        let scratch = e.get_mut();
                        if scratch.closed || scratch.g_cost <= new_cost {
                            continue;
                        }
                        scratch.parent = index;
                        scratch.g_cost = new_cost;
                        h = scratch.h_cost;
                        n = e.index();
                    }
                }
                self.context.open.push(OpenEntry::new(n, new_cost, h));
            }
        }

        self.state = SearchState::Exhausted;
        if !grid.components_dirty && grid.reachable(&start, &end) {
            warn!(
                "Reachable goal {end} could not be pathed to from {start}, check the components"
            );
        } else {
            debug!("Open list exhausted without reaching {end} from {start}");
        }
        None
    }
}
