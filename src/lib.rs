//! # grid_repath
//!
//! A grid-based pathfinding system for maps whose traversal cost changes while agents are
//! walking them. Implements [A*](https://en.wikipedia.org/wiki/A*_search_algorithm) on a
//! 4-connected grid with the
//! [Manhattan distance](https://en.wikipedia.org/wiki/Taxicab_geometry) as heuristic.
//!
//! Every cell has an intrinsic base cost and a slow multiplier that is rebuilt once per tick from
//! the slow zones active in that tick. Obstacles are placed through a [RepathCoordinator], which
//! refuses any placement that would seal the goal off from the start and reroutes the agents that
//! are already on their way. Pre-computes
//! [connected components](https://en.wikipedia.org/wiki/Component_(graph_theory))
//! to avoid flood-filling behaviour if no path exists.
pub mod cell;
pub mod open_list;
pub mod repath;
pub mod search;
pub mod terrain;

pub use cell::Cell;
pub use open_list::OpenList;
pub use repath::{PlacementError, RepathConfig, RepathCoordinator, RerouteReport, RoutedAgent};
pub use search::{AstarSearch, SearchState};
pub use terrain::TerrainGrid;

use grid_util::point::Point;

/// Intrinsic traversal cost of a freshly created cell.
pub const DEFAULT_BASE_COST: f32 = 1.0;
/// Upper bound of the slow multiplier, no matter how many slow zones overlap.
pub const SLOW_MULTIPLIER_CAP: f32 = 1.7;
/// World units covered by one cell, used when mapping agent positions onto the grid.
pub const DEFAULT_CELL_SIZE: f32 = 32.0;

/// Manhattan distance between two points, the heuristic used by [AstarSearch].
pub fn manhattan_distance(a: &Point, b: &Point) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Checks that every pair of consecutive points in the path is 4-adjacent.
pub fn path_is_connected(path: &[Point]) -> bool {
    use itertools::Itertools;
    path.iter()
        .tuple_windows()
        .all(|(a, b)| manhattan_distance(a, b) == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_is_symmetric() {
        let a = Point::new(1, 5);
        let b = Point::new(4, 1);
        assert_eq!(manhattan_distance(&a, &b), 7);
        assert_eq!(manhattan_distance(&b, &a), 7);
        assert_eq!(manhattan_distance(&a, &a), 0);
    }

    #[test]
    fn connectivity_of_paths() {
        let straight = vec![Point::new(0, 0), Point::new(0, 1), Point::new(1, 1)];
        assert!(path_is_connected(&straight));
        let diagonal = vec![Point::new(0, 0), Point::new(1, 1)];
        assert!(!path_is_connected(&diagonal));
        let jump = vec![Point::new(0, 0), Point::new(0, 2)];
        assert!(!path_is_connected(&jump));
        assert!(path_is_connected(&[]));
        assert!(path_is_connected(&[Point::new(3, 3)]));
    }
}
