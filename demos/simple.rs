use grid_repath::{AstarSearch, TerrainGrid};
use grid_util::point::Point;

// In this example a path is found on a 3x3 grid with shape
//  ___
// |S  |
// | # |
// |  E|
//  ___
// where
// - # marks an obstacle
// - S marks the start
// - E marks the end
//
// Nodes have a 4-neighborhood

fn main() {
    let mut grid = TerrainGrid::new(3, 3);
    grid.set_obstacle(1, 1, true);
    grid.generate_components();
    println!("{}", grid);
    let start = Point::new(0, 0);
    let end = Point::new(2, 2);
    let path = AstarSearch::new().find_path(&grid, start, end);
    println!("Path:");
    for p in path {
        println!("{:?}", p);
    }
}
