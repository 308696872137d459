use grid_repath::{AstarSearch, TerrainGrid};
use grid_util::point::Point;

// Slow zones are rebuilt every tick. Here a frost aura sits on the straight route through a
// corridor for three ticks and is gone in the fourth; the route stays the same but its cost
// follows the aura.

fn main() {
    let mut grid = TerrainGrid::new(12, 3);
    let start = Point::new(0, 1);
    let end = Point::new(11, 1);
    let mut search = AstarSearch::new();
    for tick in 0..4 {
        grid.reset_cost_modifiers();
        if tick < 3 {
            grid.apply_cost_modifier(5, 1, 1, 0.3);
            grid.apply_cost_modifier(6, 1, 1, 0.3);
        }
        if let Some((path, cost)) = search.find_path_and_cost(&grid, start, end) {
            println!("tick {tick}: {} cells, cost {cost:.1}", path.len());
        }
        println!("{}", grid);
    }
}
