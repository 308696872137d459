use grid_repath::{RepathConfig, RepathCoordinator, RoutedAgent, TerrainGrid};
use grid_util::point::Point;

// Towers are placed one by one on a 10x6 map. Each placement is only accepted if enemies can
// still reach the end, and every accepted placement reroutes the enemies already on the map.

struct Enemy {
    name: &'static str,
    position: (f32, f32),
    path: Vec<Point>,
}

impl RoutedAgent for Enemy {
    fn world_position(&self) -> (f32, f32) {
        self.position
    }
    fn set_path(&mut self, path: Vec<Point>) {
        self.path = path;
    }
}

fn main() {
    let mut grid = TerrainGrid::new(10, 6);
    grid.set_start_end(Point::new(0, 3), Point::new(9, 3));
    let mut coordinator = RepathCoordinator::new(grid, RepathConfig::default());
    let mut enemies = vec![
        Enemy {
            name: "runner",
            position: (3.5 * 32.0, 3.5 * 32.0),
            path: Vec::new(),
        },
        Enemy {
            name: "tank",
            position: (6.5 * 32.0, 1.5 * 32.0),
            path: Vec::new(),
        },
    ];
    for y in 0..6 {
        match coordinator.try_place_obstacle(5, y, &mut enemies) {
            Ok(path) => println!("Tower at (5, {y}) accepted, path now has {} cells", path.len()),
            Err(e) => println!("Tower at (5, {y}) refused: {e}"),
        }
    }
    println!("{}", coordinator.grid());
    for enemy in &enemies {
        println!("{} follows {:?}", enemy.name, enemy.path);
    }
}
