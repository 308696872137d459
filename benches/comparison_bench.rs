use criterion::{criterion_group, criterion_main, Criterion};
use grid_repath::{AstarSearch, RepathConfig, RepathCoordinator, RoutedAgent, TerrainGrid};
use grid_util::point::Point;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;

fn random_grid(n: usize, rng: &mut StdRng) -> TerrainGrid {
    let mut grid = TerrainGrid::new(n, n);
    for x in 0..n as i32 {
        for y in 0..n as i32 {
            grid.set_obstacle(x, y, rng.gen_bool(0.25));
        }
    }
    grid.set_obstacle(0, 0, false);
    grid.set_obstacle(n as i32 - 1, n as i32 - 1, false);
    for _ in 0..n / 4 {
        let x = rng.gen_range(0..n as i32);
        let y = rng.gen_range(0..n as i32);
        grid.apply_cost_modifier(x, y, 2, 0.5);
    }
    grid.generate_components();
    grid
}

fn random_scenarios(n: usize, count: usize, rng: &mut StdRng) -> Vec<(Point, Point)> {
    (0..count)
        .map(|_| {
            (
                Point::new(rng.gen_range(0..n as i32), rng.gen_range(0..n as i32)),
                Point::new(rng.gen_range(0..n as i32), rng.gen_range(0..n as i32)),
            )
        })
        .collect()
}

fn search_bench(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    for n in [20, 64] {
        let grid = random_grid(n, &mut rng);
        let scenarios = random_scenarios(n, 100, &mut rng);
        let mut weighted = AstarSearch::new();
        weighted.heuristic_factor = 1.3;
        for (name, mut search) in [
            ("A*", AstarSearch::new()),
            ("weighted A*", weighted),
            ("Dijkstra", AstarSearch::dijkstra()),
        ] {
            c.bench_function(format!("{name}, {n}x{n}").as_str(), |b| {
                b.iter(|| {
                    for (start, end) in &scenarios {
                        black_box(search.find_path(&grid, *start, *end));
                    }
                })
            });
        }
    }
}

struct Dummy((f32, f32));

impl RoutedAgent for Dummy {
    fn world_position(&self) -> (f32, f32) {
        self.0
    }
    fn set_path(&mut self, path: Vec<Point>) {
        black_box(path);
    }
}

fn placement_bench(c: &mut Criterion) {
    const N: usize = 30;
    let mut rng = StdRng::seed_from_u64(1);
    let mut agents: Vec<Dummy> = (0..20)
        .map(|_| Dummy((rng.gen_range(0.0..N as f32 * 32.0), rng.gen_range(0.0..N as f32 * 32.0))))
        .collect();
    let cells: Vec<(i32, i32)> = (0..50)
        .map(|_| (rng.gen_range(1..N as i32 - 1), rng.gen_range(1..N as i32 - 1)))
        .collect();
    c.bench_function(format!("placement with 20 agents, {N}x{N}").as_str(), |b| {
        b.iter(|| {
            let mut coordinator =
                RepathCoordinator::new(TerrainGrid::new(N, N), RepathConfig::default());
            for (x, y) in &cells {
                let _ = black_box(coordinator.try_place_obstacle(*x, *y, &mut agents));
            }
        })
    });
}

criterion_group!(benches, search_bench, placement_bench);
criterion_main!(benches);
