use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sph2d::config::{EPS, MAX_NEIGHBORS};
use sph2d::core::NeighborGrid;
use sph2d::math::{Real, Vector, distance};

const WIDTH: Real = 10.0;
const HEIGHT: Real = 8.0;
const H: Real = 0.5;

fn cloud(rng: &mut StdRng, count: usize, min: Vector, max: Vector) -> Vec<Vector> {
    (0..count)
        .map(|_| {
            Vector::new(
                rng.random_range(min.x..max.x),
                rng.random_range(min.y..max.y),
            )
        })
        .collect()
}

#[test]
fn reported_neighbors_are_within_kernel_radius() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut grid = NeighborGrid::new(WIDTH, HEIGHT, H).unwrap();

    // Sparse, medium and tightly packed clouds, some reaching past the walls.
    let cases = [
        (64, Vector::new(0.0, 0.0), Vector::new(WIDTH, HEIGHT)),
        (800, Vector::new(2.0, 2.0), Vector::new(5.0, 4.0)),
        (3000, Vector::new(4.0, 3.0), Vector::new(5.0, 4.0)),
        (500, Vector::new(-1.0, -1.0), Vector::new(WIDTH + 1.0, 1.0)),
    ];

    for (count, min, max) in cases {
        let points = cloud(&mut rng, count, min, max);
        grid.build(&points);

        for i in 0..points.len() {
            assert!(grid.neighbor_count(i) <= MAX_NEIGHBORS);
            for (&j, &recorded) in grid.neighbors(i).iter().zip(grid.distances(i)) {
                assert_ne!(i, j, "particle {} listed as its own neighbor", i);
                let actual = distance(points[i], points[j]);
                assert!(
                    actual <= H + 1e-12,
                    "neighbor {} of {} is {} away (n = {})",
                    j,
                    i,
                    actual,
                    count
                );
                assert!((actual - recorded).abs() < 1e-12);
            }
        }
    }
}

#[test]
fn small_interior_sets_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(23);
    let mut grid = NeighborGrid::new(WIDTH, HEIGHT, H).unwrap();

    // Keep every point out of the clamped outer ring of cells.
    let min = Vector::new(H, H);
    let max = Vector::new(WIDTH - H, HEIGHT - H);

    for round in 0..20 {
        let count = 8 + round * 2;
        // Squeeze later rounds into a small patch so lists are non-trivial.
        let patch_max = if round % 2 == 0 {
            max
        } else {
            Vector::new(min.x + 1.5, min.y + 1.5)
        };
        let points = cloud(&mut rng, count, min, patch_max);
        grid.build(&points);

        for i in 0..points.len() {
            let expected: BTreeSet<usize> = (0..points.len())
                .filter(|&j| {
                    let r2 = (points[j] - points[i]).length_squared();
                    r2 >= EPS && r2 <= H * H
                })
                .collect();
            let found: BTreeSet<usize> = grid.neighbors(i).iter().copied().collect();
            assert_eq!(found, expected, "round {} particle {}", round, i);
        }
    }
}

#[test]
fn neighbor_relation_is_symmetric_below_cap() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut grid = NeighborGrid::new(WIDTH, HEIGHT, H).unwrap();
    let points = cloud(&mut rng, 60, Vector::new(1.0, 1.0), Vector::new(3.0, 3.0));
    grid.build(&points);

    for i in 0..points.len() {
        for &j in grid.neighbors(i) {
            assert!(
                grid.neighbors(j).contains(&i),
                "{} sees {} but not the reverse",
                i,
                j
            );
        }
    }
}

#[test]
fn visitor_matches_recorded_lists() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut grid = NeighborGrid::new(WIDTH, HEIGHT, H).unwrap();
    let points = cloud(&mut rng, 200, Vector::new(1.0, 1.0), Vector::new(4.0, 4.0));
    grid.build(&points);

    for i in 0..points.len() {
        let mut visited = Vec::new();
        grid.for_each_nearby_point(i, |j, r| visited.push((j, r)));
        let recorded: Vec<(usize, Real)> = grid
            .neighbors(i)
            .iter()
            .copied()
            .zip(grid.distances(i).iter().copied())
            .collect();
        assert_eq!(visited, recorded);
    }
}
