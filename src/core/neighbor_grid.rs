//! Uniform grid for neighbor queries
//!
//! Cells are one kernel radius wide so a 3x3 block around a particle's cell
//! always covers its support. Buckets are singly-linked lists stored as flat
//! index arrays: `cell_heads[c]` is the first particle in cell `c` and
//! `next[i]` the particle after `i` in the same cell.
//!
//! Cell coordinates are clamped to the interior of the grid, so particles in
//! or beyond the outer ring share the nearest interior cell. Near the domain
//! edge this can under-report neighbors.

use rayon::prelude::*;

use crate::config::{EPS, MAX_NEIGHBORS};
use crate::error::{SphError, SphResult};
use crate::math::{Point, Real};

const EMPTY: usize = usize::MAX;

#[derive(Clone, Debug)]
pub struct NeighborGrid {
    cell_size: Real,
    columns: usize,
    rows: usize,
    cell_heads: Vec<usize>,
    next: Vec<usize>,
    particle_cells: Vec<(usize, usize)>,
    // Fixed stride of MAX_NEIGHBORS per particle.
    neighbor_indices: Vec<usize>,
    neighbor_distances: Vec<Real>,
    neighbor_counts: Vec<usize>,
}

impl NeighborGrid {
    pub fn new(width: Real, height: Real, kernel_radius: Real) -> SphResult<Self> {
        let mut grid = Self {
            cell_size: 1.0,
            columns: 0,
            rows: 0,
            cell_heads: Vec::new(),
            next: Vec::new(),
            particle_cells: Vec::new(),
            neighbor_indices: Vec::new(),
            neighbor_distances: Vec::new(),
            neighbor_counts: Vec::new(),
        };
        grid.set_grid_resolution(width, height, kernel_radius)?;
        Ok(grid)
    }

    /// Resize the grid to cover `width x height` with cells of `kernel_radius`.
    ///
    /// Recorded neighbor lists are discarded; call [`build`](Self::build) again.
    pub fn set_grid_resolution(
        &mut self,
        width: Real,
        height: Real,
        kernel_radius: Real,
    ) -> SphResult<()> {
        if !(kernel_radius > 0.0 && kernel_radius.is_finite()) {
            return Err(SphError::InvalidKernelRadius(kernel_radius));
        }
        let columns = cell_count(width, kernel_radius);
        let rows = cell_count(height, kernel_radius);
        if columns < 3 || rows < 3 {
            return Err(SphError::GridTooSmall { columns, rows });
        }

        self.cell_size = kernel_radius;
        self.columns = columns;
        self.rows = rows;
        self.cell_heads.clear();
        self.cell_heads.resize(columns * rows, EMPTY);
        self.neighbor_counts.iter_mut().for_each(|count| *count = 0);
        Ok(())
    }

    pub fn cell_size(&self) -> Real {
        self.cell_size
    }

    /// Grid size in cells as `(columns, rows)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    /// Number of particles the per-particle arrays cover.
    pub fn len(&self) -> usize {
        self.neighbor_counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbor_counts.is_empty()
    }

    /// Clamped cell coordinate a point is bucketed into.
    #[inline]
    pub fn cell_of(&self, point: Point) -> (usize, usize) {
        (
            clamp_to_interior(point.x / self.cell_size, self.columns),
            clamp_to_interior(point.y / self.cell_size, self.rows),
        )
    }

    /// Rebuild buckets and neighbor lists from scratch for `points`.
    pub fn build(&mut self, points: &[Point]) {
        let count = points.len();
        self.resize_particles(count);

        self.cell_heads.iter_mut().for_each(|head| *head = EMPTY);

        // Prepending into a shared cell head is not race-free, so bucketing
        // stays sequential.
        for (index, &point) in points.iter().enumerate() {
            let (cx, cy) = self.cell_of(point);
            let cell = cx + cy * self.columns;
            self.next[index] = self.cell_heads[cell];
            self.cell_heads[cell] = index;
            self.particle_cells[index] = (cx, cy);
        }

        let Self {
            cell_size,
            columns,
            cell_heads,
            next,
            particle_cells,
            neighbor_indices,
            neighbor_distances,
            neighbor_counts,
            ..
        } = self;
        let cell_size_squared = *cell_size * *cell_size;
        let columns = *columns;
        let cell_heads = &*cell_heads;
        let next = &*next;
        let particle_cells = &*particle_cells;

        neighbor_indices
            .par_chunks_mut(MAX_NEIGHBORS)
            .zip(neighbor_distances.par_chunks_mut(MAX_NEIGHBORS))
            .zip(neighbor_counts.par_iter_mut())
            .enumerate()
            .for_each(|(i, ((indices, distances), found))| {
                let origin = points[i];
                let (cx, cy) = particle_cells[i];
                *found = 0;

                for x in cx - 1..=cx + 1 {
                    for y in cy - 1..=cy + 1 {
                        let mut candidate = cell_heads[x + y * columns];
                        while candidate != EMPTY {
                            let r2 = (points[candidate] - origin).length_squared();
                            if r2 >= EPS && r2 <= cell_size_squared && *found < MAX_NEIGHBORS {
                                indices[*found] = candidate;
                                distances[*found] = r2.sqrt();
                                *found += 1;
                            }
                            candidate = next[candidate];
                        }
                    }
                }
            });
    }

    /// Call `callback(neighbor, distance)` for every recorded neighbor of
    /// `origin`, in the order they were found.
    pub fn for_each_nearby_point<F>(&self, origin: usize, mut callback: F)
    where
        F: FnMut(usize, Real),
    {
        for (&neighbor, &distance) in self
            .neighbors(origin)
            .iter()
            .zip(self.distances(origin).iter())
        {
            callback(neighbor, distance);
        }
    }

    pub fn neighbor_count(&self, index: usize) -> usize {
        self.neighbor_counts[index]
    }

    pub fn neighbors(&self, index: usize) -> &[usize] {
        let start = index * MAX_NEIGHBORS;
        &self.neighbor_indices[start..start + self.neighbor_counts[index]]
    }

    /// Distances to the neighbors of `index`, in the same order as [`neighbors`](Self::neighbors).
    pub fn distances(&self, index: usize) -> &[Real] {
        let start = index * MAX_NEIGHBORS;
        &self.neighbor_distances[start..start + self.neighbor_counts[index]]
    }

    /// Size the per-particle arrays for `count` particles. Particles beyond
    /// the last build report no neighbors until the next one.
    pub(crate) fn resize_particles(&mut self, count: usize) {
        self.next.resize(count, EMPTY);
        self.particle_cells.resize(count, (1, 1));
        self.neighbor_indices.resize(count * MAX_NEIGHBORS, 0);
        self.neighbor_distances.resize(count * MAX_NEIGHBORS, 0.0);
        self.neighbor_counts.resize(count, 0);
    }
}

#[inline]
fn cell_count(extent: Real, cell_size: Real) -> usize {
    let cells = (extent / cell_size).floor();
    if cells.is_finite() && cells > 0.0 {
        cells as usize
    } else {
        0
    }
}

#[inline]
fn clamp_to_interior(scaled: Real, cells: usize) -> usize {
    // NaN saturates to 0 and lands in the first interior cell.
    let index = scaled.floor() as i64;
    index.clamp(1, cells as i64 - 2) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector;

    #[test]
    fn grid_dimensions_floor_the_domain() {
        let grid = NeighborGrid::new(12.5, 9.375, 0.18).unwrap();
        assert_eq!(grid.dimensions(), (69, 52));
    }

    #[test]
    fn tiny_domain_is_rejected() {
        let err = NeighborGrid::new(0.3, 10.0, 0.18).unwrap_err();
        assert!(matches!(err, SphError::GridTooSmall { columns: 1, .. }));
        assert!(matches!(
            NeighborGrid::new(10.0, 10.0, 0.0),
            Err(SphError::InvalidKernelRadius(_))
        ));
    }

    #[test]
    fn cells_are_clamped_to_interior() {
        let grid = NeighborGrid::new(10.0, 10.0, 1.0).unwrap();
        assert_eq!(grid.cell_of(Vector::new(-5.0, 0.2)), (1, 1));
        assert_eq!(grid.cell_of(Vector::new(9.9, 50.0)), (8, 8));
        assert_eq!(grid.cell_of(Vector::new(4.5, 3.2)), (4, 3));
        assert_eq!(grid.cell_of(Vector::new(Real::NAN, 3.2)), (1, 3));
    }

    #[test]
    fn coincident_and_distant_points_are_excluded() {
        let mut grid = NeighborGrid::new(10.0, 10.0, 1.0).unwrap();
        let points = vec![
            Vector::new(5.0, 5.0),
            Vector::new(5.0, 5.0),
            Vector::new(5.5, 5.0),
            Vector::new(7.5, 5.0),
        ];
        grid.build(&points);

        assert_eq!(grid.neighbors(0), &[2]);
        assert!((grid.distances(0)[0] - 0.5).abs() < 1e-12);
        assert_eq!(grid.neighbor_count(3), 0);
    }

    #[test]
    fn neighbor_lists_are_capped() {
        let mut grid = NeighborGrid::new(10.0, 10.0, 1.0).unwrap();
        let points: Vec<Vector> = (0..100)
            .map(|k| Vector::new(5.0 + 0.005 * (k % 10) as Real, 5.0 + 0.005 * (k / 10) as Real))
            .collect();
        grid.build(&points);

        for i in 0..points.len() {
            assert_eq!(grid.neighbor_count(i), MAX_NEIGHBORS);
        }
    }

    #[test]
    fn rebuild_replaces_previous_lists() {
        let mut grid = NeighborGrid::new(10.0, 10.0, 1.0).unwrap();
        grid.build(&[Vector::new(5.0, 5.0), Vector::new(5.2, 5.0)]);
        assert_eq!(grid.neighbor_count(0), 1);

        grid.build(&[Vector::new(5.0, 5.0), Vector::new(8.0, 5.0)]);
        assert_eq!(grid.neighbor_count(0), 0);
    }
}
