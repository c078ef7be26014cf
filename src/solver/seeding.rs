//! Initial particle placement
//!
//! Both patterns are deterministic for a given parameter set. When the
//! requested count does not fit, [`SeedingPolicy`] decides between failing
//! and placing as many particles as the pattern holds.

use bevy::log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{SeedingPolicy, SphParams, ViscoelasticParams};
use crate::error::{SphError, SphResult};
use crate::math::{Real, Vector};

/// Lattice sites of the jittered grid for `params`, without jitter.
fn jittered_grid_sites(params: &SphParams) -> impl Iterator<Item = Vector> {
    let spacing = params.kernel_radius;
    let y_end = params.view_height - 2.0 * spacing;
    let x_start = params.view_width / 4.0;
    let x_end = params.view_width / 2.0;

    std::iter::successors(Some(spacing), move |y| Some(y + spacing))
        .take_while(move |&y| y < y_end)
        .flat_map(move |y| {
            std::iter::successors(Some(x_start), move |x| Some(x + spacing))
                .take_while(move |&x| x <= x_end)
                .map(move |x| Vector::new(x, y))
        })
}

/// Number of particles the jittered grid can place.
pub fn jittered_grid_capacity(params: &SphParams) -> usize {
    jittered_grid_sites(params).count()
}

/// Rows of lattice sites one kernel radius apart, filling the left-centre
/// quarter of the view from the bottom up. Each particle is offset by a
/// single uniform draw in `[0, 1)` on both axes.
pub fn jittered_grid(params: &SphParams, count: usize) -> SphResult<Vec<Vector>> {
    let capacity = jittered_grid_capacity(params);
    let placed = admitted_count(count, capacity, params.seeding)?;

    let mut rng = StdRng::seed_from_u64(params.seed);
    Ok(jittered_grid_sites(params)
        .take(placed)
        .map(|site| {
            let jitter: Real = rng.random_range(0.0..1.0);
            site + Vector::splat(jitter)
        })
        .collect())
}

/// Columns and rows available to the square block before it leaves the view.
fn square_block_extent(params: &ViscoelasticParams) -> (usize, usize) {
    let spacing = 3.0 * params.particle_radius;
    let origin = square_block_origin(params);
    let columns = ((params.view_width - params.particle_radius - origin.x) / spacing).floor();
    let rows = ((origin.y - params.particle_radius) / spacing).floor();
    (
        if columns >= 0.0 { columns as usize + 1 } else { 0 },
        if rows >= 0.0 { rows as usize + 1 } else { 0 },
    )
}

fn square_block_origin(params: &ViscoelasticParams) -> Vector {
    Vector::new(0.25 * params.view_width, 0.5 * params.view_height)
}

/// Number of particles a square block of `count` can hold in the view.
pub fn square_block_capacity(params: &ViscoelasticParams, count: usize) -> usize {
    let (max_columns, max_rows) = square_block_extent(params);
    block_columns(count).min(max_columns) * max_rows
}

#[inline]
fn block_columns(count: usize) -> usize {
    (count as Real).sqrt().ceil() as usize
}

/// A dense block starting at `(W/4, H/2)`, spaced three particle radii,
/// filled left to right with rows stacked downward.
pub fn square_block(params: &ViscoelasticParams, count: usize) -> SphResult<Vec<Vector>> {
    let capacity = square_block_capacity(params, count);
    let placed = admitted_count(count, capacity, params.seeding)?;

    let spacing = 3.0 * params.particle_radius;
    let origin = square_block_origin(params);
    let (max_columns, _) = square_block_extent(params);
    let columns = block_columns(count).min(max_columns).max(1);

    Ok((0..placed)
        .map(|k| {
            let column = (k % columns) as Real;
            let row = (k / columns) as Real;
            Vector::new(origin.x + column * spacing, origin.y - row * spacing)
        })
        .collect())
}

fn admitted_count(requested: usize, capacity: usize, policy: SeedingPolicy) -> SphResult<usize> {
    if requested == 0 {
        return Err(SphError::InvalidParticleCount(requested));
    }
    if requested <= capacity {
        return Ok(requested);
    }
    match policy {
        SeedingPolicy::Strict => Err(SphError::SeedingOverflow {
            requested,
            capacity,
        }),
        SeedingPolicy::Truncate => {
            warn!(
                "Seeding pattern holds {} particles, dropping {} of {}",
                capacity,
                requested - capacity,
                requested
            );
            Ok(capacity)
        }
    }
}
