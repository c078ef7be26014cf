//! Rectangular domain walls
//!
//! The view rectangle `[0, W] x [0, H]` is bounded by four half-planes with
//! inward normals. A particle closer to a wall than its radius gets a
//! velocity push that would carry it back out of the skin in one step.

use rayon::prelude::*;

use crate::math::{Point, Real, Vector};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryPlane {
    /// Unit normal pointing into the domain
    pub normal: Vector,
    pub offset: Real,
}

impl BoundaryPlane {
    pub const fn new(normal: Vector, offset: Real) -> Self {
        Self { normal, offset }
    }

    /// Distance from the plane, clamped to zero for points outside it.
    #[inline]
    pub fn signed_distance(&self, point: Point) -> Real {
        (point.dot(self.normal) - self.offset).max(0.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Boundary {
    planes: [BoundaryPlane; 4],
}

impl Boundary {
    pub fn for_view(width: Real, height: Real) -> Self {
        Self {
            planes: [
                BoundaryPlane::new(Vector::new(1.0, 0.0), 0.0),
                BoundaryPlane::new(Vector::new(0.0, 1.0), 0.0),
                BoundaryPlane::new(Vector::new(-1.0, 0.0), -width),
                BoundaryPlane::new(Vector::new(0.0, -1.0), -height),
            ],
        }
    }

    pub fn resize(&mut self, width: Real, height: Real) {
        *self = Self::for_view(width, height);
    }

    pub fn planes(&self) -> &[BoundaryPlane] {
        &self.planes
    }

    /// Push particles inside the wall skin back toward the domain.
    ///
    /// Only velocities change; positions move on the next integration.
    pub fn enforce(
        &self,
        positions: &[Point],
        velocities: &mut [Vector],
        particle_radius: Real,
        time_step: Real,
        damping: Real,
    ) {
        let planes = &self.planes;
        velocities
            .par_iter_mut()
            .zip(positions.par_iter())
            .for_each(|(velocity, &position)| {
                for plane in planes {
                    let distance = plane.signed_distance(position);
                    if distance < particle_radius {
                        *velocity += (particle_radius - distance) * plane.normal / time_step;
                        *velocity *= damping;
                    }
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_particles_are_untouched() {
        let boundary = Boundary::for_view(10.0, 10.0);
        let positions = [Vector::new(5.0, 5.0)];
        let mut velocities = [Vector::new(1.0, -2.0)];
        boundary.enforce(&positions, &mut velocities, 0.5, 0.01, 0.5);
        assert_eq!(velocities[0], Vector::new(1.0, -2.0));
    }

    #[test]
    fn right_wall_pushes_left() {
        let boundary = Boundary::for_view(10.0, 10.0);
        let positions = [Vector::new(9.8, 5.0)];
        let mut velocities = [Vector::ZERO];
        boundary.enforce(&positions, &mut velocities, 0.5, 0.1, 1.0);
        assert!((velocities[0].x + 3.0).abs() < 1e-12);
        assert_eq!(velocities[0].y, 0.0);
    }

    #[test]
    fn outbound_particle_in_skin_stays_inside_after_integration() {
        let boundary = Boundary::for_view(10.0, 10.0);
        let dt = 0.01;
        let radius = 0.2;
        let mut positions = [Vector::new(0.05, 5.0)];
        let mut velocities = [Vector::new(-1.0, 0.0)];

        boundary.enforce(&positions, &mut velocities, radius, dt, 1.0);
        positions[0] += velocities[0] * dt;

        assert!(positions[0].x > 0.0, "ended at {}", positions[0].x);
    }

    #[test]
    fn damping_scales_corrected_velocity() {
        let boundary = Boundary::for_view(10.0, 10.0);
        let positions = [Vector::new(5.0, 0.0)];
        let mut undamped = [Vector::ZERO];
        let mut damped = [Vector::ZERO];
        boundary.enforce(&positions, &mut undamped, 0.5, 0.1, 1.0);
        boundary.enforce(&positions, &mut damped, 0.5, 0.1, 0.5);
        assert!((damped[0].y - 0.5 * undamped[0].y).abs() < 1e-12);
    }

    #[test]
    fn resize_moves_far_walls() {
        let mut boundary = Boundary::for_view(10.0, 10.0);
        boundary.resize(20.0, 5.0);
        assert_eq!(boundary.planes()[2].offset, -20.0);
        assert_eq!(boundary.planes()[3].offset, -5.0);
        assert_eq!(
            boundary.planes()[3].signed_distance(Vector::new(0.0, 4.0)),
            1.0
        );
    }
}
