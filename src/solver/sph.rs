use std::fs::File;
use std::path::Path;

use bevy::log::{debug, info};
use rayon::prelude::*;

use crate::config::{DEFAULT_DELIMITER, SphParams};
use crate::core::{
    Boundary, ParticleState, ParticleSystem, SpikyKernel, StandardParticles, ViscosityKernel,
};
use crate::error::{SphError, SphResult};
use crate::math::{Point, Real, Vector, zero_vector};
use crate::solver::{Solver, seeding};
use crate::trace::FrameWriter;

/// Classical SPH: all-pairs density, pressure and viscosity forces,
/// symplectic Euler integration.
pub struct SphSolver {
    particles: Box<dyn ParticleSystem>,
    params: SphParams,
    boundary: Boundary,
    output: Option<FrameWriter<File>>,
    steps: u64,
}

impl SphSolver {
    /// Default parameters with `count` particles on the jittered grid.
    pub fn new(count: usize, output: Option<&Path>) -> SphResult<Self> {
        Self::with_params(SphParams::default(), count, output)
    }

    pub fn with_params(params: SphParams, count: usize, output: Option<&Path>) -> SphResult<Self> {
        params.validate()?;
        let positions = seeding::jittered_grid(&params, count)?;
        Self::from_positions(params, &positions, output)
    }

    /// Start from explicit positions, skipping the seeding pattern.
    pub fn from_positions(
        params: SphParams,
        positions: &[Point],
        output: Option<&Path>,
    ) -> SphResult<Self> {
        let particles = Box::new(StandardParticles::new(&params));
        Self::with_particle_system(params, particles, positions, output)
    }

    /// Drive an arbitrary density/pressure model with this solver's force
    /// and integration passes.
    pub fn with_particle_system(
        params: SphParams,
        mut particles: Box<dyn ParticleSystem>,
        positions: &[Point],
        output: Option<&Path>,
    ) -> SphResult<Self> {
        params.validate()?;
        for &position in positions {
            particles.add_particle(position);
        }
        let output = output
            .map(|path| FrameWriter::create(path, DEFAULT_DELIMITER))
            .transpose()?;

        info!(
            "SPH solver: {} particles, h = {}, dt = {}",
            particles.len(),
            params.kernel_radius,
            params.time_step
        );

        Ok(Self {
            particles,
            boundary: Boundary::for_view(params.view_width, params.view_height),
            params,
            output,
            steps: 0,
        })
    }

    pub fn params(&self) -> &SphParams {
        &self.params
    }

    pub fn state(&self) -> &ParticleState {
        self.particles.state()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn compute_density_pressure(&mut self) {
        self.particles.rebuild_neighbors();
        self.particles.compute_density_pressure();
    }

    /// Pressure, viscosity and gravity for every particle pair within the
    /// kernel radius.
    pub fn compute_forces(&mut self) {
        let kernel_radius = self.params.kernel_radius;
        let mass = self.particles.mass();
        let viscosity = self.params.viscosity;
        let gravity = self.params.gravity;
        let spiky = SpikyKernel::new(kernel_radius);
        let laplacian = ViscosityKernel::new(kernel_radius);

        let ParticleState {
            positions,
            velocities,
            forces,
            densities,
            pressures,
        } = self.particles.state_mut();
        let (positions, velocities) = (&*positions, &*velocities);
        let (densities, pressures) = (&*densities, &*pressures);

        forces.par_iter_mut().enumerate().for_each(|(i, force)| {
            let mut pressure_force = zero_vector();
            let mut viscosity_force = zero_vector();

            for j in 0..positions.len() {
                if i == j {
                    continue;
                }
                let offset = positions[j] - positions[i];
                let distance = offset.length();
                if distance < kernel_radius {
                    let falloff = kernel_radius - distance;
                    pressure_force += -offset.normalize_or_zero() * mass
                        * (pressures[i] + pressures[j])
                        / (2.0 * densities[j])
                        * spiky.gradient_at(falloff);
                    viscosity_force += viscosity * mass * (velocities[j] - velocities[i])
                        / densities[j]
                        * laplacian.laplacian_at(falloff);
                }
            }

            let gravity_force = gravity * mass / densities[i];
            *force = pressure_force + viscosity_force + gravity_force;
        });
    }

    pub fn integrate(&mut self) {
        let dt = self.params.time_step;
        let ParticleState {
            positions,
            velocities,
            forces,
            densities,
            ..
        } = self.particles.state_mut();

        positions
            .par_iter_mut()
            .zip(velocities.par_iter_mut())
            .zip(forces.par_iter())
            .zip(densities.par_iter())
            .for_each(|(((position, velocity), &force), &density)| {
                *velocity += force / density * dt;
                *position += *velocity * dt;
            });
    }

    pub fn enforce_boundary(&mut self) {
        let particle_radius = self.particles.particle_radius();
        let ParticleState {
            positions,
            velocities,
            ..
        } = self.particles.state_mut();
        self.boundary.enforce(
            positions,
            velocities,
            particle_radius,
            self.params.time_step,
            self.params.boundary_damping,
        );
    }

    fn persist(&mut self) -> SphResult<()> {
        match self.output.as_mut() {
            Some(output) => output.write_frame(self.particles.state().positions()),
            None => Ok(()),
        }
    }
}

impl Solver for SphSolver {
    fn add_particle(&mut self, position: Point) {
        self.particles.add_particle(position);
    }

    fn update(&mut self) -> SphResult<()> {
        self.compute_density_pressure();
        self.compute_forces();
        self.integrate();
        self.enforce_boundary();
        self.persist()?;
        self.steps += 1;

        if self.params.verify_finite {
            self.check_finite()?;
        }
        Ok(())
    }

    fn positions(&self) -> &[Point] {
        self.particles.state().positions()
    }

    fn velocities(&self) -> &[Vector] {
        self.particles.state().velocities()
    }

    fn kernel_radius(&self) -> Real {
        self.params.kernel_radius
    }

    fn particle_radius(&self) -> Real {
        self.params.particle_radius
    }

    fn view_width(&self) -> Real {
        self.params.view_width
    }

    fn view_height(&self) -> Real {
        self.params.view_height
    }

    fn point_size(&self) -> Real {
        self.params.point_size
    }

    fn window_size(&self) -> (u32, u32) {
        (self.params.window_width, self.params.window_height)
    }

    fn time_step(&self) -> Real {
        self.params.time_step
    }

    fn resize_view(&mut self, width: Real, height: Real) -> SphResult<()> {
        if !(width > 0.0 && width.is_finite()) {
            return Err(SphError::InvalidParameter {
                name: "view_width",
                value: width,
            });
        }
        if !(height > 0.0 && height.is_finite()) {
            return Err(SphError::InvalidParameter {
                name: "view_height",
                value: height,
            });
        }
        self.params.view_width = width;
        self.params.view_height = height;
        self.boundary.resize(width, height);
        debug!("SPH view resized to {} x {}", width, height);
        Ok(())
    }

    fn check_finite(&self) -> SphResult<()> {
        match self.particles.state().first_non_finite() {
            Some((quantity, index)) => Err(SphError::NonFinite { quantity, index }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(params: SphParams, separation: Real) -> SphSolver {
        let positions = [
            Vector::new(600.0, 450.0),
            Vector::new(600.0 + separation, 450.0),
        ];
        SphSolver::from_positions(params, &positions, None).unwrap()
    }

    #[test]
    fn pressure_forces_are_opposite() {
        let params = SphParams {
            gravity: Vector::ZERO,
            viscosity: 0.0,
            ..SphParams::default()
        };
        let mut solver = pair(params, 4.0);
        solver.compute_density_pressure();
        solver.compute_forces();

        let forces = solver.state().forces();
        assert!((forces[0] + forces[1]).length() < 1e-9);
        assert!(forces[0].y.abs() < 1e-12);
        assert!(forces[0].x != 0.0);
    }

    #[test]
    fn lone_particle_falls() {
        let mut solver = pair(SphParams::default(), 100.0);
        let start = solver.positions()[0];
        solver.update().unwrap();

        assert!(solver.velocities()[0].y < 0.0);
        assert!(solver.positions()[0].y < start.y);
        assert_eq!(solver.positions()[0].x, start.x);
        assert_eq!(solver.steps(), 1);
    }

    #[test]
    fn resize_rejects_degenerate_view() {
        let mut solver = pair(SphParams::default(), 100.0);
        assert!(solver.resize_view(0.0, 10.0).is_err());
        solver.resize_view(2000.0, 1000.0).unwrap();
        assert_eq!(solver.view_width(), 2000.0);
    }

    #[test]
    fn finite_check_reports_offender() {
        let mut solver = pair(SphParams::default(), 100.0);
        solver.add_particle(Vector::new(Real::NAN, 0.0));
        assert!(matches!(
            solver.check_finite(),
            Err(SphError::NonFinite {
                quantity: "position",
                index: 2
            })
        ));
    }
}
