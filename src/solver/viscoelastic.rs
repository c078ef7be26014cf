use std::fs::File;
use std::path::Path;

use bevy::log::{debug, info};
use rayon::prelude::*;

use crate::config::{DEFAULT_DELIMITER, ViscoelasticParams};
use crate::core::kernel::proximity;
use crate::core::{Boundary, ParticleState, ParticleSystem, ViscoelasticParticles};
use crate::error::{SphError, SphResult};
use crate::math::{Point, Real, Vector};
use crate::solver::{Solver, seeding};
use crate::trace::FrameWriter;

/// Double-density relaxation solver.
///
/// Each `update` runs `substeps` predictive-corrective cycles: predict
/// positions from velocities, relax them against the neighbor pressures,
/// then rebuild velocities from the net displacement.
pub struct ViscoelasticSolver {
    // Concrete: relaxation reads near-pressures and predicted positions.
    particles: ViscoelasticParticles,
    params: ViscoelasticParams,
    boundary: Boundary,
    output: Option<FrameWriter<File>>,
    frames: u64,
}

impl ViscoelasticSolver {
    /// Default parameters with `count` particles in a square block.
    pub fn new(count: usize, output: Option<&Path>) -> SphResult<Self> {
        Self::with_params(ViscoelasticParams::default(), count, output)
    }

    pub fn with_params(
        params: ViscoelasticParams,
        count: usize,
        output: Option<&Path>,
    ) -> SphResult<Self> {
        params.validate()?;
        let positions = seeding::square_block(&params, count)?;
        Self::from_positions(params, &positions, output)
    }

    pub fn from_positions(
        params: ViscoelasticParams,
        positions: &[Point],
        output: Option<&Path>,
    ) -> SphResult<Self> {
        params.validate()?;
        let mut particles = ViscoelasticParticles::new(&params)?;
        for &position in positions {
            particles.add_particle(position);
        }
        let output = output
            .map(|path| FrameWriter::create(path, DEFAULT_DELIMITER))
            .transpose()?;

        let (columns, rows) = particles.grid().dimensions();
        info!(
            "Viscoelastic solver: {} particles, grid {}x{}, {} substeps of {:.6}s",
            particles.len(),
            columns,
            rows,
            params.substeps,
            params.time_step()
        );

        Ok(Self {
            particles,
            boundary: Boundary::for_view(params.view_width, params.view_height),
            params,
            output,
            frames: 0,
        })
    }

    pub fn params(&self) -> &ViscoelasticParams {
        &self.params
    }

    pub fn particles(&self) -> &ViscoelasticParticles {
        &self.particles
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn apply_external_forces(&mut self) {
        let delta = self.params.gravity * self.params.time_step();
        self.particles
            .state
            .velocities
            .par_iter_mut()
            .for_each(|velocity| *velocity += delta);
    }

    /// Remember the current positions and advance them explicitly.
    pub fn integrate(&mut self) {
        let dt = self.params.time_step();
        let ViscoelasticParticles {
            state,
            previous_positions,
            ..
        } = &mut self.particles;

        state
            .positions
            .par_iter_mut()
            .zip(previous_positions.par_iter_mut())
            .zip(state.velocities.par_iter())
            .for_each(|((position, previous), &velocity)| {
                *previous = *position;
                *position += velocity * dt;
            });
    }

    /// Relax predicted positions against neighbor pressure, surface
    /// tension and approaching-pair viscosity.
    pub fn project(&mut self) {
        let dt = self.params.time_step();
        let kernel_radius = self.params.kernel_radius;
        let mass = self.params.mass;
        let surface_tension = self.params.surface_tension;
        let linear_viscosity = self.params.linear_viscosity;
        let quadratic_viscosity = self.params.quadratic_viscosity;
        let kernel_factor = self.particles.kernel_factor();
        let kernel_factor_norm = self.particles.kernel_factor_norm();

        let ViscoelasticParticles {
            state,
            near_pressures,
            predicted_positions,
            grid,
            ..
        } = &mut self.particles;
        let ParticleState {
            positions,
            velocities,
            pressures,
            ..
        } = &*state;
        let near_pressures = &*near_pressures;
        let grid = &*grid;

        predicted_positions
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, predicted)| {
                let origin = positions[i];
                let mut projected = origin;

                grid.for_each_nearby_point(i, |j, distance| {
                    let offset = positions[j] - origin;
                    let a = proximity(distance, kernel_radius);
                    let a2 = a * a;

                    let relaxation = dt
                        * dt
                        * ((near_pressures[i] + near_pressures[j]) * a2 * a * kernel_factor_norm
                            + (pressures[i] + pressures[j]) * a2 * kernel_factor)
                        / 2.0;
                    projected -= relaxation * offset / (distance * mass);

                    projected += surface_tension * a2 * kernel_factor * offset;

                    let approach = (velocities[i] - velocities[j]).dot(offset);
                    if approach > 0.0 {
                        let u = approach / distance;
                        let impulse =
                            0.5 * dt * a * (linear_viscosity * u + quadratic_viscosity * u * u);
                        projected -= impulse * offset * dt;
                    }
                });

                *predicted = projected;
            });
    }

    /// Commit the relaxed positions and derive velocities from the
    /// displacement over the substep.
    pub fn correct(&mut self) {
        let dt = self.params.time_step();
        let ViscoelasticParticles {
            state,
            predicted_positions,
            previous_positions,
            ..
        } = &mut self.particles;

        state
            .positions
            .par_iter_mut()
            .zip(state.velocities.par_iter_mut())
            .zip(predicted_positions.par_iter())
            .zip(previous_positions.par_iter())
            .for_each(|(((position, velocity), &predicted), &previous)| {
                *position = predicted;
                *velocity = (predicted - previous) / dt;
            });
    }

    pub fn enforce_boundary(&mut self) {
        let state = &mut self.particles.state;
        self.boundary.enforce(
            &state.positions,
            &mut state.velocities,
            self.params.particle_radius,
            self.params.time_step(),
            self.params.boundary_damping,
        );
    }

    /// One predictive-corrective cycle.
    pub fn substep(&mut self) {
        self.apply_external_forces();
        self.integrate();
        self.particles.rebuild_neighbors();
        self.particles.compute_density_pressure();
        self.project();
        self.correct();
        self.enforce_boundary();
    }
}

impl Solver for ViscoelasticSolver {
    fn add_particle(&mut self, position: Point) {
        self.particles.add_particle(position);
    }

    fn update(&mut self) -> SphResult<()> {
        for _ in 0..self.params.substeps {
            self.substep();
        }
        if let Some(output) = self.output.as_mut() {
            output.write_frame(self.particles.state().positions())?;
        }
        self.frames += 1;

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
        self.params.time_step()
    }

    fn resize_view(&mut self, width: Real, height: Real) -> SphResult<()> {
        self.particles
            .grid_mut()
            .set_grid_resolution(width, height, self.params.kernel_radius)?;
        self.params.view_width = width;
        self.params.view_height = height;
        self.boundary.resize(width, height);
        debug!("Viscoelastic view resized to {} x {}", width, height);
        Ok(())
    }

    fn check_finite(&self) -> SphResult<()> {
        match self.particles.first_non_finite() {
            Some((quantity, index)) => Err(SphError::NonFinite { quantity, index }),
            None => Ok(()),
        }
    }
}
