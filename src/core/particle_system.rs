//! Particle system variants
//!
//! Both fluid models share the same particle arrays and differ in how they
//! estimate density and pressure. Solvers hold a variant behind the
//! [`ParticleSystem`] interface instead of specialising per model.

use rayon::prelude::*;

use crate::config::{SphParams, ViscoelasticParams};
use crate::core::kernel::{Poly6Kernel, proximity};
use crate::core::neighbor_grid::NeighborGrid;
use crate::core::particle_state::ParticleState;
use crate::error::SphResult;
use crate::math::{Real, Vector};

pub trait ParticleSystem: Send + Sync {
    /// Append a particle at `position`, extending every per-particle array.
    fn add_particle(&mut self, position: Vector);

    /// Recompute density and pressure from the current positions.
    fn compute_density_pressure(&mut self);

    /// Refresh any neighbor structure the density pass depends on.
    fn rebuild_neighbors(&mut self) {}

    fn state(&self) -> &ParticleState;

    fn state_mut(&mut self) -> &mut ParticleState;

    fn kernel_radius(&self) -> Real;

    fn particle_radius(&self) -> Real;

    fn mass(&self) -> Real;

    fn len(&self) -> usize {
        self.state().len()
    }

    fn is_empty(&self) -> bool {
        self.state().is_empty()
    }
}

/// Classical model: all-pairs Poly6 density and a linear equation of state.
#[derive(Clone, Debug)]
pub struct StandardParticles {
    state: ParticleState,
    kernel_radius: Real,
    particle_radius: Real,
    mass: Real,
    gas_constant: Real,
    rest_density: Real,
}

impl StandardParticles {
    pub fn new(params: &SphParams) -> Self {
        Self {
            state: ParticleState::new(),
            kernel_radius: params.kernel_radius,
            particle_radius: params.particle_radius,
            mass: params.mass,
            gas_constant: params.gas_constant,
            rest_density: params.rest_density,
        }
    }
}

impl ParticleSystem for StandardParticles {
    fn add_particle(&mut self, position: Vector) {
        self.state.push(position);
    }

    fn compute_density_pressure(&mut self) {
        let kernel = Poly6Kernel::new(self.kernel_radius);
        let radius_squared = self.kernel_radius * self.kernel_radius;
        let mass = self.mass;
        let gas_constant = self.gas_constant;
        let rest_density = self.rest_density;

        let ParticleState {
            positions,
            densities,
            pressures,
            ..
        } = &mut self.state;
        let positions = &*positions;

        densities
            .par_iter_mut()
            .zip(pressures.par_iter_mut())
            .enumerate()
            .for_each(|(i, (density, pressure))| {
                let origin = positions[i];
                let mut sum = 0.0;
                for &other in positions.iter() {
                    let distance_squared = (other - origin).length_squared();
                    if distance_squared < radius_squared {
                        sum += mass * kernel.value(radius_squared - distance_squared);
                    }
                }
                *density = sum;
                // Negative pressure is kept; it acts as tension.
                *pressure = gas_constant * (sum - rest_density);
            });
    }

    fn state(&self) -> &ParticleState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ParticleState {
        &mut self.state
    }

    fn kernel_radius(&self) -> Real {
        self.kernel_radius
    }

    fn particle_radius(&self) -> Real {
        self.particle_radius
    }

    fn mass(&self) -> Real {
        self.mass
    }
}

/// Viscoelastic model: grid-based double density with predicted positions.
#[derive(Clone, Debug)]
pub struct ViscoelasticParticles {
    pub(crate) state: ParticleState,
    pub(crate) near_densities: Vec<Real>,
    pub(crate) near_pressures: Vec<Real>,
    pub(crate) predicted_positions: Vec<Vector>,
    pub(crate) previous_positions: Vec<Vector>,
    pub(crate) grid: NeighborGrid,
    kernel_radius: Real,
    particle_radius: Real,
    mass: Real,
    kernel_factor: Real,
    kernel_factor_norm: Real,
    stiffness: Real,
    near_stiffness: Real,
    elastic_rest_density: Real,
}

impl ViscoelasticParticles {
    pub fn new(params: &ViscoelasticParams) -> SphResult<Self> {
        Ok(Self {
            state: ParticleState::new(),
            near_densities: Vec::new(),
            near_pressures: Vec::new(),
            predicted_positions: Vec::new(),
            previous_positions: Vec::new(),
            grid: NeighborGrid::new(params.view_width, params.view_height, params.kernel_radius)?,
            kernel_radius: params.kernel_radius,
            particle_radius: params.particle_radius,
            mass: params.mass,
            kernel_factor: params.kernel_factor(),
            kernel_factor_norm: params.kernel_factor_norm(),
            stiffness: params.stiffness,
            near_stiffness: params.near_stiffness,
            elastic_rest_density: params.elastic_rest_density,
        })
    }

    pub fn grid(&self) -> &NeighborGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut NeighborGrid {
        &mut self.grid
    }

    pub fn near_densities(&self) -> &[Real] {
        &self.near_densities
    }

    pub fn near_pressures(&self) -> &[Real] {
        &self.near_pressures
    }

    pub fn predicted_positions(&self) -> &[Vector] {
        &self.predicted_positions
    }

    pub fn previous_positions(&self) -> &[Vector] {
        &self.previous_positions
    }

    pub fn kernel_factor(&self) -> Real {
        self.kernel_factor
    }

    pub fn kernel_factor_norm(&self) -> Real {
        self.kernel_factor_norm
    }

    /// First non-finite value across shared and model-specific arrays.
    pub fn first_non_finite(&self) -> Option<(&'static str, usize)> {
        if let Some(found) = self.state.first_non_finite() {
            return Some(found);
        }
        if let Some(index) = self.near_densities.iter().position(|d| !d.is_finite()) {
            return Some(("near-density", index));
        }
        self.near_pressures
            .iter()
            .position(|p| !p.is_finite())
            .map(|index| ("near-pressure", index))
    }
}

impl ParticleSystem for ViscoelasticParticles {
    fn add_particle(&mut self, position: Vector) {
        self.state.push(position);
        self.near_densities.push(0.0);
        self.near_pressures.push(0.0);
        self.predicted_positions.push(position);
        self.previous_positions.push(position);
        self.grid.resize_particles(self.state.len());
    }

    fn compute_density_pressure(&mut self) {
        let kernel_radius = self.kernel_radius;
        let mass = self.mass;
        let kernel_factor = self.kernel_factor;
        let kernel_factor_norm = self.kernel_factor_norm;
        let stiffness = self.stiffness;
        let near_stiffness = self.near_stiffness;
        let rest_density = mass * self.elastic_rest_density;

        let Self {
            state,
            near_densities,
            near_pressures,
            grid,
            ..
        } = self;
        let grid = &*grid;

        state
            .densities
            .par_iter_mut()
            .zip(state.pressures.par_iter_mut())
            .zip(near_densities.par_iter_mut())
            .zip(near_pressures.par_iter_mut())
            .enumerate()
            .for_each(|(i, (((density, pressure), near_density), near_pressure))| {
                let mut sum = 0.0;
                let mut near_sum = 0.0;
                grid.for_each_nearby_point(i, |_, distance| {
                    let a = proximity(distance, kernel_radius);
                    let a3 = a * a * a;
                    sum += mass * a3 * kernel_factor;
                    near_sum += mass * a3 * a * kernel_factor_norm;
                });
                *density = sum;
                *near_density = near_sum;
                *pressure = stiffness * (sum - rest_density);
                *near_pressure = near_stiffness * near_sum;
            });
    }

    fn rebuild_neighbors(&mut self) {
        self.grid.build(&self.state.positions);
    }

    fn state(&self) -> &ParticleState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ParticleState {
        &mut self.state
    }

    fn kernel_radius(&self) -> Real {
        self.kernel_radius
    }

    fn particle_radius(&self) -> Real {
        self.particle_radius
    }

    fn mass(&self) -> Real {
        self.mass
    }
}
