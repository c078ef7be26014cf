use crate::config::constants::{
    DEFAULT_SEED, ELASTIC_REST_DENSITY, GAS_CONSTANT, GRAVITY, PARTICLE_MASS, REST_DENSITY,
    WINDOW_HEIGHT, WINDOW_WIDTH,
};
use crate::error::{SphError, SphResult};
use crate::math::{Real, Vector, is_finite_vector};

/// What to do when the seeding pattern cannot place every requested particle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SeedingPolicy {
    /// Fail construction with `SphError::SeedingOverflow`.
    #[default]
    Strict,
    /// Place as many particles as fit and log how many were dropped.
    Truncate,
}

/// Parameters for the classical density/pressure solver
#[derive(Clone, Debug)]
pub struct SphParams {
    /// Support radius of every kernel
    pub kernel_radius: Real,

    /// Distance from a boundary plane at which the push-back starts
    pub particle_radius: Real,

    pub mass: Real,

    /// Scales the viscosity force between particle pairs
    pub viscosity: Real,

    /// Stiffness of the equation of state
    pub gas_constant: Real,

    pub rest_density: Real,

    pub gravity: Vector,

    pub time_step: Real,

    /// Velocity multiplier applied after a boundary correction
    pub boundary_damping: Real,

    pub view_width: Real,
    pub view_height: Real,
    pub window_width: u32,
    pub window_height: u32,
    pub point_size: Real,

    /// Seed for the jitter applied when seeding particles
    pub seed: u64,
    pub seeding: SeedingPolicy,

    /// Run a finiteness check after every step and report the first offender
    pub verify_finite: bool,
}

impl Default for SphParams {
    fn default() -> Self {
        let kernel_radius = 16.0;
        Self {
            kernel_radius,
            particle_radius: 16.0,
            mass: 2.5,
            viscosity: 200.0,
            gas_constant: GAS_CONSTANT,
            rest_density: REST_DENSITY,
            gravity: GRAVITY,
            time_step: 0.0007,
            boundary_damping: 1.0,
            view_width: 1.5 * WINDOW_WIDTH as Real,
            view_height: 1.5 * WINDOW_HEIGHT as Real,
            window_width: WINDOW_WIDTH,
            window_height: WINDOW_HEIGHT,
            point_size: kernel_radius / 2.0,
            seed: DEFAULT_SEED,
            seeding: SeedingPolicy::Strict,
            verify_finite: false,
        }
    }
}

impl SphParams {
    pub fn with_kernel_radius(mut self, kernel_radius: Real) -> Self {
        self.kernel_radius = kernel_radius;
        self.point_size = kernel_radius / 2.0;
        self
    }

    pub fn with_view(mut self, width: Real, height: Real) -> Self {
        self.view_width = width;
        self.view_height = height;
        self
    }

    pub fn with_time_step(mut self, time_step: Real) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_seeding(mut self, seeding: SeedingPolicy) -> Self {
        self.seeding = seeding;
        self
    }

    pub fn with_finite_check(mut self) -> Self {
        self.verify_finite = true;
        self
    }

    pub fn validate(&self) -> SphResult<()> {
        check_kernel_radius(self.kernel_radius)?;
        check_positive("particle_radius", self.particle_radius)?;
        check_positive("mass", self.mass)?;
        check_positive("time_step", self.time_step)?;
        check_positive("view_width", self.view_width)?;
        check_positive("view_height", self.view_height)?;
        check_positive("rest_density", self.rest_density)?;
        check_finite("viscosity", self.viscosity)?;
        check_finite("gas_constant", self.gas_constant)?;
        check_finite("boundary_damping", self.boundary_damping)?;
        check_gravity(self.gravity)
    }
}

/// Parameters for the predictive-corrective viscoelastic solver
#[derive(Clone, Debug)]
pub struct ViscoelasticParams {
    pub particle_radius: Real,
    pub kernel_radius: Real,
    pub mass: Real,

    /// Scales the standard pressure term
    pub stiffness: Real,

    /// Scales the near-pressure term that keeps particles from clustering
    pub near_stiffness: Real,

    pub linear_viscosity: Real,
    pub quadratic_viscosity: Real,
    pub surface_tension: Real,
    pub elastic_rest_density: Real,
    pub gravity: Vector,

    /// Predictive-corrective substeps per `update` call
    pub substeps: u32,

    /// Output frames per simulated second
    pub fps: u32,

    pub boundary_damping: Real,

    pub view_width: Real,
    pub view_height: Real,
    pub window_width: u32,
    pub window_height: u32,
    pub point_size: Real,

    pub seeding: SeedingPolicy,
    pub verify_finite: bool,
}

impl Default for ViscoelasticParams {
    fn default() -> Self {
        let particle_radius = 0.03;
        let view_width = 12.5;
        let view_height = WINDOW_HEIGHT as Real * view_width / WINDOW_WIDTH as Real;
        Self {
            particle_radius,
            kernel_radius: 6.0 * particle_radius,
            mass: PARTICLE_MASS,
            stiffness: 0.08,
            near_stiffness: 0.1,
            linear_viscosity: 0.25,
            quadratic_viscosity: 0.5,
            surface_tension: 0.0001,
            elastic_rest_density: ELASTIC_REST_DENSITY,
            gravity: GRAVITY,
            substeps: 10,
            fps: 30,
            boundary_damping: 0.5,
            view_width,
            view_height,
            window_width: WINDOW_WIDTH,
            window_height: WINDOW_HEIGHT,
            point_size: 2.5 * particle_radius * WINDOW_WIDTH as Real / view_height,
            seeding: SeedingPolicy::Strict,
            verify_finite: false,
        }
    }
}

impl ViscoelasticParams {
    /// Duration of one substep.
    pub fn time_step(&self) -> Real {
        1.0 / (self.fps as Real * self.substeps as Real)
    }

    /// Normalisation of the `a^3` density kernel.
    pub fn kernel_factor(&self) -> Real {
        20.0 / (2.0 * std::f64::consts::PI * self.kernel_radius * self.kernel_radius)
    }

    /// Normalisation of the `a^4` near-density kernel.
    pub fn kernel_factor_norm(&self) -> Real {
        30.0 / (2.0 * std::f64::consts::PI * self.kernel_radius * self.kernel_radius)
    }

    pub fn with_substeps(mut self, substeps: u32) -> Self {
        self.substeps = substeps;
        self
    }

    pub fn with_view(mut self, width: Real, height: Real) -> Self {
        self.view_width = width;
        self.view_height = height;
        self
    }

    pub fn with_seeding(mut self, seeding: SeedingPolicy) -> Self {
        self.seeding = seeding;
        self
    }

    pub fn with_finite_check(mut self) -> Self {
        self.verify_finite = true;
        self
    }

    pub fn validate(&self) -> SphResult<()> {
        check_kernel_radius(self.kernel_radius)?;
        check_positive("particle_radius", self.particle_radius)?;
        check_positive("mass", self.mass)?;
        check_positive("view_width", self.view_width)?;
        check_positive("view_height", self.view_height)?;
        if self.substeps == 0 {
            return Err(SphError::InvalidParameter {
                name: "substeps",
                value: 0.0,
            });
        }
        if self.fps == 0 {
            return Err(SphError::InvalidParameter {
                name: "fps",
                value: 0.0,
            });
        }
        check_finite("stiffness", self.stiffness)?;
        check_finite("near_stiffness", self.near_stiffness)?;
        check_finite("linear_viscosity", self.linear_viscosity)?;
        check_finite("quadratic_viscosity", self.quadratic_viscosity)?;
        check_finite("surface_tension", self.surface_tension)?;
        check_finite("elastic_rest_density", self.elastic_rest_density)?;
        check_finite("boundary_damping", self.boundary_damping)?;
        check_gravity(self.gravity)
    }
}

fn check_kernel_radius(kernel_radius: Real) -> SphResult<()> {
    if kernel_radius > 0.0 && kernel_radius.is_finite() {
        Ok(())
    } else {
        Err(SphError::InvalidKernelRadius(kernel_radius))
    }
}

fn check_positive(name: &'static str, value: Real) -> SphResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SphError::InvalidParameter { name, value })
    }
}

fn check_finite(name: &'static str, value: Real) -> SphResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SphError::InvalidParameter { name, value })
    }
}

fn check_gravity(gravity: Vector) -> SphResult<()> {
    if is_finite_vector(gravity) {
        Ok(())
    } else {
        Err(SphError::InvalidParameter {
            name: "gravity",
            value: gravity.length(),
        })
    }
}
