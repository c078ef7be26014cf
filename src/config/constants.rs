// Physical and numerical constants for the SPH solvers
use crate::math::{Real, Vector};

// Global physics
pub const GRAVITY: Vector = Vector::new(0.0, -9.8);

// Classical model equation of state
pub const REST_DENSITY: Real = 300.0;
pub const GAS_CONSTANT: Real = 2000.0;

// Viscoelastic model rest density, lower than the classical one
pub const ELASTIC_REST_DENSITY: Real = 45.0;

pub const PARTICLE_MASS: Real = 1.0;

// Squared distances below this are treated as coincident particles
pub const EPS: Real = 0.00001;

/// Neighbors kept per particle; extra candidates are dropped.
pub const MAX_NEIGHBORS: usize = 64;

// Trace file field delimiter
pub const DEFAULT_DELIMITER: u8 = b';';

// Reference window the view is mapped to
pub const WINDOW_WIDTH: u32 = 800;
pub const WINDOW_HEIGHT: u32 = 600;

pub const DEFAULT_SEED: u64 = 0x5eed_2d;
