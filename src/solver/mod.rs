//! Time stepping
//!
//! [`Solver`] is what a viewer or benchmark drives: call `update` once per
//! frame and read back positions. Both fluid models implement it.

pub mod seeding;
pub mod sph;
pub mod viscoelastic;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::SphResult;
use crate::math::{Point, Real, Vector};

pub use sph::SphSolver;
pub use viscoelastic::ViscoelasticSolver;

pub trait Solver: Send + Sync {
    fn add_particle(&mut self, position: Point);

    /// Advance exactly one output frame.
    fn update(&mut self) -> SphResult<()>;

    /// Current positions, indexed stably by insertion order.
    fn positions(&self) -> &[Point];

    fn velocities(&self) -> &[Vector];

    fn particle_count(&self) -> usize {
        self.positions().len()
    }

    fn kernel_radius(&self) -> Real;
    fn particle_radius(&self) -> Real;
    fn view_width(&self) -> Real;
    fn view_height(&self) -> Real;
    fn point_size(&self) -> Real;

    /// Reference window the view maps onto, in pixels.
    fn window_size(&self) -> (u32, u32);

    /// Duration of the innermost integration step.
    fn time_step(&self) -> Real;

    fn resize_view(&mut self, width: Real, height: Real) -> SphResult<()>;

    /// Fail with the first NaN or infinite particle quantity.
    fn check_finite(&self) -> SphResult<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SolverKind {
    #[default]
    Standard,
    Viscoelastic,
}

impl FromStr for SolverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" | "sph" => Ok(SolverKind::Standard),
            "viscoelastic" | "visco" => Ok(SolverKind::Viscoelastic),
            other => Err(format!(
                "unknown solver {:?}, expected standard or viscoelastic",
                other
            )),
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Standard => write!(f, "standard"),
            SolverKind::Viscoelastic => write!(f, "viscoelastic"),
        }
    }
}

/// Build a solver of `kind` with default parameters and `count` seeded
/// particles, optionally recording every frame to `output`.
pub fn build_solver(
    kind: SolverKind,
    count: usize,
    output: Option<&Path>,
) -> SphResult<Box<dyn Solver>> {
    Ok(match kind {
        SolverKind::Standard => Box::new(SphSolver::new(count, output)?),
        SolverKind::Viscoelastic => Box::new(ViscoelasticSolver::new(count, output)?),
    })
}
