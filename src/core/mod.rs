pub mod boundary;
pub mod kernel;
pub mod neighbor_grid;
pub mod particle_state;
pub mod particle_system;

pub use boundary::{Boundary, BoundaryPlane};
pub use kernel::{Poly6Kernel, SpikyKernel, ViscosityKernel, proximity};
pub use neighbor_grid::NeighborGrid;
pub use particle_state::ParticleState;
pub use particle_system::{ParticleSystem, StandardParticles, ViscoelasticParticles};
