//! Structure-of-arrays particle storage
//!
//! A particle is an index into these parallel arrays. Every array always has
//! the same length.

use crate::math::{Real, Vector, is_finite_vector, zero_vector};

#[derive(Clone, Debug, Default)]
pub struct ParticleState {
    pub(crate) positions: Vec<Vector>,
    pub(crate) velocities: Vec<Vector>,
    pub(crate) forces: Vec<Vector>,
    pub(crate) densities: Vec<Real>,
    pub(crate) pressures: Vec<Real>,
}

impl ParticleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a particle at rest and return its index.
    pub fn push(&mut self, position: Vector) -> usize {
        let index = self.positions.len();
        self.positions.push(position);
        self.velocities.push(zero_vector());
        self.forces.push(zero_vector());
        self.densities.push(0.0);
        self.pressures.push(0.0);
        index
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vector] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Vector] {
        &mut self.positions
    }

    pub fn velocities(&self) -> &[Vector] {
        &self.velocities
    }

    pub fn velocities_mut(&mut self) -> &mut [Vector] {
        &mut self.velocities
    }

    pub fn forces(&self) -> &[Vector] {
        &self.forces
    }

    pub fn forces_mut(&mut self) -> &mut [Vector] {
        &mut self.forces
    }

    pub fn densities(&self) -> &[Real] {
        &self.densities
    }

    pub fn densities_mut(&mut self) -> &mut [Real] {
        &mut self.densities
    }

    pub fn pressures(&self) -> &[Real] {
        &self.pressures
    }

    pub fn pressures_mut(&mut self) -> &mut [Real] {
        &mut self.pressures
    }

    /// First quantity that is NaN or infinite, scanning particle by particle.
    pub fn first_non_finite(&self) -> Option<(&'static str, usize)> {
        for i in 0..self.len() {
            if !is_finite_vector(self.positions[i]) {
                return Some(("position", i));
            }
            if !is_finite_vector(self.velocities[i]) {
                return Some(("velocity", i));
            }
            if !self.densities[i].is_finite() {
                return Some(("density", i));
            }
            if !self.pressures[i].is_finite() {
                return Some(("pressure", i));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_grows_every_array() {
        let mut state = ParticleState::new();
        let index = state.push(Vector::new(1.0, 2.0));
        state.push(Vector::new(3.0, 4.0));

        assert_eq!(index, 0);
        assert_eq!(state.len(), 2);
        assert_eq!(state.velocities().len(), 2);
        assert_eq!(state.forces().len(), 2);
        assert_eq!(state.densities().len(), 2);
        assert_eq!(state.pressures().len(), 2);
        assert_eq!(state.velocities()[1], Vector::ZERO);
    }

    #[test]
    fn reports_first_non_finite_quantity() {
        let mut state = ParticleState::new();
        state.push(Vector::new(1.0, 2.0));
        state.push(Vector::new(3.0, 4.0));
        assert_eq!(state.first_non_finite(), None);

        state.pressures_mut()[1] = Real::INFINITY;
        assert_eq!(state.first_non_finite(), Some(("pressure", 1)));

        state.velocities_mut()[0] = Vector::new(Real::NAN, 0.0);
        assert_eq!(state.first_non_finite(), Some(("velocity", 0)));
    }
}
