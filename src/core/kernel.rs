//! Smoothing kernels for the classical SPH solver
//!
//! Each kernel takes the already-differenced distance term so the caller
//! decides whether it holds `h^2 - r^2` or `h - r`.

use std::f64::consts::PI;

use crate::math::Real;

/// Poly6-style density kernel, evaluated on `h^2 - r^2`.
#[derive(Clone, Copy, Debug)]
pub struct Poly6Kernel {
    pub kernel_radius: Real,
    coefficient: Real,
}

impl Poly6Kernel {
    pub fn new(kernel_radius: Real) -> Self {
        Self {
            kernel_radius,
            coefficient: 4.0 / (PI * kernel_radius.powi(8)),
        }
    }

    #[inline]
    pub fn value(&self, distance_squared_difference: Real) -> Real {
        let x = distance_squared_difference;
        self.coefficient * (x * x * x)
    }
}

/// Spiky kernel used for the symmetric pressure force, evaluated on `h - r`.
#[derive(Clone, Copy, Debug)]
pub struct SpikyKernel {
    pub kernel_radius: Real,
    coefficient: Real,
}

impl SpikyKernel {
    pub fn new(kernel_radius: Real) -> Self {
        Self {
            kernel_radius,
            coefficient: -10.0 / (PI * kernel_radius.powi(5)),
        }
    }

    #[inline]
    pub fn gradient_at(&self, distance_difference: Real) -> Real {
        let x = distance_difference;
        self.coefficient * (x * x * x)
    }
}

/// Viscosity kernel, linear in `h - r`.
#[derive(Clone, Copy, Debug)]
pub struct ViscosityKernel {
    pub kernel_radius: Real,
    coefficient: Real,
}

impl ViscosityKernel {
    pub fn new(kernel_radius: Real) -> Self {
        Self {
            kernel_radius,
            coefficient: 40.0 / (PI * kernel_radius.powi(5)),
        }
    }

    #[inline]
    pub fn laplacian_at(&self, distance_difference: Real) -> Real {
        self.coefficient * distance_difference
    }
}

/// Normalised proximity `1 - r/h` used by the viscoelastic model.
#[inline]
pub fn proximity(distance: Real, kernel_radius: Real) -> Real {
    1.0 - distance / kernel_radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poly6_vanishes_at_support_edge() {
        let kernel = Poly6Kernel::new(2.0);
        assert_eq!(kernel.value(0.0), 0.0);
        assert!(kernel.value(4.0) > kernel.value(1.0));
    }

    #[test]
    fn poly6_integrates_to_unity_over_support_disk() {
        let h = 1.5;
        let kernel = Poly6Kernel::new(h);
        let rings = 20_000;
        let dr = h / rings as Real;
        let mut integral = 0.0;
        for k in 0..rings {
            let r = (k as Real + 0.5) * dr;
            integral += kernel.value(h * h - r * r) * 2.0 * PI * r * dr;
        }
        assert!(
            (integral - 1.0).abs() < 1e-4,
            "poly6 should integrate to 1, got {}",
            integral
        );
    }

    #[test]
    fn spiky_gradient_is_negative_inside_support() {
        let kernel = SpikyKernel::new(1.0);
        assert!(kernel.gradient_at(0.5) < 0.0);
        assert_eq!(kernel.gradient_at(0.0), 0.0);
    }

    #[test]
    fn viscosity_laplacian_falls_off_linearly() {
        let kernel = ViscosityKernel::new(1.0);
        let half = kernel.laplacian_at(0.5);
        let full = kernel.laplacian_at(1.0);
        assert!((full - 2.0 * half).abs() < 1e-12);
    }

    #[test]
    fn proximity_spans_unit_interval() {
        assert_eq!(proximity(0.0, 0.18), 1.0);
        assert!(proximity(0.18, 0.18).abs() < 1e-12);
    }
}
