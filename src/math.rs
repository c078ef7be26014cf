use bevy::math::{DVec2, Vec2};

pub type Real = f64;

pub type Vector = DVec2;
pub type Point = DVec2;

#[inline(always)]
pub fn zero_vector() -> Vector {
    DVec2::ZERO
}

#[inline(always)]
pub fn is_finite_vector(v: Vector) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

/// Narrow a simulation-space point to the single precision used by rendering.
#[inline(always)]
pub fn to_render(v: Vector) -> Vec2 {
    v.as_vec2()
}

/// Euclidean distance between two points.
#[inline(always)]
pub fn distance(a: Point, b: Point) -> Real {
    (b - a).length()
}
