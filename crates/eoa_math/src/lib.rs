//! # eoa_math - Math Primitives
//!
//! Small, dependency-free math types used by the physics core:
//! vectors, quaternions, transforms, bounding volumes and ray tests.

pub mod vector;
pub mod quaternion;
pub mod transform;
pub mod bounds;
pub mod ray;
pub mod intersect;

pub use vector::*;
pub use quaternion::*;
pub use transform::*;
pub use bounds::*;
pub use ray::*;
pub use intersect::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const TAU: f32 = PI * 2.0;
    pub const DEG_TO_RAD: f32 = PI / 180.0;
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
    pub const EPSILON: f32 = 1e-6;
}

/// Convert degrees to radians
#[inline]
pub fn radians(degrees: f32) -> f32 {
    degrees * consts::DEG_TO_RAD
}

/// Convert radians to degrees
#[inline]
pub fn degrees(radians: f32) -> f32 {
    radians * consts::RAD_TO_DEG
}

pub mod prelude {
    pub use crate::vector::Vec3;
    pub use crate::quaternion::Quat;
    pub use crate::transform::Transform;
    pub use crate::bounds::{AABB, Sphere};
    pub use crate::ray::Ray;
    pub use crate::intersect::{
        ray_aabb, ray_aabb_with_normal, ray_sphere, ray_sphere_with_normal,
    };
    pub use crate::{radians, degrees};
}
