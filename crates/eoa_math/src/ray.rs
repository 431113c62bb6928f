//! 3D Ray for raycast queries

use crate::vector::Vec3;

/// 3D ray for intersection testing
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Ray origin point
    pub origin: Vec3,
    /// Ray direction (unit length when built through [`Ray::new`])
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray with normalized direction
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Create a ray keeping the direction as given; distances returned by
    /// intersection tests are then measured in multiples of its length.
    #[inline]
    pub const fn from_raw(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Get a point at distance t along the ray
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_direction_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0));
        assert!((ray.direction.length() - 1.0).abs() < 0.001);
        assert!((ray.at(5.0).z - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_raw_ray_keeps_direction_length() {
        let ray = Ray::from_raw(Vec3::ZERO, Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(ray.at(2.0), Vec3::new(0.0, 0.0, 6.0));
    }
}
