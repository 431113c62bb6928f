//! Ray intersection tests against the collision primitives
//!
//! Distances are expressed in multiples of the ray direction's length, so a
//! ray built with [`Ray::new`] yields world-space distances.

use crate::bounds::{Sphere, AABB};
use crate::ray::Ray;
use crate::vector::Vec3;

/// Below this magnitude a direction component is treated as parallel to the slab
pub const PARALLEL_EPSILON: f32 = 1e-6;

/// Ray-AABB intersection using the slab method
///
/// The interval starts at `[0, +inf)`, so a ray starting inside the box hits
/// at distance zero. Returns `None` when the slabs do not overlap.
pub fn ray_aabb(ray: &Ray, aabb: &AABB) -> Option<f32> {
    ray_aabb_with_normal(ray, aabb).map(|(t, _)| t)
}

/// Ray-AABB intersection with the outward normal of the entry face
///
/// When the origin is inside the box no face is crossed and the normal is
/// the reversed ray direction.
pub fn ray_aabb_with_normal(ray: &Ray, aabb: &AABB) -> Option<(f32, Vec3)> {
    let mut t_min = 0.0f32;
    let mut t_max = f32::MAX;
    let mut normal = -ray.direction.normalize_or_zero();

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let direction = ray.direction[axis];
        let (lo, hi) = (aabb.min[axis], aabb.max[axis]);

        if direction.abs() < PARALLEL_EPSILON {
            // Parallel: only the origin's position inside the slab matters
            if origin < lo || origin > hi {
                return None;
            }
            continue;
        }

        let inv_d = 1.0 / direction;
        let mut t1 = (lo - origin) * inv_d;
        let mut t2 = (hi - origin) * inv_d;
        let mut entry_normal = -Vec3::AXES[axis];

        if t1 > t2 {
            core::mem::swap(&mut t1, &mut t2);
            entry_normal = Vec3::AXES[axis];
        }

        if t1 > t_min {
            t_min = t1;
            normal = entry_normal;
        }
        if t2 < t_max {
            t_max = t2;
        }
        if t_min > t_max {
            return None;
        }
    }

    if t_min >= 0.0 && t_min <= t_max {
        Some((t_min, normal))
    } else {
        None
    }
}

/// Ray-Sphere intersection
///
/// Only the near root `(-b - sqrt(disc)) / 2a` is considered; it must be
/// non-negative, so a ray starting inside the sphere reports no hit.
pub fn ray_sphere(ray: &Ray, sphere: &Sphere) -> Option<f32> {
    let oc = ray.origin - sphere.center;
    let a = ray.direction.dot(ray.direction);
    if a <= 0.0 {
        return None;
    }
    let b = 2.0 * oc.dot(ray.direction);
    let c = oc.dot(oc) - sphere.radius * sphere.radius;
    let discriminant = b * b - 4.0 * a * c;

    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    if t >= 0.0 { Some(t) } else { None }
}

/// Ray-Sphere intersection with the surface normal at the hit point
pub fn ray_sphere_with_normal(ray: &Ray, sphere: &Sphere) -> Option<(f32, Vec3)> {
    let t = ray_sphere(ray, sphere)?;
    let normal = (ray.at(t) - sphere.center).normalize_or_zero();
    Some((t, normal))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> AABB {
        AABB::from_center_size(Vec3::ZERO, Vec3::ONE)
    }

    #[test]
    fn test_ray_aabb_hit_front_face() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let (t, normal) = ray_aabb_with_normal(&ray, &unit_box()).unwrap();
        assert!((t - 4.5).abs() < 1e-5);
        assert_eq!(normal, Vec3::NEG_Z);
        assert!((ray.at(t) - Vec3::new(0.0, 0.0, -0.5)).length() < 1e-5);
    }

    #[test]
    fn test_ray_aabb_negative_direction_hits_max_face() {
        let ray = Ray::new(Vec3::new(3.0, 0.0, 0.0), Vec3::NEG_X);
        let (t, normal) = ray_aabb_with_normal(&ray, &unit_box()).unwrap();
        assert!((t - 2.5).abs() < 1e-5);
        assert_eq!(normal, Vec3::X);
    }

    #[test]
    fn test_ray_aabb_parallel_outside_slab_misses() {
        let ray = Ray::new(Vec3::new(0.0, 2.0, -5.0), Vec3::Z);
        assert!(ray_aabb(&ray, &unit_box()).is_none());
    }

    #[test]
    fn test_ray_aabb_behind_misses() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert!(ray_aabb(&ray, &unit_box()).is_none());
    }

    #[test]
    fn test_ray_aabb_origin_inside_hits_at_zero() {
        let ray = Ray::new(Vec3::new(0.0, -0.49, 0.0), Vec3::NEG_Y);
        assert_eq!(ray_aabb(&ray, &unit_box()), Some(0.0));
    }

    #[test]
    fn test_ray_sphere_hit() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0);
        let (t, normal) = ray_sphere_with_normal(&ray, &sphere).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
        assert!((normal - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_ray_sphere_miss_and_inside() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(ray_sphere(&ray, &Sphere::new(Vec3::new(10.0, 0.0, 5.0), 1.0)).is_none());
        assert!(ray_sphere(&ray, &Sphere::new(Vec3::ZERO, 5.0)).is_none());
    }

    #[test]
    fn test_ray_sphere_unnormalized_direction_scales_distance() {
        let ray = Ray::from_raw(Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0));
        let t = ray_sphere(&ray, &Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0)).unwrap();
        assert!((t - 2.0).abs() < 1e-5);
    }
}
