//! Broad and narrow phase collision detection
//!
//! The broad phase is the naive all-pairs enumeration. The narrow phase
//! dispatches on the pair of shape tags and runs every pair on the rayon
//! pool, funnelling hits through a channel. Hit order is unspecified.

use crate::body::RigidBodyHandle;
use crate::collider::{ColliderHandle, WorldShape};
use crate::contact::CollisionInfo;
use eoa_math::{Sphere, Vec3, AABB};
use rayon::prelude::*;

/// Below this distance a separation direction is considered degenerate
const DEGENERATE_EPSILON: f32 = 1e-6;

/// Snapshot of a collider taken at the start of collision detection
#[derive(Debug, Clone, Copy)]
pub struct ColliderProxy {
    pub handle: ColliderHandle,
    pub shape: WorldShape,
    pub body: Option<RigidBodyHandle>,
    pub is_trigger: bool,
    pub user_data: u128,
}

/// Contact geometry between two shapes, normal pointing from the first to the second
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeContact {
    pub normal: Vec3,
    pub penetration: f32,
    pub point: Vec3,
}

impl ShapeContact {
    fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }

    fn into_info(self, a: ColliderHandle, b: ColliderHandle) -> CollisionInfo {
        CollisionInfo {
            collider_a: a,
            collider_b: b,
            normal: self.normal,
            penetration: self.penetration,
            contact_point: self.point,
        }
    }
}

/// Every unordered pair `(i, j)` with `i < j`
pub fn all_pairs(count: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(count * count.saturating_sub(1) / 2);
    for i in 0..count {
        for j in (i + 1)..count {
            pairs.push((i, j));
        }
    }
    pairs
}

/// Test every candidate pair in parallel and collect the contacts
pub fn detect_pairs(proxies: &[ColliderProxy], pairs: &[(usize, usize)]) -> Vec<CollisionInfo> {
    let (sender, receiver) = crossbeam_channel::unbounded();

    pairs.par_iter().for_each_with(sender, |sender, &(i, j)| {
        if let Some(info) = check_collision(&proxies[i], &proxies[j]) {
            // The receiver is alive until after the fan-out joins
            let _ = sender.send(info);
        }
    });

    receiver.try_iter().collect()
}

/// Narrow phase test between two colliders
///
/// The returned normal points from `a` toward `b`.
pub fn check_collision(a: &ColliderProxy, b: &ColliderProxy) -> Option<CollisionInfo> {
    let contact = match (&a.shape, &b.shape) {
        (WorldShape::Box(box_a), WorldShape::Box(box_b)) => box_box(box_a, box_b),
        (WorldShape::Box(aabb), WorldShape::Sphere(sphere)) => box_sphere(aabb, sphere),
        (WorldShape::Sphere(sphere), WorldShape::Box(aabb)) => {
            box_sphere(aabb, sphere).map(ShapeContact::flipped)
        }
        (WorldShape::Sphere(sphere_a), WorldShape::Sphere(sphere_b)) => {
            sphere_sphere(sphere_a, sphere_b)
        }
    }?;

    Some(contact.into_info(a.handle, b.handle))
}

/// AABB overlap with the minimum-penetration axis as separation axis.
///
/// Ties between axes resolve X, then Y, then Z. The contact point is the
/// midpoint of the two centers.
pub fn box_box(a: &AABB, b: &AABB) -> Option<ShapeContact> {
    if !a.intersects(b) {
        return None;
    }

    let mut axis = 0;
    let mut penetration = f32::MAX;
    for i in 0..3 {
        let overlap = (a.max[i] - b.min[i]).min(b.max[i] - a.min[i]);
        if overlap < penetration {
            penetration = overlap;
            axis = i;
        }
    }

    let normal = if a.max[axis] < b.max[axis] {
        Vec3::AXES[axis]
    } else {
        -Vec3::AXES[axis]
    };

    Some(ShapeContact {
        normal,
        penetration: penetration.max(0.0),
        point: (a.center() + b.center()) * 0.5,
    })
}

/// Box against sphere, normal pointing from the box toward the sphere
pub fn box_sphere(aabb: &AABB, sphere: &Sphere) -> Option<ShapeContact> {
    let closest = aabb.closest_point(sphere.center);
    let delta = sphere.center - closest;
    let distance_sq = delta.length_squared();

    if distance_sq >= sphere.radius * sphere.radius {
        return None;
    }

    let distance = distance_sq.sqrt();
    if distance > DEGENERATE_EPSILON {
        return Some(ShapeContact {
            normal: delta / distance,
            penetration: sphere.radius - distance,
            point: closest,
        });
    }

    // Center inside the box: push out through the nearest face
    let (normal, face_distance) = nearest_face(aabb, sphere.center);
    Some(ShapeContact {
        normal,
        penetration: sphere.radius + face_distance,
        point: sphere.center + normal * face_distance,
    })
}

/// Sphere against sphere; coincident centers separate along +Y
pub fn sphere_sphere(a: &Sphere, b: &Sphere) -> Option<ShapeContact> {
    let delta = b.center - a.center;
    let radius_sum = a.radius + b.radius;
    let distance_sq = delta.length_squared();

    if distance_sq >= radius_sum * radius_sum {
        return None;
    }

    let distance = distance_sq.sqrt();
    let normal = if distance > DEGENERATE_EPSILON {
        delta / distance
    } else {
        Vec3::Y
    };

    Some(ShapeContact {
        normal,
        penetration: radius_sum - distance,
        point: a.center + normal * a.radius,
    })
}

/// Outward normal of the face closest to an interior point and the distance to it
fn nearest_face(aabb: &AABB, point: Vec3) -> (Vec3, f32) {
    let mut normal = -Vec3::AXES[0];
    let mut best = f32::MAX;

    for axis in 0..3 {
        let to_min = point[axis] - aabb.min[axis];
        if to_min < best {
            best = to_min;
            normal = -Vec3::AXES[axis];
        }
        let to_max = aabb.max[axis] - point[axis];
        if to_max < best {
            best = to_max;
            normal = Vec3::AXES[axis];
        }
    }

    (normal, best.max(0.0))
}
