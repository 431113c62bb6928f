//! Per-step contact records

use crate::collider::ColliderHandle;
use eoa_math::Vec3;

/// A contact detected between two colliders during one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionInfo {
    pub collider_a: ColliderHandle,
    pub collider_b: ColliderHandle,
    /// Unit normal pointing from A toward B
    pub normal: Vec3,
    /// Overlap along the normal, never negative
    pub penetration: f32,
    /// Approximate contact point in world space
    pub contact_point: Vec3,
}

impl CollisionInfo {
    /// Collider pair ordered so both orientations share one key
    pub fn pair_key(&self) -> (ColliderHandle, ColliderHandle) {
        if self.collider_a <= self.collider_b {
            (self.collider_a, self.collider_b)
        } else {
            (self.collider_b, self.collider_a)
        }
    }
}
