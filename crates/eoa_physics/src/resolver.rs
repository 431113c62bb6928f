//! Impulse-based contact resolution
//!
//! Each contact is resolved once per step, in a single pass with no
//! iterative relaxation. Stacks of bodies may keep some residual overlap.

use crate::arena::Arena;
use crate::body::RigidBody;
use crate::collider::Collider;
use crate::contact::CollisionInfo;
use crate::material::CombineRule;

/// Share of the penetration each body is pushed out by
pub const CORRECTION_FACTOR: f32 = 0.5;

/// Scale applied to the tangential friction response
pub const FRICTION_FACTOR: f32 = 0.1;

/// Squared tangent length below which the tangent is used unnormalized
const TANGENT_EPSILON_SQ: f32 = 1e-4;

/// Resolve a contact between the bodies owning its two colliders.
///
/// Returns the normal impulse magnitude, or zero when the contact was skipped
/// (unattached collider, both colliders on one body, missing body).
pub fn resolve_pair(
    info: &CollisionInfo,
    colliders: &Arena<Collider>,
    bodies: &mut Arena<RigidBody>,
) -> f32 {
    let parent_a = colliders.get(info.collider_a.0).and_then(Collider::parent);
    let parent_b = colliders.get(info.collider_b.0).and_then(Collider::parent);

    let (Some(parent_a), Some(parent_b)) = (parent_a, parent_b) else {
        return 0.0;
    };

    match bodies.get2_mut(parent_a.0, parent_b.0) {
        Some((a, b)) => resolve_contact(info, a, b),
        None => 0.0,
    }
}

/// Push two bodies apart and exchange velocity along the contact normal
pub fn resolve_contact(info: &CollisionInfo, a: &mut RigidBody, b: &mut RigidBody) -> f32 {
    if a.is_kinematic() && b.is_kinematic() {
        return 0.0;
    }

    let normal = info.normal;

    let correction = normal * (info.penetration * CORRECTION_FACTOR);
    if !a.is_kinematic() {
        a.transform.position -= correction;
    }
    if !b.is_kinematic() {
        b.transform.position += correction;
    }

    let relative_velocity = b.velocity - a.velocity;
    let velocity_along_normal = relative_velocity.dot(normal);
    if velocity_along_normal > 0.0 {
        return 0.0;
    }

    let restitution = CombineRule::Min.combine(a.restitution(), b.restitution());
    let inverse_mass_sum = a.inverse_mass() + b.inverse_mass();
    let impulse = -(1.0 + restitution) * velocity_along_normal / inverse_mass_sum;

    if !a.is_kinematic() {
        a.velocity -= normal * (impulse * a.inverse_mass());
    }
    if !b.is_kinematic() {
        b.velocity += normal * (impulse * b.inverse_mass());
    }

    let mut tangent = relative_velocity - normal * velocity_along_normal;
    if tangent.length_squared() > TANGENT_EPSILON_SQ {
        tangent = tangent.normalize();
    }
    let friction = CombineRule::Average.combine(a.friction(), b.friction());
    let friction_delta = tangent * (friction * FRICTION_FACTOR);

    if !a.is_kinematic() {
        a.velocity -= friction_delta;
    }
    if !b.is_kinematic() {
        b.velocity += friction_delta;
    }

    impulse
}
