//! Rigid body types and integration

use crate::arena::ArenaIndex;
use crate::error::{PhysicsError, Result};
use crate::material::PhysicsMaterial;
use eoa_math::{Quat, Transform, Vec3};
use serde::{Deserialize, Serialize};

/// Handle to a rigid body in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RigidBodyHandle(pub(crate) ArenaIndex);

impl RigidBodyHandle {
    /// Create from a raw arena index
    pub fn from_raw(index: ArenaIndex) -> Self {
        Self(index)
    }

    /// Get the raw arena index
    pub fn raw(&self) -> ArenaIndex {
        self.0
    }
}

/// Description for creating a rigid body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidBodyDesc {
    /// Initial position
    pub position: [f32; 3],
    /// Initial rotation (quaternion: x, y, z, w)
    pub rotation: [f32; 4],
    /// Scale, read by attached colliders
    pub scale: [f32; 3],
    /// Initial linear velocity
    pub linear_velocity: [f32; 3],
    /// Initial angular velocity
    pub angular_velocity: [f32; 3],
    /// Mass, must be positive and finite
    pub mass: f32,
    /// Linear damping (air resistance), in [0, 1)
    pub linear_damping: f32,
    /// Angular damping (rotational resistance), in [0, 1)
    pub angular_damping: f32,
    /// Bounciness in [0, 1]
    pub restitution: f32,
    /// Friction coefficient, non-negative
    pub friction: f32,
    /// Kinematic bodies are moved by the user only
    pub is_kinematic: bool,
    /// Apply world gravity during integration
    pub use_gravity: bool,
    /// Opaque host data (usually an entity id)
    pub user_data: u128,
}

impl Default for RigidBodyDesc {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0, 1.0, 1.0],
            linear_velocity: [0.0, 0.0, 0.0],
            angular_velocity: [0.0, 0.0, 0.0],
            mass: 1.0,
            linear_damping: 0.01,
            angular_damping: 0.05,
            restitution: 0.5,
            friction: 0.3,
            is_kinematic: false,
            use_gravity: true,
            user_data: 0,
        }
    }
}

impl RigidBodyDesc {
    /// Create a dynamic body description
    pub fn dynamic() -> Self {
        Self::default()
    }

    /// Create a kinematic body description
    pub fn kinematic() -> Self {
        Self {
            is_kinematic: true,
            use_gravity: false,
            ..Default::default()
        }
    }

    /// Set position
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = [x, y, z];
        self
    }

    /// Set rotation from euler angles (radians)
    pub fn with_rotation_euler(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Quat::from_euler(x, y, z).to_array();
        self
    }

    /// Set scale
    pub fn with_scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.scale = [x, y, z];
        self
    }

    /// Set linear velocity
    pub fn with_velocity(mut self, x: f32, y: f32, z: f32) -> Self {
        self.linear_velocity = [x, y, z];
        self
    }

    /// Set angular velocity
    pub fn with_angular_velocity(mut self, x: f32, y: f32, z: f32) -> Self {
        self.angular_velocity = [x, y, z];
        self
    }

    /// Set mass
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Set linear and angular damping
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    /// Copy restitution and sliding friction from a material
    pub fn with_material(mut self, material: &PhysicsMaterial) -> Self {
        self.restitution = material.restitution;
        self.friction = material.dynamic_friction;
        self
    }

    /// Enable or disable gravity
    pub fn with_gravity(mut self, enabled: bool) -> Self {
        self.use_gravity = enabled;
        self
    }

    pub fn with_user_data(mut self, user_data: u128) -> Self {
        self.user_data = user_data;
        self
    }
}

/// Simulated rigid body state
#[derive(Debug, Clone)]
pub struct RigidBody {
    /// World transform; colliders attached to this body follow it
    pub transform: Transform,
    /// Linear velocity
    pub velocity: Vec3,
    /// Angular velocity (axis * radians per second)
    pub angular_velocity: Vec3,
    mass: f32,
    inv_mass: f32,
    linear_damping: f32,
    angular_damping: f32,
    restitution: f32,
    friction: f32,
    is_kinematic: bool,
    /// Apply world gravity during integration
    pub use_gravity: bool,
    force: Vec3,
    torque: Vec3,
    acceleration: Vec3,
    angular_acceleration: Vec3,
    /// Opaque host data
    pub user_data: u128,
}

impl RigidBody {
    /// Build a body from its description.
    ///
    /// Mass must be positive and finite. Damping, restitution and friction
    /// are clamped into range.
    pub fn new(desc: &RigidBodyDesc) -> Result<Self> {
        let (mass, inv_mass) = checked_mass(desc.mass)?;

        let transform = Transform::new(
            Vec3::from_array(desc.position),
            Quat::from_array(desc.rotation).normalize(),
            Vec3::from_array(desc.scale),
        );

        Ok(Self {
            transform,
            velocity: Vec3::from_array(desc.linear_velocity),
            angular_velocity: Vec3::from_array(desc.angular_velocity),
            mass,
            inv_mass,
            linear_damping: clamp_damping("linear_damping", desc.linear_damping),
            angular_damping: clamp_damping("angular_damping", desc.angular_damping),
            restitution: clamp_restitution(desc.restitution),
            friction: clamp_friction(desc.friction),
            is_kinematic: desc.is_kinematic,
            use_gravity: desc.use_gravity,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            angular_acceleration: Vec3::ZERO,
            user_data: desc.user_data,
        })
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Change the mass; rejects non-positive or non-finite values
    pub fn set_mass(&mut self, mass: f32) -> Result<()> {
        let (mass, inv_mass) = checked_mass(mass)?;
        self.mass = mass;
        self.inv_mass = inv_mass;
        Ok(())
    }

    #[inline]
    pub fn is_kinematic(&self) -> bool {
        self.is_kinematic
    }

    /// Switch between kinematic and dynamic; pending forces are dropped
    pub fn set_kinematic(&mut self, kinematic: bool) {
        self.is_kinematic = kinematic;
        self.clear_forces();
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        self.transform.rotation
    }

    pub fn linear_damping(&self) -> f32 {
        self.linear_damping
    }

    pub fn angular_damping(&self) -> f32 {
        self.angular_damping
    }

    pub fn set_damping(&mut self, linear: f32, angular: f32) {
        self.linear_damping = clamp_damping("linear_damping", linear);
        self.angular_damping = clamp_damping("angular_damping", angular);
    }

    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    pub fn set_restitution(&mut self, restitution: f32) {
        self.restitution = clamp_restitution(restitution);
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    pub fn set_friction(&mut self, friction: f32) {
        self.friction = clamp_friction(friction);
    }

    /// Accumulated force for the current step
    pub fn force(&self) -> Vec3 {
        self.force
    }

    /// Accumulated torque for the current step
    pub fn torque(&self) -> Vec3 {
        self.torque
    }

    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    pub fn angular_acceleration(&self) -> Vec3 {
        self.angular_acceleration
    }

    /// Accumulate a force; acceleration is updated immediately
    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
        self.acceleration = self.force * self.inv_mass;
    }

    /// Accumulate a torque.
    ///
    /// There is no inertia tensor: angular acceleration is torque over mass.
    pub fn add_torque(&mut self, torque: Vec3) {
        self.torque += torque;
        self.angular_acceleration = self.torque * self.inv_mass;
    }

    /// Instantaneous velocity change. Kinematic bodies ignore impulses.
    pub fn add_impulse(&mut self, impulse: Vec3) {
        if self.is_kinematic {
            return;
        }
        self.velocity += impulse * self.inv_mass;
    }

    /// Reset force and torque accumulators along with the derived accelerations
    pub fn clear_forces(&mut self) {
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
        self.acceleration = Vec3::ZERO;
        self.angular_acceleration = Vec3::ZERO;
    }

    /// Advance the body by `dt` with semi-implicit Euler.
    ///
    /// Kinematic bodies keep their state; only their accumulators are reset.
    pub fn integrate(&mut self, dt: f32, gravity: Vec3) {
        if self.is_kinematic {
            self.clear_forces();
            return;
        }

        if self.use_gravity {
            self.force += gravity * self.mass;
        }
        self.acceleration = self.force * self.inv_mass;
        self.angular_acceleration = self.torque * self.inv_mass;

        self.velocity += self.acceleration * dt;
        self.angular_velocity += self.angular_acceleration * dt;

        self.velocity *= (1.0 - self.linear_damping * dt).max(0.0);
        self.angular_velocity *= (1.0 - self.angular_damping * dt).max(0.0);

        self.transform.position += self.velocity * dt;

        let rotation_step = self.angular_velocity * dt;
        if rotation_step.length_squared() > 0.0 {
            self.transform.rotate_local(Quat::from_scaled_axis(rotation_step));
        }

        self.clear_forces();
    }
}

fn checked_mass(mass: f32) -> Result<(f32, f32)> {
    if mass.is_finite() && mass > 0.0 {
        Ok((mass, 1.0 / mass))
    } else {
        Err(PhysicsError::InvalidMass(mass))
    }
}

fn clamp_damping(name: &str, value: f32) -> f32 {
    // [0, 1)
    let clamped = if value.is_finite() {
        value.clamp(0.0, 0.999)
    } else {
        0.0
    };
    if clamped != value {
        log::warn!("{} {} out of range, clamped to {}", name, value, clamped);
    }
    clamped
}

fn clamp_restitution(value: f32) -> f32 {
    let clamped = if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    };
    if clamped != value {
        log::warn!("restitution {} out of range, clamped to {}", value, clamped);
    }
    clamped
}

fn clamp_friction(value: f32) -> f32 {
    let clamped = if value.is_finite() { value.max(0.0) } else { 0.0 };
    if clamped != value {
        log::warn!("friction {} out of range, clamped to {}", value, clamped);
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;
    const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

    #[test]
    fn test_desc_defaults() {
        let desc = RigidBodyDesc::default();
        assert_eq!(desc.mass, 1.0);
        assert_eq!(desc.linear_damping, 0.01);
        assert_eq!(desc.angular_damping, 0.05);
        assert_eq!(desc.restitution, 0.5);
        assert_eq!(desc.friction, 0.3);
        assert!(desc.use_gravity);
        assert!(!desc.is_kinematic);
    }

    #[test]
    fn test_rejects_invalid_mass() {
        for mass in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let result = RigidBody::new(&RigidBodyDesc::dynamic().with_mass(mass));
            assert!(matches!(result, Err(PhysicsError::InvalidMass(_))));
        }
    }

    #[test]
    fn test_clamps_out_of_range_properties() {
        let desc = RigidBodyDesc::dynamic()
            .with_damping(1.5, -0.2)
            .with_restitution(2.0)
            .with_friction(-1.0);
        let body = RigidBody::new(&desc).unwrap();
        assert!(body.linear_damping() < 1.0);
        assert_eq!(body.angular_damping(), 0.0);
        assert_eq!(body.restitution(), 1.0);
        assert_eq!(body.friction(), 0.0);
    }

    #[test]
    fn test_add_force_updates_acceleration_immediately() {
        let mut body = RigidBody::new(&RigidBodyDesc::dynamic().with_mass(2.0)).unwrap();
        body.add_force(Vec3::new(4.0, 0.0, 0.0));
        body.add_force(Vec3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(body.acceleration().x, 3.0);

        body.add_torque(Vec3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(body.angular_acceleration().y, 0.5);
    }

    #[test]
    fn test_add_impulse() {
        let mut body = RigidBody::new(&RigidBodyDesc::dynamic().with_mass(2.0)).unwrap();
        body.add_impulse(Vec3::new(0.0, 10.0, 0.0));
        assert_relative_eq!(body.velocity.y, 5.0);

        let mut kinematic = RigidBody::new(&RigidBodyDesc::kinematic()).unwrap();
        kinematic.add_impulse(Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(kinematic.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_cleared_force_is_not_integrated() {
        let desc = RigidBodyDesc::dynamic().with_gravity(false);
        let mut body = RigidBody::new(&desc).unwrap();
        body.add_force(Vec3::new(100.0, 0.0, 0.0));
        body.clear_forces();
        body.integrate(DT, GRAVITY);

        assert_eq!(body.acceleration(), Vec3::ZERO);
        assert_eq!(body.velocity, Vec3::ZERO);
        assert_eq!(body.position(), Vec3::ZERO);
    }

    #[test]
    fn test_integrate_gravity() {
        let desc = RigidBodyDesc::dynamic().with_damping(0.0, 0.0);
        let mut body = RigidBody::new(&desc).unwrap();
        body.integrate(DT, GRAVITY);

        assert_relative_eq!(body.velocity.y, -9.81 * DT, epsilon = 1e-6);
        // Semi-implicit: position uses the updated velocity
        assert_relative_eq!(body.position().y, -9.81 * DT * DT, epsilon = 1e-6);
        assert_eq!(body.force(), Vec3::ZERO);
    }

    #[test]
    fn test_integrate_without_gravity_flag() {
        let desc = RigidBodyDesc::dynamic().with_gravity(false);
        let mut body = RigidBody::new(&desc).unwrap();
        for _ in 0..120 {
            body.integrate(DT, GRAVITY);
        }
        assert_eq!(body.position(), Vec3::ZERO);
    }

    #[test]
    fn test_kinematic_ignores_integration() {
        let desc = RigidBodyDesc::kinematic()
            .with_position(1.0, 2.0, 3.0)
            .with_velocity(1.0, 0.0, 0.0)
            .with_gravity(true);
        let mut body = RigidBody::new(&desc).unwrap();
        body.add_force(Vec3::new(0.0, 500.0, 0.0));
        body.add_torque(Vec3::new(5.0, 0.0, 0.0));
        body.integrate(DT, GRAVITY);

        assert_eq!(body.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(body.velocity, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(body.rotation(), Quat::IDENTITY);
        assert_eq!(body.force(), Vec3::ZERO);
    }

    #[test]
    fn test_angular_velocity_rotates_body() {
        let desc = RigidBodyDesc::dynamic()
            .with_gravity(false)
            .with_damping(0.0, 0.0)
            .with_angular_velocity(0.0, core::f32::consts::PI, 0.0);
        let mut body = RigidBody::new(&desc).unwrap();
        body.integrate(0.5, GRAVITY);

        let expected = Quat::from_rotation_y(core::f32::consts::FRAC_PI_2);
        assert_relative_eq!(body.rotation().dot(expected).abs(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(body.rotation().length(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_damping_reduces_velocity() {
        let desc = RigidBodyDesc::dynamic()
            .with_gravity(false)
            .with_damping(0.5, 0.0)
            .with_velocity(10.0, 0.0, 0.0);
        let mut body = RigidBody::new(&desc).unwrap();
        body.integrate(0.1, GRAVITY);
        assert_relative_eq!(body.velocity.x, 10.0 * 0.95, epsilon = 1e-5);
    }

    #[test]
    fn test_desc_serde_defaults() {
        let desc: RigidBodyDesc = serde_json::from_str(r#"{ "mass": 3.0 }"#).unwrap();
        assert_eq!(desc.mass, 3.0);
        assert_eq!(desc.rotation, [0.0, 0.0, 0.0, 1.0]);
    }
}
