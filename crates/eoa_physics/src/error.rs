//! Error types for the physics system

use thiserror::Error;

/// Physics system errors
///
/// Only raised at the API boundary (registration, lookups, configuration).
/// The step loop itself never fails.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Rigid body not found (removed or never created)
    #[error("Rigid body not found: {0:?}")]
    BodyNotFound(crate::body::RigidBodyHandle),

    /// Collider not found (removed or never created)
    #[error("Collider not found: {0:?}")]
    ColliderNotFound(crate::collider::ColliderHandle),

    /// Mass must be positive and finite
    #[error("Invalid rigid body mass: {0} (must be positive and finite)")]
    InvalidMass(f32),

    /// Collision shape with non-positive or non-finite dimensions
    #[error("Invalid collision shape: {0}")]
    InvalidShape(String),

    /// Invalid configuration
    #[error("Invalid physics configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for physics operations
pub type Result<T> = std::result::Result<T, PhysicsError>;
