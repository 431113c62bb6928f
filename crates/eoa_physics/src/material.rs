//! Physics materials defining surface properties

use serde::{Deserialize, Serialize};

/// Surface properties copied into a rigid body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsMaterial {
    /// Friction coefficient while at rest
    pub static_friction: f32,
    /// Friction coefficient while sliding
    pub dynamic_friction: f32,
    /// Restitution/bounciness (0 = no bounce, 1 = perfect bounce)
    pub restitution: f32,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            static_friction: 0.6,
            dynamic_friction: 0.4,
            restitution: 0.5,
        }
    }
}

impl PhysicsMaterial {
    /// Create a material with the same static and dynamic friction
    pub fn new(friction: f32, restitution: f32) -> Self {
        Self {
            static_friction: friction,
            dynamic_friction: friction,
            restitution,
        }
    }

    /// Nearly frictionless ice-like material
    pub fn ice() -> Self {
        Self {
            static_friction: 0.1,
            dynamic_friction: 0.03,
            restitution: 0.05,
        }
    }

    /// Bouncy rubber-like material
    pub fn rubber() -> Self {
        Self {
            static_friction: 0.9,
            dynamic_friction: 0.8,
            restitution: 0.8,
        }
    }

    pub fn metal() -> Self {
        Self {
            static_friction: 0.4,
            dynamic_friction: 0.3,
            restitution: 0.2,
        }
    }

    pub fn wood() -> Self {
        Self {
            static_friction: 0.6,
            dynamic_friction: 0.5,
            restitution: 0.3,
        }
    }

    pub fn stone() -> Self {
        Self {
            static_friction: 0.8,
            dynamic_friction: 0.7,
            restitution: 0.1,
        }
    }

    /// Set both friction coefficients
    pub fn with_friction(mut self, friction: f32) -> Self {
        let friction = friction.max(0.0);
        self.static_friction = friction;
        self.dynamic_friction = friction;
        self
    }

    /// Set restitution
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution.clamp(0.0, 1.0);
        self
    }
}

/// Rule for combining material properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CombineRule {
    /// Use the average of both values
    #[default]
    Average,
    /// Use the minimum value
    Min,
    /// Use the maximum value
    Max,
    /// Multiply the values
    Multiply,
}

impl CombineRule {
    /// Combine two values using this rule
    pub fn combine(self, a: f32, b: f32) -> f32 {
        match self {
            Self::Average => (a + b) * 0.5,
            Self::Min => a.min(b),
            Self::Max => a.max(b),
            Self::Multiply => a * b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_rules() {
        assert!((CombineRule::Average.combine(0.9, 0.3) - 0.6).abs() < 1e-6);
        assert_eq!(CombineRule::Min.combine(0.8, 0.2), 0.2);
        assert_eq!(CombineRule::Max.combine(0.8, 0.2), 0.8);
        assert!((CombineRule::Multiply.combine(0.5, 0.4) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_builders_clamp() {
        let material = PhysicsMaterial::default().with_friction(-1.0).with_restitution(2.0);
        assert_eq!(material.dynamic_friction, 0.0);
        assert_eq!(material.static_friction, 0.0);
        assert_eq!(material.restitution, 1.0);
    }
}
