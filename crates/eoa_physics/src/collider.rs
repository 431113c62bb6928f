//! Collider shapes and their world-space geometry

use crate::arena::{Arena, ArenaIndex};
use crate::body::{RigidBody, RigidBodyHandle};
use crate::error::{PhysicsError, Result};
use eoa_math::{ray_aabb_with_normal, ray_sphere_with_normal, Quat, Ray, Sphere, Transform, Vec3, AABB};
use serde::{Deserialize, Serialize};

/// Handle to a collider in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderHandle(pub(crate) ArenaIndex);

impl ColliderHandle {
    /// Create from a raw arena index
    pub fn from_raw(index: ArenaIndex) -> Self {
        Self(index)
    }

    /// Get the raw arena index
    pub fn raw(&self) -> ArenaIndex {
        self.0
    }
}

/// Collision shape type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Axis-aligned box with full size
    Box { size: [f32; 3] },
    /// Sphere with radius
    Sphere { radius: f32 },
}

impl Default for ColliderShape {
    fn default() -> Self {
        Self::Box {
            size: [1.0, 1.0, 1.0],
        }
    }
}

impl ColliderShape {
    /// Create a box shape from full size
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Self::Box {
            size: [width, height, depth],
        }
    }

    /// Create a sphere shape
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Reject non-positive or non-finite dimensions
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Box { size } => {
                if size.iter().all(|s| s.is_finite() && *s > 0.0) {
                    Ok(())
                } else {
                    Err(PhysicsError::InvalidShape(format!("box size {:?}", size)))
                }
            }
            Self::Sphere { radius } => {
                if radius.is_finite() && *radius > 0.0 {
                    Ok(())
                } else {
                    Err(PhysicsError::InvalidShape(format!("sphere radius {}", radius)))
                }
            }
        }
    }

    /// Shape placed in the world by `transform`, offset by `center`.
    ///
    /// Boxes ignore rotation and stay axis-aligned. Sphere radii are scaled
    /// by the largest scale component.
    pub fn world_shape(&self, transform: &Transform, center: Vec3) -> WorldShape {
        let world_center = transform.position + center;
        match self {
            Self::Box { size } => {
                let size = Vec3::from_array(*size).mul_elem(transform.scale);
                WorldShape::Box(AABB::from_center_size(world_center, size))
            }
            Self::Sphere { radius } => {
                WorldShape::Sphere(Sphere::new(world_center, radius * transform.max_scale()))
            }
        }
    }
}

/// A collider shape resolved to world space for one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldShape {
    Box(AABB),
    Sphere(Sphere),
}

impl WorldShape {
    pub fn contains_point(&self, point: Vec3) -> bool {
        match self {
            Self::Box(aabb) => aabb.contains_point(point),
            Self::Sphere(sphere) => sphere.contains_point(point),
        }
    }

    /// Ray hit distance and surface normal
    pub fn raycast(&self, ray: &Ray) -> Option<(f32, Vec3)> {
        match self {
            Self::Box(aabb) => ray_aabb_with_normal(ray, aabb),
            Self::Sphere(sphere) => ray_sphere_with_normal(ray, sphere),
        }
    }
}

/// Description for creating a collider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColliderDesc {
    /// Collision shape
    pub shape: ColliderShape,
    /// Offset of the shape from the owning transform's position
    pub center: [f32; 3],
    /// Triggers report events but are never resolved
    pub is_trigger: bool,
    /// Position used when the collider has no parent body
    pub position: [f32; 3],
    /// Scale used when the collider has no parent body
    pub scale: [f32; 3],
    /// Opaque host data (usually an entity id)
    pub user_data: u128,
}

impl Default for ColliderDesc {
    fn default() -> Self {
        Self {
            shape: ColliderShape::default(),
            center: [0.0, 0.0, 0.0],
            is_trigger: false,
            position: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
            user_data: 0,
        }
    }
}

impl ColliderDesc {
    /// Create a collider description with a shape
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            ..Default::default()
        }
    }

    /// Box collider from full size
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Self::new(ColliderShape::cuboid(width, height, depth))
    }

    pub fn sphere(radius: f32) -> Self {
        Self::new(ColliderShape::sphere(radius))
    }

    /// Set the local center offset
    pub fn with_center(mut self, x: f32, y: f32, z: f32) -> Self {
        self.center = [x, y, z];
        self
    }

    /// Make this a trigger
    pub fn trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    /// Set the standalone position (ignored when attached to a body)
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = [x, y, z];
        self
    }

    /// Set the standalone scale (ignored when attached to a body)
    pub fn with_scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.scale = [x, y, z];
        self
    }

    pub fn with_user_data(mut self, user_data: u128) -> Self {
        self.user_data = user_data;
        self
    }
}

/// Collider state owned by the world
#[derive(Debug, Clone)]
pub struct Collider {
    pub shape: ColliderShape,
    /// Local center offset
    pub center: Vec3,
    pub is_trigger: bool,
    /// Transform used while unattached
    pub transform: Transform,
    pub user_data: u128,
    parent: Option<RigidBodyHandle>,
}

impl Collider {
    /// Build a collider from its description
    pub fn new(desc: &ColliderDesc, parent: Option<RigidBodyHandle>) -> Result<Self> {
        desc.shape.validate()?;
        Ok(Self {
            shape: desc.shape,
            center: Vec3::from_array(desc.center),
            is_trigger: desc.is_trigger,
            transform: Transform::new(
                Vec3::from_array(desc.position),
                Quat::IDENTITY,
                Vec3::from_array(desc.scale),
            ),
            user_data: desc.user_data,
            parent,
        })
    }

    /// Body this collider follows, if any
    pub fn parent(&self) -> Option<RigidBodyHandle> {
        self.parent
    }

    /// World shape under the given owning transform
    pub fn world_shape(&self, transform: &Transform) -> WorldShape {
        self.shape.world_shape(transform, self.center)
    }

    /// Transform the collider follows: its parent body's, or its own when unattached
    pub(crate) fn owner_transform<'a>(&'a self, bodies: &'a Arena<RigidBody>) -> &'a Transform {
        self.parent
            .and_then(|parent| bodies.get(parent.0))
            .map_or(&self.transform, |body| &body.transform)
    }

    /// World shape resolved against the body arena
    pub(crate) fn resolve_shape(&self, bodies: &Arena<RigidBody>) -> WorldShape {
        self.world_shape(self.owner_transform(bodies))
    }
}
