//! Physics queries (raycasting, point tests)
//!
//! Queries scan every collider linearly and read the current transforms, so
//! they are valid at any time, not only during a step.

use crate::arena::Arena;
use crate::body::RigidBody;
use crate::collider::{Collider, ColliderHandle};
use eoa_math::{Ray, Vec3};

/// Result of a raycast query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The collider that was hit
    pub collider: ColliderHandle,
    /// Hit point in world space
    pub point: Vec3,
    /// Surface normal at hit point
    pub normal: Vec3,
    /// Distance from ray origin
    pub distance: f32,
    /// User data from the collider
    pub user_data: u128,
}

/// Options for raycast queries
#[derive(Debug, Clone)]
pub struct RaycastOptions {
    /// Hits must be strictly closer than this
    pub max_distance: f32,
    /// Whether trigger colliders can be hit
    pub include_triggers: bool,
    /// Colliders to exclude
    pub exclude: Vec<ColliderHandle>,
}

impl Default for RaycastOptions {
    fn default() -> Self {
        Self {
            max_distance: f32::MAX,
            include_triggers: true,
            exclude: Vec::new(),
        }
    }
}

impl RaycastOptions {
    /// Set maximum distance
    pub fn with_max_distance(mut self, distance: f32) -> Self {
        self.max_distance = distance;
        self
    }

    /// Set whether to hit triggers
    pub fn with_triggers(mut self, include_triggers: bool) -> Self {
        self.include_triggers = include_triggers;
        self
    }

    /// Add a collider to exclude
    pub fn exclude(mut self, collider: ColliderHandle) -> Self {
        self.exclude.push(collider);
        self
    }

    fn accepts(&self, handle: ColliderHandle, collider: &Collider) -> bool {
        (self.include_triggers || !collider.is_trigger) && !self.exclude.contains(&handle)
    }
}

/// Query interface for physics world
pub struct PhysicsQuery<'a> {
    pub(crate) bodies: &'a Arena<RigidBody>,
    pub(crate) colliders: &'a Arena<Collider>,
}

impl<'a> PhysicsQuery<'a> {
    /// Cast a ray and get the closest hit.
    ///
    /// The direction is normalized first, so distances and `max_distance`
    /// are in world units. A zero direction never hits.
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        options: &RaycastOptions,
    ) -> Option<RaycastHit> {
        let ray = self.make_ray(origin, direction)?;

        let mut closest: Option<RaycastHit> = None;
        for hit in self.hits(&ray, options) {
            if closest.map_or(true, |c| hit.distance < c.distance) {
                closest = Some(hit);
            }
        }
        closest
    }

    /// Cast a ray and get all hits, nearest first
    pub fn raycast_all(
        &self,
        origin: Vec3,
        direction: Vec3,
        options: &RaycastOptions,
    ) -> Vec<RaycastHit> {
        let Some(ray) = self.make_ray(origin, direction) else {
            return Vec::new();
        };

        let mut hits: Vec<_> = self.hits(&ray, options).collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// Check if a point is inside any collider
    pub fn point_inside(&self, point: Vec3) -> Option<ColliderHandle> {
        self.colliders.iter().find_map(|(index, collider)| {
            collider
                .resolve_shape(self.bodies)
                .contains_point(point)
                .then_some(ColliderHandle(index))
        })
    }

    /// All colliders containing a point
    pub fn colliders_at_point(&self, point: Vec3) -> Vec<ColliderHandle> {
        self.colliders
            .iter()
            .filter(|(_, collider)| collider.resolve_shape(self.bodies).contains_point(point))
            .map(|(index, _)| ColliderHandle(index))
            .collect()
    }

    fn make_ray(&self, origin: Vec3, direction: Vec3) -> Option<Ray> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || !origin.is_finite() {
            return None;
        }
        Some(Ray::from_raw(origin, direction))
    }

    fn hits<'r>(
        &'r self,
        ray: &'r Ray,
        options: &'r RaycastOptions,
    ) -> impl Iterator<Item = RaycastHit> + 'r {
        let bodies: &'r Arena<RigidBody> = self.bodies;
        let colliders: &'r Arena<Collider> = self.colliders;

        colliders
            .iter()
            .filter(move |(index, collider)| options.accepts(ColliderHandle(*index), collider))
            .filter_map(move |(index, collider)| {
                let (distance, normal) = collider.resolve_shape(bodies).raycast(ray)?;
                (distance < options.max_distance).then(|| RaycastHit {
                    collider: ColliderHandle(index),
                    point: ray.at(distance),
                    normal,
                    distance,
                    user_data: collider.user_data,
                })
            })
    }
}
