//! Shared handle to a physics world
//!
//! Game systems receive a cloned `SharedPhysicsWorld` instead of looking the
//! world up globally. Stepping and registration both take the write lock, so
//! the collider and body sets cannot change while a step is running. Queries
//! take the read lock and may run concurrently with each other.

use crate::body::{RigidBodyDesc, RigidBodyHandle};
use crate::collider::{ColliderDesc, ColliderHandle};
use crate::config::PhysicsConfig;
use crate::error::Result;
use crate::query::RaycastHit;
use crate::world::PhysicsWorld;
use eoa_math::Vec3;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Reference-counted, lock-protected physics world
#[derive(Clone)]
pub struct SharedPhysicsWorld {
    inner: Arc<RwLock<PhysicsWorld>>,
}

impl SharedPhysicsWorld {
    /// Create a world from a configuration
    pub fn new(config: PhysicsConfig) -> Result<Self> {
        Ok(Self::from_world(PhysicsWorld::new(config)?))
    }

    /// Wrap an existing world
    pub fn from_world(world: PhysicsWorld) -> Self {
        Self {
            inner: Arc::new(RwLock::new(world)),
        }
    }

    /// Shared access for queries
    pub fn read(&self) -> RwLockReadGuard<'_, PhysicsWorld> {
        self.inner.read()
    }

    /// Exclusive access for stepping and registration
    pub fn write(&self) -> RwLockWriteGuard<'_, PhysicsWorld> {
        self.inner.write()
    }

    /// Step the world; see [`PhysicsWorld::step`]
    pub fn step(&self, delta_time: f32) -> u32 {
        self.inner.write().step(delta_time)
    }

    /// Register a rigid body
    pub fn add_body(&self, desc: RigidBodyDesc) -> Result<RigidBodyHandle> {
        self.inner.write().create_rigid_body(desc)
    }

    /// Register a collider
    pub fn add_collider(
        &self,
        desc: ColliderDesc,
        parent: Option<RigidBodyHandle>,
    ) -> Result<ColliderHandle> {
        self.inner.write().create_collider(desc, parent)
    }

    /// Raycast under the read lock
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        self.inner.read().raycast(origin, direction, max_distance)
    }
}

impl Default for SharedPhysicsWorld {
    fn default() -> Self {
        Self::from_world(PhysicsWorld::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_shared_world_across_threads() {
        let world = SharedPhysicsWorld::default();
        let body = world
            .add_body(RigidBodyDesc::dynamic().with_position(0.0, 10.0, 0.0))
            .unwrap();
        world.add_collider(ColliderDesc::sphere(0.5), Some(body)).unwrap();

        let stepper = {
            let world = world.clone();
            thread::spawn(move || {
                for _ in 0..30 {
                    world.step(1.0 / 60.0);
                }
            })
        };
        stepper.join().unwrap();

        let y = world.read().body_position(body).unwrap().y;
        assert!(y < 10.0);

        let hit = world.raycast(Vec3::new(0.0, 20.0, 0.0), Vec3::NEG_Y, 100.0);
        assert!(hit.is_some());
    }
}
