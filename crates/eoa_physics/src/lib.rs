//! EoA Physics - Rigid Body Simulation Core
//!
//! Real-time rigid-body physics for the EoA engine: semi-implicit Euler
//! integration, all-pairs broad phase, box and sphere narrow phase, and
//! single-pass impulse resolution.
//!
//! # Features
//!
//! - Dynamic and kinematic rigid bodies with force, torque and impulse input
//! - Axis-aligned box and sphere colliders
//! - Trigger colliders with enter/exit events
//! - Raycasting and point queries
//! - Physics materials (friction, restitution)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                   PhysicsWorld                   │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────┐  │
//! │  │ Body arena   │ │Collider arena│ │ Queries  │  │
//! │  └──────────────┘ └──────────────┘ └──────────┘  │
//! │  ┌─────────────────────────────────────────────┐ │
//! │  │ integrate ─► broad ─► narrow ─► resolve     │ │
//! │  │ (rayon)      (pairs)  (rayon)   (sequential)│ │
//! │  └─────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────┘
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!      ┌──────────┐   ┌──────────┐   ┌──────────┐
//!      │Transforms│   │  Events  │   │ Raycast  │
//!      └──────────┘   └──────────┘   └──────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use eoa_physics::prelude::*;
//!
//! let mut physics = PhysicsWorld::new(PhysicsConfig::default())?;
//!
//! let body = physics.create_rigid_body(RigidBodyDesc::dynamic().with_position(0.0, 10.0, 0.0))?;
//! physics.create_collider(ColliderDesc::cuboid(1.0, 1.0, 1.0), Some(body))?;
//!
//! physics.step(1.0 / 60.0);
//! assert!(physics.body_position(body)?.y < 10.0);
//! # Ok::<(), eoa_physics::PhysicsError>(())
//! ```

pub mod arena;
pub mod body;
pub mod collider;
pub mod config;
pub mod contact;
pub mod detection;
pub mod error;
pub mod events;
pub mod material;
pub mod query;
pub mod resolver;
pub mod shared;
pub mod world;

pub use eoa_math;

pub mod prelude {
    //! Common imports for physics functionality
    pub use crate::body::{RigidBody, RigidBodyDesc, RigidBodyHandle};
    pub use crate::collider::{Collider, ColliderDesc, ColliderHandle, ColliderShape, WorldShape};
    pub use crate::config::PhysicsConfig;
    pub use crate::contact::CollisionInfo;
    pub use crate::error::{PhysicsError, Result};
    pub use crate::events::{
        CollisionEvent, CollisionEventType, ContactData, EventCollector, PhysicsEventHandler,
    };
    pub use crate::material::{CombineRule, PhysicsMaterial};
    pub use crate::query::{PhysicsQuery, RaycastHit, RaycastOptions};
    pub use crate::shared::SharedPhysicsWorld;
    pub use crate::world::PhysicsWorld;
    pub use eoa_math::{Quat, Transform, Vec3};
}

pub use prelude::*;
