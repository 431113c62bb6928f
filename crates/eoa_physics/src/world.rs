//! Physics world - main simulation container
//!
//! One fixed step runs `integrate -> broad phase -> narrow phase -> resolve`.
//! Integration and the narrow phase fan out on the rayon pool and join
//! before the next phase starts. Resolution is sequential because contacts
//! sharing a body mutate the same state.

use crate::arena::Arena;
use crate::body::{RigidBody, RigidBodyDesc, RigidBodyHandle};
use crate::collider::{Collider, ColliderDesc, ColliderHandle, WorldShape};
use crate::config::PhysicsConfig;
use crate::contact::CollisionInfo;
use crate::detection::{all_pairs, detect_pairs, ColliderProxy};
use crate::error::{PhysicsError, Result};
use crate::events::{CollisionEvent, CollisionEventType, ContactData, EventCollector};
use crate::query::{PhysicsQuery, RaycastHit, RaycastOptions};
use crate::resolver::resolve_pair;
use eoa_math::{Quat, Transform, Vec3};
use rayon::prelude::*;
use std::collections::HashMap;

/// Phase of the fixed step currently executing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum StepPhase {
    /// No step in progress
    #[default]
    Idle,
    Integrating,
    BroadPhase,
    NarrowPhase,
    Resolving,
}

impl StepPhase {
    fn next(self) -> Self {
        match self {
            Self::Idle => Self::Integrating,
            Self::Integrating => Self::BroadPhase,
            Self::BroadPhase => Self::NarrowPhase,
            Self::NarrowPhase => Self::Resolving,
            Self::Resolving => Self::Idle,
        }
    }
}

/// Pair of colliders touching at the end of the last step
#[derive(Debug, Clone, Copy)]
struct ActivePair {
    is_trigger: bool,
    user_data: (u128, u128),
}

/// The main physics world containing all simulation state
pub struct PhysicsWorld {
    /// Configuration
    config: PhysicsConfig,

    /// Gravity
    gravity: Vec3,

    /// Rigid body storage
    bodies: Arena<RigidBody>,

    /// Collider storage
    colliders: Arena<Collider>,

    /// Contacts found by the last fixed step
    contacts: Vec<CollisionInfo>,

    /// Pairs in contact after the last fixed step, keyed in handle order
    active_pairs: HashMap<(ColliderHandle, ColliderHandle), ActivePair>,

    /// Event collector
    events: EventCollector,

    /// Stop events for pairs dropped by removal, delivered on the next step
    pending_stops: Vec<CollisionEvent>,

    /// Mapping from entity user_data to body handles
    entity_to_body: HashMap<u128, RigidBodyHandle>,

    /// Mapping from entity user_data to collider handles
    entity_to_collider: HashMap<u128, Vec<ColliderHandle>>,

    /// Accumulated time for fixed timestep
    accumulated_time: f32,

    phase: StepPhase,

    /// Fixed steps run since creation
    step_count: u64,
}

impl PhysicsWorld {
    /// Create a new physics world
    pub fn new(config: PhysicsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: PhysicsConfig) -> Self {
        log::debug!(
            "Creating physics world: gravity {:?}, timestep {}, max substeps {}",
            config.gravity,
            config.timestep,
            config.max_substeps
        );

        Self {
            gravity: Vec3::from_array(config.gravity),
            config,
            bodies: Arena::new(),
            colliders: Arena::new(),
            contacts: Vec::new(),
            active_pairs: HashMap::new(),
            events: EventCollector::new(),
            pending_stops: Vec::new(),
            entity_to_body: HashMap::new(),
            entity_to_collider: HashMap::new(),
            accumulated_time: 0.0,
            phase: StepPhase::Idle,
            step_count: 0,
        }
    }

    /// Get configuration
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Set gravity
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
        self.config.gravity = gravity.to_array();
    }

    /// Get gravity
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    // ==================== Rigid Bodies ====================

    /// Create a rigid body
    pub fn create_rigid_body(&mut self, desc: RigidBodyDesc) -> Result<RigidBodyHandle> {
        let body = RigidBody::new(&desc)?;
        let handle = RigidBodyHandle(self.bodies.insert(body));
        log::debug!(
            "Created rigid body {:?} (mass {}, kinematic {})",
            handle,
            desc.mass,
            desc.is_kinematic
        );
        Ok(handle)
    }

    /// Create a rigid body associated with an entity
    pub fn create_rigid_body_for_entity(
        &mut self,
        entity_id: u128,
        mut desc: RigidBodyDesc,
    ) -> Result<RigidBodyHandle> {
        desc.user_data = entity_id;
        let handle = self.create_rigid_body(desc)?;
        self.entity_to_body.insert(entity_id, handle);
        Ok(handle)
    }

    /// Remove a rigid body together with its attached colliders
    pub fn remove_rigid_body(&mut self, handle: RigidBodyHandle) -> Result<RigidBody> {
        let body = self
            .bodies
            .remove(handle.0)
            .ok_or(PhysicsError::BodyNotFound(handle))?;

        let attached: Vec<ColliderHandle> = self
            .colliders
            .iter()
            .filter(|(_, collider)| collider.parent() == Some(handle))
            .map(|(index, _)| ColliderHandle(index))
            .collect();
        for collider in &attached {
            self.detach_collider_state(*collider);
            self.colliders.remove(collider.0);
        }

        // Clean up entity mapping
        self.entity_to_body.retain(|_, h| *h != handle);

        log::debug!(
            "Removed rigid body {:?} and {} attached colliders",
            handle,
            attached.len()
        );
        Ok(body)
    }

    /// Borrow a rigid body
    pub fn body(&self, handle: RigidBodyHandle) -> Result<&RigidBody> {
        self.bodies
            .get(handle.0)
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    /// Mutably borrow a rigid body
    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Result<&mut RigidBody> {
        self.bodies
            .get_mut(handle.0)
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    /// Whether the handle refers to a live body
    pub fn contains_body(&self, handle: RigidBodyHandle) -> bool {
        self.bodies.contains(handle.0)
    }

    /// Get rigid body transform
    pub fn body_transform(&self, handle: RigidBodyHandle) -> Result<Transform> {
        self.body(handle).map(|b| b.transform)
    }

    /// Get rigid body position
    pub fn body_position(&self, handle: RigidBodyHandle) -> Result<Vec3> {
        self.body(handle).map(|b| b.position())
    }

    /// Set rigid body position
    pub fn set_body_position(&mut self, handle: RigidBodyHandle, position: Vec3) -> Result<()> {
        self.body_mut(handle)?.transform.position = position;
        Ok(())
    }

    /// Get rigid body rotation
    pub fn body_rotation(&self, handle: RigidBodyHandle) -> Result<Quat> {
        self.body(handle).map(|b| b.rotation())
    }

    /// Set rigid body rotation (normalized on write)
    pub fn set_body_rotation(&mut self, handle: RigidBodyHandle, rotation: Quat) -> Result<()> {
        self.body_mut(handle)?.transform.rotation = rotation.normalize();
        Ok(())
    }

    /// Get rigid body linear velocity
    pub fn body_linear_velocity(&self, handle: RigidBodyHandle) -> Result<Vec3> {
        self.body(handle).map(|b| b.velocity)
    }

    /// Set rigid body linear velocity
    pub fn set_body_linear_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec3) -> Result<()> {
        self.body_mut(handle)?.velocity = velocity;
        Ok(())
    }

    /// Get rigid body angular velocity
    pub fn body_angular_velocity(&self, handle: RigidBodyHandle) -> Result<Vec3> {
        self.body(handle).map(|b| b.angular_velocity)
    }

    /// Set rigid body angular velocity
    pub fn set_body_angular_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec3) -> Result<()> {
        self.body_mut(handle)?.angular_velocity = velocity;
        Ok(())
    }

    /// Apply force to rigid body (consumed by the next fixed step)
    pub fn apply_force(&mut self, handle: RigidBodyHandle, force: Vec3) -> Result<()> {
        self.body_mut(handle)?.add_force(force);
        Ok(())
    }

    /// Apply torque to rigid body (consumed by the next fixed step)
    pub fn apply_torque(&mut self, handle: RigidBodyHandle, torque: Vec3) -> Result<()> {
        self.body_mut(handle)?.add_torque(torque);
        Ok(())
    }

    /// Apply impulse to rigid body
    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vec3) -> Result<()> {
        self.body_mut(handle)?.add_impulse(impulse);
        Ok(())
    }

    /// Iterate over body transforms, as read by the scene layer after a step
    pub fn transforms(&self) -> impl Iterator<Item = (RigidBodyHandle, &Transform)> {
        self.bodies
            .iter()
            .map(|(index, body)| (RigidBodyHandle(index), &body.transform))
    }

    /// Iterate over all bodies
    pub fn bodies(&self) -> impl Iterator<Item = (RigidBodyHandle, &RigidBody)> {
        self.bodies
            .iter()
            .map(|(index, body)| (RigidBodyHandle(index), body))
    }

    // ==================== Colliders ====================

    /// Create a collider, optionally attached to a rigid body
    pub fn create_collider(
        &mut self,
        desc: ColliderDesc,
        parent: Option<RigidBodyHandle>,
    ) -> Result<ColliderHandle> {
        if let Some(parent) = parent {
            if !self.bodies.contains(parent.0) {
                return Err(PhysicsError::BodyNotFound(parent));
            }
        }

        let collider = Collider::new(&desc, parent)?;
        let handle = ColliderHandle(self.colliders.insert(collider));
        log::debug!(
            "Created collider {:?} ({:?}, parent {:?}, trigger {})",
            handle,
            desc.shape,
            parent,
            desc.is_trigger
        );
        Ok(handle)
    }

    /// Create a collider associated with an entity
    pub fn create_collider_for_entity(
        &mut self,
        entity_id: u128,
        mut desc: ColliderDesc,
        parent: Option<RigidBodyHandle>,
    ) -> Result<ColliderHandle> {
        desc.user_data = entity_id;
        let handle = self.create_collider(desc, parent)?;
        self.entity_to_collider
            .entry(entity_id)
            .or_default()
            .push(handle);
        Ok(handle)
    }

    /// Remove a collider
    pub fn remove_collider(&mut self, handle: ColliderHandle) -> Result<Collider> {
        let collider = self
            .colliders
            .remove(handle.0)
            .ok_or(PhysicsError::ColliderNotFound(handle))?;
        self.detach_collider_state(handle);
        log::debug!("Removed collider {:?}", handle);
        Ok(collider)
    }

    /// Drop bookkeeping that refers to a collider, queueing a stop event
    /// for every pair it was still touching
    fn detach_collider_state(&mut self, handle: ColliderHandle) {
        let pending_stops = &mut self.pending_stops;
        self.active_pairs.retain(|&(collider1, collider2), pair| {
            if collider1 != handle && collider2 != handle {
                return true;
            }
            pending_stops.push(CollisionEvent {
                collider1,
                collider2,
                event_type: CollisionEventType::Stopped,
                is_trigger: pair.is_trigger,
                contact: None,
                user_data1: pair.user_data.0,
                user_data2: pair.user_data.1,
            });
            false
        });
        self.entity_to_collider.retain(|_, handles| {
            handles.retain(|h| *h != handle);
            !handles.is_empty()
        });
    }

    /// Borrow a collider
    pub fn collider(&self, handle: ColliderHandle) -> Result<&Collider> {
        self.colliders
            .get(handle.0)
            .ok_or(PhysicsError::ColliderNotFound(handle))
    }

    /// Mutably borrow a collider
    pub fn collider_mut(&mut self, handle: ColliderHandle) -> Result<&mut Collider> {
        self.colliders
            .get_mut(handle.0)
            .ok_or(PhysicsError::ColliderNotFound(handle))
    }

    /// Set whether collider is a trigger
    pub fn set_collider_trigger(&mut self, handle: ColliderHandle, is_trigger: bool) -> Result<()> {
        self.collider_mut(handle)?.is_trigger = is_trigger;
        Ok(())
    }

    /// Transform the collider follows (its body's, or its own when unattached)
    pub fn collider_transform(&self, handle: ColliderHandle) -> Result<Transform> {
        let collider = self.collider(handle)?;
        Ok(*collider.owner_transform(&self.bodies))
    }

    /// Move a collider. An attached collider moves its parent body.
    pub fn set_collider_position(&mut self, handle: ColliderHandle, position: Vec3) -> Result<()> {
        let collider = self
            .colliders
            .get_mut(handle.0)
            .ok_or(PhysicsError::ColliderNotFound(handle))?;

        match collider.parent().and_then(|p| self.bodies.get_mut(p.0)) {
            Some(body) => body.transform.position = position,
            None => collider.transform.position = position,
        }
        Ok(())
    }

    /// Current world-space shape of a collider
    pub fn collider_shape(&self, handle: ColliderHandle) -> Result<WorldShape> {
        Ok(self.collider(handle)?.resolve_shape(&self.bodies))
    }

    // ==================== Entity Helpers ====================

    /// Get the rigid body handle for an entity
    pub fn body_for_entity(&self, entity_id: u128) -> Option<RigidBodyHandle> {
        self.entity_to_body.get(&entity_id).copied()
    }

    /// Get collider handles for an entity
    pub fn colliders_for_entity(&self, entity_id: u128) -> Option<&[ColliderHandle]> {
        self.entity_to_collider.get(&entity_id).map(Vec::as_slice)
    }

    /// Remove all physics objects for an entity
    pub fn remove_entity(&mut self, entity_id: u128) {
        // Remove colliders first
        if let Some(colliders) = self.entity_to_collider.remove(&entity_id) {
            for handle in colliders {
                if self.colliders.remove(handle.0).is_some() {
                    self.detach_collider_state(handle);
                }
            }
        }

        // Remove body
        if let Some(handle) = self.entity_to_body.remove(&entity_id) {
            // Already gone if the body was removed directly
            let _ = self.remove_rigid_body(handle);
        }
    }

    // ==================== Simulation ====================

    /// Advance the simulation by a frame's worth of time in fixed steps.
    ///
    /// Runs at most `max_substeps` fixed steps; time beyond that is dropped.
    /// Returns the number of fixed steps run.
    pub fn step(&mut self, delta_time: f32) -> u32 {
        self.begin_events();

        if !(delta_time.is_finite() && delta_time >= 0.0) {
            log::warn!("Ignoring invalid frame delta {}", delta_time);
            return 0;
        }

        self.accumulated_time += delta_time;
        let timestep = self.config.timestep;

        let mut steps = 0;
        while self.accumulated_time >= timestep && steps < self.config.max_substeps {
            self.run_fixed_step(timestep);
            self.accumulated_time -= timestep;
            steps += 1;
        }

        if self.accumulated_time >= timestep {
            let remainder = self.accumulated_time % timestep;
            log::warn!(
                "Physics fell behind: dropping {:.4}s after {} substeps",
                self.accumulated_time - remainder,
                steps
            );
            self.accumulated_time = remainder;
        }

        steps
    }

    /// Run exactly one fixed step of `dt` seconds, ignoring the accumulator
    pub fn step_fixed(&mut self, dt: f32) {
        self.begin_events();

        if !(dt.is_finite() && dt > 0.0) {
            log::warn!("Ignoring invalid fixed timestep {}", dt);
            return;
        }

        self.run_fixed_step(dt);
    }

    /// Start a fresh event buffer holding any stops queued by removals
    fn begin_events(&mut self) {
        self.events.clear();
        self.events.collision_events.append(&mut self.pending_stops);
    }

    fn advance_phase(&mut self) {
        self.phase = self.phase.next();
        log::trace!("Step {}: {:?}", self.step_count, self.phase);
    }

    fn run_fixed_step(&mut self, dt: f32) {
        debug_assert_eq!(self.phase, StepPhase::Idle);

        self.advance_phase();
        self.integrate(dt);

        self.advance_phase();
        let proxies = self.collect_proxies();
        let pairs = all_pairs(proxies.len());

        self.advance_phase();
        let contacts = detect_pairs(&proxies, &pairs);

        self.advance_phase();
        let impulses = self.resolve(&contacts);

        self.update_events(&contacts, &impulses);

        log::trace!(
            "Step {}: {} bodies, {} pairs, {} contacts",
            self.step_count,
            self.bodies.len(),
            pairs.len(),
            contacts.len()
        );

        self.contacts = contacts;
        self.step_count += 1;
        self.advance_phase();
    }

    /// Integrate every body in parallel
    fn integrate(&mut self, dt: f32) {
        let gravity = self.gravity;
        self.bodies
            .par_values_mut()
            .for_each(|body| body.integrate(dt, gravity));
    }

    /// Snapshot world shapes in slot order
    fn collect_proxies(&self) -> Vec<ColliderProxy> {
        self.colliders
            .iter()
            .map(|(index, collider)| ColliderProxy {
                handle: ColliderHandle(index),
                shape: collider.resolve_shape(&self.bodies),
                body: collider.parent(),
                is_trigger: collider.is_trigger,
                user_data: collider.user_data,
            })
            .collect()
    }

    /// Resolve each contact once, in collection order. Triggers are skipped.
    fn resolve(&mut self, contacts: &[CollisionInfo]) -> Vec<f32> {
        let mut impulses = Vec::with_capacity(contacts.len());
        for info in contacts {
            let impulse = if self.is_trigger_contact(info) {
                0.0
            } else {
                resolve_pair(info, &self.colliders, &mut self.bodies)
            };
            impulses.push(impulse);
        }
        impulses
    }

    fn is_trigger_contact(&self, info: &CollisionInfo) -> bool {
        [info.collider_a, info.collider_b]
            .iter()
            .any(|h| self.colliders.get(h.0).is_some_and(|c| c.is_trigger))
    }

    fn user_data_of(&self, handle: ColliderHandle) -> u128 {
        self.colliders.get(handle.0).map_or(0, |c| c.user_data)
    }

    /// Diff this step's contacts against the previously active pairs
    fn update_events(&mut self, contacts: &[CollisionInfo], impulses: &[f32]) {
        let mut current = HashMap::with_capacity(contacts.len());

        for (info, impulse) in contacts.iter().zip(impulses) {
            let key = info.pair_key();
            let is_trigger = self.is_trigger_contact(info);
            let user_data1 = self.user_data_of(info.collider_a);
            let user_data2 = self.user_data_of(info.collider_b);

            if !self.active_pairs.contains_key(&key) {
                self.events.collision_events.push(CollisionEvent {
                    collider1: info.collider_a,
                    collider2: info.collider_b,
                    event_type: CollisionEventType::Started,
                    is_trigger,
                    contact: Some(ContactData::from_info(info, *impulse)),
                    user_data1,
                    user_data2,
                });
            }

            let user_data = if key.0 == info.collider_a {
                (user_data1, user_data2)
            } else {
                (user_data2, user_data1)
            };
            current.insert(key, ActivePair { is_trigger, user_data });
        }

        for ((collider1, collider2), pair) in self.active_pairs.drain() {
            if !current.contains_key(&(collider1, collider2)) {
                self.events.collision_events.push(CollisionEvent {
                    collider1,
                    collider2,
                    event_type: CollisionEventType::Stopped,
                    is_trigger: pair.is_trigger,
                    contact: None,
                    user_data1: pair.user_data.0,
                    user_data2: pair.user_data.1,
                });
            }
        }

        self.active_pairs = current;
    }

    // ==================== Queries ====================

    /// Closest hit along a ray strictly within `max_distance`.
    ///
    /// `direction` is normalized first, so `max_distance` and the reported
    /// distance are in world units whatever the direction's length.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        self.query().raycast(
            origin,
            direction,
            &RaycastOptions::default().with_max_distance(max_distance),
        )
    }

    /// Get a query interface for raycasting and point queries
    pub fn query(&self) -> PhysicsQuery<'_> {
        PhysicsQuery {
            bodies: &self.bodies,
            colliders: &self.colliders,
        }
    }

    // ==================== Events ====================

    /// Get collision events from the last `step` or `step_fixed` call
    pub fn collision_events(&self) -> &[CollisionEvent] {
        &self.events.collision_events
    }

    /// Get the event collector
    pub fn events(&self) -> &EventCollector {
        &self.events
    }

    /// Get collision start events
    pub fn collision_started(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.events.started_collisions()
    }

    /// Get collision end events
    pub fn collision_stopped(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.events.stopped_collisions()
    }

    /// Get trigger enter events
    pub fn trigger_enters(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.events.trigger_enters()
    }

    /// Get trigger exit events
    pub fn trigger_exits(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.events.trigger_exits()
    }

    /// Contacts detected by the last fixed step, in unspecified order
    pub fn contacts(&self) -> &[CollisionInfo] {
        &self.contacts
    }

    // ==================== Debug ====================

    /// Get number of rigid bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Get number of colliders
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Get number of non-kinematic bodies
    pub fn active_body_count(&self) -> usize {
        self.bodies
            .iter()
            .filter(|(_, body)| !body.is_kinematic())
            .count()
    }

    /// Fixed steps run since creation
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Time carried over to the next `step` call
    pub fn accumulated_time(&self) -> f32 {
        self.accumulated_time
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::with_valid_config(PhysicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::ColliderShape;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_create_world() {
        let world = PhysicsWorld::new(PhysicsConfig::default()).unwrap();
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.collider_count(), 0);
        assert_eq!(world.phase, StepPhase::Idle);

        let bad = PhysicsConfig::default().with_timestep(-1.0);
        assert!(PhysicsWorld::new(bad).is_err());
    }

    #[test]
    fn test_create_body_and_collider() {
        let mut world = PhysicsWorld::default();

        let body = world
            .create_rigid_body(RigidBodyDesc::dynamic().with_position(0.0, 10.0, 0.0))
            .unwrap();
        let _collider = world
            .create_collider(ColliderDesc::new(ColliderShape::sphere(1.0)), Some(body))
            .unwrap();

        assert_eq!(world.body_count(), 1);
        assert_eq!(world.collider_count(), 1);
    }

    #[test]
    fn test_rejects_invalid_registration() {
        let mut world = PhysicsWorld::default();
        assert!(matches!(
            world.create_rigid_body(RigidBodyDesc::dynamic().with_mass(0.0)),
            Err(PhysicsError::InvalidMass(_))
        ));
        assert!(matches!(
            world.create_collider(ColliderDesc::cuboid(1.0, -1.0, 1.0), None),
            Err(PhysicsError::InvalidShape(_))
        ));

        let body = world.create_rigid_body(RigidBodyDesc::dynamic()).unwrap();
        world.remove_rigid_body(body).unwrap();
        assert!(matches!(
            world.create_collider(ColliderDesc::sphere(1.0), Some(body)),
            Err(PhysicsError::BodyNotFound(_))
        ));
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.collider_count(), 0);
    }

    #[test]
    fn test_gravity_fall() {
        let mut world = PhysicsWorld::default();

        let body = world
            .create_rigid_body(RigidBodyDesc::dynamic().with_position(0.0, 10.0, 0.0))
            .unwrap();
        world
            .create_collider(ColliderDesc::new(ColliderShape::sphere(1.0)), Some(body))
            .unwrap();

        let initial_y = world.body_position(body).unwrap().y;

        // Step simulation
        for _ in 0..60 {
            world.step(DT);
        }

        let final_y = world.body_position(body).unwrap().y;
        assert!(final_y < initial_y, "Body should fall due to gravity");
    }

    #[test]
    fn test_step_accumulator_and_substep_cap() {
        let mut world = PhysicsWorld::default();

        assert_eq!(world.step(DT * 0.5), 0);
        assert_eq!(world.step(DT * 0.6), 1);
        assert_eq!(world.step_count(), 1);

        // A long frame is capped and the excess dropped
        assert_eq!(world.step(1.0), 4);
        assert!(world.accumulated_time() < world.config().timestep);

        assert_eq!(world.step(f32::NAN), 0);
    }

    #[test]
    fn test_stale_handle_after_removal() {
        let mut world = PhysicsWorld::default();
        let first = world.create_rigid_body(RigidBodyDesc::dynamic()).unwrap();
        world.remove_rigid_body(first).unwrap();

        let second = world.create_rigid_body(RigidBodyDesc::dynamic()).unwrap();
        assert_eq!(first.raw().slot(), second.raw().slot());
        assert!(matches!(world.body(first), Err(PhysicsError::BodyNotFound(_))));
        assert!(world.body(second).is_ok());
        assert!(world.remove_rigid_body(first).is_err());
    }

    #[test]
    fn test_remove_body_removes_attached_colliders() {
        let mut world = PhysicsWorld::default();
        let body = world.create_rigid_body(RigidBodyDesc::dynamic()).unwrap();
        let a = world.create_collider(ColliderDesc::sphere(0.5), Some(body)).unwrap();
        let b = world.create_collider(ColliderDesc::cuboid(1.0, 1.0, 1.0), Some(body)).unwrap();
        let free = world.create_collider(ColliderDesc::sphere(1.0), None).unwrap();

        world.remove_rigid_body(body).unwrap();

        assert!(world.collider(a).is_err());
        assert!(world.collider(b).is_err());
        assert!(world.collider(free).is_ok());
        assert_eq!(world.collider_count(), 1);
    }

    #[test]
    fn test_entity_mapping() {
        let mut world = PhysicsWorld::default();
        let entity = 42u128;
        let body = world
            .create_rigid_body_for_entity(entity, RigidBodyDesc::dynamic())
            .unwrap();
        let collider = world
            .create_collider_for_entity(entity, ColliderDesc::sphere(1.0), Some(body))
            .unwrap();

        assert_eq!(world.body_for_entity(entity), Some(body));
        assert_eq!(world.colliders_for_entity(entity), Some(&[collider][..]));
        assert_eq!(world.body(body).unwrap().user_data, entity);
        assert_eq!(world.collider(collider).unwrap().user_data, entity);

        world.remove_entity(entity);
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.collider_count(), 0);
        assert!(world.body_for_entity(entity).is_none());
        assert!(world.colliders_for_entity(entity).is_none());
    }

    #[test]
    fn test_collider_follows_parent_body() {
        let mut world = PhysicsWorld::default();
        let body = world
            .create_rigid_body(RigidBodyDesc::dynamic().with_position(1.0, 2.0, 3.0))
            .unwrap();
        let collider = world
            .create_collider(ColliderDesc::sphere(1.0).with_position(9.0, 9.0, 9.0), Some(body))
            .unwrap();

        assert_eq!(
            world.collider_transform(collider).unwrap().position,
            Vec3::new(1.0, 2.0, 3.0)
        );

        world.set_collider_position(collider, Vec3::new(0.0, 5.0, 0.0)).unwrap();
        assert_eq!(world.body_position(body).unwrap(), Vec3::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn test_raycast_empty_world() {
        let world = PhysicsWorld::default();
        assert!(world.raycast(Vec3::ZERO, Vec3::NEG_Y, 100.0).is_none());
    }

    #[test]
    fn test_raycast_closest_hit_and_max_distance() {
        let mut world = PhysicsWorld::default();
        let near = world
            .create_collider(ColliderDesc::cuboid(1.0, 1.0, 1.0), None)
            .unwrap();
        world
            .create_collider(ColliderDesc::sphere(1.0).with_position(0.0, 0.0, 5.0), None)
            .unwrap();

        let hit = world
            .raycast(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 3.0), 100.0)
            .unwrap();
        assert_eq!(hit.collider, near);
        assert_relative_eq!(hit.distance, 4.5, epsilon = 1e-5);
        assert_relative_eq!(hit.point.z, -0.5, epsilon = 1e-5);
        assert_eq!(hit.normal, Vec3::NEG_Z);

        // Strictly less than the maximum distance
        assert!(world.raycast(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, 4.5).is_none());
        assert!(world.raycast(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO, 100.0).is_none());
    }

    #[test]
    fn test_raycast_distance_is_in_world_units() {
        let mut world = PhysicsWorld::default();
        world
            .create_collider(ColliderDesc::cuboid(1.0, 1.0, 1.0), None)
            .unwrap();

        let origin = Vec3::new(0.0, 0.0, -5.0);
        let long_direction = Vec3::new(0.0, 0.0, 3.0);

        let hit = world.raycast(origin, long_direction, 5.0).unwrap();
        assert_relative_eq!(hit.distance, 4.5, epsilon = 1e-5);

        // 4.5 world units away, not 1.5 direction lengths
        assert!(world.raycast(origin, long_direction, 2.0).is_none());
    }

    #[test]
    fn test_raycast_options() {
        let mut world = PhysicsWorld::default();
        let trigger = world
            .create_collider(ColliderDesc::cuboid(1.0, 1.0, 1.0).trigger(), None)
            .unwrap();
        let solid = world
            .create_collider(ColliderDesc::cuboid(1.0, 1.0, 1.0).with_position(0.0, 0.0, 3.0), None)
            .unwrap();

        let origin = Vec3::new(0.0, 0.0, -5.0);
        let query = world.query();

        let all = query.raycast_all(origin, Vec3::Z, &RaycastOptions::default());
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].collider, trigger);
        assert_eq!(all[1].collider, solid);

        let solid_only = RaycastOptions::default().with_triggers(false);
        assert_eq!(query.raycast(origin, Vec3::Z, &solid_only).unwrap().collider, solid);

        let excluded = RaycastOptions::default().exclude(trigger);
        assert_eq!(query.raycast(origin, Vec3::Z, &excluded).unwrap().collider, solid);

        assert_eq!(query.point_inside(Vec3::new(0.0, 0.0, 3.2)), Some(solid));
        assert!(query.point_inside(Vec3::new(5.0, 5.0, 5.0)).is_none());
    }

    #[test]
    fn test_collision_events_start_and_stop() {
        let config = PhysicsConfig::default().with_gravity(0.0, 0.0, 0.0);
        let mut world = PhysicsWorld::new(config).unwrap();

        let a = world
            .create_rigid_body(RigidBodyDesc::dynamic().with_gravity(false).with_user_data(1))
            .unwrap();
        let b = world
            .create_rigid_body(
                RigidBodyDesc::dynamic()
                    .with_gravity(false)
                    .with_position(0.9, 0.0, 0.0),
            )
            .unwrap();
        let ca = world
            .create_collider(ColliderDesc::cuboid(1.0, 1.0, 1.0).with_user_data(7), Some(a))
            .unwrap();
        let cb = world
            .create_collider(ColliderDesc::cuboid(1.0, 1.0, 1.0), Some(b))
            .unwrap();

        world.step_fixed(DT);
        let started: Vec<_> = world.collision_started().collect();
        assert_eq!(started.len(), 1);
        assert!(started[0].involves(ca) && started[0].involves(cb));
        assert!(!started[0].is_trigger);
        assert!(started[0].contact.is_some());
        assert_eq!(world.contacts().len(), 1);

        // Pull them apart
        world.set_body_position(b, Vec3::new(10.0, 0.0, 0.0)).unwrap();
        world.set_body_linear_velocity(a, Vec3::ZERO).unwrap();
        world.set_body_linear_velocity(b, Vec3::ZERO).unwrap();
        world.step_fixed(DT);

        let stopped: Vec<_> = world.collision_stopped().collect();
        assert_eq!(stopped.len(), 1);
        assert_eq!(stopped[0].contact, None);
        assert!(world.contacts().is_empty());
    }

    #[test]
    fn test_trigger_reports_but_does_not_push() {
        let config = PhysicsConfig::default().with_gravity(0.0, 0.0, 0.0);
        let mut world = PhysicsWorld::new(config).unwrap();

        let body = world
            .create_rigid_body(RigidBodyDesc::dynamic().with_gravity(false))
            .unwrap();
        world.create_collider(ColliderDesc::sphere(0.5), Some(body)).unwrap();
        let zone_body = world.create_rigid_body(RigidBodyDesc::kinematic()).unwrap();
        world
            .create_collider(ColliderDesc::cuboid(4.0, 4.0, 4.0).trigger(), Some(zone_body))
            .unwrap();

        world.step_fixed(DT);

        assert_eq!(world.trigger_enters().count(), 1);
        assert_eq!(world.body_position(body).unwrap(), Vec3::ZERO);
    }

    #[test]
    fn test_removing_touching_collider_reports_stop() {
        let config = PhysicsConfig::default().with_gravity(0.0, 0.0, 0.0);
        let mut world = PhysicsWorld::new(config).unwrap();

        let zone_body = world.create_rigid_body(RigidBodyDesc::kinematic()).unwrap();
        let zone = world
            .create_collider(
                ColliderDesc::cuboid(4.0, 4.0, 4.0).trigger().with_user_data(3),
                Some(zone_body),
            )
            .unwrap();
        let player = world
            .create_rigid_body(RigidBodyDesc::dynamic().with_gravity(false))
            .unwrap();
        let feet = world
            .create_collider(ColliderDesc::sphere(0.5).with_user_data(9), Some(player))
            .unwrap();

        world.step_fixed(DT);
        assert_eq!(world.trigger_enters().count(), 1);

        world.remove_rigid_body(player).unwrap();
        world.step_fixed(DT);

        let exits: Vec<_> = world.trigger_exits().collect();
        assert_eq!(exits.len(), 1);
        assert!(exits[0].involves(zone) && exits[0].involves(feet));
        assert_eq!(exits[0].contact, None);
        let mut user_data = [exits[0].user_data1, exits[0].user_data2];
        user_data.sort();
        assert_eq!(user_data, [3, 9]);

        // Delivered once
        world.step_fixed(DT);
        assert_eq!(world.collision_stopped().count(), 0);
    }

    #[test]
    fn test_removing_collider_reports_stop_on_next_frame() {
        let config = PhysicsConfig::default().with_gravity(0.0, 0.0, 0.0);
        let mut world = PhysicsWorld::new(config).unwrap();

        let a = world
            .create_collider(ColliderDesc::cuboid(1.0, 1.0, 1.0), None)
            .unwrap();
        let b = world
            .create_collider(ColliderDesc::cuboid(1.0, 1.0, 1.0).with_position(0.5, 0.0, 0.0), None)
            .unwrap();

        world.step_fixed(DT);
        assert_eq!(world.collision_started().count(), 1);

        world.remove_collider(b).unwrap();
        // Zero frame delta runs no fixed step but still starts a new event frame
        assert_eq!(world.step(0.0), 0);

        let stopped: Vec<_> = world.collision_stopped().collect();
        assert_eq!(stopped.len(), 1);
        assert!(stopped[0].involves(a) && stopped[0].involves(b));
        assert!(!stopped[0].is_trigger);
    }

    #[test]
    fn test_step_phase_cycle() {
        let mut phase = StepPhase::Idle;
        let mut seen = Vec::new();
        for _ in 0..5 {
            phase = phase.next();
            seen.push(phase);
        }
        assert_eq!(
            seen,
            [
                StepPhase::Integrating,
                StepPhase::BroadPhase,
                StepPhase::NarrowPhase,
                StepPhase::Resolving,
                StepPhase::Idle,
            ]
        );

        let mut world = PhysicsWorld::default();
        world.step_fixed(DT);
        assert_eq!(world.phase, StepPhase::Idle);
        assert_eq!(world.step_count(), 1);
    }
}
