//! Physics events (collisions, triggers)
//!
//! Contacts found in a step are compared against the pairs that were touching
//! in the previous step. New pairs raise `Started`, vanished pairs raise
//! `Stopped`.

use crate::collider::ColliderHandle;
use crate::contact::CollisionInfo;
use eoa_math::Vec3;

/// Contact data from a collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactData {
    /// Contact point in world space
    pub point: Vec3,
    /// Contact normal (pointing from collider1 to collider2)
    pub normal: Vec3,
    /// Penetration depth
    pub depth: f32,
    /// Normal impulse applied at this contact (zero for triggers)
    pub impulse: f32,
}

impl ContactData {
    pub(crate) fn from_info(info: &CollisionInfo, impulse: f32) -> Self {
        Self {
            point: info.contact_point,
            normal: info.normal,
            depth: info.penetration,
            impulse,
        }
    }
}

/// Type of collision event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionEventType {
    /// Collision started
    Started,
    /// Collision ended
    Stopped,
}

/// A collision event between two colliders
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionEvent {
    /// First collider
    pub collider1: ColliderHandle,
    /// Second collider
    pub collider2: ColliderHandle,
    /// Event type
    pub event_type: CollisionEventType,
    /// Whether either collider is a trigger
    pub is_trigger: bool,
    /// Contact of the step that started the collision (`None` for stop events)
    pub contact: Option<ContactData>,
    /// User data from collider 1
    pub user_data1: u128,
    /// User data from collider 2
    pub user_data2: u128,
}

impl CollisionEvent {
    /// Check if this is a start event
    pub fn is_started(&self) -> bool {
        self.event_type == CollisionEventType::Started
    }

    /// Check if this is a stop event
    pub fn is_stopped(&self) -> bool {
        self.event_type == CollisionEventType::Stopped
    }

    /// Whether the event involves the given collider
    pub fn involves(&self, collider: ColliderHandle) -> bool {
        self.collider1 == collider || self.collider2 == collider
    }
}

/// Handler trait for physics events
pub trait PhysicsEventHandler: Send + Sync {
    /// Called when a collision starts or ends
    fn on_collision(&mut self, event: &CollisionEvent);
}

/// Default event handler that collects events into a buffer
#[derive(Debug, Default)]
pub struct EventCollector {
    /// Collision events since the last clear
    pub collision_events: Vec<CollisionEvent>,
}

impl EventCollector {
    /// Create a new event collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all collected events
    pub fn clear(&mut self) {
        self.collision_events.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.collision_events.is_empty()
    }

    /// Get collision start events
    pub fn started_collisions(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.collision_events.iter().filter(|e| e.is_started())
    }

    /// Get collision end events
    pub fn stopped_collisions(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.collision_events.iter().filter(|e| e.is_stopped())
    }

    /// Get trigger start events
    pub fn trigger_enters(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.collision_events
            .iter()
            .filter(|e| e.is_trigger && e.is_started())
    }

    /// Get trigger end events
    pub fn trigger_exits(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.collision_events
            .iter()
            .filter(|e| e.is_trigger && e.is_stopped())
    }

    /// Forward every collected event to a handler
    pub fn dispatch(&self, handler: &mut dyn PhysicsEventHandler) {
        for event in &self.collision_events {
            handler.on_collision(event);
        }
    }
}

impl PhysicsEventHandler for EventCollector {
    fn on_collision(&mut self, event: &CollisionEvent) {
        self.collision_events.push(event.clone());
    }
}
