//! Falling stack example
//!
//! Demonstrates:
//! - A kinematic floor with dynamic boxes dropped on top
//! - Launching a projectile with an impulse
//! - Ground checks with a raycast that skips the caller's own collider
//! - Reading collision events after each frame
//!
//! Run with `RUST_LOG=debug` to see registration logs.

use eoa_physics::prelude::*;

const FRAME_TIME: f32 = 1.0 / 60.0;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut world = PhysicsWorld::new(PhysicsConfig::default())?;

    // Floor
    let floor = world.create_rigid_body(
        RigidBodyDesc::kinematic()
            .with_position(0.0, -0.5, 0.0)
            .with_material(&PhysicsMaterial::stone()),
    )?;
    world.create_collider(ColliderDesc::cuboid(30.0, 1.0, 30.0), Some(floor))?;

    // Stack of crates
    let mut crates = Vec::new();
    for level in 0..4 {
        let entity = 100 + level as u128;
        let body = world.create_rigid_body_for_entity(
            entity,
            RigidBodyDesc::dynamic()
                .with_position(0.0, 1.0 + level as f32 * 1.5, 0.0)
                .with_material(&PhysicsMaterial::wood()),
        )?;
        world.create_collider_for_entity(entity, ColliderDesc::cuboid(1.0, 1.0, 1.0), Some(body))?;
        crates.push(body);
    }

    // Player standing next to the stack
    let player = world.create_rigid_body(
        RigidBodyDesc::dynamic()
            .with_position(4.0, 2.0, 0.0)
            .with_mass(70.0)
            .with_restitution(0.0),
    )?;
    let feet = world.create_collider(ColliderDesc::sphere(0.5), Some(player))?;

    // Projectile aimed at the stack
    let projectile = world.create_rigid_body(
        RigidBodyDesc::dynamic()
            .with_position(-8.0, 1.5, 0.0)
            .with_mass(2.0)
            .with_material(&PhysicsMaterial::rubber()),
    )?;
    world.create_collider(ColliderDesc::sphere(0.25), Some(projectile))?;

    let ground_check = RaycastOptions::default()
        .with_max_distance(0.6)
        .with_triggers(false)
        .exclude(feet);

    for frame in 0..240u32 {
        if frame == 60 {
            world.apply_impulse(projectile, Vec3::new(40.0, 4.0, 0.0))?;
            log::info!("Projectile launched");
        }

        world.step(FRAME_TIME);

        for event in world.collision_started() {
            log::debug!(
                "Contact started: {:?} <-> {:?} (impulse {:.3})",
                event.collider1,
                event.collider2,
                event.contact.map_or(0.0, |c| c.impulse)
            );
        }

        if frame % 30 == 0 {
            let origin = world.body_position(player)?;
            let grounded = world
                .query()
                .raycast(origin, Vec3::NEG_Y, &ground_check)
                .is_some();
            let top = world.body_position(crates[crates.len() - 1])?;
            log::info!(
                "frame {:3}: player grounded = {}, top crate at ({:.2}, {:.2}, {:.2}), {} contacts",
                frame,
                grounded,
                top.x,
                top.y,
                top.z,
                world.contacts().len()
            );
        }
    }

    for (handle, transform) in world.transforms() {
        log::info!("{:?} -> {:?}", handle, transform.position);
    }

    Ok(())
}
