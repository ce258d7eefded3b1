//! Feature plugins.

use bevy::prelude::*;

pub mod core;
pub mod physics;
pub mod pool;
pub mod world;

// Squad
pub mod squad;
pub mod units;
pub mod zone;

// Combat
pub mod enemies;
pub mod particles;
pub mod projectiles;

// Sequencing
pub mod barrels;
pub mod gates;
pub mod waves;

pub mod debug;
pub mod encounter;

// Render-only
pub mod camera;
pub mod lighting;

/// Register gameplay plugins that work in headless tests.
pub fn register_gameplay(app: &mut App) {
    core::plugin(app);
    physics::plugin(app);
    pool::plugin(app);
    world::plugin(app);
    squad::plugin(app);
    units::plugin(app);
    zone::plugin(app);
    projectiles::plugin(app);
    enemies::plugin(app);
    particles::plugin(app);
    waves::plugin(app);
    gates::plugin(app);
    barrels::plugin(app);
    encounter::plugin(app);
    debug::plugin(app);
}

/// Register render-only plugins (requires DefaultPlugins / render infra).
pub fn register_render(app: &mut App) {
    lighting::plugin(app);
    camera::plugin(app);
}
