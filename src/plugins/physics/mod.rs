use avian2d::prelude::*;
use bevy::prelude::*;

/// Gameplay runs in meters with every collider a sensor, so Avian keeps its default length unit.
pub fn plugin(app: &mut App) {
    app.add_plugins(PhysicsPlugins::default());
    app.insert_resource(Gravity(Vec2::ZERO));
}
