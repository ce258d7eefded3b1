//! World plugin: the runway the squad stands on, its side walls and the zone threshold marker.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;

/// Length of the visible runway, in meters past the squad line.
const RUNWAY_LENGTH: f32 = 60.0;
const TILE: f32 = 2.0;
const WALL_THICKNESS: f32 = 0.5;

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::Playing), (spawn_walls, spawn_floor));
}

pub fn spawn_walls(mut commands: Commands, tunables: Res<Tunables>) {
    let half_w = tunables.stage_half_width();
    let wall_layers = CollisionLayers::new(Layer::World, Layer::SquadBullet);
    let size = Vec2::new(WALL_THICKNESS, RUNWAY_LENGTH);
    let center_y = tunables.squad_line_y + RUNWAY_LENGTH * 0.5 - 4.0;

    for (name, sign) in [("WallLeft", -1.0), ("WallRight", 1.0)] {
        commands.spawn((
            Name::new(name),
            Sprite::from_color(Color::srgb(0.25, 0.27, 0.33), size),
            Transform::from_xyz(sign * (half_w + WALL_THICKNESS * 0.5), center_y, 0.0),
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            wall_layers,
            DespawnOnExit(GameState::Playing),
        ));
    }

    commands.spawn((
        Name::new("ZoneThreshold"),
        Sprite::from_color(Color::srgba(0.9, 0.9, 1.0, 0.15), Vec2::new(0.08, RUNWAY_LENGTH)),
        Transform::from_xyz(tunables.zone_threshold_x, center_y, -0.5),
        DespawnOnExit(GameState::Playing),
    ));
}

/// Checkerboard of solid-color sprites; the project ships no textures.
pub fn spawn_floor(mut commands: Commands, tunables: Res<Tunables>) {
    let cols = (tunables.stage_half_width() / TILE).ceil() as i32;
    let rows = (RUNWAY_LENGTH / TILE) as i32;
    let base_y = tunables.squad_line_y - 4.0;

    (0..rows)
        .flat_map(|y| (-cols..cols).map(move |x| (x, y)))
        .for_each(|(x, y)| {
            let color = if (x + y) % 2 == 0 {
                Color::srgb(0.14, 0.14, 0.16)
            } else {
                Color::srgb(0.12, 0.12, 0.14)
            };
            commands.spawn((
                Sprite::from_color(color, Vec2::splat(TILE)),
                Transform::from_xyz((x as f32 + 0.5) * TILE, base_y + y as f32 * TILE, -1.0),
                DespawnOnExit(GameState::Playing),
            ));
        });
}
