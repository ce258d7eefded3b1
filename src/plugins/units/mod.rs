//! Squad units: per-member combat actors.
//!
//! Pipeline:
//! - FixedUpdate (`Movement`): follow the formation target with a damped approach
//! - FixedUpdate (`Shoot`): cadence + fan spawning lives in `projectiles::request`
//! - FixedPostUpdate (`Resolve`): `Alive -> Dead` once health hits zero (terminal)
//!
//! Aim is fixed forward (+Y). The strafe blend still compares aim with movement, so a unit
//! sliding sideways reads as strafing.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::health::Health;
use crate::common::layers::{inert, Layer};
use crate::common::state::{GameState, TickSet};
use crate::common::tunables::Tunables;
use crate::plugins::squad::formation::Formation;

pub mod motion;
pub mod stats;

use motion::{smooth_damp, strafe_weight, MoveHysteresis};
use stats::Loadout;

/// Forward aim axis.
pub const AIM: Vec2 = Vec2::Y;

#[derive(Component, Debug, Clone, Copy)]
pub struct Unit;

/// Formation slot of a unit.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct SquadSlot {
    pub index: usize,
    pub offset: Vec2,
    pub leader: bool,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitLife {
    Alive,
    Dead,
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct UnitMotion {
    /// Lateral velocity carried by the damped follow.
    pub velocity: f32,
    pub gait: MoveHysteresis,
    pub strafe_weight: f32,
}

/// Time since the last shot.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ShotClock {
    pub since_last: f32,
}

impl ShotClock {
    /// Advance by `dt`; returns `true` (and restarts) when a shot is due at `fire_rate`.
    pub fn tick(&mut self, dt: f32, fire_rate: f32) -> bool {
        self.since_last += dt;
        if self.since_last >= 1.0 / fire_rate.max(f32::EPSILON) {
            self.since_last = 0.0;
            true
        } else {
            false
        }
    }
}

pub struct UnitSpawn<'a> {
    pub prefab: &'a str,
    pub health: f32,
    pub slot: SquadSlot,
    pub position: Vec2,
    pub loadout: Loadout,
    /// Initial lateral velocity (synced to the leader for late joiners).
    pub velocity: f32,
}

pub fn plugin(app: &mut App) {
    app.add_systems(
        FixedUpdate,
        move_units
            .in_set(TickSet::Movement)
            .after(crate::plugins::squad::apply_squad_movement)
            .run_if(in_state(GameState::Playing)),
    );
    app.add_systems(
        FixedPostUpdate,
        unit_death_trigger
            .in_set(TickSet::Resolve)
            .run_if(in_state(GameState::Playing)),
    );
}

#[inline]
fn unit_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Squad, [Layer::Enemy, Layer::Gate])
}

pub fn spawn_unit(commands: &mut Commands, unit: UnitSpawn) -> Entity {
    commands
        .spawn((
            Name::new(format!("Unit{}({})", unit.slot.index, unit.prefab)),
            Unit,
            unit.slot,
            UnitLife::Alive,
            Health::full(unit.health),
            unit.loadout,
            ShotClock::default(),
            UnitMotion { velocity: unit.velocity, ..default() },
            Sprite {
                color: Color::srgb(0.2, 0.75, 0.9),
                custom_size: Some(Vec2::splat(0.8)),
                ..default()
            },
            Transform::from_translation(unit.position.extend(1.0)),
            Visibility::Visible,
            (
                RigidBody::Kinematic,
                Collider::circle(0.4),
                Sensor,
                unit_layers(),
                CollisionEventsEnabled,
            ),
        ))
        .id()
}

/// Damped follow toward the formation slot.
pub fn move_units(
    time: Res<Time<Fixed>>,
    tunables: Res<Tunables>,
    formation: Res<Formation>,
    mut q: Query<(&SquadSlot, &UnitLife, &Loadout, &mut Transform, &mut UnitMotion), With<Unit>>,
) {
    let dt = time.delta_secs();

    for (slot, life, loadout, mut tf, mut motion) in &mut q {
        if *life != UnitLife::Alive {
            continue;
        }

        let target = formation.member_target(slot.offset, tunables.squad_line_y);

        let mut velocity = motion.velocity;
        tf.translation.x = smooth_damp(
            tf.translation.x,
            target.x,
            &mut velocity,
            tunables.unit_smooth_time,
            tunables.unit_max_speed,
            dt,
        );
        tf.translation.y = target.y;
        motion.velocity = velocity;

        motion.gait.update(
            velocity,
            tunables.move_start_speed,
            tunables.move_stop_speed,
            tunables.move_stop_grace,
            dt,
        );
        motion.strafe_weight = if motion.gait.is_moving() {
            strafe_weight(AIM, Vec2::new(velocity, 0.0))
        } else {
            0.0
        };

        tf.rotation = Quat::from_rotation_z(-loadout.profile.yaw_offset_degrees().to_radians());
    }
}

/// Transition `Alive -> Dead` when health hits zero. Terminal: dead units never move or shoot.
pub fn unit_death_trigger(
    mut q: Query<(&Name, &Health, &mut UnitLife, &mut Visibility, &mut CollisionLayers), With<Unit>>,
) {
    for (name, hp, mut life, mut vis, mut layers) in &mut q {
        if *life != UnitLife::Alive || !hp.is_dead() {
            continue;
        }
        *life = UnitLife::Dead;
        *vis = Visibility::Hidden;
        *layers = inert(*layers);
        info!("{name} is down");
    }
}

#[cfg(test)]
mod tests;
