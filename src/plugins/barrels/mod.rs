//! Barrels plugin: reward barrels queued in their own lane.
//!
//! ```text
//! Sequence:   barrel waves (pre-delay) -> acquire from pool -> BarrelQueue::push_wave
//! Movement:   BarrelQueue::advance -> transforms; Destroy-policy crossings leave without reward
//! Resolve:    health 0 -> reward (ApplyModifier / AddMembers), remove from queue, release
//! ```
//!
//! The queue is the single source of truth for barrel positions; transforms are copied from it.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::health::Health;
use crate::common::layers::{inert, Layer};
use crate::common::messages::{AddMembers, ApplyModifier};
use crate::common::modifiers::{Modifier, ModifierOp, ModifierType};
use crate::common::schedule::DelaySchedule;
use crate::common::state::{GameState, TickSet};
use crate::common::tunables::{LaneSide, Tunables};
use crate::config::{BarrelWave, RunnerConfig};
use crate::plugins::encounter::LevelProgress;
use crate::plugins::particles::{ParticleKind, SpawnParticleRequest};
use crate::plugins::pool::{return_to_pool_commit, PoolKey, PoolState, Pools, PARK};

pub mod queue;

pub use queue::{BarrelQueue, QueueGeometry, QueueMotion, QueuedBarrel, ThresholdPolicy};

const BARREL_RADIUS: f32 = 0.55;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Barrel {
    pub modifier: Modifier,
}

impl Default for Barrel {
    fn default() -> Self {
        Self { modifier: Modifier::new(ModifierType::Damage, ModifierOp::Increase, 0.0) }
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct BarrelLabel;

/// Barrel sequence and queue for the running encounter.
#[derive(Resource, Debug, Default)]
pub struct BarrelLane {
    pub schedule: DelaySchedule<BarrelWave>,
    pub queue: BarrelQueue<Entity>,
    pub policy: ThresholdPolicy,
}

impl BarrelLane {
    pub fn geometry(&self, tunables: &Tunables) -> QueueGeometry {
        QueueGeometry {
            threshold_y: tunables.barrel_threshold_y,
            spacing: tunables.barrel_spacing,
            speed: tunables.barrel_speed,
            slide_speed: tunables.barrel_slide_speed,
            policy: self.policy,
        }
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<BarrelLane>();

    app.add_systems(OnEnter(GameState::Playing), start_barrel_lane);
    app.add_systems(OnExit(GameState::Playing), clear_barrel_lane);

    app.add_systems(
        FixedUpdate,
        spawn_barrel_waves
            .in_set(TickSet::Sequence)
            .run_if(in_state(GameState::Playing)),
    );
    app.add_systems(
        FixedUpdate,
        move_barrels
            .in_set(TickSet::Movement)
            .run_if(in_state(GameState::Playing)),
    );
    app.add_systems(
        FixedPostUpdate,
        barrel_deaths
            .in_set(TickSet::Resolve)
            .run_if(in_state(GameState::Playing)),
    );
    app.add_systems(
        FixedPostUpdate,
        reset_released_barrels
            .in_set(TickSet::PoolReturn)
            .before(return_to_pool_commit),
    );
    app.add_systems(Update, refresh_barrel_labels.run_if(in_state(GameState::Playing)));
}

#[inline]
fn active_barrel_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Barrel, [Layer::SquadBullet])
}

fn lane_x(tunables: &Tunables) -> f32 {
    match tunables.barrel_side {
        LaneSide::Left => -tunables.barrel_lane_x,
        LaneSide::Right => tunables.barrel_lane_x,
    }
}

// -----------------------------------------------------------------------------
// Lifecycle
// -----------------------------------------------------------------------------

pub fn start_barrel_lane(
    config: Res<RunnerConfig>,
    tunables: Res<Tunables>,
    progress: Res<LevelProgress>,
    mut lane: ResMut<BarrelLane>,
) {
    lane.queue.clear();
    let Some(level) = config.barrels_for(progress.level) else {
        debug!("No barrels for level {}", progress.level);
        lane.schedule = DelaySchedule::default();
        return;
    };
    lane.policy = level.policy.unwrap_or(tunables.barrel_default_policy);
    lane.schedule = DelaySchedule::new(level.waves.iter().map(|w| (w.pre_delay, w.clone())));
}

/// Sequence cancelled, queue forgotten. The pooled barrels themselves go back with the
/// pool teardown.
pub fn clear_barrel_lane(mut lane: ResMut<BarrelLane>) {
    lane.schedule.cancel();
    let dropped = lane.queue.clear();
    if !dropped.is_empty() {
        debug!("Barrel queue cleared ({} barrels)", dropped.len());
    }
}

// -----------------------------------------------------------------------------
// Spawn
// -----------------------------------------------------------------------------

fn spawn_inactive_barrel(commands: &mut Commands) -> Entity {
    commands
        .spawn((
            Name::new("Barrel"),
            Barrel::default(),
            Health::full(1.0),
            Sprite::from_color(Color::srgb(0.75, 0.5, 0.2), Vec2::splat(BARREL_RADIUS * 2.0)),
            Transform::from_translation(PARK),
            Visibility::Hidden,
            RigidBody::Kinematic,
            Collider::circle(BARREL_RADIUS),
            Sensor,
            inert(active_barrel_layers()),
            CollisionEventsEnabled,
        ))
        .with_child((
            BarrelLabel,
            Text2d::new(""),
            TextFont { font_size: 12.0, ..default() },
            Transform::from_xyz(0.0, 0.0, 1.0).with_scale(Vec3::splat(0.05)),
        ))
        .id()
}

pub fn spawn_barrel_waves(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    tunables: Res<Tunables>,
    mut pools: ResMut<Pools>,
    mut lane: ResMut<BarrelLane>,
) {
    let x = lane_x(&tunables);
    let geo = lane.geometry(&tunables);

    for wave in lane.schedule.tick(time.delta_secs()) {
        let entities: Vec<Entity> = wave
            .barrels
            .iter()
            .map(|cfg| {
                let e = pools.acquire(&mut commands, PoolKey::Barrel, spawn_inactive_barrel).entity;
                commands.entity(e).insert((
                    Barrel { modifier: cfg.modifier },
                    Health::full(cfg.health),
                    active_barrel_layers(),
                ));
                e
            })
            .collect();

        let first = lane.queue.len();
        lane.queue.push_wave(entities.iter().copied(), tunables.barrel_spawn_y, &geo);
        for b in &lane.queue.entries()[first..] {
            commands.entity(b.id).insert(Transform::from_xyz(x, b.y, 0.8));
        }
        info!("Barrel wave spawned: {} barrels, queue {}", entities.len(), lane.queue.len());
    }
}

// -----------------------------------------------------------------------------
// Movement
// -----------------------------------------------------------------------------

pub fn move_barrels(
    time: Res<Time<Fixed>>,
    tunables: Res<Tunables>,
    mut lane: ResMut<BarrelLane>,
    mut q: Query<(&mut Transform, &mut PoolState), With<Barrel>>,
) {
    let dt = time.delta_secs();
    let geo = lane.geometry(&tunables);

    for e in lane.queue.advance(dt, &geo) {
        if let Ok((_, mut state)) = q.get_mut(e) {
            state.release();
            debug!("Barrel {e:?} crossed the threshold; no reward");
        }
    }

    let sliding = lane.queue.motion() == QueueMotion::SlidingForward;
    let spin = tunables.barrel_spin_degrees_per_sec.to_radians() * dt;
    let x = lane_x(&tunables);

    for b in lane.queue.entries() {
        let Ok((mut tf, _)) = q.get_mut(b.id) else {
            continue;
        };
        tf.translation.x = x;
        tf.translation.y = b.y;
        if sliding {
            tf.rotate_z(spin);
        } else if tf.rotation != Quat::IDENTITY {
            tf.rotation = Quat::IDENTITY;
        }
    }
}

// -----------------------------------------------------------------------------
// Rewards
// -----------------------------------------------------------------------------

/// Broken barrels pay out their modifier and leave the queue.
pub fn barrel_deaths(
    tunables: Res<Tunables>,
    mut lane: ResMut<BarrelLane>,
    mut apply: MessageWriter<ApplyModifier>,
    mut add: MessageWriter<AddMembers>,
    mut particles: MessageWriter<SpawnParticleRequest>,
    mut q: Query<(Entity, &Barrel, &Health, &Transform, &mut PoolState, &mut CollisionLayers)>,
) {
    for (e, barrel, hp, tf, mut state, mut layers) in &mut q {
        if !state.is_active() || !hp.is_dead() {
            continue;
        }

        let m = barrel.modifier;
        match (m.kind, m.op) {
            (ModifierType::AddMember, ModifierOp::Increase) => {
                add.write(AddMembers { count: m.whole_value(), step: tunables.add_member_step });
            }
            _ => {
                apply.write(ApplyModifier(m));
            }
        }
        info!("Barrel broken: {}", m.label());

        *layers = inert(*layers);
        state.release();
        lane.queue.remove(e);
        particles.write(SpawnParticleRequest { kind: ParticleKind::BarrelBurst, pos: tf.translation.truncate() });
    }
}

// -----------------------------------------------------------------------------
// Presentation + pool reset
// -----------------------------------------------------------------------------

pub fn refresh_barrel_labels(
    q_barrels: Query<(&Barrel, &Children), Changed<Barrel>>,
    mut q_labels: Query<&mut Text2d, With<BarrelLabel>>,
) {
    for (barrel, children) in &q_barrels {
        let text = barrel.modifier.label();
        for child in children.iter() {
            if let Ok(mut t) = q_labels.get_mut(child) {
                t.0.clone_from(&text);
            }
        }
    }
}

pub fn reset_released_barrels(mut q: Query<(&PoolState, &mut Health), With<Barrel>>) {
    for (state, mut hp) in &mut q {
        if *state == PoolState::PendingReturn {
            hp.reset();
        }
    }
}

#[cfg(test)]
mod tests;
