//! Modifier gates: two-choice pickups scrolling toward the squad.
//!
//! ```text
//! Gate (pooled, moving body)
//! ├── GateZone Left   (sensor, modifier label)
//! └── GateZone Right  (sensor, modifier label)
//! ```
//!
//! Lifecycle per activation: `Idle -> Triggered (latched) -> Despawned`.
//! Only the formation leader can trigger a zone, and the latch is set before the modifier
//! is written, so a gate applies at most one modifier no matter how many contacts arrive.
//! The untouched zone stays visible but can no longer trigger.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::layers::{inert, Layer};
use crate::common::messages::ApplyModifier;
use crate::common::modifiers::{Modifier, ModifierOp, ModifierType};
use crate::common::schedule::DelaySchedule;
use crate::common::state::{GameState, TickSet};
use crate::common::tunables::Tunables;
use crate::config::{GateSpawn, RunnerConfig};
use crate::plugins::encounter::LevelProgress;
use crate::plugins::pool::{return_to_pool_commit, PoolKey, PoolState, Pools, PARK};
use crate::plugins::projectiles::collision::process_projectile_collisions;
use crate::plugins::squad::SquadRoster;

const ZONE_DEPTH: f32 = 0.6;

// -----------------------------------------------------------------------------
// Components / resources
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateSide {
    Left,
    Right,
}

impl GateSide {
    fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Gate {
    pub left: Modifier,
    pub right: Modifier,
    /// Set on the first leader contact of this activation.
    pub latched: bool,
}

impl Gate {
    pub fn modifier(&self, side: GateSide) -> Modifier {
        match side {
            GateSide::Left => self.left,
            GateSide::Right => self.right,
        }
    }
}

impl Default for Gate {
    fn default() -> Self {
        let none = Modifier::new(ModifierType::Damage, ModifierOp::Increase, 0.0);
        Self { left: none, right: none, latched: false }
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct GateZone {
    pub side: GateSide,
    /// This zone delivered its modifier; it stays inert until the gate is recycled.
    pub spent: bool,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct GateLabel;

/// Per-level gate sequence.
#[derive(Resource, Debug, Default)]
pub struct GateSchedule(pub DelaySchedule<GateSpawn>);

pub fn plugin(app: &mut App) {
    app.init_resource::<GateSchedule>();

    app.add_systems(OnEnter(GameState::Playing), start_gate_schedule);
    app.add_systems(OnExit(GameState::Playing), cancel_gate_schedule);

    app.add_systems(
        FixedUpdate,
        spawn_scheduled_gates
            .in_set(TickSet::Sequence)
            .run_if(in_state(GameState::Playing)),
    );
    app.add_systems(
        FixedUpdate,
        (sync_gate_zones, despawn_passed_gates)
            .chain()
            .in_set(TickSet::Movement)
            .run_if(in_state(GameState::Playing)),
    );
    app.add_systems(
        FixedPostUpdate,
        trigger_gates
            .in_set(TickSet::Combat)
            .after(process_projectile_collisions)
            .run_if(in_state(GameState::Playing)),
    );
    app.add_systems(
        FixedPostUpdate,
        reset_released_gates
            .in_set(TickSet::PoolReturn)
            .before(return_to_pool_commit),
    );
    app.add_systems(Update, refresh_gate_labels.run_if(in_state(GameState::Playing)));
}

// -----------------------------------------------------------------------------
// Sequence + spawn
// -----------------------------------------------------------------------------

pub fn start_gate_schedule(config: Res<RunnerConfig>, progress: Res<LevelProgress>, mut schedule: ResMut<GateSchedule>) {
    let Some(level) = config.gates_for(progress.level) else {
        debug!("No gates for level {}", progress.level);
        *schedule = GateSchedule::default();
        return;
    };
    schedule.0 = DelaySchedule::new(level.gates.iter().map(|g| (g.spawn_delay, g.clone())));
}

pub fn cancel_gate_schedule(mut schedule: ResMut<GateSchedule>) {
    schedule.0.cancel();
}

#[inline]
fn active_zone_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Gate, [Layer::Squad])
}

fn zone_color(m: &Modifier) -> Color {
    match m.op {
        ModifierOp::Increase => Color::srgba(0.2, 0.8, 0.45, 0.55),
        ModifierOp::Decrease => Color::srgba(0.9, 0.25, 0.25, 0.55),
    }
}

fn spawn_inactive_gate(commands: &mut Commands, zone_width: f32) -> Entity {
    commands
        .spawn((
            Name::new("Gate"),
            Gate::default(),
            Transform::from_translation(PARK),
            Visibility::Hidden,
            RigidBody::Dynamic,
            Mass(1.0),
            LinearVelocity::ZERO,
        ))
        .with_children(|gate| {
            for side in [GateSide::Left, GateSide::Right] {
                gate.spawn((
                    Name::new(format!("GateZone({side:?})")),
                    GateZone { side, spent: false },
                    Sprite::from_color(Color::WHITE, Vec2::new(zone_width, ZONE_DEPTH)),
                    Transform::from_xyz(side.sign() * zone_width * 0.5, 0.0, 0.0),
                    Visibility::Hidden,
                    Collider::rectangle(zone_width, ZONE_DEPTH),
                    Sensor,
                    inert(active_zone_layers()),
                    CollisionEventsEnabled,
                ))
                .with_child((
                    GateLabel,
                    Text2d::new(""),
                    TextFont { font_size: 14.0, ..default() },
                    Transform::from_xyz(0.0, 0.0, 1.0).with_scale(Vec3::splat(0.05)),
                ));
            }
        })
        .id()
}

/// Emit due gates from the schedule, recycling pooled gates.
pub fn spawn_scheduled_gates(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    tunables: Res<Tunables>,
    mut pools: ResMut<Pools>,
    mut schedule: ResMut<GateSchedule>,
) {
    for spawn in schedule.0.tick(time.delta_secs()) {
        let width = tunables.gate_zone_width;
        let acquired = pools.acquire(&mut commands, PoolKey::Gate, |c| spawn_inactive_gate(c, width));

        commands.entity(acquired.entity).insert((
            Gate { left: spawn.left, right: spawn.right, latched: false },
            Transform::from_xyz(0.0, tunables.gate_spawn_y, 0.5),
            LinearVelocity(Vec2::NEG_Y * tunables.gate_speed),
        ));
        info!("Gate spawned: {} | {}", spawn.left.label(), spawn.right.label());
    }
}

// -----------------------------------------------------------------------------
// Movement-phase upkeep
// -----------------------------------------------------------------------------

/// Zone collision + visibility follow the facts: gate active and zone not spent.
pub fn sync_gate_zones(
    q_gates: Query<(&Gate, &PoolState)>,
    mut q_zones: Query<(&GateZone, &ChildOf, &mut CollisionLayers, &mut Visibility, &mut Sprite)>,
) {
    for (zone, child_of, mut layers, mut vis, mut sprite) in &mut q_zones {
        let Ok((gate, state)) = q_gates.get(child_of.parent()) else {
            continue;
        };
        let armed = state.is_active() && !zone.spent;

        let want_layers = if armed && !gate.latched { active_zone_layers() } else { inert(active_zone_layers()) };
        if *layers != want_layers {
            *layers = want_layers;
        }
        let want_vis = if armed { Visibility::Inherited } else { Visibility::Hidden };
        if *vis != want_vis {
            *vis = want_vis;
        }
        let color = zone_color(&gate.modifier(zone.side));
        if sprite.color != color {
            sprite.color = color;
        }
    }
}

pub fn despawn_passed_gates(tunables: Res<Tunables>, mut q: Query<(&Transform, &mut PoolState), With<Gate>>) {
    for (tf, mut state) in &mut q {
        if state.is_active() && tf.translation.y < tunables.despawn_y {
            state.release();
        }
    }
}

// -----------------------------------------------------------------------------
// Trigger
// -----------------------------------------------------------------------------

/// Leader-only, latched before the modifier is written.
pub fn trigger_gates(
    roster: Res<SquadRoster>,
    mut started: MessageReader<CollisionStart>,
    mut apply: MessageWriter<ApplyModifier>,
    mut q_zones: Query<(&mut GateZone, &ChildOf, &mut CollisionLayers)>,
    mut q_gates: Query<(&mut Gate, &PoolState)>,
) {
    let Some(leader) = roster.leader else {
        started.clear();
        return;
    };

    for ev in started.read() {
        let zone_e = if ev.collider1 == leader {
            ev.collider2
        } else if ev.collider2 == leader {
            ev.collider1
        } else {
            continue;
        };

        let Ok((mut zone, child_of, mut layers)) = q_zones.get_mut(zone_e) else {
            continue;
        };
        let Ok((mut gate, state)) = q_gates.get_mut(child_of.parent()) else {
            continue;
        };
        if !state.is_active() || gate.latched || zone.spent {
            continue;
        }

        gate.latched = true;
        zone.spent = true;
        *layers = inert(*layers);

        let m = gate.modifier(zone.side);
        info!("Gate {:?} taken: {}", zone.side, m.label());
        apply.write(ApplyModifier(m));
    }
}

// -----------------------------------------------------------------------------
// Presentation
// -----------------------------------------------------------------------------

pub fn refresh_gate_labels(
    q_gates: Query<(&Gate, &Children), Changed<Gate>>,
    q_zones: Query<(&GateZone, &Children)>,
    mut q_labels: Query<&mut Text2d, With<GateLabel>>,
) {
    for (gate, zones) in &q_gates {
        for (zone, labels) in zones.iter().filter_map(|z| q_zones.get(z).ok()) {
            let text = gate.modifier(zone.side).label();
            for label in labels.iter() {
                if let Ok(mut t) = q_labels.get_mut(label) {
                    t.0.clone_from(&text);
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Pool reset
// -----------------------------------------------------------------------------

pub fn reset_released_gates(
    mut q_gates: Query<(&mut Gate, &PoolState, &Children)>,
    mut q_zones: Query<(&mut GateZone, &mut CollisionLayers, &mut Visibility)>,
) {
    for (mut gate, state, zones) in &mut q_gates {
        if *state != PoolState::PendingReturn {
            continue;
        }
        gate.latched = false;
        for z in zones.iter() {
            if let Ok((mut zone, mut layers, mut vis)) = q_zones.get_mut(z) {
                zone.spent = false;
                *layers = inert(*layers);
                *vis = Visibility::Hidden;
            }
        }
    }
}
