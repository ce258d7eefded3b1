//! Enemies plugin: pooled attackers that advance on the squad.
//!
//! ---------------------------
//! HOW THIS IS DESIGNED (ECS)
//! ---------------------------
//! 1) FACTS live in components:
//!    - `Health`, `EnemyLifeState`, `EnemyBehaviour` describe gameplay reality.
//!    - `WaveTag` records which wave sequence (epoch) and kill phase spawned the enemy.
//!
//! 2) RULES mutate facts in predictable places:
//!    - projectile collision (elsewhere) lowers `Health`.
//!    - contact and escape checks run in `TickSet::Combat`.
//!    - the death trigger turns `Health == 0` into `Dying` in `TickSet::Resolve`.
//!
//! 3) PRESENTATION is derived from facts:
//!    - hit flash from health drops, death shrink/fade from the `Dying` timer.
//!
//! Every way out of play (shot, contact, escape) writes exactly one [`EnemyDown`], which the wave
//! coordinator counts. Only shots produce score (`EnemyDefeated`).
//!
//! Enemies are pooled per type index: releasing only marks `PendingReturn`; the shared commit
//! parks the entity and `reset_released_enemies` clears the per-use state first.

use avian2d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;
use rand::Rng;

use crate::common::health::Health;
use crate::common::layers::{inert, Layer};
use crate::common::messages::{EnemyDefeated, SquadWiped};
use crate::common::state::{GameState, TickSet};
use crate::common::tunables::Tunables;
use crate::config::{EnemyTypeConfig, RunnerConfig};
use crate::plugins::particles::{ParticleKind, SpawnParticleRequest};
use crate::plugins::pool::{return_to_pool_commit, PoolKey, PoolState, Pools, PARK};
use crate::plugins::units::Unit;

// -----------------------------------------------------------------------------
// Newtypes
// -----------------------------------------------------------------------------

/// Value normalized to [0..1]. Clamped on write so readers never re-check.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct UnitF32(f32);

impl UnitF32 {
    #[inline]
    pub(crate) fn new_clamped(v: f32) -> Self {
        Self(v.clamp(0.0, 1.0))
    }
    #[inline]
    pub(crate) fn get(self) -> f32 {
        self.0
    }
    #[inline]
    pub(crate) fn decay_to_zero(&mut self, rate_per_sec: f32, dt: f32) {
        self.0 = (self.0 - rate_per_sec * dt).max(0.0);
    }
}

// -----------------------------------------------------------------------------
// Components
// -----------------------------------------------------------------------------

/// Per-use stats copied from the enemy type on activation.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Enemy {
    pub kind: usize,
    pub speed: f32,
    pub contact_damage: f32,
}

/// Enemy lifecycle.
///
/// - Alive: normal gameplay.
/// - Dying: short shrink/fade, no collisions.
/// - Dead: terminal until the pool resets it.
#[derive(Component, Debug, Clone, PartialEq)]
pub enum EnemyLifeState {
    Alive,
    Dying { timer: Timer },
    Dead,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyBehaviour {
    Advancing,
    /// Stands still: the squad was wiped.
    Idle,
}

/// Sequence identity of a spawned enemy.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WaveTag {
    pub epoch: u32,
    pub phase: usize,
}

/// Presentation-only hit feedback, always present to avoid structural churn per hit.
#[derive(Component, Debug, Clone, Default)]
pub struct HitFlash {
    last_hp: f32,
    flash: UnitF32,
}

// -----------------------------------------------------------------------------
// Messages
// -----------------------------------------------------------------------------

#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct SpawnEnemyRequest {
    /// Index into `RunnerConfig::enemy_types`.
    pub kind: usize,
    /// `None` spawns on the approach line at a random lateral position.
    pub pos: Option<Vec2>,
    pub tag: WaveTag,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownCause {
    Shot,
    Contact,
    Escaped,
}

/// An enemy left play. Written exactly once per activation.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnemyDown {
    pub entity: Entity,
    pub tag: WaveTag,
    pub cause: DownCause,
}

// -----------------------------------------------------------------------------
// Plugin wiring
// -----------------------------------------------------------------------------

pub fn plugin(app: &mut App) {
    app.add_message::<SpawnEnemyRequest>();
    app.add_message::<EnemyDown>();

    app.add_systems(Startup, prewarm_enemy_pools);

    app.add_systems(
        FixedUpdate,
        allocate_enemies
            .in_set(TickSet::Sequence)
            .after(crate::plugins::waves::tick_wave_coordinator)
            .run_if(in_state(GameState::Playing)),
    );
    app.add_systems(
        FixedUpdate,
        steer_enemies
            .in_set(TickSet::Movement)
            .run_if(in_state(GameState::Playing)),
    );

    app.add_systems(
        FixedPostUpdate,
        (enemy_contacts, enemy_escapes)
            .chain()
            .in_set(TickSet::Combat)
            .after(crate::plugins::projectiles::collision::process_projectile_collisions)
            .run_if(in_state(GameState::Playing)),
    );
    app.add_systems(
        FixedPostUpdate,
        (enemy_death_trigger, enemy_death_progress, hit_flash_update, idle_enemies_on_wipe)
            .chain()
            .in_set(TickSet::Resolve)
            .run_if(in_state(GameState::Playing)),
    );
    app.add_systems(
        FixedPostUpdate,
        reset_released_enemies
            .in_set(TickSet::PoolReturn)
            .before(return_to_pool_commit),
    );
}

// -----------------------------------------------------------------------------
// Spawn
// -----------------------------------------------------------------------------

#[inline]
fn active_enemy_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Enemy, [Layer::Squad, Layer::SquadBullet])
}

fn enemy_color(kind: usize) -> Color {
    const PALETTE: [Color; 3] = [
        Color::srgb(0.9, 0.25, 0.25),
        Color::srgb(0.7, 0.2, 0.55),
        Color::srgb(0.95, 0.5, 0.2),
    ];
    PALETTE[kind % PALETTE.len()]
}

/// A complete, parked, inactive enemy of the given type.
pub fn spawn_inactive_enemy(commands: &mut Commands, kind: usize, cfg: &EnemyTypeConfig) -> Entity {
    commands
        .spawn((
            Name::new(format!("Enemy({})", cfg.name)),
            Enemy { kind, speed: cfg.speed, contact_damage: cfg.contact_damage },
            Health::full(cfg.health),
            EnemyLifeState::Alive,
            EnemyBehaviour::Advancing,
            WaveTag::default(),
            HitFlash::default(),
            Sprite {
                color: enemy_color(kind),
                custom_size: Some(Vec2::splat(cfg.radius * 2.0)),
                ..default()
            },
            Transform::from_translation(PARK),
            Visibility::Hidden,
            (
                RigidBody::Dynamic,
                Mass(1.0),
                Collider::circle(cfg.radius),
                Sensor,
                inert(active_enemy_layers()),
                LinearVelocity::ZERO,
                CollisionEventsEnabled,
            ),
        ))
        .id()
}

pub fn prewarm_enemy_pools(mut commands: Commands, mut pools: ResMut<Pools>, config: Res<RunnerConfig>, tunables: Res<Tunables>) {
    for (kind, cfg) in config.enemy_types.iter().enumerate() {
        pools.prewarm(&mut commands, PoolKey::Enemy(kind), tunables.enemy_prewarm, |c| {
            spawn_inactive_enemy(c, kind, cfg)
        });
    }
}

/// Consumer of spawn orders: activate (or grow) the type's pool and write per-use state.
pub fn allocate_enemies(
    mut commands: Commands,
    mut pools: ResMut<Pools>,
    config: Res<RunnerConfig>,
    tunables: Res<Tunables>,
    mut reader: MessageReader<SpawnEnemyRequest>,
) {
    let mut rng = rand::thread_rng();
    let half = tunables.stage_half_width();

    for req in reader.read() {
        let Some(cfg) = config.enemy_types.get(req.kind) else {
            warn!("Spawn order for unknown enemy type {}; skipped", req.kind);
            continue;
        };

        let pos = req
            .pos
            .unwrap_or_else(|| Vec2::new(rng.gen_range(-half..=half), tunables.enemy_spawn_y));

        let acquired = pools.acquire(&mut commands, PoolKey::Enemy(req.kind), |c| {
            spawn_inactive_enemy(c, req.kind, cfg)
        });

        commands.entity(acquired.entity).insert((
            Health::full(cfg.health),
            EnemyLifeState::Alive,
            EnemyBehaviour::Advancing,
            req.tag,
            HitFlash { last_hp: cfg.health.max(1.0), flash: UnitF32::default() },
            Transform::from_translation(pos.extend(1.0)),
            LinearVelocity(Vec2::NEG_Y * cfg.speed),
            active_enemy_layers(),
        ));
    }
}

// -----------------------------------------------------------------------------
// Movement
// -----------------------------------------------------------------------------

/// Velocity follows behaviour: advancing enemies walk toward the squad line, everyone else stands.
pub fn steer_enemies(
    mut q: Query<(&Enemy, &EnemyLifeState, &EnemyBehaviour, &PoolState, &mut LinearVelocity)>,
) {
    for (enemy, life, behaviour, state, mut vel) in &mut q {
        let advancing = state.is_active()
            && *life == EnemyLifeState::Alive
            && *behaviour == EnemyBehaviour::Advancing;
        vel.0 = if advancing { Vec2::NEG_Y * enemy.speed } else { Vec2::ZERO };
    }
}

// -----------------------------------------------------------------------------
// Combat
// -----------------------------------------------------------------------------

/// An alive enemy touching an alive unit deals its contact damage and is consumed.
pub fn enemy_contacts(
    mut started: MessageReader<CollisionStart>,
    mut downs: MessageWriter<EnemyDown>,
    mut q_enemies: Query<(&Enemy, &EnemyLifeState, &WaveTag, &mut PoolState)>,
    mut q_units: Query<&mut Health, (With<Unit>, Without<Enemy>)>,
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    for ev in started.read() {
        let a = ev.body1.unwrap_or(ev.collider1);
        let b = ev.body2.unwrap_or(ev.collider2);

        let (enemy_e, unit_e) = if q_enemies.contains(a) && q_units.contains(b) {
            (a, b)
        } else if q_enemies.contains(b) && q_units.contains(a) {
            (b, a)
        } else {
            continue;
        };

        if !seen.insert(enemy_e) {
            continue;
        }

        let Ok((enemy, life, tag, mut state)) = q_enemies.get_mut(enemy_e) else {
            continue;
        };
        if *life != EnemyLifeState::Alive || !state.is_active() {
            continue;
        }
        let Ok(mut hp) = q_units.get_mut(unit_e) else {
            continue;
        };
        if hp.is_dead() {
            seen.remove(&enemy_e);
            continue;
        }

        hp.apply_damage(enemy.contact_damage);
        state.release();
        downs.write(EnemyDown { entity: enemy_e, tag: *tag, cause: DownCause::Contact });
    }
}

/// Alive enemies past the despawn plane leave play without score.
pub fn enemy_escapes(
    tunables: Res<Tunables>,
    mut downs: MessageWriter<EnemyDown>,
    mut q: Query<(Entity, &Transform, &EnemyLifeState, &WaveTag, &mut PoolState), With<Enemy>>,
) {
    for (e, tf, life, tag, mut state) in &mut q {
        if *life != EnemyLifeState::Alive || !state.is_active() {
            continue;
        }
        if tf.translation.y < tunables.despawn_y {
            state.release();
            downs.write(EnemyDown { entity: e, tag: *tag, cause: DownCause::Escaped });
        }
    }
}

// -----------------------------------------------------------------------------
// Rules: death lifecycle
// -----------------------------------------------------------------------------

/// Transition Alive -> Dying when health hits zero.
///
/// Stops collision interaction immediately, reports the kill, and batches score for the tick.
#[allow(clippy::type_complexity)]
pub fn enemy_death_trigger(
    tunables: Res<Tunables>,
    mut downs: MessageWriter<EnemyDown>,
    mut defeated: MessageWriter<EnemyDefeated>,
    mut particles: MessageWriter<SpawnParticleRequest>,
    mut q: Query<(
        Entity,
        &Health,
        &WaveTag,
        &Transform,
        &PoolState,
        &mut EnemyLifeState,
        &mut CollisionLayers,
        &mut LinearVelocity,
    ), With<Enemy>>,
) {
    let mut shot_down = 0u32;

    for (e, hp, tag, tf, state, mut life, mut layers, mut vel) in &mut q {
        if *life != EnemyLifeState::Alive || !state.is_active() || !hp.is_dead() {
            continue;
        }

        *life = EnemyLifeState::Dying {
            timer: Timer::from_seconds(tunables.enemy_death_secs, TimerMode::Once),
        };
        *layers = inert(*layers);
        vel.0 = Vec2::ZERO;

        shot_down += 1;
        downs.write(EnemyDown { entity: e, tag: *tag, cause: DownCause::Shot });
        particles.write(SpawnParticleRequest {
            kind: ParticleKind::EnemyBurst,
            pos: tf.translation.truncate(),
        });
    }

    if shot_down > 0 {
        defeated.write(EnemyDefeated { count: shot_down });
    }
}

/// Animate Dying and hand the enemy back to its pool once finished.
pub fn enemy_death_progress(
    time: Res<Time<Fixed>>,
    mut q: Query<(&mut EnemyLifeState, &mut PoolState, &mut Sprite, &mut Transform), With<Enemy>>,
) {
    for (mut life, mut state, mut sprite, mut tf) in &mut q {
        let EnemyLifeState::Dying { timer } = &mut *life else {
            continue;
        };

        timer.tick(time.delta());
        let t = timer.fraction();
        tf.scale = Vec3::splat(1.0 - t);
        sprite.color = sprite.color.with_alpha(1.0 - t);

        if timer.is_finished() {
            *life = EnemyLifeState::Dead;
            state.release();
        }
    }
}

/// Derive the hit flash from health drops.
pub fn hit_flash_update(
    time: Res<Time<Fixed>>,
    mut q: Query<(&Enemy, &Health, &EnemyLifeState, &mut HitFlash, &mut Sprite)>,
) {
    let dt = time.delta_secs();

    for (enemy, hp, life, mut fx, mut sprite) in &mut q {
        if *life != EnemyLifeState::Alive {
            continue;
        }
        if hp.current < fx.last_hp {
            fx.flash = UnitF32::new_clamped(1.0);
        }
        fx.last_hp = hp.current;
        fx.flash.decay_to_zero(8.0, dt);

        let base = enemy_color(enemy.kind).to_srgba();
        let f = fx.flash.get() * 0.6;
        sprite.color = Color::srgb(
            (base.red + f).min(1.0),
            (base.green + f).min(1.0),
            (base.blue + f).min(1.0),
        );
    }
}

/// Squad wiped: every enemy still in play stops where it is.
pub fn idle_enemies_on_wipe(mut wiped: MessageReader<SquadWiped>, mut q: Query<&mut EnemyBehaviour>) {
    if wiped.read().count() == 0 {
        return;
    }
    for mut behaviour in &mut q {
        *behaviour = EnemyBehaviour::Idle;
    }
}

// -----------------------------------------------------------------------------
// Pool reset
// -----------------------------------------------------------------------------

/// Clear per-use state on released enemies so a reused instance behaves like a fresh one.
#[allow(clippy::type_complexity)]
pub fn reset_released_enemies(
    mut q: Query<(
        &Enemy,
        &PoolState,
        &mut Health,
        &mut EnemyLifeState,
        &mut EnemyBehaviour,
        &mut WaveTag,
        &mut HitFlash,
        &mut Sprite,
    )>,
) {
    for (enemy, state, mut hp, mut life, mut behaviour, mut tag, mut fx, mut sprite) in &mut q {
        if *state != PoolState::PendingReturn {
            continue;
        }
        hp.reset();
        *life = EnemyLifeState::Alive;
        *behaviour = EnemyBehaviour::Advancing;
        *tag = WaveTag::default();
        *fx = HitFlash { last_hp: hp.max, flash: UnitF32::default() };
        sprite.color = enemy_color(enemy.kind);
    }
}
