//! Object pools for every recycled simulation object.
//!
//! # Lifecycle
//! ```text
//!   prewarm / first demand          acquire                 release (idempotent)
//!  ───────────────────────► Inactive ───────► Active ───────────────────────► PendingReturn
//!                              ▲                                                   │
//!                              └──────────── return_to_pool_commit ◄───────────────┘
//!                                            (TickSet::PoolReturn)
//! ```
//!
//! - Pools are partitioned by [`PoolKey`]: an enemy of type 1 is never handed out for type 0,
//!   a machine-gun round never for a rifle round.
//! - Pools grow monotonically. Acquire on an empty free list spawns a new instance; nothing is
//!   ever despawned while the app lives.
//! - `release` only flips `Active -> PendingReturn`. Releasing twice is a no-op.
//! - The commit system is the single writer of the *inactive invariants*
//!   (hidden, parked, zero velocity, empty collision filters) and the only place that pushes onto
//!   a free list, so a free list never holds an active entity.
//! - Kind-specific per-use state (health, timers, tags, latches) is reset by each plugin's
//!   `reset_released_*` system, scheduled in `PoolReturn` before the commit.

use avian2d::prelude::*;
use bevy::platform::collections::HashMap;
use bevy::prelude::*;

use crate::common::layers::inert;
use crate::common::state::{GameState, TickSet};
use crate::plugins::particles::ParticleKind;
use crate::plugins::units::stats::WeaponProfile;

/// Where inactive pooled objects wait.
pub const PARK: Vec3 = Vec3::new(0.0, -10_000.0, 0.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolKey {
    /// Enemy type index into `RunnerConfig::enemy_types`.
    Enemy(usize),
    Projectile(WeaponProfile),
    Particle(ParticleKind),
    Barrel,
    Gate,
}

/// Owning pool of an entity. Written once at instantiation.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pooled(pub PoolKey);

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolState {
    #[default]
    Inactive,
    Active,
    PendingReturn,
}

impl PoolState {
    #[inline]
    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    /// Mark for return. Returns `true` only on the call that changed state.
    #[inline]
    pub fn release(&mut self) -> bool {
        if *self == Self::Active {
            *self = Self::PendingReturn;
            true
        } else {
            false
        }
    }
}

/// Result of [`Pools::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acquired {
    pub entity: Entity,
    /// `true` if the pool had to grow.
    pub fresh: bool,
}

#[derive(Resource, Debug, Default)]
pub struct Pools {
    free: HashMap<PoolKey, Vec<Entity>>,
    instantiated: HashMap<PoolKey, usize>,
}

impl Pools {
    /// Hand out an inactive instance for `key`, growing the pool if none is free.
    ///
    /// `spawn_inactive` must spawn a complete, inactive instance of the kind. The caller writes
    /// the per-use activation state (position, health, velocity, layers) through `commands`.
    pub fn acquire(
        &mut self,
        commands: &mut Commands,
        key: PoolKey,
        spawn_inactive: impl FnOnce(&mut Commands) -> Entity,
    ) -> Acquired {
        if let Some(entity) = self.pop_free(key) {
            commands
                .entity(entity)
                .insert((PoolState::Active, Visibility::Visible));
            return Acquired { entity, fresh: false };
        }

        let entity = spawn_inactive(commands);
        *self.instantiated.entry(key).or_default() += 1;
        commands
            .entity(entity)
            .insert((Pooled(key), PoolState::Active, Visibility::Visible));
        debug!("Pool {key:?} grew to {}", self.instantiated(key));
        Acquired { entity, fresh: true }
    }

    /// Instantiate `count` inactive instances up front.
    pub fn prewarm(
        &mut self,
        commands: &mut Commands,
        key: PoolKey,
        count: usize,
        mut spawn_inactive: impl FnMut(&mut Commands) -> Entity,
    ) {
        let free = self.free.entry(key).or_default();
        free.reserve(count);
        for _ in 0..count {
            let e = spawn_inactive(commands);
            commands
                .entity(e)
                .insert((Pooled(key), PoolState::Inactive, Visibility::Hidden));
            free.push(e);
        }
        *self.instantiated.entry(key).or_default() += count;
    }

    #[inline]
    pub fn pop_free(&mut self, key: PoolKey) -> Option<Entity> {
        self.free.get_mut(&key)?.pop()
    }

    #[inline]
    pub fn push_free(&mut self, key: PoolKey, e: Entity) {
        self.free.entry(key).or_default().push(e);
    }

    pub fn free_count(&self, key: PoolKey) -> usize {
        self.free.get(&key).map_or(0, Vec::len)
    }

    pub fn instantiated(&self, key: PoolKey) -> usize {
        self.instantiated.get(&key).copied().unwrap_or(0)
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<Pools>();

    // Not gated on Playing: teardown releases on exit and still needs a commit.
    app.add_systems(FixedPostUpdate, return_to_pool_commit.in_set(TickSet::PoolReturn));
    app.add_systems(OnExit(GameState::Playing), release_all_active);
}

/// Commit return-to-pool.
///
/// Mutates component values in place; no structural changes, no archetype moves.
pub fn return_to_pool_commit(
    mut pools: ResMut<Pools>,
    mut q: Query<(
        Entity,
        &Pooled,
        &mut PoolState,
        &mut Visibility,
        &mut Transform,
        Option<&mut CollisionLayers>,
        Option<&mut LinearVelocity>,
    )>,
) {
    for (e, pooled, mut state, mut vis, mut tf, layers, vel) in &mut q {
        if *state != PoolState::PendingReturn {
            continue;
        }

        *state = PoolState::Inactive;
        *vis = Visibility::Hidden;
        *tf = Transform::from_translation(PARK);
        if let Some(mut layers) = layers {
            *layers = inert(*layers);
        }
        if let Some(mut vel) = vel {
            vel.0 = Vec2::ZERO;
        }

        pools.push_free(pooled.0, e);
    }
}

/// Teardown: mark every active pooled object for return.
pub fn release_all_active(mut q: Query<&mut PoolState, With<Pooled>>) {
    let mut released = 0usize;
    for mut state in &mut q {
        if state.release() {
            released += 1;
        }
    }
    if released > 0 {
        info!("Released {released} pooled objects");
    }
}
