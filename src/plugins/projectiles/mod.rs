//! Projectiles plugin: message-based producer → consumer spawning on top of the shared pools.
//!
//! # Data flow
//! ```text
//!   FixedUpdate (TickSet::Shoot)
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  (A) Producer: request_squad_shots                                         │
//!│      - reads: unit Transform, Loadout (effective stats), ShotClock         │
//!│      - writes: SpawnProjectileRequest (one per fanned projectile)          │
//!│                                                                            │
//!│  (B) Consumer: allocate_projectiles                                        │
//!│      - reads: SpawnProjectileRequest, CombatZone                           │
//!│      - mutates: Pools (acquire / grow), Projectile, Transform, velocity,   │
//!│                 CollisionLayers                                            │
//!└────────────────────────────────────────────────────────────────────────────┘
//!                │
//!                v
//!   FixedPostUpdate
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  (C) Physics integrates velocity and emits CollisionStart (Avian)          │
//!│                                                                            │
//!│  (D) TickSet::Combat: process_projectile_collisions                        │
//!│      - damages Health on enemies / barrels                                 │
//!│      - PoolState -> PendingReturn                                          │
//!│                                                                            │
//!│  (E) TickSet::Combat: expire_projectiles                                   │
//!│      - consumes range by distance travelled, releases exhausted rounds     │
//!│                                                                            │
//!│  (F) TickSet::PoolReturn: reset_released_projectiles, then the shared      │
//!│      commit writes the inactive invariants and refills the free list       │
//!└────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Producers never borrow `Pools`; the allocator is the single writer for this kind.

pub mod allocator;
pub mod collision;
pub mod components;
pub mod messages;
pub mod request;

use avian2d::collision::narrow_phase::CollisionEventSystems;
use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::state::{GameState, TickSet};
use crate::plugins::pool::{return_to_pool_commit, PoolState};

use components::Projectile;

pub fn plugin(app: &mut App) {
    app.add_message::<messages::SpawnProjectileRequest>();

    app.add_systems(
        FixedUpdate,
        (request::request_squad_shots, allocator::allocate_projectiles)
            .chain()
            .in_set(TickSet::Shoot)
            .run_if(in_state(GameState::Playing)),
    );

    app.add_systems(
        FixedPostUpdate,
        (collision::process_projectile_collisions, expire_projectiles)
            .chain()
            .in_set(TickSet::Combat)
            .after(CollisionEventSystems)
            .run_if(in_state(GameState::Playing)),
    );

    app.add_systems(
        FixedPostUpdate,
        reset_released_projectiles
            .in_set(TickSet::PoolReturn)
            .before(return_to_pool_commit),
    );
}

/// Consume range by distance travelled this step.
pub fn expire_projectiles(
    time: Res<Time<Fixed>>,
    mut q: Query<(&mut Projectile, &mut PoolState, &LinearVelocity)>,
) {
    let dt = time.delta_secs();
    for (mut projectile, mut state, vel) in &mut q {
        if !state.is_active() {
            continue;
        }
        if projectile.travel(vel.0.length() * dt) {
            state.release();
        }
    }
}

pub fn reset_released_projectiles(mut q: Query<(&mut Projectile, &PoolState)>) {
    for (mut projectile, state) in &mut q {
        if *state == PoolState::PendingReturn {
            *projectile = Projectile::default();
        }
    }
}
