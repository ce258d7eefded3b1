//! Global state machine and the per-tick ordering contract.

use bevy::prelude::*;

/// Play-state provider: not started / playing / ended.
///
/// Spawning, shooting and auto-movement only run in `Playing`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    #[default]
    NotStarted,
    Playing,
    Ended,
}

/// Fixed ordering inside one simulation tick.
///
/// ```text
/// FixedUpdate:      Sequence -> Movement -> Shoot
/// FixedPostUpdate:  Combat -> Resolve -> Apply -> PoolReturn
/// ```
///
/// `Combat` runs after Avian has written this step's `CollisionStart` messages.
/// A kill resolved in `Resolve` is therefore visible to the wave coordinator
/// before its next spawn decision in the following `Sequence`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickSet {
    /// Cooperative sequences (waves, gates, barrels) and pool allocation.
    Sequence,
    Movement,
    Shoot,
    /// Collision resolution and damage.
    Combat,
    /// Deaths, kills, rewards.
    Resolve,
    /// Modifier application and roster bookkeeping.
    Apply,
    /// Commit released pooled objects back to their free lists.
    PoolReturn,
}
