//! Buffered spawn requests.
//!
//! Producers write intent; the allocator is the single consumer that touches the pools.

use bevy::prelude::*;

use crate::plugins::units::stats::WeaponProfile;

#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct SpawnProjectileRequest {
    /// Pool key: rifle and machine-gun rounds never share instances.
    pub profile: WeaponProfile,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub range: f32,
}
