//! Collision layers.
//!
//! Every gameplay collider is a sensor: layers decide who *reports* a contact,
//! never who pushes whom.

use avian2d::prelude::*;

#[derive(PhysicsLayer, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    #[default]
    Default,
    World,
    Squad,
    Enemy,
    SquadBullet,
    Gate,
    Barrel,
}

/// Keep membership, collide with nothing.
///
/// Used for pooled objects sitting on a free list and for inert gate zones.
#[inline]
pub fn inert(layers: CollisionLayers) -> CollisionLayers {
    CollisionLayers::new(layers.memberships, LayerMask::NONE)
}
