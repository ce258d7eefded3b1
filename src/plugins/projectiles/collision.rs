use avian2d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use crate::common::health::Health;
use crate::common::layers::Layer;
use crate::plugins::pool::PoolState;

use super::components::Projectile;

#[derive(Clone, Copy, Debug)]
struct CollisionTarget {
    collider: Entity,
    body: Option<Entity>,
}

impl CollisionTarget {
    #[inline]
    fn gameplay_owner(self) -> Entity {
        self.body.unwrap_or(self.collider)
    }
}

#[inline]
fn targets(ev: &CollisionStart) -> (CollisionTarget, CollisionTarget) {
    (
        CollisionTarget { collider: ev.collider1, body: ev.body1 },
        CollisionTarget { collider: ev.collider2, body: ev.body2 },
    )
}

#[inline]
fn is_in_layer(layers: &CollisionLayers, layer: Layer) -> bool {
    layers.memberships.has_all(layer)
}

/// Resolve squad projectile contacts.
///
/// - World: absorbed.
/// - Enemy / Barrel: damage the owner's `Health`, then absorbed. Deaths are resolved later by
///   the owning plugin, which reads `Health`.
///
/// A projectile is consumed by its first contact in a tick; later contacts are ignored.
pub fn process_projectile_collisions(
    mut started: MessageReader<CollisionStart>,
    q_is_projectile: Query<(), With<Projectile>>,
    mut q_projectiles: Query<(&Projectile, &mut PoolState)>,
    q_layers: Query<&CollisionLayers>,
    q_target_state: Query<&PoolState, Without<Projectile>>,
    mut q_health: Query<&mut Health>,
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    for ev in started.read() {
        let (t1, t2) = targets(ev);

        let p1 = q_is_projectile.contains(t1.collider);
        let p2 = q_is_projectile.contains(t2.collider);
        if !(p1 ^ p2) {
            continue;
        }
        let (shot, other) = if p1 { (t1, t2) } else { (t2, t1) };

        if !seen.insert(shot.collider) {
            continue;
        }

        let Ok(other_layers) = q_layers.get(other.collider) else {
            continue;
        };
        let Ok((projectile, mut state)) = q_projectiles.get_mut(shot.collider) else {
            continue;
        };
        if !state.is_active() {
            continue;
        }

        if is_in_layer(other_layers, Layer::World) {
            state.release();
            continue;
        }

        if is_in_layer(other_layers, Layer::Enemy) || is_in_layer(other_layers, Layer::Barrel) {
            let owner = other.gameplay_owner();
            // A target released earlier this tick is already on its way back to the pool.
            if q_target_state.get(owner).is_ok_and(|s| !s.is_active()) {
                seen.remove(&shot.collider);
                continue;
            }
            if let Ok(mut hp) = q_health.get_mut(owner) {
                hp.apply_damage(projectile.damage);
            }
            state.release();
        }
    }
}
