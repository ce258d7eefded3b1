//! Spawn consumer: activate projectiles from their pools.
//!
//! The pool grows on demand, so a request is never dropped. Collision filters are taken from the
//! current [`CombatZone`] at allocation time.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::layers::{inert, Layer};
use crate::plugins::pool::{PoolKey, Pools, PARK};
use crate::plugins::units::stats::WeaponProfile;
use crate::plugins::zone::CombatZone;

use super::components::Projectile;
use super::messages::SpawnProjectileRequest;

pub fn allocate_projectiles(
    mut commands: Commands,
    mut pools: ResMut<Pools>,
    zone: Res<CombatZone>,
    mut reader: MessageReader<SpawnProjectileRequest>,
) {
    let layers = zone.projectile_layers();

    for req in reader.read() {
        let key = PoolKey::Projectile(req.profile);
        let acquired = pools.acquire(&mut commands, key, |c| spawn_inactive_projectile(c, req.profile));

        commands.entity(acquired.entity).insert((
            Projectile::fired(req.damage, req.range),
            Transform::from_translation(req.pos.extend(2.0)),
            LinearVelocity(req.vel),
            layers,
        ));
    }
}

/// A complete, parked, inactive projectile of the given profile.
pub fn spawn_inactive_projectile(commands: &mut Commands, profile: WeaponProfile) -> Entity {
    let (color, size) = match profile {
        WeaponProfile::Rifle => (Color::srgb(1.0, 0.85, 0.3), Vec2::new(0.12, 0.4)),
        WeaponProfile::MachineGun => (Color::srgb(1.0, 0.55, 0.2), Vec2::new(0.1, 0.3)),
    };

    commands
        .spawn((
            Name::new(format!("Projectile({profile:?})")),
            Projectile::default(),
            Sprite { color, custom_size: Some(size), ..default() },
            Transform::from_translation(PARK),
            Visibility::Hidden,
            RigidBody::Dynamic,
            Mass(0.1),
            Collider::circle(size.x),
            Sensor,
            inert(CollisionLayers::new(Layer::SquadBullet, [Layer::World])),
            LinearVelocity::ZERO,
            // Keep this always; inactive projectiles won't collide anyway because filters are empty.
            CollisionEventsEnabled,
        ))
        .id()
}
