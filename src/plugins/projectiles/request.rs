use bevy::prelude::*;

use crate::common::tunables::Tunables;
use crate::plugins::units::stats::{fan_offsets, Loadout};
use crate::plugins::units::{ShotClock, Unit, UnitLife, AIM};

use super::messages::SpawnProjectileRequest;

/// Producer: every alive unit whose shot clock is due writes one request per fanned projectile.
///
/// This system does not access the pools.
pub fn request_squad_shots(
    time: Res<Time<Fixed>>,
    tunables: Res<Tunables>,
    mut q_units: Query<(&Transform, &UnitLife, &Loadout, &mut ShotClock), With<Unit>>,
    mut writer: MessageWriter<SpawnProjectileRequest>,
) {
    let dt = time.delta_secs();
    let side = AIM.perp();

    for (tf, life, loadout, mut clock) in &mut q_units {
        if *life != UnitLife::Alive {
            continue;
        }

        let stats = loadout.effective();
        if !clock.tick(dt, stats.fire_rate) {
            continue;
        }

        let muzzle = tf.translation.truncate() + AIM * tunables.muzzle_forward;
        for offset in fan_offsets(stats.bullet_count, stats.bullet_spacing) {
            writer.write(SpawnProjectileRequest {
                profile: loadout.profile,
                pos: muzzle + side * offset,
                vel: AIM * tunables.bullet_speed,
                damage: stats.damage,
                range: stats.range,
            });
        }
    }
}
