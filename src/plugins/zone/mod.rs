//! Combat zone: which targets the squad's shots may hit.
//!
//! Derived every tick from the leader's x against `Tunables::zone_threshold_x`. On the barrel
//! side of the threshold only barrels are targetable; on the other side only enemies. The
//! decision is baked into a projectile's collision filters when it is allocated.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::layers::Layer;
use crate::common::state::{GameState, TickSet};
use crate::common::tunables::{LaneSide, Tunables};
use crate::plugins::squad::SquadRoster;

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatZone {
    pub barrels_targetable: bool,
    pub enemies_targetable: bool,
}

impl Default for CombatZone {
    fn default() -> Self {
        Self { barrels_targetable: false, enemies_targetable: true }
    }
}

impl CombatZone {
    pub fn from_leader_x(x: f32, threshold: f32, barrel_side: LaneSide) -> Self {
        let on_barrel_side = match barrel_side {
            LaneSide::Right => x > threshold,
            LaneSide::Left => x < threshold,
        };
        Self { barrels_targetable: on_barrel_side, enemies_targetable: !on_barrel_side }
    }

    /// Filters for a squad projectile fired in this zone.
    pub fn projectile_layers(self) -> CollisionLayers {
        let filters: LayerMask = match (self.enemies_targetable, self.barrels_targetable) {
            (true, true) => [Layer::World, Layer::Enemy, Layer::Barrel].into(),
            (true, false) => [Layer::World, Layer::Enemy].into(),
            (false, true) => [Layer::World, Layer::Barrel].into(),
            (false, false) => Layer::World.into(),
        };
        CollisionLayers::new(Layer::SquadBullet, filters)
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<CombatZone>();
    app.add_systems(
        FixedUpdate,
        update_combat_zone
            .in_set(TickSet::Movement)
            .after(crate::plugins::units::move_units)
            .run_if(in_state(GameState::Playing)),
    );
}

pub fn update_combat_zone(
    tunables: Res<Tunables>,
    roster: Res<SquadRoster>,
    mut zone: ResMut<CombatZone>,
    q_tf: Query<&Transform>,
) {
    let Some(tf) = roster.leader.and_then(|e| q_tf.get(e).ok()) else {
        return;
    };
    let next = CombatZone::from_leader_x(tf.translation.x, tunables.zone_threshold_x, tunables.barrel_side);
    if next != *zone {
        debug!("Combat zone changed: {next:?}");
        *zone = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_splits_on_threshold() {
        let z = CombatZone::from_leader_x(2.0, 1.0, LaneSide::Right);
        assert!(z.barrels_targetable && !z.enemies_targetable);

        let z = CombatZone::from_leader_x(1.0, 1.0, LaneSide::Right);
        assert!(!z.barrels_targetable && z.enemies_targetable);

        let z = CombatZone::from_leader_x(-3.0, 1.0, LaneSide::Left);
        assert!(z.barrels_targetable);
    }

    #[test]
    fn projectile_filters_follow_zone() {
        let layers = CombatZone::default().projectile_layers();
        assert!(layers.memberships.has_all(Layer::SquadBullet));
        assert!(layers.filters.has_all(Layer::Enemy));
        assert!(layers.filters.has_all(Layer::World));
        assert!(!layers.filters.has_all(Layer::Barrel));

        let layers = CombatZone { barrels_targetable: true, enemies_targetable: false }.projectile_layers();
        assert!(layers.filters.has_all(Layer::Barrel));
        assert!(!layers.filters.has_all(Layer::Enemy));
    }
}
