//! Squad plugin: formation, roster, input and squad-wide modifiers.
//!
//! ```text
//!   Update            gather_input ──► SquadInput
//!   FixedUpdate       apply_squad_movement (Movement) ──► Formation.target_x
//!   FixedPostUpdate   sync_roster (Apply) ──► alive count, leader, SquadWiped
//!                     apply_squad_messages (Apply) ──► SquadModifiers, Loadouts, new units
//! ```
//!
//! Facts live in [`Formation`] (slots) and on the unit entities (health, life).
//! The roster is derived from both by re-scanning; it is never patched incrementally.

use bevy::input::mouse::AccumulatedMouseMotion;
use bevy::prelude::*;

use crate::common::messages::{AddMembers, ApplyModifier, SquadWiped};
use crate::common::modifiers::{ModifierOp, ModifierType};
use crate::common::state::{GameState, TickSet};
use crate::common::tunables::Tunables;
use crate::config::{RunnerConfig, SquadComposition};
use crate::plugins::units::stats::Loadout;
use crate::plugins::units::{spawn_unit, SquadSlot, Unit, UnitLife, UnitMotion, UnitSpawn};

pub mod formation;

use formation::Formation;

// -----------------------------------------------------------------------------
// Resources
// -----------------------------------------------------------------------------

/// Derived squad facts, rebuilt every tick by [`sync_roster`].
#[derive(Resource, Debug, Default, Clone)]
pub struct SquadRoster {
    pub alive: usize,
    pub leader: Option<Entity>,
    /// Latched once `SquadWiped` has been written for this encounter.
    pub wiped: bool,
}

/// Persistent squad-wide accumulator; every newly spawned unit starts from it.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct SquadModifiers(pub Loadout);

/// Composition supplied by a scenario; consumed by the next squad spawn.
#[derive(Resource, Debug, Default, Clone)]
pub struct ScenarioOverride(pub Option<SquadComposition>);

/// Player intent sampled in `Update`, consumed per fixed tick.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct SquadInput {
    /// Keyboard axis in [-1, 1].
    pub axis: f32,
    /// Accumulated pointer drag in meters since the last fixed tick.
    pub drag_dx: f32,
}

pub fn plugin(app: &mut App) {
    app.init_resource::<Formation>()
        .init_resource::<SquadRoster>()
        .init_resource::<SquadModifiers>()
        .init_resource::<ScenarioOverride>()
        .init_resource::<SquadInput>();

    app.add_systems(OnEnter(GameState::Playing), spawn_squad);

    app.add_systems(Update, gather_input.run_if(in_state(GameState::Playing)));

    app.add_systems(
        FixedUpdate,
        apply_squad_movement
            .in_set(TickSet::Movement)
            .run_if(in_state(GameState::Playing)),
    );

    app.add_systems(
        FixedPostUpdate,
        (sync_roster, apply_squad_messages)
            .chain()
            .in_set(TickSet::Apply)
            .run_if(in_state(GameState::Playing)),
    );
}

// -----------------------------------------------------------------------------
// Spawn / reconcile
// -----------------------------------------------------------------------------

/// Build the formation from the override (or level defaults) and instantiate its units.
#[allow(clippy::too_many_arguments)]
pub fn spawn_squad(
    mut commands: Commands,
    config: Res<RunnerConfig>,
    tunables: Res<Tunables>,
    mut scenario: ResMut<ScenarioOverride>,
    mut formation: ResMut<Formation>,
    mut roster: ResMut<SquadRoster>,
    mut modifiers: ResMut<SquadModifiers>,
    mut input: ResMut<SquadInput>,
    q_units: Query<Entity, With<Unit>>,
) {
    for e in &q_units {
        commands.entity(e).despawn();
    }

    let composition = scenario.0.take().unwrap_or_else(|| config.squad.clone());
    *formation = Formation::from_composition(&composition, tunables.movement_bounds, 0.0);
    *modifiers = SquadModifiers::default();
    *roster = SquadRoster::default();
    *input = SquadInput::default();

    let spawned = reconcile_units(
        &mut commands,
        &mut formation,
        &config,
        &tunables,
        modifiers.0,
        0.0,
        |_| None,
    );
    info!("Squad spawned with {spawned} units");
}

/// Make the unit entities agree with the formation slots.
///
/// Active slots without a live unit get one; inactive slots lose theirs.
/// `unit_life` reports the life state of an already bound unit. Returns the number spawned.
fn reconcile_units(
    commands: &mut Commands,
    formation: &mut Formation,
    config: &RunnerConfig,
    tunables: &Tunables,
    loadout: Loadout,
    leader_velocity: f32,
    unit_life: impl Fn(Entity) -> Option<UnitLife>,
) -> usize {
    let leader = formation.leader_index();
    let mut spawned = 0;

    for index in 0..formation.members().len() {
        let member = formation.members()[index].clone();

        if !member.active {
            if let Some(e) = member.unit {
                commands.entity(e).despawn();
                formation.bind_unit(index, None);
            }
            continue;
        }

        let alive = member.unit.and_then(&unit_life) == Some(UnitLife::Alive);
        if alive {
            continue;
        }
        if let Some(stale) = member.unit {
            commands.entity(stale).despawn();
        }

        let Some(prefab) = config.unit_prefab(&member.prefab) else {
            warn!("Unknown unit prefab '{}'; slot {index} left empty", member.prefab);
            formation.bind_unit(index, None);
            formation.deactivate(index);
            continue;
        };

        let offset = member.plane_offset();
        let e = spawn_unit(
            commands,
            UnitSpawn {
                prefab: &prefab.id,
                health: prefab.health,
                slot: SquadSlot { index, offset, leader: Some(index) == leader },
                position: formation.member_target(offset, tunables.squad_line_y),
                loadout,
                velocity: leader_velocity,
            },
        );
        formation.bind_unit(index, Some(e));
        spawned += 1;
    }
    spawned
}

// -----------------------------------------------------------------------------
// Input + movement
// -----------------------------------------------------------------------------

pub fn gather_input(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    buttons: Option<Res<ButtonInput<MouseButton>>>,
    motion: Option<Res<AccumulatedMouseMotion>>,
    tunables: Res<Tunables>,
    mut input: ResMut<SquadInput>,
) {
    input.axis = keys.map_or(0.0, |keys| {
        let left = keys.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]);
        let right = keys.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]);
        (right as i8 - left as i8) as f32
    });

    let dragging = buttons.is_some_and(|b| b.pressed(MouseButton::Left));
    if let (true, Some(motion)) = (dragging, motion) {
        input.drag_dx += motion.delta.x * tunables.drag_meters_per_pixel;
    }
}

/// Feed input into the formation and record the observed center.
pub fn apply_squad_movement(
    time: Res<Time<Fixed>>,
    tunables: Res<Tunables>,
    roster: Res<SquadRoster>,
    mut input: ResMut<SquadInput>,
    mut formation: ResMut<Formation>,
    q_units: Query<&Transform, With<Unit>>,
) {
    let delta = input.axis * tunables.squad_speed * time.delta_secs() + input.drag_dx;
    input.drag_dx = 0.0;

    if delta != 0.0 {
        formation.apply_movement(delta);
    }

    if let Some(tf) = roster.leader.and_then(|e| q_units.get(e).ok()) {
        formation.set_center_x(tf.translation.x);
    }
}

// -----------------------------------------------------------------------------
// Roster
// -----------------------------------------------------------------------------

/// Re-scan the units: drop dead members from the formation, re-pick the leader, detect a wipe.
pub fn sync_roster(
    mut formation: ResMut<Formation>,
    mut roster: ResMut<SquadRoster>,
    mut wiped: MessageWriter<SquadWiped>,
    mut q_units: Query<(Entity, &UnitLife, &mut SquadSlot), With<Unit>>,
) {
    let mut alive = 0;
    for (e, life, slot) in &q_units {
        match life {
            UnitLife::Alive => alive += 1,
            UnitLife::Dead => {
                if formation.index_of(e) == Some(slot.index)
                    && formation.member(slot.index).is_some_and(|m| m.active)
                {
                    formation.deactivate(slot.index);
                }
            }
        }
    }

    let leader_index = formation.leader_index();
    let leader = leader_index.and_then(|i| formation.member(i)).and_then(|m| m.unit);
    if leader != roster.leader {
        debug!("Squad leader is now {leader:?}");
    }

    for (e, _, mut slot) in &mut q_units {
        let is_leader = Some(e) == leader;
        if slot.leader != is_leader {
            slot.leader = is_leader;
        }
    }

    roster.alive = alive;
    roster.leader = leader;

    if alive == 0 && !q_units.is_empty() && !roster.wiped {
        roster.wiped = true;
        info!("Squad wiped");
        wiped.write(SquadWiped);
    }
}

// -----------------------------------------------------------------------------
// Modifiers
// -----------------------------------------------------------------------------

/// Apply inbound squad commands: weapon modifiers, member additions and retirements.
#[allow(clippy::too_many_arguments)]
pub fn apply_squad_messages(
    mut commands: Commands,
    config: Res<RunnerConfig>,
    tunables: Res<Tunables>,
    roster: Res<SquadRoster>,
    mut modifiers: ResMut<SquadModifiers>,
    mut formation: ResMut<Formation>,
    mut apply: MessageReader<ApplyModifier>,
    mut add: MessageReader<AddMembers>,
    mut q_units: Query<(&UnitLife, &mut Loadout, &UnitMotion), With<Unit>>,
) {
    if roster.wiped {
        apply.clear();
        add.clear();
        return;
    }

    let mut composition_changed = false;

    for ApplyModifier(m) in apply.read() {
        if m.kind == ModifierType::AddMember {
            let count = m.whole_value() as usize;
            match m.op {
                ModifierOp::Increase => {
                    let prefab = leader_prefab(&formation);
                    formation.add_members(&prefab, count, tunables.add_member_step);
                }
                ModifierOp::Decrease => {
                    let retired = formation.retire(count);
                    debug!("Retired squad slots {retired:?}");
                }
            }
            composition_changed = true;
            continue;
        }

        modifiers.0.apply(m);
        for (life, mut loadout, _) in &mut q_units {
            if *life == UnitLife::Alive {
                loadout.apply(m);
            }
        }
        info!("Squad modifier applied: {}", m.label());
    }

    for msg in add.read() {
        let prefab = leader_prefab(&formation);
        formation.add_members(&prefab, msg.count as usize, msg.step);
        composition_changed = true;
    }

    if !composition_changed {
        return;
    }

    let leader_velocity = roster
        .leader
        .and_then(|e| q_units.get(e).ok())
        .map_or(0.0, |(_, _, motion)| motion.velocity);

    let spawned = reconcile_units(
        &mut commands,
        &mut formation,
        &config,
        &tunables,
        modifiers.0,
        leader_velocity,
        |e| q_units.get(e).ok().map(|(life, _, _)| *life),
    );
    info!("Squad composition changed: {} active, {spawned} spawned", formation.active_count());
}

/// Explicit setter: activate exactly the first `n` slots and reconcile units.
pub fn set_active_member_count(
    In(n): In<usize>,
    mut commands: Commands,
    config: Res<RunnerConfig>,
    tunables: Res<Tunables>,
    modifiers: Res<SquadModifiers>,
    mut formation: ResMut<Formation>,
    q_units: Query<&UnitLife, With<Unit>>,
) {
    formation.set_active_member_count(n.max(1));
    reconcile_units(
        &mut commands,
        &mut formation,
        &config,
        &tunables,
        modifiers.0,
        0.0,
        |e| q_units.get(e).ok().copied(),
    );
}

fn leader_prefab(formation: &Formation) -> String {
    formation
        .leader_index()
        .or_else(|| (!formation.members().is_empty()).then_some(0))
        .and_then(|i| formation.member(i))
        .map(|m| m.prefab.clone())
        .unwrap_or_default()
}
