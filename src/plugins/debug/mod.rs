//! Debug tools: explicit setters behind a command message, plus keyboard shortcuts.
//!
//! | Key   | Command                         |
//! |-------|---------------------------------|
//! | Enter | start encounter                 |
//! | F1    | one more active member          |
//! | F2    | one fewer active member         |
//! | F3    | +20% damage                     |
//! | F4    | +20% fire rate                  |
//! | F5    | machine gun                     |
//! | F6    | kill every enemy in play        |
//! | F7    | kill the squad                  |
//! | F8    | retry                           |

use bevy::prelude::*;

use crate::common::health::Health;
use crate::common::messages::{ApplyModifier, RetryEncounter, StartEncounter};
use crate::common::modifiers::{Modifier, ModifierOp, ModifierType};
use crate::plugins::enemies::Enemy;
use crate::plugins::pool::PoolState;
use crate::plugins::squad::formation::Formation;
use crate::plugins::squad::set_active_member_count;
use crate::plugins::units::Unit;

#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub enum DebugCommand {
    SetActiveMemberCount(usize),
    ApplyModifier(Modifier),
    KillEnemies,
    KillSquad,
    Start,
    Retry,
}

pub fn plugin(app: &mut App) {
    app.add_message::<DebugCommand>();
    app.add_systems(Update, (debug_keys, apply_debug_commands).chain());
}

pub fn debug_keys(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    formation: Res<Formation>,
    mut out: MessageWriter<DebugCommand>,
) {
    let Some(keys) = keys else {
        return;
    };
    let active = formation.active_count();
    let pct = |kind| DebugCommand::ApplyModifier(Modifier::new(kind, ModifierOp::Increase, 20.0));

    let bindings = [
        (KeyCode::Enter, DebugCommand::Start),
        (KeyCode::F1, DebugCommand::SetActiveMemberCount(active + 1)),
        (KeyCode::F2, DebugCommand::SetActiveMemberCount(active.saturating_sub(1))),
        (KeyCode::F3, pct(ModifierType::Damage)),
        (KeyCode::F4, pct(ModifierType::FireRate)),
        (
            KeyCode::F5,
            DebugCommand::ApplyModifier(Modifier::new(ModifierType::MachineGun, ModifierOp::Increase, 1.0)),
        ),
        (KeyCode::F6, DebugCommand::KillEnemies),
        (KeyCode::F7, DebugCommand::KillSquad),
        (KeyCode::F8, DebugCommand::Retry),
    ];

    for (key, cmd) in bindings {
        if keys.just_pressed(key) {
            out.write(cmd);
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn apply_debug_commands(
    mut commands: Commands,
    mut cmds: MessageReader<DebugCommand>,
    mut apply: MessageWriter<ApplyModifier>,
    mut start: MessageWriter<StartEncounter>,
    mut retry: MessageWriter<RetryEncounter>,
    mut q_enemies: Query<(&mut Health, &PoolState), (With<Enemy>, Without<Unit>)>,
    mut q_units: Query<&mut Health, (With<Unit>, Without<Enemy>)>,
) {
    for cmd in cmds.read() {
        debug!("Debug command {cmd:?}");
        match *cmd {
            DebugCommand::SetActiveMemberCount(n) => {
                commands.run_system_cached_with(set_active_member_count, n);
            }
            DebugCommand::ApplyModifier(m) => {
                apply.write(ApplyModifier(m));
            }
            DebugCommand::KillEnemies => {
                for (mut hp, state) in &mut q_enemies {
                    if state.is_active() {
                        let max = hp.max;
                        hp.apply_damage(max);
                    }
                }
            }
            DebugCommand::KillSquad => {
                for mut hp in &mut q_units {
                    let max = hp.max;
                    hp.apply_damage(max);
                }
            }
            DebugCommand::Start => {
                start.write(StartEncounter);
            }
            DebugCommand::Retry => {
                retry.write(RetryEncounter);
            }
        }
    }
}
