//! Encounter lifecycle: play state, outcome, retry and level progress.
//!
//! ```text
//! NotStarted ──StartEncounter──► Playing ──LevelComplete──► Ended(Won)   level + 1
//!                                   │    ──SquadWiped────► Ended(Lost)
//!                                   └────RetryEncounter──► Ended ──► Playing (same level)
//! Ended ──StartEncounter / RetryEncounter──► Playing
//! ```
//!
//! Every gameplay plugin tears itself down on `OnExit(Playing)` and rebuilds on
//! `OnEnter(Playing)`, so a retry is simply leaving and re-entering the state.

use bevy::prelude::*;

use crate::common::messages::{LevelComplete, RetryEncounter, SquadWiped, StartEncounter};
use crate::common::state::GameState;

/// Level/progress provider: 1-based level used to index every per-level config list.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: u32,
}

impl Default for LevelProgress {
    fn default() -> Self {
        Self { level: 1 }
    }
}

#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EncounterOutcome {
    #[default]
    Pending,
    Won,
    Lost,
}

/// A retry was requested while playing; re-enter `Playing` once `Ended` is reached.
#[derive(Resource, Debug, Default)]
pub struct RetryPending(pub bool);

pub fn plugin(app: &mut App) {
    app.init_resource::<LevelProgress>()
        .init_resource::<EncounterOutcome>()
        .init_resource::<RetryPending>();

    app.add_systems(OnEnter(GameState::Playing), reset_outcome);
    app.add_systems(
        Update,
        (
            conclude_encounter.run_if(in_state(GameState::Playing)),
            handle_start,
            handle_retry,
            resume_after_retry.run_if(in_state(GameState::Ended)),
        )
            .chain(),
    );
}

pub fn reset_outcome(mut outcome: ResMut<EncounterOutcome>, mut retry: ResMut<RetryPending>) {
    *outcome = EncounterOutcome::Pending;
    retry.0 = false;
}

/// Level won or squad wiped: record the outcome and leave `Playing`.
///
/// A level completed on the same frame as the wipe counts as won.
pub fn conclude_encounter(
    mut won: MessageReader<LevelComplete>,
    mut wiped: MessageReader<SquadWiped>,
    mut outcome: ResMut<EncounterOutcome>,
    mut progress: ResMut<LevelProgress>,
    mut next: ResMut<NextState<GameState>>,
) {
    let level_won = won.read().last().copied();
    let squad_lost = wiped.read().count() > 0;

    if *outcome != EncounterOutcome::Pending {
        return;
    }

    if let Some(LevelComplete { level }) = level_won {
        *outcome = EncounterOutcome::Won;
        progress.level = level.saturating_add(1);
        info!("Encounter won (level {level}); next level {}", progress.level);
        next.set(GameState::Ended);
    } else if squad_lost {
        *outcome = EncounterOutcome::Lost;
        info!("Encounter lost on level {}", progress.level);
        next.set(GameState::Ended);
    }
}

pub fn handle_start(
    mut start: MessageReader<StartEncounter>,
    state: Res<State<GameState>>,
    mut next: ResMut<NextState<GameState>>,
) {
    if start.read().count() == 0 {
        return;
    }
    match state.get() {
        GameState::NotStarted | GameState::Ended => {
            info!("Encounter starting");
            next.set(GameState::Playing);
        }
        GameState::Playing => debug!("StartEncounter ignored: already playing"),
    }
}

pub fn handle_retry(
    mut retry: MessageReader<RetryEncounter>,
    state: Res<State<GameState>>,
    mut pending: ResMut<RetryPending>,
    mut next: ResMut<NextState<GameState>>,
) {
    if retry.read().count() == 0 {
        return;
    }
    match state.get() {
        GameState::Playing => {
            info!("Encounter retry: tearing down");
            pending.0 = true;
            next.set(GameState::Ended);
        }
        GameState::Ended => {
            info!("Encounter retry");
            next.set(GameState::Playing);
        }
        GameState::NotStarted => debug!("RetryEncounter ignored: not started"),
    }
}

pub fn resume_after_retry(mut pending: ResMut<RetryPending>, mut next: ResMut<NextState<GameState>>) {
    if std::mem::take(&mut pending.0) {
        next.set(GameState::Playing);
    }
}
