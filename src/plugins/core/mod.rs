//! Core plugin: shared resources, outbound/inbound messages and the tick ordering.

use avian2d::collision::narrow_phase::CollisionEventSystems;
use bevy::prelude::*;

use crate::common::messages::{
    AddMembers, ApplyModifier, EnemyDefeated, LevelComplete, RetryEncounter, SquadWiped, StartEncounter,
    WaveComplete, WaveStarted,
};
use crate::common::state::{GameState, TickSet};
use crate::common::tunables::Tunables;
use crate::config::RunnerConfig;

pub fn plugin(app: &mut App) {
    app.insert_resource(Tunables::default());
    app.insert_resource(RunnerConfig::load_embedded());
    app.insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.07)));

    app.add_message::<WaveStarted>()
        .add_message::<WaveComplete>()
        .add_message::<LevelComplete>()
        .add_message::<SquadWiped>()
        .add_message::<EnemyDefeated>()
        .add_message::<ApplyModifier>()
        .add_message::<AddMembers>()
        .add_message::<StartEncounter>()
        .add_message::<RetryEncounter>();

    configure_tick_sets(app);
}

/// `Sequence -> Movement -> Shoot` in `FixedUpdate`; `Combat -> ... -> PoolReturn` in
/// `FixedPostUpdate` after Avian has written this step's collision messages.
pub fn configure_tick_sets(app: &mut App) {
    let playing = || in_state(GameState::Playing);

    app.configure_sets(
        FixedUpdate,
        (TickSet::Sequence, TickSet::Movement, TickSet::Shoot)
            .chain()
            .run_if(playing()),
    );
    app.configure_sets(
        FixedPostUpdate,
        (TickSet::Combat, TickSet::Resolve, TickSet::Apply)
            .chain()
            .after(CollisionEventSystems)
            .run_if(playing()),
    );
    app.configure_sets(
        FixedPostUpdate,
        TickSet::PoolReturn.after(TickSet::Apply).after(CollisionEventSystems),
    );
}
