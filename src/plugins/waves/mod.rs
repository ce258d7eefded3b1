//! Waves plugin: drives the [`WaveCoordinator`] for the current level.
//!
//! ```text
//! OnEnter(Playing):  new epoch, build coordinator from the level's wave config, start
//! Sequence:          tick -> SpawnEnemyRequest / WaveStarted / WaveComplete / LevelComplete
//! Resolve:           EnemyDown -> register_kill; SquadWiped -> cancel
//! OnExit(Playing):   cancel
//! ```
//!
//! The epoch survives across encounters so enemies of a cancelled run can never count
//! toward the next one.

use bevy::prelude::*;

use crate::common::messages::{LevelComplete, SquadWiped, WaveComplete, WaveStarted};
use crate::common::state::{GameState, TickSet};
use crate::common::tunables::Tunables;
use crate::config::RunnerConfig;
use crate::plugins::encounter::LevelProgress;
use crate::plugins::enemies::{enemy_death_trigger, EnemyDown, SpawnEnemyRequest};

pub mod coordinator;

pub use coordinator::{SpawnCadence, SpawnOrder, Stage, WaveCoordinator, WaveEvent};

#[derive(Resource, Debug, Default)]
pub struct WaveDirector {
    pub coordinator: Option<WaveCoordinator>,
    /// Level the coordinator was built for.
    pub level: u32,
    pub epoch: u32,
}

pub fn plugin(app: &mut App) {
    app.init_resource::<WaveDirector>();

    app.add_systems(OnEnter(GameState::Playing), start_waves);
    app.add_systems(OnExit(GameState::Playing), cancel_waves);

    app.add_systems(
        FixedUpdate,
        tick_wave_coordinator
            .in_set(TickSet::Sequence)
            .run_if(in_state(GameState::Playing)),
    );
    app.add_systems(
        FixedPostUpdate,
        (register_kills, cancel_waves_on_wipe)
            .chain()
            .in_set(TickSet::Resolve)
            .after(enemy_death_trigger)
            .run_if(in_state(GameState::Playing)),
    );
}

/// Order/event buffers filled by the coordinator inside one system run.
#[derive(Default)]
struct Outbox {
    orders: Vec<SpawnOrder>,
    events: Vec<WaveEvent>,
}

fn publish(
    out: &mut Outbox,
    level: u32,
    spawns: &mut MessageWriter<SpawnEnemyRequest>,
    started: &mut MessageWriter<WaveStarted>,
    complete: &mut MessageWriter<WaveComplete>,
    won: &mut MessageWriter<LevelComplete>,
) {
    for order in out.orders.drain(..) {
        spawns.write(SpawnEnemyRequest { kind: order.enemy_type, pos: order.position, tag: order.tag });
    }
    for ev in out.events.drain(..) {
        match ev {
            WaveEvent::Started(wave) => {
                info!("Wave {wave} started");
                started.write(WaveStarted { wave });
            }
            WaveEvent::Complete(wave) => {
                info!("Wave {wave} complete");
                complete.write(WaveComplete { wave });
            }
            WaveEvent::LevelWon => {
                info!("Level {level} won");
                won.write(LevelComplete { level });
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn start_waves(
    config: Res<RunnerConfig>,
    tunables: Res<Tunables>,
    progress: Res<LevelProgress>,
    mut director: ResMut<WaveDirector>,
    mut spawns: MessageWriter<SpawnEnemyRequest>,
    mut started: MessageWriter<WaveStarted>,
    mut complete: MessageWriter<WaveComplete>,
    mut won: MessageWriter<LevelComplete>,
) {
    director.epoch = director.epoch.wrapping_add(1);
    director.level = progress.level;

    let Some(level_cfg) = config.waves_for(progress.level) else {
        warn!("No wave config for level {}; waves disabled", progress.level);
        director.coordinator = None;
        return;
    };

    let cadence = SpawnCadence {
        base: tunables.spawn_interval_base,
        floor: tunables.spawn_interval_floor,
        decay: tunables.spawn_interval_decay,
    };
    let mut coordinator = WaveCoordinator::new(level_cfg, config.enemy_types.len(), director.epoch, cadence);

    let mut out = Outbox::default();
    coordinator.start(&mut out.orders, &mut out.events);
    info!(
        "Level {}: {} wave phase(s), epoch {}",
        progress.level,
        coordinator.phase_count(),
        director.epoch
    );
    director.coordinator = Some(coordinator);

    publish(&mut out, progress.level, &mut spawns, &mut started, &mut complete, &mut won);
}

pub fn tick_wave_coordinator(
    time: Res<Time<Fixed>>,
    mut director: ResMut<WaveDirector>,
    mut spawns: MessageWriter<SpawnEnemyRequest>,
    mut started: MessageWriter<WaveStarted>,
    mut complete: MessageWriter<WaveComplete>,
    mut won: MessageWriter<LevelComplete>,
) {
    let level = director.level;
    let Some(coordinator) = director.coordinator.as_mut() else {
        return;
    };

    let mut out = Outbox::default();
    coordinator.tick(time.delta_secs(), &mut out.orders, &mut out.events);
    publish(&mut out, level, &mut spawns, &mut started, &mut complete, &mut won);
}

pub fn register_kills(mut director: ResMut<WaveDirector>, mut downs: MessageReader<EnemyDown>) {
    let Some(coordinator) = director.coordinator.as_mut() else {
        downs.clear();
        return;
    };
    for down in downs.read() {
        if !coordinator.register_kill(down.tag) {
            debug!("Ignored kill {:?} ({:?})", down.entity, down.tag);
        }
    }
}

pub fn cancel_waves_on_wipe(mut director: ResMut<WaveDirector>, mut wiped: MessageReader<SquadWiped>) {
    if wiped.read().count() == 0 {
        return;
    }
    if let Some(coordinator) = director.coordinator.as_mut() {
        coordinator.cancel();
        info!("Wave sequence cancelled: squad wiped");
    }
}

pub fn cancel_waves(mut director: ResMut<WaveDirector>) {
    if let Some(coordinator) = director.coordinator.as_mut() {
        coordinator.cancel();
    }
}

#[cfg(test)]
mod tests;
