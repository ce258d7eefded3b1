use bevy::prelude::*;

use super::*;
use crate::common::test_utils::{drain_messages, ensure_messages, run_system_once, set_fixed_delta};
use crate::config::{LevelWaveConfig, WaveConfig};
use crate::plugins::enemies::{allocate_enemies, prewarm_enemy_pools, DownCause, WaveTag};
use crate::plugins::pool::{PoolKey, PoolState, Pools};

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn wave(delay: f32, counts: &[u32]) -> WaveConfig {
    WaveConfig { delay_before_wave: delay, counts: counts.to_vec(), spawn_points: vec![] }
}

fn level(waves: Vec<WaveConfig>, immediate_waves: usize) -> LevelWaveConfig {
    LevelWaveConfig { waves, immediate_waves }
}

const CADENCE: SpawnCadence = SpawnCadence { base: 0.5, floor: 0.1, decay: 0.0 };

/// Tick until nothing changes for a while; returns everything emitted.
fn run(c: &mut WaveCoordinator, ticks: usize, dt: f32) -> (Vec<SpawnOrder>, Vec<WaveEvent>) {
    let (mut orders, mut events) = (Vec::new(), Vec::new());
    for _ in 0..ticks {
        c.tick(dt, &mut orders, &mut events);
    }
    (orders, events)
}

fn started(level: &LevelWaveConfig, enemy_types: usize) -> (WaveCoordinator, Vec<SpawnOrder>, Vec<WaveEvent>) {
    let mut c = WaveCoordinator::new(level, enemy_types, 1, CADENCE);
    let (mut orders, mut events) = (Vec::new(), Vec::new());
    c.start(&mut orders, &mut events);
    (c, orders, events)
}

// -----------------------------------------------------------------------------
// Coordinator
// -----------------------------------------------------------------------------

#[test]
fn spawn_interval_shrinks_to_its_floor() {
    let cadence = SpawnCadence { base: 0.6, floor: 0.15, decay: 0.01 };
    assert_eq!(cadence.interval(0.0), 0.6);
    assert!((cadence.interval(20.0) - 0.4).abs() < 1e-6);
    assert_eq!(cadence.interval(1_000.0), 0.15);
}

#[test]
fn waves_run_sequentially_and_level_is_won_once() {
    let lvl = level(vec![wave(0.5, &[2]), wave(0.5, &[1])], 0);
    let (mut c, orders, events) = started(&lvl, 1);
    assert!(orders.is_empty() && events.is_empty());

    // Delay, then one spawn per interval.
    let (orders, events) = run(&mut c, 20, 0.1);
    assert_eq!(events, vec![WaveEvent::Started(0)]);
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o.tag == WaveTag { epoch: 1, phase: 0 } && o.position.is_none()));
    assert_eq!(*c.stage(), Stage::AwaitingClear);

    assert!(c.register_kill(orders[0].tag));
    assert!(c.register_kill(orders[1].tag));
    let (orders, events) = run(&mut c, 10, 0.1);
    assert_eq!(events, vec![WaveEvent::Complete(0), WaveEvent::Started(1)]);
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].tag.phase, 1);

    assert!(c.register_kill(orders[0].tag));
    let (_, events) = run(&mut c, 1, 0.1);
    assert_eq!(events, vec![WaveEvent::Complete(1), WaveEvent::LevelWon]);

    // Extra kills and ticks never re-trigger.
    assert!(!c.register_kill(orders[0].tag));
    let (orders, events) = run(&mut c, 10, 0.1);
    assert!(orders.is_empty() && events.is_empty());
    assert_eq!(*c.stage(), Stage::LevelWon);
}

#[test]
fn kills_from_other_epochs_or_phases_are_ignored() {
    let lvl = level(vec![wave(0.0, &[1]), wave(0.0, &[1])], 0);
    let (mut c, _, _) = started(&lvl, 1);
    run(&mut c, 1, 0.1);

    assert!(!c.register_kill(WaveTag { epoch: 0, phase: 0 }));
    assert!(!c.register_kill(WaveTag { epoch: 1, phase: 1 }));
    assert_eq!(c.progress(), (0, 1));

    let (_, events) = run(&mut c, 5, 0.1);
    assert!(events.is_empty());
}

#[test]
fn immediate_waves_share_one_phase_and_use_spawn_points() {
    let mut first = wave(9.0, &[2]);
    first.spawn_points = vec![[1.0, 20.0]];
    let lvl = level(vec![first, wave(9.0, &[0, 1]), wave(0.0, &[1, 0])], 2);

    let (mut c, orders, events) = started(&lvl, 2);
    assert_eq!(events, vec![WaveEvent::Started(0), WaveEvent::Started(1)]);
    assert_eq!(orders.len(), 3);
    assert_eq!(orders[0].position, Some(Vec2::new(1.0, 20.0)));
    assert_eq!(orders[1].position, Some(Vec2::new(1.0, 20.0)));
    assert_eq!((orders[2].enemy_type, orders[2].position), (1, None));
    assert_eq!(c.progress(), (0, 3));

    for o in &orders {
        assert!(c.register_kill(o.tag));
    }
    let (later, events) = run(&mut c, 1, 0.1);
    assert_eq!(events, vec![WaveEvent::Complete(0), WaveEvent::Complete(1)]);
    assert!(later.is_empty());

    let (later, events) = run(&mut c, 1, 0.1);
    assert_eq!(events, vec![WaveEvent::Started(2)]);
    assert_eq!(later.len(), 1);
    assert_eq!(later[0].tag.phase, 1);
}

#[test]
fn empty_phase_completes_when_spawning_ends() {
    let lvl = level(vec![wave(0.0, &[0])], 0);
    let (mut c, _, _) = started(&lvl, 1);
    let (orders, events) = run(&mut c, 1, 0.1);
    assert!(orders.is_empty());
    assert_eq!(events, vec![WaveEvent::Started(0), WaveEvent::Complete(0), WaveEvent::LevelWon]);
}

#[test]
fn level_without_waves_is_won_on_start() {
    let (c, orders, events) = started(&level(vec![], 0), 1);
    assert!(orders.is_empty());
    assert_eq!(events, vec![WaveEvent::LevelWon]);
    assert!(!c.is_running());
}

#[test]
fn unknown_enemy_types_are_dropped_from_the_target() {
    let lvl = level(vec![wave(0.0, &[1, 4])], 0);
    let (mut c, _, _) = started(&lvl, 1);
    let (orders, _) = run(&mut c, 10, 0.1);
    assert_eq!(orders.len(), 1);
    assert_eq!(c.progress(), (0, 1));
}

#[test]
fn cancelled_sequence_stops_spawning_and_counting() {
    let lvl = level(vec![wave(0.0, &[5])], 0);
    let (mut c, _, _) = started(&lvl, 1);
    let (orders, _) = run(&mut c, 1, 0.1);
    c.cancel();

    assert!(!c.register_kill(orders[0].tag));
    let (orders, events) = run(&mut c, 20, 0.1);
    assert!(orders.is_empty() && events.is_empty());
    assert_eq!(*c.stage(), Stage::Cancelled);
}

// -----------------------------------------------------------------------------
// Systems
// -----------------------------------------------------------------------------

fn wave_world(waves: Vec<WaveConfig>, prewarm: usize) -> World {
    let mut world = World::new();
    world.insert_resource(RunnerConfig { wave_levels: vec![level(waves, 0)], ..default() });
    world.insert_resource(Tunables { enemy_prewarm: prewarm, ..default() });
    world.insert_resource(LevelProgress { level: 1 });
    world.init_resource::<WaveDirector>();
    world.init_resource::<Pools>();
    ensure_messages::<SpawnEnemyRequest>(&mut world);
    ensure_messages::<WaveStarted>(&mut world);
    ensure_messages::<WaveComplete>(&mut world);
    ensure_messages::<LevelComplete>(&mut world);
    ensure_messages::<EnemyDown>(&mut world);
    ensure_messages::<SquadWiped>(&mut world);
    set_fixed_delta(&mut world, 1.0);
    world
}

fn step(world: &mut World) {
    run_system_once(world, tick_wave_coordinator);
    run_system_once(world, allocate_enemies);
    drain_messages::<SpawnEnemyRequest>(world);
}

#[test]
fn prewarmed_pool_serves_a_wave_without_growing() {
    let mut world = wave_world(vec![wave(0.0, &[3])], 5);
    run_system_once(&mut world, prewarm_enemy_pools);
    run_system_once(&mut world, start_waves);

    for _ in 0..6 {
        step(&mut world);
    }

    let active = world.query::<&PoolState>().iter(&world).filter(|s| s.is_active()).count();
    assert_eq!(active, 3);
    assert_eq!(world.resource::<Pools>().instantiated(PoolKey::Enemy(0)), 5);
    assert_eq!(drain_messages::<WaveStarted>(&mut world), vec![WaveStarted { wave: 0 }]);
}

#[test]
fn kills_complete_the_level_exactly_once() {
    let mut world = wave_world(vec![wave(0.0, &[2])], 0);
    run_system_once(&mut world, start_waves);
    for _ in 0..3 {
        step(&mut world);
    }

    let tag = WaveTag { epoch: world.resource::<WaveDirector>().epoch, phase: 0 };
    for _ in 0..3 {
        world.write_message(EnemyDown { entity: Entity::PLACEHOLDER, tag, cause: DownCause::Shot });
    }
    run_system_once(&mut world, register_kills);
    drain_messages::<EnemyDown>(&mut world);

    for _ in 0..3 {
        run_system_once(&mut world, tick_wave_coordinator);
    }
    assert_eq!(drain_messages::<WaveComplete>(&mut world), vec![WaveComplete { wave: 0 }]);
    assert_eq!(drain_messages::<LevelComplete>(&mut world), vec![LevelComplete { level: 1 }]);
}

#[test]
fn restarting_bumps_the_epoch_and_ignores_old_kills() {
    let mut world = wave_world(vec![wave(0.0, &[1])], 0);
    run_system_once(&mut world, start_waves);
    let old = WaveTag { epoch: world.resource::<WaveDirector>().epoch, phase: 0 };

    run_system_once(&mut world, cancel_waves);
    run_system_once(&mut world, start_waves);
    step(&mut world);

    world.write_message(EnemyDown { entity: Entity::PLACEHOLDER, tag: old, cause: DownCause::Escaped });
    run_system_once(&mut world, register_kills);
    drain_messages::<EnemyDown>(&mut world);
    run_system_once(&mut world, tick_wave_coordinator);

    assert!(drain_messages::<LevelComplete>(&mut world).is_empty());
    let director = world.resource::<WaveDirector>();
    assert_eq!(director.epoch, old.epoch + 1);
    assert_eq!(director.coordinator.as_ref().map(WaveCoordinator::progress), Some((0, 1)));
}

#[test]
fn wipe_cancels_the_sequence() {
    let mut world = wave_world(vec![wave(0.0, &[4])], 0);
    run_system_once(&mut world, start_waves);
    step(&mut world);

    world.write_message(SquadWiped);
    run_system_once(&mut world, cancel_waves_on_wipe);
    let director = world.resource::<WaveDirector>();
    assert_eq!(director.coordinator.as_ref().map(|c| c.stage().clone()), Some(Stage::Cancelled));
}
