//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - we then call `runner_squad::game::configure_headless` to install gameplay plugins.
//! - time advances by exactly one fixed step per `update`.

#![allow(dead_code)]

use std::time::Duration;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use runner_squad::common::messages::StartEncounter;
use runner_squad::common::state::GameState;

pub const STEP: Duration = Duration::from_micros(15_625);

pub fn app_headless() -> App {
    let mut app = App::new();

    // AssetPlugin + ScenePlugin so SceneSpawner exists for Avian.
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(STEP));

    runner_squad::game::configure_headless(&mut app);
    // `App::run` would do this; plugins such as Avian init resources in `finish`.
    app.finish();
    app.cleanup();
    app
}

pub fn step(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

pub fn state(app: &App) -> GameState {
    *app.world().resource::<State<GameState>>().get()
}

/// Boot, send `StartEncounter` and run until the squad is on the field.
pub fn playing_app() -> App {
    let mut app = app_headless();
    app.update();
    app.world_mut().write_message(StartEncounter);
    step(&mut app, 4);
    assert_eq!(state(&app), GameState::Playing);
    app
}
