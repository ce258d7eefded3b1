//! Lighting plugin (Firefly) (render-only).

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use bevy_firefly::prelude::*;

use crate::common::state::GameState;
use crate::plugins::squad::SquadRoster;
use crate::plugins::units::Unit;

#[derive(Component)]
pub struct LeaderLight;

pub fn plugin(app: &mut App) {
    if !app.is_plugin_added::<FireflyPlugin>() {
        app.add_plugins(FireflyPlugin);
    }

    app.add_systems(OnEnter(GameState::Playing), setup)
        .add_systems(Update, follow_leader_light.run_if(in_state(GameState::Playing)));
}

fn setup(mut commands: Commands) {
    commands.spawn((
        Name::new("LeaderLight"),
        LeaderLight,
        PointLight2d {
            color: Color::srgb(1.0, 0.9, 0.75),
            radius: 14.0,
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 10.0),
        DespawnOnExit(GameState::Playing),
    ));
}

fn follow_leader_light(
    roster: Res<SquadRoster>,
    q_unit: Query<&Transform, (With<Unit>, Without<LeaderLight>)>,
    mut q_light: Query<&mut Transform, (With<LeaderLight>, Without<Unit>)>,
) {
    let Some(tf_leader) = roster.leader.and_then(|e| q_unit.get(e).ok()) else {
        return;
    };
    let Ok(mut tf_light) = q_light.single_mut() else {
        return;
    };

    tf_light.translation.x = tf_leader.translation.x;
    tf_light.translation.y = tf_leader.translation.y;
}
