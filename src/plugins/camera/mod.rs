//! Camera plugin (render-only).
//!
//! The camera sits behind the squad line looking up the runway and eases sideways toward the
//! leader. Queries stay disjoint (B0001) through `Without<MainCamera>` on the unit side.
//!
//! ```text
//! OnEnter(Playing): spawn MainCamera -> write MainCameraEntity resource
//! PostUpdate:      follow_leader uses SquadRoster + stored handle
//! ```

use bevy::camera::ScalingMode;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use bevy_firefly::prelude::*;

use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::squad::SquadRoster;
use crate::plugins::units::Unit;

/// How far up the runway the view is centered, in meters ahead of the squad line.
const LOOK_AHEAD: f32 = 7.0;

#[derive(Component)]
pub struct MainCamera {
    pub responsiveness: f32,
}

#[derive(Resource, Default)]
pub struct MainCameraEntity(pub Option<Entity>);

pub fn plugin(app: &mut App) {
    app.init_resource::<MainCameraEntity>();
    app.add_systems(OnEnter(GameState::Playing), spawn_camera)
        .add_systems(
            PostUpdate,
            follow_leader
                .before(TransformSystems::Propagate)
                .run_if(in_state(GameState::Playing)),
        );
}

fn spawn_camera(mut commands: Commands, tunables: Res<Tunables>) {
    let e = commands
        .spawn((
            Name::new("MainCamera"),
            Camera2d,
            Projection::Orthographic(OrthographicProjection {
                scaling_mode: ScalingMode::WindowSize,
                scale: 1.0 / tunables.pixels_per_meter.max(1.0),
                ..OrthographicProjection::default_2d()
            }),
            MainCamera { responsiveness: 5.0 },
            FireflyConfig::default(),
            Transform::from_xyz(0.0, tunables.squad_line_y + LOOK_AHEAD, 999.0),
            DespawnOnExit(GameState::Playing),
        ))
        .id();

    commands.insert_resource(MainCameraEntity(Some(e)));
}

fn follow_leader(
    time: Res<Time>,
    roster: Res<SquadRoster>,
    cam_e: Res<MainCameraEntity>,
    q_unit: Query<&Transform, (With<Unit>, Without<MainCamera>)>,
    mut q_cam: Query<(&mut Transform, &MainCamera), Without<Unit>>,
) {
    let Some(tf_leader) = roster.leader.and_then(|e| q_unit.get(e).ok()) else {
        return;
    };
    let Some(Ok((mut tf_cam, main_cam))) = cam_e.0.map(|e| q_cam.get_mut(e)) else {
        return;
    };

    let alpha = 1.0 - (-main_cam.responsiveness * time.delta_secs()).exp();
    tf_cam.translation.x += (tf_leader.translation.x - tf_cam.translation.x) * alpha;
}
