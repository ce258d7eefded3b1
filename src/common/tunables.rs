//! Tunable gameplay constants.
//!
//! Units are meters; rendering converts with `pixels_per_meter`.

use bevy::prelude::*;

use crate::plugins::barrels::ThresholdPolicy;
use crate::plugins::squad::formation::MovementBounds;

/// Which side of the zone threshold hosts the barrel lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneSide {
    Left,
    Right,
}

#[derive(Resource, Debug, Clone)]
pub struct Tunables {
    pub pixels_per_meter: f32,

    // Squad
    pub squad_line_y: f32,
    pub movement_bounds: MovementBounds,
    pub squad_speed: f32,
    pub drag_meters_per_pixel: f32,
    pub unit_smooth_time: f32,
    pub unit_max_speed: f32,
    pub move_start_speed: f32,
    pub move_stop_speed: f32,
    pub move_stop_grace: f32,
    pub add_member_step: Vec2,

    // Projectiles
    pub bullet_speed: f32,
    pub muzzle_forward: f32,

    // Enemies / waves
    pub enemy_spawn_y: f32,
    pub despawn_y: f32,
    pub enemy_death_secs: f32,
    pub spawn_interval_base: f32,
    pub spawn_interval_floor: f32,
    pub spawn_interval_decay: f32,
    pub enemy_prewarm: usize,

    // Gates
    pub gate_spawn_y: f32,
    pub gate_speed: f32,
    pub gate_zone_width: f32,

    // Barrels
    pub barrel_lane_x: f32,
    pub barrel_spawn_y: f32,
    pub barrel_spacing: f32,
    pub barrel_speed: f32,
    pub barrel_threshold_y: f32,
    pub barrel_slide_speed: f32,
    pub barrel_spin_degrees_per_sec: f32,
    pub barrel_default_policy: ThresholdPolicy,

    // Combat zone split
    pub zone_threshold_x: f32,
    pub barrel_side: LaneSide,
}

impl Tunables {
    /// Stage half-width used for lane walls and the default lane clamp.
    pub fn stage_half_width(&self) -> f32 {
        match self.movement_bounds {
            MovementBounds::Lane { min_x, max_x } => (max_x - min_x) * 0.5,
            MovementBounds::FreeRange { left, right } => (right - left) * 0.5,
            MovementBounds::Unclamped => 6.0,
        }
    }
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 40.0,

            squad_line_y: 0.0,
            movement_bounds: MovementBounds::Lane { min_x: -6.0, max_x: 6.0 },
            squad_speed: 9.0,
            drag_meters_per_pixel: 0.025,
            unit_smooth_time: 0.08,
            unit_max_speed: 40.0,
            move_start_speed: 0.35,
            move_stop_speed: 0.12,
            move_stop_grace: 0.12,
            add_member_step: Vec2::new(0.7, 0.7),

            bullet_speed: 32.0,
            muzzle_forward: 0.5,

            enemy_spawn_y: 42.0,
            despawn_y: -6.0,
            enemy_death_secs: 0.35,
            spawn_interval_base: 0.6,
            spawn_interval_floor: 0.15,
            spawn_interval_decay: 0.004,
            enemy_prewarm: 24,

            gate_spawn_y: 46.0,
            gate_speed: 6.0,
            gate_zone_width: 5.5,

            barrel_lane_x: 3.0,
            barrel_spawn_y: 30.0,
            barrel_spacing: 2.0,
            barrel_speed: 3.0,
            barrel_threshold_y: 7.0,
            barrel_slide_speed: 8.0,
            barrel_spin_degrees_per_sec: 540.0,
            barrel_default_policy: ThresholdPolicy::Stop,

            zone_threshold_x: 1.0,
            barrel_side: LaneSide::Right,
        }
    }
}
