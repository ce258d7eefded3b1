//! Unit motion helpers: damped follow, walk/idle hysteresis, strafe blend.

use bevy::prelude::*;

/// Critically damped approach of `current` toward `target`.
///
/// Closed-form spring step (Game Programming Gems 4, ch. 1.10). `velocity` is carried across
/// calls. The result never overshoots `target`.
pub fn smooth_damp(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    max_speed: f32,
    dt: f32,
) -> f32 {
    if dt <= 0.0 {
        return current;
    }
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let max_change = max_speed * smooth_time;
    let change = (current - target).clamp(-max_change, max_change);
    let clamped_target = current - change;

    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let mut out = clamped_target + (change + temp) * exp;

    // Prevent overshoot.
    if (target - current > 0.0) == (out > target) {
        out = target;
        *velocity = 0.0;
    }
    out
}

/// Walk/idle flag with hysteresis.
///
/// Starting needs `speed >= start`; stopping needs `speed <= stop` held for `grace` seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MoveHysteresis {
    moving: bool,
    still_for: f32,
}

impl MoveHysteresis {
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn update(&mut self, speed: f32, start: f32, stop: f32, grace: f32, dt: f32) -> bool {
        let speed = speed.abs();
        if !self.moving {
            if speed >= start {
                self.moving = true;
                self.still_for = 0.0;
            }
        } else if speed <= stop {
            self.still_for += dt;
            if self.still_for >= grace {
                self.moving = false;
                self.still_for = 0.0;
            }
        } else {
            self.still_for = 0.0;
        }
        self.moving
    }
}

/// Blend weight toward the strafe animation: 1 when moving across the aim axis, 0 when moving
/// along it or standing still.
pub fn strafe_weight(aim: Vec2, movement: Vec2) -> f32 {
    let (Some(aim), Some(movement)) = (aim.try_normalize(), movement.try_normalize()) else {
        return 0.0;
    };
    1.0 - aim.dot(movement).abs()
}
