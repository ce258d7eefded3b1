use bevy::prelude::*;

/// Per-use projectile state. Reset by [`super::reset_released_projectiles`].
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Projectile {
    pub damage: f32,
    /// Remaining travel distance in meters.
    pub range_left: f32,
}

impl Projectile {
    #[inline]
    pub fn fired(damage: f32, range: f32) -> Self {
        Self { damage, range_left: range }
    }

    /// Consume `distance` of range. Returns `true` once the range is exhausted.
    #[inline]
    pub fn travel(&mut self, distance: f32) -> bool {
        self.range_left -= distance;
        self.range_left <= 0.0
    }
}
