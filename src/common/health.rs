use bevy::prelude::*;

/// Hit points shared by squad units, enemies and barrels.
///
/// `current` never drops below zero. Reaching zero is reported exactly once by
/// [`Health::apply_damage`]; callers treat that as the terminal transition.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn full(max: f32) -> Self {
        let max = max.max(1.0);
        Self { current: max, max }
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    /// Returns `true` only on the hit that takes health to zero.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if self.is_dead() {
            return false;
        }
        self.current = (self.current - amount.max(0.0)).max(0.0);
        self.is_dead()
    }

    #[inline]
    pub fn reset(&mut self) {
        self.current = self.max;
    }

    #[inline]
    pub fn reset_to(&mut self, max: f32) {
        *self = Self::full(max);
    }
}
