//! Delay-driven sequence of authored items (gate spawns, barrel waves).
//!
//! Each item waits its own delay after the previous one was released. Ticked once per
//! simulation step; cancellation is terminal.

#[derive(Debug, Clone, PartialEq)]
pub struct DelaySchedule<T> {
    items: Vec<(f32, T)>,
    next: usize,
    waited: f32,
    cancelled: bool,
}

impl<T> Default for DelaySchedule<T> {
    fn default() -> Self {
        Self { items: Vec::new(), next: 0, waited: 0.0, cancelled: false }
    }
}

impl<T: Clone> DelaySchedule<T> {
    pub fn new(items: impl IntoIterator<Item = (f32, T)>) -> Self {
        Self { items: items.into_iter().collect(), ..Self::default() }
    }

    /// Advance by `dt`; returns every item whose delay elapsed, in order.
    ///
    /// Leftover time carries into the next item's delay.
    pub fn tick(&mut self, dt: f32) -> Vec<T> {
        let mut due = Vec::new();
        if self.is_finished() {
            return due;
        }

        self.waited += dt;
        while let Some((delay, item)) = self.items.get(self.next) {
            let delay = delay.max(0.0);
            if self.waited < delay {
                break;
            }
            self.waited -= delay;
            self.next += 1;
            due.push(item.clone());
        }
        due
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_finished(&self) -> bool {
        self.cancelled || self.next >= self.items.len()
    }

    pub fn remaining(&self) -> usize {
        if self.cancelled { 0 } else { self.items.len() - self.next }
    }
}
