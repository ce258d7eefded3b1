//! Test helpers.
//!
//! Bevy provides `World::run_system_once` (via the `RunSystemOnce` trait) for quickly
//! executing a system in tests without building a full schedule.
//!
//! Systems that use `Commands` enqueue structural changes; applying them is normally handled by
//! `ApplyDeferred` / schedule boundaries. We call `world.flush()` after running so queued commands
//! are applied before assertions.

use std::time::Duration;

use bevy::ecs::message::{Message, Messages};
use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::prelude::*;

/// Run a system once on the given world, then flush deferred commands.
/// Returns the system output.
pub fn run_system_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}

/// Insert a `Time<Fixed>` whose last delta is `dt` seconds.
pub fn set_fixed_delta(world: &mut World, dt: f32) {
    let mut t = Time::<Fixed>::default();
    t.advance_by(Duration::from_secs_f32(dt));
    world.insert_resource(t);
}

/// Make sure a message type has backing storage.
pub fn ensure_messages<M: Message>(world: &mut World) {
    if world.get_resource::<Messages<M>>().is_none() {
        world.init_resource::<Messages<M>>();
    }
}

/// Drain every message of type `M` currently buffered.
pub fn drain_messages<M: Message + Clone>(world: &mut World) -> Vec<M> {
    ensure_messages::<M>(world);
    world.resource_mut::<Messages<M>>().drain().collect()
}

/// Tiny deterministic PRNG for property-style tests (xorshift64*).
#[derive(Clone, Copy)]
pub struct TestRng(u64);

impl TestRng {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        // 24 random bits -> float in [0,1)
        let v = (self.next_u64() >> 40) as u32;
        (v as f32) / ((1u32 << 24) as f32)
    }

    #[inline]
    pub fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        debug_assert!(hi >= lo);
        lo + (hi - lo) * self.next_f32()
    }
}
