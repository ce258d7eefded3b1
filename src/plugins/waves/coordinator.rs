//! Wave/spawn coordinator: a resumable state machine ticked once per simulation step.
//!
//! ```text
//!   Idle ──start──► [immediate phase] ──► Delay(i) ──► Spawning(i) ──► AwaitingClear(i)
//!                                            ▲                              │
//!                                            └────── next wave ◄────────────┤
//!                                                                           └──► LevelWon
//!   any ──cancel──► Cancelled
//! ```
//!
//! Kill accounting is per *phase*. Leading "immediate" waves are spawned at once, concurrently,
//! and share phase 0 (their targets are summed). Every later wave is its own phase.
//! Each order carries a [`WaveTag`] so kills from an older sequence (epoch) or another phase
//! never count.
//!
//! No ECS access here: the plugin feeds time and kills in, and turns orders/events into messages.

use std::collections::VecDeque;

use bevy::log::warn;
use bevy::math::Vec2;

use crate::config::LevelWaveConfig;
use crate::plugins::enemies::WaveTag;

/// Spawn interval shrinking with play time: `max(floor, base - decay * elapsed)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnCadence {
    pub base: f32,
    pub floor: f32,
    pub decay: f32,
}

impl SpawnCadence {
    #[inline]
    pub fn interval(&self, elapsed: f32) -> f32 {
        (self.base - self.decay * elapsed).max(self.floor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnOrder {
    pub enemy_type: usize,
    /// Designated position (immediate waves); `None` lets the allocator pick.
    pub position: Option<Vec2>,
    pub tag: WaveTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveEvent {
    Started(usize),
    Complete(usize),
    LevelWon,
}

#[derive(Debug, Clone, PartialEq)]
struct Phase {
    waves: Vec<usize>,
    immediate: bool,
    delay: f32,
    /// Valid spawn entries, in spawn order.
    entries: Vec<(usize, Option<Vec2>)>,
}

impl Phase {
    #[inline]
    fn target(&self) -> u32 {
        self.entries.len() as u32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Idle,
    Delay { remaining: f32 },
    Spawning { queue: VecDeque<(usize, Option<Vec2>)>, cooldown: f32 },
    AwaitingClear,
    LevelWon,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct WaveCoordinator {
    phases: Vec<Phase>,
    phase: usize,
    kills: u32,
    stage: Stage,
    epoch: u32,
    cadence: SpawnCadence,
    elapsed: f32,
}

impl WaveCoordinator {
    /// Build the phase plan. Entries for enemy types outside `0..enemy_types` are dropped.
    pub fn new(level: &LevelWaveConfig, enemy_types: usize, epoch: u32, cadence: SpawnCadence) -> Self {
        let immediate = level.immediate_waves.min(level.waves.len());
        let mut phases = Vec::new();

        let entries_for = |wave: usize| -> Vec<(usize, Option<Vec2>)> {
            let cfg = &level.waves[wave];
            let mut out = Vec::with_capacity(cfg.total() as usize);
            for (kind, &count) in cfg.counts.iter().enumerate() {
                if kind >= enemy_types {
                    if count > 0 {
                        warn!("Wave {wave}: {count} entries of unknown enemy type {kind} dropped");
                    }
                    continue;
                }
                out.extend((0..count).map(|_| (kind, None)));
            }
            out
        };

        if immediate > 0 {
            let mut entries = Vec::new();
            for wave in 0..immediate {
                let points = &level.waves[wave].spawn_points;
                entries.extend(entries_for(wave).into_iter().enumerate().map(|(j, (kind, _))| {
                    let pos = (!points.is_empty()).then(|| Vec2::from_array(points[j % points.len()]));
                    (kind, pos)
                }));
            }
            phases.push(Phase { waves: (0..immediate).collect(), immediate: true, delay: 0.0, entries });
        }

        for wave in immediate..level.waves.len() {
            phases.push(Phase {
                waves: vec![wave],
                immediate: false,
                delay: level.waves[wave].delay_before_wave.max(0.0),
                entries: entries_for(wave),
            });
        }

        Self { phases, phase: 0, kills: 0, stage: Stage::Idle, epoch, cadence, elapsed: 0.0 }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn phase(&self) -> usize {
        self.phase
    }

    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// `(kills, target)` of the current phase.
    pub fn progress(&self) -> (u32, u32) {
        (self.kills, self.phases.get(self.phase).map_or(0, Phase::target))
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.stage, Stage::Idle | Stage::LevelWon | Stage::Cancelled)
    }

    #[inline]
    fn tag(&self) -> WaveTag {
        WaveTag { epoch: self.epoch, phase: self.phase }
    }

    /// Leave `Idle`. A level without waves is won on the spot.
    pub fn start(&mut self, orders: &mut Vec<SpawnOrder>, events: &mut Vec<WaveEvent>) {
        if self.stage != Stage::Idle {
            return;
        }
        self.enter_phase(0, orders, events);
    }

    pub fn cancel(&mut self) {
        if self.is_running() || self.stage == Stage::Idle {
            self.stage = Stage::Cancelled;
        }
    }

    /// Count one kill. Returns `false` if it was ignored (stale epoch, other phase, not running).
    pub fn register_kill(&mut self, tag: WaveTag) -> bool {
        if !self.is_running() || tag.epoch != self.epoch || tag.phase != self.phase {
            return false;
        }
        self.kills += 1;
        true
    }

    pub fn tick(&mut self, dt: f32, orders: &mut Vec<SpawnOrder>, events: &mut Vec<WaveEvent>) {
        if !self.is_running() {
            return;
        }
        self.elapsed += dt;

        if let Stage::Delay { remaining } = &mut self.stage {
            *remaining -= dt;
            if *remaining > 0.0 {
                return;
            }
            let queue: VecDeque<_> = self.phases[self.phase].entries.iter().copied().collect();
            events.extend(self.phases[self.phase].waves.iter().map(|w| WaveEvent::Started(*w)));
            self.stage = Stage::Spawning { queue, cooldown: 0.0 };
        }

        let tag = self.tag();
        let interval = self.cadence.interval(self.elapsed);
        if let Stage::Spawning { queue, cooldown } = &mut self.stage {
            *cooldown -= dt;
            if *cooldown <= 0.0 {
                if let Some((enemy_type, position)) = queue.pop_front() {
                    orders.push(SpawnOrder { enemy_type, position, tag });
                    *cooldown = interval;
                }
            }
            if queue.is_empty() {
                self.stage = Stage::AwaitingClear;
            }
        }

        if self.stage == Stage::AwaitingClear && self.kills >= self.phases[self.phase].target() {
            events.extend(self.phases[self.phase].waves.iter().map(|w| WaveEvent::Complete(*w)));
            self.enter_phase(self.phase + 1, orders, events);
        }
    }

    fn enter_phase(&mut self, phase: usize, orders: &mut Vec<SpawnOrder>, events: &mut Vec<WaveEvent>) {
        self.phase = phase;
        self.kills = 0;

        let Some(p) = self.phases.get(phase) else {
            self.stage = Stage::LevelWon;
            events.push(WaveEvent::LevelWon);
            return;
        };

        if p.immediate {
            let tag = self.tag();
            events.extend(p.waves.iter().map(|w| WaveEvent::Started(*w)));
            orders.extend(p.entries.iter().map(|&(enemy_type, position)| SpawnOrder { enemy_type, position, tag }));
            self.stage = Stage::AwaitingClear;
        } else {
            self.stage = Stage::Delay { remaining: p.delay };
        }
    }
}
