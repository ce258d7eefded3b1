//! Messages exchanged with collaborators outside the simulation core.
//!
//! Outbound: level outcome and score events.
//! Inbound: modifier application and encounter control.

use bevy::prelude::*;

use super::modifiers::Modifier;

#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveStarted {
    /// Zero-based wave index inside the level's wave list.
    pub wave: usize,
}

#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveComplete {
    pub wave: usize,
}

#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelComplete {
    pub level: u32,
}

#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SquadWiped;

/// Score channel: number of enemies shot down this tick.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnemyDefeated {
    pub count: u32,
}

/// Apply a modifier to the whole squad (and to every future spawn).
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct ApplyModifier(pub Modifier);

/// Append members using the staggered left/right pattern.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct AddMembers {
    pub count: u32,
    /// Lateral (x) and rearward (y) step between rows.
    pub step: Vec2,
}

#[derive(Message, Clone, Copy, Debug, Default)]
pub struct StartEncounter;

#[derive(Message, Clone, Copy, Debug, Default)]
pub struct RetryEncounter;
