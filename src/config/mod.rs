//! Authoring data: enemy types, squad defaults and per-level wave/gate/barrel lists.
//!
//! The document is RON (`assets/config/runner.ron`) and is embedded at compile time.
//! It is immutable at runtime: sequences read from it, nothing writes back.
//!
//! Level lookup follows the progress provider's rule: `(level - 1) mod count`,
//! independently for waves, gates and barrels.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::modifiers::{Modifier, ModifierOp, ModifierType};
use crate::plugins::barrels::ThresholdPolicy;

const EMBEDDED: &str = include_str!("../../assets/config/runner.ron");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse runner config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("no wave levels configured")]
    NoWaveLevels,
    #[error("no enemy types configured")]
    NoEnemyTypes,
    #[error("wave {wave} of wave level {level} references unknown enemy type {index}")]
    UnknownEnemyType { level: usize, wave: usize, index: usize },
    #[error("squad defaults define no members")]
    EmptySquad,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTypeConfig {
    pub name: String,
    pub health: f32,
    pub speed: f32,
    pub contact_damage: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPrefabConfig {
    pub id: String,
    pub health: f32,
}

fn active_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadMemberConfig {
    pub prefab: String,
    /// Offset relative to the squad center, `(x, y, z)`; `z` is rearward.
    pub offset: [f32; 3],
    #[serde(default = "active_by_default")]
    pub active: bool,
}

/// Squad composition: level defaults, or a scenario override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadComposition {
    pub members: Vec<SquadMemberConfig>,
    /// When set, only the first `n` members are active.
    #[serde(default)]
    pub active_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    pub delay_before_wave: f32,
    /// Count per enemy type index.
    pub counts: Vec<u32>,
    /// Designated world positions `(x, y)` used when this wave is pre-spawned.
    #[serde(default)]
    pub spawn_points: Vec<[f32; 2]>,
}

impl WaveConfig {
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelWaveConfig {
    pub waves: Vec<WaveConfig>,
    /// Leading waves spawned immediately and concurrently, as one kill phase.
    #[serde(default)]
    pub immediate_waves: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSpawn {
    /// Seconds after the previous gate (or encounter start).
    pub spawn_delay: f32,
    pub left: Modifier,
    pub right: Modifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelGateConfig {
    pub gates: Vec<GateSpawn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarrelConfig {
    pub health: f32,
    pub modifier: Modifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarrelWave {
    pub pre_delay: f32,
    pub barrels: Vec<BarrelConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelBarrelConfig {
    pub waves: Vec<BarrelWave>,
    /// Falls back to `Tunables::barrel_default_policy`.
    #[serde(default)]
    pub policy: Option<ThresholdPolicy>,
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub enemy_types: Vec<EnemyTypeConfig>,
    pub unit_prefabs: Vec<UnitPrefabConfig>,
    pub squad: SquadComposition,
    pub wave_levels: Vec<LevelWaveConfig>,
    #[serde(default)]
    pub gate_levels: Vec<LevelGateConfig>,
    #[serde(default)]
    pub barrel_levels: Vec<LevelBarrelConfig>,
}

impl RunnerConfig {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let cfg: RunnerConfig = ron::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse the embedded document; on failure log and use the built-in defaults.
    pub fn load_embedded() -> Self {
        match Self::from_ron(EMBEDDED) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("Runner config rejected ({e}); using built-in defaults");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enemy_types.is_empty() {
            return Err(ConfigError::NoEnemyTypes);
        }
        if self.wave_levels.is_empty() {
            return Err(ConfigError::NoWaveLevels);
        }
        if self.squad.members.is_empty() {
            return Err(ConfigError::EmptySquad);
        }
        for (level, lvl) in self.wave_levels.iter().enumerate() {
            for (wave, w) in lvl.waves.iter().enumerate() {
                // A zero count for an unknown type is harmless.
                if let Some(index) = w
                    .counts
                    .iter()
                    .enumerate()
                    .skip(self.enemy_types.len())
                    .find(|(_, c)| **c > 0)
                    .map(|(i, _)| i)
                {
                    return Err(ConfigError::UnknownEnemyType { level, wave, index });
                }
            }
        }
        Ok(())
    }

    pub fn unit_prefab(&self, id: &str) -> Option<&UnitPrefabConfig> {
        self.unit_prefabs.iter().find(|p| p.id == id)
    }

    pub fn waves_for(&self, level: u32) -> Option<&LevelWaveConfig> {
        for_level(&self.wave_levels, level)
    }

    pub fn gates_for(&self, level: u32) -> Option<&LevelGateConfig> {
        for_level(&self.gate_levels, level)
    }

    pub fn barrels_for(&self, level: u32) -> Option<&LevelBarrelConfig> {
        for_level(&self.barrel_levels, level)
    }
}

/// `(level - 1) mod items.len()`; `None` for level 0 or an empty list.
pub fn for_level<T>(items: &[T], level: u32) -> Option<&T> {
    if items.is_empty() || level == 0 {
        return None;
    }
    items.get((level as usize - 1) % items.len())
}

impl Default for RunnerConfig {
    fn default() -> Self {
        let m = |kind, op, value| Modifier::new(kind, op, value);
        Self {
            enemy_types: vec![EnemyTypeConfig {
                name: "Grunt".into(),
                health: 20.0,
                speed: 3.5,
                contact_damage: 25.0,
                radius: 0.45,
            }],
            unit_prefabs: vec![UnitPrefabConfig { id: "soldier".into(), health: 100.0 }],
            squad: SquadComposition {
                members: vec![SquadMemberConfig {
                    prefab: "soldier".into(),
                    offset: [0.0, 0.0, 0.0],
                    active: true,
                }],
                active_count: None,
            },
            wave_levels: vec![LevelWaveConfig {
                waves: vec![
                    WaveConfig { delay_before_wave: 1.0, counts: vec![6], spawn_points: vec![] },
                    WaveConfig { delay_before_wave: 2.0, counts: vec![10], spawn_points: vec![] },
                ],
                immediate_waves: 0,
            }],
            gate_levels: vec![LevelGateConfig {
                gates: vec![GateSpawn {
                    spawn_delay: 4.0,
                    left: m(ModifierType::Damage, ModifierOp::Increase, 20.0),
                    right: m(ModifierType::AddMember, ModifierOp::Increase, 2.0),
                }],
            }],
            barrel_levels: vec![],
        }
    }
}
