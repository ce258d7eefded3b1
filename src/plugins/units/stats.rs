//! Weapon profiles and stat resolution.
//!
//! `effective = base + base * percent / 100`, then clamped.
//! Percentages accumulate additively per weapon profile; swapping to the machine gun does not
//! carry the rifle's percentages over, and swapping back restores them.

use bevy::prelude::*;

use crate::common::modifiers::{Modifier, ModifierOp, ModifierType};

pub const DAMAGE_FLOOR: f32 = 1.0;
pub const FIRE_RATE_MIN: f32 = 0.1;
pub const FIRE_RATE_MAX: f32 = 20.0;
pub const RANGE_MIN: f32 = 5.0;
pub const RANGE_MAX: f32 = 100.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WeaponProfile {
    #[default]
    Rifle,
    MachineGun,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeaponStats {
    pub damage: f32,
    /// Shots per second.
    pub fire_rate: f32,
    pub range: f32,
    pub bullet_count: u32,
    pub bullet_spacing: f32,
}

impl WeaponProfile {
    pub fn base_stats(self) -> WeaponStats {
        match self {
            Self::Rifle => WeaponStats {
                damage: 10.0,
                fire_rate: 3.0,
                range: 30.0,
                bullet_count: 1,
                bullet_spacing: 0.35,
            },
            Self::MachineGun => WeaponStats {
                damage: 6.0,
                fire_rate: 9.0,
                range: 24.0,
                bullet_count: 1,
                bullet_spacing: 0.3,
            },
        }
    }

    /// Body rotation applied while this weapon is equipped.
    pub fn yaw_offset_degrees(self) -> f32 {
        match self {
            Self::Rifle => 0.0,
            Self::MachineGun => 35.0,
        }
    }
}

/// Percentage accumulators for one weapon profile.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PercentMods {
    pub damage: f32,
    pub fire_rate: f32,
    pub range: f32,
}

/// Everything a unit needs to resolve its weapon.
///
/// Also used as the squad's persistent accumulator so late spawns inherit earlier pickups.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Loadout {
    pub profile: WeaponProfile,
    pub rifle: PercentMods,
    pub machine_gun: PercentMods,
    pub bullet_delta: i32,
}

impl Loadout {
    #[inline]
    pub fn mods(&self) -> &PercentMods {
        match self.profile {
            WeaponProfile::Rifle => &self.rifle,
            WeaponProfile::MachineGun => &self.machine_gun,
        }
    }

    #[inline]
    fn mods_mut(&mut self) -> &mut PercentMods {
        match self.profile {
            WeaponProfile::Rifle => &mut self.rifle,
            WeaponProfile::MachineGun => &mut self.machine_gun,
        }
    }

    #[inline]
    pub fn machine_gun(&self) -> bool {
        self.profile == WeaponProfile::MachineGun
    }

    /// Apply a weapon modifier. Returns `false` for kinds that are not weapon stats.
    pub fn apply(&mut self, m: &Modifier) -> bool {
        let v = m.signed_value();
        match m.kind {
            ModifierType::Damage => self.mods_mut().damage += v,
            ModifierType::FireRate => self.mods_mut().fire_rate += v,
            ModifierType::Range => self.mods_mut().range += v,
            ModifierType::BulletCount => self.bullet_delta += v.round() as i32,
            ModifierType::MachineGun => {
                self.profile = match m.op {
                    ModifierOp::Increase => WeaponProfile::MachineGun,
                    ModifierOp::Decrease => WeaponProfile::Rifle,
                };
            }
            ModifierType::AddMember => return false,
        }
        true
    }

    pub fn effective(&self) -> WeaponStats {
        resolve(&self.profile.base_stats(), self.mods(), self.bullet_delta)
    }
}

#[inline]
fn scaled(base: f32, percent: f32) -> f32 {
    base + base * percent / 100.0
}

pub fn resolve(base: &WeaponStats, mods: &PercentMods, bullet_delta: i32) -> WeaponStats {
    WeaponStats {
        damage: scaled(base.damage, mods.damage).max(DAMAGE_FLOOR),
        fire_rate: scaled(base.fire_rate, mods.fire_rate).clamp(FIRE_RATE_MIN, FIRE_RATE_MAX),
        range: scaled(base.range, mods.range).clamp(RANGE_MIN, RANGE_MAX),
        bullet_count: (base.bullet_count as i32 + bullet_delta).max(1) as u32,
        bullet_spacing: base.bullet_spacing,
    }
}

/// Lateral offsets of a shot's projectiles, symmetric around the aim axis.
pub fn fan_offsets(count: u32, spacing: f32) -> impl Iterator<Item = f32> {
    let half = (count.max(1) - 1) as f32 * 0.5;
    (0..count.max(1)).map(move |i| (i as f32 - half) * spacing)
}
