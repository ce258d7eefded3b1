//! Stat modifiers carried by gates and barrels.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierType {
    Damage,
    FireRate,
    Range,
    /// Additive: extra projectiles per shot.
    BulletCount,
    /// Additive: extra squad members.
    AddMember,
    /// Binary weapon swap.
    MachineGun,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierOp {
    Increase,
    Decrease,
}

impl ModifierOp {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Self::Increase => 1.0,
            Self::Decrease => -1.0,
        }
    }

    #[inline]
    pub fn symbol(self) -> char {
        match self {
            Self::Increase => '+',
            Self::Decrease => '-',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub kind: ModifierType,
    pub op: ModifierOp,
    pub value: f32,
}

impl Modifier {
    pub const fn new(kind: ModifierType, op: ModifierOp, value: f32) -> Self {
        Self { kind, op, value }
    }

    /// Magnitude with the operation's sign applied.
    #[inline]
    pub fn signed_value(&self) -> f32 {
        self.op.sign() * self.value.abs()
    }

    /// Whole-number magnitude for the additive types.
    #[inline]
    pub fn whole_value(&self) -> u32 {
        self.value.abs().round() as u32
    }

    pub fn is_percentage(&self) -> bool {
        matches!(
            self.kind,
            ModifierType::Damage | ModifierType::FireRate | ModifierType::Range
        )
    }

    /// Gate/barrel caption, derived only from `(kind, op, value)`.
    pub fn label(&self) -> String {
        let sym = self.op.symbol();
        match self.kind {
            ModifierType::Damage => format!("{sym}DMG {}%", format_magnitude(self.value)),
            ModifierType::FireRate => format!("{sym}RATE {}%", format_magnitude(self.value)),
            ModifierType::Range => format!("{sym}RANGE {}%", format_magnitude(self.value)),
            ModifierType::BulletCount => format!("{sym}{} SHOTS", self.whole_value()),
            ModifierType::AddMember => format!("{sym}{} MEMBERS", self.whole_value()),
            ModifierType::MachineGun => match self.op {
                ModifierOp::Increase => "MACHINE GUN".to_string(),
                ModifierOp::Decrease => "RIFLE".to_string(),
            },
        }
    }
}

fn format_magnitude(v: f32) -> String {
    let v = v.abs();
    if (v - v.round()).abs() < 1e-4 {
        format!("{}", v.round() as i64)
    } else {
        format!("{v:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_type_and_operation() {
        let m = Modifier::new(ModifierType::Damage, ModifierOp::Increase, 20.0);
        assert_eq!(m.label(), "+DMG 20%");

        let m = Modifier::new(ModifierType::FireRate, ModifierOp::Decrease, 12.5);
        assert_eq!(m.label(), "-RATE 12.5%");

        let m = Modifier::new(ModifierType::BulletCount, ModifierOp::Increase, 2.0);
        assert_eq!(m.label(), "+2 SHOTS");

        let m = Modifier::new(ModifierType::AddMember, ModifierOp::Increase, 3.0);
        assert_eq!(m.label(), "+3 MEMBERS");

        let m = Modifier::new(ModifierType::MachineGun, ModifierOp::Increase, 0.0);
        assert_eq!(m.label(), "MACHINE GUN");
    }

    #[test]
    fn signed_value_ignores_authored_sign() {
        let m = Modifier::new(ModifierType::Range, ModifierOp::Decrease, -15.0);
        assert_eq!(m.signed_value(), -15.0);
        assert!(m.is_percentage());
    }
}
