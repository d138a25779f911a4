//! Combat rules - damage sources and absorption

/// Damage dealt by a correlated gun hit
pub const BULLET_DAMAGE: u32 = 5;
/// Damage dealt per rain-bomb hit
pub const BOMB_DAMAGE: u32 = 5;
/// Damage dealt by a confirmed AI-scored action
pub const AI_DAMAGE: u32 = 10;

/// Source of damage applied to a player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageKind {
    /// Gun hit correlated by the hit window, or reported by the controller
    Bullet,
    /// Area damage from a rain bomb
    Bomb,
    /// Generic damage from an AI-scored activity
    Ai,
}

impl DamageKind {
    /// Fixed damage amount for this source
    pub const fn amount(self) -> u32 {
        match self {
            DamageKind::Bullet => BULLET_DAMAGE,
            DamageKind::Bomb => BOMB_DAMAGE,
            DamageKind::Ai => AI_DAMAGE,
        }
    }
}

/// Where a hit landed after shield absorption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageSplit {
    pub shield_hp: u32,
    pub hp: u32,
}

/// Resolve a hit against shield then health.
///
/// An active shield takes the whole hit and never spills over into health.
pub fn resolve_hit(shield_hp: u32, hp: u32, damage: u32) -> DamageSplit {
    if shield_hp > 0 {
        DamageSplit {
            shield_hp: shield_hp.saturating_sub(damage),
            hp,
        }
    } else {
        DamageSplit {
            shield_hp: 0,
            hp: hp.saturating_sub(damage),
        }
    }
}
