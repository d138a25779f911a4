//! Player identity and per-player combat state

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::combat::{resolve_hit, DamageKind};
use super::snapshot::PlayerSnapshot;

/// Health after spawn
pub const MAX_HP: u32 = 100;
/// Shield health granted by one charge
pub const SHIELD_HP: u32 = 30;
/// Shield charges after spawn
pub const MAX_SHIELD_CHARGES: u32 = 3;
/// Bullets in a full magazine
pub const MAGAZINE_SIZE: u32 = 6;
/// Bombs after spawn
pub const MAX_BOMBS: u32 = 2;

/// One of exactly two players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    pub fn opponent(self) -> Self {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }

    /// Wire number (1 or 2)
    pub fn number(self) -> u32 {
        match self {
            PlayerId::One => 1,
            PlayerId::Two => 2,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl From<PlayerId> for u32 {
    fn from(id: PlayerId) -> Self {
        id.number()
    }
}

impl TryFrom<u32> for PlayerId {
    type Error = InvalidPlayerId;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PlayerId::One),
            2 => Ok(PlayerId::Two),
            other => Err(InvalidPlayerId(other.to_string())),
        }
    }
}

impl FromStr for PlayerId {
    type Err = InvalidPlayerId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map_err(|_| InvalidPlayerId(s.to_string()))
            .and_then(PlayerId::try_from)
    }
}

/// Player id outside {1, 2}
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid player id: {0:?}")]
pub struct InvalidPlayerId(pub String);

/// Combat attributes of one player (authoritative locally until reconciled)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    id: PlayerId,
    hp: u32,
    shield_hp: u32,
    shield_charges: u32,
    bullets: u32,
    bombs: u32,
    deaths: u32,
}

impl PlayerState {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            hp: MAX_HP,
            shield_hp: 0,
            shield_charges: MAX_SHIELD_CHARGES,
            bullets: MAGAZINE_SIZE,
            bombs: MAX_BOMBS,
            deaths: 0,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn shield_hp(&self) -> u32 {
        self.shield_hp
    }

    pub fn shield_charges(&self) -> u32 {
        self.shield_charges
    }

    pub fn bullets(&self) -> u32 {
        self.bullets
    }

    pub fn bombs(&self) -> u32 {
        self.bombs
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    /// Fire one bullet; fails on an empty magazine
    pub fn shoot(&mut self) -> bool {
        if self.bullets == 0 {
            return false;
        }
        self.bullets -= 1;
        true
    }

    /// Refill the magazine; only allowed once it is empty
    pub fn reload(&mut self) -> bool {
        if self.bullets != 0 {
            return false;
        }
        self.bullets = MAGAZINE_SIZE;
        true
    }

    pub fn use_bomb(&mut self) -> bool {
        if self.bombs == 0 {
            return false;
        }
        self.bombs -= 1;
        true
    }

    /// Spend a charge to raise the shield; fails while a shield is still up
    pub fn charge_shield(&mut self) -> bool {
        if self.shield_charges == 0 || self.shield_hp != 0 {
            return false;
        }
        self.shield_hp = SHIELD_HP;
        self.shield_charges -= 1;
        true
    }

    /// Apply one hit. Returns true if the hit killed the player (already respawned).
    pub fn apply_damage(&mut self, kind: DamageKind) -> bool {
        let split = resolve_hit(self.shield_hp, self.hp, kind.amount());
        self.shield_hp = split.shield_hp;
        self.hp = split.hp;
        debug!(
            player = %self.id,
            damage = ?kind,
            hp = self.hp,
            shield_hp = self.shield_hp,
            "Damage applied"
        );

        if self.hp == 0 {
            self.respawn();
            return true;
        }
        false
    }

    /// Full reset plus one death. The death count saturates.
    pub fn respawn(&mut self) {
        let deaths = self.deaths.saturating_add(1);
        *self = Self {
            deaths,
            ..Self::new(self.id)
        };
        info!(player = %self.id, deaths, "Player respawned");
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            hp: self.hp,
            bullets: self.bullets,
            bombs: self.bombs,
            shield_hp: self.shield_hp,
            deaths: self.deaths,
            shields: self.shield_charges,
        }
    }

    /// Replace every attribute with an already-validated snapshot
    pub fn overwrite(&mut self, snapshot: &PlayerSnapshot) {
        self.hp = snapshot.hp;
        self.bullets = snapshot.bullets;
        self.bombs = snapshot.bombs;
        self.shield_hp = snapshot.shield_hp;
        self.deaths = snapshot.deaths;
        self.shield_charges = snapshot.shields;
    }
}
