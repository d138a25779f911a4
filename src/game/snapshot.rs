//! Snapshots of both players and the visualization record built from them

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::ActionLabel;

use super::player::{MAGAZINE_SIZE, MAX_BOMBS, MAX_HP, MAX_SHIELD_CHARGES, SHIELD_HP};
use super::PlayerId;

/// The six attributes of one player, as exchanged with the evaluation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub hp: u32,
    pub bullets: u32,
    pub bombs: u32,
    pub shield_hp: u32,
    pub deaths: u32,
    /// Remaining shield charges
    pub shields: u32,
}

impl PlayerSnapshot {
    /// Check every field against its declared range
    pub fn validate(&self) -> Result<(), SnapshotRangeError> {
        let checks = [
            ("hp", self.hp, 1, MAX_HP),
            ("bullets", self.bullets, 0, MAGAZINE_SIZE),
            ("bombs", self.bombs, 0, MAX_BOMBS),
            ("shield_hp", self.shield_hp, 0, SHIELD_HP),
            ("shields", self.shields, 0, MAX_SHIELD_CHARGES),
        ];
        for (field, value, min, max) in checks {
            if value < min || value > max {
                return Err(SnapshotRangeError {
                    field,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }

    fn fields(&self) -> [(&'static str, u32); 6] {
        [
            ("hp", self.hp),
            ("bullets", self.bullets),
            ("bombs", self.bombs),
            ("shield_hp", self.shield_hp),
            ("deaths", self.deaths),
            ("shields", self.shields),
        ]
    }
}

/// Field outside its declared range
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} = {value} outside {min}..={max}")]
pub struct SnapshotRangeError {
    pub field: &'static str,
    pub value: u32,
    pub min: u32,
    pub max: u32,
}

/// Snapshot of both players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub p1: PlayerSnapshot,
    pub p2: PlayerSnapshot,
}

impl GameSnapshot {
    pub fn player(&self, id: PlayerId) -> &PlayerSnapshot {
        match id {
            PlayerId::One => &self.p1,
            PlayerId::Two => &self.p2,
        }
    }

    pub fn validate(&self) -> Result<(), (PlayerId, SnapshotRangeError)> {
        for id in PlayerId::ALL {
            self.player(id).validate().map_err(|e| (id, e))?;
        }
        Ok(())
    }

    /// First field (player 1 before player 2) where `other` differs
    pub fn first_difference(&self, other: &GameSnapshot) -> Option<FieldDifference> {
        PlayerId::ALL.into_iter().find_map(|id| {
            let ours = self.player(id).fields();
            let theirs = other.player(id).fields();
            ours.iter()
                .zip(theirs.iter())
                .find(|(a, b)| a.1 != b.1)
                .map(|(a, b)| FieldDifference {
                    player: id,
                    field: a.0,
                    local: a.1,
                    authoritative: b.1,
                })
        })
    }
}

/// A single diverging field found during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDifference {
    pub player: PlayerId,
    pub field: &'static str,
    pub local: u32,
    pub authoritative: u32,
}

/// Record consumed by the visualizer.
///
/// Renders as comma-separated `key:value` pairs in a fixed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualizationRecord {
    pub state: GameSnapshot,
    pub p1_action: ActionLabel,
    pub p2_action: ActionLabel,
    /// Published by reconciliation rather than for an action. Not rendered.
    pub resync: bool,
}

impl VisualizationRecord {
    pub fn new(state: GameSnapshot, p1_action: ActionLabel, p2_action: ActionLabel) -> Self {
        Self {
            state,
            p1_action,
            p2_action,
            resync: false,
        }
    }

    /// Record that only asks consumers to refresh after reconciliation
    pub fn update_ui(state: GameSnapshot) -> Self {
        Self {
            resync: true,
            ..Self::new(state, ActionLabel::UpdateUi, ActionLabel::UpdateUi)
        }
    }

    pub fn action(&self, id: PlayerId) -> &ActionLabel {
        match id {
            PlayerId::One => &self.p1_action,
            PlayerId::Two => &self.p2_action,
        }
    }
}

impl fmt::Display for VisualizationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (prefix, p) in [("p1", &self.state.p1), ("p2", &self.state.p2)] {
            write!(
                f,
                "{prefix}_hp:{},{prefix}_bombs:{},{prefix}_shieldCharges:{},\
                 {prefix}_shieldHp:{},{prefix}_bullets:{},{prefix}_deaths:{},",
                p.hp, p.bombs, p.shields, p.shield_hp, p.bullets, p.deaths
            )?;
        }
        write!(f, "p1_action:{},p2_action:{}", self.p1_action, self.p2_action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> PlayerSnapshot {
        PlayerSnapshot {
            hp: 100,
            bullets: 6,
            bombs: 2,
            shield_hp: 0,
            deaths: 0,
            shields: 3,
        }
    }

    #[test]
    fn visualization_record_field_order() {
        let mut p2 = fresh();
        p2.hp = 95;
        p2.deaths = 1;
        let record = VisualizationRecord::new(
            GameSnapshot { p1: fresh(), p2 },
            ActionLabel::Gun,
            ActionLabel::None,
        );
        assert_eq!(
            record.to_string(),
            "p1_hp:100,p1_bombs:2,p1_shieldCharges:3,p1_shieldHp:0,p1_bullets:6,p1_deaths:0,\
             p2_hp:95,p2_bombs:2,p2_shieldCharges:3,p2_shieldHp:0,p2_bullets:6,p2_deaths:1,\
             p1_action:gun,p2_action:none"
        );
    }

    #[test]
    fn resync_flag_is_not_rendered() {
        let state = GameSnapshot { p1: fresh(), p2: fresh() };
        let resync = VisualizationRecord::update_ui(state);
        let requested =
            VisualizationRecord::new(state, ActionLabel::UpdateUi, ActionLabel::UpdateUi);
        assert!(resync.resync);
        assert!(!requested.resync);
        assert_eq!(resync.to_string(), requested.to_string());
    }

    #[test]
    fn identical_snapshots_have_no_difference() {
        let a = GameSnapshot { p1: fresh(), p2: fresh() };
        assert_eq!(a.first_difference(&a), None);
    }

    #[test]
    fn single_field_difference_is_reported() {
        let a = GameSnapshot { p1: fresh(), p2: fresh() };
        let mut b = a;
        b.p2.shields = 2;
        let diff = a.first_difference(&b).unwrap();
        assert_eq!(diff.player, PlayerId::Two);
        assert_eq!(diff.field, "shields");
        assert_eq!((diff.local, diff.authoritative), (3, 2));
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let mut snap = fresh();
        snap.bullets = 7;
        let err = snap.validate().unwrap_err();
        assert_eq!(err.field, "bullets");

        snap = fresh();
        snap.hp = 0;
        assert_eq!(snap.validate().unwrap_err().field, "hp");
        assert!(fresh().validate().is_ok());
    }
}
