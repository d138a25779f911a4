//! Records exchanged with the vest/gun hardware through the relay

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::game::PlayerId;

use super::action::{Action, ActionParseError};

/// Vest report: whether `player_id` was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotReport {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    #[serde(rename = "isHit")]
    pub is_hit: bool,
}

/// Shot report tagged with the instant it entered the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampedShotReport {
    pub report: ShotReport,
    pub received_at: Instant,
}

impl StampedShotReport {
    pub fn now(report: ShotReport) -> Self {
        Self {
            report,
            received_at: Instant::now(),
        }
    }
}

/// Packets sent back to the relay clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelayFeedback {
    /// Ring the vest buzzer of a player who got shot
    HitNotice {
        id: PlayerId,
        #[serde(rename = "isHit")]
        is_hit: u8,
    },
    /// Refresh the health/ammo display of a player
    StatusUpdate { id: PlayerId, hp: u32, bullets: u32 },
}

impl RelayFeedback {
    pub fn hit(id: PlayerId) -> Self {
        RelayFeedback::HitNotice { id, is_hit: 1 }
    }
}

/// A relay message demultiplexed by content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardwareReport {
    Shot(ShotReport),
    Action(Action),
}

impl HardwareReport {
    pub fn parse(raw: &str) -> Result<Self, ReportError> {
        let trimmed = raw.trim();
        if trimmed.starts_with('{') {
            let report = serde_json::from_str(trimmed).map_err(ReportError::Shot)?;
            return Ok(HardwareReport::Shot(report));
        }
        Ok(HardwareReport::Action(Action::parse(trimmed)?))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid shot report: {0}")]
    Shot(#[source] serde_json::Error),

    #[error(transparent)]
    Action(#[from] ActionParseError),
}
