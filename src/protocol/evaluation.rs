//! Evaluation service round-trip records

use serde::{Deserialize, Serialize};

use crate::game::snapshot::{GameSnapshot, SnapshotRangeError};
use crate::game::PlayerId;

/// Sent after each tick: who acted, what they did, and the local view of both players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub player_id: PlayerId,
    pub action: String,
    pub game_state: GameSnapshot,
}

/// Parse and validate the authoritative snapshot returned by the evaluation service
pub fn parse_evaluation_response(raw: &str) -> Result<GameSnapshot, EvaluationError> {
    let snapshot: GameSnapshot = serde_json::from_str(raw).map_err(EvaluationError::Malformed)?;
    snapshot
        .validate()
        .map_err(|(player, source)| EvaluationError::OutOfRange { player, source })?;
    Ok(snapshot)
}

/// Evaluation round-trip failures. All are recoverable; the session holds its local state.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("malformed evaluation response: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("evaluation response for player {player} out of range: {source}")]
    OutOfRange {
        player: PlayerId,
        #[source]
        source: SnapshotRangeError,
    },

    #[error("no evaluation response within {0:?}")]
    Timeout(std::time::Duration),

    #[error("evaluation channel closed")]
    Closed,
}
