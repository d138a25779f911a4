//! Controller confirmation of the previous action.
//!
//! Wire form: `playerId:isAiAction:isHit:previousActionLabel:rainBombHitCount`.

use crate::game::{InvalidPlayerId, PlayerId};

/// Labels whose outcome is already settled locally and never confirmed by the controller
const LOCALLY_RESOLVED: [&str; 3] = ["gun", "reload", "charge_shield"];

/// Upper bound on rain-bomb hits accepted in one confirmation
pub const MAX_RAIN_BOMB_HITS: u32 = 64;

const FIELD_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerResponse {
    pub player: PlayerId,
    pub is_ai_action: bool,
    pub is_hit: bool,
    pub previous_action: String,
    pub rain_bomb_hits: u32,
}

impl ControllerResponse {
    pub fn parse(raw: &str) -> Result<Self, ControllerResponseError> {
        let fields: Vec<&str> = raw.trim().split(':').collect();
        if fields.len() != FIELD_COUNT {
            return Err(ControllerResponseError::FieldCount(fields.len()));
        }

        let rain_bomb_hits = fields[4]
            .trim()
            .parse::<u32>()
            .map_err(|_| ControllerResponseError::InvalidCount(fields[4].to_string()))?;
        if rain_bomb_hits > MAX_RAIN_BOMB_HITS {
            return Err(ControllerResponseError::InvalidCount(fields[4].to_string()));
        }

        Ok(Self {
            player: fields[0].parse()?,
            is_ai_action: parse_flag("isAiAction", fields[1])?,
            is_hit: parse_flag("isHit", fields[2])?,
            previous_action: fields[3].to_string(),
            rain_bomb_hits,
        })
    }

    /// Clear the AI flags for actions the session already resolved itself
    pub fn normalized(mut self) -> Self {
        if LOCALLY_RESOLVED.contains(&self.previous_action.as_str()) {
            self.is_ai_action = false;
            self.is_hit = false;
        }
        self
    }
}

/// Best-effort label from a response that failed to parse
pub fn salvage_label(raw: &str) -> Option<String> {
    let fields: Vec<&str> = raw.trim().split(':').collect();
    if fields.len() != FIELD_COUNT {
        return None;
    }
    Some(fields[3]).filter(|l| !l.is_empty()).map(str::to_string)
}

/// Integer flag where only `1` is set
fn parse_flag(field: &'static str, value: &str) -> Result<bool, ControllerResponseError> {
    let value = value.trim();
    value
        .parse::<i64>()
        .map(|flag| flag == 1)
        .map_err(|_| ControllerResponseError::InvalidFlag {
            field,
            value: value.to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerResponseError {
    #[error("expected 5 colon-delimited fields, found {0}")]
    FieldCount(usize),

    #[error("{field} must be 0 or 1, got {value:?}")]
    InvalidFlag { field: &'static str, value: String },

    #[error("invalid rain bomb hit count {0:?}")]
    InvalidCount(String),

    #[error(transparent)]
    InvalidPlayer(#[from] InvalidPlayerId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_five_fields() {
        let resp = ControllerResponse::parse("2:1:1:bomb:3").unwrap();
        assert_eq!(resp.player, PlayerId::Two);
        assert!(resp.is_ai_action);
        assert!(resp.is_hit);
        assert_eq!(resp.previous_action, "bomb");
        assert_eq!(resp.rain_bomb_hits, 3);
    }

    #[test]
    fn locally_resolved_labels_clear_ai_flags() {
        for label in ["gun", "reload", "charge_shield"] {
            let resp = ControllerResponse::parse(&format!("1:1:1:{label}:0"))
                .unwrap()
                .normalized();
            assert!(!resp.is_ai_action, "{label}");
            assert!(!resp.is_hit, "{label}");
        }

        let resp = ControllerResponse::parse("1:1:1:basket:0").unwrap().normalized();
        assert!(resp.is_ai_action && resp.is_hit);
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert_eq!(
            ControllerResponse::parse("1:1:1:basket"),
            Err(ControllerResponseError::FieldCount(4))
        );
    }

    #[test]
    fn rejects_non_numeric_fields() {
        assert!(matches!(
            ControllerResponse::parse("1:yes:1:basket:0"),
            Err(ControllerResponseError::InvalidFlag { field: "isAiAction", .. })
        ));
        assert!(matches!(
            ControllerResponse::parse("1:0:0:basket:many"),
            Err(ControllerResponseError::InvalidCount(_))
        ));
        assert!(matches!(
            ControllerResponse::parse("1:0:0:basket:65"),
            Err(ControllerResponseError::InvalidCount(_))
        ));
        assert!(matches!(
            ControllerResponse::parse("9:0:0:basket:0"),
            Err(ControllerResponseError::InvalidPlayer(_))
        ));
    }

    #[test]
    fn integer_flags_other_than_one_are_unset() {
        let resp = ControllerResponse::parse("1:2:-1:bomb:3").unwrap();
        assert!(!resp.is_ai_action);
        assert!(!resp.is_hit);
        assert_eq!(resp.rain_bomb_hits, 3);

        let resp = ControllerResponse::parse("1: 1 :0:bomb:0").unwrap();
        assert!(resp.is_ai_action);
    }

    #[test]
    fn salvages_label_when_fields_line_up() {
        assert_eq!(salvage_label("1:x:0:soccer:0").as_deref(), Some("soccer"));
        assert_eq!(salvage_label("1:0:0::0"), None);
        assert_eq!(salvage_label("garbage"), None);
    }
}
