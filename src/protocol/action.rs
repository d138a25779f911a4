//! Action records submitted per player and the labels the session resolves them to

use std::fmt;

use crate::game::{InvalidPlayerId, PlayerId};

/// AI-scored activities awaiting controller confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Basket,
    Soccer,
    Volley,
    Bowl,
}

impl Activity {
    pub fn as_str(self) -> &'static str {
        match self {
            Activity::Basket => "basket",
            Activity::Soccer => "soccer",
            Activity::Volley => "volley",
            Activity::Bowl => "bowl",
        }
    }
}

/// Requested action type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Gun,
    Reload,
    Bomb,
    Activity(Activity),
    AiDamage,
    BulletDamage,
    RainBombDamage,
    Shield,
    UpdateUi,
    Unknown(String),
}

impl ActionKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "gun" => ActionKind::Gun,
            "reload" => ActionKind::Reload,
            "bomb" => ActionKind::Bomb,
            "basket" => ActionKind::Activity(Activity::Basket),
            "soccer" => ActionKind::Activity(Activity::Soccer),
            "volley" => ActionKind::Activity(Activity::Volley),
            "bowl" => ActionKind::Activity(Activity::Bowl),
            "ai_damage" => ActionKind::AiDamage,
            "bullet_damage" => ActionKind::BulletDamage,
            "rain_bomb_damage" => ActionKind::RainBombDamage,
            "shield" => ActionKind::Shield,
            "update_ui" => ActionKind::UpdateUi,
            other => ActionKind::Unknown(other.to_string()),
        }
    }
}

/// `<type>:<playerId>` parsed once at the boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub player: PlayerId,
}

impl Action {
    pub fn parse(raw: &str) -> Result<Self, ActionParseError> {
        let raw = raw.trim();
        let mut parts = raw.split(':');
        let (Some(kind), Some(player), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ActionParseError::Malformed(raw.to_string()));
        };

        Ok(Self {
            kind: ActionKind::parse(kind),
            player: player.parse()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionParseError {
    #[error("malformed action {0:?}, expected <type>:<player>")]
    Malformed(String),

    #[error(transparent)]
    InvalidPlayer(#[from] InvalidPlayerId),
}

/// Outcome label published for a player slot in the visualization record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionLabel {
    #[default]
    None,
    Gun,
    GunFail,
    Reload,
    ReloadFail,
    Bomb,
    BombFail,
    Activity(Activity),
    AiDamage,
    BulletDamage,
    RainBombDamage,
    Shield,
    ShieldFail,
    UpdateUi,
}

impl ActionLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionLabel::None => "none",
            ActionLabel::Gun => "gun",
            ActionLabel::GunFail => "gun_fail",
            ActionLabel::Reload => "reload",
            ActionLabel::ReloadFail => "reload_fail",
            ActionLabel::Bomb => "bomb",
            ActionLabel::BombFail => "bomb_fail",
            ActionLabel::Activity(a) => a.as_str(),
            ActionLabel::AiDamage => "ai_damage",
            ActionLabel::BulletDamage => "bullet_damage",
            ActionLabel::RainBombDamage => "rain_bomb_damage",
            ActionLabel::Shield => "shield",
            ActionLabel::ShieldFail => "shield_fail",
            ActionLabel::UpdateUi => "update_ui",
        }
    }
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_actions() {
        assert_eq!(
            Action::parse("gun:1"),
            Ok(Action {
                kind: ActionKind::Gun,
                player: PlayerId::One
            })
        );
        assert_eq!(
            Action::parse("volley:2").unwrap().kind,
            ActionKind::Activity(Activity::Volley)
        );
        assert_eq!(
            Action::parse("rain_bomb_damage:2\n").unwrap().kind,
            ActionKind::RainBombDamage
        );
    }

    #[test]
    fn unknown_type_is_not_an_error() {
        let action = Action::parse("dance:1").unwrap();
        assert_eq!(action.kind, ActionKind::Unknown("dance".into()));
    }

    #[test]
    fn colon_count_is_enforced() {
        assert!(matches!(Action::parse("gun"), Err(ActionParseError::Malformed(_))));
        assert!(matches!(Action::parse("gun:1:2"), Err(ActionParseError::Malformed(_))));
    }

    #[test]
    fn bad_player_is_rejected() {
        assert!(matches!(
            Action::parse("gun:3"),
            Err(ActionParseError::InvalidPlayer(_))
        ));
        assert!(matches!(
            Action::parse("gun:one"),
            Err(ActionParseError::InvalidPlayer(_))
        ));
    }

    #[test]
    fn labels_render_wire_names() {
        assert_eq!(ActionLabel::default().to_string(), "none");
        assert_eq!(ActionLabel::ReloadFail.to_string(), "reload_fail");
        assert_eq!(ActionLabel::Activity(Activity::Bowl).to_string(), "bowl");
        assert_eq!(ActionLabel::UpdateUi.to_string(), "update_ui");
    }
}
