//! Combat simulation modules

pub mod combat;
pub mod dispatch;
pub mod ledger;
pub mod r#match;
pub mod projectile;
pub mod role;
pub mod shield;
pub mod snapshot;
pub mod status;

pub use dispatch::Dispatcher;
pub use ledger::{AmmoPolicy, Ledger, Loadout};
pub use r#match::{GameSession, MatchPhase, SessionHandle, SessionInput};
pub use role::RoleAssignment;

use serde::{Deserialize, Serialize};

/// One of the two players in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    #[serde(rename = "p1")]
    One,
    #[serde(rename = "p2")]
    Two,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    /// The opposing player
    pub fn other(self) -> Self {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }

    /// Array slot for per-player storage
    pub fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }

    /// Short tag used in topic names and status text
    pub fn tag(self) -> &'static str {
        match self {
            PlayerId::One => "P1",
            PlayerId::Two => "P2",
        }
    }

    /// Parse a role as written in configuration ("1", "p1", "P1", ...)
    pub fn parse_role(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "p1" | "one" | "player1" => Some(PlayerId::One),
            "2" | "p2" | "two" | "player2" => Some(PlayerId::Two),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_is_symmetric() {
        for id in PlayerId::ALL {
            assert_ne!(id, id.other());
            assert_eq!(id, id.other().other());
        }
    }

    #[test]
    fn parse_role_accepts_common_spellings() {
        assert_eq!(PlayerId::parse_role("1"), Some(PlayerId::One));
        assert_eq!(PlayerId::parse_role(" P2 "), Some(PlayerId::Two));
        assert_eq!(PlayerId::parse_role("player1"), Some(PlayerId::One));
        assert_eq!(PlayerId::parse_role("3"), None);
    }

    #[test]
    fn serializes_as_wire_keys() {
        assert_eq!(serde_json::to_string(&PlayerId::One).unwrap(), "\"p1\"");
        let parsed: PlayerId = serde_json::from_str("\"p2\"").unwrap();
        assert_eq!(parsed, PlayerId::Two);
    }
}
