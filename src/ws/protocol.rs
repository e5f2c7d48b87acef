//! Bridge protocol message definitions
//! These are the wire types exchanged with the feed relay and the renderer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::combat::WeaponKind;
use crate::game::projectile::{AttackPhase, Outcome};
use crate::game::role::Presentation;
use crate::game::{MatchPhase, PlayerId};

// ============================================================================
// Feed relay (publish/subscribe side)
// ============================================================================

/// One player's block in an authoritative snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerWire {
    pub hp: i64,
    /// "shoot", "shield", "grenade", "reload", "logout" or ""
    pub action: String,
    /// The action could not be carried out (no ammo, grenades or shields)
    pub util_empty: bool,
    pub bullets: i64,
    pub grenades: i64,
    /// Seconds left on the shield, counting down from 10
    pub shield_time: f64,
    pub shield_health: i64,
    pub num_deaths: i64,
    pub num_shield: i64,
}

/// Authoritative game state for both players
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMsg {
    pub p1: PlayerWire,
    pub p2: PlayerWire,
}

/// Turn progress published by the game server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMsg {
    pub p1_turn_complete: bool,
    pub p1_action: String,
    pub p2_turn_complete: bool,
    pub p2_action: String,
}

impl StatusMsg {
    pub fn turn_complete(&self, id: PlayerId) -> bool {
        match id {
            PlayerId::One => self.p1_turn_complete,
            PlayerId::Two => self.p2_turn_complete,
        }
    }

    pub fn action(&self, id: PlayerId) -> Action {
        match id {
            PlayerId::One => Action::from_wire(&self.p1_action),
            PlayerId::Two => Action::from_wire(&self.p2_action),
        }
    }
}

/// Player action carried by a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    None,
    Shoot,
    Shield,
    Grenade,
    Reload,
    Logout,
}

impl Action {
    /// Unknown strings are treated as no action
    pub fn from_wire(value: &str) -> Self {
        match value {
            "shoot" => Action::Shoot,
            "shield" => Action::Shield,
            "grenade" => Action::Grenade,
            "reload" => Action::Reload,
            "logout" => Action::Logout,
            _ => Action::None,
        }
    }

    /// Label used in the turn status line
    pub fn label(self) -> Option<&'static str> {
        match self {
            Action::Shoot => Some("Shoot"),
            Action::Shield => Some("Shield"),
            Action::Grenade => Some("Grenade"),
            Action::Reload => Some("Reload"),
            Action::None | Action::Logout => None,
        }
    }
}

/// Fire-and-forget messages published back to the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A grenade decision was committed
    GrenadeResult {
        attacker: PlayerId,
        defender: PlayerId,
        hit: bool,
    },
    /// The opponent entered or left the local camera view
    OpponentVisibility { topic: String },
    /// A player logged out and the match is over
    MatchEnded,
}

impl Notification {
    /// Topic string sent over the relay
    pub fn topic(&self) -> String {
        match self {
            Notification::GrenadeResult {
                attacker,
                defender,
                hit,
            } => {
                let result = if *hit { "hit" } else { "miss" };
                format!("{}to{}_grenade_{}", attacker.tag(), defender.tag(), result)
            }
            Notification::OpponentVisibility { topic } => topic.clone(),
            Notification::MatchEnded => "match_ended".to_string(),
        }
    }
}

// ============================================================================
// Renderer bridge
// ============================================================================

/// Practice actions the renderer can trigger for the local player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalAction {
    Shoot,
    Grenade,
    Shield,
}

/// Messages sent from the renderer to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderMsg {
    /// Player is tracked by the AR camera
    TargetFound { player: PlayerId },
    /// Player is no longer tracked
    TargetLost { player: PlayerId },
    /// Developer practice action for the local player
    LocalAction { action: LocalAction },
}

impl RenderMsg {
    pub fn parse(text: &str) -> Result<Self, BridgeError> {
        serde_json::from_str(text).map_err(BridgeError::Json)
    }
}

/// Renderer bridge errors
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Invalid renderer message: {0}")]
    Json(serde_json::Error),
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct RenderFrame {
    pub tick: u64,
    pub at: DateTime<Utc>,
    pub phase: MatchPhase,
    pub local_role: PlayerId,
    /// Opponent is tracked by the local camera
    pub opponent_visible: bool,
    pub players: Vec<HudState>,
    pub attacks: Vec<AttackView>,
    pub status: StatusView,
}

/// Read-only HUD values for one player
#[derive(Debug, Clone, Serialize)]
pub struct HudState {
    pub player: PlayerId,
    pub health: i32,
    pub death_count: u32,
    pub ammo: i32,
    pub grenades: u32,
    pub shield_count: u32,
    pub shield_health: i32,
    pub shield_active: bool,
    pub shield_time_remaining: f64,
    pub shield_cooldown_active: bool,
    pub shield_cooldown_remaining: f64,
}

/// Read-only view of one attack event
#[derive(Debug, Clone, Serialize)]
pub struct AttackView {
    pub activation_id: Option<Uuid>,
    /// Accepted launches of this attacker/weapon pairing
    pub launches: u64,
    pub kind: WeaponKind,
    pub attacker: PlayerId,
    pub target: PlayerId,
    pub presentation: Presentation,
    pub phase: AttackPhase,
    pub outcome: Option<Outcome>,
    /// Flight progress in [0, 1]
    pub progress: f64,
    /// Explosion cue is showing
    pub explosion: bool,
}

/// Turn status line and check marks
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub text: String,
    /// Local player's turn is complete
    pub near_done: bool,
    /// Opponent's turn is complete
    pub far_done: bool,
}
