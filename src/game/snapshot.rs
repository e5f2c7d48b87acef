//! Inbound snapshot validation and render frame building

use chrono::Utc;
use serde_json::Value;

use crate::ws::protocol::{
    Action, AttackView, HudState, PlayerWire, RenderFrame, SnapshotMsg, StatusMsg,
};

use super::dispatch::Dispatcher;
use super::ledger::{MAX_AMMO, MAX_HEALTH, MAX_SHIELD_HEALTH, SHIELD_DURATION};
use super::PlayerId;

/// Snapshot rejection reasons
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Malformed feed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Feed message is neither a snapshot nor a status update")]
    UnknownShape,

    #[error("Field {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Validated per-player snapshot values
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub health: i32,
    pub action: Action,
    pub util_empty: bool,
    pub ammo: i32,
    pub grenades: u32,
    pub shield_time_remaining: f64,
    pub shield_health: i32,
    pub death_count: u32,
    pub shield_count: u32,
}

impl PlayerSnapshot {
    /// Shield time as the local timer counts it (up from zero)
    pub fn shield_elapsed(&self) -> f64 {
        SHIELD_DURATION - self.shield_time_remaining
    }
}

impl TryFrom<PlayerWire> for PlayerSnapshot {
    type Error = SnapshotError;

    fn try_from(wire: PlayerWire) -> Result<Self, Self::Error> {
        Ok(Self {
            health: in_range("hp", wire.hp, 0, MAX_HEALTH as i64)? as i32,
            action: Action::from_wire(&wire.action),
            util_empty: wire.util_empty,
            ammo: in_range("bullets", wire.bullets, 0, MAX_AMMO as i64)? as i32,
            grenades: in_range("grenades", wire.grenades, 0, u32::MAX as i64)? as u32,
            shield_time_remaining: shield_time(wire.shield_time)?,
            shield_health: in_range("shield_health", wire.shield_health, 0, MAX_SHIELD_HEALTH as i64)?
                as i32,
            death_count: in_range("num_deaths", wire.num_deaths, 0, u32::MAX as i64)? as u32,
            shield_count: in_range("num_shield", wire.num_shield, 0, u32::MAX as i64)? as u32,
        })
    }
}

fn in_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<i64, SnapshotError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(SnapshotError::OutOfRange {
            field,
            value: value as f64,
        })
    }
}

fn shield_time(value: f64) -> Result<f64, SnapshotError> {
    if value.is_finite() && (0.0..=SHIELD_DURATION).contains(&value) {
        Ok(value)
    } else {
        Err(SnapshotError::OutOfRange {
            field: "shield_time",
            value,
        })
    }
}

/// A validated snapshot for both players
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    players: [PlayerSnapshot; 2],
}

impl Snapshot {
    pub fn get(&self, id: PlayerId) -> &PlayerSnapshot {
        &self.players[id.index()]
    }
}

impl TryFrom<SnapshotMsg> for Snapshot {
    type Error = SnapshotError;

    fn try_from(msg: SnapshotMsg) -> Result<Self, Self::Error> {
        Ok(Self {
            players: [msg.p1.try_into()?, msg.p2.try_into()?],
        })
    }
}

/// A message arriving on the feed relay
#[derive(Debug, Clone)]
pub enum FeedMsg {
    Snapshot(Snapshot),
    Status(StatusMsg),
}

/// Parse and validate one feed message. The whole message is rejected on
/// any missing, mistyped or out-of-range field.
pub fn parse_feed(text: &str) -> Result<FeedMsg, SnapshotError> {
    let value: Value = serde_json::from_str(text)?;
    let is_snapshot = value.get("p1").is_some() || value.get("p2").is_some();
    let is_status = value.get("p1_turn_complete").is_some();

    if is_snapshot {
        let msg: SnapshotMsg = serde_json::from_value(value)?;
        Ok(FeedMsg::Snapshot(msg.try_into()?))
    } else if is_status {
        Ok(FeedMsg::Status(serde_json::from_value(value)?))
    } else {
        Err(SnapshotError::UnknownShape)
    }
}

/// Builds render frames at a fixed fraction of the tick rate
pub struct FrameBuilder {
    /// Ticks since the last frame
    ticks_since_frame: u32,
    /// Frame interval in ticks
    frame_interval: u32,
}

impl FrameBuilder {
    pub fn new(frame_interval: u32) -> Self {
        Self {
            ticks_since_frame: 0,
            frame_interval: frame_interval.max(1),
        }
    }

    /// Check if it's time to send a frame
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_frame += 1;
        if self.ticks_since_frame >= self.frame_interval {
            self.ticks_since_frame = 0;
            true
        } else {
            false
        }
    }

    /// Force a frame on the next check (decisions, match end)
    pub fn force_next(&mut self) {
        self.ticks_since_frame = self.frame_interval;
    }

    pub fn build(&self, tick: u64, dispatcher: &Dispatcher) -> RenderFrame {
        let role = dispatcher.role();

        let players = PlayerId::ALL
            .into_iter()
            .map(|id| {
                let p = dispatcher.ledger().get(id);
                HudState {
                    player: id,
                    health: p.health,
                    death_count: p.death_count,
                    ammo: p.ammo,
                    grenades: p.grenades,
                    shield_count: p.shield_count,
                    shield_health: p.shield_health,
                    shield_active: p.shield_active,
                    shield_time_remaining: p.shield_time_remaining(),
                    shield_cooldown_active: p.shield_cooldown_active,
                    shield_cooldown_remaining: p.shield_cooldown_remaining(),
                }
            })
            .collect();

        let attacks = dispatcher
            .attacks()
            .iter()
            .map(|a| AttackView {
                activation_id: a.activation_id(),
                launches: a.launches(),
                kind: a.kind(),
                attacker: a.attacker(),
                target: a.target(),
                presentation: role.presentation(a.attacker()),
                phase: a.phase(),
                outcome: a.outcome(),
                progress: a.progress(),
                explosion: a.explosion(),
            })
            .collect();

        RenderFrame {
            tick,
            at: Utc::now(),
            phase: dispatcher.phase(),
            local_role: role.local_role(),
            opponent_visible: dispatcher.opponent_visible(),
            players,
            attacks,
            status: dispatcher.status().view(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn player_json(action: &str) -> Value {
        json!({
            "hp": 90, "action": action, "util_empty": false, "bullets": 5,
            "grenades": 1, "shield_time": 7, "shield_health": 30,
            "num_deaths": 1, "num_shield": 2
        })
    }

    #[test]
    fn parses_a_full_snapshot() {
        let text = json!({ "p1": player_json("shoot"), "p2": player_json("") }).to_string();
        let FeedMsg::Snapshot(snapshot) = parse_feed(&text).unwrap() else {
            panic!("expected a snapshot");
        };

        let p1 = snapshot.get(PlayerId::One);
        assert_eq!(p1.health, 90);
        assert_eq!(p1.action, Action::Shoot);
        assert_eq!(p1.ammo, 5);
        assert_eq!(p1.shield_elapsed(), 3.0);
        assert_eq!(snapshot.get(PlayerId::Two).action, Action::None);
    }

    #[test]
    fn missing_field_rejects_whole_snapshot() {
        let mut p2 = player_json("grenade");
        p2.as_object_mut().unwrap().remove("bullets");
        let text = json!({ "p1": player_json("shoot"), "p2": p2 }).to_string();
        assert!(matches!(parse_feed(&text), Err(SnapshotError::Json(_))));
    }

    #[test]
    fn mistyped_field_rejects_whole_snapshot() {
        let mut p1 = player_json("shoot");
        p1["util_empty"] = json!("no");
        let text = json!({ "p1": p1, "p2": player_json("") }).to_string();
        assert!(parse_feed(&text).is_err());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut p1 = player_json("shoot");
        p1["shield_time"] = json!(12);
        let text = json!({ "p1": p1, "p2": player_json("") }).to_string();
        assert!(matches!(
            parse_feed(&text),
            Err(SnapshotError::OutOfRange {
                field: "shield_time",
                ..
            })
        ));

        let mut p2 = player_json("");
        p2["grenades"] = json!(-1);
        let text = json!({ "p1": player_json(""), "p2": p2 }).to_string();
        assert!(matches!(
            parse_feed(&text),
            Err(SnapshotError::OutOfRange {
                field: "grenades",
                ..
            })
        ));
    }

    #[test]
    fn unknown_action_is_accepted_as_no_op() {
        let text = json!({ "p1": player_json("moonwalk"), "p2": player_json("") }).to_string();
        let FeedMsg::Snapshot(snapshot) = parse_feed(&text).unwrap() else {
            panic!("expected a snapshot");
        };
        assert_eq!(snapshot.get(PlayerId::One).action, Action::None);
    }

    #[test]
    fn parses_status_updates() {
        let text = json!({
            "p1_turn_complete": true, "p1_action": "shoot",
            "p2_turn_complete": false, "p2_action": ""
        })
        .to_string();
        let FeedMsg::Status(status) = parse_feed(&text).unwrap() else {
            panic!("expected a status update");
        };
        assert!(status.turn_complete(PlayerId::One));
        assert_eq!(status.action(PlayerId::One), Action::Shoot);
    }

    #[test]
    fn rejects_unknown_shapes() {
        assert!(matches!(parse_feed("{\"hello\":1}"), Err(SnapshotError::UnknownShape)));
        assert!(matches!(parse_feed("not json"), Err(SnapshotError::Json(_))));
    }

    #[test]
    fn frame_builder_respects_interval() {
        let mut builder = FrameBuilder::new(2);
        assert!(!builder.should_send());
        assert!(builder.should_send());
        assert!(!builder.should_send());
        builder.force_next();
        assert!(builder.should_send());
    }
}
