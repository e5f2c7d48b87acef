//! Attack event state machine shared by beams and grenades.
//!
//! The hit/miss decision is taken once, on the first tick after launch, and
//! held for the rest of the activation. Flight and settling only drive a
//! progress value for the renderer.

use serde::Serialize;
use uuid::Uuid;

use crate::util::time::reached;

use super::combat::{WeaponKind, WeaponStats};
use super::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackPhase {
    Idle,
    /// In flight, outcome committed after the first tick
    Resolving,
    /// Post-impact cue (grenade explosion)
    Settling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Hit,
    Miss,
}

/// One attacker/weapon pairing, re-armed for every launch
#[derive(Debug, Clone)]
pub struct AttackEvent {
    attacker: PlayerId,
    kind: WeaponKind,
    phase: AttackPhase,
    outcome: Option<Outcome>,
    elapsed: f64,
    duration: f64,
    settle_elapsed: f64,
    settle_duration: f64,
    activation_id: Option<Uuid>,
    launches: u64,
}

impl AttackEvent {
    pub fn new(attacker: PlayerId, kind: WeaponKind) -> Self {
        Self {
            attacker,
            kind,
            phase: AttackPhase::Idle,
            outcome: None,
            elapsed: 0.0,
            duration: 0.0,
            settle_elapsed: 0.0,
            settle_duration: 0.0,
            activation_id: None,
            launches: 0,
        }
    }

    pub fn attacker(&self) -> PlayerId {
        self.attacker
    }

    pub fn target(&self) -> PlayerId {
        self.attacker.other()
    }

    pub fn kind(&self) -> WeaponKind {
        self.kind
    }

    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_idle(&self) -> bool {
        self.phase == AttackPhase::Idle
    }

    /// Identifier of the current (or last) activation
    pub fn activation_id(&self) -> Option<Uuid> {
        self.activation_id
    }

    /// Number of accepted launches so far
    pub fn launches(&self) -> u64 {
        self.launches
    }

    /// Explosion cue is showing
    pub fn explosion(&self) -> bool {
        self.phase == AttackPhase::Settling && self.kind == WeaponKind::Grenade
    }

    /// Normalized flight progress in [0, 1]
    pub fn progress(&self) -> f64 {
        match self.phase {
            AttackPhase::Idle => 0.0,
            AttackPhase::Resolving if self.duration > 0.0 => {
                (self.elapsed / self.duration).clamp(0.0, 1.0)
            }
            AttackPhase::Resolving => 0.0,
            AttackPhase::Settling => 1.0,
        }
    }

    /// Start a new activation. Ignored unless idle.
    pub fn launch(&mut self) -> bool {
        if self.phase != AttackPhase::Idle {
            return false;
        }

        let stats = WeaponStats::for_kind(self.kind);
        self.phase = AttackPhase::Resolving;
        self.outcome = None;
        self.elapsed = 0.0;
        self.duration = stats.flight_duration;
        self.settle_elapsed = 0.0;
        self.settle_duration = stats.settle_duration;
        self.activation_id = Some(Uuid::new_v4());
        self.launches += 1;
        true
    }

    /// Advance by one tick. `acquired` is only consulted on the decision
    /// tick; returns the outcome on that tick and `None` otherwise.
    pub fn tick(&mut self, dt: f64, acquired: impl FnOnce() -> bool) -> Option<Outcome> {
        match self.phase {
            AttackPhase::Idle => None,
            AttackPhase::Resolving => {
                let Some(outcome) = self.outcome else {
                    let outcome = if acquired() { Outcome::Hit } else { Outcome::Miss };
                    self.outcome = Some(outcome);
                    return Some(outcome);
                };

                self.elapsed += dt;
                if reached(self.elapsed, self.duration) {
                    self.elapsed = self.duration;
                    if outcome == Outcome::Hit && self.settle_duration > 0.0 {
                        self.phase = AttackPhase::Settling;
                        self.settle_elapsed = 0.0;
                    } else {
                        self.phase = AttackPhase::Idle;
                    }
                }
                None
            }
            AttackPhase::Settling => {
                self.settle_elapsed += dt;
                if reached(self.settle_elapsed, self.settle_duration) {
                    self.phase = AttackPhase::Idle;
                }
                None
            }
        }
    }
}
