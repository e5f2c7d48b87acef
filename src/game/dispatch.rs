//! Role-relative dispatcher: applies authoritative snapshots and drives the
//! shield timers and attack events tick by tick.

use tracing::{debug, info};

use crate::ws::protocol::{Action, LocalAction, Notification, StatusMsg};

use super::combat::{WeaponKind, WeaponStats};
use super::ledger::{Ledger, ShieldCharge};
use super::projectile::{AttackEvent, Outcome};
use super::r#match::MatchPhase;
use super::role::RoleAssignment;
use super::shield::ShieldTransition;
use super::snapshot::Snapshot;
use super::status::TurnStatus;
use super::PlayerId;

/// Slot of an attack event in the dispatcher's table
fn slot(attacker: PlayerId, kind: WeaponKind) -> usize {
    attacker.index() * WeaponKind::ALL.len() + kind.index()
}

/// Owns both players' state and all four attack events
pub struct Dispatcher {
    role: RoleAssignment,
    ledger: Ledger,
    attacks: [AttackEvent; 4],
    /// Opponent is tracked by the local camera. Every attack, outgoing or
    /// incoming, decides its outcome from this one signal.
    opponent_visible: bool,
    phase: MatchPhase,
    status: TurnStatus,
    /// Apply local damage on a committed hit
    predict_damage: bool,
    outbox: Vec<Notification>,
}

impl Dispatcher {
    pub fn new(role: RoleAssignment, ledger: Ledger, predict_damage: bool) -> Self {
        Self {
            role,
            ledger,
            attacks: [
                AttackEvent::new(PlayerId::One, WeaponKind::Beam),
                AttackEvent::new(PlayerId::One, WeaponKind::Grenade),
                AttackEvent::new(PlayerId::Two, WeaponKind::Beam),
                AttackEvent::new(PlayerId::Two, WeaponKind::Grenade),
            ],
            opponent_visible: false,
            phase: MatchPhase::Waiting,
            status: TurnStatus::new(),
            predict_damage,
            outbox: Vec::new(),
        }
    }

    pub fn role(&self) -> &RoleAssignment {
        &self.role
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn attacks(&self) -> &[AttackEvent; 4] {
        &self.attacks
    }

    pub fn attack(&self, attacker: PlayerId, kind: WeaponKind) -> &AttackEvent {
        &self.attacks[slot(attacker, kind)]
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn status(&self) -> &TurnStatus {
        &self.status
    }

    /// No attack is in flight or settling
    pub fn is_settled(&self) -> bool {
        self.attacks.iter().all(AttackEvent::is_idle)
    }

    /// Take the notifications produced since the last call
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    /// Apply one authoritative snapshot. Resources are overwritten before
    /// any action is dispatched.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        if self.phase == MatchPhase::Ended {
            debug!("Match ended, ignoring snapshot");
            return;
        }
        if self.phase == MatchPhase::Waiting {
            info!(local_role = %self.role.local_role(), "First snapshot received, match in progress");
            self.phase = MatchPhase::InProgress;
        }

        for id in PlayerId::ALL {
            let p = snapshot.get(id);
            self.ledger.sync_vitals(id, p.health, p.death_count);
            self.ledger.apply_snapshot(
                id,
                p.ammo,
                p.grenades,
                p.shield_count,
                p.shield_health,
                p.shield_elapsed(),
            );
        }

        for id in PlayerId::ALL {
            let p = snapshot.get(id);
            if p.action == Action::Shoot && !p.util_empty {
                self.launch(id, WeaponKind::Beam);
            }
        }

        for id in PlayerId::ALL {
            let p = snapshot.get(id);
            if p.action == Action::Grenade && !p.util_empty {
                self.launch(id, WeaponKind::Grenade);
            }
        }

        for id in PlayerId::ALL {
            let p = snapshot.get(id);
            if p.action == Action::Shield && !p.util_empty {
                self.ledger.try_activate_shield(id, ShieldCharge::Upstream);
            }
        }

        if PlayerId::ALL
            .into_iter()
            .any(|id| snapshot.get(id).action == Action::Logout)
        {
            self.end_match();
        }
    }

    /// Launch an attack; a launch while the same event is busy is dropped
    pub fn launch(&mut self, attacker: PlayerId, kind: WeaponKind) -> bool {
        let launched = self.attacks[slot(attacker, kind)].launch();
        if launched {
            info!(
                attacker = %attacker,
                kind = ?kind,
                presentation = ?self.role.presentation(attacker),
                "Attack launched"
            );
        } else {
            debug!(attacker = %attacker, kind = ?kind, "Attack already in flight, launch ignored");
        }
        launched
    }

    /// Update the acquisition signal. Only the opponent can be tracked by
    /// the local camera; signals for the local player are ignored.
    pub fn set_target_acquired(&mut self, player: PlayerId, acquired: bool) {
        if player != self.role.opponent() {
            debug!(player = %player, "Acquisition signal for the local player ignored");
            return;
        }
        if self.opponent_visible == acquired {
            return;
        }
        self.opponent_visible = acquired;
        self.outbox.push(Notification::OpponentVisibility {
            topic: self.role.screen_topic(acquired),
        });
    }

    pub fn opponent_visible(&self) -> bool {
        self.opponent_visible
    }

    /// Practice action for the local player
    pub fn local_action(&mut self, action: LocalAction) {
        if self.phase == MatchPhase::Ended {
            return;
        }

        let local = self.role.local_role();
        match action {
            LocalAction::Shoot => {
                self.ledger.consume_ammo(local);
                self.launch(local, WeaponKind::Beam);
            }
            LocalAction::Grenade => {
                if self.ledger.get(local).grenades > 0
                    && self.attack(local, WeaponKind::Grenade).is_idle()
                {
                    self.ledger.consume_grenade(local);
                    self.launch(local, WeaponKind::Grenade);
                }
            }
            LocalAction::Shield => {
                self.ledger.consume_shield_charge(local);
            }
        }
    }

    pub fn apply_status(&mut self, msg: &StatusMsg) {
        self.status.apply(&self.role, msg);
    }

    /// Advance shields, attacks and the status line by `dt` seconds
    pub fn tick(&mut self, dt: f64) {
        for (id, transition) in self.ledger.advance_shields(dt) {
            match transition {
                ShieldTransition::Expired { destroyed } => {
                    debug!(player = %id, destroyed, "Shield dropped, cooldown started")
                }
                ShieldTransition::Recharged => debug!(player = %id, "Shield recharged"),
            }
        }

        let visible = self.opponent_visible;
        for i in 0..self.attacks.len() {
            if let Some(outcome) = self.attacks[i].tick(dt, || visible) {
                self.commit(i, outcome);
            }
        }

        self.status.tick(dt);
    }

    fn commit(&mut self, index: usize, outcome: Outcome) {
        let attack = &self.attacks[index];
        let (attacker, target, kind) = (attack.attacker(), attack.target(), attack.kind());

        if outcome == Outcome::Hit && self.predict_damage {
            let result = self.ledger.apply_hit(target, WeaponStats::for_kind(kind).damage);
            info!(
                attacker = %attacker,
                target = %target,
                kind = ?kind,
                health = result.health,
                shield_health = result.shield_health,
                death = result.death_occurred,
                "Hit applied"
            );
        } else {
            info!(attacker = %attacker, target = %target, kind = ?kind, outcome = ?outcome, "Attack decided");
        }

        if kind == WeaponKind::Grenade {
            self.outbox.push(Notification::GrenadeResult {
                attacker,
                defender: target,
                hit: outcome == Outcome::Hit,
            });
        }
    }

    fn end_match(&mut self) {
        if self.phase == MatchPhase::Ended {
            return;
        }
        self.phase = MatchPhase::Ended;
        self.outbox.push(Notification::MatchEnded);
        info!("Logout received, match ended");
    }
}
