//! Per-player resource ledger: health, ammo, grenades and shield charges

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::util::time::reached;

use super::combat::{resolve_hit, HitResult};
use super::shield::{self, ShieldTransition};
use super::PlayerId;

pub const MAX_HEALTH: i32 = 100;
pub const MAX_AMMO: i32 = 6;
pub const MAX_SHIELD_HEALTH: i32 = 30;
/// Seconds a shield stays up
pub const SHIELD_DURATION: f64 = 10.0;
/// Seconds before a shield can be raised again after it drops
pub const SHIELD_COOLDOWN: f64 = 10.0;

/// What `consume_ammo` does when the magazine underflows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmmoPolicy {
    /// Reload to a full magazine
    #[default]
    Wrap,
    /// Stay empty until a snapshot refills it
    Hold,
}

impl FromStr for AmmoPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wrap" => Ok(AmmoPolicy::Wrap),
            "hold" => Ok(AmmoPolicy::Hold),
            _ => Err(()),
        }
    }
}

/// Match-start resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loadout {
    pub health: i32,
    pub ammo: i32,
    pub grenades: u32,
    pub shield_count: u32,
}

impl Default for Loadout {
    fn default() -> Self {
        Self {
            health: MAX_HEALTH,
            ammo: MAX_AMMO,
            grenades: 2,
            shield_count: 3,
        }
    }
}

/// Resource state for one player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerState {
    pub health: i32,
    pub death_count: u32,
    pub ammo: i32,
    pub grenades: u32,
    /// Shield uses remaining
    pub shield_count: u32,
    pub shield_health: i32,
    pub shield_active: bool,
    /// Seconds the current shield has been up (counts up)
    pub shield_elapsed: f64,
    pub shield_cooldown_elapsed: f64,
    pub shield_cooldown_active: bool,
}

impl PlayerState {
    pub fn new(loadout: &Loadout) -> Self {
        Self {
            health: loadout.health.clamp(1, MAX_HEALTH),
            death_count: 0,
            ammo: loadout.ammo.clamp(0, MAX_AMMO),
            grenades: loadout.grenades,
            shield_count: loadout.shield_count,
            shield_health: MAX_SHIELD_HEALTH,
            shield_active: false,
            shield_elapsed: 0.0,
            shield_cooldown_elapsed: 0.0,
            shield_cooldown_active: false,
        }
    }

    /// Seconds left on the current shield, as the server counts it
    pub fn shield_time_remaining(&self) -> f64 {
        if self.shield_active {
            (SHIELD_DURATION - self.shield_elapsed).max(0.0)
        } else {
            0.0
        }
    }

    pub fn shield_cooldown_remaining(&self) -> f64 {
        if self.shield_cooldown_active {
            (SHIELD_COOLDOWN - self.shield_cooldown_elapsed).max(0.0)
        } else {
            0.0
        }
    }
}

/// Where the charge for a shield activation comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShieldCharge {
    /// Spend one of the locally tracked charges
    Local,
    /// Already spent by the authoritative source (trusted `util_empty`)
    Upstream,
}

/// Resource ledger for both players
#[derive(Debug, Clone)]
pub struct Ledger {
    players: [PlayerState; 2],
    ammo_policy: AmmoPolicy,
}

impl Ledger {
    pub fn new(loadout: &Loadout, ammo_policy: AmmoPolicy) -> Self {
        Self {
            players: [PlayerState::new(loadout), PlayerState::new(loadout)],
            ammo_policy,
        }
    }

    pub fn get(&self, id: PlayerId) -> &PlayerState {
        &self.players[id.index()]
    }

    #[cfg(test)]
    pub(crate) fn players(&self) -> &[PlayerState; 2] {
        &self.players
    }

    #[cfg(test)]
    pub(crate) fn get_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        &mut self.players[id.index()]
    }

    /// Authoritative overwrite of consumable resources
    pub fn apply_snapshot(
        &mut self,
        id: PlayerId,
        ammo: i32,
        grenades: u32,
        shield_count: u32,
        shield_health: i32,
        shield_elapsed: f64,
    ) {
        let player = &mut self.players[id.index()];
        player.ammo = ammo;
        player.grenades = grenades;
        player.shield_count = shield_count;
        player.shield_health = shield_health;
        player.shield_elapsed = shield_elapsed;
    }

    /// Authoritative overwrite of health and death count
    pub fn sync_vitals(&mut self, id: PlayerId, health: i32, death_count: u32) {
        let player = &mut self.players[id.index()];
        player.health = health;
        player.death_count = death_count;
    }

    pub fn consume_ammo(&mut self, id: PlayerId) {
        let policy = self.ammo_policy;
        let player = &mut self.players[id.index()];
        player.ammo -= 1;
        if player.ammo < 0 {
            player.ammo = match policy {
                AmmoPolicy::Wrap => MAX_AMMO,
                AmmoPolicy::Hold => 0,
            };
        }
        debug!(player = %id, ammo = player.ammo, "Ammo consumed");
    }

    pub fn consume_grenade(&mut self, id: PlayerId) {
        let player = &mut self.players[id.index()];
        if player.grenades > 0 {
            player.grenades -= 1;
        }
    }

    /// Raise a shield by spending a local charge
    pub fn consume_shield_charge(&mut self, id: PlayerId) -> bool {
        self.try_activate_shield(id, ShieldCharge::Local)
    }

    /// The single gate for raising a shield. Rejected while a shield is up
    /// or cooling down, and (for local charges) when none are left.
    pub fn try_activate_shield(&mut self, id: PlayerId, charge: ShieldCharge) -> bool {
        let player = &mut self.players[id.index()];
        if player.shield_active || player.shield_cooldown_active {
            debug!(player = %id, "Shield activation rejected");
            return false;
        }

        match charge {
            ShieldCharge::Local => {
                if player.shield_count == 0 {
                    debug!(player = %id, "No shield charges left");
                    return false;
                }
                player.shield_count -= 1;
            }
            ShieldCharge::Upstream => {}
        }

        player.shield_active = true;
        // A finished countdown carried over from a snapshot would expire the
        // new shield on its first tick.
        if reached(player.shield_elapsed, SHIELD_DURATION) {
            player.shield_elapsed = 0.0;
        }
        debug!(player = %id, charges = player.shield_count, "Shield raised");
        true
    }

    /// Resolve and apply a hit to the defender
    pub fn apply_hit(&mut self, defender: PlayerId, raw_damage: i32) -> HitResult {
        let player = &mut self.players[defender.index()];
        let result = resolve_hit(player, raw_damage);
        player.health = result.health;
        player.shield_health = result.shield_health;
        if result.death_occurred {
            player.death_count += 1;
        }
        result
    }

    /// Advance both shield timers by one tick
    pub fn advance_shields(&mut self, dt: f64) -> Vec<(PlayerId, ShieldTransition)> {
        PlayerId::ALL
            .into_iter()
            .filter_map(|id| shield::advance(&mut self.players[id.index()], dt).map(|t| (id, t)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(policy: AmmoPolicy) -> Ledger {
        Ledger::new(&Loadout::default(), policy)
    }

    #[test]
    fn wrap_policy_reloads_on_underflow() {
        let mut ledger = ledger(AmmoPolicy::Wrap);
        ledger.apply_snapshot(PlayerId::One, 1, 2, 3, 30, 0.0);
        ledger.consume_ammo(PlayerId::One);
        assert_eq!(ledger.get(PlayerId::One).ammo, 0);
        ledger.consume_ammo(PlayerId::One);
        assert_eq!(ledger.get(PlayerId::One).ammo, MAX_AMMO);
    }

    #[test]
    fn hold_policy_stays_empty() {
        let mut ledger = ledger(AmmoPolicy::Hold);
        ledger.apply_snapshot(PlayerId::Two, 0, 2, 3, 30, 0.0);
        ledger.consume_ammo(PlayerId::Two);
        assert_eq!(ledger.get(PlayerId::Two).ammo, 0);
    }

    #[test]
    fn grenades_never_go_negative() {
        let mut ledger = ledger(AmmoPolicy::Wrap);
        ledger.consume_grenade(PlayerId::One);
        ledger.consume_grenade(PlayerId::One);
        ledger.consume_grenade(PlayerId::One);
        assert_eq!(ledger.get(PlayerId::One).grenades, 0);
        assert_eq!(ledger.get(PlayerId::Two).grenades, 2);
    }

    #[test]
    fn shield_gate_spends_one_charge() {
        let mut ledger = ledger(AmmoPolicy::Wrap);
        assert!(ledger.consume_shield_charge(PlayerId::One));
        assert!(ledger.get(PlayerId::One).shield_active);
        assert_eq!(ledger.get(PlayerId::One).shield_count, 2);

        // Already up
        assert!(!ledger.consume_shield_charge(PlayerId::One));
        assert_eq!(ledger.get(PlayerId::One).shield_count, 2);
    }

    #[test]
    fn shield_gate_rejects_without_charges() {
        let mut ledger = ledger(AmmoPolicy::Wrap);
        ledger.apply_snapshot(PlayerId::Two, 6, 2, 0, 30, 0.0);
        assert!(!ledger.consume_shield_charge(PlayerId::Two));
        assert!(!ledger.get(PlayerId::Two).shield_active);
    }

    #[test]
    fn shield_gate_rejects_during_cooldown_for_any_count() {
        for count in 1..=5 {
            let mut ledger = ledger(AmmoPolicy::Wrap);
            ledger.apply_snapshot(PlayerId::One, 6, 2, count, 30, 0.0);
            ledger.get_mut(PlayerId::One).shield_cooldown_active = true;
            assert!(!ledger.consume_shield_charge(PlayerId::One));
            assert!(!ledger.try_activate_shield(PlayerId::One, ShieldCharge::Upstream));
            assert_eq!(ledger.get(PlayerId::One).shield_count, count);
            assert!(!ledger.get(PlayerId::One).shield_active);
        }
    }

    #[test]
    fn upstream_activation_keeps_count() {
        let mut ledger = ledger(AmmoPolicy::Wrap);
        ledger.apply_snapshot(PlayerId::One, 6, 2, 0, 30, 0.0);
        assert!(ledger.try_activate_shield(PlayerId::One, ShieldCharge::Upstream));
        assert_eq!(ledger.get(PlayerId::One).shield_count, 0);
    }

    #[test]
    fn activation_resets_a_finished_countdown() {
        let mut ledger = ledger(AmmoPolicy::Wrap);
        ledger.apply_snapshot(PlayerId::One, 6, 2, 3, 30, SHIELD_DURATION);
        assert!(ledger.consume_shield_charge(PlayerId::One));
        assert_eq!(ledger.get(PlayerId::One).shield_elapsed, 0.0);
    }

    #[test]
    fn snapshot_overwrites_local_consumption() {
        let mut ledger = ledger(AmmoPolicy::Wrap);
        ledger.consume_ammo(PlayerId::One);
        ledger.consume_grenade(PlayerId::One);
        ledger.apply_snapshot(PlayerId::One, 4, 1, 2, 25, 3.0);
        ledger.sync_vitals(PlayerId::One, 70, 2);

        let p1 = ledger.get(PlayerId::One);
        assert_eq!(p1.ammo, 4);
        assert_eq!(p1.grenades, 1);
        assert_eq!(p1.shield_count, 2);
        assert_eq!(p1.shield_health, 25);
        assert_eq!(p1.shield_elapsed, 3.0);
        assert_eq!(p1.health, 70);
        assert_eq!(p1.death_count, 2);
    }

    #[test]
    fn lethal_hit_counts_a_death() {
        let mut ledger = ledger(AmmoPolicy::Wrap);
        ledger.sync_vitals(PlayerId::Two, 20, 1);
        let result = ledger.apply_hit(PlayerId::Two, 20);
        assert!(result.death_occurred);
        assert_eq!(ledger.get(PlayerId::Two).health, MAX_HEALTH);
        assert_eq!(ledger.get(PlayerId::Two).death_count, 2);
    }
}
