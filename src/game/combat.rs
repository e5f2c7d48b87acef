//! Combat system - weapon stats and damage resolution

use serde::{Deserialize, Serialize};

use super::ledger::{PlayerState, MAX_HEALTH};

/// Damage dealt by a beam that lands
pub const BEAM_DAMAGE: i32 = 10;
/// Damage dealt by a grenade that lands
pub const GRENADE_DAMAGE: i32 = 20;

/// Weapon kinds that produce an attack event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    /// Gun shot, rendered as a straight laser
    Beam,
    /// Thrown grenade, rendered as an arc
    Grenade,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 2] = [WeaponKind::Beam, WeaponKind::Grenade];

    pub fn index(self) -> usize {
        match self {
            WeaponKind::Beam => 0,
            WeaponKind::Grenade => 1,
        }
    }
}

/// Weapon stats per kind
#[derive(Debug, Clone, Copy)]
pub struct WeaponStats {
    /// Damage per hit
    pub damage: i32,
    /// Flight time from launch to impact (seconds)
    pub flight_duration: f64,
    /// Post-impact cue time on a hit (seconds)
    pub settle_duration: f64,
}

impl WeaponStats {
    pub fn for_kind(kind: WeaponKind) -> Self {
        match kind {
            WeaponKind::Beam => Self {
                damage: BEAM_DAMAGE,
                flight_duration: 0.5,
                settle_duration: 0.0,
            },
            WeaponKind::Grenade => Self {
                damage: GRENADE_DAMAGE,
                flight_duration: 2.0,
                settle_duration: 2.0,
            },
        }
    }
}

/// Result of resolving one hit against a defender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitResult {
    pub health: i32,
    pub shield_health: i32,
    pub death_occurred: bool,
}

/// Resolve a hit against the defender without mutating it.
///
/// An active shield soaks damage first; whatever it cannot hold spills into
/// health. Dropping to zero respawns the defender at full health.
pub fn resolve_hit(defender: &PlayerState, raw_damage: i32) -> HitResult {
    let raw_damage = raw_damage.max(0);

    let (shield_health, health_damage) = if defender.shield_active {
        let shield = defender.shield_health.max(0);
        if shield >= raw_damage {
            (shield - raw_damage, 0)
        } else {
            (0, raw_damage - shield)
        }
    } else {
        (defender.shield_health, raw_damage)
    };

    let mut health = defender.health.saturating_sub(health_damage);
    let death_occurred = health_damage > 0 && health <= 0;
    if death_occurred {
        health = MAX_HEALTH;
    }

    HitResult {
        health,
        shield_health,
        death_occurred,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ledger::Loadout;

    fn defender(health: i32, shield_health: i32, shield_active: bool) -> PlayerState {
        let mut state = PlayerState::new(&Loadout::default());
        state.health = health;
        state.shield_health = shield_health;
        state.shield_active = shield_active;
        state
    }

    #[test]
    fn shield_absorbs_damage_it_can_hold() {
        for shield in [10, 15, 20, 30] {
            for damage in [BEAM_DAMAGE, GRENADE_DAMAGE] {
                if shield < damage {
                    continue;
                }
                let result = resolve_hit(&defender(80, shield, true), damage);
                assert_eq!(result.health, 80);
                assert_eq!(result.shield_health, shield - damage);
                assert!(!result.death_occurred);
            }
        }
    }

    #[test]
    fn overflow_spills_into_health() {
        for shield in [0, 1, 5, 9, 19] {
            for damage in [BEAM_DAMAGE, GRENADE_DAMAGE] {
                if shield >= damage {
                    continue;
                }
                let result = resolve_hit(&defender(90, shield, true), damage);
                assert_eq!(result.shield_health, 0);
                assert_eq!(result.health, 90 - (damage - shield));
            }
        }
    }

    #[test]
    fn weak_shield_beam_hit() {
        let result = resolve_hit(&defender(100, 5, true), BEAM_DAMAGE);
        assert_eq!(result.shield_health, 0);
        assert_eq!(result.health, 95);
        assert!(!result.death_occurred);
    }

    #[test]
    fn inactive_shield_takes_nothing() {
        let result = resolve_hit(&defender(50, 30, false), GRENADE_DAMAGE);
        assert_eq!(result.health, 30);
        assert_eq!(result.shield_health, 30);
    }

    #[test]
    fn lethal_hit_respawns_at_full_health() {
        let result = resolve_hit(&defender(10, 30, false), BEAM_DAMAGE);
        assert_eq!(result.health, MAX_HEALTH);
        assert!(result.death_occurred);

        let result = resolve_hit(&defender(5, 0, false), GRENADE_DAMAGE);
        assert_eq!(result.health, MAX_HEALTH);
        assert!(result.death_occurred);
    }

    #[test]
    fn health_never_left_at_or_below_zero() {
        let mut state = defender(100, 0, false);
        let mut deaths = 0;
        for step in 0..40 {
            let damage = if step % 3 == 0 { GRENADE_DAMAGE } else { BEAM_DAMAGE };
            let before = state.health;
            let result = resolve_hit(&state, damage);
            assert!(result.health > 0);
            if before - damage <= 0 {
                assert!(result.death_occurred);
                assert_eq!(result.health, MAX_HEALTH);
                deaths += 1;
            } else {
                assert!(!result.death_occurred);
            }
            state.health = result.health;
        }
        assert!(deaths > 0);
    }

    #[test]
    fn negative_damage_is_ignored() {
        let result = resolve_hit(&defender(70, 0, false), -15);
        assert_eq!(result.health, 70);
    }
}
