//! Shield timer: a 10 second active window followed by a 10 second cooldown

use crate::util::time::reached;

use super::ledger::{PlayerState, MAX_SHIELD_HEALTH, SHIELD_COOLDOWN, SHIELD_DURATION};

/// Notable shield timer transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShieldTransition {
    /// Shield dropped and cooldown started
    Expired {
        /// Dropped early because its health ran out
        destroyed: bool,
    },
    /// Cooldown finished, shield may be raised again
    Recharged,
}

/// Advance one player's shield timer by `dt` seconds
pub fn advance(state: &mut PlayerState, dt: f64) -> Option<ShieldTransition> {
    if state.shield_active {
        state.shield_elapsed += dt;

        let mut destroyed = false;
        if state.shield_health <= 0 && !reached(state.shield_elapsed, SHIELD_DURATION) {
            state.shield_health = MAX_SHIELD_HEALTH;
            state.shield_elapsed = SHIELD_DURATION;
            destroyed = true;
        }

        if reached(state.shield_elapsed, SHIELD_DURATION) {
            state.shield_active = false;
            state.shield_elapsed = 0.0;
            state.shield_health = MAX_SHIELD_HEALTH;
            state.shield_cooldown_active = true;
            state.shield_cooldown_elapsed = 0.0;
            return Some(ShieldTransition::Expired { destroyed });
        }
        return None;
    }

    if state.shield_cooldown_active {
        state.shield_cooldown_elapsed += dt;
        if reached(state.shield_cooldown_elapsed, SHIELD_COOLDOWN) {
            state.shield_cooldown_active = false;
            state.shield_cooldown_elapsed = 0.0;
            return Some(ShieldTransition::Recharged);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ledger::{AmmoPolicy, Ledger, Loadout};
    use crate::game::PlayerId;
    use crate::util::time::{tick_delta, SIMULATION_TPS};

    const DT: f64 = 0.5;

    fn run(ledger: &mut Ledger, seconds: f64) -> Vec<(PlayerId, ShieldTransition)> {
        let ticks = (seconds / DT) as usize;
        (0..ticks).flat_map(|_| ledger.advance_shields(DT)).collect()
    }

    #[test]
    fn shield_expires_after_ten_seconds() {
        let mut ledger = Ledger::new(&Loadout::default(), AmmoPolicy::Wrap);
        assert!(ledger.consume_shield_charge(PlayerId::One));

        let transitions = run(&mut ledger, 9.5);
        assert!(transitions.is_empty());
        assert!(ledger.get(PlayerId::One).shield_active);

        let transitions = run(&mut ledger, 0.5);
        assert_eq!(
            transitions,
            vec![(PlayerId::One, ShieldTransition::Expired { destroyed: false })]
        );

        let p1 = ledger.get(PlayerId::One);
        assert!(!p1.shield_active);
        assert!(p1.shield_cooldown_active);
        assert_eq!(p1.shield_health, MAX_SHIELD_HEALTH);
        assert_eq!(p1.shield_count, 2);
    }

    #[test]
    fn depleted_shield_drops_early_and_still_cools_down() {
        let mut ledger = Ledger::new(&Loadout::default(), AmmoPolicy::Wrap);
        assert!(ledger.consume_shield_charge(PlayerId::Two));
        run(&mut ledger, 2.0);
        ledger.apply_hit(PlayerId::Two, 30);
        assert_eq!(ledger.get(PlayerId::Two).shield_health, 0);

        let transitions = ledger.advance_shields(DT);
        assert_eq!(
            transitions,
            vec![(PlayerId::Two, ShieldTransition::Expired { destroyed: true })]
        );
        let p2 = ledger.get(PlayerId::Two);
        assert!(!p2.shield_active);
        assert!(p2.shield_cooldown_active);
        assert_eq!(p2.shield_health, MAX_SHIELD_HEALTH);
    }

    #[test]
    fn cooldown_blocks_then_releases_reactivation() {
        let mut ledger = Ledger::new(&Loadout::default(), AmmoPolicy::Wrap);
        assert!(ledger.consume_shield_charge(PlayerId::One));
        run(&mut ledger, 10.0);

        for _ in 0..19 {
            assert!(!ledger.consume_shield_charge(PlayerId::One));
            ledger.advance_shields(DT);
        }
        assert!(ledger.get(PlayerId::One).shield_cooldown_active);

        let transitions = ledger.advance_shields(DT);
        assert_eq!(transitions, vec![(PlayerId::One, ShieldTransition::Recharged)]);
        assert!(ledger.consume_shield_charge(PlayerId::One));
        assert_eq!(ledger.get(PlayerId::One).shield_count, 1);
    }

    #[test]
    fn windows_end_on_the_tenth_second_at_tick_rate() {
        let ticks = (SIMULATION_TPS * 10) as usize;
        let mut ledger = Ledger::new(&Loadout::default(), AmmoPolicy::Wrap);
        assert!(ledger.consume_shield_charge(PlayerId::One));

        for _ in 0..ticks - 1 {
            assert!(ledger.advance_shields(tick_delta()).is_empty());
        }
        assert!(ledger.get(PlayerId::One).shield_active);

        assert_eq!(
            ledger.advance_shields(tick_delta()),
            vec![(PlayerId::One, ShieldTransition::Expired { destroyed: false })]
        );
        let p1 = ledger.get(PlayerId::One);
        assert!(!p1.shield_active);
        assert!(p1.shield_cooldown_active);
        assert_eq!(p1.shield_health, MAX_SHIELD_HEALTH);
        assert_eq!(p1.shield_count, 2);

        for _ in 0..ticks - 1 {
            assert!(ledger.advance_shields(tick_delta()).is_empty());
        }
        assert_eq!(
            ledger.advance_shields(tick_delta()),
            vec![(PlayerId::One, ShieldTransition::Recharged)]
        );
    }

    #[test]
    fn active_and_cooldown_never_overlap() {
        let mut ledger = Ledger::new(&Loadout::default(), AmmoPolicy::Wrap);
        for step in 0..200 {
            if step % 7 == 0 {
                ledger.consume_shield_charge(PlayerId::One);
            }
            ledger.advance_shields(0.25);
            let p1 = ledger.get(PlayerId::One);
            assert!(!(p1.shield_active && p1.shield_cooldown_active));
        }
    }

    #[test]
    fn idle_shield_does_nothing() {
        let mut ledger = Ledger::new(&Loadout::default(), AmmoPolicy::Wrap);
        let before = ledger.get(PlayerId::One).clone();
        assert!(run(&mut ledger, 30.0).is_empty());
        assert_eq!(ledger.get(PlayerId::One), &before);
    }
}
