//! Streak bonus multiplier.
//!
//! Maps a member's consecutive-completion streak to the factor applied to a
//! base reward. Short streaks sit on 3-day plateaus (1.0, 1.3, 1.6); from 9
//! days on the bonus grows by 0.3 every further 3 days with no ceiling.

/// Streak length at which the open-ended top tier starts.
pub const TOP_TIER_START: i64 = 9;

/// Days per tier step.
const TIER_WIDTH: i64 = 3;

/// Multiplier for a streak, in tenths, at the start of the top tier.
const TOP_TIER_BASE_TENTHS: u64 = 19;

/// Growth per tier step, in tenths.
const TIER_STEP_TENTHS: u64 = 3;

/// Reward multiplier for a streak of `streak` consecutive completions.
///
/// Total over every `i64`: zero and negative streaks earn no bonus.
///
/// ```
/// use avolve_core::rewards::streak_bonus_multiplier;
///
/// assert_eq!(streak_bonus_multiplier(-5), 1.0);
/// assert_eq!(streak_bonus_multiplier(3), 1.3);
/// assert_eq!(streak_bonus_multiplier(12), 2.2);
/// assert_eq!(streak_bonus_multiplier(30), 4.0);
/// ```
pub fn streak_bonus_multiplier(streak: i64) -> f64 {
    match streak {
        i64::MIN..=0 => 1.0,
        1..=2 => 1.0,
        3..=5 => 1.3,
        6..=8 => 1.6,
        _ => {
            // streak >= 9, so the subtraction cannot underflow.
            let steps = ((streak - TOP_TIER_START) / TIER_WIDTH) as u64;
            let tenths = TOP_TIER_BASE_TENTHS + steps * TIER_STEP_TENTHS;
            tenths as f64 / 10.0
        }
    }
}

/// Scale `base` by the streak multiplier, rounding half away from zero.
///
/// Non-positive bases are returned unchanged; the bonus only ever grows a
/// credit.
pub fn apply_streak_bonus(base: i64, streak: i64) -> i64 {
    if base <= 0 {
        return base;
    }
    let scaled = (base as f64 * streak_bonus_multiplier(streak)).round();
    if scaled >= i64::MAX as f64 {
        i64::MAX
    } else {
        scaled as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_literal_scenarios() {
        assert_eq!(streak_bonus_multiplier(-5), 1.0);
        assert_eq!(streak_bonus_multiplier(0), 1.0);
        assert_eq!(streak_bonus_multiplier(2), 1.0);
        assert_eq!(streak_bonus_multiplier(3), 1.3);
        assert_eq!(streak_bonus_multiplier(8), 1.6);
        assert_eq!(streak_bonus_multiplier(9), 1.9);
        assert_eq!(streak_bonus_multiplier(12), 2.2);
        assert_eq!(streak_bonus_multiplier(30), 4.0);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(streak_bonus_multiplier(1), 1.0);
        assert_eq!(streak_bonus_multiplier(5), 1.3);
        assert_eq!(streak_bonus_multiplier(6), 1.6);
        assert_eq!(streak_bonus_multiplier(10), 1.9);
        assert_eq!(streak_bonus_multiplier(11), 1.9);
        assert_eq!(streak_bonus_multiplier(13), 2.2);
        assert_eq!(streak_bonus_multiplier(14), 2.2);
        assert_eq!(streak_bonus_multiplier(15), 2.5);
        assert_eq!(streak_bonus_multiplier(17), 2.5);
    }

    #[test]
    fn test_extreme_inputs_are_finite() {
        assert_eq!(streak_bonus_multiplier(i64::MIN), 1.0);
        let top = streak_bonus_multiplier(i64::MAX);
        assert!(top.is_finite());
        assert!(top > 1.0e17);
    }

    #[test]
    fn test_apply_streak_bonus() {
        assert_eq!(apply_streak_bonus(100, 0), 100);
        assert_eq!(apply_streak_bonus(100, 3), 130);
        assert_eq!(apply_streak_bonus(100, 12), 220);
        assert_eq!(apply_streak_bonus(10, 30), 40);
        // 5 * 1.3 = 6.5 rounds up
        assert_eq!(apply_streak_bonus(5, 4), 7);
    }

    #[test]
    fn test_apply_streak_bonus_leaves_non_positive_base() {
        assert_eq!(apply_streak_bonus(0, 20), 0);
        assert_eq!(apply_streak_bonus(-10, 20), -10);
    }

    #[test]
    fn test_apply_streak_bonus_saturates() {
        assert_eq!(apply_streak_bonus(i64::MAX, 9), i64::MAX);
    }

    proptest! {
        #[test]
        fn no_bonus_up_to_two(s in i64::MIN..=2) {
            prop_assert_eq!(streak_bonus_multiplier(s), 1.0);
        }

        #[test]
        fn plateau_three_to_five(s in 3i64..=5) {
            prop_assert_eq!(streak_bonus_multiplier(s), 1.3);
        }

        #[test]
        fn plateau_six_to_eight(s in 6i64..=8) {
            prop_assert_eq!(streak_bonus_multiplier(s), 1.6);
        }

        #[test]
        fn top_tier_matches_formula(s in 9i64..1_000_000) {
            let expected = 1.9 + ((s - 9) / 3) as f64 * 0.3;
            prop_assert!((streak_bonus_multiplier(s) - expected).abs() < 1e-9);
        }

        #[test]
        fn non_decreasing(a in any::<i64>(), b in any::<i64>()) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(streak_bonus_multiplier(lo) <= streak_bonus_multiplier(hi));
        }

        #[test]
        fn always_finite_and_at_least_one(s in any::<i64>()) {
            let m = streak_bonus_multiplier(s);
            prop_assert!(m.is_finite());
            prop_assert!(m >= 1.0);
        }
    }
}
