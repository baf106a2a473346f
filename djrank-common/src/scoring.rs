//! Scoring engine
//!
//! Pure mapping from a rubric to a score breakdown and a tier label.
//!
//! | Component | Rule | Range |
//! |-----------|------|-------|
//! | core | sum of the four criteria | 0 – 12 |
//! | bonus | +0.5 per bonus flag | 0 – 1.5 |
//! | penalty | -0.5 per penalty flag | -1.5 – 0 |
//! | total | core + bonus + penalty | -1.5 – 13.5 |
//!
//! All components are multiples of 0.5 and therefore exact in `f64`.

use serde::Serialize;

use crate::rubric::{Bonuses, Criteria, Penalties, Rubric};
use crate::tier::Tier;

/// Points per bonus flag
pub const BONUS_STEP: f64 = 0.5;

/// Points per penalty flag (subtracted)
pub const PENALTY_STEP: f64 = 0.5;

/// Tier ladder, checked top to bottom; first threshold met wins
pub const TIER_LADDER: [(f64, Tier); 6] = [
    (13.0, Tier::S),
    (11.0, Tier::A),
    (9.0, Tier::B),
    (7.0, Tier::C),
    (5.0, Tier::D),
    (3.0, Tier::E),
];

/// Score breakdown for one rubric
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub core: u8,
    pub bonus: f64,
    pub penalty: f64,
    pub total: f64,
}

impl Score {
    /// Tier suggested by this score
    pub fn tier(&self) -> Tier {
        tier_for_score(self.total)
    }
}

/// Compute the score breakdown
///
/// Criteria are already clamped to [0, 3] by construction, so this never
/// fails.
///
/// # Examples
///
/// ```
/// use djrank_common::rubric::{Bonuses, Criteria, Penalties};
/// use djrank_common::scoring::compute_score;
///
/// let score = compute_score(&Criteria::new(3, 3, 3, 3), &Bonuses::default(), &Penalties::default());
/// assert_eq!(score.core, 12);
/// assert_eq!(score.total, 12.0);
/// ```
pub fn compute_score(criteria: &Criteria, bonuses: &Bonuses, penalties: &Penalties) -> Score {
    let core = criteria.flow + criteria.vibes + criteria.visuals + criteria.creativity;
    let bonus = BONUS_STEP * bonuses.count() as f64;
    let penalty = -PENALTY_STEP * penalties.count() as f64;

    Score {
        core,
        bonus,
        penalty,
        total: core as f64 + bonus + penalty,
    }
}

/// Map a total score to a tier
///
/// Total over every `f64`: anything below 3.0, NaN included, is tier F.
///
/// # Examples
///
/// ```
/// use djrank_common::scoring::tier_for_score;
/// use djrank_common::Tier;
///
/// assert_eq!(tier_for_score(13.0), Tier::S);
/// assert_eq!(tier_for_score(12.99), Tier::A);
/// assert_eq!(tier_for_score(2.99), Tier::F);
/// ```
pub fn tier_for_score(total: f64) -> Tier {
    TIER_LADDER
        .iter()
        .find(|(threshold, _)| total >= *threshold)
        .map(|(_, tier)| *tier)
        .unwrap_or(Tier::F)
}

impl Rubric {
    pub fn score(&self) -> Score {
        compute_score(&self.criteria, &self.bonuses, &self.penalties)
    }

    pub fn suggested_tier(&self) -> Tier {
        self.score().tier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bonuses(n: usize) -> Bonuses {
        Bonuses {
            crowd_control: n > 0,
            signature_moment: n > 1,
            bold_risks: n > 2,
        }
    }

    fn penalties(n: usize) -> Penalties {
        Penalties {
            cliche_tracks: n > 0,
            overreliance: n > 1,
            poor_energy: n > 2,
        }
    }

    #[test]
    fn test_tier_ladder_boundaries() {
        assert_eq!(tier_for_score(13.0), Tier::S);
        assert_eq!(tier_for_score(12.99), Tier::A);
        assert_eq!(tier_for_score(11.0), Tier::A);
        assert_eq!(tier_for_score(10.99), Tier::B);
        assert_eq!(tier_for_score(9.0), Tier::B);
        assert_eq!(tier_for_score(7.0), Tier::C);
        assert_eq!(tier_for_score(5.0), Tier::D);
        assert_eq!(tier_for_score(3.0), Tier::E);
        assert_eq!(tier_for_score(2.99), Tier::F);
        assert_eq!(tier_for_score(0.0), Tier::F);
    }

    #[test]
    fn test_out_of_range_totals_follow_the_ladder() {
        assert_eq!(tier_for_score(-1.5), Tier::F);
        assert_eq!(tier_for_score(f64::NEG_INFINITY), Tier::F);
        assert_eq!(tier_for_score(f64::NAN), Tier::F);
        assert_eq!(tier_for_score(100.0), Tier::S);
    }

    #[test]
    fn test_perfect_core_no_flags_is_tier_a() {
        let score = compute_score(&Criteria::new(3, 3, 3, 3), &bonuses(0), &penalties(0));
        assert_eq!(score.core, 12);
        assert_eq!(score.bonus, 0.0);
        assert_eq!(score.penalty, 0.0);
        assert_eq!(score.total, 12.0);
        assert_eq!(score.tier(), Tier::A);
    }

    #[test]
    fn test_two_bonuses_one_penalty() {
        let score = compute_score(&Criteria::new(3, 3, 3, 3), &bonuses(2), &penalties(1));
        assert_eq!(score.bonus, 1.0);
        assert_eq!(score.penalty, -0.5);
        assert_eq!(score.total, 12.5);
        assert_eq!(score.tier(), Tier::A);
    }

    #[test]
    fn test_all_bonuses_reach_tier_s() {
        let score = compute_score(&Criteria::new(3, 3, 3, 3), &bonuses(3), &penalties(0));
        assert_eq!(score.bonus, 1.5);
        assert_eq!(score.total, 13.5);
        assert_eq!(score.tier(), Tier::S);
    }

    #[test]
    fn test_out_of_range_criteria_are_clamped_before_summing() {
        // 5 behaves as 3, -1 behaves as 0
        let clamped = compute_score(&Criteria::new(5, -1, 2, 2), &bonuses(0), &penalties(0));
        let explicit = compute_score(&Criteria::new(3, 0, 2, 2), &bonuses(0), &penalties(0));
        assert_eq!(clamped, explicit);
        assert_eq!(clamped.core, 7);
    }

    #[test]
    fn test_zero_rubric_with_penalties_goes_negative() {
        let score = compute_score(&Criteria::default(), &bonuses(0), &penalties(3));
        assert_eq!(score.total, -1.5);
        assert_eq!(score.tier(), Tier::F);
    }

    #[test]
    fn test_rubric_helpers() {
        let rubric = Rubric {
            criteria: Criteria::new(2, 2, 2, 2),
            bonuses: bonuses(1),
            penalties: penalties(0),
        };
        assert_eq!(rubric.score().total, 8.5);
        assert_eq!(rubric.suggested_tier(), Tier::C);
    }

    proptest! {
        #[test]
        fn compute_score_is_deterministic(
            c in proptest::array::uniform4(-10i64..10),
            b in 0usize..4,
            p in 0usize..4,
        ) {
            let criteria = Criteria::new(c[0], c[1], c[2], c[3]);
            let first = compute_score(&criteria, &bonuses(b), &penalties(p));
            let second = compute_score(&criteria, &bonuses(b), &penalties(p));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn total_stays_in_declared_range(
            c in proptest::array::uniform4(any::<i64>()),
            b in 0usize..4,
            p in 0usize..4,
        ) {
            let score = compute_score(&Criteria::new(c[0], c[1], c[2], c[3]), &bonuses(b), &penalties(p));
            prop_assert!(score.core <= 12);
            prop_assert!((0.0..=1.5).contains(&score.bonus));
            prop_assert!((-1.5..=0.0).contains(&score.penalty));
            prop_assert!((-1.5..=13.5).contains(&score.total));
        }

        #[test]
        fn tier_is_monotonic_in_total(a in -5.0f64..20.0, b in -5.0f64..20.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            // Better tiers sort first
            prop_assert!(tier_for_score(hi) <= tier_for_score(lo));
        }
    }
}
