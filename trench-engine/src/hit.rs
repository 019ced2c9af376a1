//! Joint distribution of the hit roll and its critical check.
//!
//! A hit keeps two dice of the pool, but a critical hit always looks at the
//! two largest dice of that same roll. With penalty dice the two differ, so
//! both sums are tallied together from one enumeration and never combined
//! from separate marginals.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::CRIT_RESULT;
use crate::dice::{PoolSpec, SumDistribution, for_each_sorted_roll, kept_sum, top_two_sum};
use crate::error::EngineError;
use crate::numbers::ratio;

/// One joint outcome of a hit roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HitBranch {
    /// Sum of the two dice the pool keeps for the hit total.
    pub kept_sum: i32,
    /// Sum of the two largest dice in the same roll.
    pub top_two_sum: i32,
}

impl HitBranch {
    /// Both of the two largest dice show six.
    #[must_use]
    pub const fn is_crit(self) -> bool {
        self.top_two_sum == CRIT_RESULT
    }
}

/// Probabilities of every attainable [`HitBranch`] for one hit pool.
#[derive(Debug, Clone, PartialEq)]
pub struct HitBranches {
    pool: PoolSpec,
    branches: BTreeMap<HitBranch, f64>,
}

impl HitBranches {
    #[must_use]
    pub fn compute(pool: PoolSpec) -> Self {
        let mut counts: BTreeMap<HitBranch, u64> = BTreeMap::new();
        for_each_sorted_roll(pool, |sorted, weight| {
            let branch = HitBranch {
                kept_sum: kept_sum(sorted, pool.keep()),
                top_two_sum: top_two_sum(sorted),
            };
            *counts.entry(branch).or_default() += weight;
        });

        let total = pool.outcome_count();
        let branches = counts
            .into_iter()
            .map(|(branch, count)| (branch, ratio(count, total)))
            .collect();
        log::debug!("computed hit branches for {pool}");
        Self { pool, branches }
    }

    #[must_use]
    pub const fn pool(&self) -> PoolSpec {
        self.pool
    }

    #[must_use]
    pub fn probability(&self, branch: HitBranch) -> f64 {
        self.branches.get(&branch).copied().unwrap_or(0.0)
    }

    /// Branches in ascending `(kept_sum, top_two_sum)` order.
    pub fn iter(&self) -> impl Iterator<Item = (HitBranch, f64)> + '_ {
        self.branches.iter().map(|(&branch, &p)| (branch, p))
    }

    /// Kept-sum distribution recovered by summing out the critical check.
    #[must_use]
    pub fn kept_marginal(&self) -> BTreeMap<i32, f64> {
        let mut marginal: BTreeMap<i32, f64> = BTreeMap::new();
        for (branch, p) in self.iter() {
            *marginal.entry(branch.kept_sum).or_default() += p;
        }
        marginal
    }

    /// Chance of a critical hit, whether or not the roll hits.
    #[must_use]
    pub fn crit_probability(&self) -> f64 {
        self.iter()
            .filter(|(branch, _)| branch.is_crit())
            .map(|(_, p)| p)
            .sum()
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.branches.values().sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Matches the kept-sum distribution of the same pool within `tolerance`.
    #[must_use]
    pub fn agrees_with(&self, dist: &SumDistribution, tolerance: f64) -> bool {
        let marginal = self.kept_marginal();
        marginal.len() == dist.len()
            && marginal
                .iter()
                .all(|(&sum, &p)| (p - dist.probability(sum)).abs() < tolerance)
    }
}

/// Joint `(kept_sum, top_two_sum)` distribution for a hit dice modifier.
///
/// # Errors
///
/// Returns [`EngineError::PoolTooLarge`] when the modifier asks for more dice
/// than the engine enumerates.
pub fn hit_branches(hit_dice_mod: i32) -> Result<HitBranches, EngineError> {
    Ok(HitBranches::compute(PoolSpec::from_dice_mod(hit_dice_mod)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PROBABILITY_TOLERANCE;

    #[test]
    fn plain_pool_keeps_the_top_two() {
        let branches = hit_branches(0).unwrap();
        assert!(branches.iter().all(|(b, _)| b.kept_sum == b.top_two_sum));
        assert_eq!(branches.len(), 11);
        assert!((branches.crit_probability() - 1.0 / 36.0).abs() < PROBABILITY_TOLERANCE);
    }

    #[test]
    fn marginal_recovers_sum_distribution() {
        for dice_mod in -4..=4 {
            let branches = hit_branches(dice_mod).unwrap();
            let dist = SumDistribution::compute(branches.pool());
            assert!(branches.agrees_with(&dist, PROBABILITY_TOLERANCE), "mod {dice_mod}");
            assert!((branches.total() - 1.0).abs() < PROBABILITY_TOLERANCE);
        }
    }

    #[test]
    fn penalty_pool_tracks_crit_from_the_same_roll() {
        // 3d6 keep lowest. Crit needs two sixes somewhere in the roll:
        // (6,6,x) orderings give 15 with x<6 plus one triple six.
        let branches = hit_branches(-1).unwrap();
        assert!((branches.crit_probability() - 16.0 / 216.0).abs() < PROBABILITY_TOLERANCE);

        // Lowest two sum to 12 only on triple six, which is also a crit.
        let top = HitBranch {
            kept_sum: 12,
            top_two_sum: 12,
        };
        assert!((branches.probability(top) - 1.0 / 216.0).abs() < PROBABILITY_TOLERANCE);

        // (1,6,6): kept 7, crit. Three orderings.
        let low_crit = HitBranch {
            kept_sum: 7,
            top_two_sum: 12,
        };
        assert!((branches.probability(low_crit) - 3.0 / 216.0).abs() < PROBABILITY_TOLERANCE);

        // Kept sum never exceeds the top-two sum.
        assert!(branches.iter().all(|(b, _)| b.kept_sum <= b.top_two_sum));
    }

    #[test]
    fn joint_differs_from_independent_product() {
        let branches = hit_branches(-1).unwrap();
        let marginal = branches.kept_marginal();
        let crit = branches.crit_probability();
        let joint_crit_on_two: f64 = branches
            .iter()
            .filter(|(b, _)| b.kept_sum == 2 && b.is_crit())
            .map(|(_, p)| p)
            .sum();
        // Keeping two ones leaves a single die, so a crit there is impossible.
        assert!(joint_crit_on_two.abs() < PROBABILITY_TOLERANCE);
        assert!(marginal[&2] * crit > PROBABILITY_TOLERANCE);
    }

    #[test]
    fn oversized_pool_is_rejected() {
        assert!(matches!(
            hit_branches(-25),
            Err(EngineError::PoolTooLarge { size: 27, .. })
        ));
    }
}
