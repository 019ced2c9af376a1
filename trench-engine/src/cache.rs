//! Where sum distributions and hit-branch tables come from.
//!
//! Both tables are pure functions of a small [`PoolSpec`], so callers that
//! evaluate many attacks can keep them in an [`OddsCache`] instead of
//! re-enumerating every pool.
use std::collections::HashMap;
use std::sync::Arc;

use crate::attack::{AttackInput, attack_outcome_with};
use crate::dice::{PoolSpec, SumDistribution, success_from};
use crate::error::EngineError;
use crate::hit::HitBranches;
use crate::injury::{InjuryTable, classify_sums};
use crate::outcome::OutcomeDistribution;

/// Supplier of per-pool tables for the attack engine.
pub trait DistributionSource {
    fn sum_distribution(&mut self, pool: PoolSpec) -> Arc<SumDistribution>;

    fn hit_branches(&mut self, pool: PoolSpec) -> Arc<HitBranches>;
}

/// Recomputes every table on request.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exhaustive;

impl DistributionSource for Exhaustive {
    fn sum_distribution(&mut self, pool: PoolSpec) -> Arc<SumDistribution> {
        Arc::new(SumDistribution::compute(pool))
    }

    fn hit_branches(&mut self, pool: PoolSpec) -> Arc<HitBranches> {
        Arc::new(HitBranches::compute(pool))
    }
}

/// Memoises tables by pool. Results are identical to [`Exhaustive`].
#[derive(Debug, Clone, Default)]
pub struct OddsCache {
    sums: HashMap<PoolSpec, Arc<SumDistribution>>,
    branches: HashMap<PoolSpec, Arc<HitBranches>>,
}

impl OddsCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct pools held across both tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sums.len() + self.branches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sums.is_empty() && self.branches.is_empty()
    }

    pub fn clear(&mut self) {
        self.sums.clear();
        self.branches.clear();
    }

    /// Cached counterpart of [`crate::success_probability`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PoolTooLarge`] when the hit pool is too large.
    pub fn success_probability(
        &mut self,
        target_number: i32,
        dice_mod: i32,
        roll_mod: i32,
    ) -> Result<f64, EngineError> {
        let dist = self.sum_distribution(PoolSpec::from_dice_mod(dice_mod)?);
        Ok(success_from(&dist, target_number, roll_mod))
    }

    /// Cached counterpart of [`crate::injury_distribution`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PoolTooLarge`] when the injury pool is too large.
    pub fn injury_distribution(
        &mut self,
        table: &InjuryTable,
        dice_mod: i32,
        roll_mod: i32,
        target_armor: i32,
    ) -> Result<OutcomeDistribution, EngineError> {
        let dist = self.sum_distribution(PoolSpec::from_dice_mod(dice_mod)?);
        Ok(classify_sums(table, &dist, roll_mod, target_armor))
    }

    /// Cached counterpart of [`crate::attack_outcome_probabilities`].
    ///
    /// # Errors
    ///
    /// Same as [`crate::attack_outcome_probabilities`].
    pub fn attack_outcome_probabilities(
        &mut self,
        input: &AttackInput,
    ) -> Result<OutcomeDistribution, EngineError> {
        attack_outcome_with(self, input)
    }
}

impl DistributionSource for OddsCache {
    fn sum_distribution(&mut self, pool: PoolSpec) -> Arc<SumDistribution> {
        Arc::clone(self.sums.entry(pool).or_insert_with(|| {
            log::debug!("odds cache miss for kept sums of {pool}");
            Arc::new(SumDistribution::compute(pool))
        }))
    }

    fn hit_branches(&mut self, pool: PoolSpec) -> Arc<HitBranches> {
        Arc::clone(self.branches.entry(pool).or_insert_with(|| {
            log::debug!("odds cache miss for hit branches of {pool}");
            Arc::new(HitBranches::compute(pool))
        }))
    }
}
