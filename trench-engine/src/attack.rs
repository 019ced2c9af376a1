//! Full attack resolution: hit roll, critical check and injury roll.
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::iter;
use std::ops::RangeInclusive;

use crate::cache::{DistributionSource, Exhaustive};
use crate::constants::{
    CRIT_BONUS_DICE, CRITICAL_WEAPON_BONUS_DICE, DEFAULT_TARGET_NUMBER, MIN_TARGET_NUMBER,
    MISS_LABEL,
};
use crate::dice::{PoolSpec, SumDistribution, success_from};
use crate::error::EngineError;
use crate::injury::{InjuryBand, InjuryTable, classify_sums};
use crate::outcome::OutcomeDistribution;

/// Caller-supplied attack scalars before validation.
///
/// Modifiers are already aggregated; how they were gathered (profiles,
/// weapons, keywords) is of no concern to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackParams {
    /// Kept sum plus `hit_roll_mod` must reach this to hit.
    pub hit_target_number: i32,
    /// Signed extra dice on the hit roll.
    pub hit_dice_mod: i32,
    /// Flat modifier added to the kept hit sum.
    pub hit_roll_mod: i32,
    /// Critical weapons add two injury dice on a crit instead of one.
    pub weapon_is_critical: bool,
    pub injury_bands: Vec<InjuryBand>,
    /// Signed extra dice on the injury roll, before any crit bonus.
    pub injury_dice_mod: i32,
    pub injury_roll_mod: i32,
    /// Subtracted from the injury total before classification.
    pub target_armor: i32,
}

impl Default for AttackParams {
    fn default() -> Self {
        Self {
            hit_target_number: DEFAULT_TARGET_NUMBER,
            hit_dice_mod: 0,
            hit_roll_mod: 0,
            weapon_is_critical: false,
            injury_bands: Vec::new(),
            injury_dice_mod: 0,
            injury_roll_mod: 0,
            target_armor: 0,
        }
    }
}

impl AttackParams {
    /// Check the parameters and freeze them into an [`AttackInput`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingInjuryBands`] or
    /// [`EngineError::InvalidBand`] for a bad band table and
    /// [`EngineError::TargetNumberTooLow`] for a target below 2.
    pub fn validate(self) -> Result<AttackInput, EngineError> {
        AttackInput::try_from(self)
    }
}

/// A validated, immutable attack description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AttackParams", into = "AttackParams")]
pub struct AttackInput {
    hit_target_number: i32,
    hit_dice_mod: i32,
    hit_roll_mod: i32,
    weapon_is_critical: bool,
    injury_table: InjuryTable,
    injury_dice_mod: i32,
    injury_roll_mod: i32,
    target_armor: i32,
}

impl TryFrom<AttackParams> for AttackInput {
    type Error = EngineError;

    fn try_from(params: AttackParams) -> Result<Self, Self::Error> {
        let injury_table = InjuryTable::new(params.injury_bands)?;
        if params.hit_target_number < MIN_TARGET_NUMBER {
            return Err(EngineError::target_too_low(params.hit_target_number));
        }
        Ok(Self {
            hit_target_number: params.hit_target_number,
            hit_dice_mod: params.hit_dice_mod,
            hit_roll_mod: params.hit_roll_mod,
            weapon_is_critical: params.weapon_is_critical,
            injury_table,
            injury_dice_mod: params.injury_dice_mod,
            injury_roll_mod: params.injury_roll_mod,
            target_armor: params.target_armor,
        })
    }
}

impl From<AttackInput> for AttackParams {
    fn from(input: AttackInput) -> Self {
        Self {
            hit_target_number: input.hit_target_number,
            hit_dice_mod: input.hit_dice_mod,
            hit_roll_mod: input.hit_roll_mod,
            weapon_is_critical: input.weapon_is_critical,
            injury_bands: input.injury_table.into(),
            injury_dice_mod: input.injury_dice_mod,
            injury_roll_mod: input.injury_roll_mod,
            target_armor: input.target_armor,
        }
    }
}

impl AttackInput {
    #[must_use]
    pub const fn hit_target_number(&self) -> i32 {
        self.hit_target_number
    }

    #[must_use]
    pub const fn hit_dice_mod(&self) -> i32 {
        self.hit_dice_mod
    }

    #[must_use]
    pub const fn hit_roll_mod(&self) -> i32 {
        self.hit_roll_mod
    }

    #[must_use]
    pub const fn weapon_is_critical(&self) -> bool {
        self.weapon_is_critical
    }

    #[must_use]
    pub const fn injury_table(&self) -> &InjuryTable {
        &self.injury_table
    }

    #[must_use]
    pub const fn injury_dice_mod(&self) -> i32 {
        self.injury_dice_mod
    }

    #[must_use]
    pub const fn injury_roll_mod(&self) -> i32 {
        self.injury_roll_mod
    }

    #[must_use]
    pub const fn target_armor(&self) -> i32 {
        self.target_armor
    }

    /// Same attack with the critical-weapon flag replaced.
    #[must_use]
    pub fn with_critical_weapon(&self, weapon_is_critical: bool) -> Self {
        Self {
            weapon_is_critical,
            ..self.clone()
        }
    }

    /// Whether the kept hit sum reaches the target number.
    #[must_use]
    pub fn is_hit(&self, kept_sum: i32) -> bool {
        i64::from(kept_sum) + i64::from(self.hit_roll_mod) >= i64::from(self.hit_target_number)
    }

    /// Injury dice modifier for a hit, including any crit bonus.
    #[must_use]
    pub fn injury_dice_for(&self, crit: bool) -> i32 {
        self.injury_dice_mod
            .saturating_add(crit_bonus_dice(crit, self.weapon_is_critical))
    }

    /// Injury total after roll modifier and armor for a kept injury sum.
    #[must_use]
    pub fn injury_total(&self, kept_sum: i32) -> i32 {
        kept_sum
            .saturating_add(self.injury_roll_mod)
            .saturating_sub(self.target_armor)
    }

    /// Every injury total a hit can produce. Two kept dice always total 2 to 12.
    #[must_use]
    pub fn injury_total_range(&self) -> RangeInclusive<i32> {
        self.injury_total(2)..=self.injury_total(12)
    }

    /// Attainable injury totals that the band table leaves unclassified.
    #[must_use]
    pub fn coverage_gaps(&self) -> Vec<i32> {
        self.injury_table.uncovered(self.injury_total_range())
    }

    /// Chance the hit roll succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PoolTooLarge`] when the hit pool is too large.
    pub fn hit_probability(&self) -> Result<f64, EngineError> {
        let pool = PoolSpec::from_dice_mod(self.hit_dice_mod)?;
        let dist = SumDistribution::compute(pool);
        Ok(success_from(&dist, self.hit_target_number, self.hit_roll_mod))
    }
}

/// Extra injury dice a hit earns from its critical check.
#[must_use]
pub const fn crit_bonus_dice(crit: bool, weapon_is_critical: bool) -> i32 {
    match (crit, weapon_is_critical) {
        (false, _) => 0,
        (true, false) => CRIT_BONUS_DICE,
        (true, true) => CRITICAL_WEAPON_BONUS_DICE,
    }
}

/// Exact outcome odds for one attack: [`MISS_LABEL`] plus every band label.
///
/// # Errors
///
/// Returns [`EngineError::PoolTooLarge`] when the hit pool or either injury
/// pool (with or without the crit bonus) is too large. Pools are checked
/// before any enumeration starts.
pub fn attack_outcome_probabilities(
    input: &AttackInput,
) -> Result<OutcomeDistribution, EngineError> {
    attack_outcome_with(&mut Exhaustive, input)
}

/// [`attack_outcome_probabilities`] drawing distributions from `source`.
///
/// # Errors
///
/// Same as [`attack_outcome_probabilities`].
pub fn attack_outcome_with<S>(
    source: &mut S,
    input: &AttackInput,
) -> Result<OutcomeDistribution, EngineError>
where
    S: DistributionSource + ?Sized,
{
    let hit_pool = PoolSpec::from_dice_mod(input.hit_dice_mod)?;
    let plain_pool = PoolSpec::from_dice_mod(input.injury_dice_for(false))?;
    let crit_pool = PoolSpec::from_dice_mod(input.injury_dice_for(true))?;
    let table = &input.injury_table;

    let mut result =
        OutcomeDistribution::with_labels(iter::once(MISS_LABEL).chain(table.labels()));
    let mut plain_injury: Option<OutcomeDistribution> = None;
    let mut crit_injury: Option<OutcomeDistribution> = None;

    let branches = source.hit_branches(hit_pool);
    for (branch, p) in branches.iter() {
        if !input.is_hit(branch.kept_sum) {
            result.add(MISS_LABEL, p);
            continue;
        }

        let (slot, pool) = if branch.is_crit() {
            (&mut crit_injury, crit_pool)
        } else {
            (&mut plain_injury, plain_pool)
        };
        let conditional = slot.get_or_insert_with(|| {
            let dist = source.sum_distribution(pool);
            classify_sums(table, &dist, input.injury_roll_mod, input.target_armor)
        });
        for (label, q) in conditional.iter() {
            result.add(label, p * q);
        }
    }

    Ok(result)
}
