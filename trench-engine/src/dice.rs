//! Keep-two dice pools and the exact distribution of their kept sum.
//!
//! A pool rolls `2 + |dice_mod|` six-sided dice and keeps the two highest
//! (non-negative modifier) or the two lowest (negative modifier). Outcomes are
//! counted exactly: every sorted roll is visited once, weighted by the number
//! of ordered rolls that sort to it, and counts are divided by `6^size` only
//! at the end.
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{DICE_SIDES, KEEP_DICE, MAX_POOL_SIZE};
use crate::error::EngineError;
use crate::numbers::{face_total, ratio};

/// Faces of one roll of a pool. Pools rarely exceed eight dice.
pub type DiceRoll = SmallVec<[u8; 8]>;

/// Which end of a sorted pool is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keep {
    Highest,
    Lowest,
}

impl Keep {
    /// Bonus dice (and no modifier) keep the highest two; penalty dice keep the lowest.
    #[must_use]
    pub const fn from_dice_mod(dice_mod: i32) -> Self {
        if dice_mod >= 0 {
            Self::Highest
        } else {
            Self::Lowest
        }
    }

    #[must_use]
    pub const fn from_flag(keep_highest: bool) -> Self {
        if keep_highest {
            Self::Highest
        } else {
            Self::Lowest
        }
    }

    #[must_use]
    pub const fn is_highest(self) -> bool {
        matches!(self, Self::Highest)
    }
}

impl fmt::Display for Keep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Highest => write!(f, "highest"),
            Self::Lowest => write!(f, "lowest"),
        }
    }
}

/// A validated pool: how many dice are rolled and which two are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolSpec {
    size: u8,
    keep: Keep,
}

impl PoolSpec {
    /// Build a pool of `size` dice.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPoolSize`] when `size < 1` and
    /// [`EngineError::PoolTooLarge`] when `size` exceeds [`MAX_POOL_SIZE`].
    pub fn new(size: i64, keep: Keep) -> Result<Self, EngineError> {
        if size < 1 {
            return Err(EngineError::InvalidPoolSize { size });
        }
        let size = u8::try_from(size)
            .ok()
            .filter(|&dice| dice <= MAX_POOL_SIZE)
            .ok_or(EngineError::pool_too_large(size))?;
        Ok(Self { size, keep })
    }

    /// Derive the pool rolled for a signed dice modifier.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PoolTooLarge`] when `2 + |dice_mod|` exceeds
    /// [`MAX_POOL_SIZE`].
    pub fn from_dice_mod(dice_mod: i32) -> Result<Self, EngineError> {
        let base = i64::try_from(KEEP_DICE).unwrap_or(2);
        let size = base + i64::from(dice_mod.unsigned_abs());
        Self::new(size, Keep::from_dice_mod(dice_mod))
    }

    #[must_use]
    pub const fn size(self) -> u8 {
        self.size
    }

    #[must_use]
    pub const fn keep(self) -> Keep {
        self.keep
    }

    /// Number of equally likely ordered rolls, `6^size`.
    #[must_use]
    pub fn outcome_count(self) -> u64 {
        u64::from(DICE_SIDES).pow(u32::from(self.size))
    }
}

impl fmt::Display for PoolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d6 keep {} {}", self.size, self.keep, KEEP_DICE)
    }
}

/// Sum of the dice a pool keeps. `sorted` must be ascending.
#[must_use]
pub fn kept_sum(sorted: &[u8], keep: Keep) -> i32 {
    match keep {
        Keep::Highest => top_two_sum(sorted),
        Keep::Lowest => face_total(&sorted[..sorted.len().min(KEEP_DICE)]),
    }
}

/// Sum of the two largest dice of a roll, whichever end the pool keeps.
/// `sorted` must be ascending.
#[must_use]
pub fn top_two_sum(sorted: &[u8]) -> i32 {
    face_total(&sorted[sorted.len().saturating_sub(KEEP_DICE)..])
}

const fn factorial_table() -> [u64; MAX_POOL_SIZE as usize + 1] {
    let mut table = [1_u64; MAX_POOL_SIZE as usize + 1];
    let mut n = 1;
    while n < table.len() {
        table[n] = table[n - 1] * n as u64;
        n += 1;
    }
    table
}

const FACTORIALS: [u64; MAX_POOL_SIZE as usize + 1] = factorial_table();

/// Ordered rolls that sort to `sorted`: the multinomial `n! / (c1! ... c6!)`.
fn arrangements(sorted: &[u8]) -> u64 {
    sorted
        .chunk_by(|a, b| a == b)
        .fold(FACTORIALS[sorted.len()], |count, run| {
            count / FACTORIALS[run.len()]
        })
}

/// Visit every ascending roll of `pool`, with the number of ordered rolls it stands for.
///
/// The weights over one pool always add up to [`PoolSpec::outcome_count`].
pub fn for_each_sorted_roll<F>(pool: PoolSpec, mut visit: F)
where
    F: FnMut(&[u8], u64),
{
    let mut faces: DiceRoll = smallvec![1; usize::from(pool.size)];
    loop {
        visit(&faces, arrangements(&faces));

        let Some(idx) = faces.iter().rposition(|&face| face < DICE_SIDES) else {
            return;
        };
        let next = faces[idx] + 1;
        for face in &mut faces[idx..] {
            *face = next;
        }
    }
}

/// Exact probability mass function of a pool's kept sum.
///
/// Only attainable sums are present; probabilities sum to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SumDistribution {
    pool: PoolSpec,
    probabilities: BTreeMap<i32, f64>,
}

impl SumDistribution {
    /// Enumerate `pool` and tabulate its kept sum.
    #[must_use]
    pub fn compute(pool: PoolSpec) -> Self {
        let mut counts: BTreeMap<i32, u64> = BTreeMap::new();
        for_each_sorted_roll(pool, |sorted, weight| {
            *counts.entry(kept_sum(sorted, pool.keep)).or_default() += weight;
        });

        let total = pool.outcome_count();
        let probabilities = counts
            .into_iter()
            .map(|(sum, count)| (sum, ratio(count, total)))
            .collect();
        log::debug!("computed kept-sum distribution for {pool}");
        Self {
            pool,
            probabilities,
        }
    }

    #[must_use]
    pub const fn pool(&self) -> PoolSpec {
        self.pool
    }

    /// Probability of exactly `sum`; zero when unattainable.
    #[must_use]
    pub fn probability(&self, sum: i32) -> f64 {
        self.probabilities.get(&sum).copied().unwrap_or(0.0)
    }

    /// Probability that the kept sum is `threshold` or more.
    #[must_use]
    pub fn at_least(&self, threshold: i32) -> f64 {
        self.probabilities.range(threshold..).map(|(_, p)| p).sum()
    }

    /// `(sum, probability)` pairs in ascending sum order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.probabilities.iter().map(|(&sum, &p)| (sum, p))
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.probabilities.values().sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

/// Distribution of the kept sum of `num_dice` dice.
///
/// # Errors
///
/// Returns [`EngineError::InvalidPoolSize`] when `num_dice < 1` and
/// [`EngineError::PoolTooLarge`] when it exceeds [`MAX_POOL_SIZE`].
pub fn dice_sum_distribution(
    num_dice: i32,
    keep_highest: bool,
) -> Result<SumDistribution, EngineError> {
    let pool = PoolSpec::new(i64::from(num_dice), Keep::from_flag(keep_highest))?;
    Ok(SumDistribution::compute(pool))
}

/// Chance that the kept sum plus `roll_mod` meets `target_number`.
///
/// # Errors
///
/// Returns [`EngineError::PoolTooLarge`] when the modifier asks for more dice
/// than the engine enumerates.
pub fn success_probability(
    target_number: i32,
    dice_mod: i32,
    roll_mod: i32,
) -> Result<f64, EngineError> {
    let dist = SumDistribution::compute(PoolSpec::from_dice_mod(dice_mod)?);
    Ok(success_from(&dist, target_number, roll_mod))
}

pub(crate) fn success_from(dist: &SumDistribution, target_number: i32, roll_mod: i32) -> f64 {
    dist.iter()
        .filter(|&(sum, _)| i64::from(sum) + i64::from(roll_mod) >= i64::from(target_number))
        .map(|(_, p)| p)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PROBABILITY_TOLERANCE;

    fn brute_force(pool: PoolSpec) -> BTreeMap<i32, f64> {
        let size = usize::from(pool.size());
        let total = pool.outcome_count();
        let mut counts: BTreeMap<i32, u64> = BTreeMap::new();
        for index in 0..total {
            let mut rest = index;
            let mut roll: Vec<u8> = (0..size)
                .map(|_| {
                    let face = u8::try_from(rest % 6).unwrap() + 1;
                    rest /= 6;
                    face
                })
                .collect();
            roll.sort_unstable();
            *counts.entry(kept_sum(&roll, pool.keep())).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(sum, count)| (sum, ratio(count, total)))
            .collect()
    }

    #[test]
    fn two_dice_match_classic_table() {
        let dist = dice_sum_distribution(2, true).unwrap();
        let expected = [1, 2, 3, 4, 5, 6, 5, 4, 3, 2, 1];
        for (offset, ways) in expected.iter().enumerate() {
            let sum = i32::try_from(offset).unwrap() + 2;
            assert!((dist.probability(sum) - f64::from(*ways) / 36.0).abs() < PROBABILITY_TOLERANCE);
        }
        assert_eq!(dist.len(), 11);
        assert!(dist.probability(13).abs() < f64::EPSILON);
    }

    #[test]
    fn every_pool_sums_to_one() {
        for size in 1..=8 {
            for keep_highest in [true, false] {
                let dist = dice_sum_distribution(size, keep_highest).unwrap();
                assert!(
                    (dist.total() - 1.0).abs() < PROBABILITY_TOLERANCE,
                    "{size} dice keep_highest={keep_highest} summed to {}",
                    dist.total()
                );
            }
        }
    }

    #[test]
    fn weighted_walk_matches_tuple_enumeration_bit_for_bit() {
        for size in 1..=5 {
            for keep in [Keep::Highest, Keep::Lowest] {
                let pool = PoolSpec::new(size, keep).unwrap();
                let dist = SumDistribution::compute(pool);
                let expected = brute_force(pool);
                let actual: BTreeMap<i32, f64> = dist.iter().collect();
                assert_eq!(actual, expected, "pool {pool}");
            }
        }
    }

    #[test]
    fn arrangement_weights_cover_every_ordered_roll() {
        for size in 1..=9 {
            let pool = PoolSpec::new(size, Keep::Highest).unwrap();
            let mut seen = 0_u64;
            for_each_sorted_roll(pool, |sorted, weight| {
                assert!(sorted.windows(2).all(|pair| pair[0] <= pair[1]));
                seen += weight;
            });
            assert_eq!(seen, pool.outcome_count());
        }
    }

    #[test]
    fn three_dice_keep_extremes() {
        let highest = dice_sum_distribution(3, true).unwrap();
        let lowest = dice_sum_distribution(3, false).unwrap();
        // At least two sixes (or two ones): 15 + 1 of 216.
        assert!((highest.probability(12) - 16.0 / 216.0).abs() < PROBABILITY_TOLERANCE);
        assert!((lowest.probability(2) - 16.0 / 216.0).abs() < PROBABILITY_TOLERANCE);
        for sum in 2..=12 {
            assert!(
                (highest.probability(sum) - lowest.probability(14 - sum)).abs()
                    < PROBABILITY_TOLERANCE
            );
        }
    }

    #[test]
    fn single_die_keeps_itself() {
        let dist = dice_sum_distribution(1, false).unwrap();
        assert_eq!(dist.len(), 6);
        for face in 1..=6 {
            assert!((dist.probability(face) - 1.0 / 6.0).abs() < PROBABILITY_TOLERANCE);
        }
    }

    #[test]
    fn pool_bounds_are_enforced() {
        assert_eq!(
            dice_sum_distribution(0, true),
            Err(EngineError::InvalidPoolSize { size: 0 })
        );
        assert_eq!(
            dice_sum_distribution(-2, false),
            Err(EngineError::InvalidPoolSize { size: -2 })
        );
        assert!(matches!(
            dice_sum_distribution(21, true),
            Err(EngineError::PoolTooLarge { size: 21, .. })
        ));
        assert!(PoolSpec::from_dice_mod(18).is_ok());
        assert!(PoolSpec::from_dice_mod(i32::MIN).is_err());
    }

    #[test]
    fn dice_mod_sets_size_and_direction() {
        let bonus = PoolSpec::from_dice_mod(3).unwrap();
        assert_eq!((bonus.size(), bonus.keep()), (5, Keep::Highest));
        let penalty = PoolSpec::from_dice_mod(-2).unwrap();
        assert_eq!((penalty.size(), penalty.keep()), (4, Keep::Lowest));
        let flat = PoolSpec::from_dice_mod(0).unwrap();
        assert_eq!((flat.size(), flat.keep()), (2, Keep::Highest));
        assert_eq!(penalty.to_string(), "4d6 keep lowest 2");
    }

    #[test]
    fn success_on_seven_is_twenty_one_in_thirty_six() {
        let p = success_probability(7, 0, 0).unwrap();
        assert!((p - 21.0 / 36.0).abs() < PROBABILITY_TOLERANCE);
        let with_bonus = success_probability(7, 0, 2).unwrap();
        assert!((with_bonus - 30.0 / 36.0).abs() < PROBABILITY_TOLERANCE);
        assert!((success_probability(2, 0, 0).unwrap() - 1.0).abs() < PROBABILITY_TOLERANCE);
        assert!(success_probability(13, 0, 0).unwrap().abs() < PROBABILITY_TOLERANCE);
    }

    #[test]
    fn success_is_monotonic_in_dice_mod() {
        for target in 2..=13 {
            let odds: Vec<f64> = (-4..=4)
                .map(|dice_mod| success_probability(target, dice_mod, 0).unwrap())
                .collect();
            for pair in odds.windows(2) {
                assert!(
                    pair[0] <= pair[1] + PROBABILITY_TOLERANCE,
                    "target {target}: {odds:?}"
                );
            }
        }
    }

    #[test]
    fn at_least_matches_success() {
        let dist = dice_sum_distribution(4, true).unwrap();
        let direct = success_probability(9, 2, 0).unwrap();
        assert!((dist.at_least(9) - direct).abs() < PROBABILITY_TOLERANCE);
    }

    #[test]
    fn extreme_modifiers_do_not_overflow() {
        let p = success_probability(i32::MAX, 0, 0).unwrap();
        assert!(p.abs() < PROBABILITY_TOLERANCE);
        let p = success_probability(i32::MAX, 0, i32::MAX).unwrap();
        assert!((p - 1.0).abs() < PROBABILITY_TOLERANCE);
        let p = success_probability(i32::MIN, 0, 0).unwrap();
        assert!((p - 1.0).abs() < PROBABILITY_TOLERANCE);
    }
}
