//! Rolling concrete attacks with a random source.
//!
//! Applies the same keep, crit and injury rules as the exact engine one roll
//! at a time, which makes it a direct cross-check of the enumerated odds.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

use crate::attack::AttackInput;
use crate::constants::{CRIT_RESULT, DICE_SIDES, MISS_LABEL};
use crate::dice::{DiceRoll, PoolSpec, kept_sum, top_two_sum};
use crate::error::EngineError;
use crate::numbers::frequency;
use crate::outcome::OutcomeDistribution;

/// Roll every die of `pool` and return the faces in ascending order.
pub fn roll_pool<R: Rng>(pool: PoolSpec, rng: &mut R) -> DiceRoll {
    let mut faces: DiceRoll = (0..pool.size())
        .map(|_| rng.gen_range(1..=DICE_SIDES))
        .collect();
    faces.sort_unstable();
    faces
}

/// The hit half of a rolled attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HitRoll {
    pub dice: DiceRoll,
    pub kept_sum: i32,
    pub top_two_sum: i32,
    pub total: i32,
    pub hit: bool,
    pub crit: bool,
}

/// The injury half of a rolled attack, present only on a hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjuryRoll {
    pub dice_mod: i32,
    pub dice: DiceRoll,
    pub kept_sum: i32,
    pub total: i32,
    /// `None` when the total falls in a gap of the band table.
    pub label: Option<String>,
}

/// One fully resolved attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackRoll {
    pub hit: HitRoll,
    pub injury: Option<InjuryRoll>,
}

impl AttackRoll {
    /// [`MISS_LABEL`] on a miss, the band label on a classified hit.
    #[must_use]
    pub fn outcome_label(&self) -> Option<&str> {
        match &self.injury {
            None => Some(MISS_LABEL),
            Some(injury) => injury.label.as_deref(),
        }
    }
}

/// Resolve one attack.
///
/// # Errors
///
/// Returns [`EngineError::PoolTooLarge`] when the hit pool or the injury pool
/// needed by this roll is too large.
pub fn roll_attack<R: Rng>(
    input: &AttackInput,
    rng: &mut R,
) -> Result<AttackRoll, EngineError> {
    let hit_pool = PoolSpec::from_dice_mod(input.hit_dice_mod())?;
    let dice = roll_pool(hit_pool, rng);
    let kept = kept_sum(&dice, hit_pool.keep());
    let top_two = top_two_sum(&dice);
    let hit = HitRoll {
        kept_sum: kept,
        top_two_sum: top_two,
        total: kept.saturating_add(input.hit_roll_mod()),
        hit: input.is_hit(kept),
        crit: top_two == CRIT_RESULT,
        dice,
    };
    if !hit.hit {
        return Ok(AttackRoll { hit, injury: None });
    }

    let dice_mod = input.injury_dice_for(hit.crit);
    let injury_pool = PoolSpec::from_dice_mod(dice_mod)?;
    let dice = roll_pool(injury_pool, rng);
    let kept = kept_sum(&dice, injury_pool.keep());
    let total = input.injury_total(kept);
    let injury = InjuryRoll {
        dice_mod,
        label: input.injury_table().classify(total).map(str::to_string),
        kept_sum: kept,
        total,
        dice,
    };
    Ok(AttackRoll {
        hit,
        injury: Some(injury),
    })
}

/// Empirical outcome frequencies over `trials` rolled attacks.
///
/// Labels follow the exact engine's order; rolls landing in a band gap are
/// counted in no label.
///
/// # Errors
///
/// Propagates the first [`roll_attack`] error.
pub fn simulate_attacks<R: Rng>(
    input: &AttackInput,
    trials: u32,
    rng: &mut R,
) -> Result<OutcomeDistribution, EngineError> {
    let labels: Vec<&str> = std::iter::once(MISS_LABEL)
        .chain(input.injury_table().labels())
        .collect();
    let mut tallies = vec![0_u32; labels.len()];
    for _ in 0..trials {
        let roll = roll_attack(input, rng)?;
        if let Some(label) = roll.outcome_label()
            && let Some(slot) = labels.iter().position(|&known| known == label)
        {
            tallies[slot] += 1;
        }
    }

    let mut result = OutcomeDistribution::with_labels(&labels);
    for (label, hits) in labels.iter().zip(tallies) {
        result.add(label, frequency(hits, trials));
    }
    Ok(result)
}

/// [`simulate_attacks`] with a reproducible `ChaCha20` stream.
///
/// # Errors
///
/// Propagates the first [`roll_attack`] error.
pub fn simulate_attacks_seeded(
    input: &AttackInput,
    trials: u32,
    seed: u64,
) -> Result<OutcomeDistribution, EngineError> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    simulate_attacks(input, trials, &mut rng)
}
