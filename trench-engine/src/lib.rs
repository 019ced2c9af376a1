//! Trench Engine
//!
//! Exact odds for a two-stage wargame attack: a 2d6 keep-two hit roll gated
//! by a target number, followed on a hit by an injury roll whose total, less
//! armor, is classified into named bands. Bonus dice keep the highest two,
//! penalty dice the lowest two, and a hit whose two largest dice are both
//! sixes is a critical hit that adds injury dice.
//!
//! Everything here is a pure function of its inputs. Callers supply already
//! aggregated scalar modifiers and an explicit [`InjuryTable`].

pub mod attack;
pub mod cache;
pub mod constants;
pub mod dice;
pub mod error;
pub mod hit;
pub mod injury;
pub mod numbers;
pub mod outcome;
pub mod sampling;

// Re-export commonly used types
pub use attack::{
    AttackInput, AttackParams, attack_outcome_probabilities, attack_outcome_with,
    crit_bonus_dice,
};
pub use cache::{DistributionSource, Exhaustive, OddsCache};
pub use constants::{MISS_LABEL, PROBABILITY_TOLERANCE};
pub use dice::{
    DiceRoll, Keep, PoolSpec, SumDistribution, dice_sum_distribution, success_probability,
};
pub use error::{EngineError, ErrorKind};
pub use hit::{HitBranch, HitBranches, hit_branches};
pub use injury::{InjuryBand, InjuryTable, classify, injury_distribution};
pub use outcome::{OutcomeDistribution, OutcomeEntry};
pub use sampling::{
    AttackRoll, HitRoll, InjuryRoll, roll_attack, simulate_attacks, simulate_attacks_seeded,
};
