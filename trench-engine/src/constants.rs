//! Fixed dice mechanics for the 2d6 keep-two combat system.
//!
//! The rules only ever roll six-sided dice and keep two of them, so these
//! values are compile-time constants rather than configuration.

/// Faces on every die in a pool.
pub const DICE_SIDES: u8 = 6;

/// Dice kept from a pool, whatever its size.
pub const KEEP_DICE: usize = 2;

/// Top-two total that marks a critical hit (double six).
pub const CRIT_RESULT: i32 = 12;

/// Extra injury dice granted by a critical hit.
pub const CRIT_BONUS_DICE: i32 = 1;

/// Extra injury dice granted by a critical hit with a critical weapon.
pub const CRITICAL_WEAPON_BONUS_DICE: i32 = 2;

/// Largest pool the engine enumerates.
///
/// 6^20 is below 2^53, so every outcome count and the denominator convert to
/// `f64` exactly and each probability is a single rounded division.
pub const MAX_POOL_SIZE: u8 = 20;

/// Lowest meaningful hit target number (two dice never total less).
pub const MIN_TARGET_NUMBER: i32 = 2;

/// Target number used when a caller does not supply one.
pub const DEFAULT_TARGET_NUMBER: i32 = 7;

/// Label of the outcome where the hit roll fails.
pub const MISS_LABEL: &str = "Miss";

/// Tolerance used when checking that distributions sum to one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;
