//! Numeric conversion helpers centralizing the casts the engine relies on.

use num_traits::cast::cast;

/// Divide an outcome count by the number of equally likely outcomes.
///
/// Both operands stay below 2^53 for every pool the engine accepts, so the
/// conversions are exact and the result is a single rounded division.
#[must_use]
pub fn ratio(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let numerator = cast::<u64, f64>(count).unwrap_or(0.0);
    let denominator = cast::<u64, f64>(total).unwrap_or(f64::INFINITY);
    numerator / denominator
}

/// Widen a small die face or dice total into the signed domain used for sums.
#[must_use]
pub fn face_total(faces: &[u8]) -> i32 {
    faces.iter().map(|&face| i32::from(face)).sum()
}

/// Convert an observed tally into a frequency, returning 0.0 for empty runs.
#[must_use]
pub fn frequency(hits: u32, trials: u32) -> f64 {
    if trials == 0 {
        return 0.0;
    }
    f64::from(hits) / f64::from(trials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_exact_for_dice_denominators() {
        assert!((ratio(6, 36) - 1.0 / 6.0).abs() < f64::EPSILON);
        assert!((ratio(0, 0) - 0.0).abs() < f64::EPSILON);
        assert!((ratio(1, 6_u64.pow(20)) * 6_f64.powi(20) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn face_total_sums_faces() {
        assert_eq!(face_total(&[6, 6]), 12);
        assert_eq!(face_total(&[]), 0);
    }

    #[test]
    fn frequency_handles_empty_runs() {
        assert!((frequency(5, 10) - 0.5).abs() < f64::EPSILON);
        assert!((frequency(5, 0) - 0.0).abs() < f64::EPSILON);
    }
}
