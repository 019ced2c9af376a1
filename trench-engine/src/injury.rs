//! Injury band tables and the conditional injury roll.
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::ops::RangeInclusive;

use crate::dice::{PoolSpec, SumDistribution};
use crate::error::EngineError;
use crate::outcome::OutcomeDistribution;

/// One row of an injury table. `max_value` of `None` has no upper limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjuryBand {
    pub min_value: i32,
    #[serde(default)]
    pub max_value: Option<i32>,
    pub label: String,
}

impl InjuryBand {
    #[must_use]
    pub fn new(min_value: i32, max_value: Option<i32>, label: impl Into<String>) -> Self {
        Self {
            min_value,
            max_value,
            label: label.into(),
        }
    }

    #[must_use]
    pub fn bounded(min_value: i32, max_value: i32, label: impl Into<String>) -> Self {
        Self::new(min_value, Some(max_value), label)
    }

    #[must_use]
    pub fn open(min_value: i32, label: impl Into<String>) -> Self {
        Self::new(min_value, None, label)
    }

    #[must_use]
    pub fn matches(&self, value: i32) -> bool {
        value >= self.min_value && self.max_value.is_none_or(|max| value <= max)
    }
}

/// Label of the first band in `bands` that contains `value`.
#[must_use]
pub fn classify(value: i32, bands: &[InjuryBand]) -> Option<&str> {
    bands
        .iter()
        .find(|band| band.matches(value))
        .map(|band| band.label.as_str())
}

/// A non-empty, ordered injury table. The first matching band wins.
///
/// Overlaps and gaps are allowed; [`InjuryTable::uncovered`] reports the
/// totals a table leaves unclassified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<InjuryBand>", into = "Vec<InjuryBand>")]
pub struct InjuryTable {
    bands: Vec<InjuryBand>,
}

impl InjuryTable {
    /// Validate and wrap an ordered band list.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingInjuryBands`] for an empty list and
    /// [`EngineError::InvalidBand`] for a band whose maximum is below its
    /// minimum.
    pub fn new(bands: Vec<InjuryBand>) -> Result<Self, EngineError> {
        if bands.is_empty() {
            return Err(EngineError::MissingInjuryBands);
        }
        for (index, band) in bands.iter().enumerate() {
            if let Some(max) = band.max_value
                && max < band.min_value
            {
                return Err(EngineError::InvalidBand {
                    index,
                    min: band.min_value,
                    max,
                });
            }
        }
        Ok(Self { bands })
    }

    /// Standard table: 2-6 Flesh Wound, 7-8 Down, 9+ Out of Action.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            bands: vec![
                InjuryBand::bounded(2, 6, "Flesh Wound"),
                InjuryBand::bounded(7, 8, "Down"),
                InjuryBand::open(9, "Out of Action"),
            ],
        }
    }

    /// Parse a JSON array of bands.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the table fails validation.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn bands(&self) -> &[InjuryBand] {
        &self.bands
    }

    #[must_use]
    pub fn classify(&self, value: i32) -> Option<&str> {
        classify(value, &self.bands)
    }

    /// Distinct labels in table order.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::with_capacity(self.bands.len());
        for band in &self.bands {
            if !labels.contains(&band.label.as_str()) {
                labels.push(&band.label);
            }
        }
        labels
    }

    /// Totals within `range` that no band classifies.
    #[must_use]
    pub fn uncovered(&self, range: RangeInclusive<i32>) -> Vec<i32> {
        range.filter(|&value| self.classify(value).is_none()).collect()
    }
}

impl TryFrom<Vec<InjuryBand>> for InjuryTable {
    type Error = EngineError;

    fn try_from(bands: Vec<InjuryBand>) -> Result<Self, Self::Error> {
        Self::new(bands)
    }
}

impl From<InjuryTable> for Vec<InjuryBand> {
    fn from(table: InjuryTable) -> Self {
        table.bands
    }
}

/// Injury outcome odds for a single injury roll.
///
/// Rolls `2 + |dice_mod|` dice, adds `roll_mod`, subtracts `target_armor`
/// and classifies the total. Totals matching no band are dropped, so the
/// result sums to less than one for a table with gaps.
///
/// # Errors
///
/// Returns [`EngineError::PoolTooLarge`] when the modifier asks for more dice
/// than the engine enumerates.
pub fn injury_distribution(
    table: &InjuryTable,
    dice_mod: i32,
    roll_mod: i32,
    target_armor: i32,
) -> Result<OutcomeDistribution, EngineError> {
    let dist = SumDistribution::compute(PoolSpec::from_dice_mod(dice_mod)?);
    Ok(classify_sums(table, &dist, roll_mod, target_armor))
}

pub(crate) fn classify_sums(
    table: &InjuryTable,
    dist: &SumDistribution,
    roll_mod: i32,
    target_armor: i32,
) -> OutcomeDistribution {
    let mut result = OutcomeDistribution::with_labels(table.labels());
    for (value, p) in dist.iter() {
        let total = value.saturating_add(roll_mod).saturating_sub(target_armor);
        match table.classify(total) {
            Some(label) => result.add(label, p),
            None => log::warn!("injury total {total} matches no band; dropping {p:.6} probability"),
        }
    }
    result
}
