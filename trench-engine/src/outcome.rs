//! Labelled outcome probabilities produced by the engine.
use serde::{Deserialize, Serialize};

use crate::constants::MISS_LABEL;

/// One labelled outcome and its probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEntry {
    pub label: String,
    pub probability: f64,
}

/// Probabilities keyed by outcome label, in first-seen label order.
///
/// Attack results list [`MISS_LABEL`] first and then every distinct band
/// label in table order. Labels are unique; adding to an existing label
/// accumulates into it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutcomeDistribution {
    entries: Vec<OutcomeEntry>,
}

impl OutcomeDistribution {
    /// Start a distribution with every label at zero. Duplicates collapse.
    #[must_use]
    pub fn with_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dist = Self::default();
        for label in labels {
            dist.add(label.as_ref(), 0.0);
        }
        dist
    }

    pub(crate) fn add(&mut self, label: &str, probability: f64) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.label == label) {
            entry.probability += probability;
        } else {
            self.entries.push(OutcomeEntry {
                label: label.to_string(),
                probability,
            });
        }
    }

    /// Probability of `label`, if the label is tracked.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.probability)
    }

    /// Probability of `label`; zero when untracked.
    #[must_use]
    pub fn probability(&self, label: &str) -> f64 {
        self.get(label).unwrap_or(0.0)
    }

    #[must_use]
    pub fn miss(&self) -> f64 {
        self.probability(MISS_LABEL)
    }

    /// Chance the attack reaches the injury roll at all.
    #[must_use]
    pub fn any_injury(&self) -> f64 {
        1.0 - self.miss()
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.probability).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries
            .iter()
            .map(|e| (e.label.as_str(), e.probability))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.label.as_str())
    }

    #[must_use]
    pub fn entries(&self) -> &[OutcomeEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest absolute difference between the two distributions over the
    /// union of their labels.
    #[must_use]
    pub fn max_deviation(&self, other: &Self) -> f64 {
        self.labels()
            .chain(other.labels())
            .map(|label| (self.probability(label) - other.probability(label)).abs())
            .fold(0.0, f64::max)
    }
}
