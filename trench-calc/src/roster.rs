//! Unit profiles, weapons and keywords that feed the attack modifiers.
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_ROSTER_DATA: &str = include_str!("../data/roster.json");

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("unknown unit profile `{0}`")]
    UnknownProfile(String),
    #[error("unknown weapon `{0}`")]
    UnknownWeapon(String),
    #[error("unknown keyword `{name}` on {owner}")]
    UnknownKeyword { name: String, owner: String },
    #[error("{what} modifiers for {owner} overflow")]
    ModifierOverflow { what: &'static str, owner: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RangeType {
    #[default]
    Melee,
    Ranged,
}

impl fmt::Display for RangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Melee => f.write_str("melee"),
            Self::Ranged => f.write_str("ranged"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponType {
    #[default]
    OneHanded,
    TwoHanded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Keyword {
    pub name: String,
    #[serde(default)]
    pub ranged_dice_mod: i32,
    #[serde(default)]
    pub melee_dice_mod: i32,
    #[serde(default)]
    pub armor_mod: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Weapon {
    pub name: String,
    #[serde(default)]
    pub weapon_type: WeaponType,
    #[serde(default)]
    pub range_type: RangeType,
    /// Zero for melee weapons.
    #[serde(default)]
    pub range_inches: u32,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UnitProfile {
    pub name: String,
    #[serde(default)]
    pub ranged_dice_mod: i32,
    #[serde(default)]
    pub melee_dice_mod: i32,
    #[serde(default)]
    pub armor: i32,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Weapon names; the first is the default weapon in a matchup.
    #[serde(default)]
    pub weapons: Vec<String>,
}

impl UnitProfile {
    #[must_use]
    pub const fn dice_mod_for(&self, range_type: RangeType) -> i32 {
        match range_type {
            RangeType::Melee => self.melee_dice_mod,
            RangeType::Ranged => self.ranged_dice_mod,
        }
    }
}

/// Summed keyword modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct KeywordTotals {
    pub ranged_dice_mod: i32,
    pub melee_dice_mod: i32,
    pub armor_mod: i32,
}

impl KeywordTotals {
    #[must_use]
    pub const fn dice_mod_for(&self, range_type: RangeType) -> i32 {
        match range_type {
            RangeType::Melee => self.melee_dice_mod,
            RangeType::Ranged => self.ranged_dice_mod,
        }
    }

    /// `None` when any field would overflow.
    #[must_use]
    pub fn checked_add(self, keyword: &Keyword) -> Option<Self> {
        Some(Self {
            ranged_dice_mod: self.ranged_dice_mod.checked_add(keyword.ranged_dice_mod)?,
            melee_dice_mod: self.melee_dice_mod.checked_add(keyword.melee_dice_mod)?,
            armor_mod: self.armor_mod.checked_add(keyword.armor_mod)?,
        })
    }
}

/// Every profile, weapon and keyword a matchup can name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Roster {
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(default)]
    pub weapons: Vec<Weapon>,
    #[serde(default)]
    pub profiles: Vec<UnitProfile>,
}

impl Roster {
    /// The roster bundled with the binary.
    ///
    /// # Errors
    ///
    /// Fails only if the bundled JSON is malformed or references unknown names.
    pub fn load_default() -> Result<Self> {
        Self::from_json(DEFAULT_ROSTER_DATA).context("bundled roster is invalid")
    }

    /// Parse a roster and check every keyword and weapon reference.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or a dangling reference.
    pub fn from_json(json: &str) -> Result<Self> {
        let roster: Self = serde_json::from_str(json).context("failed to parse roster JSON")?;
        roster.check_references()?;
        Ok(roster)
    }

    /// # Errors
    ///
    /// Returns an error when the file cannot be read or is not a valid roster.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read roster {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("invalid roster {}", path.display()))
    }

    /// Lookups ignore ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::UnknownProfile`] when no profile matches.
    pub fn profile(&self, name: &str) -> Result<&UnitProfile, RosterError> {
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| RosterError::UnknownProfile(name.to_string()))
    }

    /// # Errors
    ///
    /// Returns [`RosterError::UnknownWeapon`] when no weapon matches.
    pub fn weapon(&self, name: &str) -> Result<&Weapon, RosterError> {
        self.weapons
            .iter()
            .find(|w| w.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| RosterError::UnknownWeapon(name.to_string()))
    }

    #[must_use]
    pub fn keyword(&self, name: &str) -> Option<&Keyword> {
        self.keywords
            .iter()
            .find(|k| k.name.eq_ignore_ascii_case(name))
    }

    /// Sum the modifiers of `names`; `owner` only labels the error.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::UnknownKeyword`] for the first unknown name and
    /// [`RosterError::ModifierOverflow`] when the sums leave `i32`.
    pub fn keyword_totals(
        &self,
        names: &[String],
        owner: &str,
    ) -> Result<KeywordTotals, RosterError> {
        let mut totals = KeywordTotals::default();
        for name in names {
            let keyword = self.keyword(name).ok_or_else(|| RosterError::UnknownKeyword {
                name: name.clone(),
                owner: owner.to_string(),
            })?;
            totals = totals
                .checked_add(keyword)
                .ok_or_else(|| RosterError::ModifierOverflow {
                    what: "keyword",
                    owner: owner.to_string(),
                })?;
        }
        Ok(totals)
    }

    fn check_references(&self) -> Result<(), RosterError> {
        for weapon in &self.weapons {
            self.keyword_totals(&weapon.keywords, &weapon.name)?;
        }
        for profile in &self.profiles {
            self.keyword_totals(&profile.keywords, &profile.name)?;
            for weapon in &profile.weapons {
                self.weapon(weapon)?;
            }
        }
        Ok(())
    }
}
