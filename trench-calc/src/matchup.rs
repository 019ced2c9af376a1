//! Turning an attacker, a weapon and a defender into engine scalars.
use anyhow::Result;
use serde::Serialize;
use trench_engine::{AttackInput, AttackParams, InjuryTable};

use crate::roster::{RangeType, Roster, RosterError, Weapon};

/// Roster names plus the form scalars a roster cannot supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchupRequest {
    pub attacker: String,
    pub defender: String,
    /// Defaults to the attacker's first weapon.
    pub weapon: Option<String>,
    /// Used only when no weapon is in play.
    pub attack_type: RangeType,
    pub hit_target_number: i32,
    pub extra_hit_dice_mod: i32,
    pub hit_roll_mod: i32,
    pub injury_dice_mod: i32,
    pub injury_roll_mod: i32,
    pub extra_target_armor: i32,
    pub weapon_is_critical: bool,
}

/// Where each aggregated modifier came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifierBreakdown {
    pub attacker: String,
    pub defender: String,
    pub weapon: Option<String>,
    pub attack_type: RangeType,
    pub profile_dice_mod: i32,
    pub attacker_keyword_dice_mod: i32,
    pub weapon_keyword_dice_mod: i32,
    pub extra_hit_dice_mod: i32,
    pub hit_dice_mod: i32,
    pub defender_armor: i32,
    pub defender_keyword_armor: i32,
    pub extra_target_armor: i32,
    pub target_armor: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matchup {
    pub breakdown: ModifierBreakdown,
    pub input: AttackInput,
}

fn resolve_weapon<'a>(
    roster: &'a Roster,
    request: &MatchupRequest,
    carried: &[String],
) -> Result<Option<&'a Weapon>> {
    let name = request.weapon.as_deref().or(carried.first().map(String::as_str));
    Ok(name.map(|name| roster.weapon(name)).transpose()?)
}

fn sum_modifiers(what: &'static str, owner: &str, parts: &[i32]) -> Result<i32, RosterError> {
    parts
        .iter()
        .try_fold(0_i32, |total, &part| total.checked_add(part))
        .ok_or_else(|| RosterError::ModifierOverflow {
            what,
            owner: owner.to_string(),
        })
}

/// Aggregate profile, keyword and weapon modifiers into a validated attack.
///
/// # Errors
///
/// Returns a [`crate::roster::RosterError`] for unknown names and an
/// engine error when the resulting attack is invalid.
pub fn build_matchup(
    roster: &Roster,
    request: &MatchupRequest,
    table: &InjuryTable,
) -> Result<Matchup> {
    let attacker = roster.profile(&request.attacker)?;
    let defender = roster.profile(&request.defender)?;
    let weapon = resolve_weapon(roster, request, &attacker.weapons)?;
    let attack_type = weapon.map_or(request.attack_type, |w| w.range_type);

    let attacker_keywords = roster.keyword_totals(&attacker.keywords, &attacker.name)?;
    let weapon_keywords = match weapon {
        Some(w) => roster.keyword_totals(&w.keywords, &w.name)?,
        None => Default::default(),
    };
    let defender_keywords = roster.keyword_totals(&defender.keywords, &defender.name)?;

    let profile_dice_mod = attacker.dice_mod_for(attack_type);
    let attacker_keyword_dice_mod = attacker_keywords.dice_mod_for(attack_type);
    let weapon_keyword_dice_mod = weapon_keywords.dice_mod_for(attack_type);
    let hit_dice_mod = sum_modifiers(
        "hit dice",
        &attacker.name,
        &[
            profile_dice_mod,
            attacker_keyword_dice_mod,
            weapon_keyword_dice_mod,
            request.extra_hit_dice_mod,
        ],
    )?;
    let target_armor = sum_modifiers(
        "armor",
        &defender.name,
        &[
            defender.armor,
            defender_keywords.armor_mod,
            request.extra_target_armor,
        ],
    )?;

    let breakdown = ModifierBreakdown {
        attacker: attacker.name.clone(),
        defender: defender.name.clone(),
        weapon: weapon.map(|w| w.name.clone()),
        attack_type,
        profile_dice_mod,
        attacker_keyword_dice_mod,
        weapon_keyword_dice_mod,
        extra_hit_dice_mod: request.extra_hit_dice_mod,
        hit_dice_mod,
        defender_armor: defender.armor,
        defender_keyword_armor: defender_keywords.armor_mod,
        extra_target_armor: request.extra_target_armor,
        target_armor,
    };
    log::debug!("matchup modifiers: {breakdown:?}");

    let input = AttackParams {
        hit_target_number: request.hit_target_number,
        hit_dice_mod,
        hit_roll_mod: request.hit_roll_mod,
        weapon_is_critical: request.weapon_is_critical,
        injury_bands: table.clone().into(),
        injury_dice_mod: request.injury_dice_mod,
        injury_roll_mod: request.injury_roll_mod,
        target_armor,
    }
    .validate()?;

    Ok(Matchup { breakdown, input })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(attacker: &str, defender: &str) -> MatchupRequest {
        MatchupRequest {
            attacker: attacker.to_string(),
            defender: defender.to_string(),
            weapon: None,
            attack_type: RangeType::Melee,
            hit_target_number: 7,
            extra_hit_dice_mod: 0,
            hit_roll_mod: 0,
            injury_dice_mod: 0,
            injury_roll_mod: 2,
            extra_target_armor: 0,
            weapon_is_critical: false,
        }
    }

    fn build(request: &MatchupRequest) -> Result<Matchup> {
        let roster = Roster::load_default()?;
        build_matchup(&roster, request, &InjuryTable::with_defaults())
    }

    #[test]
    fn first_weapon_sets_the_attack_type() {
        let matchup = build(&request("Rifleman", "Baseline")).unwrap();
        assert_eq!(matchup.breakdown.weapon.as_deref(), Some("Bolt Action Rifle"));
        assert_eq!(matchup.breakdown.attack_type, RangeType::Ranged);
        assert_eq!(matchup.input.hit_dice_mod(), 2);
        assert_eq!(matchup.input.target_armor(), 0);
        assert_eq!(matchup.input.injury_roll_mod(), 2);
    }

    #[test]
    fn explicit_weapon_overrides_the_default() {
        let mut req = request("Rifleman", "Baseline");
        req.weapon = Some("Trench Knife".to_string());
        let matchup = build(&req).unwrap();
        assert_eq!(matchup.breakdown.attack_type, RangeType::Melee);
        assert_eq!(matchup.input.hit_dice_mod(), 0);
    }

    #[test]
    fn keywords_and_extras_are_summed() {
        let mut req = request("Bruiser", "Shield Bearer");
        req.extra_hit_dice_mod = 1;
        req.extra_target_armor = -1;
        let matchup = build(&req).unwrap();
        let b = &matchup.breakdown;
        // Bruiser melee +2, Frenzy +1, Great Hammer's Cumbersome -1, extra +1.
        assert_eq!(b.profile_dice_mod, 2);
        assert_eq!(b.attacker_keyword_dice_mod, 1);
        assert_eq!(b.weapon_keyword_dice_mod, -1);
        assert_eq!(b.hit_dice_mod, 3);
        // Shield Bearer armor 1, Heavy Armour +1, Shield +1, extra -1.
        assert_eq!(b.defender_keyword_armor, 2);
        assert_eq!(b.target_armor, 2);
        assert_eq!(matchup.input.hit_dice_mod(), 3);
        assert_eq!(matchup.input.target_armor(), 2);
    }

    #[test]
    fn unarmed_profiles_use_the_requested_type() {
        let mut req = request("Baseline", "Bruiser");
        req.attack_type = RangeType::Ranged;
        let matchup = build(&req).unwrap();
        assert_eq!(matchup.breakdown.weapon, None);
        assert_eq!(matchup.breakdown.attack_type, RangeType::Ranged);
        assert_eq!(matchup.input.target_armor(), 2);
    }

    #[test]
    fn unknown_names_surface_roster_errors() {
        let err = build(&request("Nobody", "Baseline")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RosterError>(),
            Some(&RosterError::UnknownProfile("Nobody".to_string()))
        );

        let mut req = request("Baseline", "Baseline");
        req.weapon = Some("Lance".to_string());
        let err = build(&req).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RosterError>(),
            Some(RosterError::UnknownWeapon(_))
        ));
    }

    #[test]
    fn invalid_attacks_are_rejected() {
        let mut req = request("Baseline", "Baseline");
        req.hit_target_number = 1;
        assert!(build(&req).is_err());
    }

    #[test]
    fn oversized_modifiers_are_errors_not_wraps() {
        let roster = Roster::from_json(
            r#"{
                "keywords": [{ "name": "K", "melee_dice_mod": 2147483647, "armor_mod": 2147483647 }],
                "profiles": [{ "name": "A", "melee_dice_mod": 5, "armor": 1, "keywords": ["K"] }]
            }"#,
        )
        .unwrap();
        let err = build_matchup(&roster, &request("A", "A"), &InjuryTable::with_defaults())
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<RosterError>(),
            Some(&RosterError::ModifierOverflow {
                what: "hit dice",
                owner: "A".to_string(),
            })
        );

        let mut req = request("Baseline", "A");
        req.attack_type = RangeType::Ranged;
        let err = build_matchup(&roster, &req, &InjuryTable::with_defaults()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RosterError>(),
            Some(RosterError::ModifierOverflow { what: "armor", .. })
        ));
    }
}
