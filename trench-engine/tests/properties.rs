use trench_engine::{
    AttackParams, InjuryBand, InjuryTable, Keep, OddsCache, PROBABILITY_TOLERANCE, PoolSpec,
    SumDistribution, attack_outcome_probabilities, dice_sum_distribution, hit_branches,
    success_probability,
};

#[test]
fn sum_distributions_are_normalised() {
    for num_dice in 1..=10 {
        for keep_highest in [true, false] {
            let dist = dice_sum_distribution(num_dice, keep_highest).unwrap();
            assert!(
                (dist.total() - 1.0).abs() < PROBABILITY_TOLERANCE,
                "{num_dice} dice, keep_highest={keep_highest}"
            );
            assert!(dist.iter().all(|(_, p)| p > 0.0 && p <= 1.0));
        }
    }
}

#[test]
fn hit_marginals_recover_sum_distributions() {
    for dice_mod in -5..=5 {
        let branches = hit_branches(dice_mod).unwrap();
        let dist = SumDistribution::compute(PoolSpec::from_dice_mod(dice_mod).unwrap());
        let marginal = branches.kept_marginal();
        assert_eq!(marginal.len(), dist.len());
        for (sum, p) in dist.iter() {
            assert!(
                (marginal[&sum] - p).abs() < PROBABILITY_TOLERANCE,
                "mod {dice_mod} sum {sum}"
            );
        }
    }
}

#[test]
fn crit_chance_depends_only_on_pool_size() {
    for extra in 0..=4 {
        let bonus = hit_branches(extra).unwrap().crit_probability();
        let penalty = hit_branches(-extra).unwrap().crit_probability();
        assert!((bonus - penalty).abs() < PROBABILITY_TOLERANCE, "extra dice {extra}");
    }
}

#[test]
fn success_never_drops_with_more_bonus_dice() {
    let mut cache = OddsCache::new();
    for target in 2..=14 {
        for roll_mod in -2..=2 {
            let mut previous = 0.0;
            for dice_mod in -5..=5 {
                let p = cache.success_probability(target, dice_mod, roll_mod).unwrap();
                assert!(p + PROBABILITY_TOLERANCE >= previous);
                assert_eq!(p, success_probability(target, dice_mod, roll_mod).unwrap());
                previous = p;
            }
        }
    }
}

#[test]
fn covered_attacks_sum_to_one() {
    let mut cache = OddsCache::new();
    for hit_dice_mod in -3..=3 {
        for injury_dice_mod in -2..=2 {
            for weapon_is_critical in [false, true] {
                for target_armor in [0, 1, 3] {
                    let input = AttackParams {
                        hit_target_number: 8,
                        hit_dice_mod,
                        hit_roll_mod: 1,
                        weapon_is_critical,
                        injury_bands: vec![
                            InjuryBand::new(i32::MIN, Some(6), "Flesh Wound"),
                            InjuryBand::bounded(7, 8, "Down"),
                            InjuryBand::open(9, "Out of Action"),
                        ],
                        injury_dice_mod,
                        injury_roll_mod: 1,
                        target_armor,
                    }
                    .validate()
                    .unwrap();
                    assert!(input.coverage_gaps().is_empty());
                    let outcome = cache.attack_outcome_probabilities(&input).unwrap();
                    assert!(
                        (outcome.total() - 1.0).abs() < PROBABILITY_TOLERANCE,
                        "hit {hit_dice_mod} injury {injury_dice_mod} crit {weapon_is_critical} armor {target_armor}"
                    );
                    let hit = input.hit_probability().unwrap();
                    assert!((outcome.any_injury() - hit).abs() < PROBABILITY_TOLERANCE);
                }
            }
        }
    }
}

#[test]
fn crit_weapon_never_changes_miss_chance() {
    let table = InjuryTable::with_defaults();
    for hit_dice_mod in -3..=3 {
        let params = AttackParams {
            hit_dice_mod,
            injury_bands: table.bands().to_vec(),
            injury_roll_mod: 2,
            ..AttackParams::default()
        };
        let plain = params.clone().validate().unwrap();
        let critical = plain.with_critical_weapon(true);
        let plain_outcome = attack_outcome_probabilities(&plain).unwrap();
        let critical_outcome = attack_outcome_probabilities(&critical).unwrap();
        assert_eq!(plain_outcome.miss(), critical_outcome.miss());
        assert!(
            critical_outcome.probability("Out of Action")
                >= plain_outcome.probability("Out of Action")
        );
    }
}

#[test]
fn keep_direction_mirrors_sums() {
    for size in 2..=6 {
        let high = SumDistribution::compute(PoolSpec::new(size, Keep::Highest).unwrap());
        let low = SumDistribution::compute(PoolSpec::new(size, Keep::Lowest).unwrap());
        for (sum, p) in high.iter() {
            assert!((low.probability(14 - sum) - p).abs() < PROBABILITY_TOLERANCE);
        }
    }
}
