mod matchup;
mod reports;
mod roster;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};

use matchup::{MatchupRequest, build_matchup};
use reports::{HitTable, OutcomeReport, Report, ReportFormat, write_report};
use roster::{RangeType, Roster};
use trench_engine::constants::DEFAULT_TARGET_NUMBER;
use trench_engine::{AttackInput, AttackParams, InjuryTable, OddsCache};

const HIT_TABLE_DICE_MODS: std::ops::RangeInclusive<i32> = -2..=3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Outcome odds for the scalar attack options
    Attack,
    /// Hit chance for dice modifiers -2 to +3
    HitTable,
    /// The same attack with a normal and a critical weapon
    Compare,
    /// Attacker, weapon and defender taken from the roster
    Matchup,
    /// Exact odds beside a seeded Monte Carlo run
    Simulate,
}

#[derive(Debug, Parser)]
#[command(name = "trench-calc", version)]
#[command(about = "Exact attack odds for 2d6 keep-two skirmish rules")]
struct Args {
    /// What to calculate
    #[arg(long, value_enum, default_value_t = Mode::Attack)]
    mode: Mode,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log engine activity at debug level
    #[arg(short, long)]
    verbose: bool,

    /// List roster profiles, weapons and keywords and exit
    #[arg(long)]
    list_roster: bool,

    /// Roster JSON replacing the bundled one
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Injury band JSON replacing the default table
    #[arg(long)]
    bands: Option<PathBuf>,

    /// Hit target number
    #[arg(long, default_value_t = DEFAULT_TARGET_NUMBER, allow_negative_numbers = true)]
    target: i32,

    /// Hit dice modifier (attack, compare, simulate)
    #[arg(long, default_value_t = 2, allow_negative_numbers = true)]
    hit_dice: i32,

    /// Flat hit roll modifier
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    hit_roll: i32,

    /// Injury dice modifier before any crit bonus
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    injury_dice: i32,

    /// Flat injury roll modifier
    #[arg(long, default_value_t = 2, allow_negative_numbers = true)]
    injury_roll: i32,

    /// Target armor (attack, compare, simulate)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    armor: i32,

    /// Weapon adds two injury dice on a crit instead of one
    #[arg(long)]
    critical: bool,

    /// Attacking roster profile (matchup)
    #[arg(long, default_value = "Baseline")]
    attacker: String,

    /// Defending roster profile (matchup)
    #[arg(long, default_value = "Baseline")]
    defender: String,

    /// Weapon name; defaults to the attacker's first weapon (matchup)
    #[arg(long)]
    weapon: Option<String>,

    /// Attack type when no weapon is in play (matchup)
    #[arg(long, value_enum, default_value_t = RangeType::Melee)]
    attack_type: RangeType,

    /// Extra hit dice on top of roster modifiers (matchup)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    extra_hit_dice: i32,

    /// Extra armor on top of roster armor (matchup)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    extra_armor: i32,

    /// Attacks rolled in simulate mode
    #[arg(long, default_value_t = 100_000)]
    trials: u32,

    /// Random seed for simulate mode
    #[arg(long, default_value_t = 1337)]
    seed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let roster = load_roster(args.roster.as_deref())?;
    let mut output_target = OutputTarget::new(args.output.clone())?;
    if matches!(output_target, OutputTarget::File(_)) {
        colored::control::set_override(false);
    }

    if args.list_roster {
        write_roster(output_target.writer(), &roster)?;
        output_target.flush_inner()?;
        return Ok(());
    }

    let table = load_bands(args.bands.as_deref())?;
    let report = build_report(&args, &roster, &table)?;
    if args.report == ReportFormat::Console {
        announce_banner(output_target.writer())?;
    }
    write_report(output_target.writer(), args.report, &report)?;
    output_target.flush_inner()?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn load_roster(path: Option<&Path>) -> Result<Roster> {
    match path {
        Some(path) => Roster::load(path),
        None => Roster::load_default(),
    }
}

fn load_bands(path: Option<&Path>) -> Result<InjuryTable> {
    let Some(path) = path else {
        return Ok(InjuryTable::with_defaults());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read injury bands {}", path.display()))?;
    InjuryTable::from_json(&json)
        .with_context(|| format!("invalid injury bands {}", path.display()))
}

fn announce_banner(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", "🪖 Trench Calc".bright_cyan().bold())?;
    writeln!(out, "{}", "==============".cyan())?;
    Ok(())
}

fn write_roster(out: &mut dyn Write, roster: &Roster) -> Result<()> {
    writeln!(out, "Profiles:")?;
    for p in &roster.profiles {
        writeln!(
            out,
            "  {:16} ranged {:+} melee {:+} armor {}  keywords [{}]  weapons [{}]",
            p.name,
            p.ranged_dice_mod,
            p.melee_dice_mod,
            p.armor,
            p.keywords.join(", "),
            p.weapons.join(", ")
        )?;
    }
    writeln!(out, "Weapons:")?;
    for w in &roster.weapons {
        writeln!(
            out,
            "  {:16} {:?} {} {}\"  keywords [{}]",
            w.name,
            w.weapon_type,
            w.range_type,
            w.range_inches,
            w.keywords.join(", ")
        )?;
    }
    writeln!(out, "Keywords:")?;
    for k in &roster.keywords {
        writeln!(
            out,
            "  {:16} ranged {:+} melee {:+} armor {:+}",
            k.name, k.ranged_dice_mod, k.melee_dice_mod, k.armor_mod
        )?;
    }
    Ok(())
}

fn scalar_input(args: &Args, table: &InjuryTable) -> Result<AttackInput> {
    let input = AttackParams {
        hit_target_number: args.target,
        hit_dice_mod: args.hit_dice,
        hit_roll_mod: args.hit_roll,
        weapon_is_critical: args.critical,
        injury_bands: table.clone().into(),
        injury_dice_mod: args.injury_dice,
        injury_roll_mod: args.injury_roll,
        target_armor: args.armor,
    }
    .validate()?;
    Ok(input)
}

fn matchup_request(args: &Args) -> MatchupRequest {
    MatchupRequest {
        attacker: args.attacker.clone(),
        defender: args.defender.clone(),
        weapon: args.weapon.clone(),
        attack_type: args.attack_type,
        hit_target_number: args.target,
        extra_hit_dice_mod: args.extra_hit_dice,
        hit_roll_mod: args.hit_roll,
        injury_dice_mod: args.injury_dice,
        injury_roll_mod: args.injury_roll,
        extra_target_armor: args.extra_armor,
        weapon_is_critical: args.critical,
    }
}

fn build_report(args: &Args, roster: &Roster, table: &InjuryTable) -> Result<Report> {
    let mut cache = OddsCache::new();
    let report = match args.mode {
        Mode::Attack => {
            let input = scalar_input(args, table)?;
            Report::Outcomes(vec![OutcomeReport::exact("Attack", input, &mut cache)?])
        }
        Mode::HitTable => Report::HitTable(HitTable::build(
            args.target,
            args.hit_roll,
            HIT_TABLE_DICE_MODS,
            &mut cache,
        )?),
        Mode::Compare => {
            let input = scalar_input(args, table)?;
            let normal = input.with_critical_weapon(false);
            let critical = input.with_critical_weapon(true);
            Report::Outcomes(vec![
                OutcomeReport::exact("Normal weapon", normal, &mut cache)?,
                OutcomeReport::exact("Critical weapon", critical, &mut cache)?,
            ])
        }
        Mode::Matchup => {
            let matchup = build_matchup(roster, &matchup_request(args), table)?;
            let title = format!(
                "{} vs {}",
                matchup.breakdown.attacker, matchup.breakdown.defender
            );
            let report = OutcomeReport::exact(title, matchup.input, &mut cache)?
                .with_breakdown(matchup.breakdown);
            Report::Outcomes(vec![report])
        }
        Mode::Simulate => {
            let input = scalar_input(args, table)?;
            let report = OutcomeReport::exact("Simulated attack", input, &mut cache)?
                .with_simulation(args.trials, args.seed)?;
            Report::Outcomes(vec![report])
        }
    };
    log::debug!("odds cache holds {} tables", cache.len());
    Ok(report)
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
