//! Console, Markdown and JSON renderings of calculated odds.
use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use trench_engine::{
    AttackInput, Keep, MISS_LABEL, OddsCache, OutcomeDistribution, PoolSpec,
    simulate_attacks_seeded,
};

use crate::matchup::ModifierBreakdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Coloured summary for a terminal
    Console,
    /// Tables for pasting into notes
    Markdown,
    /// Machine-readable output
    Json,
}

/// `0.4166…` renders as `41.67%`.
#[must_use]
pub fn format_percent(probability: f64) -> String {
    format!("{:5.2}%", probability * 100.0)
}

/// Sampled frequencies shown beside the exact odds.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub trials: u32,
    pub seed: u64,
    pub outcome: OutcomeDistribution,
    pub max_deviation: f64,
}

/// Exact odds for one attack plus what the reader needs to interpret them.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeReport {
    pub title: String,
    pub input: AttackInput,
    pub hit_probability: f64,
    pub any_injury: f64,
    pub outcome: OutcomeDistribution,
    /// Attainable injury totals no band classifies.
    pub coverage_gaps: Vec<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ModifierBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation: Option<SimulationSummary>,
}

impl OutcomeReport {
    /// # Errors
    ///
    /// Propagates engine errors for oversized pools.
    pub fn exact(
        title: impl Into<String>,
        input: AttackInput,
        cache: &mut OddsCache,
    ) -> Result<Self> {
        let outcome = cache.attack_outcome_probabilities(&input)?;
        let hit_probability = cache.success_probability(
            input.hit_target_number(),
            input.hit_dice_mod(),
            input.hit_roll_mod(),
        )?;
        let coverage_gaps = input.coverage_gaps();
        if !coverage_gaps.is_empty() {
            log::warn!("injury bands leave totals {coverage_gaps:?} uncovered");
        }
        Ok(Self {
            title: title.into(),
            any_injury: outcome.any_injury(),
            hit_probability,
            outcome,
            coverage_gaps,
            breakdown: None,
            simulation: None,
            input,
        })
    }

    #[must_use]
    pub fn with_breakdown(mut self, breakdown: ModifierBreakdown) -> Self {
        self.breakdown = Some(breakdown);
        self
    }

    /// Roll the same attack `trials` times and attach the frequencies.
    ///
    /// # Errors
    ///
    /// Propagates engine errors from the sampler.
    pub fn with_simulation(mut self, trials: u32, seed: u64) -> Result<Self> {
        let outcome = simulate_attacks_seeded(&self.input, trials, seed)?;
        self.simulation = Some(SimulationSummary {
            trials,
            seed,
            max_deviation: self.outcome.max_deviation(&outcome),
            outcome,
        });
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HitTableRow {
    pub dice_mod: i32,
    pub pool_size: u8,
    pub keep: Keep,
    pub probability: f64,
}

/// Hit chance across a run of dice modifiers at one target number.
#[derive(Debug, Clone, Serialize)]
pub struct HitTable {
    pub target_number: i32,
    pub hit_roll_mod: i32,
    pub rows: Vec<HitTableRow>,
}

impl HitTable {
    /// # Errors
    ///
    /// Propagates engine errors for oversized pools.
    pub fn build(
        target_number: i32,
        hit_roll_mod: i32,
        dice_mods: impl IntoIterator<Item = i32>,
        cache: &mut OddsCache,
    ) -> Result<Self> {
        let rows = dice_mods
            .into_iter()
            .map(|dice_mod| -> Result<HitTableRow> {
                let pool = PoolSpec::from_dice_mod(dice_mod)?;
                let probability = cache.success_probability(target_number, dice_mod, hit_roll_mod)?;
                Ok(HitTableRow {
                    dice_mod,
                    pool_size: pool.size(),
                    keep: pool.keep(),
                    probability,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            target_number,
            hit_roll_mod,
            rows,
        })
    }
}

#[derive(Debug, Clone)]
pub enum Report {
    Outcomes(Vec<OutcomeReport>),
    HitTable(HitTable),
}

/// Render `report` in `format`.
///
/// # Errors
///
/// Returns an error when writing fails or JSON serialisation fails.
pub fn write_report(out: &mut dyn Write, format: ReportFormat, report: &Report) -> Result<()> {
    match (format, report) {
        (ReportFormat::Json, Report::Outcomes(reports)) => generate_json_report(out, reports),
        (ReportFormat::Json, Report::HitTable(table)) => generate_json_report(out, table),
        (ReportFormat::Markdown, Report::Outcomes(reports)) => {
            generate_markdown_report(out, reports)
        }
        (ReportFormat::Markdown, Report::HitTable(table)) => {
            generate_markdown_hit_table(out, table)
        }
        (ReportFormat::Console, Report::Outcomes(reports)) => {
            generate_console_report(out, reports)
        }
        (ReportFormat::Console, Report::HitTable(table)) => {
            generate_console_hit_table(out, table)
        }
    }
}

fn generate_json_report<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    let json_output = serde_json::to_string_pretty(value)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

fn label_width(outcome: &OutcomeDistribution) -> usize {
    outcome
        .labels()
        .map(str::len)
        .chain(["Any injury".len()])
        .max()
        .unwrap_or(0)
}

fn describe_input(input: &AttackInput) -> String {
    format!(
        "TN {} | hit dice {:+} | hit roll {:+} | injury dice {:+} | injury roll {:+} | armor {}{}",
        input.hit_target_number(),
        input.hit_dice_mod(),
        input.hit_roll_mod(),
        input.injury_dice_mod(),
        input.injury_roll_mod(),
        input.target_armor(),
        if input.weapon_is_critical() {
            " | critical weapon"
        } else {
            ""
        }
    )
}

fn describe_breakdown(b: &ModifierBreakdown) -> [String; 3] {
    [
        format!(
            "{} vs {} with {} ({})",
            b.attacker,
            b.defender,
            b.weapon.as_deref().unwrap_or("no weapon"),
            b.attack_type
        ),
        format!(
            "hit dice {:+} = profile {:+} + keywords {:+} + weapon {:+} + extra {:+}",
            b.hit_dice_mod,
            b.profile_dice_mod,
            b.attacker_keyword_dice_mod,
            b.weapon_keyword_dice_mod,
            b.extra_hit_dice_mod
        ),
        format!(
            "armor {} = defender {} + keywords {:+} + extra {:+}",
            b.target_armor, b.defender_armor, b.defender_keyword_armor, b.extra_target_armor
        ),
    ]
}

fn gap_warning(gaps: &[i32]) -> String {
    let totals: Vec<String> = gaps.iter().map(ToString::to_string).collect();
    format!(
        "Band table leaves injury totals {} uncovered; their probability is not reported",
        totals.join(", ")
    )
}

fn generate_console_report(out: &mut dyn Write, reports: &[OutcomeReport]) -> Result<()> {
    for report in reports {
        writeln!(out)?;
        writeln!(out, "{}", format!("🎲 {}", report.title).bright_cyan().bold())?;
        writeln!(out, "{}", "=".repeat(30).cyan())?;
        writeln!(out, "{}", describe_input(&report.input).dimmed())?;
        if let Some(breakdown) = &report.breakdown {
            for line in describe_breakdown(breakdown) {
                writeln!(out, "   {line}")?;
            }
        }
        writeln!(out)?;

        let width = label_width(&report.outcome);
        for (label, p) in report.outcome.iter() {
            let name = if label == MISS_LABEL {
                format!("{label:width$}").red()
            } else {
                format!("{label:width$}").normal()
            };
            write!(out, "  {name}  {}", format_percent(p).bold())?;
            if let Some(sim) = &report.simulation {
                write!(out, "   sampled {}", format_percent(sim.outcome.probability(label)))?;
            }
            writeln!(out)?;
        }
        writeln!(
            out,
            "  {:width$}  {}",
            "Any injury",
            format_percent(report.any_injury).green().bold()
        )?;
        writeln!(out, "  Hit chance: {}", format_percent(report.hit_probability).green())?;
        writeln!(out, "  Miss chance: {}", format_percent(report.outcome.miss()).red())?;

        if let Some(sim) = &report.simulation {
            writeln!(
                out,
                "  🔁 {} trials (seed {}), largest deviation {:.4}",
                sim.trials, sim.seed, sim.max_deviation
            )?;
        }
        if !report.coverage_gaps.is_empty() {
            writeln!(out, "  {}", format!("⚠️  {}", gap_warning(&report.coverage_gaps)).yellow())?;
        }
    }
    Ok(())
}

/// Pipes would end the table cell early.
fn markdown_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn generate_markdown_report(out: &mut dyn Write, reports: &[OutcomeReport]) -> Result<()> {
    writeln!(out, "# Trench Calc Attack Odds")?;
    for report in reports {
        writeln!(out)?;
        writeln!(out, "## {}", report.title)?;
        writeln!(out)?;
        writeln!(out, "_{}_", describe_input(&report.input))?;
        if let Some(breakdown) = &report.breakdown {
            writeln!(out)?;
            for line in describe_breakdown(breakdown) {
                writeln!(out, "- {line}")?;
            }
        }
        writeln!(out)?;

        if let Some(sim) = &report.simulation {
            writeln!(out, "| Outcome | Probability | Sampled |")?;
            writeln!(out, "|---------|------------:|--------:|")?;
            for (label, p) in report.outcome.iter() {
                writeln!(
                    out,
                    "| {} | {} | {} |",
                    markdown_cell(label),
                    format_percent(p),
                    format_percent(sim.outcome.probability(label))
                )?;
            }
        } else {
            writeln!(out, "| Outcome | Probability |")?;
            writeln!(out, "|---------|------------:|")?;
            for (label, p) in report.outcome.iter() {
                writeln!(out, "| {} | {} |", markdown_cell(label), format_percent(p))?;
            }
        }
        writeln!(out)?;
        writeln!(out, "- **Hit chance:** {}", format_percent(report.hit_probability))?;
        writeln!(out, "- **Miss chance:** {}", format_percent(report.outcome.miss()))?;
        writeln!(out, "- **Any injury:** {}", format_percent(report.any_injury))?;
        if let Some(sim) = &report.simulation {
            writeln!(
                out,
                "- **Sampled:** {} trials, seed {}, largest deviation {:.4}",
                sim.trials, sim.seed, sim.max_deviation
            )?;
        }
        if !report.coverage_gaps.is_empty() {
            writeln!(out)?;
            writeln!(out, "> ⚠️ {}", gap_warning(&report.coverage_gaps))?;
        }
    }
    Ok(())
}

fn generate_console_hit_table(out: &mut dyn Write, table: &HitTable) -> Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!("🎯 Hit chance at TN {} (hit roll {:+})", table.target_number, table.hit_roll_mod)
            .bright_cyan()
            .bold()
    )?;
    writeln!(out, "{}", "=".repeat(30).cyan())?;
    for row in &table.rows {
        writeln!(
            out,
            "  {:+}  {:>2}d6 keep {:7}  {}",
            row.dice_mod,
            row.pool_size,
            row.keep.to_string(),
            format_percent(row.probability).bold()
        )?;
    }
    Ok(())
}

fn generate_markdown_hit_table(out: &mut dyn Write, table: &HitTable) -> Result<()> {
    writeln!(
        out,
        "# Hit Chance at TN {} (hit roll {:+})\n",
        table.target_number, table.hit_roll_mod
    )?;
    writeln!(out, "| Dice mod | Pool | Keep | Hit chance |")?;
    writeln!(out, "|---------:|-----:|------|-----------:|")?;
    for row in &table.rows {
        writeln!(
            out,
            "| {:+} | {}d6 | {} | {} |",
            row.dice_mod,
            row.pool_size,
            row.keep,
            format_percent(row.probability)
        )?;
    }
    Ok(())
}
