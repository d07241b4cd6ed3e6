//! Terminal rendering of simulation results.

use crate::gacha::{self, HARD_PITY, PROB_5, SOFT_PITY_START, SPARK_PULL};
use crate::sim::{SimOutput, TopUpSimOutput};
use crate::stats::DistributionEntry;
use crate::weapon;
use colored::*;

const BAR_WIDTH: f64 = 40.0;

fn header(title: &str) -> String {
    format!("{}\n", format!("=== {} ===", title).purple().bold())
}

fn section(title: &str) -> String {
    format!("\n{}\n", title.cyan().bold())
}

fn bar(percentage: f64) -> String {
    let len = (percentage / 100.0 * BAR_WIDTH).round() as usize;
    "#".repeat(len)
}

fn push_distribution(out: &mut String, unit: &str, entries: &[DistributionEntry]) {
    for e in entries {
        out.push_str(&format!(
            "  {:>6} {:<10} {:>6.2}%  {}\n",
            e.value,
            unit,
            e.percentage,
            bar(e.percentage).green()
        ));
    }
}

fn push_lines(out: &mut String, lines: &[String]) {
    for line in lines {
        out.push_str(&format!("  - {}\n", line.dimmed()));
    }
}

pub fn render_simulation(output: &SimOutput) -> String {
    let mut out = header("Banner Planner: Resource-Constrained Run");

    out.push_str(&section("Resources"));
    out.push_str(&format!("Planned pulls: {}\n", output.total_pulls));
    out.push_str(&format!("Avg pulls gained (incl. bonuses): {:.1}\n", output.avg_total_pulls_gained));
    push_lines(&mut out, &output.pulls_breakdown_lines);
    out.push_str(&format!("Avg arsenal gained: {:.0}\n", output.avg_arsenal_gained));
    push_lines(&mut out, &output.arsenal_breakdown_lines);
    out.push_str(&format!("Avg pulls spent: {:.1}\n", output.avg_pulls_spent));
    out.push_str(&format!(
        "Avg arsenal spent: {:.0} ({:.2} claims)\n",
        output.avg_arsenal_spent, output.avg_arsenal_claims
    ));

    out.push_str(&section("Limited Characters"));
    out.push_str(&format!(
        "Avg obtained: {:.2} / {} (median {})\n",
        output.avg_characters_obtained, output.total_characters, output.median_characters_obtained
    ));
    push_distribution(&mut out, "chars", &output.character_distribution);
    out.push_str(&format!("{}\n", output.character_median_summary.yellow()));
    out.push_str(&format!("{}\n", output.character_cumulative_summary.yellow()));

    out.push_str(&section("Signature Weapons"));
    out.push_str(&format!(
        "Avg obtained: {:.2} / {} (median {})\n",
        output.avg_weapons_obtained, output.total_weapons, output.median_weapons_obtained
    ));
    push_distribution(&mut out, "weapons", &output.weapon_distribution);
    out.push_str(&format!("{}\n", output.weapon_median_summary.yellow()));
    out.push_str(&format!("{}\n", output.weapon_cumulative_summary.yellow()));

    out.push_str(&section("Stockpile Spend"));
    let rate = format!("{:.2}%", output.success_rate * 100.0);
    out.push_str(&format!("All characters obtained: {}\n", rate.green().bold()));
    out.push_str(&format!(
        "Avg {:.1} | P50 {} | P90 {} | P99 {}\n",
        output.avg_spent, output.p50_spent, output.p90_spent, output.p99_spent
    ));

    out.push_str(&format!("\n{}\n", output.debug.note.dimmed()));
    out
}

pub fn render_top_up(output: &TopUpSimOutput) -> String {
    let mut out = header("Banner Planner: Full Collection Top-Up Estimate");

    out.push_str(&section("Without Top-Up"));
    out.push_str(&format!("Pulls available: {}\n", output.total_pulls_no_top_up));
    push_lines(&mut out, &output.pulls_no_top_up_breakdown_lines);
    out.push_str(&format!("Avg arsenal available: {:.0}\n", output.avg_arsenal_gained_no_top_up));
    push_lines(&mut out, &output.arsenal_no_top_up_breakdown_lines);
    out.push_str(&format!(
        "Avg spent for full collection: {:.1} pulls, {:.0} arsenal\n",
        output.avg_pulls_spent, output.avg_arsenal_spent
    ));

    out.push_str(&section("Top-Up Pulls"));
    out.push_str(&format!(
        "Avg {:.1} | Median {}\n",
        output.avg_top_up_pulls, output.median_top_up_pulls
    ));
    push_distribution(&mut out, "pulls", &output.top_up_pulls_distribution);
    out.push_str(&format!("{}\n", output.top_up_pulls_median_summary.yellow()));
    out.push_str(&format!("{}\n", output.top_up_pulls_cumulative_summary.yellow()));

    out.push_str(&section("Top-Up Arsenal"));
    out.push_str(&format!(
        "Avg {:.0} | Median {}\n",
        output.avg_top_up_arsenal, output.median_top_up_arsenal
    ));
    push_distribution(&mut out, "arsenal", &output.top_up_arsenal_distribution);
    out.push_str(&format!("{}\n", output.top_up_arsenal_median_summary.yellow()));
    out.push_str(&format!("{}\n", output.top_up_arsenal_cumulative_summary.yellow()));

    out.push_str(&format!("\n{}\n", output.debug.note.dimmed()));
    out
}

/// Per-pull 6★ odds across the pity counter, plus the weapon banner table.
pub fn render_rates() -> String {
    let mut out = header("Pull Rates");

    out.push_str(&section("Character Banner"));
    out.push_str(&format!("5★ rate: {:.1}% | rate-up share of 6★: 50%\n", PROB_5 * 100.0));
    out.push_str(&format!(
        "Soft pity from counter {}, hard pity at {}, spark at banner pull {}\n",
        SOFT_PITY_START, HARD_PITY, SPARK_PULL
    ));
    for counter in (SOFT_PITY_START - 1)..=HARD_PITY {
        let p = gacha::six_star_probability(counter) * 100.0;
        out.push_str(&format!("  counter {:>2}: {:>6.1}%  {}\n", counter, p, bar(p).green()));
    }
    out.push_str(&format!(
        "Expected pulls per 6★: {}\n",
        format!("{:.2}", gacha::expected_pulls_per_six()).green().bold()
    ));

    out.push_str(&section("Weapon Banner"));
    out.push_str(&format!(
        "6★ {:.0}% | 5★ {:.0}% | rate-up share of 6★: {:.0}%\n",
        weapon::PROB_6 * 100.0,
        weapon::PROB_5 * 100.0,
        weapon::RATE_UP_RATIO * 100.0
    ));
    out.push_str(&format!(
        "{} pulls per claim for {} arsenal; 6★ guaranteed on claim {}, rate-up on claim {}\n",
        weapon::PULLS_PER_CLAIM,
        weapon::ARSENAL_COST_PER_CLAIM,
        weapon::WEAPON_PITY_THRESHOLD + 1,
        weapon::WEAPON_SPARK_THRESHOLD + 1
    ));
    out
}
