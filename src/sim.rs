use crate::rng::Rng;
use crate::stats::{self, DistributionEntry};
use crate::strategy::{BaseStrategy, StrategyConfig, BANNER_BONUS_PULLS};
use crate::trial::{self, StrategyExecutionResult, TopUpTrialResult, TrialPlan};
use crate::weapon::ARSENAL_COST_PER_CLAIM;
use log::{debug, info};
use serde::{Deserialize, Serialize};

// Constants
pub const PROGRESS_INTERVAL: usize = 500;
pub const TOP_UP_ARSENAL_BUCKET: u64 = 1000;
pub const CUMULATIVE_TARGET_PCT: f64 = 75.0;
/// Largest integer an f64 holds exactly; sanitized inputs never exceed it.
pub const MAX_INPUT_VALUE: u64 = (1 << 53) - 1;

/// Scenario as supplied by a caller. Numbers are raw and get sanitized by
/// [`SimInput::plan`] and [`SimInput::trial_count`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimInput {
    pub current_pulls: f64,
    pub current_arsenal: f64,
    pub pulls_per_version: f64,
    pub arsenal_per_version: f64,
    pub version_count: f64,
    pub banners_per_version: f64,
    pub exclude_first_version_resources: bool,
    pub strategy_id: BaseStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_config: Option<StrategyConfig>,
    pub trials: f64,
    pub seed: Option<String>,
}

impl Default for SimInput {
    fn default() -> Self {
        SimInput {
            current_pulls: 0.0,
            current_arsenal: 0.0,
            pulls_per_version: 60.0,
            arsenal_per_version: 1980.0,
            version_count: 6.0,
            banners_per_version: 2.0,
            exclude_first_version_resources: false,
            strategy_id: BaseStrategy::S1,
            strategy_config: None,
            trials: 5000.0,
            seed: None,
        }
    }
}

/// Floors, clamps into `min..=MAX_INPUT_VALUE`, and maps NaN/infinity to `min`.
fn sanitize(value: f64, min: u64) -> u64 {
    if !value.is_finite() {
        return min;
    }
    // float -> int casts saturate
    (value.floor().max(0.0) as u64).clamp(min, MAX_INPUT_VALUE)
}

fn sanitize_u32(value: f64, min: u32) -> u32 {
    u32::try_from(sanitize(value, u64::from(min))).unwrap_or(u32::MAX)
}

impl SimInput {
    pub fn plan(&self) -> TrialPlan {
        TrialPlan {
            initial_pulls: sanitize(self.current_pulls, 0),
            initial_arsenal: sanitize(self.current_arsenal, 0),
            pulls_per_version: sanitize(self.pulls_per_version, 0),
            arsenal_per_version: sanitize(self.arsenal_per_version, 0),
            version_count: sanitize_u32(self.version_count, 1),
            banners_per_version: sanitize_u32(self.banners_per_version, 1),
            exclude_first_version_resources: self.exclude_first_version_resources,
        }
    }

    pub fn trial_count(&self) -> usize {
        usize::try_from(sanitize(self.trials, 1)).unwrap_or(usize::MAX)
    }

    /// The full config when given, else the defaults of `strategy_id`.
    pub fn strategy(&self) -> StrategyConfig {
        self.strategy_config
            .clone()
            .unwrap_or_else(|| StrategyConfig::for_base(self.strategy_id))
    }

    pub fn seed(&self) -> Option<&str> {
        self.seed.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub note: String,
    pub input_echo: SimInput,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimOutput {
    pub total_pulls: u64,
    pub avg_total_pulls_gained: f64,
    pub avg_arsenal_gained: f64,
    pub avg_pulls_spent: f64,
    pub avg_arsenal_spent: f64,
    pub avg_arsenal_claims: f64,
    pub pulls_breakdown_lines: Vec<String>,
    pub arsenal_breakdown_lines: Vec<String>,

    pub total_characters: u64,
    pub avg_characters_obtained: f64,
    pub median_characters_obtained: u64,
    pub character_distribution: Vec<DistributionEntry>,
    pub character_median_summary: String,
    pub character_cumulative_summary: String,

    pub total_weapons: u64,
    pub avg_weapons_obtained: f64,
    pub median_weapons_obtained: u64,
    pub weapon_distribution: Vec<DistributionEntry>,
    pub weapon_median_summary: String,
    pub weapon_cumulative_summary: String,

    /// Share of trials that obtained every character.
    pub success_rate: f64,
    /// Stockpile pulls spent per trial.
    pub avg_spent: f64,
    pub p50_spent: u64,
    pub p90_spent: u64,
    pub p99_spent: u64,

    pub debug: DebugInfo,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpSimOutput {
    pub total_pulls_no_top_up: u64,
    pub avg_arsenal_gained_no_top_up: f64,
    pub pulls_no_top_up_breakdown_lines: Vec<String>,
    pub arsenal_no_top_up_breakdown_lines: Vec<String>,

    pub avg_pulls_spent: f64,
    pub avg_arsenal_spent: f64,

    pub avg_top_up_pulls: f64,
    pub median_top_up_pulls: u64,
    pub avg_top_up_arsenal: f64,
    pub median_top_up_arsenal: u64,

    pub top_up_pulls_distribution: Vec<DistributionEntry>,
    /// Bucketed to widths of 1000.
    pub top_up_arsenal_distribution: Vec<DistributionEntry>,

    pub top_up_pulls_median_summary: String,
    pub top_up_pulls_cumulative_summary: String,
    pub top_up_arsenal_median_summary: String,
    pub top_up_arsenal_cumulative_summary: String,

    pub debug: DebugInfo,
}

/// Runs `trial` `total` times on one RNG stream, reporting progress every
/// `PROGRESS_INTERVAL` trials and at completion.
fn collect_trials<T>(
    total: usize,
    rng: &mut Rng,
    mut on_progress: Option<&mut dyn FnMut(usize, usize)>,
    mut trial: impl FnMut(&mut Rng) -> T,
) -> Vec<T> {
    let mut results = Vec::with_capacity(total);
    for i in 0..total {
        results.push(trial(rng));
        let done = i + 1;
        if done % PROGRESS_INTERVAL == 0 || done == total {
            debug!("Progress: {}/{}", done, total);
            if let Some(cb) = on_progress.as_deref_mut() {
                cb(done, total);
            }
        }
    }
    results
}

pub(crate) fn run_note(mode: &str, input: &SimInput, config: &StrategyConfig) -> String {
    format!(
        "{} Monte Carlo, {} trials, strategy {}, seed {}",
        mode,
        input.trial_count(),
        config.display_name(),
        input.seed().filter(|s| !s.is_empty()).unwrap_or("<time-based>")
    )
}

pub fn run_simulation(input: &SimInput, on_progress: Option<&mut dyn FnMut(usize, usize)>) -> SimOutput {
    let plan = input.plan();
    let config = input.strategy();
    let total = input.trial_count();
    let mut rng = Rng::from_optional_seed(input.seed());

    info!("Running {} trials with {}", total, config.display_name());
    let results = collect_trials(total, &mut rng, on_progress, |rng| {
        trial::execute_strategy(&config, &plan, rng)
    });
    let output = summarize_simulation(input, &results, run_note("Sequential", input, &config));
    info!("Simulation finished: success rate {:.2}%", output.success_rate * 100.0);
    output
}

pub fn run_top_up_simulation(
    input: &SimInput,
    on_progress: Option<&mut dyn FnMut(usize, usize)>,
) -> TopUpSimOutput {
    let plan = input.plan();
    let config = input.strategy();
    let total = input.trial_count();
    let mut rng = Rng::from_optional_seed(input.seed());

    info!("Running {} top-up trials with {}", total, config.display_name());
    let results = collect_trials(total, &mut rng, on_progress, |rng| {
        trial::execute_top_up(&config, &plan, rng)
    });
    let output = summarize_top_up(input, &results, run_note("Sequential", input, &config));
    info!("Top-up estimate finished: median {} pulls", output.median_top_up_pulls);
    output
}

// --- Summaries ---

fn income_line(label: &str, per_version: u64, versions: u64) -> String {
    format!(
        "{}: {} x {} versions = {}",
        label,
        per_version,
        versions,
        per_version.saturating_mul(versions)
    )
}

fn count_summaries(noun: &str, total: u64, values: &[u64]) -> (String, String) {
    let sorted = stats::sorted(values);
    let median = stats::quantile(&sorted, 0.5);
    let median_line = format!("Median outcome: {} of {} {}", median, total, noun);
    let cumulative_line = match stats::cumulative_threshold(&sorted, CUMULATIVE_TARGET_PCT) {
        Some((value, pct)) => format!("{:.1}% of trials obtain at most {} of {} {}", pct, value, total, noun),
        None => format!("No trials ran for {}", noun),
    };
    (median_line, cumulative_line)
}

pub(crate) fn summarize_simulation(
    input: &SimInput,
    results: &[StrategyExecutionResult],
    note: String,
) -> SimOutput {
    let plan = input.plan();
    let income_versions = plan.income_versions();
    let total_pulls = plan.planned_pulls();
    let planned_arsenal = plan.planned_arsenal();
    let total_banners = plan.total_banners();

    let column = |f: fn(&StrategyExecutionResult) -> u64| -> Vec<u64> { results.iter().map(f).collect() };
    let characters = column(|r| u64::from(r.obtained_character_count));
    let weapons = column(|r| u64::from(r.obtained_weapon_count));
    let spent = column(|r| r.total_pulls_spent);
    let pulls_made = column(StrategyExecutionResult::character_pulls_made);
    let arsenal_spent = column(|r| r.total_arsenal_spent);
    let bonus = stats::mean(&column(|r| r.bonus_pulls_used));
    let intel = stats::mean(&column(|r| r.intel_report_pulls_used));
    let fast_track = stats::mean(&column(|r| r.fast_track_pulls));
    let arsenal_from_pulls = stats::mean(&column(|r| r.arsenal_from_pulls));

    let sorted_spent = stats::sorted(&spent);
    let avg_arsenal_spent = stats::mean(&arsenal_spent);
    let successes = results.iter().filter(|r| r.obtained_all_characters).count();
    let success_rate = if results.is_empty() {
        0.0
    } else {
        successes as f64 / results.len() as f64
    };

    let (character_median_summary, character_cumulative_summary) =
        count_summaries("limited characters", total_banners, &characters);
    let (weapon_median_summary, weapon_cumulative_summary) =
        count_summaries("signature weapons", total_banners, &weapons);

    SimOutput {
        total_pulls,
        avg_total_pulls_gained: total_pulls as f64 + bonus + intel + fast_track,
        avg_arsenal_gained: planned_arsenal as f64 + arsenal_from_pulls,
        avg_pulls_spent: stats::mean(&pulls_made),
        avg_arsenal_spent,
        avg_arsenal_claims: avg_arsenal_spent / ARSENAL_COST_PER_CLAIM as f64,
        pulls_breakdown_lines: vec![
            format!("Initial pulls: {}", plan.initial_pulls),
            income_line("Version income", plan.pulls_per_version, income_versions),
            format!("Banner bonus pulls (avg used): {:.1}", bonus),
            format!("Intel Report pulls (avg used): {:.1}", intel),
            format!("Fast Track pulls (avg received): {:.1}", fast_track),
        ],
        arsenal_breakdown_lines: vec![
            format!("Initial arsenal: {}", plan.initial_arsenal),
            income_line("Version income", plan.arsenal_per_version, income_versions),
            format!("Arsenal from pulls (avg): {:.0}", arsenal_from_pulls),
        ],

        total_characters: total_banners,
        avg_characters_obtained: stats::mean(&characters),
        median_characters_obtained: stats::quantile(&stats::sorted(&characters), 0.5),
        character_distribution: stats::distribution(&characters),
        character_median_summary,
        character_cumulative_summary,

        total_weapons: total_banners,
        avg_weapons_obtained: stats::mean(&weapons),
        median_weapons_obtained: stats::quantile(&stats::sorted(&weapons), 0.5),
        weapon_distribution: stats::distribution(&weapons),
        weapon_median_summary,
        weapon_cumulative_summary,

        success_rate,
        avg_spent: stats::mean(&spent),
        p50_spent: stats::quantile(&sorted_spent, 0.5),
        p90_spent: stats::quantile(&sorted_spent, 0.9),
        p99_spent: stats::quantile(&sorted_spent, 0.99),

        debug: DebugInfo {
            note,
            input_echo: input.clone(),
        },
    }
}

pub(crate) fn summarize_top_up(input: &SimInput, results: &[TopUpTrialResult], note: String) -> TopUpSimOutput {
    let plan = input.plan();
    let income_versions = plan.income_versions();
    let bonus_total = BANNER_BONUS_PULLS * plan.total_banners();
    let total_pulls_no_top_up = plan.planned_pulls().saturating_add(bonus_total);

    let column = |f: fn(&TopUpTrialResult) -> u64| -> Vec<u64> { results.iter().map(f).collect() };
    let top_up_pulls = column(|r| r.top_up_pulls);
    let top_up_arsenal = column(|r| r.top_up_arsenal);
    let arsenal_from_pulls = stats::mean(&column(|r| r.arsenal_from_pulls));
    let fast_track = stats::mean(&column(|r| r.fast_track_pulls));

    let sorted_pulls = stats::sorted(&top_up_pulls);
    let sorted_arsenal = stats::sorted(&top_up_arsenal);
    let median_top_up_pulls = stats::quantile(&sorted_pulls, 0.5);
    let median_top_up_arsenal = stats::quantile(&sorted_arsenal, 0.5);
    let buckets = stats::sorted(&stats::bucketed(&top_up_arsenal, TOP_UP_ARSENAL_BUCKET));

    let top_up_pulls_cumulative_summary = match stats::cumulative_threshold(&sorted_pulls, CUMULATIVE_TARGET_PCT) {
        Some((value, pct)) => format!("{:.1}% of trials need at most {} top-up pulls", pct, value),
        None => "No trials ran".to_string(),
    };
    let top_up_arsenal_cumulative_summary = match stats::cumulative_threshold(&buckets, CUMULATIVE_TARGET_PCT) {
        Some((value, pct)) => format!(
            "{:.1}% of trials need less than {} top-up arsenal",
            pct,
            value + TOP_UP_ARSENAL_BUCKET
        ),
        None => "No trials ran".to_string(),
    };

    TopUpSimOutput {
        total_pulls_no_top_up,
        avg_arsenal_gained_no_top_up: plan.planned_arsenal() as f64 + arsenal_from_pulls,
        pulls_no_top_up_breakdown_lines: vec![
            format!("Initial pulls: {}", plan.initial_pulls),
            income_line("Version income", plan.pulls_per_version, income_versions),
            format!(
                "Banner bonus pulls: {} x {} banners = {}",
                BANNER_BONUS_PULLS,
                plan.total_banners(),
                bonus_total
            ),
            format!("Not counted: Fast Track (avg {:.1}), Intel Reports", fast_track),
        ],
        arsenal_no_top_up_breakdown_lines: vec![
            format!("Initial arsenal: {}", plan.initial_arsenal),
            income_line("Version income", plan.arsenal_per_version, income_versions),
            format!("Arsenal from pulls (avg): {:.0}", arsenal_from_pulls),
        ],

        avg_pulls_spent: stats::mean(&column(|r| r.pulls_spent)),
        avg_arsenal_spent: stats::mean(&column(|r| r.arsenal_spent)),

        avg_top_up_pulls: stats::mean(&top_up_pulls),
        median_top_up_pulls,
        avg_top_up_arsenal: stats::mean(&top_up_arsenal),
        median_top_up_arsenal,

        top_up_pulls_distribution: stats::distribution(&top_up_pulls),
        top_up_arsenal_distribution: stats::distribution(&buckets),

        top_up_pulls_median_summary: format!("Median trial needs {} top-up pulls", median_top_up_pulls),
        top_up_pulls_cumulative_summary,
        top_up_arsenal_median_summary: format!(
            "Median trial needs {} top-up arsenal (about {:.1} claims)",
            median_top_up_arsenal,
            median_top_up_arsenal as f64 / ARSENAL_COST_PER_CLAIM as f64
        ),
        top_up_arsenal_cumulative_summary,

        debug: DebugInfo {
            note,
            input_echo: input.clone(),
        },
    }
}
