//! One trial: the whole roadmap of versions and banners played out once.

use crate::gacha::{BannerRun, GlobalGachaState};
use crate::strategy::{
    self, BannerContext, Funding, FundingTally, StrategyConfig, BANNER_BONUS_PULLS,
    WEAPON_SPARK_CLAIMS,
};
use crate::weapon::{self, WeaponBannerState, ARSENAL_COST_PER_CLAIM};
use rand_core::RngCore;
use serde::{Deserialize, Serialize};

/// Resources and roadmap shape for a trial, already sanitized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialPlan {
    pub initial_pulls: u64,
    pub initial_arsenal: u64,
    pub pulls_per_version: u64,
    pub arsenal_per_version: u64,
    pub version_count: u32,
    pub banners_per_version: u32,
    pub exclude_first_version_resources: bool,
}

impl TrialPlan {
    pub fn total_banners(&self) -> u64 {
        u64::from(self.version_count) * u64::from(self.banners_per_version)
    }

    /// Whether version `version` (0-based) grants its per-version income.
    pub fn grants_income(&self, version: u32) -> bool {
        !(self.exclude_first_version_resources && version == 0)
    }

    pub fn income_versions(&self) -> u64 {
        (0..self.version_count).filter(|&v| self.grants_income(v)).count() as u64
    }

    /// Initial pulls plus every granted version income.
    pub fn planned_pulls(&self) -> u64 {
        self.initial_pulls
            .saturating_add(self.pulls_per_version.saturating_mul(self.income_versions()))
    }

    /// Initial arsenal plus every granted version income.
    pub fn planned_arsenal(&self) -> u64 {
        self.initial_arsenal
            .saturating_add(self.arsenal_per_version.saturating_mul(self.income_versions()))
    }

    fn banners(&self) -> impl Iterator<Item = (u32, u32)> {
        let banners = self.banners_per_version;
        (0..self.version_count).flat_map(move |v| (0..banners).map(move |b| (v, b)))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyExecutionResult {
    pub obtained_character_count: u32,
    pub obtained_weapon_count: u32,
    /// Stockpile pulls spent; banner bonus and Intel Report pulls are tallied separately.
    pub total_pulls_spent: u64,
    pub total_arsenal_spent: u64,
    pub remaining_pulls: u64,
    pub remaining_arsenal: u64,
    pub obtained_all_characters: bool,
    pub obtained_all_weapons: bool,
    pub bonus_pulls_used: u64,
    pub intel_report_pulls_used: u64,
    pub fast_track_pulls: u64,
    pub arsenal_from_pulls: u64,
}

impl StrategyExecutionResult {
    /// Character pulls performed from every source except the Fast Track.
    pub fn character_pulls_made(&self) -> u64 {
        self.total_pulls_spent + self.bonus_pulls_used + self.intel_report_pulls_used
    }
}

/// Plays the roadmap under `config` with a finite stockpile.
pub fn execute_strategy<R: RngCore + ?Sized>(
    config: &StrategyConfig,
    plan: &TrialPlan,
    rng: &mut R,
) -> StrategyExecutionResult {
    let mut stockpile = plan.initial_pulls;
    let mut global = GlobalGachaState {
        pity_counter: 0,
        arsenal_points: plan.initial_arsenal,
    };
    let mut has_intel_report = false;
    let mut result = StrategyExecutionResult::default();
    let last_version = plan.version_count.saturating_sub(1);
    let last_banner = plan.banners_per_version.saturating_sub(1);

    for (version, banner) in plan.banners() {
        if banner == 0 && plan.grants_income(version) {
            stockpile = stockpile.saturating_add(plan.pulls_per_version);
            global.arsenal_points = global.arsenal_points.saturating_add(plan.arsenal_per_version);
        }

        let ctx = BannerContext {
            stockpile,
            pulls_next_version: if version < last_version { plan.pulls_per_version } else { 0 },
            has_intel_report,
            is_last_version: version == last_version,
            is_last_banner: banner == last_banner,
        };
        let outcome = strategy::pull_character_banner(config, &ctx, global, rng);

        stockpile -= outcome.pulls_spent();
        global = outcome.global;
        // An unused report expires with the banner it was carried into.
        has_intel_report = outcome.generated_intel_report;

        result.total_pulls_spent += outcome.pulls_spent();
        result.bonus_pulls_used += outcome.funding.banner_bonus;
        result.intel_report_pulls_used += outcome.funding.intel_report;
        result.fast_track_pulls += outcome.fast_track_pulls();
        result.arsenal_from_pulls += outcome.arsenal_gained;
        if outcome.got_rate_up {
            result.obtained_character_count += 1;
        }

        if strategy::should_try_weapon_banner(config, &outcome) {
            let weapon = strategy::claim_weapon_banner(config, global.arsenal_points, true, rng);
            global.arsenal_points = weapon.remaining_arsenal;
            result.total_arsenal_spent += weapon.arsenal_spent;
            if weapon.got_rate_up {
                result.obtained_weapon_count += 1;
            }
        }
    }

    let total_banners = plan.total_banners();
    result.remaining_pulls = stockpile;
    result.remaining_arsenal = global.arsenal_points;
    result.obtained_all_characters = u64::from(result.obtained_character_count) == total_banners;
    result.obtained_all_weapons = u64::from(result.obtained_weapon_count) == total_banners;
    result
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopUpTrialResult {
    pub top_up_pulls: u64,
    pub top_up_arsenal: u64,
    /// Every character pull made, whatever funded it. Fast Track excluded.
    pub pulls_spent: u64,
    pub arsenal_spent: u64,
    pub arsenal_from_pulls: u64,
    pub fast_track_pulls: u64,
}

/// Plays the roadmap securing every character and weapon, buying whatever the
/// plan's resources do not cover.
pub fn execute_top_up<R: RngCore + ?Sized>(
    _config: &StrategyConfig,
    plan: &TrialPlan,
    rng: &mut R,
) -> TopUpTrialResult {
    let mut stockpile = plan.initial_pulls;
    let mut global = GlobalGachaState {
        pity_counter: 0,
        arsenal_points: plan.initial_arsenal,
    };
    let mut result = TopUpTrialResult::default();

    for (version, banner) in plan.banners() {
        if banner == 0 && plan.grants_income(version) {
            stockpile = stockpile.saturating_add(plan.pulls_per_version);
            global.arsenal_points = global.arsenal_points.saturating_add(plan.arsenal_per_version);
        }

        // Intel Reports are windfalls: top-up mode only counts on the banner bonus.
        let mut run = BannerRun::start(global);
        let mut funding = FundingTally::default();
        for _ in 0..BANNER_BONUS_PULLS {
            run.pull_once(rng);
            funding.record(Funding::BannerBonus);
            if run.got_rate_up() {
                break;
            }
        }
        // The spark at 120 bounds this loop.
        while !run.got_rate_up() {
            if stockpile > 0 {
                stockpile -= 1;
                funding.record(Funding::Stockpile);
            } else {
                funding.record(Funding::TopUp);
            }
            run.pull_once(rng);
        }

        global = run.global;
        result.top_up_pulls += funding.top_up;
        result.pulls_spent += funding.total();
        result.fast_track_pulls += run.fast_track_pulls();
        result.arsenal_from_pulls += run.arsenal_gained;

        let mut weapon_state = WeaponBannerState::default();
        let mut claims = 0;
        while !weapon_state.got_rate_up_in_this_banner && claims < WEAPON_SPARK_CLAIMS {
            if global.arsenal_points < ARSENAL_COST_PER_CLAIM {
                let shortfall = ARSENAL_COST_PER_CLAIM - global.arsenal_points;
                result.top_up_arsenal += shortfall;
                global.arsenal_points += shortfall;
            }
            let (_, next) = weapon::claim(weapon_state, rng);
            weapon_state = next;
            global.arsenal_points -= ARSENAL_COST_PER_CLAIM;
            result.arsenal_spent += ARSENAL_COST_PER_CLAIM;
            claims += 1;
        }
    }

    result
}
