//! Pull strategies: when to enter a character banner, how much of the stockpile
//! to commit, and when to follow up on the matching weapon banner.

use crate::gacha::{BannerRun, BannerState, FastTrackResult, GlobalGachaState, PullResult};
use crate::weapon::{
    self, WeaponBannerState, WeaponClaimResult, ARSENAL_COST_PER_CLAIM, WEAPON_PITY_THRESHOLD,
    WEAPON_SPARK_THRESHOLD,
};
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Free pulls every character banner hands out.
pub const BANNER_BONUS_PULLS: u64 = 10;
/// Pulls granted by one Intel Report.
pub const INTEL_REPORT_PULLS: u64 = 10;

/// Claims until the weapon spark guarantees the rate-up (8).
pub const WEAPON_SPARK_CLAIMS: u32 = WEAPON_SPARK_THRESHOLD + 1;
/// Claims until weapon pity guarantees a 6★ (4).
pub const WEAPON_PITY_CLAIMS: u32 = WEAPON_PITY_THRESHOLD + 1;

pub const SPARK_WEAPON_THRESHOLD: u64 = WEAPON_SPARK_CLAIMS as u64 * ARSENAL_COST_PER_CLAIM;
pub const PITY_WEAPON_THRESHOLD: u64 = WEAPON_PITY_CLAIMS as u64 * ARSENAL_COST_PER_CLAIM;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseStrategy {
    /// Enter once the stockpile covers hard pity.
    #[default]
    S1,
    /// Enter once the stockpile covers the spark.
    S2,
}

impl BaseStrategy {
    pub fn character_threshold(self) -> u64 {
        match self {
            BaseStrategy::S1 => 80,
            BaseStrategy::S2 => 120,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BaseStrategy::S1 => "Pity (80)",
            BaseStrategy::S2 => "Spark (120)",
        }
    }
}

impl fmt::Display for BaseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseStrategy::S1 => write!(f, "S1"),
            BaseStrategy::S2 => write!(f, "S2"),
        }
    }
}

impl FromStr for BaseStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S1" => Ok(BaseStrategy::S1),
            "S2" => Ok(BaseStrategy::S2),
            other => Err(format!("unknown base strategy '{}', expected S1 or S2", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddonStrategies {
    /// Spend an Intel Report as soon as a banner is entered.
    #[serde(rename = "A1_alwaysUseIntelReport")]
    pub a1_always_use_intel_report: bool,
    /// Stockpile-funded partial run that reaches the Fast Track.
    #[serde(rename = "A2_pullForFastTrack")]
    pub a2_pull_for_fast_track: bool,
    /// Stockpile-funded partial run that reaches the Intel Report.
    #[serde(rename = "A3_pullForIntelReport")]
    pub a3_pull_for_intel_report: bool,
    /// Dump the whole stockpile into the final banner.
    #[serde(rename = "A4_useAllInLastVersion")]
    pub a4_use_all_in_last_version: bool,
    /// Only enter weapon banners with enough arsenal to reach the weapon spark.
    #[serde(rename = "A5_weaponSparkPriority")]
    pub a5_weapon_spark_priority: bool,
}

impl Default for AddonStrategies {
    fn default() -> Self {
        AddonStrategies {
            a1_always_use_intel_report: true,
            a2_pull_for_fast_track: false,
            a3_pull_for_intel_report: false,
            a4_use_all_in_last_version: false,
            a5_weapon_spark_priority: true,
        }
    }
}

impl AddonStrategies {
    fn enabled_ids(&self) -> Vec<&'static str> {
        [
            (self.a1_always_use_intel_report, "A1"),
            (self.a2_pull_for_fast_track, "A2"),
            (self.a3_pull_for_intel_report, "A3"),
            (self.a4_use_all_in_last_version, "A4"),
            (self.a5_weapon_spark_priority, "A5"),
        ]
        .into_iter()
        .filter_map(|(on, id)| on.then_some(id))
        .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StrategyConfigWire")]
pub struct StrategyConfig {
    pub base_strategy: BaseStrategy,
    pub character_banner_threshold: u64,
    pub weapon_banner_threshold: u64,
    pub addon_strategies: AddonStrategies,
}

/// Wire form: thresholds left out fall back to the base strategy's values.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StrategyConfigWire {
    #[serde(default)]
    base_strategy: BaseStrategy,
    character_banner_threshold: Option<u64>,
    weapon_banner_threshold: Option<u64>,
    #[serde(default)]
    addon_strategies: AddonStrategies,
}

impl From<StrategyConfigWire> for StrategyConfig {
    fn from(wire: StrategyConfigWire) -> Self {
        let base = StrategyConfig::for_base(wire.base_strategy);
        StrategyConfig {
            base_strategy: wire.base_strategy,
            character_banner_threshold: wire
                .character_banner_threshold
                .unwrap_or(base.character_banner_threshold),
            weapon_banner_threshold: wire
                .weapon_banner_threshold
                .unwrap_or(base.weapon_banner_threshold),
            addon_strategies: wire.addon_strategies,
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::for_base(BaseStrategy::S1)
    }
}

impl StrategyConfig {
    pub fn for_base(base: BaseStrategy) -> Self {
        StrategyConfig {
            base_strategy: base,
            character_banner_threshold: base.character_threshold(),
            weapon_banner_threshold: SPARK_WEAPON_THRESHOLD,
            addon_strategies: AddonStrategies::default(),
        }
    }

    pub fn with_addons(mut self, addons: AddonStrategies) -> Self {
        self.addon_strategies = addons;
        self
    }

    /// Arsenal needed before a weapon banner is entered. Without A5 the player
    /// only budgets for the weapon pity, so the bar drops to four claims.
    pub fn weapon_entry_threshold(&self) -> u64 {
        if self.addon_strategies.a5_weapon_spark_priority {
            self.weapon_banner_threshold
        } else {
            self.weapon_banner_threshold.min(PITY_WEAPON_THRESHOLD)
        }
    }

    pub fn weapon_claim_cap(&self) -> u32 {
        if self.addon_strategies.a5_weapon_spark_priority {
            WEAPON_SPARK_CLAIMS
        } else {
            WEAPON_PITY_CLAIMS
        }
    }

    pub fn display_name(&self) -> String {
        let addons = self.addon_strategies.enabled_ids();
        if addons.is_empty() {
            format!("{} {}", self.base_strategy, self.base_strategy.name())
        } else {
            format!(
                "{} {} + [{}]",
                self.base_strategy,
                self.base_strategy.name(),
                addons.join(", ")
            )
        }
    }
}

// --- Entry decision ---

/// What the player knows when a character banner opens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BannerContext {
    /// Stockpiled pulls, banner bonus excluded.
    pub stockpile: u64,
    /// Pulls the next version will grant (0 in the last version).
    pub pulls_next_version: u64,
    pub has_intel_report: bool,
    pub is_last_version: bool,
    pub is_last_banner: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopRule {
    /// Leave the banner on the first rate-up.
    EagerStop,
    /// Spend the planned amount no matter what drops.
    ForcedSpend,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryReason {
    UseAllInLastVersion,
    BaseStrategy,
    StockpileForIntelReport,
    StockpileForFastTrack,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDecision {
    pub reason: EntryReason,
    /// Stockpile pulls committed on top of the banner bonus and any Intel Report.
    pub pulls_to_spend: u64,
    pub stop_rule: StopRule,
}

type EntryRule = fn(&StrategyConfig, &BannerContext) -> Option<EntryDecision>;

/// Evaluated top-down; the first rule that fires decides the banner.
const ENTRY_RULES: [EntryRule; 4] = [
    use_all_in_last_version,
    base_strategy,
    stockpile_for_intel_report,
    stockpile_for_fast_track,
];

fn use_all_in_last_version(config: &StrategyConfig, ctx: &BannerContext) -> Option<EntryDecision> {
    let fires = config.addon_strategies.a4_use_all_in_last_version
        && ctx.is_last_version
        && ctx.is_last_banner
        && ctx.stockpile > 0;
    fires.then_some(EntryDecision {
        reason: EntryReason::UseAllInLastVersion,
        pulls_to_spend: ctx.stockpile,
        stop_rule: StopRule::ForcedSpend,
    })
}

fn base_strategy(config: &StrategyConfig, ctx: &BannerContext) -> Option<EntryDecision> {
    let fires = ctx.stockpile.saturating_add(BANNER_BONUS_PULLS) > config.character_banner_threshold;
    fires.then_some(EntryDecision {
        reason: EntryReason::BaseStrategy,
        pulls_to_spend: ctx.stockpile,
        stop_rule: StopRule::EagerStop,
    })
}

/// Projected pulls after the next version's income, minus the base threshold.
fn projected_surplus(config: &StrategyConfig, ctx: &BannerContext) -> i64 {
    let intel = if ctx.has_intel_report { INTEL_REPORT_PULLS } else { 0 };
    let projected = ctx
        .stockpile
        .saturating_add(BANNER_BONUS_PULLS + intel)
        .saturating_add(ctx.pulls_next_version);
    let threshold = i64::try_from(config.character_banner_threshold).unwrap_or(i64::MAX);
    i64::try_from(projected).unwrap_or(i64::MAX).saturating_sub(threshold)
}

/// Shared shape of A2 and A3: the surplus must exceed the stockpile cost of
/// reaching the bonus, and the cost is capped at what is actually stockpiled.
fn stockpile_for_bonus(
    config: &StrategyConfig,
    ctx: &BannerContext,
    reason: EntryReason,
    cost_with_report: u64,
    cost_without_report: u64,
) -> Option<EntryDecision> {
    if ctx.stockpile > config.character_banner_threshold {
        return None;
    }
    let cost = if ctx.has_intel_report { cost_with_report } else { cost_without_report };
    (projected_surplus(config, ctx) > cost as i64).then_some(EntryDecision {
        reason,
        pulls_to_spend: cost.min(ctx.stockpile),
        stop_rule: StopRule::ForcedSpend,
    })
}

fn stockpile_for_intel_report(config: &StrategyConfig, ctx: &BannerContext) -> Option<EntryDecision> {
    if !config.addon_strategies.a3_pull_for_intel_report {
        return None;
    }
    // bonus 10 + report 10 + 40 = 60, or bonus 10 + 50 = 60
    stockpile_for_bonus(config, ctx, EntryReason::StockpileForIntelReport, 40, 50)
}

fn stockpile_for_fast_track(config: &StrategyConfig, ctx: &BannerContext) -> Option<EntryDecision> {
    if !config.addon_strategies.a2_pull_for_fast_track {
        return None;
    }
    // bonus 10 + report 10 + 10 = 30, or bonus 10 + 20 = 30
    stockpile_for_bonus(config, ctx, EntryReason::StockpileForFastTrack, 10, 20)
}

pub fn decide_entry(config: &StrategyConfig, ctx: &BannerContext) -> Option<EntryDecision> {
    ENTRY_RULES.iter().find_map(|rule| rule(config, ctx))
}

// --- Character banner ---

/// Where the currency for a character pull came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Funding {
    BannerBonus,
    IntelReport,
    Stockpile,
    TopUp,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingTally {
    pub banner_bonus: u64,
    pub intel_report: u64,
    pub stockpile: u64,
    pub top_up: u64,
}

impl FundingTally {
    pub fn record(&mut self, funding: Funding) {
        match funding {
            Funding::BannerBonus => self.banner_bonus += 1,
            Funding::IntelReport => self.intel_report += 1,
            Funding::Stockpile => self.stockpile += 1,
            Funding::TopUp => self.top_up += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.banner_bonus + self.intel_report + self.stockpile + self.top_up
    }
}

#[derive(Clone, Debug)]
pub struct BannerOutcome {
    /// `None` when the banner was skipped.
    pub decision: Option<EntryDecision>,
    pub got_rate_up: bool,
    pub funding: FundingTally,
    pub pulls: Vec<PullResult>,
    pub fast_track: Option<FastTrackResult>,
    pub arsenal_gained: u64,
    pub global: GlobalGachaState,
    pub banner: BannerState,
    pub generated_intel_report: bool,
}

impl BannerOutcome {
    fn skipped(global: GlobalGachaState) -> Self {
        BannerOutcome {
            decision: None,
            got_rate_up: false,
            funding: FundingTally::default(),
            pulls: Vec::new(),
            fast_track: None,
            arsenal_gained: 0,
            global,
            banner: BannerState::default(),
            generated_intel_report: false,
        }
    }

    /// Stockpile pulls consumed.
    pub fn pulls_spent(&self) -> u64 {
        self.funding.stockpile
    }

    pub fn fast_track_pulls(&self) -> u64 {
        self.fast_track.as_ref().map_or(0, |ft| ft.pulls.len() as u64)
    }
}

/// Runs one character banner under `config`.
///
/// Spend order: banner bonus, then the Intel Report (A1), then stockpile single
/// pulls up to the planned amount.
pub fn pull_character_banner<R: RngCore + ?Sized>(
    config: &StrategyConfig,
    ctx: &BannerContext,
    global: GlobalGachaState,
    rng: &mut R,
) -> BannerOutcome {
    let Some(decision) = decide_entry(config, ctx) else {
        return BannerOutcome::skipped(global);
    };

    let intel_pulls = if config.addon_strategies.a1_always_use_intel_report && ctx.has_intel_report {
        INTEL_REPORT_PULLS
    } else {
        0
    };
    let phases = [
        (Funding::BannerBonus, BANNER_BONUS_PULLS),
        (Funding::IntelReport, intel_pulls),
        (Funding::Stockpile, decision.pulls_to_spend),
    ];
    let eager = decision.stop_rule == StopRule::EagerStop;

    let mut run = BannerRun::start(global);
    let mut funding = FundingTally::default();
    'phases: for (source, count) in phases {
        for _ in 0..count {
            let result = run.pull_once(rng);
            funding.record(source);
            if eager && result.is_rate_up_six() {
                break 'phases;
            }
        }
    }

    BannerOutcome {
        decision: Some(decision),
        got_rate_up: run.got_rate_up(),
        funding,
        pulls: run.pulls,
        fast_track: run.fast_track,
        arsenal_gained: run.arsenal_gained,
        global: run.global,
        banner: run.banner,
        generated_intel_report: run.generated_intel_report,
    }
}

// --- Weapon banner ---

/// The weapon banner is worth a look after the featured character dropped, or
/// after a stockpile-funded partial run (A2/A3) happened to pull the rate-up.
pub fn should_try_weapon_banner(config: &StrategyConfig, outcome: &BannerOutcome) -> bool {
    let addons = &config.addon_strategies;
    outcome.got_rate_up
        || ((addons.a2_pull_for_fast_track || addons.a3_pull_for_intel_report)
            && outcome.pulls.iter().any(PullResult::is_rate_up_six))
}

pub fn can_enter_weapon_banner(config: &StrategyConfig, arsenal_points: u64, has_character: bool) -> bool {
    has_character && arsenal_points >= config.weapon_entry_threshold()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeaponBannerOutcome {
    pub got_rate_up: bool,
    pub claims_spent: u32,
    pub arsenal_spent: u64,
    pub claims: Vec<WeaponClaimResult>,
    pub state: WeaponBannerState,
    pub remaining_arsenal: u64,
}

/// Claims until the rate-up weapon drops, the arsenal runs dry, or the claim cap
/// for the configured weapon plan is reached.
pub fn claim_weapon_banner<R: RngCore + ?Sized>(
    config: &StrategyConfig,
    arsenal_points: u64,
    has_character: bool,
    rng: &mut R,
) -> WeaponBannerOutcome {
    let mut outcome = WeaponBannerOutcome {
        got_rate_up: false,
        claims_spent: 0,
        arsenal_spent: 0,
        claims: Vec::new(),
        state: WeaponBannerState::default(),
        remaining_arsenal: arsenal_points,
    };
    if !can_enter_weapon_banner(config, arsenal_points, has_character) {
        return outcome;
    }

    let cap = config.weapon_claim_cap();
    while outcome.claims_spent < cap
        && outcome.remaining_arsenal >= ARSENAL_COST_PER_CLAIM
        && !outcome.state.got_rate_up_in_this_banner
    {
        let (result, next) = weapon::claim(outcome.state, rng);
        outcome.state = next;
        outcome.remaining_arsenal -= ARSENAL_COST_PER_CLAIM;
        outcome.arsenal_spent += ARSENAL_COST_PER_CLAIM;
        outcome.claims_spent += 1;
        outcome.claims.push(result);
    }
    outcome.got_rate_up = outcome.state.got_rate_up_in_this_banner;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{Rng, ScriptedRng};

    fn ctx(stockpile: u64) -> BannerContext {
        BannerContext {
            stockpile,
            ..BannerContext::default()
        }
    }

    fn config_with(base: BaseStrategy, edit: impl FnOnce(&mut AddonStrategies)) -> StrategyConfig {
        let mut addons = AddonStrategies::default();
        edit(&mut addons);
        StrategyConfig::for_base(base).with_addons(addons)
    }

    #[test]
    fn default_config_values() {
        let s1 = StrategyConfig::for_base(BaseStrategy::S1);
        assert_eq!(s1.character_banner_threshold, 80);
        assert_eq!(s1.weapon_banner_threshold, 15840);
        let s2 = StrategyConfig::for_base(BaseStrategy::S2);
        assert_eq!(s2.character_banner_threshold, 120);
        let a = s1.addon_strategies;
        assert!(a.a1_always_use_intel_report && a.a5_weapon_spark_priority);
        assert!(!a.a2_pull_for_fast_track && !a.a3_pull_for_intel_report && !a.a4_use_all_in_last_version);
        assert_eq!(s1.display_name(), "S1 Pity (80) + [A1, A5]");
    }

    #[test]
    fn weapon_threshold_follows_a5() {
        let on = StrategyConfig::default();
        assert_eq!(on.weapon_entry_threshold(), 15840);
        assert_eq!(on.weapon_claim_cap(), 8);
        let off = config_with(BaseStrategy::S1, |a| a.a5_weapon_spark_priority = false);
        assert_eq!(off.weapon_entry_threshold(), 7920);
        assert_eq!(off.weapon_claim_cap(), 4);
    }

    #[test]
    fn base_strategy_entry_boundary() {
        let s1 = StrategyConfig::for_base(BaseStrategy::S1);
        assert_eq!(decide_entry(&s1, &ctx(70)), None);
        let d = decide_entry(&s1, &ctx(71)).unwrap();
        assert_eq!(d.reason, EntryReason::BaseStrategy);
        assert_eq!(d.pulls_to_spend, 71);
        assert_eq!(d.stop_rule, StopRule::EagerStop);

        let s2 = StrategyConfig::for_base(BaseStrategy::S2);
        assert_eq!(decide_entry(&s2, &ctx(100)), None);
        assert!(decide_entry(&s2, &ctx(130)).is_some());
    }

    #[test]
    fn a4_outranks_base_strategy_in_final_banner() {
        let config = config_with(BaseStrategy::S1, |a| a.a4_use_all_in_last_version = true);
        let mut c = ctx(200);
        c.is_last_version = true;
        c.is_last_banner = true;
        let d = decide_entry(&config, &c).unwrap();
        assert_eq!(d.reason, EntryReason::UseAllInLastVersion);
        assert_eq!(d.pulls_to_spend, 200);
        assert_eq!(d.stop_rule, StopRule::ForcedSpend);

        // Not the last banner: base strategy decides.
        c.is_last_banner = false;
        assert_eq!(decide_entry(&config, &c).unwrap().reason, EntryReason::BaseStrategy);

        // Empty stockpile: A4 does not fire and neither does S1.
        let mut empty = ctx(0);
        empty.is_last_version = true;
        empty.is_last_banner = true;
        assert_eq!(decide_entry(&config, &empty), None);
    }

    #[test]
    fn a3_and_a2_surplus_rules() {
        let config = config_with(BaseStrategy::S1, |a| {
            a.a2_pull_for_fast_track = true;
            a.a3_pull_for_intel_report = true;
        });
        // 60 + 10 + 80 - 80 = 70 > 50 -> A3 spends 50
        let mut c = ctx(60);
        c.pulls_next_version = 80;
        let d = decide_entry(&config, &c).unwrap();
        assert_eq!(d.reason, EntryReason::StockpileForIntelReport);
        assert_eq!(d.pulls_to_spend, 50);
        assert_eq!(d.stop_rule, StopRule::ForcedSpend);

        // With a report the bar drops to 40 and the cost to 40.
        c.has_intel_report = true;
        let d = decide_entry(&config, &c).unwrap();
        assert_eq!(d.pulls_to_spend, 40);

        // 40 + 10 + 60 - 80 = 30: too little for A3, enough for A2 (> 20).
        let mut c = ctx(40);
        c.pulls_next_version = 60;
        let d = decide_entry(&config, &c).unwrap();
        assert_eq!(d.reason, EntryReason::StockpileForFastTrack);
        assert_eq!(d.pulls_to_spend, 20);

        // 20 = 20 is not strictly greater.
        let mut c = ctx(30);
        c.pulls_next_version = 60;
        assert_eq!(decide_entry(&config, &c), None);
    }

    #[test]
    fn addon_cost_is_capped_at_stockpile() {
        let config = config_with(BaseStrategy::S1, |a| a.a3_pull_for_intel_report = true);
        let mut c = ctx(30);
        c.pulls_next_version = 200;
        let d = decide_entry(&config, &c).unwrap();
        assert_eq!(d.pulls_to_spend, 30);
    }

    #[test]
    fn disabled_addons_never_fire() {
        let config = StrategyConfig::default();
        let mut c = ctx(60);
        c.pulls_next_version = 500;
        assert_eq!(decide_entry(&config, &c), None);
    }

    #[test]
    fn skipped_banner_has_no_side_effects() {
        let config = StrategyConfig::default();
        let global = GlobalGachaState {
            pity_counter: 33,
            arsenal_points: 1234,
        };
        let mut rng = ScriptedRng::new(&[0.5]);
        let outcome = pull_character_banner(&config, &ctx(10), global, &mut rng);
        assert!(outcome.decision.is_none());
        assert!(outcome.pulls.is_empty());
        assert_eq!(outcome.global, global);
        assert_eq!(outcome.pulls_spent(), 0);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn eager_stop_on_first_rate_up() {
        // First bonus pull: 6★ (0.001) that wins the 50/50 (0.1).
        let mut rng = ScriptedRng::new(&[0.001, 0.1, 0.99]);
        let config = StrategyConfig::default();
        let outcome = pull_character_banner(&config, &ctx(100), GlobalGachaState::default(), &mut rng);
        assert!(outcome.got_rate_up);
        assert_eq!(outcome.pulls.len(), 1);
        assert_eq!(outcome.funding.banner_bonus, 1);
        assert_eq!(outcome.pulls_spent(), 0);
    }

    #[test]
    fn forced_spend_ignores_rate_up() {
        let config = config_with(BaseStrategy::S1, |a| a.a3_pull_for_intel_report = true);
        let mut c = ctx(60);
        c.pulls_next_version = 80;
        let mut rng = ScriptedRng::new(&[0.001, 0.1, 0.99]);
        let outcome = pull_character_banner(&config, &c, GlobalGachaState::default(), &mut rng);
        assert!(outcome.got_rate_up);
        assert_eq!(outcome.pulls.len(), 60);
        assert_eq!(outcome.pulls_spent(), 50);
        assert!(outcome.generated_intel_report);
        assert_eq!(outcome.fast_track_pulls(), 10);
    }

    #[test]
    fn a4_spends_everything_past_rate_up() {
        let config = config_with(BaseStrategy::S1, |a| a.a4_use_all_in_last_version = true);
        let mut c = ctx(25);
        c.is_last_version = true;
        c.is_last_banner = true;
        let mut rng = ScriptedRng::new(&[0.001, 0.1, 0.99]);
        let outcome = pull_character_banner(&config, &c, GlobalGachaState::default(), &mut rng);
        assert!(outcome.got_rate_up);
        assert_eq!(outcome.pulls_spent(), 25);
        assert_eq!(outcome.pulls.len(), 35);
    }

    #[test]
    fn intel_report_adds_ten_pulls_with_a1() {
        let mut c = ctx(100);
        c.has_intel_report = true;
        let mut rng = ScriptedRng::new(&[0.99]);
        let with_a1 = pull_character_banner(&StrategyConfig::default(), &c, GlobalGachaState::default(), &mut rng);
        assert_eq!(with_a1.funding.intel_report, 10);
        assert_eq!(with_a1.funding.banner_bonus, 10);

        let no_a1 = config_with(BaseStrategy::S1, |a| a.a1_always_use_intel_report = false);
        let mut rng = ScriptedRng::new(&[0.99]);
        let without = pull_character_banner(&no_a1, &c, GlobalGachaState::default(), &mut rng);
        assert_eq!(without.funding.intel_report, 0);
    }

    #[test]
    fn all_four_star_banner_reaches_spark() {
        // Rolls of 0.99 are 4★ below soft pity; hard pity still forces a 6★ at 81,
        // losing its 50/50 (0.99), and the spark forces the rate-up at 120.
        let mut rng = ScriptedRng::new(&[0.99]);
        let outcome = pull_character_banner(&StrategyConfig::default(), &ctx(200), GlobalGachaState::default(), &mut rng);
        assert!(outcome.got_rate_up);
        assert_eq!(outcome.pulls.len(), 120);
        assert!(outcome.pulls[119].triggered_spark);
        assert_eq!(outcome.pulls_spent(), 110);
    }

    #[test]
    fn weapon_banner_entry_rules() {
        let config = StrategyConfig::default();
        let mut rng = Rng::from_seed_str("test-seed-weapon-2");
        assert_eq!(claim_weapon_banner(&config, 10_000, true, &mut rng).claims_spent, 0);
        assert_eq!(claim_weapon_banner(&config, 20_000, false, &mut rng).claims_spent, 0);

        let out = claim_weapon_banner(&config, 20_000, true, &mut rng);
        assert!(out.claims_spent > 0 && out.claims_spent <= 8);
        assert_eq!(out.arsenal_spent, u64::from(out.claims_spent) * 1980);
        assert_eq!(out.remaining_arsenal, 20_000 - out.arsenal_spent);
    }

    #[test]
    fn weapon_banner_stops_on_rate_up_and_caps_claims() {
        let config = StrategyConfig::default();
        for i in 0..50 {
            let mut rng = Rng::from_seed_str(&format!("weapon-cap-{}", i));
            let out = claim_weapon_banner(&config, 100_000, true, &mut rng);
            // With enough arsenal the weapon spark always lands within 8 claims.
            assert!(out.got_rate_up);
            assert!(out.claims_spent <= 8);
            let hits = out.claims.iter().filter(|c| c.got_rate_up).count();
            assert_eq!(hits, 1);
            assert!(out.claims.last().map_or(false, |c| c.got_rate_up));
        }
    }

    #[test]
    fn without_a5_weapon_banner_caps_at_four_claims() {
        let config = config_with(BaseStrategy::S1, |a| a.a5_weapon_spark_priority = false);
        let mut rng = Rng::from_seed_str("a5-off");
        assert_eq!(claim_weapon_banner(&config, 5_000, true, &mut rng).claims_spent, 0);
        for _ in 0..50 {
            let out = claim_weapon_banner(&config, 12_000, true, &mut rng);
            assert!(out.claims_spent >= 1 && out.claims_spent <= 4);
        }
    }

    #[test]
    fn strategy_config_json_fills_missing_thresholds() {
        let json = r#"{"baseStrategy":"S2","addonStrategies":{"A3_pullForIntelReport":true}}"#;
        let config: StrategyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.character_banner_threshold, 120);
        assert_eq!(config.weapon_banner_threshold, 15840);
        assert!(config.addon_strategies.a3_pull_for_intel_report);
        assert!(config.addon_strategies.a1_always_use_intel_report);
    }

    #[test]
    fn base_strategy_parses_case_insensitively() {
        assert_eq!("s2".parse::<BaseStrategy>(), Ok(BaseStrategy::S2));
        assert!("S3".parse::<BaseStrategy>().is_err());
    }
}
