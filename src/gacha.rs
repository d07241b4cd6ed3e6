//! Character banner pull engine.
//!
//! Every operation takes its state by value and hands back the successor state,
//! so a trial never aliases the counters of another trial.

use crate::rng::unit_f64;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};

// Constants
pub const PROB_6_BASE: f64 = 0.008;
pub const PROB_5: f64 = 0.08;
pub const SOFT_PITY_START: u32 = 65;
pub const HARD_PITY: u32 = 80;
pub const PITY_STEP: f64 = 0.05;
pub const SPARK_PULL: u32 = 120;
pub const RATE_UP_RATIO: f64 = 0.5;

pub const FAST_TRACK_PULLS: usize = 10;
pub const FAST_TRACK_TRIGGER: u32 = 30;
pub const INTEL_REPORT_TRIGGER: u32 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Four,
    Five,
    Six,
}

impl Rarity {
    pub fn stars(self) -> u8 {
        match self {
            Rarity::Four => 4,
            Rarity::Five => 5,
            Rarity::Six => 6,
        }
    }

    pub fn is_five_or_above(self) -> bool {
        self >= Rarity::Five
    }

    /// Arsenal points granted by a character pull of this rarity.
    pub fn arsenal_reward(self) -> u32 {
        match self {
            Rarity::Six => 2000,
            Rarity::Five => 200,
            Rarity::Four => 20,
        }
    }
}

/// Carried across every character banner of one trial.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalGachaState {
    pub pity_counter: u32,
    pub arsenal_points: u64,
}

/// Lives for exactly one character banner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerState {
    pub spark_counter: u32,
    pub pulls_in_banner: u32,
    pub fast_track_used: bool,
    pub intel_report_used: bool,
    pub got_rate_up_in_this_banner: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullResult {
    pub rarity: Rarity,
    pub is_rate_up: bool,
    pub triggered_pity: bool,
    pub triggered_spark: bool,
    pub arsenal_points: u32,
}

impl PullResult {
    pub fn is_rate_up_six(&self) -> bool {
        self.rarity == Rarity::Six && self.is_rate_up
    }

    fn plain_five() -> Self {
        PullResult {
            rarity: Rarity::Five,
            is_rate_up: false,
            triggered_pity: false,
            triggered_spark: false,
            arsenal_points: Rarity::Five.arsenal_reward(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastTrackResult {
    pub pulls: Vec<PullResult>,
    pub arsenal_gained: u32,
}

pub fn six_star_probability(pity_counter: u32) -> f64 {
    if pity_counter < SOFT_PITY_START {
        PROB_6_BASE
    } else if pity_counter < HARD_PITY {
        // 65 -> 5.8%, 79 -> 75.8%
        PROB_6_BASE + PITY_STEP * f64::from(pity_counter - (SOFT_PITY_START - 1))
    } else {
        1.0
    }
}

/// Expected number of pulls from a fresh pity counter to the next 6★.
pub fn expected_pulls_per_six() -> f64 {
    let mut survival = 1.0;
    let mut expected = 0.0;
    for k in 1..=HARD_PITY + 1 {
        // The k-th pull is rolled with k - 1 failures already on the counter.
        let p = six_star_probability(k - 1);
        expected += f64::from(k) * survival * p;
        survival *= 1.0 - p;
        if p >= 1.0 {
            break;
        }
    }
    expected
}

fn roll_rarity<R: RngCore + ?Sized>(rng: &mut R, prob_6: f64) -> Rarity {
    let r = unit_f64(rng);
    if r < prob_6 {
        Rarity::Six
    } else if r < prob_6 + PROB_5 {
        Rarity::Five
    } else {
        Rarity::Four
    }
}

fn roll_rate_up<R: RngCore + ?Sized>(rng: &mut R) -> bool {
    unit_f64(rng) < RATE_UP_RATIO
}

/// Resolves one character pull.
///
/// Fast-track pulls skip the spark and hard-pity branches and leave the pity and
/// spark counters alone; their arsenal reward is still credited.
pub fn pull<R: RngCore + ?Sized>(
    global: GlobalGachaState,
    banner: BannerState,
    rng: &mut R,
    from_fast_track: bool,
) -> (PullResult, GlobalGachaState, BannerState) {
    let mut next_global = global;
    let mut next_banner = banner;

    let rarity: Rarity;
    let mut is_rate_up = false;
    let mut triggered_pity = false;
    let mut triggered_spark = false;

    if !from_fast_track
        && banner.spark_counter == SPARK_PULL - 1
        && !banner.got_rate_up_in_this_banner
    {
        rarity = Rarity::Six;
        is_rate_up = true;
        triggered_spark = true;
        next_global.pity_counter = 0;
    } else if !from_fast_track && global.pity_counter >= HARD_PITY {
        rarity = Rarity::Six;
        is_rate_up = roll_rate_up(rng);
        triggered_pity = true;
        next_global.pity_counter = 0;
    } else {
        triggered_pity = global.pity_counter >= SOFT_PITY_START;
        rarity = roll_rarity(rng, six_star_probability(global.pity_counter));
        if rarity == Rarity::Six {
            is_rate_up = roll_rate_up(rng);
            next_global.pity_counter = 0;
        } else if !from_fast_track {
            next_global.pity_counter += 1;
        }
    }

    if is_rate_up {
        next_banner.got_rate_up_in_this_banner = true;
    }
    if !from_fast_track {
        next_banner.spark_counter += 1;
    }

    let arsenal_points = rarity.arsenal_reward();
    next_global.arsenal_points = next_global.arsenal_points.saturating_add(u64::from(arsenal_points));

    let result = PullResult {
        rarity,
        is_rate_up,
        triggered_pity,
        triggered_spark,
        arsenal_points,
    };
    (result, next_global, next_banner)
}

/// Ten bonus pulls granted at banner pull 30, with at least one 5★ or better.
///
/// Only the arsenal balance of the returned state differs from `global`.
pub fn simulate_fast_track<R: RngCore + ?Sized>(
    global: GlobalGachaState,
    rng: &mut R,
) -> (FastTrackResult, GlobalGachaState) {
    let mut next_global = global;
    let mut pulls = Vec::with_capacity(FAST_TRACK_PULLS);
    let mut arsenal_gained = 0u32;

    for _ in 0..FAST_TRACK_PULLS {
        let (result, after, _) = pull(next_global, BannerState::default(), rng, true);
        next_global.arsenal_points = after.arsenal_points;
        arsenal_gained += result.arsenal_points;
        pulls.push(result);
    }

    if !pulls.iter().any(|p| p.rarity.is_five_or_above()) {
        if let Some(last) = pulls.last_mut() {
            let replacement = PullResult::plain_five();
            arsenal_gained = arsenal_gained - last.arsenal_points + replacement.arsenal_points;
            next_global.arsenal_points = next_global
                .arsenal_points
                .saturating_sub(u64::from(last.arsenal_points))
                .saturating_add(u64::from(replacement.arsenal_points));
            *last = replacement;
        }
    }

    (
        FastTrackResult {
            pulls,
            arsenal_gained,
        },
        next_global,
    )
}

/// A character banner in progress.
///
/// Tracks cumulative pulls so the Fast Track fires at pull 30 and an Intel Report
/// is earned at pull 60, each at most once per banner.
#[derive(Clone, Debug)]
pub struct BannerRun {
    pub global: GlobalGachaState,
    pub banner: BannerState,
    pub pulls: Vec<PullResult>,
    pub fast_track: Option<FastTrackResult>,
    pub arsenal_gained: u64,
    pub generated_intel_report: bool,
}

impl BannerRun {
    pub fn start(global: GlobalGachaState) -> Self {
        BannerRun {
            global,
            banner: BannerState::default(),
            pulls: Vec::new(),
            fast_track: None,
            arsenal_gained: 0,
            generated_intel_report: false,
        }
    }

    pub fn pull_once<R: RngCore + ?Sized>(&mut self, rng: &mut R) -> PullResult {
        let (result, global, banner) = pull(self.global, self.banner, rng, false);
        self.global = global;
        self.banner = banner;
        self.banner.pulls_in_banner += 1;
        self.arsenal_gained += u64::from(result.arsenal_points);
        self.pulls.push(result);

        if self.banner.pulls_in_banner == FAST_TRACK_TRIGGER && !self.banner.fast_track_used {
            let (fast_track, global) = simulate_fast_track(self.global, rng);
            self.global = global;
            self.arsenal_gained += u64::from(fast_track.arsenal_gained);
            self.fast_track = Some(fast_track);
            self.banner.fast_track_used = true;
        }

        if self.banner.pulls_in_banner == INTEL_REPORT_TRIGGER && !self.banner.intel_report_used {
            self.generated_intel_report = true;
            self.banner.intel_report_used = true;
        }

        result
    }

    /// Fast Track results never count here.
    pub fn got_rate_up(&self) -> bool {
        self.banner.got_rate_up_in_this_banner
    }

    pub fn fast_track_pulls(&self) -> u64 {
        self.fast_track.as_ref().map_or(0, |ft| ft.pulls.len() as u64)
    }
}
