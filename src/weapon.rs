//! Weapon banner engine. One claim buys ten weapon pulls for a fixed arsenal cost.

use crate::gacha::Rarity;
use crate::rng::unit_f64;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};

pub const PROB_6: f64 = 0.04;
pub const PROB_5: f64 = 0.15;
pub const RATE_UP_RATIO: f64 = 0.25;

/// Claims without a 6★ before the next claim guarantees one.
pub const WEAPON_PITY_THRESHOLD: u32 = 3;
/// Claims without the rate-up weapon before the next claim guarantees it.
pub const WEAPON_SPARK_THRESHOLD: u32 = 7;

pub const PULLS_PER_CLAIM: usize = 10;
pub const ARSENAL_COST_PER_CLAIM: u64 = 1980;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponBannerState {
    pub weapon_pity_counter: u32,
    pub weapon_spark_counter: u32,
    pub got_rate_up_in_this_banner: bool,
    pub claims_in_banner: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponPullResult {
    pub rarity: Rarity,
    pub is_rate_up: bool,
    pub triggered_pity: bool,
    pub triggered_spark: bool,
}

impl WeaponPullResult {
    fn is_guarantee(&self) -> bool {
        self.triggered_pity || self.triggered_spark
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponClaimResult {
    pub pulls: Vec<WeaponPullResult>,
    pub got_six_star: bool,
    pub got_rate_up: bool,
    pub triggered_pity: bool,
    pub triggered_spark: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Guarantee {
    Spark,
    Pity,
}

/// Spark outranks pity when both counters are at their ceiling.
pub fn pending_guarantee(state: &WeaponBannerState) -> Option<Guarantee> {
    if state.weapon_spark_counter == WEAPON_SPARK_THRESHOLD && !state.got_rate_up_in_this_banner {
        Some(Guarantee::Spark)
    } else if state.weapon_pity_counter == WEAPON_PITY_THRESHOLD {
        Some(Guarantee::Pity)
    } else {
        None
    }
}

fn roll_rate_up<R: RngCore + ?Sized>(rng: &mut R) -> bool {
    unit_f64(rng) < RATE_UP_RATIO
}

fn roll_weapon<R: RngCore + ?Sized>(rng: &mut R) -> WeaponPullResult {
    let r = unit_f64(rng);
    let rarity = if r < PROB_6 {
        Rarity::Six
    } else if r < PROB_6 + PROB_5 {
        Rarity::Five
    } else {
        Rarity::Four
    };
    let is_rate_up = rarity == Rarity::Six && roll_rate_up(rng);
    WeaponPullResult {
        rarity,
        is_rate_up,
        triggered_pity: false,
        triggered_spark: false,
    }
}

/// Resolves one claim of ten weapon pulls.
pub fn claim<R: RngCore + ?Sized>(
    state: WeaponBannerState,
    rng: &mut R,
) -> (WeaponClaimResult, WeaponBannerState) {
    let guarantee = pending_guarantee(&state);
    let mut pulls: Vec<WeaponPullResult> = (0..PULLS_PER_CLAIM - 1).map(|_| roll_weapon(rng)).collect();

    let six_in_first_nine = pulls.iter().any(|p| p.rarity == Rarity::Six);
    let rate_up_in_first_nine = pulls.iter().any(|p| p.rarity == Rarity::Six && p.is_rate_up);

    let last = match guarantee {
        Some(Guarantee::Spark) if !rate_up_in_first_nine => WeaponPullResult {
            rarity: Rarity::Six,
            is_rate_up: true,
            triggered_pity: false,
            triggered_spark: true,
        },
        Some(Guarantee::Pity) if !six_in_first_nine => WeaponPullResult {
            rarity: Rarity::Six,
            is_rate_up: roll_rate_up(rng),
            triggered_pity: true,
            triggered_spark: false,
        },
        _ => roll_weapon(rng),
    };
    pulls.push(last);

    // 5★ floor. A guarantee-forced tenth pull is never overwritten.
    if !pulls.iter().any(|p| p.rarity.is_five_or_above()) {
        if let Some(tenth) = pulls.last_mut() {
            if !tenth.is_guarantee() {
                *tenth = WeaponPullResult {
                    rarity: Rarity::Five,
                    is_rate_up: false,
                    triggered_pity: false,
                    triggered_spark: false,
                };
            }
        }
    }

    let got_six_star = pulls.iter().any(|p| p.rarity == Rarity::Six);
    let got_rate_up = pulls.iter().any(|p| p.rarity == Rarity::Six && p.is_rate_up);

    let mut next = state;
    next.weapon_pity_counter = if got_six_star { 0 } else { state.weapon_pity_counter + 1 };
    next.weapon_spark_counter = if got_rate_up { 0 } else { state.weapon_spark_counter + 1 };
    if got_rate_up {
        next.got_rate_up_in_this_banner = true;
    }
    next.claims_in_banner += 1;

    let result = WeaponClaimResult {
        triggered_pity: pulls.iter().any(|p| p.triggered_pity),
        triggered_spark: pulls.iter().any(|p| p.triggered_spark),
        pulls,
        got_six_star,
        got_rate_up,
    };
    (result, next)
}
