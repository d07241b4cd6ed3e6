use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One point of a discrete distribution: the share of trials that ended on `value`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistributionEntry {
    #[serde(rename = "count")]
    pub value: u64,
    pub percentage: f64,
}

pub fn mean(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

pub fn sorted(values: &[u64]) -> Vec<u64> {
    let mut out = values.to_vec();
    out.sort_unstable();
    out
}

/// Nearest rank with truncation: `sorted[floor(p * (n - 1))]`. No interpolation.
pub fn quantile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = (p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Value -> percentage of samples, ascending by value.
pub fn distribution(values: &[u64]) -> Vec<DistributionEntry> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
    for &v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    let n = values.len() as f64;
    counts
        .into_iter()
        .map(|(value, count)| DistributionEntry {
            value,
            percentage: count as f64 * 100.0 / n,
        })
        .collect()
}

/// Rounds every value down to a multiple of `width`.
pub fn bucketed(values: &[u64], width: u64) -> Vec<u64> {
    if width == 0 {
        return values.to_vec();
    }
    values.iter().map(|&v| v / width * width).collect()
}

/// Smallest value whose ascending cumulative share first reaches `target_pct`,
/// with that cumulative share.
///
/// Counts are compared exactly, so a distribution that lands on 75.0% is not
/// lost to float drift in the running percentage.
pub fn cumulative_threshold(sorted: &[u64], target_pct: f64) -> Option<(u64, f64)> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let mut covered = 0usize;
    let mut i = 0;
    while i < n {
        let value = sorted[i];
        while i < n && sorted[i] == value {
            i += 1;
            covered += 1;
        }
        if covered as f64 * 100.0 >= target_pct * n as f64 {
            return Some((value, covered as f64 * 100.0 / n as f64));
        }
    }
    sorted.last().map(|&v| (v, 100.0))
}
