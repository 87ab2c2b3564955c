//! Grouped descriptive statistics over the patient dataset.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::debug;

use crate::dataset::{PatientRecord, Priority};

/// Rounds to two decimals, resolving ties to the even neighbour. `NaN` passes through.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Count, mean, extremes and sample standard deviation of one group.
///
/// All floating point fields except `sum` are rounded to two decimals.  The standard deviation
/// uses Bessel's correction and is `NaN` for single-member groups.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupStatistics<K> {
    pub key: K,
    pub count: usize,
    /// Unrounded total of the group's values, for aggregating across groups.
    pub sum: f64,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub std: f64,
}

/// Per-priority statistics as shown in the report table.
pub type PriorityStatistics = GroupStatistics<String>;

impl<K> GroupStatistics<K> {
    fn from_values(key: K, values: &[f64]) -> Self {
        let count = values.len();
        let sum = values.iter().sum::<f64>();
        let mean = sum / count as f64;
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let std = if count > 1 {
            let squares = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            (squares / (count - 1) as f64).sqrt()
        } else {
            f64::NAN
        };

        Self {
            key,
            count,
            sum,
            mean: round2(mean),
            max: round2(max),
            min: round2(min),
            std: round2(std),
        }
    }
}

/// Groups `records` by `key` and aggregates the value selected by `metric`.
///
/// One entry is produced per distinct key present in the input, ordered by key.
pub fn summarize_by<K, F, M>(
    records: &[PatientRecord],
    key: F,
    metric: M,
) -> Vec<GroupStatistics<K>>
where
    K: Ord,
    F: Fn(&PatientRecord) -> K,
    M: Fn(&PatientRecord) -> f64,
{
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(metric(record));
    }

    groups
        .into_iter()
        .map(|(key, values)| GroupStatistics::from_values(key, &values))
        .collect()
}

/// Wait time statistics grouped by priority label.
pub fn priority_statistics(records: &[PatientRecord]) -> Vec<PriorityStatistics> {
    let stats = summarize_by(
        records,
        |record| record.priority().to_owned(),
        PatientRecord::wait_time,
    );
    for group in &stats {
        debug!(
            "{}: count={} mean={} max={} min={} std={}",
            group.key, group.count, group.mean, group.max, group.min, group.std
        );
    }
    stats
}

/// Orders labels with the known priorities first (`High`, `Medium`, `Low`) and any others after,
/// alphabetically.
pub fn display_order(a: &str, b: &str) -> Ordering {
    let rank = |label: &str| {
        Priority::ALL
            .iter()
            .position(|priority| priority.as_str() == label)
            .unwrap_or(Priority::ALL.len())
    };
    rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
}

/// Five-number summary plus outliers used to draw one box of a box plot.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxSummary {
    pub label: String,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Percentile with linear interpolation between closest ranks; `sorted` must be non-empty.
fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    let position = fraction * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

impl BoxSummary {
    /// Summarizes `values`, returning `None` when there is nothing to summarize.
    ///
    /// Whiskers reach the most extreme values within 1.5 IQR of the box; everything beyond them is
    /// reported as an outlier.
    pub fn from_values(label: impl Into<String>, values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let q1 = percentile(&sorted, 0.25);
        let median = percentile(&sorted, 0.5);
        let q3 = percentile(&sorted, 0.75);
        let reach = 1.5 * (q3 - q1);
        let (low_fence, high_fence) = (q1 - reach, q3 + reach);

        let inside = || {
            sorted
                .iter()
                .copied()
                .filter(move |value| *value >= low_fence && *value <= high_fence)
        };
        let lower_whisker = inside().next().unwrap_or(q1).min(q1);
        let upper_whisker = inside().last().unwrap_or(q3).max(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|value| *value < low_fence || *value > high_fence)
            .collect();

        Some(Self {
            label: label.into(),
            q1,
            median,
            q3,
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }
}
