//! Time-series analysis over collected samples
//!
//! Pure functions; every one of them accepts an empty slice. Extremum lookups
//! scan left to right and keep the first hit, so ties go to the earliest
//! minute.

use serde::Serialize;

use crate::session::Sample;

/// A sample that achieved an extremum, with its position in the run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extremum {
    pub index: usize,
    pub sample: Sample,
}

impl Extremum {
    fn at(samples: &[Sample], index: Option<usize>) -> Option<Self> {
        let index = index?;
        samples.get(index).map(|sample| Extremum {
            index,
            sample: sample.clone(),
        })
    }

    /// 1-based minute for display
    pub fn minute(&self) -> usize {
        self.index + 1
    }
}

/// Index of the first sample whose key beats every earlier one
fn first_extreme_index<K, F, B>(samples: &[Sample], key: F, beats: B) -> Option<usize>
where
    F: Fn(&Sample) -> K,
    B: Fn(&K, &K) -> bool,
{
    let mut iter = samples.iter().enumerate();
    let (mut best_index, first) = iter.next()?;
    let mut best = key(first);

    for (index, sample) in iter {
        let candidate = key(sample);
        if beats(&candidate, &best) {
            best = candidate;
            best_index = index;
        }
    }
    Some(best_index)
}

pub fn average_ccu(samples: &[Sample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: u128 = samples.iter().map(|s| u128::from(s.ccu)).sum();
    sum as f64 / samples.len() as f64
}

pub fn peak_index(samples: &[Sample]) -> Option<usize> {
    first_extreme_index(samples, |s| s.ccu, |a, b| a > b)
}

pub fn trough_index(samples: &[Sample]) -> Option<usize> {
    first_extreme_index(samples, |s| s.ccu, |a, b| a < b)
}

pub fn rating_max_index(samples: &[Sample]) -> Option<usize> {
    first_extreme_index(samples, |s| s.rating, |a, b| a > b)
}

pub fn rating_min_index(samples: &[Sample]) -> Option<usize> {
    first_extreme_index(samples, |s| s.rating, |a, b| a < b)
}

/// `last.ccu - first.ccu`, 0 when empty
pub fn net_ccu_change(samples: &[Sample]) -> i64 {
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => last.ccu as i64 - first.ccu as i64,
        _ => 0,
    }
}

/// Net change as a percentage of the first value; `None` when the first
/// value is 0 (or nothing was collected).
pub fn net_ccu_change_percent(samples: &[Sample]) -> Option<f64> {
    let first = samples.first()?;
    if first.ccu == 0 {
        return None;
    }
    Some(net_ccu_change(samples) as f64 / first.ccu as f64 * 100.0)
}

/// `last.rating - first.rating` in percentage points, 0 when empty
pub fn net_rating_change(samples: &[Sample]) -> f64 {
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => last.rating - first.rating,
        _ => 0.0,
    }
}

/// Everything the results report needs about one session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub points: usize,
    pub start: Option<Sample>,
    pub end: Option<Sample>,
    pub average_ccu: f64,
    pub peak: Option<Extremum>,
    pub trough: Option<Extremum>,
    pub rating_high: Option<Extremum>,
    pub rating_low: Option<Extremum>,
    pub net_ccu_change: i64,
    pub net_ccu_change_percent: Option<f64>,
    pub net_rating_change: f64,
}

impl SessionSummary {
    pub fn from_samples(samples: &[Sample]) -> Self {
        Self {
            points: samples.len(),
            start: samples.first().cloned(),
            end: samples.last().cloned(),
            average_ccu: average_ccu(samples),
            peak: Extremum::at(samples, peak_index(samples)),
            trough: Extremum::at(samples, trough_index(samples)),
            rating_high: Extremum::at(samples, rating_max_index(samples)),
            rating_low: Extremum::at(samples, rating_min_index(samples)),
            net_ccu_change: net_ccu_change(samples),
            net_ccu_change_percent: net_ccu_change_percent(samples),
            net_rating_change: net_rating_change(samples),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points == 0
    }
}
