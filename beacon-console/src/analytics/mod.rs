//! Daily uptime and error-margin summaries of raw hourly device series.

mod cohort;
mod day;

use std::collections::BTreeMap;
use std::fmt;

use beacon_core::PerformanceSeries;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use serde::Serialize;
use tracing::warn;

pub use cohort::{CohortSummary, DeviceSummary, aggregate_cohort};
pub use day::day_of;

pub const DEFAULT_MAX_DAYS: usize = 14;
const HOURS_PER_DAY: f64 = 24.0;

#[derive(Debug, Clone)]
pub struct AggregationOptions {
    /// Number of most recent days kept.
    pub max_days: usize,
    /// Zone that offset-carrying timestamps are converted into before
    /// truncation to a calendar day. Timestamps without an offset are
    /// bucketed by their own wall-clock date.
    pub timezone: TimeZone,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            max_days: DEFAULT_MAX_DAYS,
            timezone: TimeZone::UTC,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: Date,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    /// Chronological, at most `max_days` entries, each within `0..=100`.
    pub uptime_history: Vec<DailyPoint>,
    pub error_margin_history: Vec<DailyPoint>,
    pub overall_uptime: f64,
    pub overall_average_error_margin: f64,
    /// Finite error margins inside the retained window.
    pub error_margin_samples: usize,
    /// Mean of the positive frequency samples in the window.
    pub average_frequency: f64,
    /// Length of the raw series, including discarded samples.
    pub total_data_points: usize,
    pub discarded_timestamps: usize,
}

impl PerformanceSummary {
    pub fn status(&self) -> UptimeStatus {
        UptimeStatus::from_uptime(self.overall_uptime)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UptimeStatus {
    Good,
    Fair,
    Poor,
}

impl UptimeStatus {
    pub fn from_uptime(uptime: f64) -> Self {
        if uptime >= 75.0 {
            UptimeStatus::Good
        } else if uptime >= 50.0 {
            UptimeStatus::Fair
        } else {
            UptimeStatus::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UptimeStatus::Good => "Good",
            UptimeStatus::Fair => "Fair",
            UptimeStatus::Poor => "Poor",
        }
    }
}

impl fmt::Display for UptimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Default)]
struct DayBucket {
    hours_with_data: u32,
    error_margins: Vec<f64>,
    frequencies: Vec<f64>,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn uptime_percent(hours_with_data: u32, days: usize) -> f64 {
    if days == 0 {
        return 0.0;
    }
    (f64::from(hours_with_data) / (days as f64 * HOURS_PER_DAY) * 100.0).min(100.0)
}

/// Buckets a raw hourly series into calendar days and summarizes the most
/// recent `options.max_days` of them.
pub fn aggregate(series: &PerformanceSeries, options: &AggregationOptions) -> PerformanceSummary {
    if series.is_ragged() {
        warn!(
            timestamps = series.timestamp.len(),
            freq = series.freq.len(),
            error_margin = series.error_margin.len(),
            "performance series vectors differ in length, extra samples ignored"
        );
    }

    let mut buckets: BTreeMap<Date, DayBucket> = BTreeMap::new();
    let mut discarded = 0usize;

    for (timestamp, freq, margin) in series.samples() {
        let Some(date) = day_of(timestamp, &options.timezone) else {
            discarded += 1;
            continue;
        };

        let bucket = buckets.entry(date).or_default();
        if let Some(freq) = freq
            && freq > 0.0
        {
            bucket.hours_with_data += 1;
            bucket.frequencies.push(freq);
        }
        if let Some(margin) = margin
            && margin.is_finite()
        {
            bucket.error_margins.push(margin);
        }
    }

    if discarded > 0 {
        warn!(discarded, "discarded samples with unparseable timestamps");
    }

    let skip = buckets.len().saturating_sub(options.max_days);
    let window: Vec<(Date, DayBucket)> = buckets.into_iter().skip(skip).collect();

    let mut uptime_history = Vec::with_capacity(window.len());
    let mut error_margin_history = Vec::with_capacity(window.len());
    let mut total_hours = 0u32;
    let mut all_margins = Vec::new();
    let mut all_frequencies = Vec::new();

    for (date, bucket) in window.iter() {
        uptime_history.push(DailyPoint {
            date: *date,
            value: uptime_percent(bucket.hours_with_data, 1),
        });
        error_margin_history.push(DailyPoint {
            date: *date,
            value: mean(&bucket.error_margins),
        });

        total_hours += bucket.hours_with_data;
        all_margins.extend_from_slice(&bucket.error_margins);
        all_frequencies.extend_from_slice(&bucket.frequencies);
    }

    PerformanceSummary {
        uptime_history,
        error_margin_history,
        overall_uptime: uptime_percent(total_hours, window.len()),
        overall_average_error_margin: mean(&all_margins),
        error_margin_samples: all_margins.len(),
        average_frequency: mean(&all_frequencies),
        total_data_points: series.len(),
        discarded_timestamps: discarded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(samples: &[(&str, Option<f64>, Option<f64>)]) -> PerformanceSeries {
        PerformanceSeries {
            timestamp: samples.iter().map(|(ts, _, _)| (*ts).into()).collect(),
            freq: samples.iter().map(|(_, f, _)| *f).collect(),
            error_margin: samples.iter().map(|(_, _, m)| *m).collect(),
        }
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(UptimeStatus::from_uptime(75.0), UptimeStatus::Good);
        assert_eq!(UptimeStatus::from_uptime(74.9), UptimeStatus::Fair);
        assert_eq!(UptimeStatus::from_uptime(50.0), UptimeStatus::Fair);
        assert_eq!(UptimeStatus::from_uptime(49.9), UptimeStatus::Poor);
        assert_eq!(UptimeStatus::Poor.to_string(), "Poor");
    }

    #[test]
    fn error_margins_average_per_day_and_ignore_nulls() {
        let summary = aggregate(
            &series(&[
                ("2024-05-01T00:00:00Z", Some(1.0), Some(2.0)),
                ("2024-05-01T01:00:00Z", Some(0.0), None),
                ("2024-05-01T02:00:00Z", None, Some(4.0)),
                ("2024-05-02T00:00:00Z", Some(3.0), None),
            ]),
            &AggregationOptions::default(),
        );

        assert_eq!(summary.error_margin_history.len(), 2);
        assert_eq!(summary.error_margin_history[0].value, 3.0);
        assert_eq!(summary.error_margin_history[1].value, 0.0);
        assert_eq!(summary.overall_average_error_margin, 3.0);
        assert_eq!(summary.average_frequency, 2.0);
    }

    #[test]
    fn unparseable_timestamps_are_dropped_before_bucketing() {
        let summary = aggregate(
            &series(&[
                ("2024-05-01T00:00:00Z", Some(1.0), None),
                ("Invalid Date", Some(1.0), Some(9.0)),
                ("", Some(1.0), None),
            ]),
            &AggregationOptions::default(),
        );

        assert_eq!(summary.uptime_history.len(), 1);
        assert_eq!(summary.discarded_timestamps, 2);
        assert_eq!(summary.total_data_points, 3);
        assert_eq!(summary.overall_average_error_margin, 0.0);
    }

    #[test]
    fn window_keeps_most_recent_days_in_order() {
        let samples: Vec<String> = (1..=20)
            .rev()
            .map(|day| format!("2024-03-{day:02}T12:00:00Z"))
            .collect();
        let raw = PerformanceSeries {
            freq: vec![Some(1.0); samples.len()],
            error_margin: vec![None; samples.len()],
            timestamp: samples.into_iter().map(Into::into).collect(),
        };

        let summary = aggregate(&raw, &AggregationOptions::default());
        let dates: Vec<String> = summary
            .uptime_history
            .iter()
            .map(|point| point.date.to_string())
            .collect();

        assert_eq!(dates.len(), DEFAULT_MAX_DAYS);
        assert_eq!(dates.first().map(String::as_str), Some("2024-03-07"));
        assert_eq!(dates.last().map(String::as_str), Some("2024-03-20"));
    }

    #[test]
    fn overall_figures_cover_only_the_retained_window() {
        let mut samples = Vec::new();
        for day in 1..=16 {
            let (freq, margin) = if day <= 2 { (0.0, 10.0) } else { (1.0, 2.0) };
            for hour in 0..24 {
                samples.push((format!("2024-03-{day:02}T{hour:02}:00:00Z"), freq, margin));
            }
        }
        let raw = PerformanceSeries {
            freq: samples.iter().map(|(_, f, _)| Some(*f)).collect(),
            error_margin: samples.iter().map(|(_, _, m)| Some(*m)).collect(),
            timestamp: samples.iter().map(|(ts, _, _)| ts.as_str().into()).collect(),
        };

        let summary = aggregate(&raw, &AggregationOptions::default());

        assert_eq!(summary.uptime_history.len(), DEFAULT_MAX_DAYS);
        assert_eq!(summary.uptime_history[0].date.to_string(), "2024-03-03");
        assert_eq!(summary.overall_uptime, 100.0);
        assert_eq!(summary.overall_average_error_margin, 2.0);
        assert_eq!(summary.error_margin_samples, DEFAULT_MAX_DAYS * 24);
        assert_eq!(summary.total_data_points, 16 * 24);
    }

    #[test]
    fn timezone_policy_moves_late_utc_hours_forward() {
        let raw = series(&[("2024-05-01T22:30:00Z", Some(1.0), None)]);

        let utc = aggregate(&raw, &AggregationOptions::default());
        assert_eq!(utc.uptime_history[0].date.to_string(), "2024-05-01");

        let nairobi = AggregationOptions {
            timezone: TimeZone::fixed(jiff::tz::offset(3)),
            ..Default::default()
        };
        let local = aggregate(&raw, &nairobi);
        assert_eq!(local.uptime_history[0].date.to_string(), "2024-05-02");
    }
}
