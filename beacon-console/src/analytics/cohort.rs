use beacon_core::{AirQloudPerformance, DeviceId};
use serde::Serialize;

use super::{AggregationOptions, PerformanceSummary, UptimeStatus, aggregate, mean};

#[derive(Debug, Clone, Serialize)]
pub struct DeviceSummary {
    pub device_id: DeviceId,
    pub name: String,
    pub status: UptimeStatus,
    pub summary: PerformanceSummary,
}

/// Per-device summaries of an AirQloud plus cohort-wide averages.
#[derive(Debug, Clone, Serialize)]
pub struct CohortSummary {
    pub id: String,
    pub name: Option<String>,
    pub devices: Vec<DeviceSummary>,
    /// Mean overall uptime of the devices that reported any day.
    pub average_uptime: f64,
    /// Mean error margin over the retained samples of every device.
    pub average_error_margin: f64,
}

impl CohortSummary {
    pub fn status(&self) -> UptimeStatus {
        UptimeStatus::from_uptime(self.average_uptime)
    }
}

pub fn aggregate_cohort(cohort: &AirQloudPerformance, options: &AggregationOptions) -> CohortSummary {
    let devices: Vec<DeviceSummary> = cohort
        .device_performance
        .iter()
        .map(|device| {
            let summary = aggregate(&device.performance, options);
            DeviceSummary {
                device_id: device.device_id.clone(),
                name: device.display_name().to_string(),
                status: summary.status(),
                summary,
            }
        })
        .collect();

    let reporting: Vec<f64> = devices
        .iter()
        .filter(|device| !device.summary.uptime_history.is_empty())
        .map(|device| device.summary.overall_uptime)
        .collect();

    let (margin_sum, margin_count) = devices.iter().fold((0.0, 0usize), |(sum, count), device| {
        let summary = &device.summary;
        (
            sum + summary.overall_average_error_margin * summary.error_margin_samples as f64,
            count + summary.error_margin_samples,
        )
    });
    let average_error_margin = if margin_count == 0 {
        0.0
    } else {
        margin_sum / margin_count as f64
    };

    CohortSummary {
        id: cohort.id.to_string(),
        name: cohort.name.as_deref().map(str::to_string),
        devices,
        average_uptime: mean(&reporting),
        average_error_margin,
    }
}
