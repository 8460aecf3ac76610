use serde::{Deserialize, Serialize};

use crate::{BoxStr, DeviceId};

/// Raw hourly performance series of one device.
///
/// The three vectors are parallel: entry `i` of each describes the same
/// hour. The backend does not guarantee that the hours are contiguous or
/// sorted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceSeries {
    #[serde(default)]
    pub freq: Vec<Option<f64>>,
    #[serde(default)]
    pub error_margin: Vec<Option<f64>>,
    #[serde(default)]
    pub timestamp: Vec<BoxStr>,
}

impl PerformanceSeries {
    pub fn len(&self) -> usize {
        self.timestamp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamp.is_empty()
    }

    /// Iterates `(timestamp, frequency, error margin)` triples.
    ///
    /// Iteration stops at the shortest of the three vectors.
    pub fn samples(&self) -> impl Iterator<Item = (&str, Option<f64>, Option<f64>)> {
        self.timestamp
            .iter()
            .zip(self.freq.iter())
            .zip(self.error_margin.iter())
            .map(|((ts, freq), margin)| (&**ts, *freq, *margin))
    }

    /// True when the parallel vectors disagree on length.
    pub fn is_ragged(&self) -> bool {
        self.freq.len() != self.timestamp.len() || self.error_margin.len() != self.timestamp.len()
    }
}

/// Performance of one device inside a cohort response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicePerformance {
    pub device_id: DeviceId,
    #[serde(default)]
    pub device_name: Option<BoxStr>,
    #[serde(default)]
    pub performance: PerformanceSeries,
}

impl DevicePerformance {
    /// Display name, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        self.device_name.as_deref().unwrap_or(&self.device_id.0)
    }
}

/// An AirQloud (cohort) with the performance of each member device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirQloudPerformance {
    #[serde(alias = "_id")]
    pub id: BoxStr,
    #[serde(default)]
    pub name: Option<BoxStr>,
    #[serde(default)]
    pub device_performance: Vec<DevicePerformance>,
}
