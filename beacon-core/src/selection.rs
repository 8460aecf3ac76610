use serde::{Deserialize, Serialize};

use crate::BoxStr;

/// Top level of the network-analysis selection chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub region: BoxStr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub country: BoxStr,
    #[serde(default)]
    pub data: Option<CountryData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryData {
    #[serde(default)]
    pub region: Option<BoxStr>,
}

impl Country {
    pub fn region(&self) -> Option<&str> {
        self.data.as_ref().and_then(|data| data.region.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub district: BoxStr,
}

/// Aggregate air-quality figures for one district.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistrictSummary {
    #[serde(default)]
    pub pm25: Option<f64>,
    #[serde(default)]
    pub pm10: Option<f64>,
    #[serde(rename = "devicesList", default)]
    pub devices_list: Vec<DistrictDevice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictDevice {
    #[serde(alias = "_id", alias = "device_id", default)]
    pub id: Option<BoxStr>,
    #[serde(default)]
    pub name: Option<BoxStr>,
}
