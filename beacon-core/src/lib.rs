use serde::{Deserialize, Serialize};

mod performance;
mod selection;

pub use performance::{AirQloudPerformance, DevicePerformance, PerformanceSeries};
pub use selection::{Country, CountryData, District, DistrictDevice, DistrictSummary, Region};

type BoxStr = Box<str>;

/// Opaque backend identifier of an organization (group).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub BoxStr);

/// Opaque backend identifier of a monitoring site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub BoxStr);

/// Opaque backend identifier of a monitoring device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub BoxStr);

/// An organization as returned by the groups endpoint.
///
/// Field names follow the backend verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    #[serde(rename = "_id")]
    pub id: GroupId,
    pub grp_title: BoxStr,
    #[serde(default)]
    pub grp_status: Option<GroupStatus>,
    #[serde(default)]
    pub grp_industry: Option<BoxStr>,
    #[serde(rename = "numberOfGroupUsers", default)]
    pub number_of_group_users: Option<u64>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<BoxStr>,
}

/// Organization lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupStatus {
    Active,
    Inactive,
    Pending,
}

impl GroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::Active => "ACTIVE",
            GroupStatus::Inactive => "INACTIVE",
            GroupStatus::Pending => "PENDING",
        }
    }
}

/// A monitoring site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    #[serde(rename = "_id")]
    pub id: SiteId,
    #[serde(default)]
    pub name: Option<BoxStr>,
    #[serde(default)]
    pub description: Option<BoxStr>,
    #[serde(default)]
    pub location_name: Option<BoxStr>,
    #[serde(default)]
    pub generated_name: Option<BoxStr>,
    #[serde(default)]
    pub formatted_name: Option<BoxStr>,
    #[serde(rename = "isOnline", default)]
    pub is_online: bool,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<BoxStr>,
}

/// A monitoring device as listed by the device inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "_id")]
    pub id: DeviceId,
    #[serde(default)]
    pub name: Option<BoxStr>,
    #[serde(default)]
    pub long_name: Option<BoxStr>,
    #[serde(default)]
    pub description: Option<BoxStr>,
    #[serde(default)]
    pub status: Option<DeviceStatus>,
    #[serde(default)]
    pub category: Option<BoxStr>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<BoxStr>,
}

/// Deployment state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Deployed,
    Recalled,
    NotDeployed,
    #[serde(other)]
    Unknown,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Deployed => "deployed",
            DeviceStatus::Recalled => "recalled",
            DeviceStatus::NotDeployed => "not_deployed",
            DeviceStatus::Unknown => "unknown",
        }
    }
}

/// Parses a backend creation timestamp.
///
/// Missing or unparseable values yield `None`; callers sorting by creation
/// time treat that as the Unix epoch.
pub fn parse_created_at(raw: Option<&str>) -> Option<jiff::Timestamp> {
    let raw = raw?.trim();
    if let Ok(ts) = raw.parse::<jiff::Timestamp>() {
        return Some(ts);
    }

    // Some collections store a bare civil datetime without an offset.
    raw.parse::<jiff::civil::DateTime>()
        .ok()
        .and_then(|dt| dt.to_zoned(jiff::tz::TimeZone::UTC).ok())
        .map(|zoned| zoned.timestamp())
}
