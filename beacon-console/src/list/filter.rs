use std::cmp::Ordering;
use std::str::FromStr;

use beacon_core::{DeviceStatus, GroupStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown sort field `{0}`")]
pub struct UnknownSortField(pub String);

#[derive(Debug, thiserror::Error)]
#[error("unknown status `{0}`")]
pub struct UnknownStatus(pub String);

/// Parses an organization status, ignoring case.
pub fn parse_group_status(raw: &str) -> Result<GroupStatus, UnknownStatus> {
    [GroupStatus::Active, GroupStatus::Inactive, GroupStatus::Pending]
        .into_iter()
        .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
        .ok_or_else(|| UnknownStatus(raw.to_string()))
}

/// Parses a device deployment status, accepting `-` or `_` as separator.
pub fn parse_device_status(raw: &str) -> Result<DeviceStatus, UnknownStatus> {
    let normalized = raw.trim().replace('-', "_");
    [
        DeviceStatus::Deployed,
        DeviceStatus::Recalled,
        DeviceStatus::NotDeployed,
    ]
    .into_iter()
    .find(|status| status.as_str().eq_ignore_ascii_case(&normalized))
    .ok_or_else(|| UnknownStatus(raw.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizationSortBy {
    Title,
    Industry,
    Status,
    CreatedAt,
    Members,
}

impl FromStr for OrganizationSortBy {
    type Err = UnknownSortField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grp_title" => Ok(Self::Title),
            "grp_industry" => Ok(Self::Industry),
            "grp_status" => Ok(Self::Status),
            "createdAt" => Ok(Self::CreatedAt),
            "numberOfGroupUsers" => Ok(Self::Members),
            other => Err(UnknownSortField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteSortBy {
    Name,
    Description,
    Online,
    CreatedAt,
}

impl FromStr for SiteSortBy {
    type Err = UnknownSortField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "description" => Ok(Self::Description),
            "isOnline" => Ok(Self::Online),
            "createdAt" => Ok(Self::CreatedAt),
            other => Err(UnknownSortField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSortBy {
    Name,
    Status,
    Category,
    CreatedAt,
}

impl FromStr for DeviceSortBy {
    type Err = UnknownSortField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "status" => Ok(Self::Status),
            "category" => Ok(Self::Category),
            "createdAt" => Ok(Self::CreatedAt),
            other => Err(UnknownSortField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrganizationFilter {
    pub status: Option<GroupStatus>,
    pub industry: Option<String>,
}

/// One replaceable dimension of [`OrganizationFilter`]. `None` clears it.
#[derive(Debug, Clone)]
pub enum OrganizationDimension {
    Status(Option<GroupStatus>),
    Industry(Option<String>),
}

#[derive(Debug, Clone, Default)]
pub struct SiteFilter {
    pub online: Option<bool>,
}

#[derive(Debug, Clone)]
pub enum SiteDimension {
    Online(Option<bool>),
}

#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    pub status: Option<DeviceStatus>,
    pub category: Option<String>,
}

#[derive(Debug, Clone)]
pub enum DeviceDimension {
    Status(Option<DeviceStatus>),
    Category(Option<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_parse_loosely() {
        assert_eq!(parse_group_status("active").unwrap(), GroupStatus::Active);
        assert_eq!(
            parse_device_status("not-deployed").unwrap(),
            DeviceStatus::NotDeployed
        );
        assert!(parse_device_status("unknown").is_err());
        assert!(parse_group_status("archived").is_err());
    }

    #[test]
    fn sort_fields_parse_backend_names() {
        assert_eq!(
            "numberOfGroupUsers".parse::<OrganizationSortBy>().unwrap(),
            OrganizationSortBy::Members
        );
        assert_eq!("isOnline".parse::<SiteSortBy>().unwrap(), SiteSortBy::Online);
        assert!("grp_title ".parse::<OrganizationSortBy>().is_err());
    }

    #[test]
    fn toggling_twice_is_identity() {
        assert_eq!(SortOrder::Asc.toggled().toggled(), SortOrder::Asc);
        assert_eq!(
            SortOrder::Desc.apply(Ordering::Less),
            Ordering::Greater
        );
    }
}
