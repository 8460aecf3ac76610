use beacon_core::{Device, Organization, Site, parse_created_at};

use super::filter::{
    DeviceDimension, DeviceFilter, DeviceSortBy, OrganizationDimension, OrganizationFilter,
    OrganizationSortBy, SiteDimension, SiteFilter, SiteSortBy,
};
use super::{ItemFilter, Listable, SortKey};

fn eq_ignore_case(value: Option<&str>, wanted: &str) -> bool {
    value.is_some_and(|value| value.to_lowercase() == wanted.to_lowercase())
}

impl ItemFilter<Organization> for OrganizationFilter {
    type Dimension = OrganizationDimension;

    fn set(&mut self, dimension: Self::Dimension) {
        match dimension {
            OrganizationDimension::Status(status) => self.status = status,
            OrganizationDimension::Industry(industry) => self.industry = industry,
        }
    }

    fn matches(&self, org: &Organization) -> bool {
        if let Some(status) = &self.status
            && org.grp_status.as_ref() != Some(status)
        {
            return false;
        }

        if let Some(industry) = &self.industry
            && !eq_ignore_case(org.grp_industry.as_deref(), industry)
        {
            return false;
        }

        true
    }
}

impl Listable for Organization {
    type SortBy = OrganizationSortBy;
    type Filter = OrganizationFilter;

    const DEFAULT_SORT_BY: OrganizationSortBy = OrganizationSortBy::CreatedAt;

    fn search_fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(&*self.grp_title)
    }

    fn sort_key(&self, by: OrganizationSortBy) -> SortKey<'_> {
        match by {
            OrganizationSortBy::Title => SortKey::Text(Some(&*self.grp_title)),
            OrganizationSortBy::Industry => SortKey::Text(self.grp_industry.as_deref()),
            OrganizationSortBy::Status => SortKey::Text(self.grp_status.map(|s| s.as_str())),
            OrganizationSortBy::CreatedAt => {
                SortKey::Time(parse_created_at(self.created_at.as_deref()))
            }
            OrganizationSortBy::Members => SortKey::Count(self.number_of_group_users),
        }
    }
}

impl ItemFilter<Site> for SiteFilter {
    type Dimension = SiteDimension;

    fn set(&mut self, dimension: Self::Dimension) {
        match dimension {
            SiteDimension::Online(online) => self.online = online,
        }
    }

    fn matches(&self, site: &Site) -> bool {
        self.online.is_none_or(|online| site.is_online == online)
    }
}

impl Listable for Site {
    type SortBy = SiteSortBy;
    type Filter = SiteFilter;

    const DEFAULT_SORT_BY: SiteSortBy = SiteSortBy::CreatedAt;

    fn search_fields(&self) -> impl Iterator<Item = &str> {
        [
            &self.name,
            &self.location_name,
            &self.generated_name,
            &self.formatted_name,
        ]
        .into_iter()
        .filter_map(|field| field.as_deref())
    }

    fn sort_key(&self, by: SiteSortBy) -> SortKey<'_> {
        match by {
            SiteSortBy::Name => SortKey::Text(self.name.as_deref()),
            SiteSortBy::Description => SortKey::Text(self.description.as_deref()),
            SiteSortBy::Online => SortKey::Flag(self.is_online),
            SiteSortBy::CreatedAt => SortKey::Time(parse_created_at(self.created_at.as_deref())),
        }
    }
}

impl ItemFilter<Device> for DeviceFilter {
    type Dimension = DeviceDimension;

    fn set(&mut self, dimension: Self::Dimension) {
        match dimension {
            DeviceDimension::Status(status) => self.status = status,
            DeviceDimension::Category(category) => self.category = category,
        }
    }

    fn matches(&self, device: &Device) -> bool {
        if let Some(status) = &self.status
            && device.status.as_ref() != Some(status)
        {
            return false;
        }

        if let Some(category) = &self.category
            && !eq_ignore_case(device.category.as_deref(), category)
        {
            return false;
        }

        true
    }
}

impl Listable for Device {
    type SortBy = DeviceSortBy;
    type Filter = DeviceFilter;

    const DEFAULT_SORT_BY: DeviceSortBy = DeviceSortBy::CreatedAt;

    fn search_fields(&self) -> impl Iterator<Item = &str> {
        [&self.name, &self.long_name, &self.description]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .chain(std::iter::once(&*self.id.0))
    }

    fn sort_key(&self, by: DeviceSortBy) -> SortKey<'_> {
        match by {
            DeviceSortBy::Name => SortKey::Text(self.name.as_deref()),
            DeviceSortBy::Status => SortKey::Text(self.status.map(|s| s.as_str())),
            DeviceSortBy::Category => SortKey::Text(self.category.as_deref()),
            DeviceSortBy::CreatedAt => {
                SortKey::Time(parse_created_at(self.created_at.as_deref()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use beacon_core::{DeviceId, DeviceStatus, GroupId, GroupStatus, SiteId};

    use super::*;
    use crate::list::ListController;

    fn org(id: &str, title: &str, industry: Option<&str>, status: GroupStatus) -> Organization {
        Organization {
            id: GroupId(id.into()),
            grp_title: title.into(),
            grp_status: Some(status),
            grp_industry: industry.map(Into::into),
            number_of_group_users: None,
            created_at: None,
        }
    }

    fn site(id: &str, name: Option<&str>, location: Option<&str>, online: bool) -> Site {
        Site {
            id: SiteId(id.into()),
            name: name.map(Into::into),
            description: None,
            location_name: location.map(Into::into),
            generated_name: None,
            formatted_name: None,
            is_online: online,
            created_at: None,
        }
    }

    #[test]
    fn organization_dimensions_combine_as_conjunction() {
        let mut list = ListController::with_items(
            10,
            vec![
                org("1", "Makerere", Some("research"), GroupStatus::Active),
                org("2", "KCCA", Some("Government"), GroupStatus::Active),
                org("3", "UNEP", Some("Research"), GroupStatus::Inactive),
            ],
        );

        list.set_filter(OrganizationDimension::Industry(Some("RESEARCH".into())));
        assert_eq!(list.filtered().len(), 2);

        list.set_filter(OrganizationDimension::Status(Some(GroupStatus::Active)));
        let rows = list.filtered();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, GroupId("1".into()));

        list.set_filter(OrganizationDimension::Industry(None));
        assert_eq!(list.filtered().len(), 2);
    }

    #[test]
    fn site_search_covers_every_name_field() {
        let mut list = ListController::with_items(
            10,
            vec![
                site("a", Some("Nakawa"), None, true),
                site("b", None, Some("Kampala Central"), false),
                site("c", Some("Jinja"), None, true),
            ],
        );

        list.set_search_query("kampala");
        assert_eq!(list.filtered()[0].id, SiteId("b".into()));

        list.set_search_query("");
        list.set_filter(SiteDimension::Online(Some(true)));
        assert_eq!(list.filtered().len(), 2);
    }

    #[test]
    fn device_search_matches_identifier_and_status_filter() {
        let devices = vec![
            Device {
                id: DeviceId("aq_g5_01".into()),
                name: None,
                long_name: None,
                description: None,
                status: Some(DeviceStatus::Deployed),
                category: Some("lowcost".into()),
                created_at: Some("2024-01-02T00:00:00Z".into()),
            },
            Device {
                id: DeviceId("aq_bam_02".into()),
                name: Some("Reference".into()),
                long_name: None,
                description: None,
                status: Some(DeviceStatus::Recalled),
                category: Some("bam".into()),
                created_at: Some("2024-01-01T00:00:00Z".into()),
            },
        ];
        let mut list = ListController::with_items(10, devices);

        list.set_search_query("G5");
        assert_eq!(list.filtered().len(), 1);

        list.set_search_query("aq_");
        list.set_filter(DeviceDimension::Status(Some(DeviceStatus::Recalled)));
        let rows = list.filtered();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, DeviceId("aq_bam_02".into()));
    }

    #[test]
    fn missing_created_at_sorts_as_epoch() {
        let mut dated = org("dated", "Dated", None, GroupStatus::Active);
        dated.created_at = Some("2020-05-01T00:00:00Z".into());
        let mut garbage = org("garbage", "Garbage", None, GroupStatus::Active);
        garbage.created_at = Some("yesterday".into());
        let undated = org("undated", "Undated", None, GroupStatus::Active);

        let list = ListController::with_items(10, vec![undated, dated, garbage]);
        let ids: Vec<_> = list.filtered().iter().map(|o| o.id.0.to_string()).collect();
        assert_eq!(ids, vec!["dated", "undated", "garbage"]);
    }
}
