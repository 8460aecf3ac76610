use async_trait::async_trait;
use beacon_core::{Country, District, DistrictSummary, Region};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{ApiClient, decode_collection};
use crate::fetch::{CascadeSource, DependentSource, FetchError, SelectOption};

const LEVELS: &[&str] = &["region", "country", "district"];

impl ApiClient {
    pub async fn regions(&self, cancel: CancellationToken) -> Result<Vec<Region>, FetchError> {
        let body: serde_json::Value = self
            .get(&["network-analysis", "regional"], &[], &cancel)
            .await?;
        decode_collection(body, "regions")
    }

    /// Countries of `region`. The endpoint lists every country, so the
    /// region filter is applied here.
    pub async fn countries(
        &self,
        region: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<Country>, FetchError> {
        let body: serde_json::Value = self
            .get(&["network-analysis", "countries"], &[], &cancel)
            .await?;
        let countries: Vec<Country> = decode_collection(body, "countries")?;
        Ok(countries
            .into_iter()
            .filter(|country| country.region() == Some(region))
            .collect())
    }

    pub async fn districts(
        &self,
        country: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<District>, FetchError> {
        let body: serde_json::Value = self
            .get(
                &["network-analysis", "districts"],
                &[("country", country.to_string())],
                &cancel,
            )
            .await?;
        decode_collection(body, "districts")
    }

    pub async fn district_summary(
        &self,
        country: &str,
        district: &str,
        cancel: CancellationToken,
    ) -> Result<DistrictSummary, FetchError> {
        #[derive(Deserialize)]
        struct Envelope {
            data: DistrictSummary,
        }

        let envelope: Envelope = self
            .get(
                &["network-analysis", "districts", district],
                &[("country", country.to_string())],
                &cancel,
            )
            .await?;
        Ok(envelope.data)
    }
}

/// Region, country and district options for the network-analysis views.
#[derive(Clone)]
pub struct NetworkAnalysisSource {
    client: ApiClient,
}

impl NetworkAnalysisSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

fn parent<'a>(parents: &'a [String], index: usize) -> Result<&'a str, FetchError> {
    parents
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| FetchError::Source(format!("missing {} selection", LEVELS[index])))
}

#[async_trait]
impl CascadeSource for NetworkAnalysisSource {
    fn levels(&self) -> &[&'static str] {
        LEVELS
    }

    async fn options(
        &self,
        level: usize,
        parents: &[String],
        cancel: CancellationToken,
    ) -> Result<Vec<SelectOption>, FetchError> {
        let values: Vec<Box<str>> = match level {
            0 => self
                .client
                .regions(cancel)
                .await?
                .into_iter()
                .map(|region| region.region)
                .collect(),
            1 => self
                .client
                .countries(parent(parents, 0)?, cancel)
                .await?
                .into_iter()
                .map(|country| country.country)
                .collect(),
            2 => self
                .client
                .districts(parent(parents, 1)?, cancel)
                .await?
                .into_iter()
                .map(|district| district.district)
                .collect(),
            _ => return Err(FetchError::Source(format!("no cascade level {level}"))),
        };

        Ok(values
            .into_iter()
            .map(|value| SelectOption::new(String::from(value)))
            .collect())
    }
}

/// Keyed by `(country, district)`.
#[async_trait]
impl DependentSource<(String, String), DistrictSummary> for NetworkAnalysisSource {
    async fn fetch(
        &self,
        key: &(String, String),
        cancel: CancellationToken,
    ) -> Result<DistrictSummary, FetchError> {
        let (country, district) = key;
        self.client.district_summary(country, district, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parent_names_the_level() {
        let parents = vec!["Africa".to_string()];
        assert_eq!(parent(&parents, 0).unwrap(), "Africa");

        let err = parent(&parents, 1).unwrap_err();
        assert_eq!(err.to_string(), "missing country selection");
    }
}
