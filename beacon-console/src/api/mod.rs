//! Read-only client for the backend REST endpoints the console consumes.

mod network;
mod retry;

use beacon_core::{AirQloudPerformance, Device, DeviceId, Organization, PerformanceSeries, Site};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ApiConfig;
use crate::fetch::FetchError;
use crate::state::AppContext;

pub use network::NetworkAnalysisSource;
pub use retry::{RetryPolicy, retry};

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    retry: RetryPolicy,
    context: AppContext,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, context: AppContext) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FetchError::Source(format!("invalid base url `{}`: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::Source(format!(
                "base url `{}` cannot carry a path",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                delay: config.retry_delay(),
            },
            context,
        })
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Query parameters scoping collection requests to the session.
    async fn scope(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(network) = self.context.active_network().await {
            query.push(("network", network));
        }
        if let Some(group) = self.context.active_group().await {
            query.push(("group", group.title));
        }
        query
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, FetchError> {
        let request = match &self.token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        Ok(body)
    }

    async fn get<T>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let url = self.url(segments);
        debug!(%url, "GET");
        let body = retry(self.retry, cancel, || {
            self.send(self.http.get(url.clone()).query(query))
        })
        .await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn organizations(&self, cancel: CancellationToken) -> Result<Vec<Organization>, FetchError> {
        let body: serde_json::Value = self.get(&["users", "groups"], &[], &cancel).await?;
        decode_collection(body, "groups")
    }

    pub async fn sites(&self, cancel: CancellationToken) -> Result<Vec<Site>, FetchError> {
        let query = self.scope().await;
        let body: serde_json::Value = self
            .get(&["devices", "sites", "summary"], &query, &cancel)
            .await?;
        decode_collection(body, "sites")
    }

    pub async fn devices(&self, cancel: CancellationToken) -> Result<Vec<Device>, FetchError> {
        let query = self.scope().await;
        let body: serde_json::Value = self.get(&["devices", "summary"], &query, &cancel).await?;
        decode_collection(body, "devices")
    }

    pub async fn device_performance(
        &self,
        device: &DeviceId,
        days: u32,
        cancel: CancellationToken,
    ) -> Result<PerformanceSeries, FetchError> {
        self.get(
            &["beacon", "devices", &device.0, "performance"],
            &[("days", days.to_string())],
            &cancel,
        )
        .await
    }

    pub async fn airqloud(
        &self,
        id: &str,
        days: u32,
        cancel: CancellationToken,
    ) -> Result<AirQloudPerformance, FetchError> {
        self.get(
            &["beacon", "airqlouds", id],
            &[
                ("include_performance", "true".to_string()),
                ("performance_days", days.to_string()),
            ],
            &cancel,
        )
        .await
    }
}

/// Accepts either a bare array or an object holding the array under `key`.
pub fn decode_collection<T>(body: serde_json::Value, key: &str) -> Result<Vec<T>, FetchError>
where
    T: DeserializeOwned,
{
    match body {
        serde_json::Value::Array(_) => Ok(serde_json::from_value(body)?),
        serde_json::Value::Object(mut map) => match map.remove(key) {
            Some(items) => Ok(serde_json::from_value(items)?),
            None => Err(FetchError::Source(format!("response has no `{key}` field"))),
        },
        _ => Err(FetchError::Source(format!("expected a list of {key}"))),
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        #[serde(alias = "detail")]
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}
