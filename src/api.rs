use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::{
    StatusCode, Url,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::config::{FacilityConfig, NetworkConfig};

/// Failures of a single availability request. All of them abort the sweep.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request for {start} .. {end} failed")]
    Request {
        start: NaiveDate,
        end: NaiveDate,
        #[source]
        source: reqwest::Error,
    },
    #[error("API returned error status {status} for {start} .. {end}")]
    Status {
        start: NaiveDate,
        end: NaiveDate,
        status: StatusCode,
    },
    #[error("Failed to parse API response for {start} .. {end}")]
    Decode {
        start: NaiveDate,
        end: NaiveDate,
        #[source]
        source: reqwest::Error,
    },
    #[error("API error {code} for {start} .. {end}: {message}")]
    Api {
        start: NaiveDate,
        end: NaiveDate,
        code: String,
        message: String,
    },
}

/// Envelope returned by the availability endpoint.
#[derive(Debug, Deserialize)]
pub struct AvailabilityResponse {
    #[serde(default)]
    pub headers: ResponseHeaders,
    #[serde(default)]
    pub body: Option<ResponseBody>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseHeaders {
    #[serde(default, deserialize_with = "code_as_string")]
    pub response_code: Option<String>,
    #[serde(default)]
    pub response_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseBody {
    #[serde(default)]
    pub details: Option<ResponseDetails>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseDetails {
    #[serde(default)]
    pub daily_details: Option<Vec<DailyAvailability>>,
}

/// One calendar day as reported by the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyAvailability {
    pub date: String,
    /// Missing or null when the API drops the field; never bookable then.
    #[serde(default)]
    pub status: Option<i64>,
    /// Bookable time slots. Their inner shape is not relied upon.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub times: Vec<serde_json::Value>,
}

impl DailyAvailability {
    /// The status code alone is not trusted; a slot must be present as well.
    pub fn is_bookable(&self, available_status: i64) -> bool {
        self.status == Some(available_status) && !self.times.is_empty()
    }
}

impl AvailabilityResponse {
    /// Daily records, or an empty list when the API omitted them.
    pub fn into_daily_details(self) -> Vec<DailyAvailability> {
        self.body
            .and_then(|body| body.details)
            .and_then(|details| details.daily_details)
            .unwrap_or_default()
    }
}

// The API has been seen returning the code both as "0000" and as a number.
fn code_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(code)) => Some(code),
        Some(other) => Some(other.to_string()),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// API client for the facility availability endpoint.
#[derive(Clone, Debug)]
pub struct ParkApiClient {
    client: reqwest::Client,
    url: Url,
    customer_id: u64,
    company_id: u64,
    locale: String,
    success_code: String,
}

impl ParkApiClient {
    /// Create a new API client with configurable timeouts.
    pub fn new(
        facility: &FacilityConfig,
        success_code: &str,
        network_config: &NetworkConfig,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(network_config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(network_config.connect_timeout_secs))
            .user_agent(facility.user_agent.clone())
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        let url = format!(
            "{}/{}",
            facility.api_base_url.trim_end_matches('/'),
            facility.resource_id
        );
        let url = Url::parse(&url).with_context(|| format!("Invalid API URL: {}", url))?;

        Ok(Self {
            client,
            url,
            customer_id: facility.customer_id,
            company_id: facility.company_id,
            locale: facility.locale.clone(),
            success_code: success_code.to_string(),
        })
    }

    /// Endpoint URL for one date window.
    pub fn request_url(&self, start: NaiveDate, end: NaiveDate) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("start_date", &start.format("%Y-%m-%d").to_string())
            .append_pair("end_date", &end.format("%Y-%m-%d").to_string())
            .append_pair("customer_id", &self.customer_id.to_string())
            .append_pair("company_id", &self.company_id.to_string())
            .append_pair("locale", &self.locale);
        url
    }

    /// Fetch the daily availability records for `start ..= end`.
    pub async fn fetch_availability(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyAvailability>, FetchError> {
        tracing::debug!("Fetching availability {} .. {}", start, end);

        let response = self
            .client
            .get(self.request_url(start, end))
            .send()
            .await
            .map_err(|source| FetchError::Request { start, end, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { start, end, status });
        }

        let data = response
            .json::<AvailabilityResponse>()
            .await
            .map_err(|source| FetchError::Decode { start, end, source })?;

        let code = data.headers.response_code.as_deref().unwrap_or_default();
        if code != self.success_code {
            return Err(FetchError::Api {
                start,
                end,
                code: code.to_string(),
                message: data
                    .headers
                    .response_message
                    .clone()
                    .unwrap_or_else(|| "no message".to_string()),
            });
        }

        Ok(data.into_daily_details())
    }
}
