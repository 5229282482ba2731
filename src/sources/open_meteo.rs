//! Open-Meteo archive, marine, air-quality and flood APIs.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{ClimateArchive, DateRange};
use crate::fetch::auth::UrlParam;
use crate::fetch::{BasicClient, HttpClient, RetryPolicy, build_url, fetch_json_with_retry};
use crate::observation::{
    DAILY_VARIABLES, MARINE_DAILY_VARIABLES, MarinePayload, SEA_SURFACE_TEMP, WeatherPayload,
    coerce_f64,
};
use crate::risk::air_quality::{AirQualityHistory, CurrentReading};

const AIR_QUALITY_VARIABLES: &str = "pm10,pm2_5,us_aqi";

/// Base URLs for each Open-Meteo product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hosts {
    pub archive: String,
    pub marine: String,
    pub air_quality: String,
    pub flood: String,
}

impl Hosts {
    pub fn public() -> Self {
        Self {
            archive: "https://archive-api.open-meteo.com".into(),
            marine: "https://marine-api.open-meteo.com".into(),
            air_quality: "https://air-quality-api.open-meteo.com".into(),
            flood: "https://flood-api.open-meteo.com".into(),
        }
    }

    /// Commercial hosts, used whenever an API key is configured.
    pub fn customer() -> Self {
        Self {
            archive: "https://customer-archive-api.open-meteo.com".into(),
            marine: "https://customer-marine-api.open-meteo.com".into(),
            air_quality: "https://customer-air-quality-api.open-meteo.com".into(),
            flood: "https://customer-flood-api.open-meteo.com".into(),
        }
    }

    /// Every product served from one base, as a mock server does.
    pub fn single(base: &str) -> Self {
        Self {
            archive: base.into(),
            marine: base.into(),
            air_quality: base.into(),
            flood: base.into(),
        }
    }
}

pub struct OpenMeteo {
    client: Box<dyn HttpClient>,
    hosts: Hosts,
    retry: RetryPolicy,
}

impl OpenMeteo {
    /// Public hosts without a key, customer hosts plus `apikey` with one.
    pub fn new(api_key: Option<String>, retry: RetryPolicy) -> Result<Self> {
        let basic = BasicClient::new().context("failed to build HTTP client")?;
        let (client, hosts): (Box<dyn HttpClient>, Hosts) = match api_key {
            Some(key) => (Box::new(UrlParam::new(basic, "apikey", key)), Hosts::customer()),
            None => (Box::new(basic), Hosts::public()),
        };
        Ok(Self::with_client(client, hosts, retry))
    }

    pub fn with_client(client: Box<dyn HttpClient>, hosts: Hosts, retry: RetryPolicy) -> Self {
        Self {
            client,
            hosts,
            retry,
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        base: &str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = build_url(base, path, params)?;
        debug!(%url, "requesting");
        let value = fetch_json_with_retry(self.client.as_ref(), &url, self.retry)
            .await
            .with_context(|| format!("GET {base}{path} failed"))?;
        Ok(value)
    }
}

fn point(lat: f64, lon: f64) -> Vec<(&'static str, String)> {
    vec![("latitude", lat.to_string()), ("longitude", lon.to_string())]
}

#[derive(Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    current: Option<CurrentReading>,
}

#[derive(Deserialize)]
struct FloodResponse {
    #[serde(default)]
    daily: std::collections::BTreeMap<String, Vec<Value>>,
}

#[async_trait]
impl ClimateArchive for OpenMeteo {
    #[instrument(skip(self))]
    async fn daily_weather(&self, lat: f64, lon: f64, range: DateRange) -> Result<WeatherPayload> {
        let mut params = point(lat, lon);
        params.extend([
            ("start_date", range.start_param()),
            ("end_date", range.end_param()),
            ("daily", DAILY_VARIABLES.join(",")),
            ("timezone", "auto".to_string()),
        ]);
        self.get(&self.hosts.archive, "/v1/archive", &params).await
    }

    #[instrument(skip(self))]
    async fn marine(&self, lat: f64, lon: f64, range: DateRange) -> Result<MarinePayload> {
        let mut params = point(lat, lon);
        params.extend([
            ("start_date", range.start_param()),
            ("end_date", range.end_param()),
            ("daily", MARINE_DAILY_VARIABLES.join(",")),
            ("hourly", SEA_SURFACE_TEMP.to_string()),
        ]);
        self.get(&self.hosts.marine, "/v1/marine", &params).await
    }

    #[instrument(skip(self))]
    async fn air_quality_now(&self, lat: f64, lon: f64) -> Result<Option<CurrentReading>> {
        let mut params = point(lat, lon);
        params.extend([
            ("current", AIR_QUALITY_VARIABLES.to_string()),
            ("timezone", "auto".to_string()),
        ]);
        let resp: CurrentResponse = self
            .get(&self.hosts.air_quality, "/v1/air-quality", &params)
            .await?;
        Ok(resp.current)
    }

    #[instrument(skip(self))]
    async fn air_quality_history(
        &self,
        lat: f64,
        lon: f64,
        range: DateRange,
    ) -> Result<AirQualityHistory> {
        let mut params = point(lat, lon);
        params.extend([
            ("start_date", range.start_param()),
            ("end_date", range.end_param()),
            ("hourly", AIR_QUALITY_VARIABLES.to_string()),
            ("timezone", "auto".to_string()),
        ]);
        self.get(&self.hosts.air_quality, "/v1/air-quality", &params)
            .await
    }

    #[instrument(skip(self))]
    async fn river_discharge(&self, lat: f64, lon: f64, range: DateRange) -> Result<Vec<Option<f64>>> {
        let mut params = point(lat, lon);
        params.extend([
            ("daily", "river_discharge".to_string()),
            ("start_date", range.start_param()),
            ("end_date", range.end_param()),
        ]);
        let resp: FloodResponse = self.get(&self.hosts.flood, "/v1/flood", &params).await?;
        Ok(resp
            .daily
            .get("river_discharge")
            .map(|col| col.iter().map(coerce_f64).collect())
            .unwrap_or_default())
    }
}
