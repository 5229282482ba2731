//! USGS FDSN earthquake catalog.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{DateRange, SeismicCatalog};
use crate::fetch::{BasicClient, HttpClient, RetryPolicy, build_url, fetch_json_with_retry};
use crate::risk::seismic::Quake;

pub const DEFAULT_BASE_URL: &str = "https://earthquake.usgs.gov";

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Properties {
    mag: Option<f64>,
    /// Milliseconds since the Unix epoch.
    time: Option<i64>,
}

pub struct Usgs<C = BasicClient> {
    client: C,
    base_url: String,
    retry: RetryPolicy,
}

impl Usgs<BasicClient> {
    pub fn new(retry: RetryPolicy) -> Result<Self> {
        let client = BasicClient::new().context("failed to build HTTP client")?;
        Ok(Self::with_client(client, DEFAULT_BASE_URL, retry))
    }
}

impl<C: HttpClient> Usgs<C> {
    pub fn with_client(client: C, base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            retry,
        }
    }
}

#[async_trait]
impl<C: HttpClient> SeismicCatalog for Usgs<C> {
    #[instrument(skip(self))]
    async fn earthquakes(
        &self,
        lat: f64,
        lon: f64,
        radius_km: f64,
        min_magnitude: f64,
        range: DateRange,
    ) -> Result<Vec<Quake>> {
        let params = [
            ("format", "geojson".to_string()),
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("maxradiuskm", radius_km.to_string()),
            ("minmagnitude", min_magnitude.to_string()),
            ("starttime", range.start_param()),
            ("endtime", range.end_param()),
        ];
        let url = build_url(&self.base_url, "/fdsnws/event/1/query", &params)?;

        let collection: FeatureCollection = fetch_json_with_retry(&self.client, &url, self.retry)
            .await
            .context("USGS event query failed")?;
        debug!(count = collection.features.len(), "earthquakes found");

        Ok(collection
            .features
            .into_iter()
            .filter_map(|f| {
                let time = DateTime::from_timestamp_millis(f.properties.time?)?;
                Some(Quake {
                    magnitude: f.properties.mag,
                    time,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_geojson_to_quakes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fdsnws/event/1/query"))
            .and(query_param("format", "geojson"))
            .and(query_param("maxradiuskm", "100"))
            .and(query_param("minmagnitude", "4"))
            .and(query_param("starttime", "1995-01-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "FeatureCollection",
                "metadata": {"count": 3},
                "features": [
                    {"properties": {"mag": 4.6, "time": 1_300_000_000_000_i64}},
                    {"properties": {"mag": null, "time": 1_400_000_000_000_i64}},
                    {"properties": {"mag": 5.0, "time": null}}
                ]
            })))
            .mount(&server)
            .await;

        let retry = RetryPolicy {
            attempts: 1,
            base_delay: Duration::from_millis(1),
        };
        let usgs = Usgs::with_client(BasicClient::new().unwrap(), server.uri(), retry);
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(1995, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        );

        let quakes = usgs.earthquakes(35.0, 139.0, 100.0, 4.0, range).await.unwrap();

        assert_eq!(quakes.len(), 2);
        assert_eq!(quakes[0].magnitude, Some(4.6));
        assert_eq!(quakes[0].time.date_naive(), NaiveDate::from_ymd_opt(2011, 3, 13).unwrap());
        assert_eq!(quakes[1].magnitude, None);
    }
}
