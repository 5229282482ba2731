//! Nager.Date public holiday API.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::HolidayCalendar;
use crate::fetch::{BasicClient, HttpClient, RetryPolicy, build_url, fetch_bytes_with_retry};

pub const DEFAULT_BASE_URL: &str = "https://date.nager.at";

#[derive(Debug, Deserialize)]
struct PublicHoliday {
    date: String,
    name: String,
}

pub struct Nager<C = BasicClient> {
    client: C,
    base_url: String,
    retry: RetryPolicy,
}

impl Nager<BasicClient> {
    pub fn new(retry: RetryPolicy) -> Result<Self> {
        let client = BasicClient::new().context("failed to build HTTP client")?;
        Ok(Self::with_client(client, DEFAULT_BASE_URL, retry))
    }
}

impl<C: HttpClient> Nager<C> {
    pub fn with_client(client: C, base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            retry,
        }
    }
}

#[async_trait]
impl<C: HttpClient> HolidayCalendar for Nager<C> {
    /// Unknown country codes (404) and empty bodies yield no holidays.
    #[instrument(skip(self))]
    async fn public_holidays(&self, country_code: &str, year: i32) -> Result<BTreeMap<String, String>> {
        let path = format!("/api/v3/PublicHolidays/{year}/{country_code}");
        let url = build_url(&self.base_url, &path, &[])?;

        let bytes = match fetch_bytes_with_retry(&self.client, &url, self.retry).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => {
                debug!(country_code, year, "no holiday calendar");
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(e).with_context(|| format!("GET {path} failed")),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }

        let holidays: Vec<PublicHoliday> =
            serde_json::from_slice(&bytes).with_context(|| format!("invalid holidays from {path}"))?;
        Ok(holidays.into_iter().map(|h| (h.date, h.name)).collect())
    }
}
