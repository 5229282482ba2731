//! Traits for the upstream data providers and their HTTP implementations.

pub mod nager;
pub mod open_meteo;
pub mod usgs;

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate};

use crate::observation::{MarinePayload, WeatherPayload};
use crate::risk::air_quality::{AirQualityHistory, CurrentReading};
use crate::risk::seismic::Quake;

/// Inclusive calendar range passed to archive queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `years` whole calendar years ending on Dec 31 of `last_year`.
    pub fn whole_years(last_year: i32, years: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(last_year - years + 1, 1, 1)?,
            end: NaiveDate::from_ymd_opt(last_year, 12, 31)?,
        })
    }

    /// The `days` days up to and including `end`.
    pub fn trailing_days(end: NaiveDate, days: u64) -> Self {
        let start = end.checked_sub_days(Days::new(days)).unwrap_or(end);
        Self { start, end }
    }

    /// Length of the range in (fractional) years, never below one.
    pub fn years_span(&self) -> f64 {
        let days = (self.end - self.start).num_days() as f64 + 1.0;
        (days / 365.25).max(1.0)
    }

    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start.year()..=self.end.year()
    }

    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// Open-Meteo style gridded archives.
#[async_trait]
pub trait ClimateArchive: Send + Sync {
    async fn daily_weather(&self, lat: f64, lon: f64, range: DateRange) -> Result<WeatherPayload>;

    async fn marine(&self, lat: f64, lon: f64, range: DateRange) -> Result<MarinePayload>;

    /// Present-day pollutant reading, `None` when the API has no `current` block.
    async fn air_quality_now(&self, lat: f64, lon: f64) -> Result<Option<CurrentReading>>;

    async fn air_quality_history(
        &self,
        lat: f64,
        lon: f64,
        range: DateRange,
    ) -> Result<AirQualityHistory>;

    /// Daily river discharge (m³/s) over the range.
    async fn river_discharge(&self, lat: f64, lon: f64, range: DateRange) -> Result<Vec<Option<f64>>>;
}

/// Public holiday names keyed by `YYYY-MM-DD`.
#[async_trait]
pub trait HolidayCalendar: Send + Sync {
    async fn public_holidays(&self, country_code: &str, year: i32) -> Result<BTreeMap<String, String>>;
}

#[async_trait]
pub trait SeismicCatalog: Send + Sync {
    /// Events of at least `min_magnitude` within `radius_km` of the point.
    async fn earthquakes(
        &self,
        lat: f64,
        lon: f64,
        radius_km: f64,
        min_magnitude: f64,
        range: DateRange,
    ) -> Result<Vec<Quake>>;
}
