//! Daily observations decoded from the Open-Meteo archive and marine payloads.
//!
//! Payloads are stored column-wise (`daily.time`, `daily.temperature_2m_max`, ...).
//! They are kept as loose JSON columns so that a null or a stray string in one
//! cell only blanks that cell instead of rejecting the whole history.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::climatology::stats::mean;

pub const TEMP_MAX: &str = "temperature_2m_max";
pub const TEMP_MIN: &str = "temperature_2m_min";
pub const PRECIPITATION: &str = "precipitation_sum";
pub const WIND_SPEED_MAX: &str = "wind_speed_10m_max";
pub const CLOUD_COVER: &str = "cloud_cover_mean";
pub const PRESSURE: &str = "pressure_msl_mean";
pub const HUMIDITY: &str = "relative_humidity_2m_mean";
pub const SUNSHINE: &str = "sunshine_duration";
pub const SNOWFALL: &str = "snowfall_sum";
pub const WEATHER_CODE: &str = "weather_code";

/// Daily variables requested from the archive API.
pub const DAILY_VARIABLES: &[&str] = &[
    TEMP_MAX,
    TEMP_MIN,
    PRECIPITATION,
    SNOWFALL,
    WIND_SPEED_MAX,
    CLOUD_COVER,
    SUNSHINE,
    PRESSURE,
    HUMIDITY,
    WEATHER_CODE,
];

pub const WAVE_HEIGHT: &str = "wave_height_max";
pub const WAVE_PERIOD: &str = "wave_period_max";
pub const WAVE_DIRECTION: &str = "wave_direction_dominant";
pub const SEA_SURFACE_TEMP: &str = "sea_surface_temperature";

/// Daily variables requested from the marine API. Sea-surface temperature is hourly.
pub const MARINE_DAILY_VARIABLES: &[&str] = &[WAVE_HEIGHT, WAVE_DIRECTION, WAVE_PERIOD];

/// One calendar day of weather for a location.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub temp_max: Option<f64>,
    pub temp_min: Option<f64>,
    pub precipitation: Option<f64>,
    pub wind_speed_max: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
    pub sunshine: Option<f64>,
    pub snowfall: Option<f64>,
    pub weather_code: Option<f64>,
    pub wave_height: Option<f64>,
    pub water_temp: Option<f64>,
}

impl DailyObservation {
    /// An observation with every reading missing.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            temp_max: None,
            temp_min: None,
            precipitation: None,
            wind_speed_max: None,
            cloud_cover: None,
            pressure: None,
            humidity: None,
            sunshine: None,
            snowfall: None,
            weather_code: None,
            wave_height: None,
            water_temp: None,
        }
    }

    /// Calendar slot key, e.g. `"03-15"`.
    pub fn day_key(&self) -> String {
        self.date.format("%m-%d").to_string()
    }

    pub fn day_of_year(&self) -> u32 {
        self.date.ordinal()
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }
}

/// Coerces a JSON cell to a finite number. Numeric strings are accepted.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

type Columns = BTreeMap<String, Vec<Value>>;

fn cell(columns: &Columns, name: &str, row: usize) -> Option<f64> {
    columns.get(name).and_then(|c| c.get(row)).and_then(coerce_f64)
}

/// Raw archive response as cached on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherPayload {
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default)]
    pub daily: Columns,
}

impl WeatherPayload {
    /// Decodes the daily columns into observations sorted by date.
    ///
    /// # Errors
    ///
    /// Fails when the `time` column is missing, empty, or holds an unparseable date.
    pub fn observations(&self) -> Result<Vec<DailyObservation>> {
        let times = self
            .daily
            .get("time")
            .context("weather payload has no daily.time column")?;
        if times.is_empty() {
            bail!("weather payload has no daily rows");
        }

        let mut observations = Vec::with_capacity(times.len());
        for (row, time) in times.iter().enumerate() {
            let date = time
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .with_context(|| format!("invalid date {time} at row {row}"))?;

            observations.push(DailyObservation {
                date,
                temp_max: cell(&self.daily, TEMP_MAX, row),
                temp_min: cell(&self.daily, TEMP_MIN, row),
                precipitation: cell(&self.daily, PRECIPITATION, row),
                wind_speed_max: cell(&self.daily, WIND_SPEED_MAX, row),
                cloud_cover: cell(&self.daily, CLOUD_COVER, row),
                pressure: cell(&self.daily, PRESSURE, row),
                humidity: cell(&self.daily, HUMIDITY, row),
                sunshine: cell(&self.daily, SUNSHINE, row),
                snowfall: cell(&self.daily, SNOWFALL, row),
                weather_code: cell(&self.daily, WEATHER_CODE, row),
                wave_height: None,
                water_temp: None,
            });
        }

        observations.sort_by_key(|o| o.date);
        Ok(observations)
    }
}

/// Marine readings reduced to one value per day.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MarineDay {
    pub wave_height: Option<f64>,
    pub water_temp: Option<f64>,
}

/// Raw marine response: daily wave columns plus hourly sea-surface temperature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarinePayload {
    #[serde(default)]
    pub daily: Columns,
    #[serde(default)]
    pub hourly: Columns,
}

impl MarinePayload {
    /// A cached payload without a single wave reading is treated as unusable.
    pub fn has_wave_data(&self) -> bool {
        self.daily
            .get(WAVE_HEIGHT)
            .is_some_and(|c| c.iter().any(|v| coerce_f64(v).is_some()))
    }

    /// Daily wave height and daily mean sea-surface temperature keyed by date.
    pub fn daily_series(&self) -> BTreeMap<NaiveDate, MarineDay> {
        let mut series: BTreeMap<NaiveDate, MarineDay> = BTreeMap::new();

        if let Some(times) = self.daily.get("time") {
            for (row, time) in times.iter().enumerate() {
                let Some(date) = time
                    .as_str()
                    .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                else {
                    continue;
                };
                series.entry(date).or_default().wave_height = cell(&self.daily, WAVE_HEIGHT, row);
            }
        }

        let mut sst: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        if let Some(times) = self.hourly.get("time") {
            for (row, time) in times.iter().enumerate() {
                let Some(date) = time.as_str().and_then(parse_hour).map(|t| t.date()) else {
                    continue;
                };
                if let Some(temp) = cell(&self.hourly, SEA_SURFACE_TEMP, row) {
                    sst.entry(date).or_default().push(temp);
                }
            }
        }
        for (date, temps) in sst {
            series.entry(date).or_default().water_temp = Some(mean(&temps));
        }

        series
    }
}

fn parse_hour(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Left-joins marine readings onto the weather observations by date.
pub fn merge_marine(observations: &mut [DailyObservation], marine: &MarinePayload) {
    let series = marine.daily_series();
    for obs in observations.iter_mut() {
        if let Some(day) = series.get(&obs.date) {
            obs.wave_height = day.wave_height;
            obs.water_temp = day.water_temp;
        }
    }
}
