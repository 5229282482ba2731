//! US EPA air-quality index readings and a monthly climatology.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::climatology::stats::{mean, round_to};
use crate::observation::coerce_f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive")]
    UnhealthyForSensitive,
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    Hazardous,
}

/// | AQI       | Category                |
/// |-----------|-------------------------|
/// | <= 50     | Good                    |
/// | <= 100    | Moderate                |
/// | <= 150    | Unhealthy for Sensitive |
/// | <= 200    | Unhealthy               |
/// | <= 300    | Very Unhealthy          |
/// | > 300     | Hazardous               |
pub fn category(aqi: f64) -> AqiCategory {
    match aqi {
        a if a <= 50.0 => AqiCategory::Good,
        a if a <= 100.0 => AqiCategory::Moderate,
        a if a <= 150.0 => AqiCategory::UnhealthyForSensitive,
        a if a <= 200.0 => AqiCategory::Unhealthy,
        a if a <= 300.0 => AqiCategory::VeryUnhealthy,
        _ => AqiCategory::Hazardous,
    }
}

fn current_note(category: AqiCategory) -> &'static str {
    match category {
        AqiCategory::Good => "Air quality is excellent. Perfect for outdoor activities.",
        AqiCategory::Moderate => {
            "Air quality is acceptable. Sensitive individuals should limit prolonged outdoor exertion."
        }
        AqiCategory::UnhealthyForSensitive => {
            "Unhealthy for sensitive groups. Consider wearing a mask outdoors."
        }
        AqiCategory::Unhealthy => "Unhealthy. Everyone should reduce outdoor activities.",
        AqiCategory::VeryUnhealthy => {
            "Very unhealthy. Avoid outdoor activities. Wear N95 mask if you must go out."
        }
        AqiCategory::Hazardous => "Hazardous. Stay indoors. Seal windows and doors.",
    }
}

fn monthly_note(category: AqiCategory) -> &'static str {
    match category {
        AqiCategory::Good => "Air quality is excellent.",
        AqiCategory::Moderate => "Air quality is acceptable.",
        AqiCategory::UnhealthyForSensitive => "Sensitive groups should limit outdoor exertion.",
        AqiCategory::Unhealthy => "Everyone should reduce outdoor activities.",
        AqiCategory::VeryUnhealthy => "Avoid outdoor activities.",
        AqiCategory::Hazardous => "Stay indoors.",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub aqi: i64,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub category: AqiCategory,
    pub health_note: String,
    pub source: String,
}

/// `current` block of the air-quality API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentReading {
    pub us_aqi: Option<f64>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
}

impl AirQuality {
    /// Present-day reading. `None` when the API returned no AQI.
    pub fn from_current(reading: &CurrentReading) -> Option<Self> {
        let aqi = reading.us_aqi.filter(|a| a.is_finite())?;
        let category = category(aqi);
        Some(Self {
            aqi: aqi as i64,
            pm25: reading.pm2_5.map(|v| round_to(v, 1)),
            pm10: reading.pm10.map(|v| round_to(v, 1)),
            category,
            health_note: current_note(category).into(),
            source: "Open-Meteo CAMS".into(),
        })
    }
}

/// Hourly history as returned by the air-quality API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirQualityHistory {
    #[serde(default)]
    pub hourly: BTreeMap<String, Vec<Value>>,
}

fn column<'a>(history: &'a AirQualityHistory, name: &str) -> &'a [Value] {
    history
        .hourly
        .get(name)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Mean AQI per calendar month, keyed 1..=12. Months without readings are absent.
pub fn monthly_climatology(history: &AirQualityHistory) -> BTreeMap<u32, AirQuality> {
    let times = column(history, "time");
    let aqi = column(history, "us_aqi");
    let pm25 = column(history, "pm2_5");
    let pm10 = column(history, "pm10");

    #[derive(Default)]
    struct Bucket {
        aqi: Vec<f64>,
        pm25: Vec<f64>,
        pm10: Vec<f64>,
    }

    let mut buckets: BTreeMap<u32, Bucket> = BTreeMap::new();
    for (row, time) in times.iter().enumerate() {
        let Some(month) = time
            .as_str()
            .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").ok())
            .map(|t| t.month())
        else {
            continue;
        };
        let bucket = buckets.entry(month).or_default();
        let read = |col: &[Value]| col.get(row).and_then(coerce_f64);
        bucket.aqi.extend(read(aqi));
        bucket.pm25.extend(read(pm25));
        bucket.pm10.extend(read(pm10));
    }

    buckets
        .into_iter()
        .filter(|(_, b)| !b.aqi.is_empty())
        .map(|(month, b)| {
            let avg = mean(&b.aqi);
            let category = category(avg);
            let avg_of = |v: &[f64]| (!v.is_empty()).then(|| round_to(mean(v), 1));
            let reading = AirQuality {
                aqi: avg.round() as i64,
                pm25: avg_of(&b.pm25),
                pm10: avg_of(&b.pm10),
                category,
                health_note: monthly_note(category).into(),
                source: "Open-Meteo CAMS (10-year avg)".into(),
            };
            (month, reading)
        })
        .collect()
}
