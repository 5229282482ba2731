//! Serialized shape of one day-of-year aggregate and the yearly summary.

use serde::{Deserialize, Serialize};

use crate::climatology::scores::{Fishing, Level, ShiverFactor, WaveSafety};
use crate::climatology::weather_code::WeatherCondition;
use crate::risk::air_quality::AirQuality;
use crate::risk::flood::MonthlyFloodRisk;
use crate::risk::hurricane::MonthlyHurricaneRisk;

/// Central tendencies for the window around one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayStats {
    pub temp_max: f64,
    pub temp_min: f64,
    pub precip_mm: f64,
    pub precip_prob: f64,
    pub wind_kmh: f64,
    pub clouds_percent: f64,
    pub pressure_hpa: Option<f64>,
    pub snowfall_cm: f64,
    pub sunshine_hours: f64,
    pub humidity_percent: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub wedding: f64,
    pub reliability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureStats {
    pub mean_hpa: Option<f64>,
    pub volatility: Level,
    pub std_dev: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthImpact {
    pub migraine_risk: Level,
    pub joint_pain_risk: Level,
    pub fishing_conditions: Fishing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarineInfo {
    pub water_temp: f64,
    pub wave_height: f64,
    pub shiver_factor: ShiverFactor,
    pub family_safety: WaveSafety,
    pub jellyfish_warning: bool,
}

/// Hazard signals that depend on the calendar month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaySafety {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<AirQuality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hurricane: Option<MonthlyHurricaneRisk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flood: Option<MonthlyFloodRisk>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

impl Event {
    pub fn holiday(name: impl Into<String>) -> Self {
        Self {
            kind: "holiday".into(),
            description: name.into(),
        }
    }
}

/// Raw reading for the exact calendar day in one past year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub year: i32,
    pub temp_max: Option<f64>,
    pub temp_min: Option<f64>,
    pub precip: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snowfall: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_code: Option<i64>,
}

/// Climatological summary for one `MM-DD` slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayAggregate {
    pub stats: DayStats,
    pub weather_condition: Option<WeatherCondition>,
    pub scores: Scores,
    pub pressure_stats: PressureStats,
    pub health_impact: HealthImpact,
    pub safety: DaySafety,
    pub marine: Option<MarineInfo>,
    pub clothing: Vec<String>,
    pub events: Vec<Event>,
    pub historical_records: Vec<HistoricalRecord>,
}

/// Whole-history summary across every observed year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyStats {
    pub avg_temp_annual: f64,
    pub warming_trend: f64,
    pub coldest_month: Option<u32>,
    pub hottest_month: Option<u32>,
    pub wettest_month: Option<u32>,
    pub total_days_analyzed: usize,
}
