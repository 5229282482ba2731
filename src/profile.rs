//! The per-location document written for the front end.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::climatology::types::{DayAggregate, YearlyStats};
use crate::enrich::flights::FlightInfo;
use crate::risk::air_quality::AirQuality;
use crate::risk::flood::FloodRisk;
use crate::risk::hurricane::HurricaneRisk;
use crate::risk::seismic::SeismicProfile;
use crate::risk::volcano::VolcanoRisk;
use crate::risk::{AltitudeEffects, HIGH_ALTITUDE_M, RiskLevel, altitude_effects};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoInfo {
    pub elevation: Option<f64>,
    pub is_high_altitude: bool,
    pub altitude_effects: Option<AltitudeEffects>,
}

impl GeoInfo {
    pub fn from_elevation(elevation: Option<f64>) -> Self {
        Self {
            elevation,
            is_high_altitude: elevation.is_some_and(|e| e > HIGH_ALTITUDE_M),
            altitude_effects: altitude_effects(elevation),
        }
    }
}

/// Location-level hazards. Absent signals serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyProfile {
    pub seismic: Option<SeismicProfile>,
    pub hurricane: Option<HurricaneRisk>,
    pub volcano: Option<VolcanoRisk>,
    pub flood: Option<FloodRisk>,
    pub air_quality: Option<AirQuality>,
}

impl SafetyProfile {
    /// A `Minimal` flood score is not worth showing.
    pub fn new(
        seismic: Option<SeismicProfile>,
        hurricane: Option<HurricaneRisk>,
        volcano: Option<VolcanoRisk>,
        flood: FloodRisk,
        air_quality: Option<AirQuality>,
    ) -> Self {
        Self {
            seismic,
            hurricane,
            volcano,
            flood: (flood.risk_level != RiskLevel::Minimal).then_some(flood),
            air_quality,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationMeta {
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub is_coastal: bool,
    pub timezone: String,
    /// RFC 3339 timestamp of the run that produced this document.
    pub last_updated: String,
    pub geo_info: GeoInfo,
    pub safety_profile: SafetyProfile,
    pub flight_info: Option<FlightInfo>,
    pub health_info: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationDocument {
    pub meta: LocationMeta,
    pub yearly_stats: YearlyStats,
    pub days: BTreeMap<String, DayAggregate>,
}
