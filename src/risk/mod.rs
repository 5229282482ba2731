//! Natural-hazard signals attached to a location.
//!
//! Hurricane, volcano and flood assessments are pure lookups over static tables
//! and the location's own weather. Seismic activity, air quality and river
//! discharge come from upstream APIs through [`crate::sources`].

pub mod air_quality;
pub mod flood;
pub mod hurricane;
pub mod seismic;
pub mod volcano;

use serde::{Deserialize, Serialize};

use crate::climatology::stats::round_to;

/// Severity label shared by every hazard signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Minimal,
    Stable,
    Low,
    Moderate,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Elevation above which a location counts as high altitude.
pub const HIGH_ALTITUDE_M: f64 = 1500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SunburnRisk {
    Normal,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltitudeEffects {
    pub uv_multiplier: f64,
    pub alcohol_warning: bool,
    pub sunburn_risk: SunburnRisk,
}

/// Effects of thin air on visitors. `None` at sea level or when elevation is unknown.
pub fn altitude_effects(elevation: Option<f64>) -> Option<AltitudeEffects> {
    let elevation = elevation.filter(|e| *e != 0.0)?;

    let sunburn_risk = match elevation {
        e if e > HIGH_ALTITUDE_M => SunburnRisk::High,
        e if e > 800.0 => SunburnRisk::Medium,
        _ => SunburnRisk::Normal,
    };

    Some(AltitudeEffects {
        uv_multiplier: round_to(1.0 + elevation / 300.0 * 0.04, 2),
        alcohol_warning: elevation > HIGH_ALTITUDE_M,
        sunburn_risk,
    })
}
