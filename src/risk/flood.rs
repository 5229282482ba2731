//! Flood exposure scored from terrain and rainfall extremes.

use serde::{Deserialize, Serialize};

use super::RiskLevel;
use crate::climatology::stats::{mean, round_to};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodRisk {
    pub risk_level: RiskLevel,
    pub risk_score: u32,
    pub risk_factors: Vec<String>,
    pub elevation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_data: Option<RiverDischarge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFloodRisk {
    pub risk_level: RiskLevel,
    pub risk_score: u32,
    pub monthly_precip_avg: f64,
    pub monthly_precip_max: f64,
}

/// Recent river discharge reading near the location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiverDischarge {
    pub risk_level: RiskLevel,
    pub avg_discharge: f64,
    pub max_discharge: f64,
    pub risk_note: String,
    pub source: String,
}

/// Location-level flood score from elevation, coastline and the wettest day on record.
///
/// Points: elevation < 5 m +40, < 20 m +25, < 50 m +10; coastal +20;
/// max daily rain > 100 mm +30, > 50 mm +15.
pub fn assess(elevation: Option<f64>, is_coastal: bool, max_daily_precip: Option<f64>) -> FloodRisk {
    let mut score = 0;
    let mut factors = Vec::new();

    if let Some(e) = elevation {
        if e < 5.0 {
            score += 40;
            factors.push("Very low elevation (<5m)".to_string());
        } else if e < 20.0 {
            score += 25;
            factors.push("Low elevation (<20m)".to_string());
        } else if e < 50.0 {
            score += 10;
            factors.push("Moderate elevation".to_string());
        }
    }

    if is_coastal {
        score += 20;
        factors.push("Coastal location (storm surge risk)".to_string());
    }

    if let Some(max) = max_daily_precip {
        if max > 100.0 {
            score += 30;
            factors.push(format!("Extreme rainfall events ({max:.0}mm/day)"));
        } else if max > 50.0 {
            score += 15;
            factors.push(format!("Heavy rainfall events ({max:.0}mm/day)"));
        }
    }

    let risk_level = match score {
        s if s >= 60 => RiskLevel::High,
        s if s >= 30 => RiskLevel::Medium,
        s if s > 0 => RiskLevel::Low,
        _ => RiskLevel::Minimal,
    };

    FloodRisk {
        risk_level,
        risk_score: score,
        risk_factors: factors,
        elevation,
        api_data: None,
    }
}

/// Flood score for one calendar month.
///
/// `monthly_total` is the month's mean precipitation total across years and
/// `daily_max` the month's wettest single day.
pub fn assess_month(
    elevation: Option<f64>,
    is_coastal: bool,
    monthly_total: f64,
    daily_max: f64,
) -> MonthlyFloodRisk {
    let mut score = 0;

    score += match elevation {
        Some(e) if e < 5.0 => 30,
        Some(e) if e < 20.0 => 20,
        Some(e) if e < 50.0 => 10,
        _ => 0,
    };
    if is_coastal {
        score += 15;
    }
    score += match monthly_total {
        t if t > 200.0 => 40,
        t if t > 150.0 => 30,
        t if t > 100.0 => 20,
        t if t > 50.0 => 10,
        _ => 0,
    };
    score += match daily_max {
        m if m > 100.0 => 15,
        m if m > 50.0 => 10,
        _ => 0,
    };

    let risk_level = match score {
        s if s >= 60 => RiskLevel::High,
        s if s >= 35 => RiskLevel::Medium,
        s if s >= 15 => RiskLevel::Low,
        _ => RiskLevel::Minimal,
    };

    MonthlyFloodRisk {
        risk_level,
        risk_score: score,
        monthly_precip_avg: round_to(monthly_total, 1),
        monthly_precip_max: round_to(daily_max, 1),
    }
}

impl RiverDischarge {
    /// Classifies the peak of a discharge series (m³/s). `None` without readings.
    pub fn from_series(values: &[Option<f64>]) -> Option<Self> {
        let readings: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
        let max = readings.iter().copied().reduce(f64::max)?;

        let (risk_level, note) = match max {
            m if m > 1000.0 => (
                RiskLevel::High,
                "Very high river discharge detected. Flood risk is elevated.",
            ),
            m if m > 500.0 => (
                RiskLevel::Medium,
                "Elevated river discharge. Monitor flood warnings.",
            ),
            m if m > 100.0 => (RiskLevel::Low, "Normal river discharge levels."),
            _ => (RiskLevel::Minimal, "Low river discharge. Minimal flood risk."),
        };

        Some(Self {
            risk_level,
            avg_discharge: round_to(mean(&readings), 1),
            max_discharge: round_to(max, 1),
            risk_note: note.into(),
            source: "Open-Meteo GloFAS".into(),
        })
    }
}
