//! Tropical-cyclone exposure from static basin bounding boxes.

use serde::{Deserialize, Serialize};

use super::RiskLevel;
use crate::climatology::stats::round_to;

const SOURCE: &str = "NOAA Historical Climatology";

/// Share of a basin's storms that form inside its season.
const PEAK_SHARE: f64 = 0.9;

struct Basin {
    zone: &'static str,
    storm_type: &'static str,
    lat: (f64, f64),
    lon: (f64, f64),
    season: (u32, u32),
    annual_avg: u32,
}

static BASINS: &[Basin] = &[
    Basin {
        zone: "Atlantic",
        storm_type: "Atlantic Hurricane",
        lat: (5.0, 45.0),
        lon: (-100.0, -10.0),
        season: (6, 11),
        annual_avg: 14,
    },
    Basin {
        zone: "Eastern Pacific",
        storm_type: "Eastern Pacific Hurricane",
        lat: (5.0, 40.0),
        lon: (-180.0, -80.0),
        season: (5, 11),
        annual_avg: 17,
    },
    Basin {
        zone: "Western Pacific",
        storm_type: "Typhoon",
        lat: (5.0, 45.0),
        lon: (100.0, 180.0),
        season: (1, 12),
        annual_avg: 27,
    },
    Basin {
        zone: "Indian Ocean",
        storm_type: "Cyclone",
        lat: (-30.0, 30.0),
        lon: (40.0, 100.0),
        season: (4, 12),
        annual_avg: 12,
    },
];

/// Location-level storm exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HurricaneRisk {
    pub zone: String,
    pub storm_type: String,
    pub season_start: u32,
    pub season_end: u32,
    pub is_year_round: bool,
    pub risk_level: RiskLevel,
    pub annual_avg_storms: u32,
    pub source: String,
}

/// Storm exposure for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyHurricaneRisk {
    pub zone: String,
    pub storm_type: String,
    pub risk_level: RiskLevel,
    pub is_peak_season: bool,
    pub monthly_avg_storms: f64,
    pub season_months: String,
    pub source: String,
}

fn basin_level(annual_avg: u32) -> RiskLevel {
    match annual_avg {
        n if n >= 20 => RiskLevel::VeryHigh,
        n if n >= 15 => RiskLevel::High,
        _ => RiskLevel::Moderate,
    }
}

/// First basin whose box contains the point. Inland locations are never exposed.
pub fn assess(lat: f64, lon: f64, is_coastal: bool) -> Option<HurricaneRisk> {
    if !is_coastal {
        return None;
    }

    let basin = BASINS.iter().find(|b| {
        (b.lat.0..=b.lat.1).contains(&lat) && (b.lon.0..=b.lon.1).contains(&lon)
    })?;

    Some(HurricaneRisk {
        zone: basin.zone.into(),
        storm_type: basin.storm_type.into(),
        season_start: basin.season.0,
        season_end: basin.season.1,
        is_year_round: basin.season == (1, 12),
        risk_level: basin_level(basin.annual_avg),
        annual_avg_storms: basin.annual_avg,
        source: SOURCE.into(),
    })
}

fn in_season(month: u32, start: u32, end: u32) -> bool {
    if start <= end {
        (start..=end).contains(&month)
    } else {
        month >= start || month <= end
    }
}

fn season_length(start: u32, end: u32) -> u32 {
    if start <= end {
        end - start + 1
    } else {
        12 - start + 1 + end
    }
}

impl HurricaneRisk {
    /// Spreads the basin's storms over its season and scales the risk down off-season.
    pub fn for_month(&self, month: u32) -> MonthlyHurricaneRisk {
        let (start, end) = (self.season_start, self.season_end);
        let is_peak_season = in_season(month, start, end);
        let peak_months = season_length(start, end);
        let annual = f64::from(self.annual_avg_storms);

        let (risk_level, monthly_storms) = if is_peak_season {
            (self.risk_level, annual * PEAK_SHARE / f64::from(peak_months))
        } else {
            let off_months = (12 - peak_months).max(1);
            let level = match self.risk_level {
                RiskLevel::VeryHigh => RiskLevel::Medium,
                _ => RiskLevel::Low,
            };
            (level, annual * (1.0 - PEAK_SHARE) / f64::from(off_months))
        };

        MonthlyHurricaneRisk {
            zone: self.zone.clone(),
            storm_type: self.storm_type.clone(),
            risk_level,
            is_peak_season,
            monthly_avg_storms: round_to(monthly_storms, 1),
            season_months: format!("{start}-{end}"),
            source: SOURCE.into(),
        }
    }
}
