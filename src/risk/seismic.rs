//! Earthquake statistics around a location.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::RiskLevel;
use crate::climatology::stats::round_to;

/// Query radius around the location.
pub const RADIUS_KM: f64 = 100.0;

/// Smallest magnitude counted.
pub const MIN_MAGNITUDE: f64 = 4.0;

/// One catalogued earthquake.
#[derive(Debug, Clone, PartialEq)]
pub struct Quake {
    pub magnitude: Option<f64>,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeismicProfile {
    #[serde(rename = "count_30y")]
    pub count: usize,
    pub avg_per_year: f64,
    pub max_magnitude: Option<f64>,
    pub seismic_score: u32,
    pub risk_level: RiskLevel,
    pub last_event: Option<NaiveDate>,
    pub monthly_distribution: BTreeMap<u32, u32>,
}

/// Stability score (higher is calmer) and level from the yearly event rate.
///
/// | Events / year | Score | Level     |
/// |---------------|-------|-----------|
/// | 0             | 100   | Stable    |
/// | < 1           | 80    | Low       |
/// | < 5           | 50    | Medium    |
/// | < 20          | 20    | High      |
/// | otherwise     | 5     | Very High |
pub fn stability(avg_per_year: f64) -> (u32, RiskLevel) {
    match avg_per_year {
        r if r <= 0.0 => (100, RiskLevel::Stable),
        r if r < 1.0 => (80, RiskLevel::Low),
        r if r < 5.0 => (50, RiskLevel::Medium),
        r if r < 20.0 => (20, RiskLevel::High),
        _ => (5, RiskLevel::VeryHigh),
    }
}

/// Summarises the events found over a window `years_span` years long.
pub fn summarize(quakes: &[Quake], years_span: f64) -> SeismicProfile {
    let mut monthly_distribution: BTreeMap<u32, u32> = (1..=12).map(|m| (m, 0)).collect();
    for quake in quakes {
        *monthly_distribution.entry(quake.time.month()).or_default() += 1;
    }

    let count = quakes.len();
    let avg_per_year = if years_span > 0.0 {
        count as f64 / years_span
    } else {
        0.0
    };
    let (seismic_score, risk_level) = stability(avg_per_year);

    let max_magnitude = quakes
        .iter()
        .filter_map(|q| q.magnitude)
        .reduce(f64::max)
        .map(|m| round_to(m, 1));
    let last_event = quakes.iter().map(|q| q.time).max().map(|t| t.date_naive());

    SeismicProfile {
        count,
        avg_per_year: round_to(avg_per_year, 1),
        max_magnitude,
        seismic_score,
        risk_level,
        last_event,
        monthly_distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn quake(mag: f64, y: i32, m: u32, d: u32) -> Quake {
        Quake {
            magnitude: Some(mag),
            time: Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_no_events_is_stable() {
        let profile = summarize(&[], 30.0);
        assert_eq!(profile.count, 0);
        assert_eq!(profile.seismic_score, 100);
        assert_eq!(profile.risk_level, RiskLevel::Stable);
        assert_eq!(profile.max_magnitude, None);
        assert_eq!(profile.last_event, None);
        assert_eq!(profile.monthly_distribution.len(), 12);
        assert!(profile.monthly_distribution.values().all(|c| *c == 0));
    }

    #[test]
    fn test_summary_statistics() {
        let quakes = vec![
            quake(4.2, 1999, 3, 1),
            quake(5.67, 2011, 3, 11),
            quake(4.0, 2020, 7, 4),
        ];
        let profile = summarize(&quakes, 30.0);

        assert_eq!(profile.count, 3);
        assert_eq!(profile.avg_per_year, 0.1);
        assert_eq!(profile.max_magnitude, Some(5.7));
        assert_eq!(profile.risk_level, RiskLevel::Low);
        assert_eq!(profile.seismic_score, 80);
        assert_eq!(profile.last_event, NaiveDate::from_ymd_opt(2020, 7, 4));
        assert_eq!(profile.monthly_distribution[&3], 2);
        assert_eq!(profile.monthly_distribution[&7], 1);
    }

    #[test]
    fn test_stability_bands() {
        assert_eq!(stability(0.0), (100, RiskLevel::Stable));
        assert_eq!(stability(0.9), (80, RiskLevel::Low));
        assert_eq!(stability(1.0), (50, RiskLevel::Medium));
        assert_eq!(stability(5.0), (20, RiskLevel::High));
        assert_eq!(stability(20.0), (5, RiskLevel::VeryHigh));
    }

    #[test]
    fn test_count_serializes_with_legacy_key() {
        let json = serde_json::to_value(summarize(&[], 30.0)).unwrap();
        assert_eq!(json["count_30y"], 0);
        assert_eq!(json["monthly_distribution"]["1"], 0);
    }
}
