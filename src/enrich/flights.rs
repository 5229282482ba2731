//! Arrival-traffic pressure from the cached flight downloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::{Cache, FLIGHTS_SEASONAL, FLIGHTS_SNAPSHOT};
use crate::climatology::stats::round_to;
use crate::observation::coerce_f64;

/// Routes listed in the output, busiest first.
const TOP_ROUTES: usize = 5;

/// Crowd pressure from 0 to 100 for a day with `arrivals` arriving flights.
///
/// | Arrivals  | Score                   |
/// |-----------|-------------------------|
/// | > 1000    | 100                     |
/// | > 600     | 80 + (n - 600) / 20     |
/// | > 300     | 60 + (n - 300) / 15     |
/// | > 100     | 40 + (n - 100) / 10     |
/// | > 50      | 20 + (n - 50) / 2.5     |
/// | otherwise | n / 2.5                 |
pub fn pressure_score(arrivals: f64) -> u32 {
    let score = match arrivals {
        n if n > 1000.0 => 100.0,
        n if n > 600.0 => 80.0 + (n - 600.0) / 20.0,
        n if n > 300.0 => 60.0 + (n - 300.0) / 15.0,
        n if n > 100.0 => 40.0 + (n - 100.0) / 10.0,
        n if n > 50.0 => 20.0 + (n - 50.0) / 2.5,
        n => (n / 2.5).max(0.0),
    };
    score.min(100.0).round() as u32
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonalFile {
    #[serde(default)]
    pub icao: Option<String>,
    #[serde(default)]
    pub monthly_arrivals: BTreeMap<String, Value>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub delays: Option<Delays>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(default)]
    pub destination_airport: Airport,
    #[serde(default)]
    pub average_daily_flights: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Airport {
    pub name: Option<String>,
    pub iata: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delays {
    #[serde(default)]
    pub arrivals: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub icao: Option<String>,
    #[serde(default)]
    pub stats: SnapshotStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotStats {
    #[serde(default)]
    pub flight_count: f64,
    #[serde(default)]
    pub peak_hour: Option<Value>,
    #[serde(default)]
    pub morning_flights: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelaySummary {
    /// ISO 8601 duration as reported upstream, e.g. `PT5M`.
    pub median_delay: Option<String>,
    pub cancelled_percent: Option<f64>,
    pub delay_index: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum FlightInfo {
    Seasonal {
        peak_daily_arrivals: u32,
        pressure_score: u32,
        seasonality: BTreeMap<u32, u32>,
        top_routes: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        delays: Option<DelaySummary>,
        icao: Option<String>,
    },
    Snapshot {
        total_daily_arrivals: u32,
        pressure_score: u32,
        peak_hour: Option<Value>,
        morning_share: f64,
        icao: Option<String>,
    },
}

impl FlightInfo {
    pub fn pressure_score(&self) -> u32 {
        match self {
            FlightInfo::Seasonal { pressure_score, .. } | FlightInfo::Snapshot { pressure_score, .. } => {
                *pressure_score
            }
        }
    }

    /// `None` when no month recorded any arrivals.
    pub fn from_seasonal(file: &SeasonalFile) -> Option<Self> {
        let seasonality: BTreeMap<u32, u32> = file
            .monthly_arrivals
            .iter()
            .filter_map(|(month, count)| {
                let month: u32 = month.trim().parse().ok().filter(|m| (1..=12).contains(m))?;
                let count = coerce_f64(count)?;
                Some((month, count.max(0.0).round() as u32))
            })
            .collect();
        let peak = seasonality.values().copied().max().filter(|p| *p > 0)?;

        let mut routes: Vec<&Route> = file.routes.iter().collect();
        routes.sort_by(|a, b| {
            let busy = |r: &Route| r.average_daily_flights.unwrap_or(0.0);
            busy(b).total_cmp(&busy(a))
        });
        let top_routes = routes
            .iter()
            .take(TOP_ROUTES)
            .map(|r| {
                let airport = &r.destination_airport;
                format!(
                    "{} ({})",
                    airport.name.as_deref().unwrap_or("Unknown"),
                    airport.iata.as_deref().unwrap_or("")
                )
            })
            .collect();

        let delays = file.delays.as_ref().filter(|d| !d.arrivals.is_empty()).map(|d| {
            let arrivals = &d.arrivals;
            DelaySummary {
                median_delay: arrivals
                    .get("medianDelay")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                cancelled_percent: arrivals.get("cancelled").and_then(coerce_f64),
                delay_index: arrivals.get("delayIndex").and_then(coerce_f64),
            }
        });

        Some(FlightInfo::Seasonal {
            peak_daily_arrivals: peak,
            pressure_score: pressure_score(f64::from(peak)),
            seasonality,
            top_routes,
            delays,
            icao: file.icao.clone(),
        })
    }

    pub fn from_snapshot(file: &SnapshotFile) -> Self {
        let total = file.stats.flight_count.max(0.0);
        let morning_share = if total > 0.0 {
            round_to(file.stats.morning_flights / total * 100.0, 1)
        } else {
            0.0
        };
        FlightInfo::Snapshot {
            total_daily_arrivals: total.round() as u32,
            pressure_score: pressure_score(total),
            peak_hour: file.stats.peak_hour.clone(),
            morning_share,
            icao: file.icao.clone(),
        }
    }
}

/// Seasonal analytics when they carry traffic, else the single-day snapshot.
pub fn load(cache: &Cache, slug: &str) -> Option<FlightInfo> {
    cache
        .load::<SeasonalFile>(FLIGHTS_SEASONAL, slug)
        .and_then(|file| FlightInfo::from_seasonal(&file))
        .or_else(|| {
            cache
                .load::<SnapshotFile>(FLIGHTS_SNAPSHOT, slug)
                .map(|file| FlightInfo::from_snapshot(&file))
        })
}
