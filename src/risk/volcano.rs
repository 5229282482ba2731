//! Proximity to a curated list of well-known volcanoes.

use serde::{Deserialize, Serialize};

use super::{RiskLevel, haversine_km};
use crate::climatology::stats::round_to;

/// Search radius around a location.
pub const MAX_DISTANCE_KM: f64 = 100.0;

const NEAREST_LIMIT: usize = 3;
const SOURCE: &str = "Smithsonian Global Volcanism Program";

struct Volcano {
    name: &'static str,
    country: &'static str,
    lat: f64,
    lon: f64,
    last_eruption: i32,
}

macro_rules! volcano {
    ($name:expr, $lat:expr, $lon:expr, $country:expr, $year:expr) => {
        Volcano {
            name: $name,
            country: $country,
            lat: $lat,
            lon: $lon,
            last_eruption: $year,
        }
    };
}

static VOLCANOES: &[Volcano] = &[
    volcano!("Mount Fuji", 35.3606, 138.7274, "Japan", 1707),
    volcano!("Mount Vesuvius", 40.8214, 14.4264, "Italy", 1944),
    volcano!("Mount Etna", 37.7510, 14.9934, "Italy", 2024),
    volcano!("Krakatoa", -6.1021, 105.4230, "Indonesia", 2020),
    volcano!("Mount Agung", -8.3429, 115.5068, "Indonesia", 2019),
    volcano!("Mount Merapi", -7.5407, 110.4458, "Indonesia", 2023),
    volcano!("Popocatépetl", 19.0225, -98.6278, "Mexico", 2024),
    volcano!("Mount Rainier", 46.8523, -121.7603, "USA", 1894),
    volcano!("Yellowstone", 44.4280, -110.5885, "USA", -70000),
    volcano!("Mauna Loa", 19.4756, -155.6054, "USA", 2022),
    volcano!("Kilauea", 19.4069, -155.2834, "USA", 2024),
    volcano!("Mount St. Helens", 46.1914, -122.1956, "USA", 2008),
    volcano!("Sakurajima", 31.5858, 130.6572, "Japan", 2024),
    volcano!("Eyjafjallajökull", 63.6314, -19.6083, "Iceland", 2010),
    volcano!("Cotopaxi", -0.6770, -78.4367, "Ecuador", 2015),
    volcano!("Mount Pinatubo", 15.1300, 120.3500, "Philippines", 1993),
    volcano!("Taal Volcano", 14.0021, 120.9937, "Philippines", 2022),
    volcano!("Mayon Volcano", 13.2572, 123.6856, "Philippines", 2023),
    volcano!("Mount Nyiragongo", -1.5200, 29.2500, "DR Congo", 2021),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activity {
    #[serde(rename = "Supervolcano (dormant)")]
    Supervolcano,
    #[serde(rename = "Very Active")]
    VeryActive,
    Active,
    #[serde(rename = "Moderately Active")]
    ModeratelyActive,
    Dormant,
}

/// Eruption years before the common era mark a caldera system.
///
/// | Years since eruption | Activity              |
/// |----------------------|-----------------------|
/// | BCE eruption         | Supervolcano          |
/// | < 10                 | Very Active           |
/// | < 50                 | Active                |
/// | < 200                | Moderately Active     |
/// | otherwise            | Dormant               |
pub fn activity(last_eruption: i32, current_year: i32) -> Activity {
    if last_eruption < 0 {
        return Activity::Supervolcano;
    }
    match current_year - last_eruption {
        y if y < 10 => Activity::VeryActive,
        y if y < 50 => Activity::Active,
        y if y < 200 => Activity::ModeratelyActive,
        _ => Activity::Dormant,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyVolcano {
    pub name: String,
    pub country: String,
    pub distance_km: f64,
    pub last_eruption: i32,
    pub activity_level: Activity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolcanoRisk {
    pub risk_level: RiskLevel,
    pub nearby_volcanoes: Vec<NearbyVolcano>,
    pub count: usize,
    pub source: String,
}

/// Volcanoes within [`MAX_DISTANCE_KM`], nearest first. `None` when there are none.
///
/// Ages are measured against `current_year` so the labels do not go stale.
pub fn assess(lat: f64, lon: f64, current_year: i32) -> Option<VolcanoRisk> {
    let mut nearby: Vec<NearbyVolcano> = VOLCANOES
        .iter()
        .filter_map(|v| {
            let distance = haversine_km(lat, lon, v.lat, v.lon);
            (distance <= MAX_DISTANCE_KM).then(|| NearbyVolcano {
                name: v.name.into(),
                country: v.country.into(),
                distance_km: round_to(distance, 1),
                last_eruption: v.last_eruption,
                activity_level: activity(v.last_eruption, current_year),
            })
        })
        .collect();

    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    let closest = nearby.first()?.distance_km;
    let risk_level = match closest {
        d if d < 30.0 => RiskLevel::VeryHigh,
        d if d < 50.0 => RiskLevel::High,
        _ => RiskLevel::Medium,
    };

    let count = nearby.len();
    nearby.truncate(NEAREST_LIMIT);

    Some(VolcanoRisk {
        risk_level,
        nearby_volcanoes: nearby,
        count,
        source: SOURCE.into(),
    })
}
