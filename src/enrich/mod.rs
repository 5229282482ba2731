//! Lower-frequency signals merged into a location's document.

pub mod flights;
pub mod health;

use std::collections::BTreeMap;

use crate::climatology::aggregate::MonthlyPrecipitation;
use crate::climatology::types::DaySafety;
use crate::risk::air_quality::AirQuality;
use crate::risk::flood;
use crate::risk::hurricane::HurricaneRisk;

/// Site facts the monthly flood score depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Terrain {
    pub elevation: Option<f64>,
    pub is_coastal: bool,
}

/// Month-dependent hazards keyed 1..=12, broadcast to every day of that month.
pub fn monthly_safety(
    air_quality: &BTreeMap<u32, AirQuality>,
    hurricane: Option<&HurricaneRisk>,
    precipitation: &BTreeMap<u32, MonthlyPrecipitation>,
    terrain: Terrain,
) -> BTreeMap<u32, DaySafety> {
    (1..=12)
        .map(|month| {
            let safety = DaySafety {
                air_quality: air_quality.get(&month).cloned(),
                hurricane: hurricane.map(|h| h.for_month(month)),
                flood: precipitation.get(&month).map(|p| {
                    flood::assess_month(terrain.elevation, terrain.is_coastal, p.mean_total, p.daily_max)
                }),
            };
            (month, safety)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskLevel;
    use crate::risk::air_quality::CurrentReading;
    use crate::risk::hurricane;

    #[test]
    fn test_monthly_safety_for_gulf_coast() {
        let houston = hurricane::assess(29.76, -95.37, true).unwrap();
        let aqi = AirQuality::from_current(&CurrentReading {
            us_aqi: Some(40.0),
            pm2_5: None,
            pm10: None,
        })
        .unwrap();
        let air = BTreeMap::from([(7, aqi)]);
        let precipitation = BTreeMap::from([(
            6,
            MonthlyPrecipitation {
                mean_total: 160.0,
                daily_max: 120.0,
            },
        )]);
        let terrain = Terrain {
            elevation: Some(15.0),
            is_coastal: true,
        };

        let months = monthly_safety(&air, Some(&houston), &precipitation, terrain);

        assert_eq!(months.len(), 12);
        assert!(months[&7].air_quality.is_some());
        assert!(months[&6].air_quality.is_none());
        assert!(months[&9].hurricane.as_ref().unwrap().is_peak_season);
        assert!(!months[&2].hurricane.as_ref().unwrap().is_peak_season);
        // 20 (elevation) + 15 (coast) + 30 (monthly total) + 15 (daily max)
        let june_flood = months[&6].flood.as_ref().unwrap();
        assert_eq!(june_flood.risk_score, 80);
        assert_eq!(june_flood.risk_level, RiskLevel::High);
        assert!(months[&1].flood.is_none());
    }

    #[test]
    fn test_inland_location_has_no_storm_season() {
        let months = monthly_safety(
            &BTreeMap::new(),
            None,
            &BTreeMap::new(),
            Terrain {
                elevation: None,
                is_coastal: false,
            },
        );
        assert!(months.values().all(|s| *s == DaySafety::default()));
    }
}
