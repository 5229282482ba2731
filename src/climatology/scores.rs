//! Derived comfort and suitability scores for one calendar day.
//!
//! The thresholds here are fixed judgment calls and have no configuration surface.

use serde::{Deserialize, Serialize};

use crate::climatology::stats::{round_to, sample_stddev};
use crate::climatology::types::MarineInfo;

/// Three-step classification shared by pressure volatility and health flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fishing {
    Excellent,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiverFactor {
    #[serde(rename = "Polar Plunge")]
    PolarPlunge,
    #[serde(rename = "Refreshing Tonic")]
    RefreshingTonic,
    #[serde(rename = "Swimming Pool")]
    SwimmingPool,
    #[serde(rename = "Tropical Bath")]
    TropicalBath,
    #[serde(rename = "Hot Soup")]
    HotSoup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveSafety {
    #[serde(rename = "Lake-like")]
    LakeLike,
    #[serde(rename = "Fun Waves")]
    FunWaves,
    #[serde(rename = "Surfers Only")]
    SurfersOnly,
}

const DEFAULT_HUMIDITY: f64 = 70.0;
const DEFAULT_CLOUDS: f64 = 50.0;

/// Aggregated conditions the wedding score is computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeddingInputs {
    pub temp_max: f64,
    pub temp_min: f64,
    pub precip_prob: f64,
    pub wind_kmh: f64,
    pub humidity: Option<f64>,
    pub clouds: Option<f64>,
}

fn temperature_penalty(t: f64) -> f64 {
    match t {
        t if t < 15.0 => 10.0 + (15.0 - t) * 4.0,
        t if t < 20.0 => (20.0 - t) * 2.0,
        t if t > 32.0 => 12.0 + (t - 32.0) * 4.0,
        t if t > 26.0 => (t - 26.0) * 2.0,
        _ => 0.0,
    }
}

/// Rain probability adjustment. Positive values are a bonus.
///
/// | Probability | Adjustment              |
/// |-------------|-------------------------|
/// | < 15        | +5                      |
/// | < 30        | -(p - 15) * 0.3         |
/// | < 50        | -(5 + (p - 30) * 0.5)   |
/// | < 70        | -(15 + (p - 50) * 0.8)  |
/// | >= 70       | -(31 + (p - 70))        |
fn rain_adjustment(p: f64) -> f64 {
    match p {
        p if p < 15.0 => 5.0,
        p if p < 30.0 => -(p - 15.0) * 0.3,
        p if p < 50.0 => -(5.0 + (p - 30.0) * 0.5),
        p if p < 70.0 => -(15.0 + (p - 50.0) * 0.8),
        p => -(31.0 + (p - 70.0)),
    }
}

fn wind_penalty(w: f64) -> f64 {
    match w {
        w if w > 30.0 => 15.0,
        w if w > 20.0 => w - 20.0,
        w if w > 15.0 => (w - 15.0) * 0.5,
        _ => 0.0,
    }
}

fn cloud_penalty(c: f64) -> f64 {
    match c {
        c if c > 80.0 => 5.0,
        c if c > 60.0 => (c - 60.0) * 0.15,
        _ => 0.0,
    }
}

/// Outdoor-event suitability from 0 to 100.
///
/// Ideal daytime highs sit between 20 and 26 °C. Every band outside that range
/// stacks on top of the one before it so the score falls off continuously.
pub fn wedding_score(inputs: &WeddingInputs) -> f64 {
    let humidity = inputs.humidity.unwrap_or(DEFAULT_HUMIDITY);
    let clouds = inputs.clouds.unwrap_or(DEFAULT_CLOUDS);

    let mut score = 100.0;
    score -= temperature_penalty(inputs.temp_max);
    if inputs.temp_min < 10.0 {
        score -= (10.0 - inputs.temp_min) * 1.5;
    }
    score += rain_adjustment(inputs.precip_prob);
    score -= wind_penalty(inputs.wind_kmh);
    if inputs.temp_max > 25.0 && humidity > 75.0 {
        score -= ((humidity - 75.0) * 0.4).min(10.0);
    }
    score -= cloud_penalty(clouds);

    score.round().clamp(0.0, 100.0)
}

/// Inverse-volatility proxy: `100 - 10 * std(temp_max)`, floored at 0.
///
/// A window with fewer than two readings has no measurable spread and scores 100.
pub fn reliability(temp_max_values: &[f64]) -> f64 {
    let spread = sample_stddev(temp_max_values).unwrap_or(0.0);
    (100.0 - spread * 10.0).max(0.0).round()
}

/// | Std dev (hPa) | Volatility |
/// |---------------|------------|
/// | > 8           | High       |
/// | > 4           | Medium     |
/// | otherwise     | Low        |
pub fn pressure_volatility(std_dev: f64) -> Level {
    match std_dev {
        s if s > 8.0 => Level::High,
        s if s > 4.0 => Level::Medium,
        _ => Level::Low,
    }
}

pub fn migraine_risk(volatility: Level) -> Level {
    volatility
}

/// Low pressure combined with damp cold. Falls back to rain probability when
/// humidity was never recorded.
pub fn joint_pain_risk(
    pressure: Option<f64>,
    humidity: Option<f64>,
    precip_prob: f64,
    temp_max: f64,
) -> Level {
    let Some(pressure) = pressure else {
        return Level::Low;
    };
    let (damp, high_cut, medium_cut) = match humidity {
        Some(h) => (h, 80.0, 70.0),
        None => (precip_prob, 40.0, 30.0),
    };

    if pressure < 1010.0 && damp > high_cut && temp_max < 15.0 {
        Level::High
    } else if pressure < 1013.0 && damp > medium_cut {
        Level::Medium
    } else {
        Level::Low
    }
}

pub fn fishing_conditions(volatility: Level, pressure: Option<f64>) -> Fishing {
    if volatility == Level::High {
        Fishing::Excellent
    } else if pressure.is_some_and(|p| p > 1020.0) {
        Fishing::Poor
    } else {
        Fishing::Fair
    }
}

pub fn shiver_factor(water_temp: f64) -> ShiverFactor {
    match water_temp {
        t if t < 17.0 => ShiverFactor::PolarPlunge,
        t if t < 21.0 => ShiverFactor::RefreshingTonic,
        t if t < 25.0 => ShiverFactor::SwimmingPool,
        t if t < 29.0 => ShiverFactor::TropicalBath,
        _ => ShiverFactor::HotSoup,
    }
}

pub fn wave_safety(wave_height: f64) -> WaveSafety {
    match wave_height {
        h if h < 0.5 => WaveSafety::LakeLike,
        h if h < 1.2 => WaveSafety::FunWaves,
        _ => WaveSafety::SurfersOnly,
    }
}

/// Marine comfort block. `None` unless the water reading is plausible.
pub fn marine_comfort(water_temp: f64, wave_height: f64, month: u32) -> Option<MarineInfo> {
    if water_temp <= 0.0 {
        return None;
    }

    Some(MarineInfo {
        water_temp: round_to(water_temp, 1),
        wave_height: round_to(wave_height, 2),
        shiver_factor: shiver_factor(water_temp),
        family_safety: wave_safety(wave_height),
        jellyfish_warning: water_temp > 26.0 && matches!(month, 8 | 9),
    })
}

/// What to pack for a day with these average highs, lows and rain odds.
pub fn clothing(temp_max: f64, temp_min: f64, precip_prob: f64) -> Vec<String> {
    let avg = (temp_max + temp_min) / 2.0;
    let base: &[&str] = if avg < 10.0 {
        &["Heavy Coat", "Scarf", "Gloves"]
    } else if avg < 18.0 {
        &["Light Jacket", "Long Pants"]
    } else {
        &["T-Shirt", "Light Clothing"]
    };

    let mut items: Vec<String> = base.iter().map(|s| (*s).to_string()).collect();
    if precip_prob > 30.0 {
        items.push("Umbrella".into());
    }
    if temp_max - temp_min > 12.0 {
        items.push("Layers (Onion System)".into());
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(t_max: f64, t_min: f64, prob: f64, wind: f64, hum: f64, clouds: f64) -> WeddingInputs {
        WeddingInputs {
            temp_max: t_max,
            temp_min: t_min,
            precip_prob: prob,
            wind_kmh: wind,
            humidity: Some(hum),
            clouds: Some(clouds),
        }
    }

    #[test]
    fn test_wedding_score_ideal_day() {
        let score = wedding_score(&inputs(24.0, 18.0, 10.0, 10.0, 50.0, 30.0));
        assert!(score > 95.0, "got {score}");
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_wedding_score_cold_windy_day() {
        let score = wedding_score(&inputs(8.0, 2.0, 40.0, 25.0, 70.0, 70.0));
        // 100 - 38 (temp) - 12 (evening) - 10 (rain) - 5 (wind) - 1.5 (clouds)
        assert!((33.0..=34.0).contains(&score), "got {score}");
    }

    #[test]
    fn test_wedding_score_is_continuous_at_band_edges() {
        let just_below = wedding_score(&inputs(19.99, 15.0, 10.0, 0.0, 50.0, 0.0));
        let at_edge = wedding_score(&inputs(20.0, 15.0, 10.0, 0.0, 50.0, 0.0));
        assert!((just_below - at_edge).abs() <= 1.0);

        let cool = temperature_penalty(15.0);
        let cold = temperature_penalty(14.999);
        assert!((cool - cold).abs() < 0.01);

        let warm = temperature_penalty(32.0);
        let hot = temperature_penalty(32.001);
        assert!((warm - hot).abs() < 0.01);
    }

    #[test]
    fn test_wedding_score_stays_in_range() {
        let worst = wedding_score(&inputs(45.0, -20.0, 100.0, 80.0, 100.0, 100.0));
        assert_eq!(worst, 0.0);

        for t in (-20..=45).step_by(5) {
            for p in (0..=100).step_by(10) {
                let s = wedding_score(&inputs(t as f64, t as f64 - 8.0, p as f64, 12.0, 60.0, 40.0));
                assert!((0.0..=100.0).contains(&s));
            }
        }
    }

    #[test]
    fn test_wedding_score_defaults_missing_humidity_and_clouds() {
        let mut with_defaults = inputs(30.0, 20.0, 10.0, 5.0, 70.0, 50.0);
        let explicit = wedding_score(&with_defaults);
        with_defaults.humidity = None;
        with_defaults.clouds = None;
        assert_eq!(wedding_score(&with_defaults), explicit);
    }

    #[test]
    fn test_humid_heat_penalty_is_capped() {
        let dry = wedding_score(&inputs(28.0, 20.0, 25.0, 0.0, 70.0, 0.0));
        let sticky = wedding_score(&inputs(28.0, 20.0, 25.0, 0.0, 100.0, 0.0));
        assert_eq!(dry - sticky, 10.0);
    }

    #[test]
    fn test_rain_adjustment_boundaries() {
        assert_eq!(rain_adjustment(0.0), 5.0);
        assert_eq!(rain_adjustment(15.0), 0.0);
        assert_eq!(rain_adjustment(30.0), -5.0);
        assert_eq!(rain_adjustment(50.0), -15.0);
        assert_eq!(rain_adjustment(70.0), -31.0);
        assert_eq!(rain_adjustment(100.0), -61.0);
    }

    #[test]
    fn test_reliability() {
        assert_eq!(reliability(&[]), 100.0);
        assert_eq!(reliability(&[20.0]), 100.0);
        assert_eq!(reliability(&[20.0, 20.0, 20.0]), 100.0);
        assert_eq!(reliability(&[0.0, 40.0]), 0.0);
    }

    #[test]
    fn test_pressure_volatility_boundaries() {
        assert_eq!(pressure_volatility(0.0), Level::Low);
        assert_eq!(pressure_volatility(4.0), Level::Low);
        assert_eq!(pressure_volatility(4.1), Level::Medium);
        assert_eq!(pressure_volatility(8.0), Level::Medium);
        assert_eq!(pressure_volatility(8.1), Level::High);
        assert_eq!(migraine_risk(Level::Medium), Level::Medium);
    }

    #[test]
    fn test_joint_pain_risk() {
        assert_eq!(joint_pain_risk(Some(1005.0), Some(85.0), 0.0, 10.0), Level::High);
        assert_eq!(joint_pain_risk(Some(1005.0), Some(85.0), 0.0, 20.0), Level::Medium);
        assert_eq!(joint_pain_risk(Some(1012.0), Some(75.0), 0.0, 10.0), Level::Medium);
        assert_eq!(joint_pain_risk(Some(1015.0), Some(95.0), 90.0, 5.0), Level::Low);
        assert_eq!(joint_pain_risk(None, Some(95.0), 90.0, 5.0), Level::Low);
    }

    #[test]
    fn test_joint_pain_risk_without_humidity_uses_rain() {
        assert_eq!(joint_pain_risk(Some(1005.0), None, 45.0, 10.0), Level::High);
        assert_eq!(joint_pain_risk(Some(1012.0), None, 35.0, 10.0), Level::Medium);
        assert_eq!(joint_pain_risk(Some(1012.0), None, 25.0, 10.0), Level::Low);
    }

    #[test]
    fn test_fishing_conditions() {
        assert_eq!(fishing_conditions(Level::High, Some(1030.0)), Fishing::Excellent);
        assert_eq!(fishing_conditions(Level::Low, Some(1025.0)), Fishing::Poor);
        assert_eq!(fishing_conditions(Level::Medium, Some(1015.0)), Fishing::Fair);
        assert_eq!(fishing_conditions(Level::Low, None), Fishing::Fair);
    }

    #[test]
    fn test_marine_swimming_pool_lake_like() {
        let marine = marine_comfort(24.5, 0.3, 7).unwrap();
        assert_eq!(marine.shiver_factor, ShiverFactor::SwimmingPool);
        assert_eq!(marine.family_safety, WaveSafety::LakeLike);
        assert!(!marine.jellyfish_warning);
    }

    #[test]
    fn test_marine_bands() {
        assert_eq!(shiver_factor(16.9), ShiverFactor::PolarPlunge);
        assert_eq!(shiver_factor(17.0), ShiverFactor::RefreshingTonic);
        assert_eq!(shiver_factor(25.0), ShiverFactor::TropicalBath);
        assert_eq!(shiver_factor(29.0), ShiverFactor::HotSoup);
        assert_eq!(wave_safety(0.5), WaveSafety::FunWaves);
        assert_eq!(wave_safety(1.2), WaveSafety::SurfersOnly);
    }

    #[test]
    fn test_jellyfish_only_late_summer() {
        assert!(marine_comfort(27.0, 0.2, 8).unwrap().jellyfish_warning);
        assert!(marine_comfort(27.0, 0.2, 9).unwrap().jellyfish_warning);
        assert!(!marine_comfort(27.0, 0.2, 7).unwrap().jellyfish_warning);
        assert!(!marine_comfort(26.0, 0.2, 8).unwrap().jellyfish_warning);
    }

    #[test]
    fn test_marine_rejects_implausible_water() {
        assert!(marine_comfort(0.0, 0.4, 8).is_none());
    }

    #[test]
    fn test_marine_labels_serialize_with_spaces() {
        let marine = marine_comfort(24.5, 0.3, 7).unwrap();
        let json = serde_json::to_value(&marine).unwrap();
        assert_eq!(json["shiver_factor"], "Swimming Pool");
        assert_eq!(json["family_safety"], "Lake-like");
    }

    #[test]
    fn test_clothing() {
        assert_eq!(clothing(5.0, -5.0, 10.0), vec!["Heavy Coat", "Scarf", "Gloves"]);
        assert_eq!(
            clothing(20.0, 10.0, 40.0),
            vec!["Light Jacket", "Long Pants", "Umbrella"]
        );
        assert_eq!(
            clothing(32.0, 18.0, 0.0),
            vec!["T-Shirt", "Light Clothing", "Layers (Onion System)"]
        );
    }
}
