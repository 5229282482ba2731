//! WMO weather interpretation codes.

use serde::{Deserialize, Serialize};

/// Human-readable rendering of a WMO weather code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub code: i64,
    pub description: String,
    pub icon: String,
    pub severity: String,
}

static CODES: &[(i64, &str, &str, &str)] = &[
    (0, "Clear sky", "sun", "clear"),
    (1, "Mainly clear", "sun-cloud", "clear"),
    (2, "Partly cloudy", "cloud-sun", "cloudy"),
    (3, "Overcast", "cloud", "cloudy"),
    (45, "Fog", "fog", "fog"),
    (48, "Depositing rime fog", "fog", "fog"),
    (51, "Light drizzle", "drizzle", "rain"),
    (53, "Moderate drizzle", "drizzle", "rain"),
    (55, "Dense drizzle", "drizzle", "rain"),
    (56, "Light freezing drizzle", "sleet", "freezing"),
    (57, "Dense freezing drizzle", "sleet", "freezing"),
    (61, "Slight rain", "rain", "rain"),
    (63, "Moderate rain", "rain", "rain"),
    (65, "Heavy rain", "rain-heavy", "rain"),
    (66, "Light freezing rain", "sleet", "freezing"),
    (67, "Heavy freezing rain", "sleet", "freezing"),
    (71, "Slight snow", "snow", "snow"),
    (73, "Moderate snow", "snow", "snow"),
    (75, "Heavy snow", "snow-heavy", "snow"),
    (77, "Snow grains", "snow", "snow"),
    (80, "Slight rain showers", "rain-showers", "rain"),
    (81, "Moderate rain showers", "rain-showers", "rain"),
    (82, "Violent rain showers", "rain-heavy", "rain"),
    (85, "Slight snow showers", "snow-showers", "snow"),
    (86, "Heavy snow showers", "snow-heavy", "snow"),
    (95, "Thunderstorm", "thunderstorm", "storm"),
    (96, "Thunderstorm with slight hail", "thunderstorm-hail", "storm"),
    (99, "Thunderstorm with heavy hail", "thunderstorm-hail", "storm"),
];

impl WeatherCondition {
    /// Looks up a WMO code. Codes outside the table render as `Unknown (<code>)`.
    pub fn from_code(code: i64) -> Self {
        match CODES.iter().find(|(c, ..)| *c == code) {
            Some((_, description, icon, severity)) => Self {
                code,
                description: (*description).into(),
                icon: (*icon).into(),
                severity: (*severity).into(),
            },
            None => Self {
                code,
                description: format!("Unknown ({code})"),
                icon: "question".into(),
                severity: "unknown".into(),
            },
        }
    }
}
