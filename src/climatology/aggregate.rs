use std::collections::BTreeMap;

use crate::climatology::scores::{
    WeddingInputs, clothing, fishing_conditions, joint_pain_risk, marine_comfort, migraine_risk,
    pressure_volatility, reliability, wedding_score,
};
use crate::climatology::stats::{
    Sample, mean, median, present, round_to, trimmed_mean, weighted_mean, weighted_mode,
    weighted_std,
};
use crate::climatology::types::{
    DayAggregate, DaySafety, DayStats, Event, HealthImpact, HistoricalRecord, PressureStats,
    Scores, YearlyStats,
};
use crate::climatology::weather_code::WeatherCondition;
use crate::climatology::window::select_window;
use crate::observation::DailyObservation;

/// Exact-day records kept for transparency.
pub const HISTORY_LIMIT: usize = 10;

/// Years averaged at each end of the record for the warming trend.
const TREND_YEARS: usize = 5;

/// Location-wide inputs shared by every day of the aggregation.
#[derive(Debug, Clone, Copy)]
pub struct DayContext<'a> {
    /// Daily precipitation above this many millimetres counts as a rain day.
    pub rain_day_mm: f64,
    pub current_year: i32,
    /// Holiday names keyed by `YYYY-MM-DD`.
    pub holidays: &'a BTreeMap<String, String>,
    /// Month-dependent hazard signals keyed 1..=12.
    pub monthly_safety: &'a BTreeMap<u32, DaySafety>,
}

fn samples(
    window: &[&DailyObservation],
    field: impl Fn(&DailyObservation) -> Option<f64>,
) -> Vec<Sample> {
    window.iter().map(|o| Sample::new(o.year(), field(o))).collect()
}

fn values(
    window: &[&DailyObservation],
    field: impl Fn(&DailyObservation) -> Option<f64>,
) -> Vec<f64> {
    present(window.iter().map(|o| field(o)))
}

/// Aggregates the window around one calendar slot.
///
/// `center` is the day-of-year of the slot's earliest observation and `month`
/// the calendar month the slot belongs to.
pub fn aggregate_day(
    observations: &[DailyObservation],
    key: &str,
    center: u32,
    month: u32,
    ctx: &DayContext<'_>,
) -> DayAggregate {
    let window = select_window(observations, center);

    let temp_max = weighted_mean(&samples(&window, |o| o.temp_max)).unwrap_or(0.0);
    let temp_min = weighted_mean(&samples(&window, |o| o.temp_min)).unwrap_or(0.0);

    let rain_days = samples(&window, |o| {
        o.precipitation
            .map(|p| if p > ctx.rain_day_mm { 100.0 } else { 0.0 })
    });
    let precip_prob = weighted_mean(&rain_days).unwrap_or(0.0).clamp(0.0, 100.0);

    let precip_mm = trimmed_mean(&values(&window, |o| o.precipitation)).unwrap_or(0.0);
    let wind_kmh = median(&values(&window, |o| o.wind_speed_max)).unwrap_or(0.0);

    let cloud_values = values(&window, |o| o.cloud_cover);
    let clouds = (!cloud_values.is_empty()).then(|| mean(&cloud_values));
    let snowfall = mean(&values(&window, |o| o.snowfall));
    let sunshine = weighted_mean(&samples(&window, |o| o.sunshine)).unwrap_or(0.0);
    let humidity = weighted_mean(&samples(&window, |o| o.humidity));

    let weather_condition =
        weighted_mode(&samples(&window, |o| o.weather_code)).map(WeatherCondition::from_code);

    let pressure_samples = samples(&window, |o| o.pressure);
    let pressure = weighted_mean(&pressure_samples);
    let pressure_std = weighted_std(&pressure_samples);
    let volatility = pressure_volatility(pressure_std.unwrap_or(0.0));

    let water = weighted_mean(&samples(&window, |o| o.water_temp));
    let waves = weighted_mean(&samples(&window, |o| o.wave_height));
    let marine = match (water, waves) {
        (Some(water), Some(waves)) => marine_comfort(water, waves, month),
        _ => None,
    };

    let wedding = wedding_score(&WeddingInputs {
        temp_max,
        temp_min,
        precip_prob,
        wind_kmh,
        humidity,
        clouds,
    });

    let events = ctx
        .holidays
        .get(&format!("{}-{key}", ctx.current_year))
        .map(|name| vec![Event::holiday(name.as_str())])
        .unwrap_or_default();

    DayAggregate {
        stats: DayStats {
            temp_max: round_to(temp_max, 1),
            temp_min: round_to(temp_min, 1),
            precip_mm: round_to(precip_mm, 1),
            precip_prob: precip_prob.round(),
            wind_kmh: round_to(wind_kmh, 1),
            clouds_percent: clouds.unwrap_or(0.0).round(),
            pressure_hpa: pressure.map(|p| round_to(p, 1)),
            snowfall_cm: round_to(snowfall, 1),
            sunshine_hours: round_to(sunshine / 3600.0, 1),
            humidity_percent: humidity.map(f64::round),
        },
        weather_condition,
        scores: Scores {
            wedding,
            reliability: reliability(&values(&window, |o| o.temp_max)),
        },
        pressure_stats: PressureStats {
            mean_hpa: pressure.map(|p| round_to(p, 1)),
            volatility,
            std_dev: pressure_std.map(|s| round_to(s, 1)),
        },
        health_impact: HealthImpact {
            migraine_risk: migraine_risk(volatility),
            joint_pain_risk: joint_pain_risk(pressure, humidity, precip_prob, temp_max),
            fishing_conditions: fishing_conditions(volatility, pressure),
        },
        safety: ctx.monthly_safety.get(&month).cloned().unwrap_or_default(),
        marine,
        clothing: clothing(temp_max, temp_min, precip_prob),
        events,
        historical_records: historical_records(observations, key),
    }
}

/// The most recent exact-day readings for `key`, newest first.
pub fn historical_records(observations: &[DailyObservation], key: &str) -> Vec<HistoricalRecord> {
    let exact: Vec<&DailyObservation> = observations.iter().filter(|o| o.day_key() == key).collect();
    let skip = exact.len().saturating_sub(HISTORY_LIMIT);

    let mut records: Vec<HistoricalRecord> = exact[skip..]
        .iter()
        .map(|o| HistoricalRecord {
            year: o.year(),
            temp_max: o.temp_max.map(|v| round_to(v, 1)),
            temp_min: o.temp_min.map(|v| round_to(v, 1)),
            precip: o.precipitation.map(|v| round_to(v, 1)),
            snowfall: o.snowfall.map(|v| round_to(v, 1)),
            weather_code: o.weather_code.map(|c| c as i64),
        })
        .collect();

    records.sort_by(|a, b| b.year.cmp(&a.year));
    records
}

/// Aggregates every calendar slot present in the history.
///
/// `observations` must be sorted by date; each slot's window is centered on the
/// day-of-year of its earliest observation.
pub fn aggregate_days(
    observations: &[DailyObservation],
    ctx: &DayContext<'_>,
) -> BTreeMap<String, DayAggregate> {
    let mut slots: BTreeMap<String, (u32, u32)> = BTreeMap::new();
    for obs in observations {
        slots
            .entry(obs.day_key())
            .or_insert_with(|| (obs.day_of_year(), obs.month()));
    }

    slots
        .into_iter()
        .map(|(key, (center, month))| {
            let day = aggregate_day(observations, &key, center, month, ctx);
            (key, day)
        })
        .collect()
}

/// Per-month rainfall used by the monthly flood assessment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyPrecipitation {
    /// Mean of the month's precipitation total across years.
    pub mean_total: f64,
    /// Wettest single day recorded in the month.
    pub daily_max: f64,
}

pub fn monthly_precipitation(observations: &[DailyObservation]) -> BTreeMap<u32, MonthlyPrecipitation> {
    let mut totals: BTreeMap<(u32, i32), f64> = BTreeMap::new();
    let mut maxima: BTreeMap<u32, f64> = BTreeMap::new();

    for obs in observations {
        let Some(p) = obs.precipitation else { continue };
        *totals.entry((obs.month(), obs.year())).or_default() += p;
        let max = maxima.entry(obs.month()).or_insert(p);
        *max = max.max(p);
    }

    let mut per_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for ((month, _), total) in totals {
        per_month.entry(month).or_default().push(total);
    }

    per_month
        .into_iter()
        .map(|(month, yearly)| {
            let stats = MonthlyPrecipitation {
                mean_total: mean(&yearly),
                daily_max: maxima.get(&month).copied().unwrap_or(0.0),
            };
            (month, stats)
        })
        .collect()
}

/// Wettest single day in the whole history.
pub fn max_daily_precip(observations: &[DailyObservation]) -> Option<f64> {
    observations
        .iter()
        .filter_map(|o| o.precipitation)
        .reduce(f64::max)
}

fn month_means(
    observations: &[DailyObservation],
    field: impl Fn(&DailyObservation) -> Option<f64>,
) -> BTreeMap<u32, f64> {
    let mut groups: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for obs in observations {
        if let Some(v) = field(obs) {
            groups.entry(obs.month()).or_default().push(v);
        }
    }
    groups.into_iter().map(|(m, v)| (m, mean(&v))).collect()
}

fn arg_best(map: &BTreeMap<u32, f64>, better: impl Fn(f64, f64) -> bool) -> Option<u32> {
    let mut best: Option<(u32, f64)> = None;
    for (&month, &value) in map {
        match best {
            Some((_, current)) if !better(value, current) => {}
            _ => best = Some((month, value)),
        }
    }
    best.map(|(month, _)| month)
}

/// Annual mean, warming trend and extreme months over the full record.
pub fn yearly_stats(observations: &[DailyObservation]) -> YearlyStats {
    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for obs in observations {
        if let Some(t) = obs.temp_max {
            by_year.entry(obs.year()).or_default().push(t);
        }
    }
    let yearly: Vec<f64> = by_year.values().map(|v| mean(v)).collect();
    let first = &yearly[..yearly.len().min(TREND_YEARS)];
    let last = &yearly[yearly.len().saturating_sub(TREND_YEARS)..];
    let warming_trend = if yearly.is_empty() {
        0.0
    } else {
        round_to(mean(last) - mean(first), 2)
    };

    let mut precip_sums: BTreeMap<u32, f64> = BTreeMap::new();
    for obs in observations {
        if let Some(p) = obs.precipitation {
            *precip_sums.entry(obs.month()).or_default() += p;
        }
    }

    YearlyStats {
        avg_temp_annual: round_to(mean(&values_of(observations, |o| o.temp_max)), 1),
        warming_trend,
        coldest_month: arg_best(&month_means(observations, |o| o.temp_min), |a, b| a < b),
        hottest_month: arg_best(&month_means(observations, |o| o.temp_max), |a, b| a > b),
        wettest_month: arg_best(&precip_sums, |a, b| a > b),
        total_days_analyzed: observations.len(),
    }
}

fn values_of(
    observations: &[DailyObservation],
    field: impl Fn(&DailyObservation) -> Option<f64>,
) -> Vec<f64> {
    present(observations.iter().map(field))
}
