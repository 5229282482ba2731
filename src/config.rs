//! Run configuration read from the environment (and `.env`).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Days, NaiveDate, Utc};

use crate::fetch::RetryPolicy;
use crate::sources::DateRange;

/// Years of archive history requested when no start date is configured.
pub const DEFAULT_HISTORY_YEARS: i32 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct EtlConfig {
    pub api_key: Option<String>,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub registry_path: PathBuf,
    pub history: DateRange,
    /// Reference year for holidays and volcano activity.
    pub current_year: i32,
    pub location_delay: Duration,
    pub rain_day_mm: f64,
    /// Outputs younger than this are left alone. `None` always reprocesses.
    pub skip_recent: Option<Duration>,
    pub ledger_path: PathBuf,
    pub retry: RetryPolicy,
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

fn date(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: NaiveDate) -> Result<NaiveDate> {
    match lookup(name).filter(|v| !v.trim().is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .with_context(|| format!("{name} must be YYYY-MM-DD, got {raw:?}")),
        None => Ok(default),
    }
}

impl EtlConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok(), Utc::now().date_naive())
    }

    /// Builds the configuration from any variable source; `today` anchors the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, today: NaiveDate) -> Result<Self> {
        let current_year = parsed(&lookup, "CURRENT_YEAR", today.year())?;

        let default_start = NaiveDate::from_ymd_opt(current_year - DEFAULT_HISTORY_YEARS, 1, 1)
            .context("CURRENT_YEAR is out of range")?;
        let default_end = today.checked_sub_days(Days::new(2)).unwrap_or(today);
        let start = date(&lookup, "HISTORY_START_DATE", default_start)?;
        let end = date(&lookup, "HISTORY_END_DATE", default_end)?;
        if start > end {
            bail!("HISTORY_START_DATE {start} is after HISTORY_END_DATE {end}");
        }

        let rain_day_mm: f64 = parsed(&lookup, "RAIN_DAY_THRESHOLD_MM", 2.5)?;
        if !rain_day_mm.is_finite() || rain_day_mm < 0.0 {
            bail!("RAIN_DAY_THRESHOLD_MM must be a non-negative number");
        }

        let skip_minutes: u64 = parsed(&lookup, "SKIP_RECENT_MINUTES", 0)?;

        Ok(Self {
            api_key: lookup("OPENMETEO_API_KEY").filter(|k| !k.trim().is_empty()),
            data_dir: parsed(&lookup, "CLIMATE_DATA_DIR", PathBuf::from("data"))?,
            output_dir: parsed(&lookup, "CLIMATE_OUTPUT_DIR", PathBuf::from("public/data"))?,
            registry_path: parsed(&lookup, "LOCATION_REGISTRY", PathBuf::from("locations.json"))?,
            history: DateRange::new(start, end),
            current_year,
            location_delay: Duration::from_secs(parsed(&lookup, "LOCATION_DELAY_SECS", 3)?),
            rain_day_mm,
            skip_recent: (skip_minutes > 0).then(|| Duration::from_secs(skip_minutes * 60)),
            ledger_path: parsed(&lookup, "RUN_LEDGER_PATH", PathBuf::from("runs.csv"))?,
            retry: RetryPolicy {
                attempts: parsed(&lookup, "FETCH_ATTEMPTS", 3)?,
                base_delay: Duration::from_secs(parsed(&lookup, "FETCH_BACKOFF_SECS", 2)?),
            },
        })
    }
}
