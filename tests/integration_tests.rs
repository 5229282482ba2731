use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use climate_atlas::config::EtlConfig;
use climate_atlas::observation::{MarinePayload, WeatherPayload};
use climate_atlas::output::{self, RunStatus};
use climate_atlas::pipeline::{Pipeline, RunOptions, RunSummary, Sources};
use climate_atlas::registry::{Location, LocationRegistry};
use climate_atlas::risk::air_quality::{AirQualityHistory, CurrentReading};
use climate_atlas::risk::seismic::Quake;
use climate_atlas::sources::{ClimateArchive, DateRange, HolidayCalendar, SeismicCatalog};
use serde_json::{Value, json};

fn dates(start: &str, end: &str) -> Vec<NaiveDate> {
    let mut day = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    let end = NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap();
    let mut out = Vec::new();
    while day <= end {
        out.push(day);
        day = day.checked_add_days(Days::new(1)).unwrap();
    }
    out
}

fn weather_payload() -> WeatherPayload {
    let days = dates("2022-01-01", "2024-12-31");
    let n = days.len();
    let time: Vec<String> = days.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
    serde_json::from_value(json!({
        "elevation": 45.0,
        "daily": {
            "time": time,
            "temperature_2m_max": vec![24.0; n],
            "temperature_2m_min": vec![15.0; n],
            "precipitation_sum": vec![0.0; n],
            "wind_speed_10m_max": vec![12.0; n],
            "cloud_cover_mean": vec![20.0; n],
            "pressure_msl_mean": vec![1016.0; n],
            "relative_humidity_2m_mean": vec![55.0; n],
            "sunshine_duration": vec![36000.0; n],
            "snowfall_sum": vec![0.0; n],
            "weather_code": vec![1; n]
        }
    }))
    .unwrap()
}

fn marine_payload() -> MarinePayload {
    let days = dates("2022-01-01", "2024-12-31");
    let n = days.len();
    let time: Vec<String> = days.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
    let hours: Vec<String> = days.iter().map(|d| d.format("%Y-%m-%dT12:00").to_string()).collect();
    serde_json::from_value(json!({
        "daily": { "time": time, "wave_height_max": vec![0.6; n] },
        "hourly": { "time": hours, "sea_surface_temperature": vec![21.0; n] }
    }))
    .unwrap()
}

#[derive(Clone, Default)]
struct FakeArchive {
    offline: bool,
    /// Answer the first weather request with a payload that has no daily rows.
    malformed_first: bool,
    weather_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ClimateArchive for FakeArchive {
    async fn daily_weather(&self, _lat: f64, _lon: f64, _range: DateRange) -> Result<WeatherPayload> {
        let previous_calls = self.weather_calls.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(anyhow!("archive offline"));
        }
        if self.malformed_first && previous_calls == 0 {
            return Ok(serde_json::from_value(json!({ "daily": {} }))?);
        }
        Ok(weather_payload())
    }

    async fn marine(&self, _lat: f64, _lon: f64, _range: DateRange) -> Result<MarinePayload> {
        Ok(marine_payload())
    }

    async fn air_quality_now(&self, _lat: f64, _lon: f64) -> Result<Option<CurrentReading>> {
        Ok(Some(CurrentReading {
            us_aqi: Some(42.0),
            pm2_5: Some(8.0),
            pm10: Some(15.0),
        }))
    }

    async fn air_quality_history(&self, _lat: f64, _lon: f64, _range: DateRange) -> Result<AirQualityHistory> {
        Ok(serde_json::from_value(json!({
            "hourly": {
                "time": ["2020-06-01T00:00", "2021-06-01T00:00"],
                "us_aqi": [30, 50]
            }
        }))?)
    }

    async fn river_discharge(&self, _lat: f64, _lon: f64, _range: DateRange) -> Result<Vec<Option<f64>>> {
        Ok(vec![Some(120.0), Some(140.0), None])
    }
}

struct FakeHolidays;

#[async_trait]
impl HolidayCalendar for FakeHolidays {
    async fn public_holidays(&self, _country_code: &str, year: i32) -> Result<BTreeMap<String, String>> {
        Ok(BTreeMap::from([(
            format!("{year}-06-13"),
            "St. Anthony's Day".to_string(),
        )]))
    }
}

struct FakeQuakes {
    offline: bool,
}

#[async_trait]
impl SeismicCatalog for FakeQuakes {
    async fn earthquakes(
        &self,
        _lat: f64,
        _lon: f64,
        _radius_km: f64,
        _min_magnitude: f64,
        _range: DateRange,
    ) -> Result<Vec<Quake>> {
        if self.offline {
            return Err(anyhow!("catalog offline"));
        }
        Ok(Vec::new())
    }
}

fn config(root: &Path, extra: &[(&str, &str)]) -> EtlConfig {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("CLIMATE_DATA_DIR".into(), root.join("data").display().to_string()),
        ("CLIMATE_OUTPUT_DIR".into(), root.join("out").display().to_string()),
        ("RUN_LEDGER_PATH".into(), root.join("runs.csv").display().to_string()),
        ("LOCATION_DELAY_SECS".into(), "0".into()),
        ("CURRENT_YEAR".into(), "2025".into()),
        ("HISTORY_START_DATE".into(), "2022-01-01".into()),
        ("HISTORY_END_DATE".into(), "2024-12-31".into()),
    ]);
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
    EtlConfig::from_lookup(|name| vars.get(name).cloned(), today).unwrap()
}

fn registry() -> LocationRegistry {
    let mut registry = LocationRegistry::default();
    registry
        .upsert(
            "lisbon-pt",
            Location {
                name: "Lisbon".into(),
                country: "Portugal".into(),
                lat: 38.72,
                lon: -9.14,
                is_coastal: true,
                timezone: "Europe/Lisbon".into(),
                country_code: None,
                marine_lat: Some(38.65),
                marine_lon: Some(-9.3),
            },
        )
        .unwrap();
    registry
        .upsert(
            "madrid-es",
            Location {
                name: "Madrid".into(),
                country: "Spain".into(),
                lat: 40.42,
                lon: -3.7,
                is_coastal: false,
                timezone: "Europe/Madrid".into(),
                country_code: None,
                marine_lat: None,
                marine_lon: None,
            },
        )
        .unwrap();
    registry
}

fn pipeline(config: EtlConfig, archive: FakeArchive, quakes_offline: bool) -> Pipeline {
    Pipeline::new(
        config,
        Sources {
            archive: Box::new(archive),
            holidays: Box::new(FakeHolidays),
            seismic: Box::new(FakeQuakes {
                offline: quakes_offline,
            }),
        },
    )
}

fn read_document(root: &Path, slug: &str) -> Value {
    output::load_existing(&root.join("out"), slug).expect("document written")
}

fn only(slugs: &[&str]) -> RunOptions {
    RunOptions {
        only: slugs.iter().map(|s| s.to_string()).collect(),
        ..RunOptions::default()
    }
}

#[tokio::test]
async fn test_full_run_writes_documents_index_and_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(config(dir.path(), &[]), FakeArchive::default(), false);

    let summary = pipeline.run(&registry(), &RunOptions::default()).await.unwrap();
    assert_eq!(
        summary,
        RunSummary {
            processed: 2,
            ..RunSummary::default()
        }
    );

    let lisbon = read_document(dir.path(), "lisbon-pt");
    let days = lisbon["days"].as_object().unwrap();
    assert_eq!(days.len(), 366);
    assert!(days.contains_key("02-29"));

    let june = &lisbon["days"]["06-13"];
    assert_eq!(june["stats"]["temp_max"], 24.0);
    assert_eq!(june["stats"]["precip_prob"], 0.0);
    assert_eq!(june["stats"]["sunshine_hours"], 10.0);
    assert_eq!(june["events"][0]["type"], "holiday");
    assert_eq!(june["events"][0]["description"], "St. Anthony's Day");
    assert!(june["marine"].is_object());
    assert_eq!(june["safety"]["air_quality"]["aqi"], 40);
    assert!(june["historical_records"].as_array().unwrap().len() <= 3);

    assert_eq!(lisbon["meta"]["timezone"], "Europe/Lisbon");
    assert_eq!(lisbon["meta"]["geo_info"]["elevation"], 45.0);
    assert_eq!(lisbon["meta"]["safety_profile"]["air_quality"]["aqi"], 42);
    assert_eq!(lisbon["yearly_stats"]["total_days_analyzed"], 1096);

    let madrid = read_document(dir.path(), "madrid-es");
    assert!(madrid["days"]["06-13"]["marine"].is_null());

    let index: Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("out/index.json")).unwrap()).unwrap();
    assert_eq!(index.as_array().unwrap().len(), 2);

    let ledger = std::fs::read_to_string(dir.path().join("runs.csv")).unwrap();
    assert_eq!(ledger.lines().count(), 3);
    assert!(ledger.contains("lisbon-pt,processed"));

    assert!(dir.path().join("data/raw_weather/lisbon-pt_raw.json").exists());
    assert!(dir.path().join("data/raw_marine/lisbon-pt_marine.json").exists());
    assert!(dir.path().join("data/raw_holidays/lisbon-pt_holidays.json").exists());
    assert!(dir.path().join("data/air_quality/lisbon-pt_monthly_aqi.json").exists());
}

#[tokio::test]
async fn test_cached_weather_is_reused() {
    let dir = tempfile::tempdir().unwrap();
    let archive = FakeArchive::default();
    let calls = archive.weather_calls.clone();
    let pipeline = pipeline(config(dir.path(), &[]), archive, false);
    let options = RunOptions {
        force: true,
        ..only(&["madrid-es"])
    };

    pipeline.run(&registry(), &options).await.unwrap();
    pipeline.run(&registry(), &options).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_malformed_weather_is_not_cached_and_rerun_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let archive = FakeArchive {
        malformed_first: true,
        ..FakeArchive::default()
    };
    let calls = archive.weather_calls.clone();
    let pipeline = pipeline(config(dir.path(), &[]), archive, false);
    let options = RunOptions {
        force: true,
        ..only(&["madrid-es"])
    };
    let cached = dir.path().join("data/raw_weather/madrid-es_raw.json");

    let first = pipeline.run(&registry(), &options).await.unwrap();
    assert_eq!(first.failed, 1);
    assert!(!cached.exists());

    let second = pipeline.run(&registry(), &options).await.unwrap();
    assert_eq!(second.processed, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(cached.exists());
}

#[tokio::test]
async fn test_malformed_cached_weather_is_refetched() {
    let dir = tempfile::tempdir().unwrap();
    let cached = dir.path().join("data/raw_weather/madrid-es_raw.json");
    std::fs::create_dir_all(cached.parent().unwrap()).unwrap();
    std::fs::write(&cached, r#"{"daily": {}}"#).unwrap();

    let archive = FakeArchive::default();
    let calls = archive.weather_calls.clone();
    let pipeline = pipeline(config(dir.path(), &[]), archive, false);

    let summary = pipeline.run(&registry(), &only(&["madrid-es"])).await.unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let repaired: WeatherPayload =
        serde_json::from_slice(&std::fs::read(&cached).unwrap()).unwrap();
    assert!(repaired.observations().is_ok());
}

#[tokio::test]
async fn test_recent_output_is_skipped_unless_forced() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        config(dir.path(), &[("SKIP_RECENT_MINUTES", "60")]),
        FakeArchive::default(),
        false,
    );
    let options = only(&["madrid-es"]);

    pipeline.run(&registry(), &options).await.unwrap();
    let second = pipeline.run(&registry(), &options).await.unwrap();
    assert_eq!(second.skipped, 1);
    assert_eq!(second.processed, 0);

    let forced = RunOptions {
        force: true,
        ..options
    };
    assert_eq!(pipeline.run(&registry(), &forced).await.unwrap().processed, 1);
}

#[tokio::test]
async fn test_unavailable_weather_refreshes_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let previous = json!({
        "meta": {
            "name": "Madrid",
            "last_updated": "2020-01-01T00:00:00Z",
            "geo_info": { "elevation": 1650.0 }
        },
        "yearly_stats": { "total_days_analyzed": 10 },
        "days": { "01-01": { "stats": { "temp_max": 10.0 } } }
    });
    output::write_document(&dir.path().join("out"), "madrid-es", &previous, false).unwrap();

    let archive = FakeArchive {
        offline: true,
        ..FakeArchive::default()
    };
    let pipeline = pipeline(config(dir.path(), &[]), archive, false);

    let summary = pipeline.run(&registry(), &RunOptions::default()).await.unwrap();
    assert_eq!(summary.refreshed, 1);
    assert_eq!(summary.failed, 1);

    let madrid = read_document(dir.path(), "madrid-es");
    assert_eq!(madrid["days"], previous["days"]);
    assert_eq!(madrid["yearly_stats"], previous["yearly_stats"]);
    assert_ne!(madrid["meta"]["last_updated"], "2020-01-01T00:00:00Z");
    assert_eq!(madrid["meta"]["geo_info"]["is_high_altitude"], true);
    assert_eq!(madrid["meta"]["safety_profile"]["air_quality"]["aqi"], 42);

    let ledger = std::fs::read_to_string(dir.path().join("runs.csv")).unwrap();
    assert!(ledger.contains("madrid-es,refreshed"));
    assert!(ledger.contains("lisbon-pt,failed"));
    assert!(!dir.path().join("out/lisbon-pt.json").exists());
}

#[tokio::test]
async fn test_seismic_outage_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(config(dir.path(), &[]), FakeArchive::default(), true);

    let summary = pipeline.run(&registry(), &only(&["madrid-es"])).await.unwrap();
    assert_eq!(summary.processed, 1);

    let madrid = read_document(dir.path(), "madrid-es");
    assert!(madrid["meta"]["safety_profile"]["seismic"].is_null());
}

#[tokio::test]
async fn test_process_location_reports_day_count() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(config(dir.path(), &[]), FakeArchive::default(), false);
    let registry = registry();

    let processed = pipeline
        .process_location("madrid-es", registry.get("madrid-es").unwrap())
        .await
        .unwrap();

    assert_eq!(processed.status, RunStatus::Processed);
    assert_eq!(processed.days, 366);
}

#[tokio::test]
async fn test_unknown_slug_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(config(dir.path(), &[]), FakeArchive::default(), false);

    let err = pipeline.run(&registry(), &only(&["atlantis-xx"])).await.unwrap_err();
    assert!(err.to_string().contains("atlantis-xx"));
}
