//! Per-location ETL: load, aggregate, merge hazards, write. One location at a time.

use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};

use crate::cache::{self, Cache};
use crate::climatology::aggregate::{
    DayContext, aggregate_days, max_daily_precip, monthly_precipitation, yearly_stats,
};
use crate::config::EtlConfig;
use crate::enrich::{self, Terrain, flights, health};
use crate::observation::{DailyObservation, MarinePayload, WeatherPayload, merge_marine};
use crate::output::{self, RunRecord, RunStatus};
use crate::profile::{GeoInfo, LocationDocument, LocationMeta, SafetyProfile};
use crate::registry::{Location, LocationRegistry};
use crate::risk::air_quality::{AirQuality, monthly_climatology};
use crate::risk::flood::{self, RiverDischarge};
use crate::risk::{hurricane, seismic, volcano};
use crate::sources::{ClimateArchive, DateRange, HolidayCalendar, SeismicCatalog};

/// Years of hourly pollution history behind the monthly AQI climatology.
const AIR_QUALITY_YEARS: i32 = 10;

/// Years of holidays fetched when the calendar is not cached.
const HOLIDAY_YEARS_BACK: i32 = 5;

/// Days of river discharge inspected for the flood reading.
const DISCHARGE_DAYS: u64 = 7;

pub struct Sources {
    pub archive: Box<dyn ClimateArchive>,
    pub holidays: Box<dyn HolidayCalendar>,
    pub seismic: Box<dyn SeismicCatalog>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Slugs to process; empty means every registered location.
    pub only: Vec<String>,
    pub gzip: bool,
    /// Ignore the skip-recent window.
    pub force: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub refreshed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    fn count(&mut self, status: RunStatus) {
        match status {
            RunStatus::Processed => self.processed += 1,
            RunStatus::Refreshed => self.refreshed += 1,
            RunStatus::Skipped => self.skipped += 1,
            RunStatus::Failed => self.failed += 1,
        }
    }
}

/// Result of processing one location, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub status: RunStatus,
    pub document: Value,
    pub days: usize,
}

enum WeatherHistory {
    Loaded(WeatherPayload, Vec<DailyObservation>),
    /// The archive could not be reached.
    Unavailable(anyhow::Error),
}

/// Location-level signals shared by the full and the fallback path.
struct Enrichment {
    geo: GeoInfo,
    safety: SafetyProfile,
    hurricane: Option<hurricane::HurricaneRisk>,
    flights: Option<flights::FlightInfo>,
    health: Option<Value>,
}

pub struct Pipeline {
    config: EtlConfig,
    cache: Cache,
    sources: Sources,
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl Pipeline {
    pub fn new(config: EtlConfig, sources: Sources) -> Self {
        let cache = Cache::new(config.data_dir.clone());
        Self {
            config,
            cache,
            sources,
        }
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    /// Cached archive history, fetched on a miss or when the cached entry no
    /// longer decodes. Only payloads that decode are cached.
    ///
    /// A malformed fresh payload is an error; an unreachable archive is
    /// [`WeatherHistory::Unavailable`].
    async fn load_weather(&self, slug: &str, location: &Location) -> Result<WeatherHistory> {
        if let Some(payload) = self.cache.load::<WeatherPayload>(cache::WEATHER, slug) {
            match payload.observations() {
                Ok(observations) => {
                    info!("using cached weather history");
                    return Ok(WeatherHistory::Loaded(payload, observations));
                }
                Err(e) => warn!(error = %e, "cached weather history is malformed, refetching"),
            }
        }

        let payload = match self
            .sources
            .archive
            .daily_weather(location.lat, location.lon, self.config.history)
            .await
        {
            Ok(payload) => payload,
            Err(e) => return Ok(WeatherHistory::Unavailable(e)),
        };
        let observations = payload
            .observations()
            .with_context(|| format!("malformed weather history for {slug}"))?;

        if let Err(e) = self.cache.store(cache::WEATHER, slug, &payload) {
            warn!(error = %e, "could not cache weather history");
        }
        Ok(WeatherHistory::Loaded(payload, observations))
    }

    /// Marine series for coastal locations. Cached payloads without waves are refetched.
    async fn load_marine(&self, slug: &str, location: &Location) -> Option<MarinePayload> {
        if let Some(payload) = self.cache.load::<MarinePayload>(cache::MARINE, slug) {
            if payload.has_wave_data() {
                return Some(payload);
            }
            warn!("cached marine data has no waves, refetching");
        }

        let (lat, lon) = location.marine_point();
        match self.sources.archive.marine(lat, lon, self.config.history).await {
            Ok(payload) => {
                if let Err(e) = self.cache.store(cache::MARINE, slug, &payload) {
                    warn!(error = %e, "could not cache marine data");
                }
                Some(payload)
            }
            Err(e) => {
                warn!(error = %e, "marine data unavailable");
                None
            }
        }
    }

    /// Monthly AQI climatology, refreshed once the cache entry is a month old.
    async fn load_monthly_air_quality(&self, slug: &str, location: &Location) -> BTreeMap<u32, AirQuality> {
        if let Some(monthly) = self.cache.load(cache::AIR_QUALITY, slug) {
            return monthly;
        }
        let Some(range) = DateRange::whole_years(self.config.current_year - 1, AIR_QUALITY_YEARS) else {
            return BTreeMap::new();
        };

        match self
            .sources
            .archive
            .air_quality_history(location.lat, location.lon, range)
            .await
        {
            Ok(history) => {
                let monthly = monthly_climatology(&history);
                if !monthly.is_empty() {
                    if let Err(e) = self.cache.store(cache::AIR_QUALITY, slug, &monthly) {
                        warn!(error = %e, "could not cache monthly air quality");
                    }
                }
                monthly
            }
            Err(e) => {
                warn!(error = %e, "air quality history unavailable");
                BTreeMap::new()
            }
        }
    }

    /// Holiday calendar from the cache, else fetched for the last few years and cached.
    async fn load_holidays(&self, slug: &str, location: &Location) -> BTreeMap<String, String> {
        if let Some(holidays) = self
            .cache
            .load::<BTreeMap<String, String>>(cache::HOLIDAYS, slug)
            .filter(|h| !h.is_empty())
        {
            return holidays;
        }

        let country_code = location.country_code(slug);
        let current = self.config.current_year;
        let mut holidays = BTreeMap::new();
        for year in (current - HOLIDAY_YEARS_BACK)..=current {
            match self.sources.holidays.public_holidays(&country_code, year).await {
                Ok(found) => holidays.extend(found),
                Err(e) => warn!(%country_code, year, error = %e, "could not fetch holidays"),
            }
        }
        debug!(count = holidays.len(), "holidays fetched");

        if !holidays.is_empty() {
            if let Err(e) = self.cache.store(cache::HOLIDAYS, slug, &holidays) {
                warn!(error = %e, "could not cache holidays");
            }
        }
        holidays
    }

    async fn seismic_profile(&self, location: &Location) -> Option<seismic::SeismicProfile> {
        let range = self.config.history;
        match self
            .sources
            .seismic
            .earthquakes(
                location.lat,
                location.lon,
                seismic::RADIUS_KM,
                seismic::MIN_MAGNITUDE,
                range,
            )
            .await
        {
            Ok(quakes) => Some(seismic::summarize(&quakes, range.years_span())),
            Err(e) => {
                warn!(error = %e, "earthquake catalog unavailable");
                None
            }
        }
    }

    async fn current_air_quality(&self, location: &Location) -> Option<AirQuality> {
        match self.sources.archive.air_quality_now(location.lat, location.lon).await {
            Ok(reading) => reading.as_ref().and_then(AirQuality::from_current),
            Err(e) => {
                warn!(error = %e, "current air quality unavailable");
                None
            }
        }
    }

    async fn river_discharge(&self, location: &Location) -> Option<RiverDischarge> {
        let range = DateRange::trailing_days(Utc::now().date_naive(), DISCHARGE_DAYS);
        match self
            .sources
            .archive
            .river_discharge(location.lat, location.lon, range)
            .await
        {
            Ok(series) => RiverDischarge::from_series(&series),
            Err(e) => {
                warn!(error = %e, "river discharge unavailable");
                None
            }
        }
    }

    /// Hazards, geography, flights and health. Every signal is optional.
    async fn enrich(
        &self,
        slug: &str,
        location: &Location,
        elevation: Option<f64>,
        observations: Option<&[DailyObservation]>,
    ) -> Enrichment {
        let seismic = self.seismic_profile(location).await;
        let hurricane = hurricane::assess(location.lat, location.lon, location.is_coastal);
        let volcano = volcano::assess(location.lat, location.lon, self.config.current_year);
        let air_quality = self.current_air_quality(location).await;

        let mut flood = flood::assess(
            elevation,
            location.is_coastal,
            observations.and_then(max_daily_precip),
        );
        flood.api_data = self.river_discharge(location).await;

        if let Some(h) = &hurricane {
            info!(zone = %h.zone, level = ?h.risk_level, "storm basin");
        }
        if let Some(v) = &volcano {
            info!(count = v.count, level = ?v.risk_level, "volcanoes nearby");
        }

        let flights = flights::load(&self.cache, slug);
        let health = health::load(&self.cache, &location.country);
        if health.is_none() {
            debug!(country = %location.country, "no health advisory cached");
        }

        Enrichment {
            geo: GeoInfo::from_elevation(elevation),
            safety: SafetyProfile::new(seismic, hurricane.clone(), volcano, flood, air_quality),
            hurricane,
            flights,
            health,
        }
    }

    /// Builds the document for one location.
    ///
    /// Without weather history the previous document is reused with refreshed
    /// metadata; without either the location fails.
    #[instrument(skip(self, location), fields(name = %location.name))]
    pub async fn process_location(&self, slug: &str, location: &Location) -> Result<Processed> {
        let (payload, mut observations) = match self.load_weather(slug, location).await? {
            WeatherHistory::Loaded(payload, observations) => (payload, observations),
            WeatherHistory::Unavailable(e) => {
                warn!(error = %e, "weather history unavailable, falling back to previous output");
                return self.refresh_existing(slug, location).await;
            }
        };
        info!(days = observations.len(), elevation = ?payload.elevation, "weather history loaded");

        if location.is_coastal {
            if let Some(marine) = self.load_marine(slug, location).await {
                merge_marine(&mut observations, &marine);
            }
        }

        let enrichment = self
            .enrich(slug, location, payload.elevation, Some(&observations))
            .await;

        let monthly_air = self.load_monthly_air_quality(slug, location).await;
        let monthly_safety = enrich::monthly_safety(
            &monthly_air,
            enrichment.hurricane.as_ref(),
            &monthly_precipitation(&observations),
            Terrain {
                elevation: payload.elevation,
                is_coastal: location.is_coastal,
            },
        );
        let holidays = self.load_holidays(slug, location).await;

        let ctx = DayContext {
            rain_day_mm: self.config.rain_day_mm,
            current_year: self.config.current_year,
            holidays: &holidays,
            monthly_safety: &monthly_safety,
        };
        let days = aggregate_days(&observations, &ctx);
        let day_count = days.len();

        let document = LocationDocument {
            meta: LocationMeta {
                name: location.name.clone(),
                country: location.country.clone(),
                lat: location.lat,
                lon: location.lon,
                is_coastal: location.is_coastal,
                timezone: location.timezone.clone(),
                last_updated: timestamp(),
                geo_info: enrichment.geo,
                safety_profile: enrichment.safety,
                flight_info: enrichment.flights,
                health_info: enrichment.health,
            },
            yearly_stats: yearly_stats(&observations),
            days,
        };

        Ok(Processed {
            status: RunStatus::Processed,
            document: serde_json::to_value(&document)?,
            days: day_count,
        })
    }

    /// Reuses the previous document, replacing only its metadata.
    async fn refresh_existing(&self, slug: &str, location: &Location) -> Result<Processed> {
        let Some(mut existing) = output::load_existing(&self.config.output_dir, slug) else {
            bail!("no weather history and no previous output for {slug}");
        };
        if !existing.is_object() {
            bail!("previous output for {slug} is not a JSON object");
        }

        let previous_elevation = existing
            .pointer("/meta/geo_info/elevation")
            .or_else(|| existing.pointer("/meta/elevation"))
            .and_then(Value::as_f64);
        let enrichment = self.enrich(slug, location, previous_elevation, None).await;

        if !existing.get("meta").is_some_and(Value::is_object) {
            existing["meta"] = json!({});
        }
        let meta = &mut existing["meta"];
        meta["safety_profile"] = serde_json::to_value(&enrichment.safety)?;
        meta["geo_info"] = serde_json::to_value(&enrichment.geo)?;
        meta["flight_info"] = serde_json::to_value(&enrichment.flights)?;
        meta["health_info"] = enrichment.health.unwrap_or(Value::Null);
        meta["last_updated"] = Value::String(timestamp());

        let days = existing
            .get("days")
            .and_then(Value::as_object)
            .map_or(0, |d| d.len());
        info!(days, "previous output refreshed");

        Ok(Processed {
            status: RunStatus::Refreshed,
            document: existing,
            days,
        })
    }

    fn is_recent(&self, slug: &str) -> bool {
        match (self.config.skip_recent, output::document_age(&self.config.output_dir, slug)) {
            (Some(window), Some(age)) => age < window,
            _ => false,
        }
    }

    fn record(&self, record: &RunRecord) {
        if let Err(e) = output::append_run_record(&self.config.ledger_path, record) {
            warn!(error = %e, "could not append to run ledger");
        }
    }

    /// Processes the selected locations sequentially. A failing location is
    /// logged and recorded; the run continues with the next one.
    pub async fn run(&self, registry: &LocationRegistry, options: &RunOptions) -> Result<RunSummary> {
        let selected = registry.select(&options.only)?;
        let total = selected.len();
        let mut summary = RunSummary::default();
        info!(
            total,
            start = %self.config.history.start,
            end = %self.config.history.end,
            "starting run"
        );

        for (idx, (slug, location)) in selected.into_iter().enumerate() {
            if !options.force && self.is_recent(slug) {
                info!(slug, "recently updated, skipping");
                summary.count(RunStatus::Skipped);
                self.record(&RunRecord {
                    timestamp: timestamp(),
                    slug: slug.to_string(),
                    status: RunStatus::Skipped,
                    days: 0,
                    duration_ms: 0,
                    error: String::new(),
                });
                continue;
            }

            let started = Instant::now();
            let span = info_span!("location", slug, position = idx + 1, total);
            let result = async {
                let processed = self.process_location(slug, location).await?;
                output::write_document(&self.config.output_dir, slug, &processed.document, options.gzip)?;
                Ok::<_, anyhow::Error>(processed)
            }
            .instrument(span)
            .await;

            let (status, days, error) = match result {
                Ok(processed) => (processed.status, processed.days, String::new()),
                Err(e) => {
                    let message = format!("{e:#}");
                    error!(slug, error = %message, "location failed");
                    (RunStatus::Failed, 0, message)
                }
            };
            summary.count(status);
            self.record(&RunRecord {
                timestamp: timestamp(),
                slug: slug.to_string(),
                status,
                days,
                duration_ms: started.elapsed().as_millis(),
                error,
            });

            if idx + 1 < total && !self.config.location_delay.is_zero() {
                debug!(delay = ?self.config.location_delay, "waiting before next location");
                tokio::time::sleep(self.config.location_delay).await;
            }
        }

        if let Err(e) = output::write_index(&self.config.output_dir, registry.iter()) {
            warn!(error = %e, "could not write location index");
        }

        info!(
            processed = summary.processed,
            refreshed = summary.refreshed,
            skipped = summary.skipped,
            failed = summary.failed,
            "run complete"
        );
        Ok(summary)
    }
}
