//! Location registry: a JSON object of slug → location, edited only through [`LocationRegistry::upsert`].
//!
//! ```json
//! {
//!   "rome-it": { "name": "Rome", "country": "Italy", "lat": 41.9, "lon": 12.5, "is_coastal": false }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

fn default_timezone() -> String {
    "UTC".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub is_coastal: bool,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// ISO 3166-1 alpha-2 code for holiday lookups when the slug suffix is not one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    /// Offshore point for marine queries when the city grid cell is on land.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marine_lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marine_lon: Option<f64>,
}

impl Location {
    /// Coordinates used for marine queries.
    pub fn marine_point(&self) -> (f64, f64) {
        (
            self.marine_lat.unwrap_or(self.lat),
            self.marine_lon.unwrap_or(self.lon),
        )
    }

    /// Explicit country code, else the upper-cased last dash-separated part of the slug.
    pub fn country_code(&self, slug: &str) -> String {
        match &self.country_code {
            Some(code) => code.to_uppercase(),
            None => slug.rsplit('-').next().unwrap_or(slug).to_uppercase(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationRegistry {
    entries: BTreeMap<String, Location>,
}

fn validate_slug(slug: &str) -> Result<()> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-');
    if !valid {
        bail!("invalid slug {slug:?}: use lowercase letters, digits and inner dashes");
    }
    Ok(())
}

impl LocationRegistry {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read registry {}", path.display()))?;
        let registry: Self = serde_json::from_str(&content)
            .with_context(|| format!("invalid registry {}", path.display()))?;
        for slug in registry.entries.keys() {
            validate_slug(slug)?;
        }
        Ok(registry)
    }

    /// Like [`Self::load`], but a missing file is an empty registry.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json + "\n")
            .with_context(|| format!("failed to write registry {}", path.display()))
    }

    pub fn get(&self, slug: &str) -> Option<&Location> {
        self.entries.get(slug)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Location)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Inserts or replaces the entry for `slug`. Re-applying the same entry is a no-op.
    pub fn upsert(&mut self, slug: &str, location: Location) -> Result<UpsertOutcome> {
        validate_slug(slug)?;
        if !(-90.0..=90.0).contains(&location.lat) || !(-180.0..=180.0).contains(&location.lon) {
            bail!("coordinates out of range for {slug}: {}, {}", location.lat, location.lon);
        }

        let outcome = match self.entries.get(slug) {
            Some(existing) if *existing == location => return Ok(UpsertOutcome::Unchanged),
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        };
        self.entries.insert(slug.to_string(), location);
        Ok(outcome)
    }

    /// The requested subset in registry order, or everything when `only` is empty.
    pub fn select(&self, only: &[String]) -> Result<Vec<(&str, &Location)>> {
        if only.is_empty() {
            return Ok(self.iter().collect());
        }
        let unknown: Vec<&str> = only
            .iter()
            .map(String::as_str)
            .filter(|slug| !self.entries.contains_key(*slug))
            .collect();
        if !unknown.is_empty() {
            bail!("unknown location(s): {}", unknown.join(", "));
        }
        Ok(self
            .iter()
            .filter(|(slug, _)| only.iter().any(|o| o == slug))
            .collect())
    }
}
