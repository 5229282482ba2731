//! On-disk JSON cache of raw upstream payloads, laid out as `<root>/<bucket>/<file>`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// When a cached entry should be refetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// Reused for as long as the file exists.
    Never,
    /// Refetched once the file is older than this.
    MaxAge(Duration),
}

pub const AIR_QUALITY_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// One cached payload kind and its file naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub dir: &'static str,
    pub suffix: &'static str,
    pub staleness: Staleness,
}

impl Bucket {
    pub fn file_name(&self, slug: &str) -> String {
        format!("{slug}_{}.json", self.suffix)
    }
}

pub const WEATHER: Bucket = Bucket {
    dir: "raw_weather",
    suffix: "raw",
    staleness: Staleness::Never,
};

pub const MARINE: Bucket = Bucket {
    dir: "raw_marine",
    suffix: "marine",
    staleness: Staleness::Never,
};

pub const HOLIDAYS: Bucket = Bucket {
    dir: "raw_holidays",
    suffix: "holidays",
    staleness: Staleness::Never,
};

pub const AIR_QUALITY: Bucket = Bucket {
    dir: "air_quality",
    suffix: "monthly_aqi",
    staleness: Staleness::MaxAge(AIR_QUALITY_MAX_AGE),
};

/// Written by the flight downloader; read only.
pub const FLIGHTS_SEASONAL: Bucket = Bucket {
    dir: "raw_flights_seasonal",
    suffix: "seasonal",
    staleness: Staleness::Never,
};

/// Written by the flight downloader; read only.
pub const FLIGHTS_SNAPSHOT: Bucket = Bucket {
    dir: "raw_flights",
    suffix: "flights",
    staleness: Staleness::Never,
};

/// Written by the advisory scraper, keyed by country slug; read only.
pub const HEALTH: Bucket = Bucket {
    dir: "raw_health",
    suffix: "health",
    staleness: Staleness::Never,
};

#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, bucket: Bucket, key: &str) -> PathBuf {
        self.root.join(bucket.dir).join(bucket.file_name(key))
    }

    /// Time since the entry was last written, `None` when it does not exist.
    pub fn age(&self, bucket: Bucket, key: &str) -> Option<Duration> {
        let modified = fs::metadata(self.path(bucket, key)).ok()?.modified().ok()?;
        Some(SystemTime::now().duration_since(modified).unwrap_or_default())
    }

    pub fn is_fresh(&self, bucket: Bucket, key: &str) -> bool {
        match (bucket.staleness, self.age(bucket, key)) {
            (_, None) => false,
            (Staleness::Never, Some(_)) => true,
            (Staleness::MaxAge(max), Some(age)) => age <= max,
        }
    }

    /// Reads a fresh entry. Missing, stale and unreadable entries all yield `None`.
    pub fn load<T: DeserializeOwned>(&self, bucket: Bucket, key: &str) -> Option<T> {
        if !self.is_fresh(bucket, key) {
            return None;
        }
        let path = self.path(bucket, key);
        let parsed = fs::read(&path)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| serde_json::from_slice(&bytes).map_err(anyhow::Error::from));
        match parsed {
            Ok(value) => {
                debug!(path = %path.display(), "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable cache entry");
                None
            }
        }
    }

    pub fn store<T: Serialize>(&self, bucket: Bucket, key: &str, value: &T) -> Result<PathBuf> {
        let path = self.path(bucket, key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_vec(value).context("failed to serialize cache entry")?;
        fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
        debug!(path = %path.display(), "cache stored");
        Ok(path)
    }
}
