//! Output persistence: per-location JSON documents, the location index and the run ledger.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::registry::Location;

pub const INDEX_FILE: &str = "index.json";

pub fn document_path(output_dir: &Path, slug: &str) -> PathBuf {
    output_dir.join(format!("{slug}.json"))
}

/// Writes `<output_dir>/<slug>.json` as pretty JSON, plus a `.json.gz` copy when `gzip` is set.
pub fn write_document<T: Serialize>(output_dir: &Path, slug: &str, document: &T, gzip: bool) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let path = document_path(output_dir, slug);
    let json = serde_json::to_vec_pretty(document).context("failed to serialize document")?;
    fs::write(&path, &json).with_context(|| format!("failed to write {}", path.display()))?;

    if gzip {
        let gz_path = output_dir.join(format!("{slug}.json.gz"));
        let mut encoder = GzEncoder::new(File::create(&gz_path)?, Compression::default());
        encoder.write_all(&json)?;
        encoder.finish()?;
        debug!(path = %gz_path.display(), "gzip copy written");
    }

    info!(path = %path.display(), bytes = json.len(), "document written");
    Ok(path)
}

/// The previously written document, if it exists and parses.
pub fn load_existing(output_dir: &Path, slug: &str) -> Option<Value> {
    let path = document_path(output_dir, slug);
    let content = fs::read(&path).ok()?;
    match serde_json::from_slice(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "existing document is unreadable");
            None
        }
    }
}

/// Time since the document was last written.
pub fn document_age(output_dir: &Path, slug: &str) -> Option<Duration> {
    let modified = fs::metadata(document_path(output_dir, slug)).ok()?.modified().ok()?;
    Some(SystemTime::now().duration_since(modified).unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexEntry {
    pub slug: String,
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub is_coastal: bool,
}

impl IndexEntry {
    pub fn new(slug: &str, location: &Location) -> Self {
        Self {
            slug: slug.to_string(),
            name: location.name.clone(),
            country: location.country.clone(),
            lat: location.lat,
            lon: location.lon,
            is_coastal: location.is_coastal,
        }
    }
}

/// Lists every location that has a document in `output_dir`.
pub fn write_index<'a>(
    output_dir: &Path,
    locations: impl IntoIterator<Item = (&'a str, &'a Location)>,
) -> Result<PathBuf> {
    let entries: Vec<IndexEntry> = locations
        .into_iter()
        .filter(|(slug, _)| document_path(output_dir, slug).exists())
        .map(|(slug, location)| IndexEntry::new(slug, location))
        .collect();

    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(INDEX_FILE);
    fs::write(&path, serde_json::to_vec_pretty(&entries)?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), locations = entries.len(), "index written");
    Ok(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Full recomputation from fresh or cached weather.
    Processed,
    /// Weather unavailable; previous days kept, metadata refreshed.
    Refreshed,
    Skipped,
    Failed,
}

/// One row of the run ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub timestamp: String,
    pub slug: String,
    pub status: RunStatus,
    pub days: usize,
    pub duration_ms: u128,
    pub error: String,
}

/// Appends a [`RunRecord`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_run_record(path: &Path, record: &RunRecord) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "appending run record");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("failed to open ledger {}", path.display()))?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}
