//! Country health advisories scraped ahead of time into `raw_health/`.

use serde_json::Value;

use crate::cache::{Cache, HEALTH};

/// Slug used for a country's advisory page: lowercase, dashes for spaces,
/// dots and apostrophes dropped, plus a few common aliases.
pub fn country_slug(country: &str) -> String {
    let slug: String = country
        .trim()
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| *c != '.' && *c != '\'')
        .collect();

    match slug.as_str() {
        "usa" | "united-states-of-america" => "united-states".to_string(),
        "uk" => "united-kingdom".to_string(),
        "uae" => "united-arab-emirates".to_string(),
        _ => slug,
    }
}

/// The cached advisory for `country`, passed through as-is.
pub fn load(cache: &Cache, country: &str) -> Option<Value> {
    cache.load(HEALTH, &country_slug(country))
}
