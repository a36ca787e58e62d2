//! Seed series sources consumed once at engine initialization.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::model::price::normalize;

/// Initial series plus the index treated as "now".
#[derive(Debug, Clone, PartialEq)]
pub struct Seed {
    pub prices: Vec<f64>,
    pub present: usize,
}

impl Seed {
    pub fn present_price(&self) -> Option<f64> {
        self.prices.get(self.present).copied()
    }
}

pub trait SeedFeed {
    fn name(&self) -> &str;
    fn load(&self) -> Result<Seed>;
}

const FIXTURE_PAST: [f64; 30] = [
    120.50, 121.30, 122.45, 121.80, 123.20, 124.50, 125.10, 124.80, 126.30, 127.50, 126.90,
    127.80, 129.20, 130.50, 129.80, 131.20, 132.40, 133.60, 132.80, 134.50, 133.90, 135.20,
    136.40, 137.80, 138.50, 139.20, 140.10, 141.30, 142.50, 140.90,
];

const FIXTURE_FUTURE: [f64; 20] = [
    141.30, 142.20, 142.80, 143.50, 142.70, 141.40, 139.60, 137.20, 134.80, 131.50, 127.80,
    124.30, 121.60, 118.90, 115.40, 111.80, 107.50, 103.20, 98.70, 94.30,
];

const FALLBACK_PAST: [f64; 10] = [
    100.0, 102.0, 103.0, 105.0, 104.0, 106.0, 107.0, 108.0, 110.0, 109.0,
];

const FALLBACK_FUTURE: [f64; 10] = [111.0, 113.0, 110.0, 107.0, 104.0, 100.0, 95.0, 90.0, 85.0, 80.0];

/// Built-in past/future fixture.
#[derive(Debug, Clone)]
pub struct StaticFeed {
    past: Vec<f64>,
    future: Vec<f64>,
}

impl Default for StaticFeed {
    fn default() -> Self {
        Self::new(FIXTURE_PAST.to_vec(), FIXTURE_FUTURE.to_vec())
    }
}

impl StaticFeed {
    pub fn new(past: Vec<f64>, future: Vec<f64>) -> Self {
        Self { past, future }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_PAST.to_vec(), FALLBACK_FUTURE.to_vec())
    }
}

impl SeedFeed for StaticFeed {
    fn name(&self) -> &str {
        "static"
    }

    fn load(&self) -> Result<Seed> {
        if self.past.is_empty() {
            bail!("static feed has no past points");
        }
        let prices = self
            .past
            .iter()
            .chain(self.future.iter())
            .map(|p| normalize(*p))
            .collect();
        Ok(Seed {
            prices,
            present: self.past.len() - 1,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

impl RawPrice {
    fn value(&self) -> Result<f64> {
        match self {
            RawPrice::Number(v) => Ok(*v),
            RawPrice::Text(s) => s
                .trim()
                .parse::<f64>()
                .with_context(|| format!("invalid price '{}'", s)),
        }
    }
}

/// Parse a feed snapshot: a JSON array of prices, numbers or numeric strings.
///
/// The first half is history and the second half the scripted future, so the
/// present sits on the last point of the first half.
pub fn parse_price_array(json: &str) -> Result<Seed> {
    let raw: Vec<RawPrice> =
        serde_json::from_str(json).context("feed payload is not a JSON array")?;
    if raw.is_empty() {
        bail!("feed payload contains no prices");
    }
    let mut prices = Vec::with_capacity(raw.len());
    for (i, r) in raw.iter().enumerate() {
        let v = r.value().with_context(|| format!("price #{}", i))?;
        if !v.is_finite() || v < 0.0 {
            bail!("price #{} is out of range: {}", i, v);
        }
        prices.push(normalize(v));
    }
    let present = (prices.len() / 2).saturating_sub(1);
    Ok(Seed { prices, present })
}

/// Snapshot of the price feed saved to disk.
#[derive(Debug, Clone)]
pub struct JsonFileFeed {
    path: PathBuf,
}

impl JsonFileFeed {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SeedFeed for JsonFileFeed {
    fn name(&self) -> &str {
        "json"
    }

    fn load(&self) -> Result<Seed> {
        let body = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        parse_price_array(&body)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }
}

/// Load from `feed`, falling back to the short built-in fixture on failure.
pub fn load_or_fallback(feed: &dyn SeedFeed) -> Seed {
    match feed.load() {
        Ok(seed) => {
            tracing::info!(
                feed = feed.name(),
                points = seed.prices.len(),
                present = seed.present,
                "Seed loaded"
            );
            seed
        }
        Err(e) => {
            tracing::warn!(
                feed = feed.name(),
                error = %format!("{:#}", e),
                "Seed feed failed, using fallback fixture"
            );
            // the fallback fixture is non-empty, so load cannot fail
            StaticFeed::fallback().load().unwrap_or(Seed {
                prices: FALLBACK_PAST.to_vec(),
                present: FALLBACK_PAST.len() - 1,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_fixture_places_present_at_end_of_history() {
        let seed = StaticFeed::default().load().unwrap();
        assert_eq!(seed.prices.len(), 50);
        assert_eq!(seed.present, 29);
        assert_eq!(seed.present_price(), Some(140.90));
    }

    #[test]
    fn price_array_accepts_numbers_and_strings() {
        let seed = parse_price_array(r#"[65000.12, "65001.5", 65002]"#).unwrap();
        assert_eq!(seed.prices, vec![65000.12, 65001.5, 65002.0]);
        assert_eq!(seed.present, 0);
    }

    #[test]
    fn price_array_splits_at_midpoint() {
        let seed = parse_price_array("[1, 2, 3, 4, 5, 6]").unwrap();
        assert_eq!(seed.present, 2);
    }

    #[test]
    fn price_array_rejects_garbage() {
        assert!(parse_price_array("[]").is_err());
        assert!(parse_price_array(r#"["abc"]"#).is_err());
        assert!(parse_price_array("[-1.0]").is_err());
        assert!(parse_price_array(r#"{"c": 1}"#).is_err());
    }

    #[test]
    fn missing_file_falls_back() {
        let feed = JsonFileFeed::new("/nonexistent/price-sync-seed.json");
        assert!(feed.load().is_err());
        let seed = load_or_fallback(&feed);
        assert_eq!(seed.prices.len(), 20);
        assert_eq!(seed.present, 9);
    }
}
