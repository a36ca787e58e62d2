use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::alert::AlertConfig;
use crate::desk::DeskConfig;
use crate::engine::EngineSettings;
use crate::error::{SyncError, SyncResult};
use crate::feed::{JsonFileFeed, SeedFeed, StaticFeed};
use crate::series::store::DEFAULT_REFILL_BATCH;
use crate::series::GeneratorPolicy;
use crate::window::WindowSpec;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const SEED_FILE_ENV: &str = "PRICE_SYNC_SEED_FILE";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowSpec,
    pub generator: GeneratorPolicy,
    pub engine: EngineConfig,
    pub feed: FeedConfig,
    pub desk: DeskConfig,
    pub alert: AlertConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tick_interval: String,
    pub lookahead_buffer: usize,
    pub refill_batch: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: "1s".to_string(),
            lookahead_buffer: crate::engine::sync::DEFAULT_LOOKAHEAD_BUFFER,
            refill_batch: DEFAULT_REFILL_BATCH,
        }
    }
}

impl EngineConfig {
    pub fn tick_period(&self) -> Result<Duration> {
        parse_interval_ms(&self.tick_interval).map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    #[default]
    Static,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub source: FeedSource,
    pub path: Option<String>,
}

impl FeedConfig {
    pub fn build(&self) -> Result<Box<dyn SeedFeed>> {
        match self.source {
            FeedSource::Static => Ok(Box::new(StaticFeed::default())),
            FeedSource::Json => {
                let Some(path) = self.path.as_deref() else {
                    bail!("feed.path is required when feed.source = \"json\"");
                };
                Ok(Box::new(JsonFileFeed::new(path)))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub title: String,
    pub refresh_rate_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "Price Sync".to_string(),
            refresh_rate_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: "price-sync.log".to_string(),
        }
    }
}

/// Parse an interval string such as "500ms", "1s" or "2m" into milliseconds.
pub fn parse_interval_ms(s: &str) -> Result<u64> {
    let s = s.trim();
    let (num_str, unit_ms) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60_000)
    } else {
        bail!(
            "invalid interval '{}': expected a ms/s/m suffix, e.g. '1s'",
            s
        );
    };
    let n: u64 = num_str.parse().with_context(|| {
        format!(
            "invalid interval '{}': quantity must be a positive integer",
            s
        )
    })?;
    if n == 0 {
        bail!("invalid interval '{}': quantity must be > 0", s);
    }
    n.checked_mul(unit_ms)
        .with_context(|| format!("invalid interval '{}': value is too large", s))
}

impl Config {
    /// Load `config/default.toml` (if present) plus `.env` overrides.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_path = Path::new(DEFAULT_CONFIG_PATH);
        let mut config = if config_path.exists() {
            let config_str = std::fs::read_to_string(config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            Self::from_toml_str(&config_str)
                .with_context(|| format!("failed to parse {}", config_path.display()))?
        } else {
            Config::default()
        };

        if let Ok(path) = std::env::var(SEED_FILE_ENV) {
            if !path.trim().is_empty() {
                config.feed.source = FeedSource::Json;
                config.feed.path = Some(path);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("invalid TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SyncResult<()> {
        self.window.validate().map_err(SyncError::Config)?;
        self.generator.validate().map_err(SyncError::Config)?;
        self.engine
            .tick_period()
            .map_err(|e| SyncError::Config(format!("engine.tick_interval: {:#}", e)))?;
        if self.engine.refill_batch <= self.engine.lookahead_buffer {
            return Err(SyncError::Config(format!(
                "engine.refill_batch ({}) must exceed engine.lookahead_buffer ({})",
                self.engine.refill_batch, self.engine.lookahead_buffer
            )));
        }
        if !self.desk.initial_cash.is_finite() || self.desk.initial_cash < 0.0 {
            return Err(SyncError::Config(format!(
                "desk.initial_cash must be finite and >= 0, got {}",
                self.desk.initial_cash
            )));
        }
        if !self.alert.threshold_pct.is_finite() || self.alert.threshold_pct <= 0.0 {
            return Err(SyncError::Config(format!(
                "alert.threshold_pct must be > 0, got {}",
                self.alert.threshold_pct
            )));
        }
        if self.ui.refresh_rate_ms == 0 {
            return Err(SyncError::Config(
                "ui.refresh_rate_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            window: self.window.clone(),
            generator: self.generator.clone(),
            lookahead_buffer: self.engine.lookahead_buffer,
            refill_batch: self.engine.refill_batch,
        }
    }
}
