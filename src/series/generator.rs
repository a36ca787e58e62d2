use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::model::price::{normalize, MIN_PRICE};

use super::trend;

/// Why the series is being extended. Selects the trend weight from the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendReason {
    /// Bulk regeneration on initialize and reset.
    Backfill,
    /// Refill triggered while the clock advances.
    Advance,
}

/// Random-walk parameters. One policy serves every call site.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratorPolicy {
    pub volatility: f64,
    pub trend_window: usize,
    pub backfill_trend_weight: f64,
    pub incremental_trend_weight: f64,
    pub seed: Option<u64>,
}

impl Default for GeneratorPolicy {
    fn default() -> Self {
        Self {
            volatility: 0.5,
            trend_window: trend::TREND_SAMPLE_LEN,
            backfill_trend_weight: 0.2,
            incremental_trend_weight: 0.3,
            seed: None,
        }
    }
}

impl GeneratorPolicy {
    pub fn trend_weight(&self, reason: ExtendReason) -> f64 {
        match reason {
            ExtendReason::Backfill => self.backfill_trend_weight,
            ExtendReason::Advance => self.incremental_trend_weight,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return Err(format!(
                "generator.volatility must be finite and >= 0, got {}",
                self.volatility
            ));
        }
        if self.trend_window < 2 {
            return Err(format!(
                "generator.trend_window must be >= 2, got {}",
                self.trend_window
            ));
        }
        for (name, w) in [
            ("backfill_trend_weight", self.backfill_trend_weight),
            ("incremental_trend_weight", self.incremental_trend_weight),
        ] {
            if !w.is_finite() {
                return Err(format!("generator.{} must be finite, got {}", name, w));
            }
        }
        Ok(())
    }
}

/// Synthesizes future points by a trend-following random walk.
#[derive(Debug)]
pub struct PriceGenerator {
    policy: GeneratorPolicy,
    rng: StdRng,
}

impl PriceGenerator {
    pub fn new(policy: GeneratorPolicy) -> Self {
        let rng = match policy.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { policy, rng }
    }

    pub fn policy(&self) -> &GeneratorPolicy {
        &self.policy
    }

    /// Produce `count` points continuing `series` using the weight for `reason`.
    pub fn extend_for(&mut self, series: &[f64], count: usize, reason: ExtendReason) -> Vec<f64> {
        let weight = self.policy.trend_weight(reason);
        self.extend(series, count, weight)
    }

    /// The trend is estimated once, over `series` as given, for the whole batch.
    /// A non-finite drift or volatility counts as zero.
    fn extend(&mut self, series: &[f64], count: usize, trend_weight: f64) -> Vec<f64> {
        let trend = trend::estimate_over(series, self.policy.trend_window);
        let drift = match trend * trend_weight {
            d if d.is_finite() => d,
            _ => 0.0,
        };
        let volatility = self.policy.volatility;
        let mut last = series.last().copied().unwrap_or(MIN_PRICE);
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let shock = if volatility.is_finite() && volatility > 0.0 {
                self.rng.gen_range(-volatility..=volatility)
            } else {
                0.0
            };
            last = normalize(last + shock + drift);
            out.push(last);
        }
        out
    }
}
