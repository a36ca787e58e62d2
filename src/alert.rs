use serde::Deserialize;

use crate::model::order::TradeSide;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub enabled: bool,
    /// Percent move from the reference price that raises an alert.
    pub threshold_pct: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_pct: 20.0,
        }
    }
}

/// Suggested direction after a large move: follow the trend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendAlert {
    pub side: TradeSide,
    pub change_pct: f64,
    pub price: f64,
}

/// Watches published prices for moves beyond a percent threshold.
#[derive(Debug, Clone)]
pub struct TrendMonitor {
    threshold_pct: f64,
    reference: Option<f64>,
}

impl TrendMonitor {
    pub fn new(threshold_pct: f64) -> Self {
        Self {
            threshold_pct: threshold_pct.abs(),
            reference: None,
        }
    }

    pub fn reference(&self) -> Option<f64> {
        self.reference
    }

    pub fn observe(&mut self, price: f64) -> Option<TrendAlert> {
        if !price.is_finite() {
            return None;
        }
        let reference = match self.reference {
            Some(r) if r > 0.0 => r,
            _ => {
                self.reference = Some(price);
                return None;
            }
        };
        let change_pct = (price - reference) / reference * 100.0;
        if change_pct.abs() < self.threshold_pct {
            return None;
        }
        self.reference = Some(price);
        let side = if change_pct > 0.0 {
            TradeSide::Buy
        } else {
            TradeSide::Sell
        };
        tracing::info!(%side, change_pct, price, "Trend threshold crossed");
        Some(TrendAlert {
            side,
            change_pct: change_pct.abs(),
            price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_sets_reference() {
        let mut m = TrendMonitor::new(20.0);
        assert!(m.observe(100.0).is_none());
        assert_eq!(m.reference(), Some(100.0));
    }

    #[test]
    fn rise_past_threshold_suggests_buy_and_rebases() {
        let mut m = TrendMonitor::new(20.0);
        m.observe(100.0);
        assert!(m.observe(119.99).is_none());
        let alert = m.observe(120.0).expect("20% rise");
        assert_eq!(alert.side, TradeSide::Buy);
        assert!((alert.change_pct - 20.0).abs() < 1e-9);
        assert_eq!(m.reference(), Some(120.0));
        assert!(m.observe(125.0).is_none());
    }

    #[test]
    fn fall_past_threshold_suggests_sell() {
        let mut m = TrendMonitor::new(20.0);
        m.observe(50.0);
        let alert = m.observe(39.0).expect("22% drop");
        assert_eq!(alert.side, TradeSide::Sell);
        assert!((alert.change_pct - 22.0).abs() < 1e-9);
    }
}
