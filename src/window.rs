//! Visible slice of the price series around the cursor.
//!
//! A snapshot is always derived fresh from `(series, cursor, spec)`; nothing in
//! here is cached between publishes.

use serde::Deserialize;

pub const DEFAULT_PADDING_FRACTION: f64 = 0.10;

/// Shape of the visible window.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowSpec {
    /// Past points shown before the cursor.
    pub lookback: usize,
    /// Future points shown after the past section.
    pub lookahead: usize,
    /// Extra vertical range reserved above and below the data, as a fraction.
    pub padding_fraction: f64,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            lookback: 30,
            lookahead: 20,
            padding_fraction: DEFAULT_PADDING_FRACTION,
        }
    }
}

impl WindowSpec {
    pub fn span(&self) -> usize {
        self.lookback + self.lookahead
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.span() == 0 {
            return Err("window.lookback + window.lookahead must be > 0".to_string());
        }
        if !self.padding_fraction.is_finite() || self.padding_fraction <= 0.0 {
            return Err(format!(
                "window.padding_fraction must be finite and > 0, got {}",
                self.padding_fraction
            ));
        }
        Ok(())
    }
}

/// Padded vertical range of a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn height(&self) -> f64 {
        self.max - self.min
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowSnapshot {
    /// Series index of the first visible point.
    pub start: usize,
    pub visible: Vec<f64>,
    /// Position of "now" inside `visible`.
    pub split_index: usize,
    /// Visible values up to and including `split_index`, `None` after.
    pub past: Vec<Option<f64>>,
    /// `None` up to and including `split_index`, visible values after.
    pub future: Vec<Option<f64>>,
    pub labels: Vec<String>,
    pub value_range: ValueRange,
}

impl WindowSnapshot {
    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn now_price(&self) -> Option<f64> {
        self.visible.get(self.split_index).copied()
    }

    /// Horizontal position of "now" in `[0, 1]`.
    pub fn now_fraction(&self) -> f64 {
        if self.visible.len() < 2 {
            return 0.0;
        }
        self.split_index as f64 / (self.visible.len() - 1) as f64
    }

    /// Vertical position of `price` within the padded range, 0 at the bottom.
    pub fn value_fraction(&self, price: f64) -> f64 {
        let height = self.value_range.height();
        if !price.is_finite() || !(height > 0.0) {
            return 0.0;
        }
        (price - self.value_range.min) / height
    }

    /// Round price levels for horizontal grid lines inside the range.
    pub fn gridlines(&self) -> Vec<f64> {
        let ValueRange { min, max } = self.value_range;
        let height = max - min;
        let interval = if height > 100.0 {
            20.0
        } else if height > 50.0 {
            10.0
        } else {
            5.0
        };
        let mut levels = Vec::new();
        let mut level = (min / interval).ceil() * interval;
        while level <= max {
            levels.push(level);
            level += interval;
        }
        levels
    }

    /// Labels with all but every `every`-th position and "now" blanked out.
    pub fn sparse_labels(&self, every: usize) -> Vec<&str> {
        let every = every.max(1);
        self.labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                if i % every == 0 || i == self.split_index {
                    label.as_str()
                } else {
                    ""
                }
            })
            .collect()
    }
}

/// Derive the visible window for `cursor`.
pub fn compute_snapshot(series: &[f64], cursor: usize, spec: &WindowSpec) -> WindowSnapshot {
    if series.is_empty() {
        return WindowSnapshot {
            start: 0,
            visible: Vec::new(),
            split_index: 0,
            past: Vec::new(),
            future: Vec::new(),
            labels: Vec::new(),
            value_range: value_range(std::iter::empty(), spec.padding_fraction),
        };
    }

    let last = series.len() - 1;
    let cursor = cursor.min(last);
    let start = cursor.saturating_sub(spec.lookback);
    let end = last.min(start + spec.span());
    let visible = series[start..=end].to_vec();
    let split_index = (cursor - start).min(visible.len() - 1);

    let past = visible
        .iter()
        .enumerate()
        .map(|(i, v)| (i <= split_index).then_some(*v))
        .collect();
    let future = visible
        .iter()
        .enumerate()
        .map(|(i, v)| (i > split_index).then_some(*v))
        .collect();
    let labels = (0..visible.len())
        .map(|i| relative_label(i as i64 - split_index as i64))
        .collect();
    let value_range = value_range(visible.iter().map(|v| Some(*v)), spec.padding_fraction);

    WindowSnapshot {
        start,
        visible,
        split_index,
        past,
        future,
        labels,
        value_range,
    }
}

/// Label for a position `delta` seconds from the present.
pub fn relative_label(delta: i64) -> String {
    match delta {
        0 => "now".to_string(),
        d if d < 0 => format!("{} seconds ago", d.unsigned_abs()),
        d => format!("{} seconds from now", d),
    }
}

/// Padded range over the non-null, finite values. Empty input maps to `(0, 1)`
/// before padding. A `padding_fraction` that is not finite and positive falls back to
/// [`DEFAULT_PADDING_FRACTION`].
pub fn value_range<I>(values: I, padding_fraction: f64) -> ValueRange
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values.into_iter().flatten().filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    let (min, max) = if lo.is_finite() && hi.is_finite() {
        (lo.floor(), hi.ceil())
    } else {
        (0.0, 1.0)
    };
    let range = (max - min).max(1.0);
    let padding_fraction = if padding_fraction.is_finite() && padding_fraction > 0.0 {
        padding_fraction
    } else {
        DEFAULT_PADDING_FRACTION
    };
    ValueRange {
        min: min - range * padding_fraction,
        max: max + range * padding_fraction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn window_centres_on_cursor() {
        let series = ramp(100);
        let snap = compute_snapshot(&series, 50, &WindowSpec::default());
        assert_eq!(snap.start, 20);
        assert_eq!(snap.len(), 51);
        assert_eq!(snap.split_index, 30);
        assert_eq!(snap.labels[30], "now");
        assert_eq!(snap.labels[0], "30 seconds ago");
        assert_eq!(snap.labels[31], "1 seconds from now");
        assert_eq!(snap.now_price(), Some(150.0));
    }

    #[test]
    fn early_cursor_clamps_start() {
        let series = ramp(60);
        let snap = compute_snapshot(&series, 3, &WindowSpec::default());
        assert_eq!(snap.start, 0);
        assert_eq!(snap.split_index, 3);
        assert_eq!(snap.len(), 51);
    }

    #[test]
    fn halves_are_disjoint() {
        let series = ramp(10);
        let snap = compute_snapshot(&series, 4, &WindowSpec::default());
        assert_eq!(snap.past.len(), snap.len());
        assert_eq!(snap.future.len(), snap.len());
        for i in 0..snap.len() {
            assert!(snap.past[i].is_some() != snap.future[i].is_some());
        }
        assert_eq!(snap.past[4], Some(104.0));
        assert_eq!(snap.future[4], None);
        assert_eq!(snap.future[5], Some(105.0));
    }

    #[test]
    fn single_point_window() {
        let snap = compute_snapshot(&[42.0], 0, &WindowSpec::default());
        assert_eq!(snap.split_index, 0);
        assert_eq!(snap.labels, vec!["now".to_string()]);
        assert!(snap.future.iter().all(Option::is_none));
        assert_eq!(snap.now_fraction(), 0.0);
    }

    #[test]
    fn empty_series_yields_default_range() {
        let snap = compute_snapshot(&[], 0, &WindowSpec::default());
        assert!(snap.is_empty());
        assert!(snap.value_range.max > snap.value_range.min);
    }

    #[test]
    fn range_floors_ceils_and_pads() {
        let r = value_range([Some(10.4), None, Some(19.6)], 0.1);
        // floor 10, ceil 20, range 10
        assert!((r.min - 9.0).abs() < 1e-9);
        assert!((r.max - 21.0).abs() < 1e-9);
    }

    #[test]
    fn constant_window_still_has_height() {
        let r = value_range([Some(10.0), Some(10.0)], 0.1);
        assert!((r.min - 9.9).abs() < 1e-9);
        assert!((r.max - 10.1).abs() < 1e-9);
    }

    #[test]
    fn all_null_defaults_to_unit_range() {
        let r = value_range([None, None], 0.1);
        assert!((r.min + 0.1).abs() < 1e-9);
        assert!((r.max - 1.1).abs() < 1e-9);
    }

    #[test]
    fn bad_padding_never_inverts_range() {
        for pf in [-0.6, f64::NAN, f64::INFINITY] {
            let r = value_range([Some(10.0), Some(10.0)], pf);
            assert!(r.max > r.min, "padding {} gave {:?}", pf, r);
            assert!(r.min.is_finite() && r.max.is_finite());
        }
    }

    #[test]
    fn gridlines_follow_interval_rules() {
        let series = vec![100.0, 103.0];
        let snap = compute_snapshot(&series, 0, &WindowSpec::default());
        // range (99.7, 103.3) -> interval 5
        assert_eq!(snap.gridlines(), vec![100.0]);

        let wide = vec![100.0, 200.0];
        let snap = compute_snapshot(&wide, 0, &WindowSpec::default());
        let lines = snap.gridlines();
        assert!(lines.windows(2).all(|w| (w[1] - w[0] - 20.0).abs() < 1e-9));
    }

    #[test]
    fn fractions_map_into_unit_interval() {
        let series = ramp(60);
        let snap = compute_snapshot(&series, 30, &WindowSpec::default());
        assert!((snap.now_fraction() - 30.0 / 50.0).abs() < 1e-12);
        let y = snap.value_fraction(snap.now_price().unwrap());
        assert!(y > 0.0 && y < 1.0);
    }

    #[test]
    fn sparse_labels_keep_now() {
        let series = ramp(20);
        let snap = compute_snapshot(&series, 7, &WindowSpec::default());
        let labels = snap.sparse_labels(10);
        assert_eq!(labels[0], "7 seconds ago");
        assert_eq!(labels[7], "now");
        assert_eq!(labels[3], "");
        assert_eq!(labels[10], "3 seconds from now");
    }
}
