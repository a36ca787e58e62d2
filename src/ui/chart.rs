use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Widget},
};

use crate::model::order::TradeSide;
use crate::window::WindowSnapshot;

/// Trade execution to mark on the chart, by series index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeMarker {
    pub series_index: usize,
    pub price: f64,
    pub side: TradeSide,
}

pub struct PriceChart<'a> {
    snapshot: &'a WindowSnapshot,
    title: &'a str,
    markers: &'a [TradeMarker],
}

impl<'a> PriceChart<'a> {
    pub fn new(snapshot: &'a WindowSnapshot, title: &'a str) -> Self {
        Self {
            snapshot,
            title,
            markers: &[],
        }
    }

    pub fn markers(mut self, markers: &'a [TradeMarker]) -> Self {
        self.markers = markers;
        self
    }
}

struct Plot {
    area: Rect,
    points: usize,
}

impl Plot {
    fn column(&self, index: usize) -> u16 {
        if self.points < 2 || self.area.width < 2 {
            return self.area.x;
        }
        let frac = index as f64 / (self.points - 1) as f64;
        self.area.x + (frac * (self.area.width - 1) as f64).round() as u16
    }

    fn row(&self, fraction: f64) -> u16 {
        let rows = self.area.height.saturating_sub(1) as f64;
        let offset = (fraction.clamp(0.0, 1.0) * rows).round() as u16;
        self.area.y + self.area.height.saturating_sub(1) - offset
    }
}

impl Widget for PriceChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);

        let snap = self.snapshot;
        if snap.is_empty() || inner.height < 3 || inner.width < 8 {
            return;
        }

        // bottom row is reserved for time labels
        let plot = Plot {
            area: Rect {
                height: inner.height - 1,
                ..inner
            },
            points: snap.len(),
        };
        let grid_style = Style::default().fg(Color::DarkGray);

        for level in snap.gridlines() {
            let y = plot.row(snap.value_fraction(level));
            for x in plot.area.x..plot.area.x + plot.area.width {
                buf.set_string(x, y, "┄", grid_style);
            }
            buf.set_string(plot.area.x, y, format!("{:.0}", level), grid_style);
        }

        let now_x = plot.column(snap.split_index);
        for y in plot.area.y..plot.area.y + plot.area.height {
            buf.set_string(now_x, y, "│", Style::default().fg(Color::Yellow));
        }

        let past_style = Style::default().fg(Color::Cyan);
        let future_style = Style::default().fg(Color::Red);
        for (i, (past, future)) in snap.past.iter().zip(snap.future.iter()).enumerate() {
            let (value, symbol, style) = match (past, future) {
                (Some(v), _) => (*v, "●", past_style),
                (None, Some(v)) => (*v, "·", future_style),
                (None, None) => continue,
            };
            let x = plot.column(i);
            let y = plot.row(snap.value_fraction(value));
            buf.set_string(x, y, symbol, style);
        }

        let end = snap.start + snap.len();
        for marker in self.markers {
            if marker.series_index < snap.start || marker.series_index >= end {
                continue;
            }
            let x = plot.column(marker.series_index - snap.start);
            let y = plot.row(snap.value_fraction(marker.price));
            let (symbol, color) = match marker.side {
                TradeSide::Buy => ("B", Color::Green),
                TradeSide::Sell => ("S", Color::Red),
            };
            buf.set_string(
                x,
                y,
                symbol,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            );
        }

        if let Some(price) = snap.now_price() {
            let tag = format!(" USD {:.2} ", price);
            let y = plot.row(snap.value_fraction(price));
            let max_x = plot.area.x + plot.area.width;
            let x = (now_x + 1).min(max_x.saturating_sub(tag.chars().count() as u16));
            buf.set_string(
                x,
                y,
                &tag,
                Style::default().fg(Color::Black).bg(Color::Blue),
            );
        }

        let label_y = inner.y + inner.height - 1;
        let labels = snap.sparse_labels(10);
        let max_x = inner.x + inner.width;
        for (i, label) in labels.iter().enumerate() {
            if label.is_empty() {
                continue;
            }
            let x = plot.column(i);
            let room = max_x.saturating_sub(x) as usize;
            let text: String = label.chars().take(room).collect();
            let style = if i == snap.split_index {
                Style::default().fg(Color::Yellow)
            } else {
                grid_style
            };
            buf.set_string(x, label_y, text, style);
        }
    }
}
