use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::alert::TrendAlert;
use crate::desk::TradeDesk;
use crate::engine::EngineState;
use crate::model::order::TradeSide;

pub struct StatusBar<'a> {
    pub title: &'a str,
    pub state: EngineState,
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub cursor: Option<usize>,
    pub series_len: Option<usize>,
    pub publishes: u64,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state_color = match self.state {
            EngineState::Running => Color::Green,
            EngineState::Paused => Color::Yellow,
            EngineState::Resetting => Color::Magenta,
            EngineState::Idle => Color::DarkGray,
        };
        let change_color = match self.change {
            Some(d) if d > 0.0 => Color::Green,
            Some(d) if d < 0.0 => Color::Red,
            _ => Color::White,
        };
        let price = self
            .price
            .map(|p| format!("USD {:.2}", p))
            .unwrap_or_else(|| "--".to_string());
        let change = self
            .change
            .map(|d| format!(" ({:+.2})", d))
            .unwrap_or_default();
        let position = match (self.cursor, self.series_len) {
            (Some(c), Some(len)) => format!(" | t={} / {}", c, len),
            _ => String::new(),
        };

        let line = Line::from(vec![
            Span::styled(
                format!(" {} ", self.title),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("[{}] ", self.state.as_str().to_ascii_uppercase()),
                Style::default().fg(state_color),
            ),
            Span::styled(price, Style::default().fg(Color::White)),
            Span::styled(change, Style::default().fg(change_color)),
            Span::styled(position, Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!(" | frames: {}", self.publishes),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        Paragraph::new(line).render(area, buf);
    }
}

pub struct AccountPanel<'a> {
    desk: &'a TradeDesk,
    price: Option<f64>,
}

impl<'a> AccountPanel<'a> {
    pub fn new(desk: &'a TradeDesk, price: Option<f64>) -> Self {
        Self { desk, price }
    }
}

impl Widget for AccountPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let label = Style::default().fg(Color::DarkGray);
        let value = Style::default().fg(Color::White);
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Cash:   ", label),
                Span::styled(format!("${:.2}", self.desk.cash()), value),
            ]),
            Line::from(vec![
                Span::styled("Shares: ", label),
                Span::styled(format!("{}", self.desk.shares()), value),
            ]),
        ];
        if let Some(price) = self.price {
            lines.push(Line::from(vec![
                Span::styled("Equity: ", label),
                Span::styled(format!("${:.2}", self.desk.equity(price)), value),
            ]));
        }
        lines.push(Line::from(""));
        for tx in self.desk.transactions().iter().rev().take(8) {
            let color = match tx.side {
                TradeSide::Buy => Color::Green,
                TradeSide::Sell => Color::Red,
            };
            lines.push(Line::from(vec![
                Span::styled(format!("#{:<3}", tx.id), label),
                Span::styled(format!("{:<5}", tx.side.to_string()), Style::default().fg(color)),
                Span::styled(format!("{}@{:.2}", tx.quantity, tx.price), value),
                Span::styled(format!(" {:+.2}", tx.total), label),
            ]));
        }

        let block = Block::default()
            .title(" Account ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        Paragraph::new(lines).block(block).render(area, buf);
    }
}

pub struct AlertBanner<'a> {
    pub alert: Option<&'a TrendAlert>,
}

impl Widget for AlertBanner<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(alert) = self.alert else {
            return;
        };
        let (text, color) = match alert.side {
            TradeSide::Buy => (
                format!(
                    " Price up {:.1}% to {:.2}: trend is rising, consider buying ",
                    alert.change_pct, alert.price
                ),
                Color::Green,
            ),
            TradeSide::Sell => (
                format!(
                    " Price down {:.1}% to {:.2}: trend is falling, consider selling ",
                    alert.change_pct, alert.price
                ),
                Color::Red,
            ),
        };
        Paragraph::new(Line::from(Span::styled(
            text,
            Style::default()
                .fg(Color::Black)
                .bg(color)
                .add_modifier(Modifier::BOLD),
        )))
        .render(area, buf);
    }
}

pub struct LogPanel<'a> {
    messages: &'a [String],
}

impl<'a> LogPanel<'a> {
    pub fn new(messages: &'a [String]) -> Self {
        Self { messages }
    }
}

impl Widget for LogPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" System Log ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner_height = block.inner(area).height as usize;

        let start = self.messages.len().saturating_sub(inner_height);
        let lines: Vec<Line> = self.messages[start..]
            .iter()
            .map(|msg| {
                let color = if msg.starts_with("[ERR]") {
                    Color::Red
                } else if msg.starts_with("[WARN]") {
                    Color::Yellow
                } else {
                    Color::DarkGray
                };
                Line::from(Span::styled(msg.as_str(), Style::default().fg(color)))
            })
            .collect();

        Paragraph::new(lines).block(block).render(area, buf);
    }
}

pub struct KeybindBar;

impl Widget for KeybindBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let key = Style::default().fg(Color::Yellow);
        let text = Style::default().fg(Color::DarkGray);
        let line = Line::from(vec![
            Span::styled(" [B]", key),
            Span::styled("uy ", text),
            Span::styled("[S]", key),
            Span::styled("ell ", text),
            Span::styled("[P]", key),
            Span::styled("ause ", text),
            Span::styled("[R]", key),
            Span::styled("esume ", text),
            Span::styled("[X]", key),
            Span::styled(" reset ", text),
            Span::styled("[Q]", key),
            Span::styled("uit", text),
        ]);
        Paragraph::new(line).render(area, buf);
    }
}
