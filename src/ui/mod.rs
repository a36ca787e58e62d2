pub mod chart;
pub mod dashboard;

use std::sync::Arc;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

use crate::alert::TrendAlert;
use crate::desk::TradeDesk;
use crate::engine::{EngineState, Publication};
use crate::event::AppEvent;

use chart::{PriceChart, TradeMarker};
use dashboard::{AccountPanel, AlertBanner, KeybindBar, LogPanel, StatusBar};

const MAX_LOG_MESSAGES: usize = 200;
const MAX_TRADE_MARKERS: usize = 200;

pub struct AppState {
    pub title: String,
    pub publication: Option<Arc<Publication>>,
    pub previous_price: Option<f64>,
    pub state: EngineState,
    pub desk: TradeDesk,
    pub markers: Vec<TradeMarker>,
    pub last_alert: Option<TrendAlert>,
    pub publishes: u64,
    pub dropped_publishes: u64,
    pub log_messages: Vec<String>,
}

impl AppState {
    pub fn new(title: &str, desk: TradeDesk) -> Self {
        let markers = desk
            .transactions()
            .iter()
            .map(|tx| TradeMarker {
                series_index: tx.cursor,
                price: tx.price,
                side: tx.side,
            })
            .collect();
        Self {
            title: title.to_string(),
            publication: None,
            previous_price: None,
            state: EngineState::Idle,
            desk,
            markers,
            last_alert: None,
            publishes: 0,
            dropped_publishes: 0,
            log_messages: Vec::new(),
        }
    }

    pub fn current_price(&self) -> Option<f64> {
        self.publication.as_ref().map(|p| p.price)
    }

    pub fn price_change(&self) -> Option<f64> {
        Some(self.current_price()? - self.previous_price?)
    }

    pub fn push_log(&mut self, msg: String) {
        self.log_messages.push(msg);
        if self.log_messages.len() > MAX_LOG_MESSAGES {
            self.log_messages.remove(0);
        }
    }

    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::Published(publication) => {
                // frames can only move forward; a stale one is ignored
                if let Some(current) = &self.publication {
                    if publication.sequence <= current.sequence {
                        return;
                    }
                }
                self.previous_price = self.current_price();
                self.state = publication.state;
                self.publishes += 1;
                self.publication = Some(publication);
            }
            AppEvent::StateChanged(state) => {
                self.state = state;
                self.push_log(format!("Engine {}", state));
            }
            AppEvent::TradeQuoted(quote) => match self.desk.execute(quote) {
                Ok(tx) => {
                    let msg = format!(
                        "{} {} @ {:.2} (t={})",
                        tx.side, tx.quantity, tx.price, tx.cursor
                    );
                    self.markers.push(TradeMarker {
                        series_index: quote.cursor,
                        price: quote.price,
                        side: quote.side,
                    });
                    if self.markers.len() > MAX_TRADE_MARKERS {
                        self.markers.remove(0);
                    }
                    self.push_log(msg);
                }
                Err(e) => {
                    self.push_log(format!("[WARN] {} rejected: {}", quote.side, e));
                }
            },
            AppEvent::TrendAlert(alert) => {
                self.push_log(format!(
                    "Trend alert: {} ({:.1}% at {:.2})",
                    alert.side, alert.change_pct, alert.price
                ));
                self.last_alert = Some(alert);
            }
            AppEvent::PublishDropped(count) => {
                self.dropped_publishes += count;
            }
            AppEvent::LogMessage(msg) => {
                self.push_log(msg);
            }
            AppEvent::Error(msg) => {
                self.push_log(format!("[ERR] {}", msg));
            }
        }
    }
}

pub fn render(frame: &mut Frame, state: &AppState) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Length(1), // alert banner
            Constraint::Min(10),   // chart + account
            Constraint::Length(6), // system log
            Constraint::Length(1), // keybinds
        ])
        .split(frame.area());

    frame.render_widget(
        StatusBar {
            title: &state.title,
            state: state.state,
            price: state.current_price(),
            change: state.price_change(),
            cursor: state.publication.as_ref().map(|p| p.cursor),
            series_len: state.publication.as_ref().map(|p| p.series_len),
            publishes: state.publishes,
        },
        outer[0],
    );

    frame.render_widget(
        AlertBanner {
            alert: state.last_alert.as_ref(),
        },
        outer[1],
    );

    let main_area = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(34)])
        .split(outer[2]);

    if let Some(publication) = &state.publication {
        frame.render_widget(
            PriceChart::new(&publication.snapshot, &state.title).markers(&state.markers),
            main_area[0],
        );
    }

    frame.render_widget(
        AccountPanel::new(&state.desk, state.current_price()),
        main_area[1],
    );

    frame.render_widget(LogPanel::new(&state.log_messages), outer[3]);
    frame.render_widget(KeybindBar, outer[4]);
}
