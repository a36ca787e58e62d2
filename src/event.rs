use std::sync::Arc;

use crate::alert::TrendAlert;
use crate::engine::{EngineState, Publication};
use crate::model::order::TradeQuote;

#[derive(Debug, Clone)]
pub enum AppEvent {
    Published(Arc<Publication>),
    StateChanged(EngineState),
    TradeQuoted(TradeQuote),
    TrendAlert(TrendAlert),
    /// Publications skipped because the UI queue was full.
    PublishDropped(u64),
    LogMessage(String),
    Error(String),
}
