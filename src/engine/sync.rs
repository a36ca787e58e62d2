use std::fmt;
use std::sync::Arc;

use crate::error::{SyncError, SyncResult};
use crate::model::order::{TradeQuote, TradeSide};
use crate::series::{ExtendReason, GeneratorPolicy, PriceGenerator, SeriesStore};
use crate::series::store::DEFAULT_REFILL_BATCH;
use crate::window::{compute_snapshot, WindowSnapshot, WindowSpec};

use super::state::{EngineState, PublishReason};

/// Points that must always exist beyond the cursor.
pub const DEFAULT_LOOKAHEAD_BUFFER: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub window: WindowSpec,
    pub generator: GeneratorPolicy,
    pub lookahead_buffer: usize,
    pub refill_batch: usize,
}

impl EngineSettings {
    pub fn validate(&self) -> SyncResult<()> {
        self.window.validate().map_err(SyncError::Config)?;
        self.generator.validate().map_err(SyncError::Config)?;
        Ok(())
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            window: WindowSpec::default(),
            generator: GeneratorPolicy::default(),
            lookahead_buffer: DEFAULT_LOOKAHEAD_BUFFER,
            refill_batch: DEFAULT_REFILL_BATCH,
        }
    }
}

/// Everything a consumer needs for one consistent frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub sequence: u64,
    pub reason: PublishReason,
    pub state: EngineState,
    pub cursor: usize,
    pub price: f64,
    pub series_len: usize,
    pub snapshot: WindowSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

type Subscriber = Box<dyn FnMut(&Arc<Publication>) + Send>;

/// Owns the price series and cursor and drives every mutation of them.
///
/// Each operation runs to completion before returning. Subscribers are called
/// once per publish with the same `Arc<Publication>`, after all state for that
/// publish is final.
pub struct SyncEngine {
    settings: EngineSettings,
    store: Option<SeriesStore>,
    state: EngineState,
    subscribers: Vec<(SubscriptionToken, Subscriber)>,
    next_token: u64,
    sequence: u64,
}

impl fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("state", &self.state)
            .field("cursor", &self.cursor())
            .field("series_len", &self.series_len())
            .field("subscribers", &self.subscribers.len())
            .field("sequence", &self.sequence)
            .finish()
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl SyncEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            store: None,
            state: EngineState::Idle,
            subscribers: Vec::new(),
            next_token: 0,
            sequence: 0,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.store.is_some()
    }

    pub fn current_price(&self) -> Option<f64> {
        self.store.as_ref().map(SeriesStore::current_price)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.store.as_ref().map(SeriesStore::cursor)
    }

    pub fn series_len(&self) -> Option<usize> {
        self.store.as_ref().map(SeriesStore::len)
    }

    pub fn series(&self) -> Option<&[f64]> {
        self.store.as_ref().map(SeriesStore::as_slice)
    }

    /// Fresh window for the current cursor.
    pub fn snapshot(&self) -> Option<WindowSnapshot> {
        self.store
            .as_ref()
            .map(|s| compute_snapshot(s.as_slice(), s.cursor(), &self.settings.window))
    }

    /// Seed the series with the cursor on its first point.
    pub fn initialize(&mut self, seed: Vec<f64>) -> SyncResult<()> {
        self.initialize_at(seed, 0)
    }

    /// Seed the series with the cursor on `present`.
    pub fn initialize_at(&mut self, seed: Vec<f64>, present: usize) -> SyncResult<()> {
        if self.store.is_some() {
            return Err(SyncError::AlreadyInitialized);
        }
        self.settings.validate()?;
        let generator = PriceGenerator::new(self.settings.generator.clone());
        let mut store = SeriesStore::new(seed, present, generator)?
            .with_refill_batch(self.settings.refill_batch);
        store.ensure_lookahead(self.settings.lookahead_buffer, ExtendReason::Backfill)?;
        tracing::info!(
            cursor = store.cursor(),
            len = store.len(),
            price = store.current_price(),
            "Engine initialized"
        );
        self.store = Some(store);
        self.state = EngineState::Idle;
        Ok(())
    }

    /// `Idle -> Running`, publishing the opening frame.
    pub fn start(&mut self) -> SyncResult<Arc<Publication>> {
        self.require_store()?;
        if self.state != EngineState::Idle {
            return Err(self.invalid("start"));
        }
        self.state = EngineState::Running;
        tracing::info!("Engine started");
        self.publish(PublishReason::Start)
    }

    /// Advance the clock by one point. Does nothing unless running.
    pub fn tick(&mut self) -> SyncResult<Option<Arc<Publication>>> {
        self.require_store()?;
        if !self.state.is_running() {
            tracing::trace!(state = %self.state, "Tick skipped");
            return Ok(None);
        }
        // one extra point so the buffer still holds once the cursor moves
        let min_lookahead = self.settings.lookahead_buffer + 1;
        let store = self.store_mut()?;
        store.ensure_lookahead(min_lookahead, ExtendReason::Advance)?;
        store.advance_cursor()?;
        self.publish(PublishReason::Tick).map(Some)
    }

    /// Execution price for a trade intent. Never mutates the engine.
    pub fn trade(&self, side: TradeSide) -> SyncResult<TradeQuote> {
        let store = self.require_store()?;
        let quote = TradeQuote {
            side,
            price: store.current_price(),
            cursor: store.cursor(),
        };
        tracing::info!(side = %side, price = quote.price, cursor = quote.cursor, "Trade quoted");
        Ok(quote)
    }

    pub fn pause(&mut self) -> SyncResult<()> {
        self.require_store()?;
        if self.state != EngineState::Running {
            return Err(self.invalid("pause"));
        }
        self.state = EngineState::Paused;
        tracing::info!("Engine paused");
        Ok(())
    }

    pub fn resume(&mut self) -> SyncResult<()> {
        self.require_store()?;
        if self.state != EngineState::Paused {
            return Err(self.invalid("resume"));
        }
        self.state = EngineState::Running;
        tracing::info!("Engine resumed");
        Ok(())
    }

    /// Drop the speculative future and regenerate it from the history up to the
    /// cursor, then continue running.
    pub fn reset(&mut self) -> SyncResult<Arc<Publication>> {
        self.require_store()?;
        if !matches!(self.state, EngineState::Running | EngineState::Paused) {
            return Err(self.invalid("reset"));
        }
        let previous = self.state;
        self.state = EngineState::Resetting;
        let min_lookahead = self.settings.lookahead_buffer + 1;
        let result = self
            .store_mut()
            .and_then(|store| store.rebase_with_fresh_tail(min_lookahead, ExtendReason::Backfill));
        match result {
            Ok(discarded) => {
                tracing::info!(
                    cursor = self.cursor(),
                    discarded,
                    len = self.series_len(),
                    "Engine reset"
                );
                self.state = EngineState::Running;
                self.publish(PublishReason::Reset)
            }
            Err(e) => {
                self.state = previous;
                tracing::warn!(error = %e, "Reset failed");
                Err(e)
            }
        }
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionToken
    where
        F: FnMut(&Arc<Publication>) + Send + 'static,
    {
        let token = SubscriptionToken(self.next_token);
        self.next_token += 1;
        self.subscribers.push((token, Box::new(callback)));
        token
    }

    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(t, _)| *t != token);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Forget the series and all subscribers so the engine can be seeded again.
    pub fn teardown(&mut self) {
        self.store = None;
        self.subscribers.clear();
        self.state = EngineState::Idle;
        self.sequence = 0;
        tracing::info!("Engine torn down");
    }

    fn publish(&mut self, reason: PublishReason) -> SyncResult<Arc<Publication>> {
        let (cursor, price, series_len, snapshot) = {
            let store = self.require_store()?;
            let snapshot =
                compute_snapshot(store.as_slice(), store.cursor(), &self.settings.window);
            (store.cursor(), store.current_price(), store.len(), snapshot)
        };
        self.sequence += 1;
        let publication = Arc::new(Publication {
            sequence: self.sequence,
            reason,
            state: self.state,
            cursor,
            price,
            series_len,
            snapshot,
        });
        tracing::debug!(
            sequence = publication.sequence,
            cursor = publication.cursor,
            price = publication.price,
            ?reason,
            "Publishing frame"
        );
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&publication);
        }
        Ok(publication)
    }

    fn require_store(&self) -> SyncResult<&SeriesStore> {
        self.store.as_ref().ok_or(SyncError::NotInitialized)
    }

    fn store_mut(&mut self) -> SyncResult<&mut SeriesStore> {
        self.store.as_mut().ok_or(SyncError::NotInitialized)
    }

    fn invalid(&self, op: &'static str) -> SyncError {
        tracing::warn!(op, state = %self.state, "Rejected engine operation");
        SyncError::InvalidState {
            op,
            state: self.state,
        }
    }
}
