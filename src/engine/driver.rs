use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::error::SyncResult;
use crate::event::AppEvent;
use crate::model::order::TradeSide;

use super::sync::SyncEngine;

pub type SharedEngine = Arc<Mutex<SyncEngine>>;

const COMMAND_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    Pause,
    Resume,
    TogglePause,
    Reset,
    Trade(TradeSide),
    Shutdown,
}

/// Sending side of the driver's command queue.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub async fn send(&self, command: EngineCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .context("engine driver is no longer running")
    }

    pub fn try_send(&self, command: EngineCommand) -> Result<()> {
        self.tx
            .try_send(command)
            .map_err(|e| anyhow::anyhow!("failed to enqueue {:?}: {}", command, e))
    }
}

/// Lock the engine, recovering the guard if a subscriber panicked mid-publish.
pub fn lock_engine(engine: &SharedEngine) -> MutexGuard<'_, SyncEngine> {
    match engine.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Engine mutex poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Spawn the task that owns the clock.
///
/// Ticks fire every `period` and commands are applied in arrival order, all on
/// one task, so no two engine operations ever interleave.
pub fn spawn_driver(
    engine: SharedEngine,
    period: Duration,
    app_tx: mpsc::Sender<AppEvent>,
    shutdown_rx: watch::Receiver<bool>,
) -> (EngineHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let task = tokio::spawn(run_driver(engine, period, rx, app_tx, shutdown_rx));
    (EngineHandle { tx }, task)
}

async fn run_driver(
    engine: SharedEngine,
    period: Duration,
    mut cmd_rx: mpsc::Receiver<EngineCommand>,
    app_tx: mpsc::Sender<AppEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(period_ms = period.as_millis() as u64, "Engine driver started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = lock_engine(&engine).tick();
                if let Err(e) = outcome {
                    tracing::error!(error = %e, "Tick failed");
                    let _ = app_tx.send(AppEvent::Error(format!("tick: {}", e))).await;
                }
            }
            command = cmd_rx.recv() => {
                let Some(command) = command else {
                    tracing::info!("Command channel closed, driver exiting");
                    break;
                };
                if command == EngineCommand::Shutdown {
                    tracing::info!("Shutdown command received");
                    break;
                }
                let event = match apply_command(&engine, command) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(?command, error = %e, "Engine command rejected");
                        AppEvent::Error(e.to_string())
                    }
                };
                let _ = app_tx.send(event).await;
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    tracing::info!("Shutdown signalled, driver exiting");
                    break;
                }
            }
        }
    }
}

fn apply_command(engine: &SharedEngine, command: EngineCommand) -> SyncResult<AppEvent> {
    let mut engine = lock_engine(engine);
    match command {
        EngineCommand::Pause => engine.pause()?,
        EngineCommand::Resume => engine.resume()?,
        EngineCommand::TogglePause => {
            if engine.state().is_running() {
                engine.pause()?
            } else {
                engine.resume()?
            }
        }
        EngineCommand::Reset => {
            engine.reset()?;
        }
        EngineCommand::Trade(side) => return engine.trade(side).map(AppEvent::TradeQuoted),
        EngineCommand::Shutdown => {}
    }
    Ok(AppEvent::StateChanged(engine.state()))
}
