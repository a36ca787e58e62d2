use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{Event, KeyEventKind};
use tokio::sync::{mpsc, watch};

use price_sync::alert::TrendMonitor;
use price_sync::config::Config;
use price_sync::desk::TradeDesk;
use price_sync::engine::{lock_engine, spawn_driver, SharedEngine, SyncEngine};
use price_sync::event::AppEvent;
use price_sync::feed::load_or_fallback;
use price_sync::input::{parse_main_command, UiCommand};
use price_sync::model::order::TradeSide;
use price_sync::ui;
use price_sync::ui::AppState;

const APP_EVENT_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            eprintln!("Check config/default.toml and PRICE_SYNC_SEED_FILE");
            std::process::exit(1);
        }
    };

    // Log to a file so output doesn't interfere with the TUI
    let log_file = std::fs::File::create(&config.logging.file)
        .with_context(|| format!("failed to create {}", config.logging.file))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.logging.level.as_str())
            }),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .json()
        .init();

    tracing::info!(
        feed = ?config.feed.source,
        lookback = config.window.lookback,
        lookahead = config.window.lookahead,
        tick_interval = %config.engine.tick_interval,
        "Starting price-sync"
    );

    let (app_tx, mut app_rx) = mpsc::channel::<AppEvent>(APP_EVENT_CAPACITY);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let feed = config.feed.build()?;
    let seed = load_or_fallback(feed.as_ref());

    let mut engine = SyncEngine::new(config.engine_settings());
    engine.initialize_at(seed.prices, seed.present)?;
    subscribe_ui(&mut engine, app_tx.clone());
    if config.alert.enabled {
        subscribe_alerts(&mut engine, config.alert.threshold_pct, app_tx.clone());
    }

    let opening_quote = engine.trade(TradeSide::Buy).ok();
    engine.start()?;
    let engine: SharedEngine = Arc::new(Mutex::new(engine));

    let desk = TradeDesk::open(&config.desk, opening_quote);
    let mut app_state = AppState::new(&config.ui.title, desk);
    app_state.push_log(format!(
        "price-sync started | feed {} | tick {}",
        feed.name(),
        config.engine.tick_interval
    ));

    let (handle, driver_task) = spawn_driver(
        Arc::clone(&engine),
        config.engine.tick_period()?,
        app_tx.clone(),
        shutdown_rx,
    );

    let mut terminal = ratatui::init();
    let refresh = Duration::from_millis(config.ui.refresh_rate_ms);

    let loop_result: Result<()> = async {
        loop {
            // Drain events from channel
            while let Ok(evt) = app_rx.try_recv() {
                app_state.apply(evt);
            }

            terminal.draw(|frame| ui::render(frame, &app_state))?;

            if crossterm::event::poll(refresh)? {
                if let Event::Key(key) = crossterm::event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    let Some(cmd) = parse_main_command(&key.code) else {
                        continue;
                    };
                    if cmd == UiCommand::Quit {
                        tracing::info!("User quit");
                        break;
                    }
                    if let Some(command) = cmd.engine_command() {
                        if let Err(e) = handle.try_send(command) {
                            tracing::warn!(error = %e, "Failed to send engine command");
                            app_state.push_log(format!("[WARN] {}", e));
                        }
                    }
                }
            }
        }
        Ok(())
    }
    .await;

    ratatui::restore();

    let _ = shutdown_tx.send(true);
    drop(app_rx);
    if let Err(e) = driver_task.await {
        tracing::warn!(error = %e, "Engine driver task ended abnormally");
    }
    lock_engine(&engine).teardown();

    loop_result?;
    tracing::info!("Shutdown complete");
    println!("Goodbye! Check {} for details.", config.logging.file);
    Ok(())
}

/// Forward every publication to the UI without blocking the engine. Frames that
/// don't fit in the queue are counted and reported once it drains.
fn subscribe_ui(engine: &mut SyncEngine, app_tx: mpsc::Sender<AppEvent>) {
    let mut dropped: u64 = 0;
    engine.subscribe(move |publication| {
        if dropped > 0 && app_tx.try_send(AppEvent::PublishDropped(dropped)).is_ok() {
            dropped = 0;
        }
        if app_tx
            .try_send(AppEvent::Published(Arc::clone(publication)))
            .is_err()
        {
            dropped += 1;
            tracing::warn!(
                sequence = publication.sequence,
                dropped,
                "UI queue full, publication dropped"
            );
        }
    });
}

fn subscribe_alerts(engine: &mut SyncEngine, threshold_pct: f64, app_tx: mpsc::Sender<AppEvent>) {
    let mut monitor = TrendMonitor::new(threshold_pct);
    engine.subscribe(move |publication| {
        if let Some(alert) = monitor.observe(publication.price) {
            if app_tx.try_send(AppEvent::TrendAlert(alert)).is_err() {
                tracing::warn!("UI queue full, trend alert dropped");
            }
        }
    });
}
