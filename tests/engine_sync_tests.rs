use std::sync::{Arc, Mutex};

use price_sync::engine::{EngineSettings, EngineState, Publication, PublishReason, SyncEngine};
use price_sync::error::SyncError;
use price_sync::feed::{SeedFeed, StaticFeed};
use price_sync::model::order::TradeSide;
use price_sync::series::GeneratorPolicy;
use price_sync::window::WindowSpec;

fn settings(seed: u64) -> EngineSettings {
    EngineSettings {
        generator: GeneratorPolicy {
            seed: Some(seed),
            ..GeneratorPolicy::default()
        },
        ..EngineSettings::default()
    }
}

fn collect(engine: &mut SyncEngine) -> Arc<Mutex<Vec<Arc<Publication>>>> {
    let frames = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&frames);
    engine.subscribe(move |p| sink.lock().unwrap().push(Arc::clone(p)));
    frames
}

#[test]
/// Verifies the minimal scenario:
/// a two-point flat seed started and ticked once must move the cursor to 1
/// and quote the second seed point.
fn two_point_seed_ticks_onto_second_point() {
    let mut engine = SyncEngine::new(settings(1));
    engine.initialize(vec![10.0, 10.0]).unwrap();
    engine.start().unwrap();

    let frame = engine.tick().unwrap().expect("running engine publishes");
    assert_eq!(frame.cursor, 1);
    assert!((frame.price - 10.0).abs() < f64::EPSILON);
    assert_eq!(engine.current_price(), Some(10.0));
    assert_eq!(engine.trade(TradeSide::Sell).unwrap().price, 10.0);
}

#[test]
/// Verifies the engine stays synchronized over a long run:
/// every frame agrees with itself (price == snapshot "now"), history is never
/// rewritten, and the lookahead buffer is always honoured.
fn long_run_keeps_chart_price_and_history_in_sync() {
    let seed = StaticFeed::default().load().unwrap();
    let mut engine = SyncEngine::new(settings(7));
    engine.initialize_at(seed.prices, seed.present).unwrap();
    let frames = collect(&mut engine);
    engine.start().unwrap();

    let mut history: Vec<f64> = engine.series().unwrap()[..=29].to_vec();
    for _ in 0..300 {
        engine.tick().unwrap();
        let series = engine.series().unwrap();
        let cursor = engine.cursor().unwrap();
        assert_eq!(&series[..history.len()], history.as_slice());
        assert!(series.len() - 1 - cursor >= engine.settings().lookahead_buffer);
        history = series[..=cursor].to_vec();
    }

    let frames = frames.lock().unwrap();
    assert_eq!(frames.len(), 301);
    assert_eq!(frames[0].reason, PublishReason::Start);
    for pair in frames.windows(2) {
        assert_eq!(pair[1].sequence, pair[0].sequence + 1);
        assert_eq!(pair[1].cursor, pair[0].cursor + 1);
    }
    for frame in frames.iter() {
        assert_eq!(frame.snapshot.now_price(), Some(frame.price));
        assert_eq!(frame.snapshot.start + frame.snapshot.split_index, frame.cursor);
        assert!(frame.price >= 0.01);
    }
}

#[test]
/// Verifies pause/resume gating:
/// ticks while paused neither move the cursor nor publish.
fn paused_ticks_are_silent() {
    let mut engine = SyncEngine::new(settings(3));
    engine.initialize(vec![50.0, 51.0, 52.0]).unwrap();
    let frames = collect(&mut engine);
    engine.start().unwrap();
    engine.pause().unwrap();

    for _ in 0..5 {
        assert!(engine.tick().unwrap().is_none());
    }
    assert_eq!(engine.cursor(), Some(0));
    assert_eq!(frames.lock().unwrap().len(), 1);

    engine.resume().unwrap();
    engine.tick().unwrap();
    assert_eq!(engine.cursor(), Some(1));
    assert_eq!(frames.lock().unwrap().len(), 2);
}

#[test]
/// Verifies reset semantics:
/// the prefix up to the cursor survives, the future is regenerated, the engine
/// ends up running and the reset frame carries the new state.
fn reset_from_pause_resumes_with_regenerated_future() {
    let mut engine = SyncEngine::new(settings(11));
    engine.initialize((0..60).map(|i| 100.0 + i as f64).collect()).unwrap();
    engine.start().unwrap();
    for _ in 0..40 {
        engine.tick().unwrap();
    }
    engine.pause().unwrap();
    let before: Vec<f64> = engine.series().unwrap()[..=40].to_vec();

    let frame = engine.reset().unwrap();
    assert_eq!(frame.reason, PublishReason::Reset);
    assert_eq!(frame.state, EngineState::Running);
    assert_eq!(engine.state(), EngineState::Running);
    assert_eq!(frame.cursor, 40);
    assert_eq!(engine.series_len(), Some(91));
    assert_eq!(&engine.series().unwrap()[..=40], before.as_slice());
}

#[test]
fn invalid_transitions_are_reported() {
    let mut engine = SyncEngine::new(settings(5));
    assert!(matches!(engine.start(), Err(SyncError::NotInitialized)));

    engine.initialize(vec![1.0]).unwrap();
    assert!(matches!(
        engine.pause(),
        Err(SyncError::InvalidState { op: "pause", .. })
    ));
    assert!(matches!(
        engine.reset(),
        Err(SyncError::InvalidState { op: "reset", .. })
    ));
    engine.start().unwrap();
    assert!(matches!(
        engine.start(),
        Err(SyncError::InvalidState { op: "start", .. })
    ));
    assert!(matches!(
        engine.resume(),
        Err(SyncError::InvalidState { op: "resume", .. })
    ));
}

#[test]
fn teardown_allows_reinitialization() {
    let mut engine = SyncEngine::new(settings(9));
    engine.initialize(vec![5.0, 6.0]).unwrap();
    let _frames = collect(&mut engine);
    engine.start().unwrap();
    engine.teardown();

    assert!(!engine.is_initialized());
    assert_eq!(engine.subscriber_count(), 0);
    assert_eq!(engine.state(), EngineState::Idle);
    engine.initialize(vec![7.0]).unwrap();
    assert_eq!(engine.current_price(), Some(7.0));
}

#[test]
/// Verifies deterministic generation:
/// two engines with the same generator seed produce identical futures.
fn seeded_engines_are_reproducible() {
    let run = || {
        let mut engine = SyncEngine::new(settings(123));
        engine.initialize(vec![100.0, 101.0, 102.0]).unwrap();
        engine.start().unwrap();
        for _ in 0..120 {
            engine.tick().unwrap();
        }
        engine.series().unwrap().to_vec()
    };
    assert_eq!(run(), run());
}

#[test]
/// Verifies per-call-site trend weights through the engine:
/// with no noise, points added by a tick refill continue the trend at the
/// incremental weight and points added by reset at the backfill weight.
fn refill_and_reset_use_their_own_trend_weights() {
    let mut engine = SyncEngine::new(EngineSettings {
        generator: GeneratorPolicy {
            volatility: 0.0,
            backfill_trend_weight: 0.2,
            incremental_trend_weight: 0.5,
            ..GeneratorPolicy::default()
        },
        ..EngineSettings::default()
    });
    // slope 1.0 everywhere
    let seed: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
    engine.initialize(seed).unwrap();
    assert_eq!(engine.series_len(), Some(20));
    engine.start().unwrap();

    while engine.series_len() == Some(20) {
        engine.tick().unwrap();
    }
    let series = engine.series().unwrap();
    assert!((series[20] - 119.5).abs() < 1e-9);
    assert!((series[21] - 120.0).abs() < 1e-9);

    let cursor = engine.cursor().unwrap();
    let anchor = series[cursor];
    engine.reset().unwrap();
    let series = engine.series().unwrap();
    assert!((series[cursor + 1] - (anchor + 0.2)).abs() < 1e-9);
    assert!((series[cursor + 2] - (anchor + 0.4)).abs() < 1e-9);
}

#[test]
/// Verifies settings built outside the config loader are still checked:
/// a negative padding fraction or a NaN trend weight is refused up front
/// instead of leaking into published frames.
fn hand_built_invalid_settings_are_refused() {
    let mut engine = SyncEngine::new(EngineSettings {
        window: WindowSpec {
            padding_fraction: -0.6,
            ..WindowSpec::default()
        },
        ..settings(1)
    });
    assert!(matches!(
        engine.initialize(vec![10.0, 10.0]),
        Err(SyncError::Config(_))
    ));
    assert!(matches!(engine.start(), Err(SyncError::NotInitialized)));

    let mut engine = SyncEngine::new(EngineSettings {
        generator: GeneratorPolicy {
            backfill_trend_weight: f64::NAN,
            seed: Some(1),
            ..GeneratorPolicy::default()
        },
        ..EngineSettings::default()
    });
    assert!(matches!(
        engine.initialize(vec![100.0, 101.0]),
        Err(SyncError::Config(_))
    ));
}
